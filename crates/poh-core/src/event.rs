//! Events API envelope classification.
//!
//! Slack posts every webhook as a JSON envelope whose `type` field tells the
//! one-time `url_verification` handshake apart from `event_callback`
//! notifications. For callbacks, the inner `event` object carries its own
//! `type`; only `app_mention` drives a reply.

use serde::Deserialize;
use tracing::debug;

use crate::error::ParseError;

/// Outer envelope discriminant for the URL verification handshake.
pub const URL_VERIFICATION: &str = "url_verification";

/// Outer envelope discriminant for event notifications.
pub const EVENT_CALLBACK: &str = "event_callback";

/// Inner event discriminant for a mention of the bot.
pub const APP_MENTION: &str = "app_mention";

/// Kind of an inbound envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundEventKind {
    /// The challenge/response handshake.
    UrlVerification,

    /// A real-time event notification.
    Callback,

    /// Any other envelope type (e.g. `app_rate_limited`).
    Other,
}

/// A parsed inbound envelope.
///
/// `challenge` is set only for [`InboundEventKind::UrlVerification`] and
/// `inner_event` only for [`InboundEventKind::Callback`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Envelope kind.
    pub kind: InboundEventKind,

    /// Handshake token to echo back verbatim.
    pub challenge: Option<String>,

    /// The wrapped event of a callback.
    pub inner_event: Option<InnerEvent>,
}

/// The event wrapped by an `event_callback` envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerEvent {
    /// Raw inner discriminant, e.g. `"app_mention"` or `"reaction_added"`.
    pub event_type: String,

    /// Decoded payload.
    pub payload: EventPayload,
}

/// Inner event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    /// The bot was mentioned in a channel.
    AppMention(AppMentionEvent),

    /// Any other subtype; its discriminant lives in
    /// [`InnerEvent::event_type`].
    Other,
}

/// An `app_mention` event.
///
/// # Examples
///
/// ```
/// let json = serde_json::json!({
///     "type": "app_mention",
///     "user": "U456",
///     "text": "<@U0BOT> ping",
///     "channel": "C123",
///     "ts": "1700000000.000100"
/// });
/// let mention: poh_core::AppMentionEvent = serde_json::from_value(json).unwrap();
/// assert_eq!(mention.channel, "C123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppMentionEvent {
    /// Raw message text, starting with the mention marker.
    pub text: String,

    /// Channel the mention was posted in.
    pub channel: String,
}

/// Fields shared by every envelope type.
#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    envelope_type: String,

    #[serde(default)]
    challenge: Option<serde_json::Value>,

    #[serde(default)]
    event: Option<serde_json::Value>,
}

/// Discriminant of the inner event, read before decoding the payload.
#[derive(Debug, Deserialize)]
struct RawInnerEvent {
    #[serde(rename = "type")]
    event_type: String,
}

/// Classifies a raw webhook body.
///
/// # Errors
///
/// - `ParseError::Malformed` if the body is not JSON, lacks a string `type`,
///   or is a callback whose `event` is missing or undecodable.
/// - `ParseError::MissingChallenge` if a `url_verification` envelope has no
///   string `challenge`.
///
/// # Examples
///
/// ```
/// use poh_core::{classify, InboundEventKind};
///
/// let event = classify(r#"{"type":"url_verification","challenge":"xyz"}"#).unwrap();
/// assert_eq!(event.kind, InboundEventKind::UrlVerification);
/// assert_eq!(event.challenge.as_deref(), Some("xyz"));
/// ```
pub fn classify(raw_body: &str) -> Result<InboundEvent, ParseError> {
    let raw: RawEnvelope = serde_json::from_str(raw_body)
        .map_err(|e| ParseError::Malformed(format!("invalid envelope: {e}")))?;

    debug!(envelope_type = raw.envelope_type, "Classifying envelope");

    match raw.envelope_type.as_str() {
        URL_VERIFICATION => {
            let challenge = raw
                .challenge
                .as_ref()
                .and_then(|v| v.as_str())
                .ok_or(ParseError::MissingChallenge)?;
            Ok(InboundEvent {
                kind: InboundEventKind::UrlVerification,
                challenge: Some(challenge.to_string()),
                inner_event: None,
            })
        }
        EVENT_CALLBACK => {
            let event = raw.event.ok_or_else(|| {
                ParseError::Malformed("event_callback missing 'event'".into())
            })?;
            Ok(InboundEvent {
                kind: InboundEventKind::Callback,
                challenge: None,
                inner_event: Some(decode_inner_event(event)?),
            })
        }
        _ => Ok(InboundEvent {
            kind: InboundEventKind::Other,
            challenge: None,
            inner_event: None,
        }),
    }
}

fn decode_inner_event(event: serde_json::Value) -> Result<InnerEvent, ParseError> {
    let RawInnerEvent { event_type } = RawInnerEvent::deserialize(&event)
        .map_err(|e| ParseError::Malformed(format!("invalid inner event: {e}")))?;

    let payload = if event_type == APP_MENTION {
        let mention: AppMentionEvent = serde_json::from_value(event)
            .map_err(|e| ParseError::Malformed(format!("invalid app_mention: {e}")))?;
        EventPayload::AppMention(mention)
    } else {
        EventPayload::Other
    };

    Ok(InnerEvent {
        event_type,
        payload,
    })
}
