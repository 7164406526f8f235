//! Request dispatch: verify, classify, reply, respond.
//!
//! [`Dispatcher::handle`] drives one webhook invocation through
//!
//! ```text
//! Received -> Verified -> Classified -> Replying | Echoing | Acknowledging | Rejecting -> Responded
//! ```
//!
//! and always ends in a [`WebhookResponse`]. Failures become 502 responses,
//! never errors or panics.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{DispatchError, ParseError, SendError};
use crate::event::{classify, EventPayload, InboundEventKind, InnerEvent};
use crate::matcher::ResponseMatcher;
use crate::normalizer::normalize;
use crate::sender::{MessageSender, PostedMessage};
use crate::verifier::{InboundRequest, RequestVerifier};

/// Default bound on the outbound send.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Body returned for envelopes that are neither handshake nor callback.
pub const NOTHING_HERE: &str = "nothing here";

/// Content type of the handshake echo.
pub const CHALLENGE_CONTENT_TYPE: &str = "text/plain";

/// HTTP-style response envelope.
///
/// Serializes to the `{ "statusCode", "headers", "body" }` shape used by
/// API-gateway proxy integrations.
///
/// # Examples
///
/// ```
/// use poh_core::WebhookResponse;
///
/// let resp = WebhookResponse::ok("nothing here");
/// let json = serde_json::to_value(&resp).unwrap();
/// assert_eq!(json["statusCode"], 200);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    /// HTTP status code.
    pub status_code: u16,

    /// Response headers; empty for most outcomes.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// Response body.
    pub body: String,
}

impl WebhookResponse {
    /// A 200 response with no extra headers.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// The handshake echo: 200 with the challenge as a plain-text body.
    pub fn challenge(challenge: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            headers: BTreeMap::from([(
                "content-type".to_string(),
                CHALLENGE_CONTENT_TYPE.to_string(),
            )]),
            body: challenge.into(),
        }
    }

    /// The rejection response for `err`.
    pub fn rejected(err: &DispatchError) -> Self {
        Self {
            status_code: err.status_code(),
            headers: BTreeMap::new(),
            body: err.response_body(),
        }
    }
}

/// Outcome of the reply step for one callback event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    /// A reply was derived and posted.
    Sent,

    /// A reply was derived but could not be posted.
    SendFailed,

    /// The event does not call for a reply.
    NotApplicable,
}

/// Terminal outcome of the reply step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyResult {
    /// What happened.
    pub status: ReplyStatus,

    /// Body to report to the caller.
    pub body: String,
}

impl From<ReplyResult> for WebhookResponse {
    fn from(result: ReplyResult) -> Self {
        let status_code = match result.status {
            ReplyStatus::Sent | ReplyStatus::NotApplicable => 200,
            ReplyStatus::SendFailed => crate::error::REJECT_STATUS,
        };
        Self {
            status_code,
            headers: BTreeMap::new(),
            body: result.body,
        }
    }
}

/// Acknowledgment body for a callback with inner type `event_type`.
pub fn acknowledgment(event_type: &str) -> String {
    format!("Event:{event_type}, received!")
}

/// Orchestrates one webhook invocation.
///
/// Holds only immutable collaborators, so a single instance can be shared
/// across concurrent requests behind an `Arc`.
#[derive(Clone)]
pub struct Dispatcher {
    verifier: RequestVerifier,
    sender: Arc<dyn MessageSender>,
    matcher: ResponseMatcher,
    send_timeout: Duration,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("verifier", &self.verifier)
            .field("matcher", &self.matcher)
            .field("send_timeout", &self.send_timeout)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher.
    pub fn new(
        verifier: RequestVerifier,
        sender: Arc<dyn MessageSender>,
        matcher: ResponseMatcher,
        send_timeout: Duration,
    ) -> Self {
        Self {
            verifier,
            sender,
            matcher,
            send_timeout,
        }
    }

    /// Handles one inbound request and returns the response to send back.
    #[instrument(skip_all, fields(method = %request.method, body_len = request.body.len()))]
    pub async fn handle(&self, request: InboundRequest) -> WebhookResponse {
        match self.process(&request).await {
            Ok(response) => {
                info!(status = response.status_code, "Request handled");
                response
            }
            Err(err) => {
                warn!(error = %err, "Request rejected");
                WebhookResponse::rejected(&err)
            }
        }
    }

    async fn process(&self, request: &InboundRequest) -> Result<WebhookResponse, DispatchError> {
        self.verifier.verify(request)?;
        let event = classify(&request.body)?;

        match event.kind {
            InboundEventKind::UrlVerification => {
                let challenge = event.challenge.ok_or(ParseError::MissingChallenge)?;
                debug!("Echoing url_verification challenge");
                Ok(WebhookResponse::challenge(challenge))
            }
            InboundEventKind::Callback => {
                let inner = event.inner_event.ok_or_else(|| {
                    ParseError::Malformed("event_callback missing 'event'".into())
                })?;
                Ok(self.reply_to(&inner).await?.into())
            }
            InboundEventKind::Other => Ok(WebhookResponse::ok(NOTHING_HERE)),
        }
    }

    /// Runs the reply step for a callback's inner event.
    ///
    /// Mentions are normalized, matched and posted; any other subtype is
    /// acknowledged without sending anything.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Malformed` if the mention text has no marker.
    #[instrument(skip_all, fields(event_type = %inner.event_type))]
    pub async fn reply_to(&self, inner: &InnerEvent) -> Result<ReplyResult, ParseError> {
        let EventPayload::AppMention(mention) = &inner.payload else {
            debug!("No reply for event subtype");
            return Ok(ReplyResult {
                status: ReplyStatus::NotApplicable,
                body: acknowledgment(&inner.event_type),
            });
        };

        let message = normalize(&mention.text)?;
        let reply = self.matcher.reply(&message);

        match self.send(&mention.channel, &reply).await {
            Ok(posted) => {
                info!(channel = posted.channel, ts = posted.ts, "Reply posted");
                Ok(ReplyResult {
                    status: ReplyStatus::Sent,
                    body: acknowledgment(&inner.event_type),
                })
            }
            Err(err) => {
                warn!(
                    channel = mention.channel,
                    resp_channel = err.channel,
                    resp_ts = err.ts,
                    error = err.detail,
                    "Failed to post reply"
                );
                Ok(ReplyResult {
                    status: ReplyStatus::SendFailed,
                    body: DispatchError::SendFailed(err).response_body(),
                })
            }
        }
    }

    async fn send(&self, channel: &str, text: &str) -> Result<PostedMessage, SendError> {
        match tokio::time::timeout(self.send_timeout, self.sender.send(channel, text)).await {
            Ok(result) => result,
            Err(_) => Err(SendError::new(
                "",
                "",
                format!("timed out after {}ms", self.send_timeout.as_millis()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::clock::FixedClock;
    use crate::event::AppMentionEvent;

    const SECRET: &str = "verification-secret";

    /// Records every send and answers with a canned result.
    struct MockSender {
        calls: Mutex<Vec<(String, String)>>,
        result: Result<PostedMessage, SendError>,
        delay: Option<Duration>,
    }

    impl MockSender {
        fn succeeding() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                result: Ok(PostedMessage {
                    channel: "C123".into(),
                    ts: "1700000000.000200".into(),
                }),
                delay: None,
            }
        }

        fn failing(err: SendError) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                result: Err(err),
                delay: None,
            }
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl MessageSender for MockSender {
        async fn send(&self, channel: &str, text: &str) -> Result<PostedMessage, SendError> {
            self.calls
                .lock()
                .expect("lock")
                .push((channel.to_string(), text.to_string()));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.result.clone()
        }
    }

    fn dispatcher(sender: Arc<MockSender>) -> Dispatcher {
        Dispatcher::new(
            RequestVerifier::new(SECRET),
            sender,
            ResponseMatcher::new(FixedClock(0)),
            DEFAULT_SEND_TIMEOUT,
        )
    }

    fn post(body: serde_json::Value) -> InboundRequest {
        InboundRequest::from_body("POST", body.to_string())
    }

    fn mention(text: &str) -> serde_json::Value {
        serde_json::json!({
            "token": SECRET,
            "type": "event_callback",
            "event": {
                "type": "app_mention",
                "user": "U456",
                "text": text,
                "channel": "C123",
                "ts": "1700000000.000100"
            }
        })
    }

    #[tokio::test]
    async fn test_should_echo_url_verification_challenge() {
        let sender = Arc::new(MockSender::succeeding());
        let resp = dispatcher(sender.clone())
            .handle(post(serde_json::json!({
                "token": SECRET,
                "type": "url_verification",
                "challenge": "xyz"
            })))
            .await;

        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.body, "xyz");
        assert_eq!(
            resp.headers.get("content-type").map(String::as_str),
            Some(CHALLENGE_CONTENT_TYPE)
        );
        assert!(sender.calls().is_empty());
    }

    #[tokio::test]
    async fn test_should_reply_to_mention() {
        let sender = Arc::new(MockSender::succeeding());
        let resp = dispatcher(sender.clone())
            .handle(post(mention("<@U0BOT> ping")))
            .await;

        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.body, "Event:app_mention, received!");
        assert_eq!(sender.calls(), vec![("C123".to_string(), "ぽん".to_string())]);
    }

    #[tokio::test]
    async fn test_should_apply_suffix_rule_to_mention() {
        let sender = Arc::new(MockSender::succeeding());
        dispatcher(sender.clone())
            .handle(post(mention("<@U0BOT>pingした")))
            .await;
        assert_eq!(sender.calls()[0].1, "pingしてえらい〜！");
    }

    #[tokio::test]
    async fn test_should_reject_non_post_regardless_of_body() {
        let sender = Arc::new(MockSender::succeeding());
        let dispatcher = dispatcher(sender.clone());
        for method in ["GET", "PUT", "DELETE"] {
            for body in [mention("<@U0BOT> ping").to_string(), String::new()] {
                let resp = dispatcher
                    .handle(InboundRequest::from_body(method, body))
                    .await;
                assert_eq!(resp.status_code, 502, "method {method}");
                assert_eq!(resp.body, "Method not allowed");
            }
        }
        assert!(sender.calls().is_empty());
    }

    #[tokio::test]
    async fn test_should_reject_token_mismatch_without_sending() {
        let sender = Arc::new(MockSender::succeeding());
        let mut body = mention("<@U0BOT> ping");
        body["token"] = serde_json::json!("wrong");

        let resp = dispatcher(sender.clone()).handle(post(body)).await;

        assert_eq!(resp.status_code, 502);
        assert_eq!(resp.body, "Verification failed");
        assert!(sender.calls().is_empty());
    }

    #[tokio::test]
    async fn test_should_reject_malformed_envelope() {
        let sender = Arc::new(MockSender::succeeding());
        let resp = dispatcher(sender.clone())
            .handle(InboundRequest {
                method: "POST".into(),
                body: "{not json".into(),
                token: Some(SECRET.into()),
            })
            .await;
        assert_eq!(resp.status_code, 502);
        assert_eq!(resp.body, "Error at ParseEvent");
    }

    #[tokio::test]
    async fn test_should_run_reply_step_for_inner_event() {
        let sender = Arc::new(MockSender::succeeding());
        let dispatcher = dispatcher(sender.clone());
        let mention = InnerEvent {
            event_type: "app_mention".into(),
            payload: EventPayload::AppMention(AppMentionEvent {
                text: "<@U0BOT> ping".into(),
                channel: "C123".into(),
            }),
        };

        let result = dispatcher.reply_to(&mention).await.expect("reply");
        assert_eq!(result.status, ReplyStatus::Sent);
        assert_eq!(result.body, "Event:app_mention, received!");
        assert_eq!(sender.calls(), vec![("C123".to_string(), "ぽん".to_string())]);

        let other = InnerEvent {
            event_type: "reaction_added".into(),
            payload: EventPayload::Other,
        };
        let result = dispatcher.reply_to(&other).await.expect("reply");
        assert_eq!(result.status, ReplyStatus::NotApplicable);
        assert_eq!(sender.calls().len(), 1);

        let unmarked = InnerEvent {
            event_type: "app_mention".into(),
            payload: EventPayload::AppMention(AppMentionEvent {
                text: "ping".into(),
                channel: "C123".into(),
            }),
        };
        assert!(matches!(
            dispatcher.reply_to(&unmarked).await,
            Err(ParseError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_should_fail_verification_for_tokenless_non_json_body() {
        let sender = Arc::new(MockSender::succeeding());
        let resp = dispatcher(sender.clone())
            .handle(InboundRequest::from_body("POST", "{not json"))
            .await;
        assert_eq!(resp.status_code, 502);
        assert_eq!(resp.body, "Verification failed");
        assert!(sender.calls().is_empty());
    }

    #[tokio::test]
    async fn test_should_reject_handshake_without_challenge() {
        let sender = Arc::new(MockSender::succeeding());
        let resp = dispatcher(sender)
            .handle(post(serde_json::json!({"token": SECRET, "type": "url_verification"})))
            .await;
        assert_eq!(resp.status_code, 502);
        assert_eq!(resp.body, "Error parsing as slack event");
    }

    #[tokio::test]
    async fn test_should_reject_mention_without_marker() {
        let sender = Arc::new(MockSender::succeeding());
        let resp = dispatcher(sender.clone())
            .handle(post(mention("ping")))
            .await;
        assert_eq!(resp.status_code, 502);
        assert_eq!(resp.body, "Error at ParseEvent");
        assert!(sender.calls().is_empty());
    }

    #[tokio::test]
    async fn test_should_report_send_failure_diagnostics() {
        let sender = Arc::new(MockSender::failing(SendError::new(
            "C999",
            "1700000000.000300",
            "channel_not_found",
        )));
        let resp = dispatcher(sender.clone())
            .handle(post(mention("<@U0BOT> hi")))
            .await;

        assert_eq!(resp.status_code, 502);
        assert!(resp.body.contains("respChannel:C999"));
        assert!(resp.body.contains("respTimestamp:1700000000.000300"));
        assert!(resp.body.contains("channel_not_found"));
        assert_eq!(sender.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_should_report_send_failure_with_empty_diagnostics() {
        let sender = Arc::new(MockSender::failing(SendError::new("", "", "")));
        let resp = dispatcher(sender).handle(post(mention("<@U0BOT> hi"))).await;
        assert_eq!(resp.status_code, 502);
        assert!(resp.body.contains("respChannel:"));
        assert!(resp.body.contains("respTimestamp:"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_fail_send_on_timeout() {
        let sender = Arc::new(MockSender {
            delay: Some(Duration::from_secs(60)),
            ..MockSender::succeeding()
        });
        let resp = dispatcher(sender).handle(post(mention("<@U0BOT> hi"))).await;
        assert_eq!(resp.status_code, 502);
        assert!(resp.body.contains("timed out"));
    }

    #[tokio::test]
    async fn test_should_acknowledge_other_subtypes_without_sending() {
        let sender = Arc::new(MockSender::succeeding());
        let resp = dispatcher(sender.clone())
            .handle(post(serde_json::json!({
                "token": SECRET,
                "type": "event_callback",
                "event": {"type": "reaction_added", "reaction": "thumbsup"}
            })))
            .await;
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.body, "Event:reaction_added, received!");
        assert!(sender.calls().is_empty());
    }

    #[tokio::test]
    async fn test_should_answer_nothing_here_for_other_envelopes() {
        let sender = Arc::new(MockSender::succeeding());
        let resp = dispatcher(sender.clone())
            .handle(post(serde_json::json!({"token": SECRET, "type": "app_rate_limited"})))
            .await;
        assert_eq!(resp, WebhookResponse::ok(NOTHING_HERE));
        assert!(sender.calls().is_empty());
    }

    #[test]
    fn test_should_serialize_gateway_envelope() {
        let json = serde_json::to_value(WebhookResponse::challenge("xyz")).expect("serialize");
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["headers"]["content-type"], CHALLENGE_CONTENT_TYPE);
        assert_eq!(json["body"], "xyz");

        let json = serde_json::to_value(WebhookResponse::ok("x")).expect("serialize");
        assert!(json.get("headers").is_none());
    }
}
