//! Error types for the dispatch pipeline.
//!
//! Each stage of the pipeline has its own error: [`VerificationError`] for the
//! verifier, [`ParseError`] for the classifier and normalizer, [`SendError`]
//! for the outbound collaborator. [`DispatchError`] gathers them so the
//! dispatcher can map any failure to a single 502 response.

use thiserror::Error;

/// HTTP-style status used for every rejected request.
pub const REJECT_STATUS: u16 = 502;

/// Failure to authenticate an inbound request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// The transport method was not `POST`.
    #[error("Method not allowed: {0}")]
    InvalidMethod(String),

    /// The provided verification token is absent or does not match.
    #[error("Verification token mismatch")]
    TokenMismatch,
}

/// Failure to parse an inbound payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Invalid JSON, a missing discriminant, or an undecodable field.
    #[error("Malformed payload: {0}")]
    Malformed(String),

    /// A `url_verification` envelope without a `challenge` string.
    #[error("url_verification payload missing 'challenge'")]
    MissingChallenge,
}

/// Failure reported by the outbound messaging collaborator.
///
/// `channel` and `ts` carry whatever the platform returned alongside the
/// failure; both are frequently empty.
///
/// # Examples
///
/// ```
/// use poh_core::SendError;
///
/// let err = SendError::new("", "", "channel_not_found");
/// assert_eq!(err.to_string(), "Send failed: channel_not_found");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Send failed: {detail}")]
pub struct SendError {
    /// Channel identifier echoed by the platform, if any.
    pub channel: String,
    /// Message timestamp echoed by the platform, if any.
    pub ts: String,
    /// Error code or transport error description.
    pub detail: String,
}

impl SendError {
    /// Creates a send error from its diagnostic fields.
    pub fn new(
        channel: impl Into<String>,
        ts: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            ts: ts.into(),
            detail: detail.into(),
        }
    }
}

/// Terminal failure of one webhook invocation.
///
/// None of these are retried internally; Slack re-delivers the webhook when
/// it does not receive a 2xx.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DispatchError {
    /// The request method was not `POST`.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The verification token did not match.
    #[error("Verification failed")]
    VerificationFailed,

    /// The envelope or the mention text could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The outbound reply could not be delivered.
    #[error(transparent)]
    SendFailed(#[from] SendError),
}

impl From<VerificationError> for DispatchError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::InvalidMethod(_) => Self::MethodNotAllowed,
            VerificationError::TokenMismatch => Self::VerificationFailed,
        }
    }
}

impl DispatchError {
    /// Status code reported to the caller.
    pub fn status_code(&self) -> u16 {
        REJECT_STATUS
    }

    /// Short diagnostic body reported to the caller.
    pub fn response_body(&self) -> String {
        match self {
            Self::MethodNotAllowed => "Method not allowed".into(),
            Self::VerificationFailed => "Verification failed".into(),
            Self::Parse(ParseError::Malformed(_)) => "Error at ParseEvent".into(),
            Self::Parse(ParseError::MissingChallenge) => "Error parsing as slack event".into(),
            Self::SendFailed(e) => format!(
                "Error respChannel:{}, respTimestamp:{}, error:{}",
                e.channel, e.ts, e.detail
            ),
        }
    }
}
