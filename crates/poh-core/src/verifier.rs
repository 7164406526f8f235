//! Inbound request authentication.
//!
//! Slack's Events API includes the app's verification token in every
//! envelope. [`RequestVerifier`] rejects requests whose method is not `POST`
//! or whose token does not match the configured secret.

use std::fmt;

use crate::error::VerificationError;

/// Transport-neutral view of one inbound webhook request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRequest {
    /// HTTP method, e.g. `"POST"`.
    pub method: String,

    /// Raw request body.
    pub body: String,

    /// Verification token supplied by the caller, if any.
    pub token: Option<String>,
}

impl InboundRequest {
    /// Builds a request taking the token from the body's `token` field.
    pub fn from_body(method: impl Into<String>, body: impl Into<String>) -> Self {
        let body = body.into();
        let token = extract_token(&body);
        Self {
            method: method.into(),
            body,
            token,
        }
    }
}

/// Reads the top-level `token` string from an Events API body.
///
/// Returns `None` when the body is not a JSON object or has no string
/// `token`.
///
/// # Examples
///
/// ```
/// use poh_core::extract_token;
///
/// assert_eq!(extract_token(r#"{"token":"abc","type":"x"}"#).as_deref(), Some("abc"));
/// assert_eq!(extract_token("not json"), None);
/// ```
pub fn extract_token(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .as_object()?
        .get("token")?
        .as_str()
        .map(str::to_string)
}

/// Checks method and verification token of inbound requests.
#[derive(Clone)]
pub struct RequestVerifier {
    secret: String,
}

impl fmt::Debug for RequestVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestVerifier")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl RequestVerifier {
    /// Creates a verifier for the configured verification token.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verifies `request`.
    ///
    /// # Errors
    ///
    /// - `VerificationError::InvalidMethod` if the method is not `POST`.
    /// - `VerificationError::TokenMismatch` if the token is absent or wrong.
    ///
    /// # Examples
    ///
    /// ```
    /// use poh_core::{InboundRequest, RequestVerifier, VerificationError};
    ///
    /// let verifier = RequestVerifier::new("s3cret");
    /// let ok = InboundRequest::from_body("POST", r#"{"token":"s3cret"}"#);
    /// assert!(verifier.verify(&ok).is_ok());
    ///
    /// let bad = InboundRequest::from_body("POST", r#"{"token":"nope"}"#);
    /// assert_eq!(verifier.verify(&bad), Err(VerificationError::TokenMismatch));
    /// ```
    pub fn verify(&self, request: &InboundRequest) -> Result<(), VerificationError> {
        if request.method != "POST" {
            return Err(VerificationError::InvalidMethod(request.method.clone()));
        }
        match request.token.as_deref() {
            Some(token) if constant_time_eq(token, &self.secret) => Ok(()),
            _ => Err(VerificationError::TokenMismatch),
        }
    }
}

/// Constant-time string comparison.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}
