//! Events API webhook handler.
//!
//! Converts the axum request into a transport-neutral
//! [`InboundRequest`], runs it through the [`Dispatcher`](poh_core::Dispatcher),
//! and converts the resulting [`WebhookResponse`] back into an HTTP
//! response. Every method is routed here; the dispatcher rejects non-POST
//! requests itself.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use poh_core::{DispatchError, InboundRequest, ParseError, WebhookResponse};
use tracing::{instrument, warn};

use crate::state::AppState;

/// Header that may carry the verification token when the body does not.
pub const VERIFICATION_TOKEN_HEADER: &str = "x-slack-verification-token";

/// Handles one Events API delivery.
///
/// A body that cannot be buffered (e.g. over the body size limit) is
/// rejected with the dispatcher's 502 parse-error response.
#[instrument(skip_all, fields(method = %method))]
pub async fn handle_events(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection, "Failed to read request body");
            let err = DispatchError::Parse(ParseError::Malformed(rejection.body_text()));
            return into_http_response(WebhookResponse::rejected(&err));
        }
    };
    let request = inbound_request(&method, &headers, &body);
    let response = state.dispatcher().handle(request).await;
    into_http_response(response)
}

/// Builds the dispatcher's view of an HTTP request.
///
/// Non-UTF-8 bodies are decoded lossily; they fail classification later.
pub fn inbound_request(method: &Method, headers: &HeaderMap, body: &[u8]) -> InboundRequest {
    let mut request = InboundRequest::from_body(
        method.as_str(),
        String::from_utf8_lossy(body).into_owned(),
    );
    if request.token.is_none() {
        request.token = headers
            .get(VERIFICATION_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
    }
    request
}

/// Converts a [`WebhookResponse`] into an axum response.
///
/// Headers that are not valid HTTP header names or values are dropped with
/// a warning.
pub fn into_http_response(response: WebhookResponse) -> Response {
    let status = StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::BAD_GATEWAY);

    let mut headers = HeaderMap::new();
    for (name, value) in &response.headers {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(header = name, "Dropping invalid response header"),
        }
    }

    (status, headers, response.body).into_response()
}
