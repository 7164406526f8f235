//! poh core: webhook dispatch and reply derivation.
//!
//! Turns one Slack Events API request into one response, posting a reply
//! for `app_mention` events along the way.
//!
//! # Architecture
//!
//! - [`RequestVerifier`] checks method and verification token
//! - [`classify`] parses the envelope into an [`InboundEvent`]
//! - [`normalize`] strips the mention marker into a [`NormalizedMessage`]
//! - [`ResponseMatcher`] maps the message to a reply via ordered rules
//! - [`Dispatcher`] runs the pipeline and posts through a [`MessageSender`]
//! - [`Clock`] abstracts wall-clock time for the time-dependent reply rule

pub mod clock;
pub mod dispatch;
mod error;
pub mod event;
pub mod matcher;
pub mod normalizer;
pub mod sender;
pub mod verifier;

pub use clock::{Clock, FixedClock, SystemClock};
pub use dispatch::{
    acknowledgment, Dispatcher, ReplyResult, ReplyStatus, WebhookResponse, DEFAULT_SEND_TIMEOUT,
};
pub use error::{DispatchError, ParseError, SendError, VerificationError, REJECT_STATUS};
pub use event::{classify, AppMentionEvent, EventPayload, InboundEvent, InboundEventKind, InnerEvent};
pub use matcher::{ResponseMatcher, DEFAULT_REPLY};
pub use normalizer::{normalize, NormalizedMessage};
pub use sender::{MessageSender, PostedMessage};
pub use verifier::{extract_token, InboundRequest, RequestVerifier};
