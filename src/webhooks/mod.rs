//! Webhook intake: signature verification, payload parsing, typed events.
//!
//! Everything here is pure. Verification and parsing decide what a delivery
//! *is*; what to do about it is the service layer's business.

pub mod events;
pub mod parser;
pub mod signature;

pub use events::{IssueCommentEvent, PullRequestAction, PullRequestEvent, WebhookEvent};
pub use parser::{parse_webhook, ParseError};
pub use signature::{
    compute_signature, format_signature_header, parse_signature_header, verify_signature,
};
