//! The webhook endpoint.
//!
//! Every delivery is verified against the shared secret before anything else
//! happens, including the signed empty body that triggers a reconciliation
//! sweep. Parsing and routing only ever see authenticated bytes.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::AppState;
use crate::service::ServiceError;
use crate::webhooks::{parse_webhook, verify_signature, ParseError};

const HEADER_SIGNATURE: &str = "x-hub-signature-256";

/// The acknowledgement body. No caller parses it; GitHub only records the
/// status code and whatever text we send.
const SUCCESS_BODY: &str = "Success";

/// A delivery that was rejected or could not be handled.
///
/// Authorization denials are deliberately not represented here; they are
/// ordinary successes as far as the sender can tell.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing signature header")]
    MissingSignature,

    #[error("signature mismatch")]
    InvalidSignature,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("event handling failed: {0}")]
    Service(#[from] ServiceError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::MissingSignature => StatusCode::BAD_REQUEST,
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::Parse(_) => StatusCode::BAD_REQUEST,
            WebhookError::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Hard failures carry their class as a field: an invariant violation
        // needs an operator, everything else clears on webhook re-delivery
        match &self {
            WebhookError::Service(ServiceError::Git(e)) => tracing::error!(
                error = %e,
                invariant_violation = e.is_invariant_violation(),
                "delivery handling failed"
            ),
            WebhookError::Service(ServiceError::GitHub(e)) => tracing::error!(
                error = %e,
                transient = e.is_transient(),
                "delivery handling failed"
            ),
            _ => warn!(error = %self, "rejecting delivery"),
        }
        (status, self.to_string()).into_response()
    }
}

/// Accepts one webhook delivery.
///
/// An empty (but signed) body is the trigger-less case: it runs the
/// reconciliation sweep instead of the router. A non-empty body is parsed
/// and routed; unrecognized shapes are acknowledged without effect.
pub async fn webhook_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, WebhookError> {
    let signature = headers
        .get(HEADER_SIGNATURE)
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::MissingSignature)?;

    if !verify_signature(&body, signature, app_state.webhook_secret()) {
        return Err(WebhookError::InvalidSignature);
    }

    if body.is_empty() {
        info!("empty trigger; running reconciliation sweep");
        let report = app_state.service().reconcile().await?;
        if !report.is_clean() {
            // Collected rather than fatal; the sweep is best effort
            warn!(failed = report.failed.len(), "sweep left failures behind");
        }
        return Ok(SUCCESS_BODY);
    }

    match parse_webhook(&body)? {
        Some(event) => {
            debug!(?event, "handling delivery");
            app_state.service().handle_event(event).await?;
        }
        None => debug!("unrecognized delivery shape; acknowledging"),
    }

    Ok(SUCCESS_BODY)
}
