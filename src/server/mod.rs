//! HTTP surface: one webhook endpoint and a health probe.
//!
//! The server is deliberately thin. It authenticates and parses deliveries,
//! then hands them to the [`MirrorService`]; every lifecycle decision lives
//! there, not here.

use std::sync::Arc;

use crate::service::MirrorService;

pub mod webhook;

pub use webhook::webhook_handler;

/// Shared state handed to every handler through axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    service: MirrorService,
    webhook_secret: Vec<u8>,
}

impl AppState {
    pub fn new(service: MirrorService, webhook_secret: impl Into<Vec<u8>>) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                service,
                webhook_secret: webhook_secret.into(),
            }),
        }
    }

    pub fn service(&self) -> &MirrorService {
        &self.inner.service
    }

    pub fn webhook_secret(&self) -> &[u8] {
        &self.inner.webhook_secret
    }
}

async fn health_handler() -> &'static str {
    "OK"
}

/// Builds the router: webhook deliveries at the root, liveness at `/health`.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/", post(webhook_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}
