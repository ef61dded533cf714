//! HTTP server for SCM push webhooks.
//!
//! This module implements the HTTP server that:
//! - Accepts push webhooks from each supported provider, authenticates them,
//!   and forwards the pushed branch and repository URLs to the material updater
//! - Provides a health check for liveness probes
//!
//! # Endpoints
//!
//! - `POST /api/webhooks/bitbucket/notify` - Bitbucket Cloud
//! - `POST /api/webhooks/hosted_bitbucket/notify` - Bitbucket Server
//! - `POST /api/webhooks/github/notify` - GitHub
//! - `POST /api/webhooks/gitlab/notify` - GitLab
//! - `GET /health` - Returns 200 if server is running

use std::sync::Arc;
use std::time::Duration;

use tower_http::trace::TraceLayer;

use crate::materials::MaterialUpdater;
use crate::secret::SecretProvider;
use crate::webhooks::WebhookProvider;

pub mod health;
pub mod webhook;

pub use health::health_handler;
pub use webhook::{WebhookError, notify_handler};

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor. It holds the
/// collaborators consulted while processing a webhook; none of them carries
/// per-request state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Source of the webhook secret, read on every request.
    secrets: Arc<dyn SecretProvider>,

    /// Receives the branch and candidate URLs of every accepted push.
    materials: Arc<dyn MaterialUpdater>,

    /// Upper bound on dispatching every branch of one delivery.
    dispatch_timeout: Duration,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `secrets` - Supplies the webhook secret
    /// * `materials` - Receives push notifications
    /// * `dispatch_timeout` - Maximum time to wait for the material updater,
    ///   shared by all branches of a delivery
    pub fn new(
        secrets: Arc<dyn SecretProvider>,
        materials: Arc<dyn MaterialUpdater>,
        dispatch_timeout: Duration,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                secrets,
                materials,
                dispatch_timeout,
            }),
        }
    }

    /// Returns the current webhook secret.
    pub fn webhook_secret(&self) -> Arc<[u8]> {
        self.inner.secrets.webhook_secret()
    }

    /// Returns the material updater.
    pub fn materials(&self) -> &dyn MaterialUpdater {
        self.inner.materials.as_ref()
    }

    /// Returns the material updater timeout.
    pub fn dispatch_timeout(&self) -> Duration {
        self.inner.dispatch_timeout
    }
}

/// Route path for a provider's notify endpoint.
pub fn notify_path(provider: WebhookProvider) -> String {
    format!("/api/webhooks/{}/notify", provider.name())
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::body::Bytes;
    use axum::extract::State;
    use axum::http::HeaderMap;
    use axum::routing::{get, post};

    let mut router = axum::Router::new().route("/health", get(health_handler));

    for provider in WebhookProvider::ALL {
        router = router.route(
            &notify_path(provider),
            post(
                move |state: State<AppState>, headers: HeaderMap, body: Bytes| {
                    notify_handler(provider, state, headers, body)
                },
            ),
        );
    }

    router
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::MaterialRegistry;
    use crate::secret::RotatingSecret;

    fn app_state(secret: &[u8]) -> AppState {
        AppState::new(
            Arc::new(RotatingSecret::new(secret.to_vec())),
            Arc::new(MaterialRegistry::default()),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn app_state_accessors_work() {
        let state = app_state(b"test-secret");

        assert_eq!(&*state.webhook_secret(), b"test-secret");
        assert_eq!(state.dispatch_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn app_state_reads_secret_on_every_call() {
        let secrets = Arc::new(RotatingSecret::new("before"));
        let state = AppState::new(
            secrets.clone(),
            Arc::new(MaterialRegistry::default()),
            Duration::from_secs(5),
        );

        secrets.rotate("after");

        assert_eq!(&*state.clone().webhook_secret(), b"after");
    }

    #[test]
    fn notify_paths() {
        assert_eq!(
            notify_path(WebhookProvider::BitbucketCloud),
            "/api/webhooks/bitbucket/notify"
        );
        assert_eq!(
            notify_path(WebhookProvider::BitbucketServer),
            "/api/webhooks/hosted_bitbucket/notify"
        );
        assert_eq!(notify_path(WebhookProvider::GitHub), "/api/webhooks/github/notify");
        assert_eq!(notify_path(WebhookProvider::GitLab), "/api/webhooks/gitlab/notify");
    }
}
