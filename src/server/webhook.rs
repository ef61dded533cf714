//! Webhook notify endpoints.
//!
//! Every provider route runs the same pipeline: authenticate the raw body,
//! classify the event header, parse the push payload, then hand each pushed
//! branch to the material updater. The body is buffered once by axum and the
//! same bytes feed both signature verification and JSON decoding.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::AppState;
use crate::materials::MaterialUpdateError;
use crate::types::{PushEvent, ScmKind};
use crate::webhooks::{
    AuthFailure, EventClassification, ParseError, WebhookProvider, WebhookRequest,
};

/// Body returned once every pushed branch has been dispatched.
pub const DISPATCHED_BODY: &str = "OK!";

/// Errors that can occur when processing a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing or mismatched credential.
    #[error(transparent)]
    Authentication(#[from] AuthFailure),

    /// The repository is not a git repository.
    #[error("Only `git' repositories are currently supported!")]
    UnsupportedScm(ScmKind),

    /// The event header named something other than a push or ping.
    #[error("Ignoring event of type `{0}'")]
    IgnoredEvent(String),

    /// The push payload could not be turned into a dispatch.
    #[error("Malformed payload: {0}")]
    MalformedPayload(ParseError),

    /// The material updater failed.
    #[error("{0}")]
    Dispatch(#[from] MaterialUpdateError),

    /// The material updater did not answer in time.
    #[error("material update timed out after {}s", .0.as_secs())]
    DispatchTimeout(Duration),
}

impl From<ParseError> for WebhookError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::UnsupportedScm(kind) => WebhookError::UnsupportedScm(kind),
            other => WebhookError::MalformedPayload(other),
        }
    }
}

impl WebhookError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebhookError::Authentication(_)
            | WebhookError::UnsupportedScm(_)
            | WebhookError::IgnoredEvent(_)
            | WebhookError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            WebhookError::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WebhookError::DispatchTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Notify handler shared by every provider route.
///
/// # Response
///
/// - 202 Accepted, body `OK!`: every pushed branch was handed to the updater
/// - 202 Accepted, empty body: ping
/// - 400 Bad Request: bad credential, ignored event, non-git repository, or
///   malformed payload
/// - 500 Internal Server Error: the material updater failed
/// - 504 Gateway Timeout: the material updater did not answer in time
///
/// # Example
///
/// ```ignore
/// POST /api/webhooks/hosted_bitbucket/notify HTTP/1.1
/// X-Event-Key: repo:refs_changed
/// X-Hub-Signature: sha256=...
/// Content-Type: application/json
///
/// {"repository": {...}, "changes": [...]}
///
/// HTTP/1.1 202 Accepted
///
/// OK!
/// ```
pub async fn notify_handler(
    provider: WebhookProvider,
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError> {
    let request = WebhookRequest::new(&headers, &body);
    let delivery_id = provider
        .delivery_id(&request)
        .map(|id| id.to_string())
        .unwrap_or_default();

    debug!(
        provider = %provider,
        delivery_id = %delivery_id,
        bytes = body.len(),
        "Received webhook"
    );

    let result = process_delivery(provider, &app_state, &request).await;
    match &result {
        Ok((_, DISPATCHED_BODY)) => {
            info!(provider = %provider, delivery_id = %delivery_id, "Push dispatched");
        }
        Ok(_) => {
            debug!(provider = %provider, delivery_id = %delivery_id, "Ping accepted");
        }
        Err(err) if err.status().is_server_error() => {
            warn!(
                provider = %provider,
                delivery_id = %delivery_id,
                error = %err,
                "Failed to dispatch push"
            );
        }
        Err(err) => {
            debug!(
                provider = %provider,
                delivery_id = %delivery_id,
                error = %err,
                "Rejected webhook"
            );
        }
    }
    result
}

/// Runs one delivery through authentication, classification, parsing and
/// dispatch.
pub async fn process_delivery(
    provider: WebhookProvider,
    app_state: &AppState,
    request: &WebhookRequest<'_>,
) -> Result<(StatusCode, &'static str), WebhookError> {
    // Signature-based providers hash the raw body, so this precedes parsing.
    let secret = app_state.webhook_secret();
    provider.authenticate(request, &secret).into_result()?;

    match provider.classify(request) {
        EventClassification::Push => {}
        EventClassification::Ping => return Ok((StatusCode::ACCEPTED, "")),
        EventClassification::Ignored(key) => return Err(WebhookError::IgnoredEvent(key)),
    }

    let events = provider.parse_push(request.body)?;

    // One deadline covers every branch of the push.
    let timeout = app_state.dispatch_timeout();
    tokio::time::timeout(timeout, dispatch_all(app_state, &events))
        .await
        .map_err(|_| WebhookError::DispatchTimeout(timeout))??;

    Ok((StatusCode::ACCEPTED, DISPATCHED_BODY))
}

/// Notifies the material updater of each event in order, stopping at the first
/// failure.
async fn dispatch_all(
    app_state: &AppState,
    events: &[PushEvent],
) -> Result<(), MaterialUpdateError> {
    for event in events {
        let matched = app_state
            .materials()
            .update_git_material(&event.branch, &event.candidate_urls)
            .await?;

        debug!(
            branch = %event.branch,
            candidates = event.candidate_urls.len(),
            matched,
            "Material updater notified"
        );
    }
    Ok(())
}
