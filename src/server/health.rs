//! Liveness endpoint.
//!
//! Answers 200 whenever the process is serving HTTP; it does not consult the
//! material updater or the secret.

use axum::http::StatusCode;

/// Health check handler.
///
/// ```ignore
/// GET /health HTTP/1.1
///
/// HTTP/1.1 200 OK
///
/// OK
/// ```
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
