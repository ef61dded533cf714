//! The material-update seam.
//!
//! Webhook processing ends by telling a [`MaterialUpdater`] that a branch of a
//! repository, known under a set of candidate URLs, has new commits. Whether and
//! when materials are actually polled is the updater's business.
//!
//! Implementations:
//! - [`MaterialRegistry`]: matches against materials listed in configuration
//! - Test doubles in `test_utils` record calls, fail, or hang

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{Branch, CandidateUrls};

pub mod registry;

pub use registry::{ConfiguredMaterial, MaterialRegistry};

/// The material updater failed to process a notification.
///
/// This is a fault of the updater, not a "no matching material" outcome; it is
/// surfaced to the webhook caller as a server error.
#[derive(Debug, Error)]
#[error("material update failed: {message}")]
pub struct MaterialUpdateError {
    /// A human-readable description of the failure.
    pub message: String,

    /// The underlying error, if available.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl MaterialUpdateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Receives push notifications for git materials.
///
/// # Example (mock for testing)
///
/// ```ignore
/// struct AlwaysMatches;
///
/// #[async_trait]
/// impl MaterialUpdater for AlwaysMatches {
///     async fn update_git_material(
///         &self,
///         _branch: &Branch,
///         _candidate_urls: &CandidateUrls,
///     ) -> Result<bool, MaterialUpdateError> {
///         Ok(true)
///     }
/// }
/// ```
#[async_trait]
pub trait MaterialUpdater: Send + Sync {
    /// Notifies the updater that `branch` of the repository known as any of
    /// `candidate_urls` has changed.
    ///
    /// Returns whether at least one configured material matched.
    async fn update_git_material(
        &self,
        branch: &Branch,
        candidate_urls: &CandidateUrls,
    ) -> Result<bool, MaterialUpdateError>;
}
