//! Webhook handling for SCM push notifications.
//!
//! This module provides:
//! - Credential checks per provider (HTTP Basic token, HMAC signature, header token)
//! - Event classification from the provider's event header
//! - Push payload parsing into canonical [`PushEvent`](crate::types::PushEvent)s
//! - Expansion of a repository URL into every spelling a material may use
//!
//! Nothing here performs I/O; the HTTP endpoints in [`crate::server`] drive it.

pub mod auth;
pub mod events;
pub mod parser;
pub mod provider;
pub mod signature;
pub mod urls;

pub use auth::{
    AuthFailure, AuthenticationOutcome, verify_basic_token, verify_header_token,
    verify_hub_signature,
};
pub use events::EventClassification;
pub use parser::{
    ParseError, parse_bitbucket_cloud_push, parse_bitbucket_server_push, parse_github_push,
    parse_gitlab_push,
};
pub use provider::{WebhookProvider, WebhookRequest};
pub use signature::{
    SignatureAlgorithm, compute_signature, format_signature_header, parse_signature_header,
    verify_signature,
};
pub use urls::{
    RepositoryUrl, UrlError, UrlForm, UrlSuffix, expand_repository_url, strip_ssh_user_info,
};
