//! The SCM providers that can deliver push webhooks.
//!
//! Each provider is a fixed combination of an authentication scheme, an event
//! header, and a payload parser. The endpoint that receives a delivery decides
//! the provider; nothing is inferred from the request itself.

use std::fmt;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

use crate::types::{DeliveryId, PushEvent};

use super::auth::{
    AuthenticationOutcome, verify_basic_token, verify_header_token, verify_hub_signature,
};
use super::events::EventClassification;
use super::parser::{
    ParseError, parse_bitbucket_cloud_push, parse_bitbucket_server_push, parse_github_push,
    parse_gitlab_push,
};
use super::signature::SignatureAlgorithm;

/// Header carrying HMAC signatures (Bitbucket Server, GitHub).
const HEADER_SIGNATURE: &str = "x-hub-signature";
/// Header carrying GitLab's plain-text token.
const HEADER_GITLAB_TOKEN: &str = "x-gitlab-token";

/// An inbound webhook delivery: headers plus the body exactly as received.
///
/// Header lookup is case-insensitive.
#[derive(Debug, Clone, Copy)]
pub struct WebhookRequest<'a> {
    pub headers: &'a HeaderMap,
    pub body: &'a [u8],
}

impl<'a> WebhookRequest<'a> {
    pub fn new(headers: &'a HeaderMap, body: &'a [u8]) -> Self {
        WebhookRequest { headers, body }
    }

    /// Returns a header's raw value, or `None` only if it is absent.
    pub fn header_bytes(&self, name: &str) -> Option<&'a [u8]> {
        self.headers.get(name).map(|v| v.as_bytes())
    }

    /// Returns a header as a string, or `None` if it is absent or not visible
    /// ASCII. Credential checks use [`header_bytes`](Self::header_bytes) instead.
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A source-control hosting provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebhookProvider {
    /// Bitbucket Cloud (bitbucket.org). Shared secret via HTTP Basic auth.
    BitbucketCloud,
    /// Bitbucket Server / Data Center. HMAC-SHA256 signed payloads.
    BitbucketServer,
    /// GitHub. HMAC-SHA1 signed payloads.
    GitHub,
    /// GitLab. Shared secret in `X-Gitlab-Token`.
    GitLab,
}

impl WebhookProvider {
    pub const ALL: [WebhookProvider; 4] = [
        WebhookProvider::BitbucketCloud,
        WebhookProvider::BitbucketServer,
        WebhookProvider::GitHub,
        WebhookProvider::GitLab,
    ];

    /// Short name used in routes and log fields.
    pub fn name(&self) -> &'static str {
        match self {
            WebhookProvider::BitbucketCloud => "bitbucket",
            WebhookProvider::BitbucketServer => "hosted_bitbucket",
            WebhookProvider::GitHub => "github",
            WebhookProvider::GitLab => "gitlab",
        }
    }

    /// The header naming the event type.
    pub fn event_header(&self) -> &'static str {
        match self {
            WebhookProvider::BitbucketCloud | WebhookProvider::BitbucketServer => "x-event-key",
            WebhookProvider::GitHub => "x-github-event",
            WebhookProvider::GitLab => "x-gitlab-event",
        }
    }

    /// The header carrying the provider's delivery ID, if it sends one.
    pub fn delivery_header(&self) -> &'static str {
        match self {
            WebhookProvider::BitbucketCloud => "x-request-uuid",
            WebhookProvider::BitbucketServer => "x-request-id",
            WebhookProvider::GitHub => "x-github-delivery",
            WebhookProvider::GitLab => "x-gitlab-event-uuid",
        }
    }

    fn push_event_key(&self) -> &'static str {
        match self {
            WebhookProvider::BitbucketCloud => "repo:push",
            WebhookProvider::BitbucketServer => "repo:refs_changed",
            WebhookProvider::GitHub => "push",
            WebhookProvider::GitLab => "Push Hook",
        }
    }

    fn ping_event_key(&self) -> Option<&'static str> {
        match self {
            WebhookProvider::BitbucketServer => Some("diagnostics:ping"),
            WebhookProvider::GitHub => Some("ping"),
            WebhookProvider::BitbucketCloud | WebhookProvider::GitLab => None,
        }
    }

    /// Checks the request's credential against the webhook secret.
    ///
    /// Signature-based providers hash `request.body` as received, so this must
    /// run before the body is parsed.
    pub fn authenticate(
        &self,
        request: &WebhookRequest<'_>,
        secret: &[u8],
    ) -> AuthenticationOutcome {
        match self {
            WebhookProvider::BitbucketCloud => {
                let authorization = request.header_bytes(AUTHORIZATION.as_str());
                verify_basic_token(authorization, secret)
            }
            WebhookProvider::BitbucketServer => verify_hub_signature(
                SignatureAlgorithm::Sha256,
                request.body,
                request.header_bytes(HEADER_SIGNATURE),
                secret,
            ),
            WebhookProvider::GitHub => verify_hub_signature(
                SignatureAlgorithm::Sha1,
                request.body,
                request.header_bytes(HEADER_SIGNATURE),
                secret,
            ),
            WebhookProvider::GitLab => {
                verify_header_token(request.header_bytes(HEADER_GITLAB_TOKEN), secret)
            }
        }
    }

    /// Classifies the delivery from its event header.
    ///
    /// A header that is present but not valid UTF-8 is classified by its lossy
    /// text, so it is ignored rather than treated as missing.
    pub fn classify(&self, request: &WebhookRequest<'_>) -> EventClassification {
        let event_key = request
            .header_bytes(self.event_header())
            .map(String::from_utf8_lossy);
        EventClassification::from_event_key(
            event_key.as_deref(),
            self.push_event_key(),
            self.ping_event_key(),
        )
    }

    /// Parses a push payload into one event per pushed branch.
    pub fn parse_push(&self, body: &[u8]) -> Result<Vec<PushEvent>, ParseError> {
        match self {
            WebhookProvider::BitbucketCloud => parse_bitbucket_cloud_push(body),
            WebhookProvider::BitbucketServer => parse_bitbucket_server_push(body),
            WebhookProvider::GitHub => parse_github_push(body),
            WebhookProvider::GitLab => parse_gitlab_push(body),
        }
    }

    /// Extracts the delivery ID for log correlation.
    pub fn delivery_id(&self, request: &WebhookRequest<'_>) -> Option<DeliveryId> {
        request.header(self.delivery_header()).map(DeliveryId::new)
    }
}

impl fmt::Display for WebhookProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
