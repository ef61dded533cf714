//! Push payload parsers.
//!
//! Each provider describes a push in its own JSON shape. The parsers here turn
//! those shapes into canonical [`PushEvent`]s, one per pushed branch.
//!
//! # Parsing Strategy
//!
//! 1. The parser is chosen by the endpoint that received the delivery, never by
//!    inspecting the body
//! 2. The repository's SCM kind is checked first; non-git repositories are
//!    refused before anything else in the payload is examined
//! 3. Required fields are enforced by the raw serde structs below; a missing
//!    field is a [`ParseError::JsonError`]
//! 4. A payload that names no branch or no repository URL is malformed; an
//!    empty dispatch is never produced

use serde::Deserialize;
use thiserror::Error;

use crate::types::{Branch, CandidateUrls, PushEvent, ScmKind};

use super::urls::{UrlError, expand_repository_url, strip_ssh_user_info};

/// Error type for push payload parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON deserialization failed (includes missing required fields).
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The repository is not a git repository.
    #[error("Only `git' repositories are currently supported!")]
    UnsupportedScm(ScmKind),

    /// The push did not update any branch (e.g. only tags were pushed).
    #[error("payload does not describe a push to any branch")]
    NoBranches,

    /// The reported repository URL cannot be expanded.
    #[error(transparent)]
    InvalidUrl(#[from] UrlError),

    /// The payload lists no clone URLs.
    #[error("payload does not name any repository URL")]
    NoCandidateUrls,
}

// ============================================================================
// Bitbucket Cloud
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawScmProbe {
    repository: RawScmProbeRepository,
}

#[derive(Debug, Deserialize)]
struct RawScmProbeRepository {
    scm: String,
}

#[derive(Debug, Deserialize)]
struct RawCloudPayload {
    push: RawCloudPush,
    repository: RawCloudRepository,
}

#[derive(Debug, Deserialize)]
struct RawCloudPush {
    changes: Vec<RawCloudChange>,
}

#[derive(Debug, Deserialize)]
struct RawCloudChange {
    // Null when the change deleted the ref.
    new: Option<RawCloudRef>,
}

#[derive(Debug, Deserialize)]
struct RawCloudRef {
    #[serde(rename = "type")]
    kind: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawCloudRepository {
    links: RawCloudLinks,
}

#[derive(Debug, Deserialize)]
struct RawCloudLinks {
    html: RawHref,
}

#[derive(Debug, Deserialize)]
struct RawHref {
    href: String,
}

/// Parses a Bitbucket Cloud `repo:push` payload.
///
/// # Examples
///
/// ```
/// use material_hooks::webhooks::parse_bitbucket_cloud_push;
///
/// let payload = br#"{
///     "push": { "changes": [ { "new": { "type": "branch", "name": "master" } } ] },
///     "repository": {
///         "scm": "git",
///         "full_name": "gocd/spaceship",
///         "links": { "html": { "href": "https://bitbucket.org/gocd/spaceship" } }
///     }
/// }"#;
///
/// let events = parse_bitbucket_cloud_push(payload).unwrap();
/// assert_eq!(events.len(), 1);
/// assert_eq!(events[0].branch.as_str(), "master");
/// assert_eq!(events[0].candidate_urls.len(), 16);
/// ```
pub fn parse_bitbucket_cloud_push(payload: &[u8]) -> Result<Vec<PushEvent>, ParseError> {
    let probe: RawScmProbe = serde_json::from_slice(payload)?;
    require_git(&probe.repository.scm)?;

    let raw: RawCloudPayload = serde_json::from_slice(payload)?;

    let branches = raw
        .push
        .changes
        .into_iter()
        .filter_map(|change| change.new)
        .filter(|new| new.kind == "branch")
        .filter_map(|new| Branch::new(new.name));

    let candidate_urls = expand_repository_url(&raw.repository.links.html.href)?;
    events_for(branches, candidate_urls)
}

// ============================================================================
// Bitbucket Server
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawServerPayload {
    repository: RawServerRepository,
    changes: Vec<RawServerChange>,
}

#[derive(Debug, Deserialize)]
struct RawServerRepository {
    #[serde(rename = "scmId")]
    scm_id: String,
    links: RawServerLinks,
}

#[derive(Debug, Deserialize)]
struct RawServerLinks {
    clone: Vec<RawCloneLink>,
}

#[derive(Debug, Deserialize)]
struct RawCloneLink {
    href: String,
}

#[derive(Debug, Deserialize)]
struct RawServerChange {
    #[serde(rename = "ref")]
    reference: RawServerRef,
}

#[derive(Debug, Deserialize)]
struct RawServerRef {
    #[serde(rename = "displayId")]
    display_id: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Parses a Bitbucket Server `repo:refs_changed` payload.
///
/// The clone links are used as the candidate URLs directly; SSH links lose their
/// user-info so they match how a material would be registered.
pub fn parse_bitbucket_server_push(payload: &[u8]) -> Result<Vec<PushEvent>, ParseError> {
    let raw: RawServerPayload = serde_json::from_slice(payload)?;
    require_git(&raw.repository.scm_id)?;

    let branches = raw
        .changes
        .into_iter()
        .filter(|change| change.reference.kind == "BRANCH")
        .filter_map(|change| Branch::new(change.reference.display_id));

    let candidate_urls = CandidateUrls::new(
        raw.repository
            .links
            .clone
            .iter()
            .map(|link| strip_ssh_user_info(&link.href)),
    )
    .ok_or(ParseError::NoCandidateUrls)?;

    events_for(branches, candidate_urls)
}

// ============================================================================
// GitHub
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawGitHubPayload {
    #[serde(rename = "ref")]
    reference: String,
    repository: RawGitHubRepository,
}

#[derive(Debug, Deserialize)]
struct RawGitHubRepository {
    html_url: String,
}

/// Parses a GitHub `push` payload.
pub fn parse_github_push(payload: &[u8]) -> Result<Vec<PushEvent>, ParseError> {
    let raw: RawGitHubPayload = serde_json::from_slice(payload)?;

    let candidate_urls = expand_repository_url(&raw.repository.html_url)?;
    events_for(Branch::from_ref(&raw.reference), candidate_urls)
}

// ============================================================================
// GitLab
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawGitLabPayload {
    #[serde(rename = "ref")]
    reference: String,
    project: RawGitLabProject,
}

#[derive(Debug, Deserialize)]
struct RawGitLabProject {
    web_url: String,
}

/// Parses a GitLab `Push Hook` payload.
pub fn parse_gitlab_push(payload: &[u8]) -> Result<Vec<PushEvent>, ParseError> {
    let raw: RawGitLabPayload = serde_json::from_slice(payload)?;

    let candidate_urls = expand_repository_url(&raw.project.web_url)?;
    events_for(Branch::from_ref(&raw.reference), candidate_urls)
}

// ============================================================================
// Shared helpers
// ============================================================================

fn require_git(scm_id: &str) -> Result<(), ParseError> {
    match ScmKind::from_id(scm_id) {
        ScmKind::Git => Ok(()),
        other => Err(ParseError::UnsupportedScm(other)),
    }
}

/// Pairs every branch with the repository's candidate URLs.
fn events_for(
    branches: impl IntoIterator<Item = Branch>,
    candidate_urls: CandidateUrls,
) -> Result<Vec<PushEvent>, ParseError> {
    let events: Vec<PushEvent> = branches
        .into_iter()
        .map(|branch| PushEvent {
            branch,
            candidate_urls: candidate_urls.clone(),
        })
        .collect();

    if events.is_empty() {
        return Err(ParseError::NoBranches);
    }
    Ok(events)
}
