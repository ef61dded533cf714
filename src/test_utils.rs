//! Shared test utilities: material updater doubles, payload fixtures, and
//! arbitrary generators for property-based testing.

use std::sync::Mutex;

use async_trait::async_trait;
use proptest::prelude::*;
use serde_json::json;

use crate::materials::{MaterialUpdateError, MaterialUpdater};
use crate::types::{Branch, CandidateUrls};

// ============================================================================
// Material updater doubles
// ============================================================================

/// Records every call and answers with a fixed result.
///
/// Optionally fails once it reaches a given branch, after recording the call.
#[derive(Debug, Default)]
pub struct RecordingMaterialUpdater {
    calls: Mutex<Vec<(Branch, CandidateUrls)>>,
    matched: bool,
    fail_on: Option<String>,
}

impl RecordingMaterialUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    /// An updater that reports a matching material for every call.
    pub fn matching() -> Self {
        RecordingMaterialUpdater {
            matched: true,
            ..Self::default()
        }
    }

    /// An updater that fails when notified about `branch`.
    pub fn failing_on(branch: &str) -> Self {
        RecordingMaterialUpdater {
            fail_on: Some(branch.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(Branch, CandidateUrls)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MaterialUpdater for RecordingMaterialUpdater {
    async fn update_git_material(
        &self,
        branch: &Branch,
        candidate_urls: &CandidateUrls,
    ) -> Result<bool, MaterialUpdateError> {
        self.calls
            .lock()
            .unwrap()
            .push((branch.clone(), candidate_urls.clone()));
        if self.fail_on.as_deref() == Some(branch.as_str()) {
            return Err(MaterialUpdateError::new(format!("cannot update {branch}")));
        }
        Ok(self.matched)
    }
}

/// Answers every call after a fixed delay.
#[derive(Debug)]
pub struct SlowMaterialUpdater {
    pub delay: std::time::Duration,
}

#[async_trait]
impl MaterialUpdater for SlowMaterialUpdater {
    async fn update_git_material(
        &self,
        _branch: &Branch,
        _candidate_urls: &CandidateUrls,
    ) -> Result<bool, MaterialUpdateError> {
        tokio::time::sleep(self.delay).await;
        Ok(false)
    }
}

/// Fails every call.
#[derive(Debug, Default)]
pub struct FailingMaterialUpdater;

#[async_trait]
impl MaterialUpdater for FailingMaterialUpdater {
    async fn update_git_material(
        &self,
        _branch: &Branch,
        _candidate_urls: &CandidateUrls,
    ) -> Result<bool, MaterialUpdateError> {
        Err(MaterialUpdateError::with_source(
            "poller unavailable",
            std::io::Error::other("connection refused"),
        ))
    }
}

/// Never answers.
#[derive(Debug, Default)]
pub struct HangingMaterialUpdater;

#[async_trait]
impl MaterialUpdater for HangingMaterialUpdater {
    async fn update_git_material(
        &self,
        _branch: &Branch,
        _candidate_urls: &CandidateUrls,
    ) -> Result<bool, MaterialUpdateError> {
        std::future::pending().await
    }
}

// ============================================================================
// Payload fixtures
// ============================================================================

pub fn bitbucket_cloud_payload(scm: &str, branch: &str, href: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "push": {
            "changes": [
                {
                    "new": { "type": "branch", "name": branch },
                    "old": { "type": "branch", "name": branch }
                }
            ]
        },
        "repository": {
            "scm": scm,
            "full_name": "org/repo",
            "links": { "html": { "href": href } }
        }
    }))
    .unwrap()
}

/// A Bitbucket Cloud push updating several branches at once.
pub fn bitbucket_cloud_multi_branch_payload(branches: &[&str], href: &str) -> Vec<u8> {
    let changes: Vec<serde_json::Value> = branches
        .iter()
        .map(|branch| json!({ "new": { "type": "branch", "name": branch } }))
        .collect();
    serde_json::to_vec(&json!({
        "push": { "changes": changes },
        "repository": {
            "scm": "git",
            "full_name": "org/repo",
            "links": { "html": { "href": href } }
        }
    }))
    .unwrap()
}

pub fn bitbucket_server_payload(scm_id: &str, branch: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "eventKey": "repo:refs_changed",
        "repository": {
            "slug": "my-repo",
            "scmId": scm_id,
            "links": {
                "clone": [
                    {
                        "href": "https://git.my-company.com/scm/my-proj/my-repo.git",
                        "name": "http"
                    },
                    {
                        "href": "ssh://git@git.my-company.com:7999/my-proj/my-repo.git",
                        "name": "ssh"
                    }
                ]
            }
        },
        "changes": [
            {
                "ref": {
                    "id": format!("refs/heads/{branch}"),
                    "displayId": branch,
                    "type": "BRANCH"
                },
                "type": "UPDATE"
            }
        ]
    }))
    .unwrap()
}

pub fn github_payload(branch: &str, html_url: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "ref": format!("refs/heads/{branch}"),
        "repository": { "full_name": "org/repo", "html_url": html_url }
    }))
    .unwrap()
}

pub fn gitlab_payload(branch: &str, web_url: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "object_kind": "push",
        "ref": format!("refs/heads/{branch}"),
        "project": { "path_with_namespace": "org/repo", "web_url": web_url }
    }))
    .unwrap()
}

// ============================================================================
// Generators
// ============================================================================

pub fn arb_branch_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9/_-]{0,30}".prop_map(String::from)
}

pub fn arb_secret() -> impl Strategy<Value = String> {
    "[A-Za-z0-9]{1,40}".prop_map(String::from)
}

pub fn arb_body() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..256)
}
