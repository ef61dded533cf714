//! A material updater backed by the configured list of git materials.
//!
//! The registry answers "which configured materials does this push refer to?"
//! by exact string match of the material URL against the candidate set and of
//! the material branch against the pushed branch. Each match is logged at
//! `info`; polling is left to whatever consumes the logs or wraps the registry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::types::{Branch, CandidateUrls};

use super::{MaterialUpdateError, MaterialUpdater};

/// A git material as an administrator registered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfiguredMaterial {
    /// The repository URL, exactly as entered.
    pub url: String,

    /// The branch the material builds from.
    pub branch: String,
}

impl ConfiguredMaterial {
    pub fn new(url: impl Into<String>, branch: impl Into<String>) -> Self {
        ConfiguredMaterial {
            url: url.into(),
            branch: branch.into(),
        }
    }

    /// Whether a push to `branch` of a repository known as `candidate_urls`
    /// concerns this material.
    pub fn matches(&self, branch: &Branch, candidate_urls: &CandidateUrls) -> bool {
        self.branch == branch.as_str() && candidate_urls.contains(&self.url)
    }
}

/// Matches push notifications against configured materials.
#[derive(Debug, Clone, Default)]
pub struct MaterialRegistry {
    materials: Vec<ConfiguredMaterial>,
}

impl MaterialRegistry {
    pub fn new(materials: Vec<ConfiguredMaterial>) -> Self {
        MaterialRegistry { materials }
    }

    pub fn materials(&self) -> &[ConfiguredMaterial] {
        &self.materials
    }

    /// Returns every configured material the push refers to.
    pub fn matching<'a>(
        &'a self,
        branch: &'a Branch,
        candidate_urls: &'a CandidateUrls,
    ) -> impl Iterator<Item = &'a ConfiguredMaterial> + 'a {
        self.materials
            .iter()
            .filter(move |material| material.matches(branch, candidate_urls))
    }
}

#[async_trait]
impl MaterialUpdater for MaterialRegistry {
    async fn update_git_material(
        &self,
        branch: &Branch,
        candidate_urls: &CandidateUrls,
    ) -> Result<bool, MaterialUpdateError> {
        let mut matched = 0usize;
        for material in self.matching(branch, candidate_urls) {
            matched += 1;
            info!(
                url = %material.url,
                branch = %material.branch,
                "Material scheduled for update"
            );
        }

        debug!(
            branch = %branch,
            candidates = candidate_urls.len(),
            matched,
            "Matched push against configured materials"
        );

        Ok(matched > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webhooks::expand_repository_url;

    fn branch(name: &str) -> Branch {
        Branch::new(name).unwrap()
    }

    fn registry() -> MaterialRegistry {
        MaterialRegistry::new(vec![
            ConfiguredMaterial::new("git@gitlab.example.com:org/repo.git", "master"),
            ConfiguredMaterial::new("https://gitlab.example.com/org/repo", "develop"),
            ConfiguredMaterial::new("https://gitlab.example.com/org/other", "master"),
        ])
    }

    #[test]
    fn matches_on_url_spelling_and_branch() {
        let urls = expand_repository_url("https://gitlab.example.com/org/repo").unwrap();
        let registry = registry();
        let master = branch("master");

        let matched: Vec<&str> = registry
            .matching(&master, &urls)
            .map(|m| m.url.as_str())
            .collect();

        assert_eq!(matched, vec!["git@gitlab.example.com:org/repo.git"]);
    }

    #[test]
    fn branch_must_match_exactly() {
        let urls = expand_repository_url("https://gitlab.example.com/org/repo").unwrap();
        let registry = registry();
        let feature = branch("feature");

        assert_eq!(registry.matching(&feature, &urls).count(), 0);
    }

    #[tokio::test]
    async fn update_reports_whether_anything_matched() {
        let urls = expand_repository_url("https://gitlab.example.com/org/repo").unwrap();
        let registry = registry();

        assert!(registry.update_git_material(&branch("develop"), &urls).await.unwrap());
        assert!(!registry.update_git_material(&branch("release"), &urls).await.unwrap());
    }

    #[tokio::test]
    async fn empty_registry_never_matches() {
        let urls = expand_repository_url("https://gitlab.example.com/org/repo").unwrap();
        let registry = MaterialRegistry::default();

        assert!(registry.materials().is_empty());
        assert!(!registry.update_git_material(&branch("master"), &urls).await.unwrap());
    }
}
