//! The canonical push event handed to the material updater.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::ids::Branch;

/// The source-control system a provider reports for a repository.
///
/// Only git repositories can be matched against materials; everything else is
/// rejected at the parse boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScmKind {
    Git,
    Other(String),
}

impl ScmKind {
    /// Interprets a provider's SCM identifier (`"git"`, `"hg"`, ...).
    pub fn from_id(id: &str) -> Self {
        match id {
            "git" => ScmKind::Git,
            other => ScmKind::Other(other.to_string()),
        }
    }

    pub fn is_git(&self) -> bool {
        matches!(self, ScmKind::Git)
    }
}

impl fmt::Display for ScmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScmKind::Git => write!(f, "git"),
            ScmKind::Other(id) => write!(f, "{}", id),
        }
    }
}

/// The set of URL spellings under which a repository may have been configured
/// as a material.
///
/// Never empty: construction fails rather than producing an empty set, so a
/// dispatch always names at least one repository identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeSet<String>")]
pub struct CandidateUrls(BTreeSet<String>);

impl CandidateUrls {
    /// Builds a candidate set, returning `None` if no URLs were supplied.
    ///
    /// Duplicates collapse; iteration order is lexicographic.
    pub fn new(urls: impl IntoIterator<Item = String>) -> Option<Self> {
        let set: BTreeSet<String> = urls.into_iter().collect();
        if set.is_empty() {
            None
        } else {
            Some(CandidateUrls(set))
        }
    }

    /// Builds a candidate set around a URL that is known to be present.
    pub fn with_primary(primary: String, others: impl IntoIterator<Item = String>) -> Self {
        let mut set: BTreeSet<String> = others.into_iter().collect();
        set.insert(primary);
        CandidateUrls(set)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; provided for API symmetry with `len`.
    ///
    /// Every constructor, including deserialization, refuses an empty set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.0.contains(url)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl TryFrom<BTreeSet<String>> for CandidateUrls {
    type Error = &'static str;

    fn try_from(urls: BTreeSet<String>) -> Result<Self, Self::Error> {
        CandidateUrls::new(urls).ok_or("candidate URL set must not be empty")
    }
}

/// A push to a single git branch, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEvent {
    /// The branch that received new commits.
    pub branch: Branch,

    /// Every spelling of the pushed repository's URL.
    pub candidate_urls: CandidateUrls,
}
