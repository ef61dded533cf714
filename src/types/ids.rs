//! Newtype wrappers for webhook identifiers.
//!
//! These keep branch names and delivery IDs from being mixed up with the many
//! other strings that flow through webhook processing (URLs, event keys, refs).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of a fully qualified branch ref.
const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// A short branch name, as an administrator would configure it on a material.
///
/// Always the human-readable name (`master`, `feature/login`), never the full
/// `refs/heads/...` path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Branch(String);

impl Branch {
    /// Creates a branch from a short name.
    ///
    /// Returns `None` for an empty name.
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.is_empty() {
            None
        } else {
            Some(Branch(name))
        }
    }

    /// Creates a branch from a fully qualified ref (`refs/heads/<name>`).
    ///
    /// Returns `None` for refs outside `refs/heads/` (tags, notes, ...) and
    /// for the bare prefix.
    ///
    /// # Examples
    ///
    /// ```
    /// use material_hooks::types::Branch;
    ///
    /// let branch = Branch::from_ref("refs/heads/feature/login").unwrap();
    /// assert_eq!(branch.as_str(), "feature/login");
    ///
    /// assert!(Branch::from_ref("refs/tags/v1.0").is_none());
    /// ```
    pub fn from_ref(reference: &str) -> Option<Self> {
        reference.strip_prefix(BRANCH_REF_PREFIX).and_then(Branch::new)
    }

    /// Returns the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Branch {
    type Error = &'static str;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Branch::new(name).ok_or("branch name must not be empty")
    }
}

impl From<Branch> for String {
    fn from(branch: Branch) -> Self {
        branch.0
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A provider-assigned delivery ID, used only to correlate log lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryId(pub String);

impl DeliveryId {
    pub fn new(s: impl Into<String>) -> Self {
        DeliveryId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DeliveryId {
    fn from(s: String) -> Self {
        DeliveryId(s)
    }
}
