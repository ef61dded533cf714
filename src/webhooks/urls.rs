//! Repository URL spellings.
//!
//! An administrator may register the same repository as a material under many
//! textually different URLs: with or without `.git`, with a trailing slash, over
//! `https`, `http`, the git protocol, or SCP-style SSH. Providers that report a
//! single browse URL get it expanded into every such spelling; providers that
//! report clone URLs only need the SSH user-info removed.
//!
//! Expansion works on a parsed `(scheme, authority, path)` triple and is the
//! full cartesian product of [`UrlForm::ALL`] and [`UrlSuffix::ALL`].

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::types::CandidateUrls;

/// Error for URLs that are not `scheme://host/path`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("repository URL {0:?} has no scheme")]
    MissingScheme(String),

    #[error("repository URL {0:?} has no host")]
    MissingHost(String),

    #[error("repository URL {0:?} has no repository path")]
    MissingPath(String),
}

/// A repository URL reduced to the parts that identify the repository.
///
/// The path never carries a leading `/`, a trailing `/`, or a `.git` suffix;
/// those are spelling variations, reintroduced by [`UrlSuffix`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryUrl {
    scheme: String,
    authority: String,
    path: String,
}

impl RepositoryUrl {
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host and optional port, without any user-info.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// The host alone, with any port removed.
    pub fn host(&self) -> &str {
        split_port(&self.authority).0
    }

    /// Repository path, e.g. `org/repo`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Renders one spelling of this repository URL.
    pub fn render(&self, form: UrlForm, suffix: UrlSuffix) -> String {
        let suffix = suffix.as_str();
        match form {
            UrlForm::Https => format!("https://{}/{}{}", self.authority, self.path, suffix),
            UrlForm::Http => format!("http://{}/{}{}", self.authority, self.path, suffix),
            UrlForm::Git => format!("git://{}/{}{}", self.authority, self.path, suffix),
            // SCP syntax has no place for a port.
            UrlForm::ScpSsh => format!("git@{}:{}{}", self.host(), self.path, suffix),
        }
    }

    /// Every spelling of this repository URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use material_hooks::webhooks::RepositoryUrl;
    ///
    /// let url: RepositoryUrl = "https://gitlab.example.com/org/repo".parse().unwrap();
    /// let candidates = url.expand();
    ///
    /// assert_eq!(candidates.len(), 16);
    /// assert!(candidates.contains("git@gitlab.example.com:org/repo.git/"));
    /// ```
    pub fn expand(&self) -> CandidateUrls {
        let urls = UrlForm::ALL.iter().flat_map(|&form| {
            UrlSuffix::ALL
                .iter()
                .map(move |&suffix| self.render(form, suffix))
        });
        CandidateUrls::with_primary(self.render(UrlForm::Https, UrlSuffix::Bare), urls)
    }
}

impl FromStr for RepositoryUrl {
    type Err = UrlError;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        let trimmed = url.trim();
        let (scheme, rest) = trimmed
            .split_once("://")
            .filter(|(scheme, _)| is_scheme(scheme))
            .ok_or_else(|| UrlError::MissingScheme(url.to_string()))?;

        // Query strings and fragments are not part of a repository identity.
        let rest = rest.split(['?', '#']).next().unwrap_or_default();

        let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
        let authority = strip_user_info(authority);
        if split_port(authority).0.is_empty() {
            return Err(UrlError::MissingHost(url.to_string()));
        }

        let path = normalize_path(path);
        if path.is_empty() {
            return Err(UrlError::MissingPath(url.to_string()));
        }

        Ok(RepositoryUrl {
            scheme: scheme.to_ascii_lowercase(),
            authority: authority.to_string(),
            path: path.to_string(),
        })
    }
}

impl fmt::Display for RepositoryUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.authority, self.path)
    }
}

/// How a material URL names the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlForm {
    /// `https://host/path`
    Https,
    /// `http://host/path`
    Http,
    /// `git://host/path`
    Git,
    /// `git@host:path`
    ScpSsh,
}

impl UrlForm {
    pub const ALL: [UrlForm; 4] = [UrlForm::Https, UrlForm::Http, UrlForm::Git, UrlForm::ScpSsh];
}

/// How a material URL ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlSuffix {
    Bare,
    DotGit,
    Slash,
    DotGitSlash,
}

impl UrlSuffix {
    pub const ALL: [UrlSuffix; 4] = [
        UrlSuffix::Bare,
        UrlSuffix::DotGit,
        UrlSuffix::Slash,
        UrlSuffix::DotGitSlash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UrlSuffix::Bare => "",
            UrlSuffix::DotGit => ".git",
            UrlSuffix::Slash => "/",
            UrlSuffix::DotGitSlash => ".git/",
        }
    }
}

/// Expands a provider-reported repository URL into every equivalent spelling.
pub fn expand_repository_url(url: &str) -> Result<CandidateUrls, UrlError> {
    Ok(url.parse::<RepositoryUrl>()?.expand())
}

/// Removes the user-info from an `ssh://` URL.
///
/// Clone links carry the SSH user (`ssh://git@host:7999/p/r.git`), while
/// materials are usually registered without it. Other URLs are returned
/// unchanged.
///
/// # Examples
///
/// ```
/// use material_hooks::webhooks::strip_ssh_user_info;
///
/// assert_eq!(
///     strip_ssh_user_info("ssh://git@git.my-company.com:7999/my-proj/my-repo.git"),
///     "ssh://git.my-company.com:7999/my-proj/my-repo.git"
/// );
/// assert_eq!(
///     strip_ssh_user_info("https://git.my-company.com/scm/my-proj/my-repo.git"),
///     "https://git.my-company.com/scm/my-proj/my-repo.git"
/// );
/// ```
pub fn strip_ssh_user_info(url: &str) -> String {
    let Some(rest) = url.strip_prefix("ssh://") else {
        return url.to_string();
    };
    let (authority, path) = match rest.find('/') {
        Some(slash) => rest.split_at(slash),
        None => (rest, ""),
    };
    format!("ssh://{}{}", strip_user_info(authority), path)
}

/// RFC 3986 scheme: a letter followed by letters, digits, `+`, `-` or `.`.
fn is_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn strip_user_info(authority: &str) -> &str {
    match authority.rfind('@') {
        Some(at) => &authority[at + 1..],
        None => authority,
    }
}

/// Splits `host:port` into host and port. Bracketed IPv6 hosts keep their
/// brackets.
fn split_port(authority: &str) -> (&str, Option<&str>) {
    let host_end = if authority.starts_with('[') {
        authority.find(']').map_or(authority.len(), |i| i + 1)
    } else {
        0
    };
    match authority[host_end..].rfind(':') {
        Some(i) => {
            let colon = host_end + i;
            (&authority[..colon], Some(&authority[colon + 1..]))
        }
        None => (authority, None),
    }
}

fn normalize_path(path: &str) -> &str {
    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    path.trim_end_matches('/')
}
