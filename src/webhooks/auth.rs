//! Webhook authentication.
//!
//! Each provider proves knowledge of the shared webhook secret differently:
//!
//! | Provider | Credential |
//! |----------|------------|
//! | Bitbucket Cloud | `Authorization: Basic <base64(secret)>` |
//! | Bitbucket Server | `X-Hub-Signature: sha256=<hmac>` |
//! | GitHub | `X-Hub-Signature: sha1=<hmac>` |
//! | GitLab | `X-Gitlab-Token: <secret>` |
//!
//! A missing credential and a wrong credential are distinct failures with
//! distinct messages; both are terminal. Credentials arrive as raw header bytes:
//! a header that is present but not valid text is a wrong credential, never a
//! missing one.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use subtle::ConstantTimeEq;
use thiserror::Error;

use super::signature::{SignatureAlgorithm, verify_signature};

/// Why a webhook request was not authenticated.
///
/// The `Display` text is returned verbatim to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("No token specified via basic authentication!")]
    MissingBasicToken,

    #[error("Token specified via basic authentication did not match!")]
    BasicTokenMismatch,

    #[error("No HMAC signature specified via `X-Hub-Signature' header!")]
    MissingSignature,

    #[error("HMAC signature specified via `X-Hub-Signature' did not match!")]
    SignatureMismatch,

    #[error("No token specified in the `X-Gitlab-Token' header!")]
    MissingGitlabToken,

    #[error("Token specified in the `X-Gitlab-Token' header did not match!")]
    GitlabTokenMismatch,
}

/// Result of checking a request's credential against the webhook secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationOutcome {
    Authenticated,
    Rejected(AuthFailure),
}

impl AuthenticationOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthenticationOutcome::Authenticated)
    }

    /// Converts into a `Result` for use with `?`.
    pub fn into_result(self) -> Result<(), AuthFailure> {
        match self {
            AuthenticationOutcome::Authenticated => Ok(()),
            AuthenticationOutcome::Rejected(failure) => Err(failure),
        }
    }
}

/// Verifies an `Authorization: Basic ...` header against the secret.
///
/// The decoded credential must equal the secret byte-for-byte. A header using
/// another scheme, or carrying invalid base64, counts as a mismatch.
///
/// # Examples
///
/// ```
/// use material_hooks::webhooks::{AuthFailure, AuthenticationOutcome, verify_basic_token};
///
/// // base64("s3cret")
/// let outcome = verify_basic_token(Some(b"Basic czNjcmV0".as_slice()), b"s3cret");
/// assert_eq!(outcome, AuthenticationOutcome::Authenticated);
///
/// let outcome = verify_basic_token(None, b"s3cret");
/// assert_eq!(outcome, AuthenticationOutcome::Rejected(AuthFailure::MissingBasicToken));
/// ```
pub fn verify_basic_token(authorization: Option<&[u8]>, secret: &[u8]) -> AuthenticationOutcome {
    let Some(authorization) = authorization else {
        return AuthenticationOutcome::Rejected(AuthFailure::MissingBasicToken);
    };

    let matches = decode_basic_credential(authorization)
        .is_some_and(|credential| bool::from(credential.ct_eq(secret)));

    if matches {
        AuthenticationOutcome::Authenticated
    } else {
        AuthenticationOutcome::Rejected(AuthFailure::BasicTokenMismatch)
    }
}

/// Verifies an `X-Hub-Signature` header against the raw body.
pub fn verify_hub_signature(
    algorithm: SignatureAlgorithm,
    payload: &[u8],
    signature_header: Option<&[u8]>,
    secret: &[u8],
) -> AuthenticationOutcome {
    let Some(header) = signature_header else {
        return AuthenticationOutcome::Rejected(AuthFailure::MissingSignature);
    };

    let matches = std::str::from_utf8(header)
        .is_ok_and(|header| verify_signature(algorithm, payload, header, secret));

    if matches {
        AuthenticationOutcome::Authenticated
    } else {
        AuthenticationOutcome::Rejected(AuthFailure::SignatureMismatch)
    }
}

/// Verifies a plain-text token header (GitLab's `X-Gitlab-Token`).
pub fn verify_header_token(token: Option<&[u8]>, secret: &[u8]) -> AuthenticationOutcome {
    match token {
        None => AuthenticationOutcome::Rejected(AuthFailure::MissingGitlabToken),
        Some(token) if bool::from(token.ct_eq(secret)) => AuthenticationOutcome::Authenticated,
        Some(_) => AuthenticationOutcome::Rejected(AuthFailure::GitlabTokenMismatch),
    }
}

/// Decodes the credential of a `Basic` authorization header.
///
/// The scheme name is case-insensitive (RFC 7617).
fn decode_basic_credential(authorization: &[u8]) -> Option<Vec<u8>> {
    let authorization = std::str::from_utf8(authorization).ok()?;
    let (scheme, encoded) = authorization.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    STANDARD.decode(encoded.trim()).ok()
}
