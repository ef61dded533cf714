//! HMAC webhook signature verification.
//!
//! Bitbucket Server signs payloads with HMAC-SHA256 and GitHub with HMAC-SHA1.
//! Both deliver the digest in the `X-Hub-Signature` header as `<algo>=<hex>`.
//!
//! The digest covers the raw request body exactly as received, so verification
//! must run before the body is parsed.

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// The digest a provider signs its payloads with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// `sha1=<hex>` (GitHub).
    Sha1,
    /// `sha256=<hex>` (Bitbucket Server).
    Sha256,
}

impl SignatureAlgorithm {
    /// The header value prefix, including the `=`.
    pub fn prefix(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha1 => "sha1=",
            SignatureAlgorithm::Sha256 => "sha256=",
        }
    }
}

/// Parses a signature header (e.g., "sha256=abc123...") into raw bytes.
///
/// Returns `None` for malformed headers (wrong prefix, invalid hex, etc.).
/// Never panics.
///
/// # Examples
///
/// ```
/// use material_hooks::webhooks::{SignatureAlgorithm, parse_signature_header};
///
/// assert!(parse_signature_header(SignatureAlgorithm::Sha256, "sha256=abcd1234").is_some());
///
/// // Prefix must match the provider's algorithm
/// assert!(parse_signature_header(SignatureAlgorithm::Sha256, "sha1=abcd1234").is_none());
///
/// // Invalid: bad hex
/// assert!(parse_signature_header(SignatureAlgorithm::Sha1, "sha1=xyz").is_none());
/// ```
pub fn parse_signature_header(algorithm: SignatureAlgorithm, header: &str) -> Option<Vec<u8>> {
    let hex_sig = header.strip_prefix(algorithm.prefix())?;
    hex::decode(hex_sig).ok()
}

/// Computes the HMAC signature of a payload using the given secret.
///
/// Used to build expected signatures in tests and tooling.
pub fn compute_signature(algorithm: SignatureAlgorithm, payload: &[u8], secret: &[u8]) -> Vec<u8> {
    match algorithm {
        SignatureAlgorithm::Sha1 => mac_bytes::<HmacSha1>(payload, secret),
        SignatureAlgorithm::Sha256 => mac_bytes::<HmacSha256>(payload, secret),
    }
}

/// Formats a signature as a header value: `"<algo>=<hex>"`.
pub fn format_signature_header(algorithm: SignatureAlgorithm, signature: &[u8]) -> String {
    format!("{}{}", algorithm.prefix(), hex::encode(signature))
}

/// Verifies a webhook signature header against the payload and secret.
///
/// Returns `true` if the signature is valid, `false` otherwise.
/// Uses constant-time comparison to prevent timing attacks.
///
/// # Arguments
///
/// * `algorithm` - The digest the provider signs with
/// * `payload` - The raw webhook payload bytes
/// * `signature_header` - The value of the `X-Hub-Signature` header
/// * `secret` - The webhook secret shared with the provider
///
/// # Examples
///
/// ```
/// use material_hooks::webhooks::{
///     SignatureAlgorithm, compute_signature, format_signature_header, verify_signature,
/// };
///
/// let algorithm = SignatureAlgorithm::Sha256;
/// let payload = br#"{"eventKey":"repo:refs_changed"}"#;
/// let secret = b"my-secret-key";
///
/// let sig = compute_signature(algorithm, payload, secret);
/// let header = format_signature_header(algorithm, &sig);
///
/// assert!(verify_signature(algorithm, payload, &header, secret));
/// assert!(!verify_signature(algorithm, payload, &header, b"wrong-secret"));
/// ```
pub fn verify_signature(
    algorithm: SignatureAlgorithm,
    payload: &[u8],
    signature_header: &str,
    secret: &[u8],
) -> bool {
    let expected_signature = match parse_signature_header(algorithm, signature_header) {
        Some(sig) => sig,
        None => return false,
    };

    match algorithm {
        SignatureAlgorithm::Sha1 => mac_matches::<HmacSha1>(payload, secret, &expected_signature),
        SignatureAlgorithm::Sha256 => {
            mac_matches::<HmacSha256>(payload, secret, &expected_signature)
        }
    }
}

fn mac_bytes<M: Mac + KeyInit>(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = <M as Mac>::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

fn mac_matches<M: Mac + KeyInit>(payload: &[u8], secret: &[u8], expected: &[u8]) -> bool {
    let mut mac = match <M as Mac>::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);

    // Constant-time comparison via the HMAC library
    mac.verify_slice(expected).is_ok()
}
