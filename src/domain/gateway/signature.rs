//! Pagar.me webhook signature verification.
//!
//! The gateway signs the raw request body with HMAC-SHA256 under the
//! shared webhook secret and sends `x-hub-signature-256: sha256=<hex>`.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::webhook_errors::WebhookError;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const SHA256_PREFIX: &str = "sha256=";

/// Parsed signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub digest: Vec<u8>,
}

impl SignatureHeader {
    /// Parses `sha256=<hex>`; a bare hex digest is also accepted.
    ///
    /// # Errors
    ///
    /// `InvalidSignature` for an empty header, an unknown algorithm prefix
    /// or non-hex digest.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let header = header.trim();
        let hex_digest = match header.split_once('=') {
            Some((algorithm, digest)) if algorithm.eq_ignore_ascii_case("sha256") => digest,
            Some(_) => return Err(WebhookError::InvalidSignature),
            None => header,
        };
        if hex_digest.is_empty() {
            return Err(WebhookError::InvalidSignature);
        }
        let digest = hex::decode(hex_digest).map_err(|_| WebhookError::InvalidSignature)?;
        Ok(Self { digest })
    }
}

/// Verifies webhook bodies against the shared secret.
#[derive(Clone)]
pub struct WebhookSignatureVerifier {
    secret: SecretString,
}

impl WebhookSignatureVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Checks `signature_header` against `payload`.
    ///
    /// # Errors
    ///
    /// `InvalidSignature` when the header is malformed or the digest differs.
    pub fn verify(&self, signature_header: &str, payload: &[u8]) -> Result<(), WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;
        let expected = compute_digest(self.secret.expose_secret().as_bytes(), payload);
        if constant_time_compare(&expected, &header.digest) {
            Ok(())
        } else {
            Err(WebhookError::InvalidSignature)
        }
    }

    /// Boolean form of [`verify`](Self::verify).
    pub fn is_valid(&self, signature_header: &str, payload: &[u8]) -> bool {
        self.verify(signature_header, payload).is_ok()
    }
}

impl std::fmt::Debug for WebhookSignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSignatureVerifier")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

fn compute_digest(secret: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret).expect("HMAC accepts any key");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Header value the gateway would send for `payload`.
///
/// Used by the mock gateway and by tests that post signed webhooks.
pub fn sign_payload(secret: &str, payload: &[u8]) -> String {
    format!(
        "{}{}",
        SHA256_PREFIX,
        hex::encode(compute_digest(secret.as_bytes(), payload))
    )
}
