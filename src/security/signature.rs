use std::{fmt::Write as _, time::Duration};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const SIGNATURE_HEADER: &str = "x-slack-signature";

const SIGNATURE_VERSION: &str = "v0";

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing request timestamp")]
    MissingTimestamp,
    #[error("malformed request timestamp")]
    InvalidTimestamp,
    #[error("request timestamp outside the allowed window")]
    Stale,
    #[error("missing request signature")]
    MissingSignature,
    #[error("signature mismatch")]
    Mismatch,
}

/// Slack request signing (`v0`): HMAC-SHA256 keyed by the signing secret over
/// `v0:{timestamp}:{raw body}`, sent hex encoded as `v0=<digest>`.
#[derive(Clone)]
pub struct SlackSignatureVerifier {
    secret: String,
    max_skew: Duration,
}

impl SlackSignatureVerifier {
    #[must_use]
    pub fn new(secret: impl Into<String>, max_skew: Duration) -> Self {
        Self {
            secret: secret.into(),
            max_skew,
        }
    }

    pub fn verify(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
        now_unix: i64,
    ) -> Result<(), SignatureError> {
        let timestamp = timestamp
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(SignatureError::MissingTimestamp)?;
        let sent_at = timestamp
            .parse::<i64>()
            .map_err(|_| SignatureError::InvalidTimestamp)?;
        if now_unix.abs_diff(sent_at) > self.max_skew.as_secs() {
            return Err(SignatureError::Stale);
        }

        let found = signature
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(SignatureError::MissingSignature)?;
        let expected = self
            .sign(timestamp, body)
            .ok_or(SignatureError::Mismatch)?;

        if found.as_bytes().ct_eq(expected.as_bytes()).into() {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }

    #[must_use]
    pub fn sign(&self, timestamp: &str, body: &[u8]) -> Option<String> {
        let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(self.secret.as_bytes()).ok()?;
        mac.update(SIGNATURE_VERSION.as_bytes());
        mac.update(b":");
        mac.update(timestamp.as_bytes());
        mac.update(b":");
        mac.update(body);

        let digest = mac.finalize().into_bytes();
        let mut encoded = String::with_capacity(SIGNATURE_VERSION.len() + 1 + digest.len() * 2);
        encoded.push_str(SIGNATURE_VERSION);
        encoded.push('=');
        for byte in digest {
            let _ = write!(encoded, "{byte:02x}");
        }
        Some(encoded)
    }
}
