//! Signature verification for Clerk webhooks, which are delivered through Svix.
//!
//! The signed content is `"{msg_id}.{timestamp}.{raw body}"`, authenticated with
//! HMAC-SHA256 under the base64 key after the `whsec_` prefix. The signature
//! header carries one or more space-separated `v1,<base64>` entries.
//! Verification must run against the exact bytes received, before any parsing.

use axum::http::HeaderMap;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::errors::AppError;

type HmacSha256 = Hmac<Sha256>;

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";
pub const TIMESTAMP_TOLERANCE_SECS: i64 = 5 * 60;

pub const ID_HEADERS: [&str; 2] = ["svix-id", "webhook-id"];
pub const TIMESTAMP_HEADERS: [&str; 2] = ["svix-timestamp", "webhook-timestamp"];
pub const SIGNATURE_HEADERS: [&str; 2] = ["svix-signature", "webhook-signature"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("webhook secret is not a valid signing key")]
    InvalidSecret,

    #[error("missing {0} header")]
    MissingHeader(&'static str),

    #[error("invalid webhook timestamp")]
    InvalidTimestamp,

    #[error("webhook timestamp is outside the allowed window")]
    TimestampOutOfRange,

    #[error("no matching webhook signature")]
    SignatureMismatch,
}

impl From<WebhookError> for AppError {
    fn from(e: WebhookError) -> Self {
        match e {
            WebhookError::InvalidSecret => AppError::Config(e.to_string()),
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}

pub struct WebhookVerifier {
    key: Vec<u8>,
}

impl WebhookVerifier {
    pub fn new(secret: &str) -> Result<Self, WebhookError> {
        let encoded = secret.trim();
        let encoded = encoded.strip_prefix(SECRET_PREFIX).unwrap_or(encoded);
        let key = STANDARD
            .decode(encoded)
            .map_err(|_| WebhookError::InvalidSecret)?;
        if key.is_empty() {
            return Err(WebhookError::InvalidSecret);
        }
        Ok(Self { key })
    }

    /// Versioned signature (`v1,<base64>`) of one delivery.
    pub fn sign(&self, msg_id: &str, timestamp: i64, payload: &[u8]) -> Result<String, WebhookError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).map_err(|_| WebhookError::InvalidSecret)?;
        mac.update(msg_id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        let digest = mac.finalize().into_bytes();
        Ok(format!("{SIGNATURE_VERSION},{}", STANDARD.encode(digest)))
    }

    pub fn verify(&self, headers: &HeaderMap, payload: &[u8]) -> Result<(), WebhookError> {
        self.verify_at(headers, payload, Utc::now().timestamp())
    }

    fn verify_at(&self, headers: &HeaderMap, payload: &[u8], now: i64) -> Result<(), WebhookError> {
        let msg_id = header_value(headers, &ID_HEADERS)?;
        let timestamp_raw = header_value(headers, &TIMESTAMP_HEADERS)?;
        let signatures = header_value(headers, &SIGNATURE_HEADERS)?;

        let timestamp: i64 = timestamp_raw
            .trim()
            .parse()
            .map_err(|_| WebhookError::InvalidTimestamp)?;
        if now.abs_diff(timestamp) > TIMESTAMP_TOLERANCE_SECS.unsigned_abs() {
            return Err(WebhookError::TimestampOutOfRange);
        }

        let expected = self.sign(msg_id, timestamp, payload)?;
        let matched = signatures
            .split_whitespace()
            .filter(|candidate| {
                candidate
                    .split_once(',')
                    .is_some_and(|(version, _)| version == SIGNATURE_VERSION)
            })
            .any(|candidate| bool::from(expected.as_bytes().ct_eq(candidate.as_bytes())));

        if matched {
            Ok(())
        } else {
            Err(WebhookError::SignatureMismatch)
        }
    }
}

/// First present header among `names`, reported under the primary name when absent.
fn header_value<'a>(headers: &'a HeaderMap, names: &[&'static str; 2]) -> Result<&'a str, WebhookError> {
    names
        .iter()
        .find_map(|name| headers.get(*name).and_then(|v| v.to_str().ok()))
        .filter(|v| !v.trim().is_empty())
        .ok_or(WebhookError::MissingHeader(names[0]))
}
