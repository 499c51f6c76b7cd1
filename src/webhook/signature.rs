//! Webhook signature verification.
//!
//! The gateway signs the exact request bytes with HMAC-SHA256 using the shared webhook secret and
//! sends the base64-encoded MAC in a configurable header. Verification must run on the raw body,
//! before any JSON parsing.

use actix_web::http::header::HeaderMap;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use log::{trace, warn};
use sha2::Sha256;

use crate::secret::Secret;

type HmacSha256 = Hmac<Sha256>;

pub trait SignatureVerifier: Send + Sync + 'static {
    fn verify(&self, body: &[u8], headers: &HeaderMap) -> bool;
}

pub struct HmacVerifier {
    header: String,
    key: Secret<String>,
}

impl HmacVerifier {
    pub fn new(header: &str, key: Secret<String>) -> Self {
        Self { header: header.to_ascii_lowercase(), key }
    }
}

impl SignatureVerifier for HmacVerifier {
    fn verify(&self, body: &[u8], headers: &HeaderMap) -> bool {
        let Some(value) = headers.get(self.header.as_str()) else {
            warn!("🔐️ No signature header '{}' on webhook request", self.header);
            return false;
        };
        let Ok(value) = value.to_str() else {
            warn!("🔐️ Signature header is not valid ASCII");
            return false;
        };
        let Ok(expected) = STANDARD.decode(value.trim()) else {
            warn!("🔐️ Signature header is not valid base64");
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(self.key.reveal().as_bytes()) else {
            return false;
        };
        mac.update(body);
        let valid = mac.verify_slice(&expected).is_ok();
        if valid {
            trace!("🔐️ Webhook signature check ✅️");
        } else {
            warn!("🔐️ Invalid webhook signature");
        }
        valid
    }
}

/// Base64 HMAC-SHA256 of `body`, as the gateway would send it.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    STANDARD.encode(mac.finalize().into_bytes())
}
