//! Signed tokens for local signed URLs.
//!
//! Payload: expiry_ts (u64 BE) || storage key (UTF-8).
//! Token = base64url(payload || HMAC-SHA256(secret, payload)).

use crate::{StorageError, StorageResult};
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const EXPIRY_LEN: usize = 8;
const MAC_LEN: usize = 32; // SHA256

type HmacSha256 = Hmac<Sha256>;

fn new_mac(secret: &[u8]) -> StorageResult<HmacSha256> {
    HmacSha256::new_from_slice(secret)
        .map_err(|e| StorageError::ConfigError(format!("Invalid signing secret: {}", e)))
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Build a token granting access to `storage_key` for `expires_in`.
pub fn create(storage_key: &str, expires_in: Duration, secret: &[u8]) -> StorageResult<String> {
    create_at(storage_key, now_secs().saturating_add(expires_in.as_secs()), secret)
}

fn create_at(storage_key: &str, expiry_ts: u64, secret: &[u8]) -> StorageResult<String> {
    let mut payload = Vec::with_capacity(EXPIRY_LEN + storage_key.len() + MAC_LEN);
    payload.extend_from_slice(&expiry_ts.to_be_bytes());
    payload.extend_from_slice(storage_key.as_bytes());

    let mut mac = new_mac(secret)?;
    mac.update(&payload);
    let tag = mac.finalize().into_bytes();
    payload.extend_from_slice(&tag);

    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(payload))
}

/// Verify a token and return the storage key it grants access to.
pub fn verify(token: &str, secret: &[u8]) -> StorageResult<String> {
    verify_at(token, secret, now_secs())
}

fn verify_at(token: &str, secret: &[u8], now: u64) -> StorageResult<String> {
    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| StorageError::InvalidSignature)?;
    if decoded.len() <= EXPIRY_LEN + MAC_LEN {
        return Err(StorageError::InvalidSignature);
    }

    let (payload, tag) = decoded.split_at(decoded.len() - MAC_LEN);
    let mut mac = new_mac(secret)?;
    mac.update(payload);
    mac.verify_slice(tag)
        .map_err(|_| StorageError::InvalidSignature)?;

    let mut expiry = [0u8; EXPIRY_LEN];
    expiry.copy_from_slice(&payload[..EXPIRY_LEN]);
    if now >= u64::from_be_bytes(expiry) {
        return Err(StorageError::Expired);
    }

    String::from_utf8(payload[EXPIRY_LEN..].to_vec()).map_err(|_| StorageError::InvalidSignature)
}
