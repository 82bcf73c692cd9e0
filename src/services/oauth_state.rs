// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed OAuth `state` parameter.
//!
//! Format before encoding: `provider|nonce|timestamp_hex|signature_hex`,
//! where the signature is HMAC-SHA256 over `provider|nonce|timestamp_hex`.
//! The whole string is URL-safe base64 without padding.
//!
//! The nonce is also handed to the browser in a cookie; a callback is only
//! accepted from the browser that started the sign-in.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// How long a sign-in attempt may take between redirect and callback.
pub const STATE_MAX_AGE_MS: u128 = 10 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("malformed state parameter")]
    Malformed,
    #[error("state signature mismatch")]
    BadSignature,
    #[error("state issued for provider {0}")]
    ProviderMismatch(String),
    #[error("state issued to a different browser")]
    NonceMismatch,
    #[error("state expired")]
    Expired,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

fn signature(payload: &str, key: &[u8]) -> anyhow::Result<String> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| anyhow::anyhow!("HMAC init failed: {}", e))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Fresh random nonce for one sign-in attempt.
pub fn new_nonce() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Create a state value for `provider` and `nonce` issued now.
pub fn sign_state(provider: &str, nonce: &str, key: &[u8]) -> anyhow::Result<String> {
    sign_state_at(provider, nonce, now_millis(), key)
}

/// Create a state value with an explicit issue time (milliseconds).
pub fn sign_state_at(
    provider: &str,
    nonce: &str,
    issued_at_ms: u128,
    key: &[u8],
) -> anyhow::Result<String> {
    let payload = format!("{}|{}|{:x}", provider, nonce, issued_at_ms);
    let signed = format!("{}|{}", payload, signature(&payload, key)?);
    Ok(URL_SAFE_NO_PAD.encode(signed.as_bytes()))
}

/// Verify signature, provider, browser nonce and age of a state value.
pub fn verify_state(
    state: &str,
    expected_provider: &str,
    nonce: &str,
    key: &[u8],
) -> Result<(), StateError> {
    verify_state_at(state, expected_provider, nonce, key, now_millis())
}

fn verify_state_at(
    state: &str,
    expected_provider: &str,
    nonce: &str,
    key: &[u8],
    now_ms: u128,
) -> Result<(), StateError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(state)
        .map_err(|_| StateError::Malformed)?;
    let decoded = String::from_utf8(bytes).map_err(|_| StateError::Malformed)?;

    let mut parts = decoded.splitn(4, '|');
    let (Some(provider), Some(state_nonce), Some(timestamp_hex), Some(signature_hex)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(StateError::Malformed);
    };

    let payload = format!("{}|{}|{}", provider, state_nonce, timestamp_hex);
    let expected = signature(&payload, key).map_err(|_| StateError::BadSignature)?;
    if !bool::from(expected.as_bytes().ct_eq(signature_hex.as_bytes())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return Err(StateError::BadSignature);
    }

    if provider != expected_provider {
        return Err(StateError::ProviderMismatch(provider.to_string()));
    }

    if nonce.is_empty() || !bool::from(state_nonce.as_bytes().ct_eq(nonce.as_bytes())) {
        return Err(StateError::NonceMismatch);
    }

    let issued_at = u128::from_str_radix(timestamp_hex, 16).map_err(|_| StateError::Malformed)?;
    if now_ms.saturating_sub(issued_at) > STATE_MAX_AGE_MS {
        return Err(StateError::Expired);
    }

    Ok(())
}
