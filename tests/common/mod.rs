//! Shared helpers for integration tests

#![allow(dead_code)]

use jsonwebtoken::{encode, EncodingKey, Header};
use tabsession::auth::Claims;

pub const FAR_FUTURE: i64 = 9999999999;

/// Mint a signed token. Decoding never checks the signature, so the secret
/// is arbitrary.
pub fn mint(sub: &str, roles: &str, exp: i64) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        roles: roles.to_string(),
        exp: Some(exp),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"integration-secret"),
    )
    .expect("Failed to mint token")
}

/// Assemble an unsigned token from raw header and payload JSON
pub fn unsigned(header: &str, payload: &str) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    format!(
        "{}.{}.",
        URL_SAFE_NO_PAD.encode(header),
        URL_SAFE_NO_PAD.encode(payload)
    )
}
