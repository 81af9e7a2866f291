//! JWT token decoding
//!
//! Tokens are issued and verified elsewhere. Decoding here is purely
//! structural: only the payload segment is read. The header, the signature
//! and `exp` are never checked.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::auth::models::Identity;

/// base64url, accepting payloads with or without trailing `=`
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Claims carried in a session token payload
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (unique user identifier)
    pub sub: String,
    /// Role label
    pub roles: String,
    /// Expiration time as a Unix timestamp in seconds
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub exp: Option<i64>,
}

impl Claims {
    /// Project the claims onto the UI-facing identity
    pub fn to_identity(&self) -> Identity {
        Identity::new(self.sub.clone(), self.roles.clone())
    }

    /// Expiration as a timestamp, if the token carries one
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Whether `exp` lies in the past.
    ///
    /// Informational only. The session store never rejects or drops a
    /// token because of this.
    pub fn is_expired(&self) -> bool {
        self.exp
            .map(|exp| Utc::now().timestamp() > exp)
            .unwrap_or(false)
    }
}

/// `exp` is a JSON number; issuers sometimes emit fractional seconds.
/// Non-numeric values are treated as absent since expiry is never enforced.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|secs| secs.trunc() as i64)),
        _ => None,
    })
}

/// Why a token could not be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("token is empty")]
    Empty,

    #[error("malformed token: {0}")]
    Malformed(String),
}

/// Decode a token's payload into [`Claims`].
///
/// Total: every input yields either claims or a [`DecodeError`].
pub fn decode(token: &str) -> Result<Claims, DecodeError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(DecodeError::Empty);
    }

    let payload = token
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| DecodeError::Malformed("missing payload segment".to_string()))?;

    // Tolerate the standard alphabet the way browser decoders do
    let payload = payload.replace('+', "-").replace('/', "_");
    let bytes = PAYLOAD_ENGINE
        .decode(payload)
        .map_err(|e| DecodeError::Malformed(format!("invalid base64 payload: {}", e)))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| DecodeError::Malformed(format!("invalid payload: {}", e)))
}


#[cfg(test)]
mod tests {
    use super::testing::{token_for, unsigned_token};
    use super::*;

    const PAYLOAD: &str = r#"{"sub":"alice","roles":"admin","exp":9999999999}"#;

    #[test]
    fn test_decode_valid_token() {
        let token = token_for("alice", "admin", 9999999999);
        let claims = decode(&token).expect("Failed to decode token");

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.roles, "admin");
        assert_eq!(claims.exp, Some(9999999999));
    }

    #[test]
    fn test_decode_ignores_signature() {
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS512),
            &Claims {
                sub: "bob".to_string(),
                roles: "user".to_string(),
                exp: Some(1),
            },
            &jsonwebtoken::EncodingKey::from_secret(b"some-other-secret"),
        )
        .unwrap();

        let claims = decode(&token).expect("signature must not matter");
        assert_eq!(claims.sub, "bob");
    }

    #[test]
    fn test_decode_ignores_header() {
        for header in [
            r#"{"alg":"none"}"#,
            r#"{"alg":"HS1024","typ":"JWT"}"#,
            r#"{"alg":"RS256"}"#,
            "not even json",
        ] {
            let claims = decode(&unsigned_token(header, PAYLOAD))
                .unwrap_or_else(|e| panic!("header {header:?} rejected: {e}"));
            assert_eq!(claims.sub, "alice");
            assert_eq!(claims.roles, "admin");
            assert_eq!(claims.exp, Some(9999999999));
        }
    }

    #[test]
    fn test_decode_fractional_exp() {
        let token = unsigned_token(
            r#"{"alg":"none"}"#,
            r#"{"sub":"alice","roles":"admin","exp":9999999999.5}"#,
        );
        assert_eq!(decode(&token).unwrap().exp, Some(9999999999));
    }

    #[test]
    fn test_decode_non_numeric_exp_is_absent() {
        let token = unsigned_token(
            r#"{"alg":"none"}"#,
            r#"{"sub":"alice","roles":"admin","exp":"tomorrow"}"#,
        );
        assert_eq!(decode(&token).unwrap().exp, None);
    }

    #[test]
    fn test_decode_payload_only_token() {
        let token = unsigned_token(r#"{"alg":"none"}"#, PAYLOAD);
        let two_segments = token.trim_end_matches('.');
        assert_eq!(decode(two_segments).unwrap().sub, "alice");
    }

    #[test]
    fn test_decode_padded_payload() {
        use base64::engine::general_purpose::URL_SAFE;

        let token = format!("header.{}.sig", URL_SAFE.encode(r#"{"sub":"a","roles":"user"}"#));
        assert_eq!(decode(&token).unwrap().sub, "a");
    }

    #[test]
    fn test_decode_rejects_bad_payload() {
        let not_json = unsigned_token(r#"{"alg":"none"}"#, "hello");
        assert!(matches!(decode(&not_json), Err(DecodeError::Malformed(_))));

        let missing_roles = unsigned_token(r#"{"alg":"none"}"#, r#"{"sub":"alice"}"#);
        assert!(matches!(decode(&missing_roles), Err(DecodeError::Malformed(_))));

        assert!(matches!(decode("header..sig"), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode("header.@@@@.sig"), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_decode_does_not_check_expiry() {
        let token = token_for("alice", "admin", 1);
        let claims = decode(&token).expect("expired tokens still decode");
        assert!(claims.is_expired());
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(decode("not-a-token"), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode("a.b.c"), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode(""), Err(DecodeError::Empty));
        assert_eq!(decode("   "), Err(DecodeError::Empty));
    }

    #[test]
    fn test_to_identity() {
        let claims = Claims {
            sub: "alice".to_string(),
            roles: "admin".to_string(),
            exp: None,
        };
        let identity = claims.to_identity();
        assert_eq!(identity.username(), "alice");
        assert_eq!(identity.role(), "admin");
    }

    #[test]
    fn test_expires_at() {
        let claims = Claims {
            sub: "alice".to_string(),
            roles: "admin".to_string(),
            exp: Some(0),
        };
        assert_eq!(claims.expires_at(), DateTime::from_timestamp(0, 0));
        assert!(claims.is_expired());

        let no_exp = Claims { exp: None, ..claims };
        assert!(no_exp.expires_at().is_none());
        assert!(!no_exp.is_expired());
    }
}
