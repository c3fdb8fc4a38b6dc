//! Signed Access Token Handling
//!
//! Generation, signature verification and claim extraction for the compact
//! three-segment tokens handed out on register/login.
//!
//! Security notes:
//! - Tokens are signed with HS256 (HMAC-SHA256) and carry the header `{"alg":"HS256"}`
//! - `iat` and `exp` are milliseconds since the Unix epoch
//! - Claims are only read after the signature has been verified
//! - No clock-skew leeway: a token is valid strictly before `exp`

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use zeroize::Zeroizing;

use crate::types::{Result, TokengateError};

/// Default token lifetime: 24 hours
pub const DEFAULT_TOKEN_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Minimum accepted signing key length in bytes (256 bits)
pub const MIN_KEY_LEN: usize = 32;

/// Prefix of the Authorization header value carrying a token
pub const BEARER_PREFIX: &str = "Bearer ";

const RESERVED_CLAIMS: [&str; 3] = ["sub", "iat", "exp"];

/// Free-form claims embedded next to the registered ones
pub type ExtraClaims = Map<String, Value>;

/// Process-wide HMAC secret.
///
/// Loaded once at startup and shared read-only behind an `Arc`. The bytes are
/// wiped on drop and never printed.
pub struct SigningKey {
    bytes: Zeroizing<Vec<u8>>,
}

impl SigningKey {
    /// Create a signing key from raw secret bytes
    ///
    /// Returns an error if the secret is empty or shorter than 256 bits
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = Zeroizing::new(bytes.into());

        if bytes.is_empty() {
            return Err(TokengateError::Config(
                "JWT_SECRET is required in production mode".into(),
            ));
        }

        if bytes.len() < MIN_KEY_LEN {
            return Err(TokengateError::Config(format!(
                "JWT_SECRET must be at least {} bytes",
                MIN_KEY_LEN
            )));
        }

        Ok(Self { bytes })
    }

    /// Create a signing key from a base64-encoded secret
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| TokengateError::Config(format!("JWT_SECRET is not valid base64: {}", e)))?;
        Self::from_bytes(bytes)
    }

    /// Fixed key for dev mode only
    pub fn new_dev() -> Self {
        Self {
            bytes: Zeroizing::new(b"dev-mode-secret-not-for-production-use-123456".to_vec()),
        }
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.bytes.as_slice())
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.bytes.as_slice())
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// Verified claim set of a token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    sub: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    iat: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    exp: DateTime<Utc>,
    #[serde(flatten)]
    extra: ExtraClaims,
}

impl Claims {
    /// Identity key of the principal the token was issued to
    pub fn subject(&self) -> &str {
        &self.sub
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.iat
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.exp
    }

    /// Look up a non-registered claim by name
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    pub fn extra_claims(&self) -> &ExtraClaims {
        &self.extra
    }

    /// Expired once `now` reaches `exp`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.exp
    }
}

/// Token generator and verifier.
///
/// Stateless apart from the shared signing key; cloning is cheap and clones
/// may be used from any task.
#[derive(Clone)]
pub struct TokenCodec {
    key: Arc<SigningKey>,
    ttl: Duration,
}

impl TokenCodec {
    /// Create a codec with the given token lifetime
    pub fn new(key: Arc<SigningKey>, ttl: Duration) -> Result<Self> {
        if ttl <= Duration::zero() {
            return Err(TokengateError::Config(
                "Token TTL must be greater than zero".into(),
            ));
        }

        Ok(Self { key, ttl })
    }

    /// Create a codec with the 24 hour default lifetime
    pub fn with_default_ttl(key: Arc<SigningKey>) -> Self {
        Self {
            key,
            ttl: Duration::milliseconds(DEFAULT_TOKEN_TTL_MS),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generate a signed token for `subject`, issued at `now`.
    ///
    /// `sub`, `iat` and `exp` inside `extra_claims` are replaced by the
    /// codec's own values.
    pub fn generate(
        &self,
        subject: &str,
        extra_claims: &ExtraClaims,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokengateError::Internal("Token expiry out of range".into()))?;

        let mut extra = extra_claims.clone();
        for name in RESERVED_CLAIMS {
            extra.remove(name);
        }

        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp,
            extra,
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = None;

        encode(&header, &claims, &self.key.encoding_key())
            .map_err(|e| TokengateError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Verify the signature and return the claims without checking expiry
    pub fn decode_claims(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.key.decoding_key(), &validation())?;
        Ok(data.claims)
    }

    /// Subject of a correctly signed token
    pub fn extract_subject(&self, token: &str) -> Result<String> {
        self.decode_claims(token).map(|claims| claims.sub)
    }

    /// Expiry of a correctly signed token
    pub fn extract_expiry(&self, token: &str) -> Result<DateTime<Utc>> {
        self.decode_claims(token).map(|claims| claims.exp)
    }

    /// Verify signature and expiry, returning the claim set
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims> {
        let claims = self.decode_claims(token)?;
        if claims.is_expired_at(now) {
            return Err(TokengateError::Expired);
        }
        Ok(claims)
    }

    /// True iff the signature verifies, the subject matches and `now < exp`.
    ///
    /// Never fails: every verification error reads as "not valid".
    pub fn is_valid(&self, token: &str, expected_subject: &str, now: DateTime<Utc>) -> bool {
        match self.verify(token, now) {
            Ok(claims) => claims.subject() == expected_subject,
            Err(e) => {
                debug!("Token rejected: {}", e);
                false
            }
        }
    }
}

/// Signature and algorithm checks only; expiry is compared in milliseconds
/// by the codec itself.
fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();
    validation.leeway = 0;
    validation
}

/// Extract token from an Authorization header value.
/// Only the "Bearer <token>" form is accepted.
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    let token = auth_header?.strip_prefix(BEARER_PREFIX)?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use chrono::TimeZone;
    use serde_json::json;

    const TTL_MS: i64 = 86_400_000;

    fn test_key() -> Arc<SigningKey> {
        Arc::new(SigningKey::from_bytes("test-secret-that-is-at-least-32-characters-long").unwrap())
    }

    fn test_codec() -> TokenCodec {
        TokenCodec::new(test_key(), Duration::milliseconds(TTL_MS)).unwrap()
    }

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn now() -> DateTime<Utc> {
        at(1_700_000_000_123)
    }

    #[test]
    fn test_generate_and_extract_subject() {
        let codec = test_codec();
        let token = codec.generate("a@x.com", &ExtraClaims::new(), now()).unwrap();

        assert_eq!(token.split('.').count(), 3);
        assert_eq!(codec.extract_subject(&token).unwrap(), "a@x.com");
        assert!(codec.is_valid(&token, "a@x.com", now()));
    }

    #[test]
    fn test_header_is_hs256_only() {
        let codec = test_codec();
        let token = codec.generate("a@x.com", &ExtraClaims::new(), now()).unwrap();
        let header = token.split('.').next().unwrap();
        let decoded = URL_SAFE_NO_PAD.decode(header).unwrap();
        let value: Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(value, json!({ "alg": "HS256" }));
    }

    #[test]
    fn test_payload_timestamps() {
        let codec = test_codec();
        let token = codec.generate("a@x.com", &ExtraClaims::new(), now()).unwrap();
        let claims = codec.decode_claims(&token).unwrap();

        assert_eq!(claims.issued_at(), now());
        assert_eq!(claims.expires_at(), at(now().timestamp_millis() + TTL_MS));
        assert_eq!(codec.extract_expiry(&token).unwrap(), claims.expires_at());
    }

    #[test]
    fn test_expiry_boundary() {
        let codec = test_codec();
        let issued = now().timestamp_millis();
        let token = codec.generate("a@x.com", &ExtraClaims::new(), now()).unwrap();

        assert!(codec.is_valid(&token, "a@x.com", at(issued + TTL_MS - 1)));
        assert!(!codec.is_valid(&token, "a@x.com", at(issued + TTL_MS)));
        assert!(!codec.is_valid(&token, "a@x.com", at(issued + TTL_MS + 1)));

        assert!(matches!(
            codec.verify(&token, at(issued + TTL_MS)),
            Err(TokengateError::Expired)
        ));
    }

    #[test]
    fn test_expired_token_still_yields_claims() {
        let codec = test_codec();
        let token = codec.generate("a@x.com", &ExtraClaims::new(), at(0)).unwrap();
        assert_eq!(codec.extract_subject(&token).unwrap(), "a@x.com");
        assert!(!codec.is_valid(&token, "a@x.com", now()));
    }

    #[test]
    fn test_wrong_subject_invalid() {
        let codec = test_codec();
        let token = codec.generate("a@x.com", &ExtraClaims::new(), now()).unwrap();
        assert!(!codec.is_valid(&token, "b@x.com", now()));
    }

    #[test]
    fn test_signature_bit_flip_rejected() {
        let codec = test_codec();
        let token = codec.generate("a@x.com", &ExtraClaims::new(), now()).unwrap();
        let (signed, signature) = token.rsplit_once('.').unwrap();
        let sig_bytes = URL_SAFE_NO_PAD.decode(signature).unwrap();

        for byte in 0..sig_bytes.len() {
            for bit in 0..8 {
                let mut tampered = sig_bytes.clone();
                tampered[byte] ^= 1 << bit;
                let forged = format!("{}.{}", signed, URL_SAFE_NO_PAD.encode(&tampered));

                assert!(!codec.is_valid(&forged, "a@x.com", now()));
                assert!(matches!(
                    codec.extract_subject(&forged),
                    Err(TokengateError::InvalidSignature)
                ));
            }
        }
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let codec = test_codec();
        let token = codec.generate("a@x.com", &ExtraClaims::new(), now()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let forged_payload = URL_SAFE_NO_PAD.encode(
            json!({ "sub": "admin@x.com", "iat": 0, "exp": i64::MAX / 2 }).to_string(),
        );
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert!(!codec.is_valid(&forged, "admin@x.com", now()));
        assert!(matches!(
            codec.extract_subject(&forged),
            Err(TokengateError::InvalidSignature)
        ));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let codec1 = test_codec();
        let codec2 = TokenCodec::new(
            Arc::new(SigningKey::from_bytes("different-secret-that-is-at-least-32-characters").unwrap()),
            Duration::milliseconds(TTL_MS),
        )
        .unwrap();

        let token = codec1.generate("a@x.com", &ExtraClaims::new(), now()).unwrap();

        assert!(!codec2.is_valid(&token, "a@x.com", now()));
        assert!(matches!(
            codec2.extract_subject(&token),
            Err(TokengateError::InvalidSignature)
        ));
    }

    #[test]
    fn test_malformed_tokens() {
        let codec = test_codec();

        for token in ["", "invalid-token", "a.b", "a.b.c", "!!!.???.***"] {
            assert!(!codec.is_valid(token, "a@x.com", now()));
            assert!(matches!(
                codec.extract_subject(token),
                Err(TokengateError::Malformed(_)) | Err(TokengateError::InvalidSignature)
            ));
        }

        assert!(matches!(
            codec.extract_subject("invalid-token"),
            Err(TokengateError::Malformed(_))
        ));
    }

    #[test]
    fn test_extra_claims_round_trip() {
        let codec = test_codec();
        let mut extra = ExtraClaims::new();
        extra.insert("role".into(), json!("ADMIN"));
        extra.insert("tenant".into(), json!({ "id": 7 }));

        let token = codec.generate("a@x.com", &extra, now()).unwrap();
        let claims = codec.verify(&token, now()).unwrap();

        assert_eq!(claims.claim("role"), Some(&json!("ADMIN")));
        assert_eq!(claims.claim("tenant"), Some(&json!({ "id": 7 })));
        assert_eq!(claims.extra_claims().len(), 2);
    }

    #[test]
    fn test_reserved_extra_claims_overridden() {
        let codec = test_codec();
        let mut extra = ExtraClaims::new();
        extra.insert("sub".into(), json!("mallory@x.com"));
        extra.insert("exp".into(), json!(i64::MAX));

        let token = codec.generate("a@x.com", &extra, now()).unwrap();
        let claims = codec.decode_claims(&token).unwrap();

        assert_eq!(claims.subject(), "a@x.com");
        assert_eq!(claims.expires_at(), at(now().timestamp_millis() + TTL_MS));
        assert!(claims.extra_claims().is_empty());
    }

    #[test]
    fn test_generation_is_deterministic() {
        let codec = test_codec();
        let mut extra = ExtraClaims::new();
        extra.insert("role".into(), json!("USER"));

        let t1 = codec.generate("a@x.com", &extra, now()).unwrap();
        let t2 = codec.generate("a@x.com", &extra, now()).unwrap();
        let t3 = codec.generate("a@x.com", &extra, at(now().timestamp_millis() + 1)).unwrap();

        assert_eq!(t1, t2);
        assert_ne!(t1, t3);
    }

    #[test]
    fn test_secret_validation() {
        // Too short
        assert!(SigningKey::from_bytes("short").is_err());

        // Empty
        assert!(SigningKey::from_bytes("").is_err());

        // Valid
        assert!(SigningKey::from_bytes("this-secret-is-at-least-32-chars-long").is_ok());

        // Base64 of 32 bytes
        let encoded = "b5eee28c0ac1436d229a464548d5e6ae422369caa5aa1c1659c81e499922f982";
        assert!(SigningKey::from_base64(encoded).is_ok());
        assert!(SigningKey::from_base64("not base64 at all!").is_err());
    }

    #[test]
    fn test_signing_key_debug_redacted() {
        let key = SigningKey::from_bytes("this-secret-is-at-least-32-chars-long").unwrap();
        let out = format!("{:?}", key);
        assert!(!out.contains("this-secret"));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        assert!(TokenCodec::new(test_key(), Duration::zero()).is_err());
        assert!(TokenCodec::new(test_key(), Duration::milliseconds(-5)).is_err());
    }

    #[test]
    fn test_dev_key_round_trip() {
        let codec = TokenCodec::with_default_ttl(Arc::new(SigningKey::new_dev()));
        let token = codec.generate("a@x.com", &ExtraClaims::new(), now()).unwrap();
        assert!(codec.is_valid(&token, "a@x.com", now()));
        assert_eq!(codec.ttl(), Duration::milliseconds(DEFAULT_TOKEN_TTL_MS));
    }

    #[test]
    fn test_extract_token_from_header() {
        // Bearer format
        assert_eq!(
            extract_token_from_header(Some("Bearer abc123")),
            Some("abc123")
        );

        // Empty cases
        assert_eq!(extract_token_from_header(None), None);
        assert_eq!(extract_token_from_header(Some("")), None);
        assert_eq!(extract_token_from_header(Some("Bearer ")), None);

        // Not a bearer header
        assert_eq!(extract_token_from_header(Some("abc123")), None);
        assert_eq!(extract_token_from_header(Some("Basic abc123")), None);
        assert_eq!(extract_token_from_header(Some("bearer abc123")), None);
    }
}
