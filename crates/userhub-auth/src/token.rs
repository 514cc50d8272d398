//! RS256 token codec.
//!
//! Mints and verifies the signed, time-limited credentials that carry a
//! subject identifier. Signing is asymmetric: the private key mints,
//! the public key verifies. Keys are supplied as PEM or generated
//! ephemerally for development and tests.
//!
//! Verification is a single `Result`-returning call; there is no
//! callback path and no other error channel.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use rand::rngs::OsRng;
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Errors that can occur during token operations.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Failed to sign a token.
    #[error("Failed to encode token: {message}")]
    Encoding {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode a token.
    #[error("Failed to decode token: {message}")]
    Decoding {
        /// Description of the decoding error.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Failed to generate or parse a signing key.
    #[error("Invalid key: {message}")]
    InvalidKey {
        /// Description of the key problem.
        message: String,
    },
}

impl TokenError {
    /// Creates a new `Encoding` error.
    #[must_use]
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Creates a new `Decoding` error.
    #[must_use]
    pub fn decoding(message: impl Into<String>) -> Self {
        Self::Decoding {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidKey` error.
    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Returns `true` if the token itself was rejected (as opposed to a
    /// key or encoding fault).
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Expired | Self::InvalidSignature | Self::Decoding { .. }
        )
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
                Self::invalid_key(err.to_string())
            }
            _ => Self::decoding(err.to_string()),
        }
    }
}

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject: the user id the session belongs to.
    pub sub: String,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Unique token id. RS256 signing is deterministic, so without this
    /// two tokens minted in the same second for the same subject would
    /// be byte-identical.
    pub jti: String,
}

impl Claims {
    /// Creates claims for `subject` valid for `validity` from now.
    ///
    /// A zero `validity` produces an already-expired sentinel claim set,
    /// used by logout to hand back a clearly stale credential.
    #[must_use]
    pub fn new(subject: impl Into<String>, validity: Duration) -> Self {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        Self {
            sub: subject.into(),
            iat: now,
            exp: now + validity.whole_seconds(),
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Seconds of validity remaining, negative once expired.
    #[must_use]
    pub fn remaining_seconds(&self) -> i64 {
        self.exp - OffsetDateTime::now_utc().unix_timestamp()
    }
}

/// RS256 codec for session tokens.
///
/// Thread-safe (`Send + Sync`); share it behind an `Arc`.
#[derive(Debug)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenCodec {
    /// Loads a codec from PEM-encoded RSA keys.
    ///
    /// # Errors
    /// Returns an error if either PEM is not a valid RSA key.
    pub fn from_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Self, TokenError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|e| TokenError::invalid_key(e.to_string()))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| TokenError::invalid_key(e.to_string()))?;
        Ok(Self {
            encoding_key,
            decoding_key,
        })
    }

    /// Generates an ephemeral 2048-bit RSA key pair.
    ///
    /// Intended for development and tests; production deployments load
    /// persistent keys so sessions survive restarts.
    ///
    /// # Errors
    /// Returns an error if key generation fails.
    pub fn generate() -> Result<Self, TokenError> {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048)
            .map_err(|e| TokenError::invalid_key(e.to_string()))?;
        let public_key = private_key.to_public_key();

        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| TokenError::invalid_key(e.to_string()))?;
        let public_pem = public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| TokenError::invalid_key(e.to_string()))?;

        Self::from_pem(private_pem.as_bytes(), public_pem.as_bytes())
    }

    /// Signs the claims into a token string.
    ///
    /// # Errors
    /// Returns an error if signing fails.
    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        let header = Header::new(Algorithm::RS256);
        encode(&header, claims, &self.encoding_key)
            .map_err(|e| TokenError::encoding(e.to_string()))
    }

    /// Verifies signature and expiry, returning the claims.
    ///
    /// # Errors
    /// Returns [`TokenError::Expired`], [`TokenError::InvalidSignature`]
    /// or [`TokenError::Decoding`] when the token is rejected.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        // No leeway: logout hands out zero-validity sentinel tokens that
        // must be rejected immediately, not 60 seconds later.
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::generate().unwrap()
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let codec = codec();
        let claims = Claims::new("user-123", Duration::days(14));

        let token = codec.encode(&claims).unwrap();
        assert!(!token.is_empty());

        let decoded = codec.decode(&token).unwrap();
        assert_eq!(decoded.sub, "user-123");
        assert_eq!(decoded.exp, claims.exp);
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = codec();
        let claims = Claims::new("user-123", Duration::hours(-1));

        let token = codec.encode(&claims).unwrap();
        let err = codec.decode(&token).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
        assert!(err.is_rejection());
    }

    #[test]
    fn test_zero_validity_token_rejected() {
        let codec = codec();
        let claims = Claims::new("user-123", Duration::ZERO);

        let token = codec.encode(&claims).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        let err = codec.decode(&token).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let signer = codec();
        let verifier = codec();
        let claims = Claims::new("user-123", Duration::days(14));

        let token = signer.encode(&claims).unwrap();
        let err = verifier.decode(&token).unwrap_err();
        assert!(matches!(err, TokenError::InvalidSignature));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let codec = codec();
        let err = codec.decode("not-a-token").unwrap_err();
        assert!(err.is_rejection());
    }

    #[test]
    fn test_tokens_for_same_subject_differ() {
        let codec = codec();
        let first = codec
            .encode(&Claims::new("user-123", Duration::days(14)))
            .unwrap();
        let second = codec
            .encode(&Claims::new("user-123", Duration::days(14)))
            .unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_remaining_seconds() {
        let claims = Claims::new("u", Duration::days(14));
        let remaining = claims.remaining_seconds();
        assert!(remaining > 14 * 86_400 - 5);
        assert!(remaining <= 14 * 86_400);
    }

    #[test]
    fn test_from_pem_rejects_garbage() {
        let err = TokenCodec::from_pem(b"garbage", b"garbage").unwrap_err();
        assert!(matches!(err, TokenError::InvalidKey { .. }));
    }
}
