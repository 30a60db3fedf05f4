use chrono::DateTime;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::errors::JwtError;
use crate::config::AuthSettings;
use crate::config::ConfigurationError;

/// Signs claims into compact JWTs and verifies them back.
///
/// The key and algorithm are fixed at construction. Only HMAC algorithms are
/// supported because the key is a shared secret.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validation: Validation,
}

impl TokenCodec {
    /// Create a codec for a shared secret.
    ///
    /// # Arguments
    /// * `secret` - HMAC key (should be at least as long as the digest output)
    /// * `algorithm` - One of `HS256`, `HS384`, `HS512`
    ///
    /// # Errors
    /// * `UnsupportedAlgorithm` - Algorithm is not in the HMAC family
    pub fn new(secret: &[u8], algorithm: Algorithm) -> Result<Self, JwtError> {
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(JwtError::UnsupportedAlgorithm(format!("{:?}", algorithm)));
        }

        let mut validation = Validation::new(algorithm);
        // Expiry is checked against the caller's clock in `decode_at`, with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
            validation,
        })
    }

    /// Create the codec described by startup settings.
    ///
    /// # Errors
    /// * `UnsupportedAlgorithm` - Algorithm is not HS256/HS384/HS512
    pub fn from_settings(settings: &AuthSettings) -> Result<Self, ConfigurationError> {
        let algorithm = settings.signing_algorithm()?;

        Self::new(settings.secret.as_bytes(), algorithm)
            .map_err(|e| ConfigurationError::UnsupportedAlgorithm(e.to_string()))
    }

    /// Encode claims into a signed token.
    ///
    /// # Errors
    /// * `EncodingFailed` - Serialization or signing failed
    pub fn encode(&self, claims: &Claims) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode and validate a token against the current time.
    pub fn decode(&self, token: &str) -> Result<Claims, JwtError> {
        self.decode_at(token, Utc::now())
    }

    /// Decode and validate a token against `now`.
    ///
    /// The signature is checked before expiry, so a forged token is always
    /// reported as `InvalidSignature` whatever its `exp`.
    ///
    /// # Errors
    /// * `InvalidSignature` - Signature does not verify with this key and algorithm
    /// * `Expired` - `exp` is at or before `now`
    /// * `Malformed` - Token is not a JWT or its payload is not a claim set
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, JwtError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(classify)?;

        if claims.is_expired(now.timestamp()) {
            return Err(JwtError::Expired);
        }

        Ok(claims)
    }
}

fn classify(error: jsonwebtoken::errors::Error) -> JwtError {
    match error.kind() {
        // A token signed under another algorithm does not verify under ours
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => JwtError::InvalidSignature,
        ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::Malformed(error.to_string()),
    }
}
