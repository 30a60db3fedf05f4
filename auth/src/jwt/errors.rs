use thiserror::Error;

/// Error type for token operations.
///
/// Decode failures keep their kind so callers can log or report them
/// separately; caller-facing layers collapse them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token expiry is out of range")]
    ExpiryOutOfRange,

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token is expired")]
    Expired,

    #[error("Token is malformed: {0}")]
    Malformed(String),
}

impl JwtError {
    /// Short label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            JwtError::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            JwtError::EncodingFailed(_) => "encoding_failed",
            JwtError::ExpiryOutOfRange => "expiry_out_of_range",
            JwtError::InvalidSignature => "invalid_signature",
            JwtError::Expired => "expired",
            JwtError::Malformed(_) => "malformed",
        }
    }
}
