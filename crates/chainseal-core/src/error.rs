use std::path::PathBuf;

use thiserror::Error;

pub type ChainsealResult<T> = Result<T, ChainsealError>;

#[derive(Debug, Error)]
pub enum ChainsealError {
    /// Empty plaintext, password, or key material.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// AEAD tag verification failed (wrong key, wrong IV, or tampered ciphertext).
    #[error("authentication failed: {0}")]
    AuthenticationFailure(String),

    /// Decryption succeeded but the recomputed SHA3-256 differs from the stored hash.
    #[error("integrity check failed: stored hash {expected}, computed {actual}")]
    IntegrityFailure { expected: String, actual: String },

    /// The supplied private key does not belong to the embedded public key.
    #[error("key mismatch: {0}")]
    KeyMismatch(String),

    #[error("unsupported record version: {0:?}")]
    UnsupportedVersion(String),

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("storage I/O error at {}: {source}", path.display())]
    StorageIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backend failure that is not an authentication failure (cipher setup, RNG).
    #[error("crypto backend error: {0}")]
    Crypto(String),
}

impl ChainsealError {
    pub fn storage_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::StorageIo {
            path: path.into(),
            source,
        }
    }

    /// Authentication, integrity and key-mismatch failures: the classes a caller
    /// must surface as security events rather than retry.
    pub fn is_security_failure(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailure(_) | Self::IntegrityFailure { .. } | Self::KeyMismatch(_)
        )
    }
}
