//! Password-only block encryption (PBKDF2-HMAC-SHA256 + AES-256-GCM)
//!
//! No asymmetric key is involved, so there is no key-pair check: a wrong
//! password surfaces as [`ChainsealError::AuthenticationFailure`] from the AEAD
//! layer. The iteration count is not stored in the record; records must be
//! opened by an engine configured with the same count they were sealed with.

use chainseal_core::config::CryptoConfig;
use secrecy::SecretString;
use tracing::{debug, warn};

use crate::record::{now_millis, SecureEncryptedData};
use crate::stats::CryptoStats;
use crate::{aead, hash, kdf, ChainsealError, ChainsealResult};

#[derive(Debug)]
pub struct PasswordBlockEncryption {
    iterations: u32,
    stats: CryptoStats,
}

impl Default for PasswordBlockEncryption {
    fn default() -> Self {
        Self::new(kdf::PBKDF2_ITERATIONS)
    }
}

impl PasswordBlockEncryption {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations,
            stats: CryptoStats::default(),
        }
    }

    pub fn from_config(config: &CryptoConfig) -> Self {
        Self::new(config.pbkdf2_iterations)
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn stats(&self) -> &CryptoStats {
        &self.stats
    }

    /// Encrypt under a key derived from `password` and a fresh random salt.
    pub fn encrypt_with_password(
        &self,
        plaintext: &[u8],
        password: &SecretString,
    ) -> ChainsealResult<SecureEncryptedData> {
        if plaintext.is_empty() {
            return Err(ChainsealError::InvalidArgument(
                "block plaintext must not be empty".into(),
            ));
        }

        let salt = kdf::generate_salt();
        let key = kdf::derive_password_key(password, &salt, self.iterations)?;
        let out = aead::encrypt(plaintext, &key)?;
        self.stats.record_encryption();

        let iv = out.iv;
        let data = SecureEncryptedData {
            ciphertext: out.into_ciphertext_with_tag(),
            salt,
            iv,
            data_hash: hash::data_hash(plaintext),
            timestamp: now_millis(),
        };
        debug!(
            bytes = plaintext.len(),
            iterations = self.iterations,
            "password block encrypted"
        );
        Ok(data)
    }

    /// Re-derive the key from the stored salt, decrypt, and check the data hash.
    pub fn decrypt_with_password(
        &self,
        data: &SecureEncryptedData,
        password: &SecretString,
    ) -> ChainsealResult<Vec<u8>> {
        let (ciphertext, tag) = aead::split_tag(&data.ciphertext)?;
        let key = kdf::derive_password_key(password, &data.salt, self.iterations)?;

        self.stats.record_decryption();
        let plaintext = aead::decrypt(ciphertext, &tag, &key, &data.iv).inspect_err(|_| {
            warn!("password decrypt: authentication failed (wrong password or tampered data)");
        })?;

        if let Err(e) = hash::verify_data_hash(&plaintext, &data.data_hash) {
            warn!(error = %e, "password decrypt: data hash mismatch");
            return Err(e);
        }

        debug!(bytes = plaintext.len(), "password block decrypted");
        Ok(plaintext)
    }

    /// True when `password` opens `data` and the plaintext matches its hash.
    pub fn verify_password(&self, data: &SecureEncryptedData, password: &SecretString) -> bool {
        self.decrypt_with_password(data, password).is_ok()
    }

    pub fn encrypt_string(
        &self,
        plaintext: &str,
        password: &SecretString,
    ) -> ChainsealResult<SecureEncryptedData> {
        self.encrypt_with_password(plaintext.as_bytes(), password)
    }

    pub fn decrypt_string(
        &self,
        data: &SecureEncryptedData,
        password: &SecretString,
    ) -> ChainsealResult<String> {
        let bytes = self.decrypt_with_password(data, password)?;
        String::from_utf8(bytes).map_err(|_| {
            ChainsealError::MalformedRecord("decrypted block is not valid UTF-8".into())
        })
    }
}
