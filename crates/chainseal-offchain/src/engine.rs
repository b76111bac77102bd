//! Off-chain storage engine

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chainseal_core::config::{ChainsealConfig, OffChainConfig, DEFAULT_PBKDF2_ITERATIONS};
use chainseal_core::{ChainsealError, ChainsealResult, KeyDerivationStrength};
use chainseal_crypto::{aead, hash, kdf, signing, SymmetricKey, SALT_SIZE};
use p256::ecdsa::SigningKey;
use secrecy::SecretString;
use tracing::{debug, warn};

use crate::metadata::OffChainData;
use crate::naming::{is_object_file_name, object_file_name};
use crate::structure::{self, StructureDefect};

/// Stores large payloads as single AEAD-encrypted files under one directory.
#[derive(Debug, Clone)]
pub struct OffChainStorageEngine {
    config: OffChainConfig,
    pbkdf2_iterations: u32,
}

/// Key plus the KDF parameters that must be persisted to re-derive it.
struct DerivedKey {
    key: SymmetricKey,
    salt: Option<[u8; SALT_SIZE]>,
    iterations: Option<u32>,
}

impl OffChainStorageEngine {
    pub fn new(config: OffChainConfig) -> Self {
        Self {
            config,
            pbkdf2_iterations: DEFAULT_PBKDF2_ITERATIONS,
        }
    }

    pub fn from_config(config: &ChainsealConfig) -> Self {
        Self::new(config.offchain.clone()).with_pbkdf2_iterations(config.crypto.pbkdf2_iterations)
    }

    /// Iteration count for objects stored with `KeyDerivationStrength::Pbkdf2`.
    pub fn with_pbkdf2_iterations(mut self, iterations: u32) -> Self {
        self.pbkdf2_iterations = iterations;
        self
    }

    pub fn storage_dir(&self) -> &Path {
        &self.config.storage_dir
    }

    pub fn key_strength(&self) -> KeyDerivationStrength {
        self.config.key_strength
    }

    /// Encrypt `data` into a new object file and return its metadata.
    pub fn store(
        &self,
        data: &[u8],
        password: &SecretString,
        content_type: &str,
    ) -> ChainsealResult<OffChainData> {
        if data.is_empty() {
            return Err(ChainsealError::InvalidArgument(
                "off-chain payload must not be empty".into(),
            ));
        }

        let derived = self.derive_new_key(password)?;
        let data_hash = hash::data_hash(data);
        let out = aead::encrypt(data, &derived.key)?;
        let iv = out.iv;
        let blob = out.into_ciphertext_with_tag();

        let dir = self.storage_dir();
        fs::create_dir_all(dir).map_err(|e| ChainsealError::storage_io(dir, e))?;
        let path = dir.join(object_file_name());
        write_new_file(&path, &blob)?;

        debug!(
            path = %path.display(),
            bytes = data.len(),
            strength = %self.config.key_strength,
            "off-chain object stored"
        );

        Ok(OffChainData {
            data_hash,
            signature: None,
            file_path: path,
            file_size: data.len() as u64,
            encryption_iv: BASE64.encode(iv),
            content_type: content_type.to_string(),
            signer_public_key: None,
            key_salt: derived.salt.map(|salt| BASE64.encode(salt)),
            key_iterations: derived.iterations,
            created_at: chrono::Utc::now().timestamp_millis(),
        })
    }

    /// [`store`](Self::store), then sign the data hash with `signer`.
    pub fn store_signed(
        &self,
        data: &[u8],
        password: &SecretString,
        content_type: &str,
        signer: &SigningKey,
    ) -> ChainsealResult<OffChainData> {
        let mut meta = self.store(data, password, content_type)?;
        let signature = signing::sign_data_hash(signer, &meta.data_hash)?;
        meta.signature = Some(BASE64.encode(signature));
        meta.signer_public_key = Some(BASE64.encode(signing::public_key_bytes(
            signer.verifying_key(),
        )));
        Ok(meta)
    }

    /// Read, decrypt and hash-check an object.
    pub fn retrieve(&self, meta: &OffChainData, password: &SecretString) -> ChainsealResult<Vec<u8>> {
        let blob = fs::read(&meta.file_path)
            .map_err(|e| ChainsealError::storage_io(&meta.file_path, e))?;
        let (ciphertext, tag) = aead::split_tag(&blob)?;
        let iv = meta.decode_iv()?;
        let key = derive_stored_key(meta, password)?;

        let plaintext = aead::decrypt(ciphertext, &tag, &key, &iv).inspect_err(|_| {
            warn!(path = %meta.file_path.display(), "off-chain decrypt: authentication failed");
        })?;
        if let Err(e) = hash::verify_data_hash(&plaintext, &meta.data_hash) {
            warn!(path = %meta.file_path.display(), error = %e, "off-chain decrypt: data hash mismatch");
            return Err(e);
        }

        debug!(path = %meta.file_path.display(), bytes = plaintext.len(), "off-chain object retrieved");
        Ok(plaintext)
    }

    /// Full retrieve plus a length cross-check; false on any failure.
    pub fn verify_integrity(&self, meta: &OffChainData, password: &SecretString) -> bool {
        match self.retrieve(meta, password) {
            Ok(plaintext) => {
                let within = (plaintext.len() as u64).abs_diff(meta.file_size)
                    <= self.config.size_tolerance_bytes;
                if !within {
                    warn!(
                        path = %meta.file_path.display(),
                        actual = plaintext.len(),
                        expected = meta.file_size,
                        "off-chain integrity: size outside tolerance"
                    );
                }
                within
            }
            Err(e) => {
                debug!(path = %meta.file_path.display(), error = %e, "off-chain integrity check failed");
                false
            }
        }
    }

    pub fn check_file_structure(&self, meta: &OffChainData) -> Result<(), StructureDefect> {
        structure::check_file_structure(meta, self.config.size_tolerance_bytes)
    }

    /// Password-free structural check using the configured size tolerance.
    pub fn verify_file_structure(&self, meta: &OffChainData) -> bool {
        structure::verify_file_structure(meta, self.config.size_tolerance_bytes)
    }

    /// True when the metadata carries a valid signature over its data hash.
    /// Unsigned metadata is never valid.
    pub fn verify_signature(&self, meta: &OffChainData) -> bool {
        let (Some(signature), Some(public_key)) = (&meta.signature, &meta.signer_public_key) else {
            return false;
        };
        let (Ok(signature), Ok(public_key)) = (BASE64.decode(signature), BASE64.decode(public_key))
        else {
            return false;
        };
        match signing::public_key_from_bytes(&public_key) {
            Ok(public_key) => {
                signing::verify_data_hash_signature(&public_key, &meta.data_hash, &signature)
            }
            Err(_) => false,
        }
    }

    /// Remove the object file. Deleting an already-missing file succeeds.
    ///
    /// Only files named by [`object_file_name`] are removed; metadata pointing
    /// anywhere else is rejected.
    pub fn delete(&self, meta: &OffChainData) -> ChainsealResult<()> {
        let owned = meta
            .file_path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(is_object_file_name);
        if !owned {
            return Err(ChainsealError::InvalidArgument(format!(
                "refusing to delete {}: not an off-chain object file",
                meta.file_path.display()
            )));
        }
        match fs::remove_file(&meta.file_path) {
            Ok(()) => {
                debug!(path = %meta.file_path.display(), "off-chain object deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ChainsealError::storage_io(&meta.file_path, e)),
        }
    }

    fn derive_new_key(&self, password: &SecretString) -> ChainsealResult<DerivedKey> {
        match self.config.key_strength {
            KeyDerivationStrength::Sha3Single => Ok(DerivedKey {
                key: kdf::derive_simple_password_key(password)?,
                salt: None,
                iterations: None,
            }),
            KeyDerivationStrength::Pbkdf2 => {
                let salt = kdf::generate_salt();
                Ok(DerivedKey {
                    key: kdf::derive_password_key(password, &salt, self.pbkdf2_iterations)?,
                    salt: Some(salt),
                    iterations: Some(self.pbkdf2_iterations),
                })
            }
        }
    }
}

/// Re-derive an object's key from the KDF parameters recorded in its metadata.
fn derive_stored_key(meta: &OffChainData, password: &SecretString) -> ChainsealResult<SymmetricKey> {
    match meta.decode_key_salt()? {
        None => kdf::derive_simple_password_key(password),
        Some(salt) => {
            let iterations = meta.key_iterations.ok_or_else(|| {
                ChainsealError::MalformedRecord("keySalt present without keyIterations".into())
            })?;
            kdf::derive_password_key(password, &salt, iterations)
        }
    }
}

fn write_new_file(path: &Path, contents: &[u8]) -> ChainsealResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| ChainsealError::storage_io(path, e))?;

    if let Err(e) = file.write_all(contents).and_then(|()| file.sync_all()) {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(ChainsealError::storage_io(path, e));
    }
    Ok(())
}
