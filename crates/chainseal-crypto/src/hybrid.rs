//! Hybrid block encryption: per-record DEK under a recipient-derived KEK
//!
//! Encryption:
//! 1. random DEK, `data_hash = SHA3-256(plaintext)`
//! 2. payload ← AES-256-GCM(DEK, fresh IV)
//! 3. KEK ← SHA3-256(domain tag || SEC1(recipient public key))
//! 4. wrapped key ← envelope(public key, AES-256-GCM(KEK, DEK))
//!
//! Decryption runs the steps backwards, but checks the private key against
//! the embedded public key first so a wrong key fails as [`ChainsealError::KeyMismatch`]
//! before any AEAD work is attempted. DEK and KEK are [`SymmetricKey`]s and are
//! zeroized when they go out of scope on every exit path.

use p256::ecdsa::{SigningKey, VerifyingKey};
use tracing::{debug, warn};

use crate::codec::FormatVersion;
use crate::envelope::WrappedKeyEnvelope;
use crate::record::{now_millis, EncryptedRecord};
use crate::secret::SymmetricKey;
use crate::stats::CryptoStats;
use crate::{aead, hash, kdf, signing, ChainsealError, ChainsealResult};

/// An encrypted record plus the optional signature over its data hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBlock {
    pub record: EncryptedRecord,
    /// ECDSA P-256 signature (P1363) over `record.data_hash`, when a signer was given
    pub signature: Option<Vec<u8>>,
}

#[derive(Debug, Default)]
pub struct HybridBlockEncryption {
    stats: CryptoStats,
}

impl HybridBlockEncryption {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &CryptoStats {
        &self.stats
    }

    /// Encrypt a block payload for `recipient`.
    ///
    /// When `signer` is given, the record's data hash is signed as well; the
    /// signature is returned beside the record and is not part of its stored form.
    pub fn encrypt_block_data(
        &self,
        plaintext: &[u8],
        recipient: &VerifyingKey,
        signer: Option<&SigningKey>,
    ) -> ChainsealResult<SealedBlock> {
        if plaintext.is_empty() {
            return Err(ChainsealError::InvalidArgument(
                "block plaintext must not be empty".into(),
            ));
        }

        let dek = SymmetricKey::generate();
        let data_hash = hash::data_hash(plaintext);

        let payload = aead::encrypt(plaintext, &dek)?;
        self.stats.record_encryption();

        let public_key = signing::public_key_bytes(recipient);
        let kek = kdf::derive_kek(&public_key)?;
        let envelope = WrappedKeyEnvelope::seal(&dek, &kek, &public_key)?;
        self.stats.record_encryption();

        let signature = signer
            .map(|key| signing::sign_data_hash(key, &data_hash))
            .transpose()?;

        let record = EncryptedRecord {
            ciphertext: payload.ciphertext,
            wrapped_key: envelope.to_bytes(),
            iv: payload.iv,
            auth_tag: payload.tag,
            data_hash,
            version: FormatVersion::HybridV1.tag().to_string(),
            timestamp: now_millis(),
        };

        debug!(
            bytes = plaintext.len(),
            version = %record.version,
            signed = signature.is_some(),
            "hybrid block encrypted"
        );
        Ok(SealedBlock { record, signature })
    }

    /// Decrypt a hybrid record with the recipient's private key and verify
    /// the plaintext against the stored data hash.
    pub fn decrypt_block_data(
        &self,
        record: &EncryptedRecord,
        recipient_private: &SigningKey,
    ) -> ChainsealResult<Vec<u8>> {
        if FormatVersion::from_tag(&record.version) != Some(FormatVersion::HybridV1) {
            return Err(ChainsealError::UnsupportedVersion(record.version.clone()));
        }

        let envelope = record.envelope()?;

        self.stats.record_key_pair_check();
        if !signing::verify_key_pair(recipient_private, &envelope.public_key) {
            warn!("hybrid decrypt rejected: private key does not match embedded public key");
            return Err(ChainsealError::KeyMismatch(
                "private key does not correspond to the record's recipient public key".into(),
            ));
        }

        let kek = kdf::derive_kek(&envelope.public_key)?;
        self.stats.record_decryption();
        let dek = envelope.open(&kek).inspect_err(|e| {
            warn!(error = %e, "hybrid decrypt: DEK unwrap failed");
        })?;

        self.stats.record_decryption();
        let plaintext = aead::decrypt(&record.ciphertext, &record.auth_tag, &dek, &record.iv)
            .inspect_err(|e| {
                warn!(error = %e, "hybrid decrypt: payload authentication failed");
            })?;

        if let Err(e) = hash::verify_data_hash(&plaintext, &record.data_hash) {
            warn!(error = %e, "hybrid decrypt: data hash mismatch");
            return Err(e);
        }

        debug!(bytes = plaintext.len(), "hybrid block decrypted");
        Ok(plaintext)
    }

    /// Full decrypt plus hash check, reduced to a boolean.
    pub fn verify_record(&self, record: &EncryptedRecord, recipient_private: &SigningKey) -> bool {
        self.decrypt_block_data(record, recipient_private).is_ok()
    }

    pub fn encrypt_string(
        &self,
        plaintext: &str,
        recipient: &VerifyingKey,
        signer: Option<&SigningKey>,
    ) -> ChainsealResult<SealedBlock> {
        self.encrypt_block_data(plaintext.as_bytes(), recipient, signer)
    }

    pub fn decrypt_string(
        &self,
        record: &EncryptedRecord,
        recipient_private: &SigningKey,
    ) -> ChainsealResult<String> {
        let bytes = self.decrypt_block_data(record, recipient_private)?;
        String::from_utf8(bytes).map_err(|_| {
            ChainsealError::MalformedRecord("decrypted block is not valid UTF-8".into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::generate_keypair;
    use crate::StatsSnapshot;

    #[test]
    fn test_roundtrip() {
        let engine = HybridBlockEncryption::new();
        let recipient = generate_keypair();

        let sealed = engine
            .encrypt_block_data(b"block #42 payload", recipient.verifying_key(), None)
            .unwrap();
        assert!(sealed.signature.is_none());
        assert_eq!(sealed.record.version, "GCM-v1.0");

        let plaintext = engine.decrypt_block_data(&sealed.record, &recipient).unwrap();
        assert_eq!(plaintext, b"block #42 payload");
    }

    #[test]
    fn test_empty_plaintext_rejected() {
        let engine = HybridBlockEncryption::new();
        let recipient = generate_keypair();
        let err = engine
            .encrypt_block_data(b"", recipient.verifying_key(), None)
            .unwrap_err();
        assert!(matches!(err, ChainsealError::InvalidArgument(_)));
    }

    #[test]
    fn test_envelope_embeds_recipient_public_key() {
        let engine = HybridBlockEncryption::new();
        let recipient = generate_keypair();
        let sealed = engine
            .encrypt_block_data(b"data", recipient.verifying_key(), None)
            .unwrap();

        let envelope = sealed.record.envelope().unwrap();
        assert_eq!(
            envelope.public_key,
            signing::public_key_bytes(recipient.verifying_key())
        );
    }

    #[test]
    fn test_key_mismatch_before_any_aead_call() {
        let engine = HybridBlockEncryption::new();
        let recipient = generate_keypair();
        let intruder = generate_keypair();

        let sealed = engine
            .encrypt_block_data(b"confidential", recipient.verifying_key(), None)
            .unwrap();
        let before = engine.stats().snapshot();

        let err = engine.decrypt_block_data(&sealed.record, &intruder).unwrap_err();
        assert!(matches!(err, ChainsealError::KeyMismatch(_)), "got {err}");

        let after = engine.stats().snapshot();
        assert_eq!(after.key_pair_checks, before.key_pair_checks + 1);
        assert_eq!(
            after.aead_decryptions, before.aead_decryptions,
            "no AEAD decryption may run after a failed key-pair check"
        );
    }

    #[test]
    fn test_stats_count_successful_operations() {
        let engine = HybridBlockEncryption::new();
        let recipient = generate_keypair();
        let sealed = engine
            .encrypt_block_data(b"counted", recipient.verifying_key(), None)
            .unwrap();
        engine.decrypt_block_data(&sealed.record, &recipient).unwrap();

        assert_eq!(
            engine.stats().snapshot(),
            StatsSnapshot {
                aead_encryptions: 2,
                aead_decryptions: 2,
                key_pair_checks: 1,
            }
        );
    }

    #[test]
    fn test_unknown_version_rejected() {
        let engine = HybridBlockEncryption::new();
        let recipient = generate_keypair();
        let mut record = engine
            .encrypt_block_data(b"data", recipient.verifying_key(), None)
            .unwrap()
            .record;
        record.version = "GCM-v9.9".into();

        let err = engine.decrypt_block_data(&record, &recipient).unwrap_err();
        assert!(matches!(err, ChainsealError::UnsupportedVersion(_)));
    }

    #[test]
    fn test_altered_hash_is_integrity_failure() {
        let engine = HybridBlockEncryption::new();
        let recipient = generate_keypair();
        let mut record = engine
            .encrypt_block_data(b"data", recipient.verifying_key(), None)
            .unwrap()
            .record;
        record.data_hash = hash::data_hash(b"something else");

        let err = engine.decrypt_block_data(&record, &recipient).unwrap_err();
        assert!(matches!(err, ChainsealError::IntegrityFailure { .. }));
    }

    #[test]
    fn test_signer_signs_data_hash() {
        let engine = HybridBlockEncryption::new();
        let recipient = generate_keypair();
        let signer = generate_keypair();

        let sealed = engine
            .encrypt_block_data(b"signed block", recipient.verifying_key(), Some(&signer))
            .unwrap();
        let signature = sealed.signature.expect("signature requested");

        assert!(signing::verify_data_hash_signature(
            signer.verifying_key(),
            &sealed.record.data_hash,
            &signature
        ));
    }

    #[test]
    fn test_string_helpers() {
        let engine = HybridBlockEncryption::new();
        let recipient = generate_keypair();
        let sealed = engine
            .encrypt_string("hello-blockchain", recipient.verifying_key(), None)
            .unwrap();
        assert_eq!(
            engine.decrypt_string(&sealed.record, &recipient).unwrap(),
            "hello-blockchain"
        );
        assert!(engine.verify_record(&sealed.record, &recipient));
        assert!(!engine.verify_record(&sealed.record, &generate_keypair()));
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(16))]

            #[test]
            fn prop_roundtrip(plaintext in proptest::collection::vec(any::<u8>(), 1..512)) {
                let engine = HybridBlockEncryption::new();
                let recipient = generate_keypair();
                let sealed = engine
                    .encrypt_block_data(&plaintext, recipient.verifying_key(), None)
                    .unwrap();
                prop_assert_eq!(engine.decrypt_block_data(&sealed.record, &recipient).unwrap(), plaintext);
            }
        }
    }
}
