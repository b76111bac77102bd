//! chainseal-crypto: hybrid encryption core for block payloads
//!
//! Architecture: per-record DEK, AES-256-GCM, DEK wrapped under a KEK derived
//! from the recipient's public key.
//!
//! Pipeline: plaintext → SHA3-256 data hash → AES-256-GCM(DEK) → wrap DEK → serialize
//!
//! Key hierarchy:
//! ```text
//! Recipient P-256 key pair
//!   └── KEK = SHA3-256("chainseal/kek/v1" || SEC1(recipient public key))
//!       └── DEK (per-record, 256-bit random, AES-256-GCM wrapped by KEK)
//!           └── Payload AEAD: AES-256-GCM (key=DEK, iv=random 96-bit)
//!
//! Password
//!   ├── Block records:     PBKDF2-HMAC-SHA256(password, random salt, 10000 rounds)
//!   └── Off-chain objects: SHA3-256(password)   (or PBKDF2, per configuration)
//! ```

pub mod aead;
pub mod codec;
pub mod envelope;
pub mod hash;
pub mod hybrid;
pub mod kdf;
pub mod password;
pub mod record;
pub mod secret;
pub mod signing;
pub mod stats;

pub use aead::{decrypt, encrypt, AeadOutput};
pub use codec::{FormatVersion, StoredRecord};
pub use envelope::WrappedKeyEnvelope;
pub use hash::{data_hash, sha3_256, verify_data_hash};
pub use hybrid::{HybridBlockEncryption, SealedBlock};
pub use kdf::{derive_kek, derive_password_key, derive_simple_password_key, generate_salt};
pub use password::PasswordBlockEncryption;
pub use record::{EncryptedRecord, SecureEncryptedData};
pub use secret::SymmetricKey;
pub use signing::{generate_keypair, public_key_bytes, verify_key_pair};
pub use stats::{CryptoStats, StatsSnapshot};

pub use chainseal_core::{ChainsealError, ChainsealResult, KeyDerivationStrength};

/// Size of every symmetric key in bytes (AES-256)
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM IV (96-bit)
pub const IV_SIZE: usize = 12;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;

/// Size of a PBKDF2 salt
pub const SALT_SIZE: usize = 16;

/// Size of a SHA3-256 digest
pub const HASH_SIZE: usize = 32;
