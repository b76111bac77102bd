//! chainseal-offchain: encrypted large-object storage on the local filesystem
//!
//! Each object is one file `offchain_<timestamp>_<random>.dat` holding
//! `AES-256-GCM ciphertext || tag`, encrypted in a single AEAD call. The
//! caller keeps the returned [`OffChainData`] record; the engine never
//! persists metadata itself.

pub mod engine;
pub mod metadata;
pub mod naming;
pub mod structure;

pub use engine::OffChainStorageEngine;
pub use metadata::OffChainData;
pub use structure::{check_file_structure, verify_file_structure, StructureDefect};
