//! Password-free structural checks on stored object files
//!
//! These catch truncation and gross corruption cheaply. They say nothing about
//! authenticity; only a full retrieve with its tag and hash checks does that.

use std::fs::File;
use std::io;
use std::path::PathBuf;

use chainseal_crypto::TAG_SIZE;
use tracing::warn;

use crate::metadata::OffChainData;

#[derive(Debug, thiserror::Error)]
pub enum StructureDefect {
    #[error("object file missing: {}", .0.display())]
    Missing(PathBuf),

    #[error("object file unreadable: {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("object file {len} bytes, shorter than the {}-byte tag", TAG_SIZE)]
    TooSmall { len: u64 },

    #[error("object file {actual} bytes, expected {expected} ± {tolerance}")]
    SizeOutOfTolerance {
        actual: u64,
        expected: u64,
        tolerance: u64,
    },

    #[error("stored IV invalid: {0}")]
    InvalidIv(String),
}

/// Check an object file against its metadata without decrypting it.
pub fn check_file_structure(meta: &OffChainData, tolerance: u64) -> Result<(), StructureDefect> {
    let path = &meta.file_path;
    let file = File::open(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            StructureDefect::Missing(path.clone())
        } else {
            StructureDefect::Unreadable {
                path: path.clone(),
                source,
            }
        }
    })?;
    let stat = file.metadata().map_err(|source| StructureDefect::Unreadable {
        path: path.clone(),
        source,
    })?;
    if !stat.is_file() {
        return Err(StructureDefect::Unreadable {
            path: path.clone(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
        });
    }

    let len = stat.len();
    if len < TAG_SIZE as u64 {
        return Err(StructureDefect::TooSmall { len });
    }

    let Some(expected) = meta.expected_file_len() else {
        return Err(StructureDefect::SizeOutOfTolerance {
            actual: len,
            expected: u64::MAX,
            tolerance,
        });
    };
    if len.abs_diff(expected) > tolerance {
        return Err(StructureDefect::SizeOutOfTolerance {
            actual: len,
            expected,
            tolerance,
        });
    }

    meta.decode_iv()
        .map_err(|e| StructureDefect::InvalidIv(e.to_string()))?;
    Ok(())
}

/// Returns true if the object file passes [`check_file_structure`].
pub fn verify_file_structure(meta: &OffChainData, tolerance: u64) -> bool {
    match check_file_structure(meta, tolerance) {
        Ok(()) => true,
        Err(defect) => {
            warn!(path = %meta.file_path.display(), %defect, "off-chain structure check failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use chainseal_crypto::IV_SIZE;
    use std::path::Path;
    use tempfile::TempDir;

    fn meta_for(path: &Path, file_size: u64) -> OffChainData {
        OffChainData {
            data_hash: "00".repeat(32),
            signature: None,
            file_path: path.to_path_buf(),
            file_size,
            encryption_iv: BASE64.encode([0u8; IV_SIZE]),
            content_type: "application/octet-stream".into(),
            signer_public_key: None,
            key_salt: None,
            key_iterations: None,
            created_at: 0,
        }
    }

    fn write_file(dir: &TempDir, len: usize) -> PathBuf {
        let path = dir.path().join("object.dat");
        std::fs::write(&path, vec![0xEE; len]).unwrap();
        path
    }

    #[test]
    fn test_exact_size_passes() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, 100 + TAG_SIZE);
        assert!(check_file_structure(&meta_for(&path, 100), 0).is_ok());
    }

    #[test]
    fn test_within_tolerance_passes() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, 100 + TAG_SIZE + 8);
        assert!(verify_file_structure(&meta_for(&path, 100), 32));
    }

    #[test]
    fn test_out_of_tolerance() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, 100 + TAG_SIZE + 64);
        assert!(matches!(
            check_file_structure(&meta_for(&path, 100), 32),
            Err(StructureDefect::SizeOutOfTolerance { .. })
        ));
    }

    #[test]
    fn test_declared_size_near_u64_max_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, 100 + TAG_SIZE);
        let meta = meta_for(&path, u64::MAX);
        assert!(matches!(
            check_file_structure(&meta, 32),
            Err(StructureDefect::SizeOutOfTolerance { expected: u64::MAX, .. })
        ));
        assert!(!verify_file_structure(&meta, 32));
    }

    #[test]
    fn test_shorter_than_tag() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, TAG_SIZE - 1);
        assert!(matches!(
            check_file_structure(&meta_for(&path, 0), 32),
            Err(StructureDefect::TooSmall { len }) if len == (TAG_SIZE - 1) as u64
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let meta = meta_for(&dir.path().join("gone.dat"), 10);
        assert!(matches!(
            check_file_structure(&meta, 32),
            Err(StructureDefect::Missing(_))
        ));
        assert!(!verify_file_structure(&meta, 32));
    }

    #[test]
    fn test_directory_is_not_an_object() {
        let dir = TempDir::new().unwrap();
        let meta = meta_for(dir.path(), 0);
        assert!(!verify_file_structure(&meta, 1024));
    }

    #[test]
    fn test_bad_iv() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, 10 + TAG_SIZE);
        let meta = OffChainData {
            encryption_iv: BASE64.encode([0u8; 16]),
            ..meta_for(&path, 10)
        };
        assert!(matches!(
            check_file_structure(&meta, 0),
            Err(StructureDefect::InvalidIv(_))
        ));
    }
}
