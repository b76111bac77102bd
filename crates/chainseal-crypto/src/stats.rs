//! Per-engine operation counters
//!
//! Each engine owns its own `CryptoStats`; callers that want shared counters
//! wrap the engine, not the counters, in an `Arc`.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct CryptoStats {
    aead_encryptions: AtomicU64,
    aead_decryptions: AtomicU64,
    key_pair_checks: AtomicU64,
}

/// Point-in-time copy of [`CryptoStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub aead_encryptions: u64,
    pub aead_decryptions: u64,
    pub key_pair_checks: u64,
}

impl CryptoStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_encryption(&self) {
        self.aead_encryptions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_decryption(&self) {
        self.aead_decryptions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_key_pair_check(&self) {
        self.key_pair_checks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            aead_encryptions: self.aead_encryptions.load(Ordering::Relaxed),
            aead_decryptions: self.aead_decryptions.load(Ordering::Relaxed),
            key_pair_checks: self.key_pair_checks.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        assert_eq!(CryptoStats::new().snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_counters_increment_independently() {
        let stats = CryptoStats::new();
        stats.record_encryption();
        stats.record_encryption();
        stats.record_decryption();
        stats.record_key_pair_check();

        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                aead_encryptions: 2,
                aead_decryptions: 1,
                key_pair_checks: 1,
            }
        );
    }
}
