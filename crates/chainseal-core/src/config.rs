use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::logging::LogFormat;
use crate::types::KeyDerivationStrength;

/// Default PBKDF2-HMAC-SHA256 iteration count for password-protected records.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 10_000;

/// Top-level configuration (loaded from chainseal.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainsealConfig {
    pub logging: LoggingConfig,
    pub crypto: CryptoConfig,
    pub offchain: OffChainConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: LogFormat,
}

/// Password-mode encryption settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// PBKDF2 iterations for password-protected block records (default: 10000)
    pub pbkdf2_iterations: u32,
}

/// Off-chain large-object storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OffChainConfig {
    /// Directory holding one `offchain_<timestamp>_<random>.dat` file per object
    pub storage_dir: PathBuf,
    /// Password stretching used for newly stored objects
    pub key_strength: KeyDerivationStrength,
    /// Slack allowed between the on-disk size and `original + tag`
    pub size_tolerance_bytes: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Text,
        }
    }
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: DEFAULT_PBKDF2_ITERATIONS,
        }
    }
}

impl Default for OffChainConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("offchain-data"),
            key_strength: KeyDerivationStrength::Sha3Single,
            size_tolerance_bytes: 32,
        }
    }
}

impl ChainsealConfig {
    /// Load configuration from a TOML file, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!("config file not found: {}  (using defaults)", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;

        if config.crypto.pbkdf2_iterations == 0 {
            anyhow::bail!(
                "invalid config {}: crypto.pbkdf2_iterations must be positive",
                path.display()
            );
        }
        Ok(config)
    }
}
