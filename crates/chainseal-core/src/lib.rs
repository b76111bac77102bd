//! chainseal-core: shared types for the chainseal data-protection core
//!
//! - `error`: the typed failure taxonomy every crypto/off-chain operation reports
//! - `config`: TOML configuration schema (logging, crypto, off-chain storage)
//! - `logging`: tracing-subscriber bootstrap for embedding services
//! - `types`: small enums shared across crates

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::ChainsealConfig;
pub use error::{ChainsealError, ChainsealResult};
pub use types::KeyDerivationStrength;
