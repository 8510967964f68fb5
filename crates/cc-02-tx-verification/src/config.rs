//! Verifier configuration.
//!
//! Consensus limits are not configurable; only the memory spent on the
//! rejected cache and the miner transaction reserve are.

use shared_types::{env_number, ConfigError};

use crate::domain::rejection_cache::DEFAULT_CAPACITY;
use crate::domain::semantics::COINBASE_BLOB_RESERVED_SIZE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Entries per rejected-cache generation
    pub rejected_cache_capacity: usize,
    /// Block weight kept free for the miner transaction
    pub coinbase_reserved_size: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            rejected_cache_capacity: DEFAULT_CAPACITY,
            coinbase_reserved_size: COINBASE_BLOB_RESERVED_SIZE,
        }
    }
}

impl VerifierConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CC_REJECTED_CACHE_CAPACITY`: Entries per cache generation (default: 100000)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(capacity) = env_number("CC_REJECTED_CACHE_CAPACITY")? {
            config.rejected_cache_capacity = capacity;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rejected_cache_capacity == 0 {
            return Err(ConfigError::OutOfRange {
                field: "rejected_cache_capacity",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
