//! Pool configuration from environment variables.

use shared_types::{env_number, ConfigError};

/// Upper bound on worker threads accepted from configuration.
pub const MAX_POOL_THREADS: usize = 1024;

/// Work pool sizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of worker threads
    pub threads: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get().max(1),
        }
    }
}

impl PoolConfig {
    /// Pool with exactly `threads` workers.
    pub fn with_threads(threads: usize) -> Self {
        Self { threads }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CC_POOL_THREADS`: Worker count (default: detected hardware concurrency)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(threads) = env_number("CC_POOL_THREADS")? {
            config.threads = threads;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 || self.threads > MAX_POOL_THREADS {
            return Err(ConfigError::OutOfRange {
                field: "threads",
                reason: format!("must be in 1..={}, got {}", MAX_POOL_THREADS, self.threads),
            });
        }
        Ok(())
    }
}
