//! # Error Types
//!
//! Errors shared by every crate that reads configuration from the environment.

use thiserror::Error;

/// Invalid configuration value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable was set but could not be parsed.
    #[error("Invalid value for {key}: {value:?}")]
    Unparseable { key: &'static str, value: String },

    /// A value parsed but is outside its accepted range.
    #[error("Invalid {field}: {reason}")]
    OutOfRange { field: &'static str, reason: String },
}

/// Read an optional numeric environment variable.
///
/// Unset yields `Ok(None)`; set but unparseable yields `ConfigError::Unparseable`.
pub fn env_number<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Unparseable { key, value }),
        Err(_) => Ok(None),
    }
}
