//! # Consensus-Core Telemetry
//!
//! Structured logging for the consensus core, built on `tracing`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cc_telemetry::{init_tracing, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_tracing(&config).expect("Failed to init tracing");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CC_SERVICE_NAME` | `consensus-core` | Service name attached to the startup event |
//! | `CC_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `CC_JSON_LOGS` | `false` | Emit JSON lines instead of human-readable output |
//! | `CC_LOG_THREAD_IDS` | `false` | Include thread ids (useful when reading pool logs) |

mod config;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use tracing_setup::init_tracing;

#[doc(hidden)]
pub use tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter {filter:?}: {reason}")]
    Filter { filter: String, reason: String },

    #[error("Failed to install global subscriber: {0}")]
    SubscriberInit(String),
}

/// Convenience macro for creating a span tagged with the emitting component.
///
/// ```rust,ignore
/// let _span = cc_telemetry::component_span!("verify_batch", component = "tx-verification", blobs = 3);
/// ```
#[macro_export]
macro_rules! component_span {
    ($name:expr, $($field:tt)*) => {
        $crate::tracing::info_span!($name, $($field)*)
    };
}
