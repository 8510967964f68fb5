//! # Consensus-Core Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── benchmarks/       # Criterion benchmark bodies per crate
//! │   ├── cc_01_difficulty.rs
//! │   └── cc_02_tx_verification.rs
//! │
//! └── integration/      # Flows across pool, estimator and pipeline
//!     ├── flows.rs
//!     └── concurrency.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p cc-tests
//!
//! # Benchmarks
//! cargo bench -p cc-tests
//! ```

pub mod benchmarks;
pub mod integration;
