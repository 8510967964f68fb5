//! # Integration Tests
//!
//! Exercise the crates together the way a node wires them: one shared work
//! pool, the difficulty estimator fed from a chain history, and the
//! verification pipeline in front of a mempool.

pub mod concurrency;
pub mod flows;
pub mod metrics;
