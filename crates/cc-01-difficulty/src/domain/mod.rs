//! # Domain Layer
//!
//! Pure functions over caller-owned history; no shared state, no I/O.

pub mod algorithm;
pub mod arith;
pub mod errors;
pub mod estimator;

mod legacy;
mod lwma;
