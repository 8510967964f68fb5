//! # Shared Types Crate
//!
//! Primitive aliases and helpers used across the consensus core.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: hash, key and difficulty aliases are defined
//!   here once and re-used by every crate in the workspace.
//! - **No I/O**: everything in this crate is a pure value or a pure function.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
