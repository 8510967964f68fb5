//! # Domain Layer
//!
//! Pure verification logic: decoding, consensus rules, signature checks and
//! the rejected-semantics cache. No port access and no threading here.

pub mod codec;
pub mod entities;
pub mod errors;
pub(crate) mod record;
pub mod rejection_cache;
pub mod semantics;
pub mod signatures;
