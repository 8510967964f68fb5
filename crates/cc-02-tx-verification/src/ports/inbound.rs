//! # Inbound Ports (Driving Ports / API)
//!
//! The public API of the verification pipeline.

use shared_types::Hash;

use crate::domain::entities::BatchVerdict;
use crate::domain::rejection_cache::RejectionCacheStats;

/// Transaction Verification API.
///
/// Implementations must be thread-safe (`Send + Sync`); concurrent calls
/// share the rejected cache and the work pool.
pub trait TransactionVerificationApi: Send + Sync {
    /// Verify a batch of raw transaction blobs and admit the valid ones.
    ///
    /// One result per blob, in request order. A failing blob never affects
    /// the verdict of another, apart from key-image conflicts, where the
    /// earlier blob wins.
    ///
    /// `kept_by_block` marks transactions taken from a block being
    /// processed; they are exempt from the per-transaction weight cap.
    fn verify_and_admit(&self, blobs: &[Vec<u8>], kept_by_block: bool) -> BatchVerdict;

    /// Whether `tx_hash` is currently in the rejected cache.
    fn is_rejected(&self, tx_hash: &Hash) -> bool;

    fn rejection_cache_stats(&self) -> RejectionCacheStats;
}
