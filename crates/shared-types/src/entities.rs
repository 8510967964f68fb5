//! # Core Entities
//!
//! Fixed-size aliases for the values exchanged between the verification
//! pipeline, the chain-state collaborator and the mempool.

use sha3::{Digest, Keccak256};

// =============================================================================
// PRIMITIVE ALIASES
// =============================================================================

/// A 32-byte Keccak-256 digest (transaction ids, prefix hashes, PoW hashes).
pub type Hash = [u8; 32];

/// A 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// A 32-byte compressed Edwards point used as a one-time public key.
pub type PublicKey = [u8; 32];

/// A 32-byte compressed Edwards point tagging a spent output.
///
/// Two inputs carrying the same key image spend the same output.
pub type KeyImage = [u8; 32];

/// Consensus protocol version selecting the active rule set.
pub type HardForkVersion = u8;

/// Proof-of-work difficulty of a single block.
pub type Difficulty = u64;

/// The all-zero hash.
pub const ZERO_HASH: Hash = [0u8; 32];

// =============================================================================
// HASHING
// =============================================================================

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Lowercase hex rendering of a hash, for log fields.
pub fn hash_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// First eight bytes of a hash in hex, for compact log lines.
pub fn short_hex(hash: &Hash) -> String {
    hex::encode(&hash[..8])
}
