//! # Transaction Entities
//!
//! The decoded transaction model and the verdicts the pipeline hands back
//! per submitted blob.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_types::{Hash, KeyImage, PublicKey, Signature};

use super::errors::TxRejection;

// =============================================================================
// TRANSACTION MODEL
// =============================================================================

/// Transaction type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxType {
    /// Ordinary value transfer.
    Standard,
    /// Registration or state update carried in `extra`; spends nothing.
    StateChange,
    /// Releases a previously locked key image; spends nothing.
    KeyImageUnlock,
    /// Value transfer that locks its outputs as stake.
    Stake,
}

impl TxType {
    /// Transfer types move value and must spend at least one input.
    pub fn is_transfer(self) -> bool {
        matches!(self, Self::Standard | Self::Stake)
    }
}

/// A transaction input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxInput {
    /// Coinbase input. Only valid inside a block's miner transaction.
    Gen { height: u64 },
    /// Spend of one output out of a ring of candidates.
    ToKey {
        amount: u64,
        /// Relative global output indices; the first is absolute.
        key_offsets: Vec<u64>,
        key_image: KeyImage,
    },
}

impl TxInput {
    pub fn key_image(&self) -> Option<&KeyImage> {
        match self {
            Self::ToKey { key_image, .. } => Some(key_image),
            Self::Gen { .. } => None,
        }
    }
}

/// A transaction output paying to a one-time key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Cleartext amount for legacy proofs, zero when hidden in a commitment.
    pub amount: u64,
    pub key: PublicKey,
}

/// How amounts are proven.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofKind {
    /// Cleartext amounts. The fee is the difference between inputs and outputs.
    Legacy,
    /// Hidden amounts with one commitment per output and an explicit fee.
    /// Input signatures of these transactions are verified in one batch.
    Batched { fee: u64, commitments: Vec<[u8; 32]> },
}

/// Signature authorizing the spend of one input.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSignature {
    pub public_key: PublicKey,
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

/// A decoded transaction.
///
/// Everything except `signatures` forms the prefix that each input
/// signature commits to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u16,
    pub tx_type: TxType,
    pub unlock_time: u64,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub extra: Vec<u8>,
    pub proof: ProofKind,
    pub signatures: Vec<InputSignature>,
}

impl Transaction {
    pub fn is_batched(&self) -> bool {
        matches!(self.proof, ProofKind::Batched { .. })
    }

    /// Key images of all `ToKey` inputs, in input order.
    pub fn key_images(&self) -> impl Iterator<Item = &KeyImage> {
        self.inputs.iter().filter_map(TxInput::key_image)
    }
}

// =============================================================================
// VERDICTS
// =============================================================================

/// Outcome for one submitted blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxVerdict {
    /// Verified and admitted to the mempool.
    Accepted,
    /// Already in the mempool, on chain, or earlier in the same batch.
    AlreadyKnown,
    Rejected(TxRejection),
}

impl TxVerdict {
    /// Accepted and already-known blobs both count as success.
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

/// Per-blob result, at the same position as the blob in the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxResult {
    /// Transaction id; `None` when the blob never decoded.
    pub hash: Option<Hash>,
    pub verdict: TxVerdict,
}

/// Result of one `verify_and_admit` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchVerdict {
    pub results: Vec<TxResult>,
    /// True iff every blob was accepted or already known.
    pub all_accepted: bool,
}

impl BatchVerdict {
    pub fn new(results: Vec<TxResult>) -> Self {
        let all_accepted = results.iter().all(|r| r.verdict.is_ok());
        Self {
            results,
            all_accepted,
        }
    }

    pub fn verdicts(&self) -> impl Iterator<Item = &TxVerdict> {
        self.results.iter().map(|r| &r.verdict)
    }

    pub fn accepted_count(&self) -> usize {
        self.verdicts()
            .filter(|v| matches!(v, TxVerdict::Accepted))
            .count()
    }
}
