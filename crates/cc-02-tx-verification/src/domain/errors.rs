//! # Verification Errors
//!
//! Why a blob was turned away. Every variant is a per-record outcome: none
//! of them aborts the rest of the batch.

use thiserror::Error;

/// Rejection reason for one blob.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TxRejection {
    /// The blob exceeds the size limit of the active hard fork.
    #[error("Transaction too big: {size} bytes (limit {limit})")]
    TooBig { size: usize, limit: usize },

    /// The blob does not decode as a transaction.
    #[error("Failed to parse transaction")]
    ParseFailed,

    /// The transaction decoded but breaks a consensus rule.
    #[error("Semantics check failed: {0}")]
    Semantics(#[from] SemanticsFailure),

    /// An input signature does not verify, or its key is unusable.
    #[error("Signature verification failed")]
    SignatureFailed,

    /// Verification passed but the mempool refused the transaction.
    #[error("Mempool admission failed: {0}")]
    AdmissionFailed(String),

    /// The verification task for this blob did not complete.
    #[error("Verification aborted")]
    Aborted,
}

/// Consensus rule broken by a decoded transaction.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Hash)]
pub enum SemanticsFailure {
    /// Transfer without inputs, or a non-transfer type that spends something.
    #[error("Wrong number of inputs for transaction type")]
    EmptyInputs,

    /// An input that is not a key spend, or a key spend with an empty ring.
    #[error("Unsupported input type")]
    UnsupportedInputType,

    /// Output key off the curve, amount not allowed for the proof type, or
    /// a transfer with no outputs.
    #[error("Invalid outputs")]
    InvalidOutputs,

    /// Signature count differs from input count, or commitment count from
    /// output count.
    #[error("Signature or commitment count does not match")]
    OutputCountMismatch,

    /// Amount sums overflow or outputs exceed inputs.
    #[error("Money overflow")]
    MoneyOverflow,

    /// Weight over the per-transaction share of the block weight limit.
    #[error("Transaction too large for a block")]
    TooLargeForBlock,

    /// Key image repeated within the transaction, claimed earlier in the
    /// batch, held by the mempool, or spent on chain.
    #[error("Duplicate key image")]
    DuplicateKeyImage,

    /// Zero relative offset after the first ring member.
    #[error("Duplicate ring member")]
    DuplicateRingMember,

    /// Key image is not a torsion-free, non-identity curve point.
    #[error("Key image outside the prime-order subgroup")]
    InvalidKeyImageDomain,

    /// The transaction id sits in the recently-rejected cache.
    #[error("Previously rejected")]
    PreviouslyRejected,
}

impl TxRejection {
    /// Stable snake_case name, used as a metrics label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::TooBig { .. } => "too_big",
            Self::ParseFailed => "parse_failed",
            Self::Semantics(failure) => failure.label(),
            Self::SignatureFailed => "signature_failed",
            Self::AdmissionFailed(_) => "admission_failed",
            Self::Aborted => "aborted",
        }
    }
}

impl SemanticsFailure {
    pub fn label(self) -> &'static str {
        match self {
            Self::EmptyInputs => "empty_inputs",
            Self::UnsupportedInputType => "unsupported_input_type",
            Self::InvalidOutputs => "invalid_outputs",
            Self::OutputCountMismatch => "output_count_mismatch",
            Self::MoneyOverflow => "money_overflow",
            Self::TooLargeForBlock => "too_large_for_block",
            Self::DuplicateKeyImage => "duplicate_key_image",
            Self::DuplicateRingMember => "duplicate_ring_member",
            Self::InvalidKeyImageDomain => "invalid_key_image_domain",
            Self::PreviouslyRejected => "previously_rejected",
        }
    }

    /// Whether the failure depends on the transaction alone.
    ///
    /// Only such failures may enter the rejected cache: a transaction too
    /// large for the current block limit, or one already answered from the
    /// cache, may be judged differently later.
    pub fn is_cacheable(self) -> bool {
        !matches!(self, Self::TooLargeForBlock | Self::PreviouslyRejected)
    }
}
