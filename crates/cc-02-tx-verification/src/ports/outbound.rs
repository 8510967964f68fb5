//! # Outbound Ports (Driven Ports / SPI)
//!
//! What the pipeline needs from the rest of the node. Every call is made
//! from the thread running `verify_and_admit`, never from pool workers.

use std::sync::Arc;

use shared_types::{HardForkVersion, Hash, KeyImage};
use thiserror::Error;

use crate::domain::entities::Transaction;

/// Error from mempool admission.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// The mempool is full
    #[error("Mempool is full")]
    Full,

    /// Transaction was rejected
    #[error("Transaction rejected: {reason}")]
    Rejected { reason: String },

    /// Communication error
    #[error("Communication error: {0}")]
    CommunicationError(String),
}

/// Read access to the current chain state.
pub trait ChainStateProvider: Send + Sync {
    /// Version whose rules apply to the next block.
    fn current_hard_fork_version(&self) -> HardForkVersion;

    /// Weight limit of the next block.
    fn current_block_weight_limit(&self) -> u64;

    fn is_transaction_in_chain(&self, tx_hash: &Hash) -> bool;

    fn is_key_image_spent(&self, key_image: &KeyImage) -> bool;
}

/// Gateway to the transaction pool.
pub trait MempoolGateway: Send + Sync {
    fn is_transaction_known(&self, tx_hash: &Hash) -> bool;

    /// Whether a pooled transaction already spends `key_image`.
    fn has_key_image(&self, key_image: &KeyImage) -> bool;

    /// Admit a fully verified transaction.
    ///
    /// # Errors
    /// * `AdmissionError::Full` - Mempool has reached capacity
    /// * `AdmissionError::Rejected` - Mempool policy refused the transaction
    fn admit(
        &self,
        tx: &Transaction,
        tx_hash: &Hash,
        blob: &[u8],
        weight: u64,
        kept_by_block: bool,
    ) -> Result<(), AdmissionError>;
}

impl<T: ChainStateProvider + ?Sized> ChainStateProvider for Arc<T> {
    fn current_hard_fork_version(&self) -> HardForkVersion {
        (**self).current_hard_fork_version()
    }

    fn current_block_weight_limit(&self) -> u64 {
        (**self).current_block_weight_limit()
    }

    fn is_transaction_in_chain(&self, tx_hash: &Hash) -> bool {
        (**self).is_transaction_in_chain(tx_hash)
    }

    fn is_key_image_spent(&self, key_image: &KeyImage) -> bool {
        (**self).is_key_image_spent(key_image)
    }
}

impl<T: MempoolGateway + ?Sized> MempoolGateway for Arc<T> {
    fn is_transaction_known(&self, tx_hash: &Hash) -> bool {
        (**self).is_transaction_known(tx_hash)
    }

    fn has_key_image(&self, key_image: &KeyImage) -> bool {
        (**self).has_key_image(key_image)
    }

    fn admit(
        &self,
        tx: &Transaction,
        tx_hash: &Hash,
        blob: &[u8],
        weight: u64,
        kept_by_block: bool,
    ) -> Result<(), AdmissionError> {
        (**self).admit(tx, tx_hash, blob, weight, kept_by_block)
    }
}
