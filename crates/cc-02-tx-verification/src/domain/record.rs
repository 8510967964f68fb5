//! Per-blob bookkeeping while a batch moves through the stages.

use std::sync::Arc;

use shared_types::Hash;

use super::entities::{Transaction, TxResult, TxVerdict};
use super::errors::TxRejection;

/// Where a record stands. Only `Pending` records enter the next stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RecordState {
    Pending,
    AlreadyKnown,
    Rejected(TxRejection),
    /// Passed every check; set to `Rejected` again if admission fails.
    Accepted,
    /// Same blob as the record at `first`; settled after admission.
    Repeat { first: usize },
}

#[derive(Debug)]
pub(crate) struct TxRecord {
    pub blob: Arc<[u8]>,
    pub hash: Option<Hash>,
    pub tx: Option<Arc<Transaction>>,
    pub weight: u64,
    pub state: RecordState,
}

impl TxRecord {
    pub fn new(blob: &[u8]) -> Self {
        Self {
            blob: Arc::from(blob),
            hash: None,
            tx: None,
            weight: 0,
            state: RecordState::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == RecordState::Pending
    }

    pub fn reject(&mut self, rejection: TxRejection) {
        self.state = RecordState::Rejected(rejection);
    }

    /// The decoded transaction, if this record is still in play.
    pub fn pending_tx(&self) -> Option<&Arc<Transaction>> {
        if self.is_pending() {
            self.tx.as_ref()
        } else {
            None
        }
    }

    pub fn into_result(self) -> TxResult {
        let verdict = match self.state {
            RecordState::Accepted => TxVerdict::Accepted,
            RecordState::AlreadyKnown => TxVerdict::AlreadyKnown,
            RecordState::Rejected(rejection) => TxVerdict::Rejected(rejection),
            RecordState::Pending | RecordState::Repeat { .. } => {
                TxVerdict::Rejected(TxRejection::Aborted)
            }
        };
        TxResult {
            hash: self.hash,
            verdict,
        }
    }
}
