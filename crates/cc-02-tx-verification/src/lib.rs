//! # CC-02: Transaction Verification Pipeline
//!
//! Verifies batches of raw transaction blobs received from peers or taken
//! from a block and admits the valid ones to the mempool.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): codec, consensus rules, signature checks,
//!   rejected-semantics cache
//! - **Ports Layer** (`ports/`): inbound API, outbound chain state and mempool
//! - **Service Layer** (`service.rs`): the five-stage pipeline on the work pool
//! - **Metrics** (`metrics.rs`): Prometheus counters behind the `metrics` feature
//!
//! ## Result Taxonomy
//!
//! Every blob gets exactly one [`TxVerdict`], at its request position:
//!
//! | Verdict | Counts as success |
//! |---------|-------------------|
//! | `Accepted` | yes |
//! | `AlreadyKnown` | yes |
//! | `Rejected(TooBig / ParseFailed / Semantics(..) / SignatureFailed / AdmissionFailed(..))` | no |
//!
//! ## Usage
//!
//! ```rust,ignore
//! let pool = Arc::new(WorkPool::new(PoolConfig::from_env()?)?);
//! let service = TransactionVerificationService::new(chain, mempool, pool, VerifierConfig::from_env()?)?;
//! let verdict = service.verify_and_admit(&blobs, false);
//! ```

pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export public API
pub use config::VerifierConfig;
pub use domain::codec::{decode, encode, max_tx_size, tx_hash, tx_weight, CodecError};
pub use domain::entities::{
    BatchVerdict, InputSignature, ProofKind, Transaction, TxInput, TxOutput, TxResult, TxType,
    TxVerdict,
};
pub use domain::errors::{SemanticsFailure, TxRejection};
pub use domain::rejection_cache::{RejectionCache, RejectionCacheStats};
pub use ports::inbound::TransactionVerificationApi;
pub use ports::outbound::{AdmissionError, ChainStateProvider, MempoolGateway};
pub use service::TransactionVerificationService;
