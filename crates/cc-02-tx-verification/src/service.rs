//! # Transaction Verification Service
//!
//! Application service implementing [`TransactionVerificationApi`].
//!
//! ## Stages
//!
//! | Stage | Runs | Work |
//! |-------|------|------|
//! | 1 | pool | size limit, decode, rejected-cache lookup |
//! | 2 | caller | repeats within the batch, mempool, chain |
//! | 3 | pool, then caller | context-free semantics, then key images spent on chain or held by the mempool |
//! | 4 | pool, then caller | one batch equation, per-record fallback, then key-image claims in input order |
//! | 5 | caller | admit accepted records in input order |
//!
//! A record leaves the pipeline at its first failure. Key-image claims between
//! records of the same batch are settled only among records whose signatures
//! verified, so a forged transaction cannot shadow a valid one. A repeat of
//! a blob earlier in the batch takes the final verdict of its first copy:
//! `AlreadyKnown` if that copy was admitted, its rejection otherwise.
//!
//! The hard fork version and block weight limit are read once, before
//! stage 1, so every blob of a call is judged under the same rules. Port
//! calls only happen on the calling thread.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cc_compute::{TaskContext, WorkPool};
use parking_lot::Mutex;
use shared_types::{short_hex, ConfigError, HardForkVersion, Hash, KeyImage};
use tracing::{debug, error, info, instrument, warn};

use crate::config::VerifierConfig;
use crate::domain::codec::{self, max_tx_size};
use crate::domain::entities::{BatchVerdict, Transaction};
use crate::domain::errors::{SemanticsFailure, TxRejection};
use crate::domain::record::{RecordState, TxRecord};
use crate::domain::rejection_cache::{RejectionCache, RejectionCacheStats};
use crate::domain::semantics::{self, SemanticsContext};
use crate::domain::signatures::{self, PreparedSignatures};
use crate::metrics;
use crate::ports::inbound::TransactionVerificationApi;
use crate::ports::outbound::{ChainStateProvider, MempoolGateway};

/// Outcome of stage 1 for one blob.
enum ParseOutcome {
    Parsed {
        tx: Arc<Transaction>,
        hash: Hash,
        weight: u64,
    },
    Rejected {
        hash: Option<Hash>,
        rejection: TxRejection,
    },
}

fn parse_blob(
    blob: &[u8],
    hf_version: HardForkVersion,
    rejected: &Mutex<RejectionCache>,
) -> ParseOutcome {
    let limit = max_tx_size(hf_version);
    if blob.len() > limit {
        return ParseOutcome::Rejected {
            hash: None,
            rejection: TxRejection::TooBig {
                size: blob.len(),
                limit,
            },
        };
    }

    let tx = match codec::decode(blob) {
        Ok(tx) => tx,
        Err(e) => {
            debug!(size = blob.len(), error = %e, "Failed to decode transaction blob");
            return ParseOutcome::Rejected {
                hash: None,
                rejection: TxRejection::ParseFailed,
            };
        }
    };

    let hash = codec::tx_hash(blob);
    if rejected.lock().contains(&hash) {
        return ParseOutcome::Rejected {
            hash: Some(hash),
            rejection: SemanticsFailure::PreviouslyRejected.into(),
        };
    }

    let weight = codec::tx_weight(&tx, blob.len());
    ParseOutcome::Parsed {
        tx: Arc::new(tx),
        hash,
        weight,
    }
}

/// Indices and transactions of all records still pending.
fn pending(records: &[TxRecord]) -> (Vec<usize>, Vec<Arc<Transaction>>) {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| record.pending_tx().map(|tx| (index, Arc::clone(tx))))
        .unzip()
}

/// Transaction Verification Service.
///
/// Verifies batches of raw blobs on a shared [`WorkPool`] and forwards the
/// valid transactions to the mempool.
pub struct TransactionVerificationService<C: ChainStateProvider, M: MempoolGateway> {
    chain: C,
    mempool: M,
    pool: Arc<WorkPool>,
    rejected: Arc<Mutex<RejectionCache>>,
    config: VerifierConfig,
}

impl<C: ChainStateProvider, M: MempoolGateway> TransactionVerificationService<C, M> {
    /// Create a new verification service.
    ///
    /// # Arguments
    /// * `chain` - Read access to chain state
    /// * `mempool` - Destination of verified transactions
    /// * `pool` - Work pool shared with the rest of the node
    /// * `config` - Cache sizing
    pub fn new(
        chain: C,
        mempool: M,
        pool: Arc<WorkPool>,
        config: VerifierConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            chain,
            mempool,
            pool,
            rejected: Arc::new(Mutex::new(RejectionCache::with_capacity(
                config.rejected_cache_capacity,
            ))),
            config,
        })
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Drop every remembered rejection.
    pub fn clear_rejection_cache(&self) {
        self.rejected.lock().clear();
    }

    /// Start a new rejected-cache generation.
    pub fn rotate_rejection_cache(&self) {
        self.rejected.lock().rotate();
    }

    fn reject_and_cache(&self, record: &mut TxRecord, rejection: TxRejection) {
        if let Some(hash) = record.hash {
            debug!(tx_hash = %short_hex(&hash), reason = %rejection, "Transaction rejected");
            self.rejected.lock().insert(hash);
        }
        record.reject(rejection);
    }

    // =========================================================================
    // STAGE 1: PARSE
    // =========================================================================

    fn parse_stage(&self, ctx: &TaskContext, records: &mut [TxRecord], hf_version: HardForkVersion) {
        let blobs: Vec<Arc<[u8]>> = records.iter().map(|r| Arc::clone(&r.blob)).collect();
        let rejected = Arc::clone(&self.rejected);
        let outcomes = self.pool.map_indexed(ctx, blobs, move |blob| {
            parse_blob(&blob, hf_version, &rejected)
        });

        for (index, (record, outcome)) in records.iter_mut().zip(outcomes).enumerate() {
            match outcome {
                Some(ParseOutcome::Parsed { tx, hash, weight }) => {
                    record.tx = Some(tx);
                    record.hash = Some(hash);
                    record.weight = weight;
                }
                Some(ParseOutcome::Rejected { hash, rejection }) => {
                    record.hash = hash;
                    record.reject(rejection);
                }
                None => {
                    error!(index, "Parse task did not complete");
                    record.reject(TxRejection::Aborted);
                }
            }
        }
    }

    // =========================================================================
    // STAGE 2: ALREADY KNOWN
    // =========================================================================

    fn known_stage(&self, records: &mut [TxRecord]) {
        let mut first_seen: HashMap<Hash, usize> = HashMap::with_capacity(records.len());
        for (index, record) in records.iter_mut().enumerate() {
            if !record.is_pending() {
                continue;
            }
            let Some(hash) = record.hash else { continue };
            if let Some(&first) = first_seen.get(&hash) {
                debug!(tx_hash = %short_hex(&hash), index, first, "Repeated blob in batch");
                record.state = RecordState::Repeat { first };
                continue;
            }
            first_seen.insert(hash, index);
            if self.mempool.is_transaction_known(&hash)
                || self.chain.is_transaction_in_chain(&hash)
            {
                debug!(tx_hash = %short_hex(&hash), "Transaction already known");
                record.state = RecordState::AlreadyKnown;
            }
        }
    }

    /// Give every in-batch repeat the final verdict of its first copy.
    fn resolve_repeats(&self, records: &mut [TxRecord]) {
        for index in 0..records.len() {
            let RecordState::Repeat { first } = records[index].state else {
                continue;
            };
            let resolved = match records.get(first).map(|r| &r.state) {
                Some(RecordState::Accepted) | Some(RecordState::AlreadyKnown) => {
                    RecordState::AlreadyKnown
                }
                Some(RecordState::Rejected(rejection)) => RecordState::Rejected(rejection.clone()),
                _ => {
                    error!(index, first, "Repeated blob without a settled first copy");
                    RecordState::Rejected(TxRejection::Aborted)
                }
            };
            records[index].state = resolved;
        }
    }

    // =========================================================================
    // STAGE 3: SEMANTICS
    // =========================================================================

    fn semantics_stage(&self, ctx: &TaskContext, records: &mut [TxRecord], sem: SemanticsContext) {
        let (indices, txs) = pending(records);
        let inputs: Vec<(Arc<Transaction>, u64)> = indices
            .iter()
            .zip(txs)
            .map(|(&index, tx)| (tx, records[index].weight))
            .collect();

        let outcomes = self.pool.map_indexed(ctx, inputs, move |(tx, weight)| {
            semantics::check(&tx, weight, &sem)
        });

        for (index, outcome) in indices.into_iter().zip(outcomes) {
            let record = &mut records[index];
            match outcome {
                Some(Ok(())) => {}
                Some(Err(failure)) if failure.is_cacheable() => {
                    self.reject_and_cache(record, failure.into());
                }
                Some(Err(failure)) => record.reject(failure.into()),
                None => {
                    error!(index, "Semantics task did not complete");
                    record.reject(TxRejection::Aborted);
                }
            }
        }

        self.spent_key_image_pass(records);
    }

    /// Key images spent on chain or held by the mempool. Not cached: the
    /// record may become valid once the holder leaves the mempool.
    fn spent_key_image_pass(&self, records: &mut [TxRecord]) {
        for record in records.iter_mut() {
            let Some(tx) = record.pending_tx().cloned() else { continue };
            let spent = tx.key_images().any(|key_image| {
                self.chain.is_key_image_spent(key_image) || self.mempool.has_key_image(key_image)
            });
            if spent {
                if let Some(hash) = &record.hash {
                    debug!(tx_hash = %short_hex(hash), "Key image already spent");
                }
                record.reject(SemanticsFailure::DuplicateKeyImage.into());
            }
        }
    }

    /// Earlier records win key-image conflicts among the records that passed
    /// signature verification. Not cached: the loser depends on the winner.
    fn claim_key_images(&self, records: &mut [TxRecord]) {
        let mut claimed: HashSet<KeyImage> = HashSet::new();
        for record in records.iter_mut() {
            if record.state != RecordState::Accepted {
                continue;
            }
            let Some(tx) = record.tx.clone() else { continue };
            if tx.key_images().any(|key_image| claimed.contains(key_image)) {
                if let Some(hash) = &record.hash {
                    debug!(tx_hash = %short_hex(hash), "Key image claimed earlier in batch");
                }
                record.reject(SemanticsFailure::DuplicateKeyImage.into());
            } else {
                claimed.extend(tx.key_images().copied());
            }
        }
    }

    // =========================================================================
    // STAGE 4: SIGNATURES
    // =========================================================================

    fn signature_stage(&self, ctx: &TaskContext, records: &mut [TxRecord]) {
        let (indices, txs) = pending(records);
        let batched_flags: Vec<bool> = txs.iter().map(|tx| tx.is_batched()).collect();
        let prepared = self
            .pool
            .map_indexed(ctx, txs, |tx| signatures::prepare(&tx));

        let mut batched: Vec<(usize, PreparedSignatures)> = Vec::new();
        let mut single: Vec<(usize, PreparedSignatures)> = Vec::new();
        for ((index, is_batched), outcome) in indices.into_iter().zip(batched_flags).zip(prepared) {
            match outcome {
                Some(Ok(p)) if is_batched => batched.push((index, p)),
                Some(Ok(p)) => single.push((index, p)),
                Some(Err(e)) => {
                    debug!(index, error = %e, "Unusable input signature");
                    self.reject_and_cache(&mut records[index], TxRejection::SignatureFailed);
                }
                None => {
                    error!(index, "Signature preparation did not complete");
                    records[index].reject(TxRejection::Aborted);
                }
            }
        }

        if !batched.is_empty() {
            let members: Vec<&PreparedSignatures> = batched.iter().map(|(_, p)| p).collect();
            if signatures::verify_batch(&members) {
                for (index, _) in &batched {
                    records[*index].state = RecordState::Accepted;
                }
            } else if batched.len() == 1 {
                let (index, _) = &batched[0];
                self.reject_and_cache(&mut records[*index], TxRejection::SignatureFailed);
            } else {
                warn!(
                    transactions = batched.len(),
                    "Batch signature verification failed, checking individually"
                );
                metrics::record_batch_fallback();
                single.extend(batched);
            }
        }

        if single.is_empty() {
            self.claim_key_images(records);
            return;
        }
        let (indices, prepared): (Vec<usize>, Vec<PreparedSignatures>) = single.into_iter().unzip();
        let verdicts = self
            .pool
            .map_indexed(ctx, prepared, |p| signatures::verify_each(&p));
        for (index, verdict) in indices.into_iter().zip(verdicts) {
            match verdict {
                Some(true) => records[index].state = RecordState::Accepted,
                Some(false) => {
                    self.reject_and_cache(&mut records[index], TxRejection::SignatureFailed)
                }
                None => {
                    error!(index, "Signature verification did not complete");
                    records[index].reject(TxRejection::Aborted);
                }
            }
        }
        self.claim_key_images(records);
    }

    // =========================================================================
    // STAGE 5: ADMISSION
    // =========================================================================

    fn admission_stage(&self, records: &mut [TxRecord], kept_by_block: bool) {
        for (index, record) in records.iter_mut().enumerate() {
            match record.state {
                RecordState::Accepted => {}
                RecordState::Pending => {
                    error!(index, "Record left pending after verification");
                    record.reject(TxRejection::Aborted);
                    continue;
                }
                _ => continue,
            }
            let (Some(tx), Some(hash)) = (&record.tx, &record.hash) else {
                error!(index, "Accepted record without a decoded transaction");
                record.reject(TxRejection::Aborted);
                continue;
            };
            if let Err(e) = self
                .mempool
                .admit(tx, hash, &record.blob, record.weight, kept_by_block)
            {
                warn!(tx_hash = %short_hex(hash), error = %e, "Mempool admission failed");
                record.reject(TxRejection::AdmissionFailed(e.to_string()));
            }
        }
    }
}

impl<C: ChainStateProvider, M: MempoolGateway> TransactionVerificationApi
    for TransactionVerificationService<C, M>
{
    #[instrument(skip(self, blobs), fields(blobs = blobs.len()))]
    fn verify_and_admit(&self, blobs: &[Vec<u8>], kept_by_block: bool) -> BatchVerdict {
        let ctx = TaskContext::root();
        let hf_version = self.chain.current_hard_fork_version();
        let sem = SemanticsContext::new(
            self.chain.current_block_weight_limit(),
            self.config.coinbase_reserved_size,
            kept_by_block,
        );

        let mut records: Vec<TxRecord> = blobs.iter().map(|blob| TxRecord::new(blob)).collect();

        self.parse_stage(&ctx, &mut records, hf_version);
        self.known_stage(&mut records);
        self.semantics_stage(&ctx, &mut records, sem);
        self.signature_stage(&ctx, &mut records);
        self.admission_stage(&mut records, kept_by_block);
        self.resolve_repeats(&mut records);

        let verdict = BatchVerdict::new(records.into_iter().map(TxRecord::into_result).collect());
        metrics::record_batch(&verdict);
        info!(
            hf_version,
            accepted = verdict.accepted_count(),
            total = verdict.results.len(),
            all_accepted = verdict.all_accepted,
            "Verified transaction batch"
        );
        verdict
    }

    fn is_rejected(&self, tx_hash: &Hash) -> bool {
        self.rejected.lock().contains(tx_hash)
    }

    fn rejection_cache_stats(&self) -> RejectionCacheStats {
        self.rejected.lock().stats()
    }
}
