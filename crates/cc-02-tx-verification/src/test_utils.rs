//! # Test Utilities
//!
//! Signed transaction fixtures and in-memory implementations of the outbound
//! ports. Available to this crate's tests and, through the `test-utils`
//! feature, to the workspace test suite.
//!
//! Keys are derived from a seed, so every fixture is reproducible.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use ed25519_dalek::{Signer, SigningKey};
use parking_lot::Mutex;
use shared_types::{keccak256, HardForkVersion, Hash, KeyImage};

use crate::domain::codec;
use crate::domain::entities::{InputSignature, ProofKind, Transaction, TxInput, TxOutput, TxType};
use crate::ports::outbound::{AdmissionError, ChainStateProvider, MempoolGateway};

fn derive(seed: u64, label: &str, index: usize) -> Hash {
    let mut data = Vec::with_capacity(16 + label.len());
    data.extend_from_slice(&seed.to_le_bytes());
    data.extend_from_slice(label.as_bytes());
    data.extend_from_slice(&(index as u64).to_le_bytes());
    keccak256(&data)
}

fn derive_point(seed: u64, label: &str, index: usize) -> [u8; 32] {
    let scalar = Scalar::from_bytes_mod_order(derive(seed, label, index));
    EdwardsPoint::mul_base(&scalar).compress().to_bytes()
}

// =============================================================================
// TRANSACTION BUILDER
// =============================================================================

/// A signed transaction together with its wire form.
#[derive(Debug, Clone)]
pub struct TxFixture {
    pub tx: Transaction,
    pub blob: Vec<u8>,
    pub hash: Hash,
    pub key_images: Vec<KeyImage>,
}

/// Builds valid, signed transactions; individual parts can be broken on
/// purpose.
///
/// Defaults: a `Standard` transfer with one input, two outputs and a batched
/// proof.
#[derive(Debug, Clone)]
pub struct TxBuilder {
    seed: u64,
    tx_type: TxType,
    inputs: usize,
    outputs: usize,
    ring: Vec<u64>,
    legacy: Option<(u64, u64)>,
    key_images: HashMap<usize, KeyImage>,
    tampered: HashSet<usize>,
    extra: Vec<u8>,
}

impl TxBuilder {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            tx_type: TxType::Standard,
            inputs: 1,
            outputs: 2,
            ring: vec![7, 3, 11],
            legacy: None,
            key_images: HashMap::new(),
            tampered: HashSet::new(),
            extra: Vec::new(),
        }
    }

    pub fn with_inputs(mut self, inputs: usize) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_outputs(mut self, outputs: usize) -> Self {
        self.outputs = outputs;
        self
    }

    /// Relative ring offsets used by every input.
    pub fn with_ring(mut self, offsets: Vec<u64>) -> Self {
        self.ring = offsets;
        self
    }

    /// Cleartext amounts: `input_total` split over the inputs, `output_total`
    /// over the outputs.
    pub fn legacy(mut self, input_total: u64, output_total: u64) -> Self {
        self.legacy = Some((input_total, output_total));
        self
    }

    /// Spend `key_image` in input `index` instead of the derived one.
    pub fn with_key_image(mut self, index: usize, key_image: KeyImage) -> Self {
        self.key_images.insert(index, key_image);
        self
    }

    /// Corrupt the signature of input `index` after signing.
    pub fn tamper_signature(mut self, index: usize) -> Self {
        self.tampered.insert(index);
        self
    }

    pub fn with_extra(mut self, extra: Vec<u8>) -> Self {
        self.extra = extra;
        self
    }

    /// A `KeyImageUnlock` transaction: no inputs, no outputs.
    pub fn non_transfer(mut self) -> Self {
        self.tx_type = TxType::KeyImageUnlock;
        self.inputs = 0;
        self.outputs = 0;
        self
    }

    pub fn tx_type(mut self, tx_type: TxType) -> Self {
        self.tx_type = tx_type;
        self
    }

    pub fn signing_key(&self, index: usize) -> SigningKey {
        SigningKey::from_bytes(&derive(self.seed, "spend", index))
    }

    fn split(total: u64, parts: usize) -> Vec<u64> {
        if parts == 0 {
            return Vec::new();
        }
        let share = total / parts as u64;
        let mut amounts = vec![share; parts];
        amounts[0] += total - share * parts as u64;
        amounts
    }

    pub fn build(self) -> TxFixture {
        let input_amounts = match self.legacy {
            Some((total, _)) => Self::split(total, self.inputs),
            None => vec![0; self.inputs],
        };
        let output_amounts = match self.legacy {
            Some((_, total)) => Self::split(total, self.outputs),
            None => vec![0; self.outputs],
        };

        let key_images: Vec<KeyImage> = (0..self.inputs)
            .map(|i| {
                self.key_images
                    .get(&i)
                    .copied()
                    .unwrap_or_else(|| derive_point(self.seed, "key-image", i))
            })
            .collect();

        let inputs = key_images
            .iter()
            .zip(&input_amounts)
            .map(|(key_image, amount)| TxInput::ToKey {
                amount: *amount,
                key_offsets: self.ring.clone(),
                key_image: *key_image,
            })
            .collect();
        let outputs = output_amounts
            .iter()
            .enumerate()
            .map(|(j, amount)| TxOutput {
                amount: *amount,
                key: derive_point(self.seed, "output", j),
            })
            .collect();
        let proof = match self.legacy {
            Some(_) => ProofKind::Legacy,
            None => ProofKind::Batched {
                fee: 1_000,
                commitments: (0..self.outputs)
                    .map(|j| derive(self.seed, "commitment", j))
                    .collect(),
            },
        };

        let mut tx = Transaction {
            version: 2,
            tx_type: self.tx_type,
            unlock_time: 0,
            inputs,
            outputs,
            extra: self.extra.clone(),
            proof,
            signatures: Vec::new(),
        };

        let prefix = codec::prefix_hash(&tx).expect("prefix encodes");
        tx.signatures = key_images
            .iter()
            .enumerate()
            .map(|(i, key_image)| {
                let key = self.signing_key(i);
                let message = codec::input_message(&prefix, key_image);
                let mut signature = key.sign(&message).to_bytes();
                if self.tampered.contains(&i) {
                    signature[32] ^= 0x01;
                }
                InputSignature {
                    public_key: key.verifying_key().to_bytes(),
                    signature,
                }
            })
            .collect();

        let blob = codec::encode(&tx).expect("transaction encodes");
        let hash = codec::tx_hash(&blob);
        TxFixture {
            tx,
            blob,
            hash,
            key_images,
        }
    }
}

// =============================================================================
// IN-MEMORY CHAIN
// =============================================================================

/// Chain state held in memory. Counts reads of the consensus parameters.
#[derive(Debug)]
pub struct InMemoryChain {
    hard_fork_version: Mutex<HardForkVersion>,
    block_weight_limit: Mutex<u64>,
    transactions: Mutex<HashSet<Hash>>,
    spent_key_images: Mutex<HashSet<KeyImage>>,
    hard_fork_reads: AtomicUsize,
    weight_limit_reads: AtomicUsize,
}

impl Default for InMemoryChain {
    fn default() -> Self {
        Self {
            hard_fork_version: Mutex::new(16),
            block_weight_limit: Mutex::new(300_000),
            transactions: Mutex::new(HashSet::new()),
            spent_key_images: Mutex::new(HashSet::new()),
            hard_fork_reads: AtomicUsize::new(0),
            weight_limit_reads: AtomicUsize::new(0),
        }
    }
}

impl InMemoryChain {
    pub fn set_hard_fork_version(&self, version: HardForkVersion) {
        *self.hard_fork_version.lock() = version;
    }

    pub fn set_block_weight_limit(&self, limit: u64) {
        *self.block_weight_limit.lock() = limit;
    }

    pub fn add_transaction(&self, tx_hash: Hash) {
        self.transactions.lock().insert(tx_hash);
    }

    pub fn spend_key_image(&self, key_image: KeyImage) {
        self.spent_key_images.lock().insert(key_image);
    }

    pub fn hard_fork_reads(&self) -> usize {
        self.hard_fork_reads.load(Ordering::SeqCst)
    }

    pub fn weight_limit_reads(&self) -> usize {
        self.weight_limit_reads.load(Ordering::SeqCst)
    }
}

impl ChainStateProvider for InMemoryChain {
    fn current_hard_fork_version(&self) -> HardForkVersion {
        self.hard_fork_reads.fetch_add(1, Ordering::SeqCst);
        *self.hard_fork_version.lock()
    }

    fn current_block_weight_limit(&self) -> u64 {
        self.weight_limit_reads.fetch_add(1, Ordering::SeqCst);
        *self.block_weight_limit.lock()
    }

    fn is_transaction_in_chain(&self, tx_hash: &Hash) -> bool {
        self.transactions.lock().contains(tx_hash)
    }

    fn is_key_image_spent(&self, key_image: &KeyImage) -> bool {
        self.spent_key_images.lock().contains(key_image)
    }
}

// =============================================================================
// IN-MEMORY MEMPOOL
// =============================================================================

/// A transaction accepted by [`InMemoryMempool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmittedTx {
    pub hash: Hash,
    pub weight: u64,
    pub kept_by_block: bool,
    pub blob: Vec<u8>,
}

/// Mempool held in memory. Admitted transactions become known and their key
/// images become held.
#[derive(Debug, Default)]
pub struct InMemoryMempool {
    admitted: Mutex<Vec<AdmittedTx>>,
    known: Mutex<HashSet<Hash>>,
    key_images: Mutex<HashSet<KeyImage>>,
    refusals: Mutex<HashMap<Hash, AdmissionError>>,
}

impl InMemoryMempool {
    /// Refuse the next admission of `tx_hash` with `error`.
    pub fn refuse(&self, tx_hash: Hash, error: AdmissionError) {
        self.refusals.lock().insert(tx_hash, error);
    }

    /// Pretend a pooled transaction spends `key_image`.
    pub fn hold_key_image(&self, key_image: KeyImage) {
        self.key_images.lock().insert(key_image);
    }

    pub fn admitted(&self) -> Vec<AdmittedTx> {
        self.admitted.lock().clone()
    }

    pub fn admitted_hashes(&self) -> Vec<Hash> {
        self.admitted.lock().iter().map(|tx| tx.hash).collect()
    }
}

impl MempoolGateway for InMemoryMempool {
    fn is_transaction_known(&self, tx_hash: &Hash) -> bool {
        self.known.lock().contains(tx_hash)
    }

    fn has_key_image(&self, key_image: &KeyImage) -> bool {
        self.key_images.lock().contains(key_image)
    }

    fn admit(
        &self,
        tx: &Transaction,
        tx_hash: &Hash,
        blob: &[u8],
        weight: u64,
        kept_by_block: bool,
    ) -> Result<(), AdmissionError> {
        if let Some(error) = self.refusals.lock().remove(tx_hash) {
            return Err(error);
        }
        self.known.lock().insert(*tx_hash);
        self.key_images.lock().extend(tx.key_images().copied());
        self.admitted.lock().push(AdmittedTx {
            hash: *tx_hash,
            weight,
            kept_by_block,
            blob: blob.to_vec(),
        });
        Ok(())
    }
}

