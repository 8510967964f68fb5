//! # Wire Codec
//!
//! Transactions travel as bincode blobs: fixed-width little-endian integers,
//! length-prefixed sequences, and no trailing bytes. The transaction id is
//! the Keccak-256 of the whole blob; input signatures commit to the Keccak
//! of the prefix (every field except the signatures) and the input's key
//! image.

use bincode::Options;
use serde::Serialize;
use shared_types::{keccak256, HardForkVersion, Hash, KeyImage};
use thiserror::Error;

use super::entities::{ProofKind, Transaction, TxInput, TxOutput, TxType};

/// Largest accepted blob up to and including hard fork 9.
pub const MAX_TX_SIZE_LEGACY: usize = 1_000_000;

/// Largest accepted blob from hard fork 10 on.
pub const MAX_TX_SIZE: usize = 100_000;

/// Per-output base size used to price batched output proofs.
const BP_BASE: u64 = 368;

/// Codec errors
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Malformed transaction blob: {0}")]
    Malformed(#[from] bincode::Error),
}

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
}

/// Size limit for blobs under `version`.
pub fn max_tx_size(version: HardForkVersion) -> usize {
    if version < 10 {
        MAX_TX_SIZE_LEGACY
    } else {
        MAX_TX_SIZE
    }
}

/// Decode a blob. Reads never go past the end of `blob`.
pub fn decode(blob: &[u8]) -> Result<Transaction, CodecError> {
    Ok(options()
        .with_limit(blob.len() as u64)
        .deserialize(blob)?)
}

/// Encode a transaction into its wire form.
pub fn encode(tx: &Transaction) -> Result<Vec<u8>, CodecError> {
    Ok(options().serialize(tx)?)
}

/// Transaction id.
pub fn tx_hash(blob: &[u8]) -> Hash {
    keccak256(blob)
}

#[derive(Serialize)]
struct Prefix<'a> {
    version: u16,
    tx_type: TxType,
    unlock_time: u64,
    inputs: &'a [TxInput],
    outputs: &'a [TxOutput],
    extra: &'a [u8],
    proof: &'a ProofKind,
}

/// Keccak-256 of the encoded prefix.
pub fn prefix_hash(tx: &Transaction) -> Result<Hash, CodecError> {
    let prefix = Prefix {
        version: tx.version,
        tx_type: tx.tx_type,
        unlock_time: tx.unlock_time,
        inputs: &tx.inputs,
        outputs: &tx.outputs,
        extra: &tx.extra,
        proof: &tx.proof,
    };
    Ok(keccak256(&options().serialize(&prefix)?))
}

/// Message signed by the input spending `key_image`.
pub fn input_message(prefix_hash: &Hash, key_image: &KeyImage) -> Hash {
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(prefix_hash);
    data[32..].copy_from_slice(key_image);
    keccak256(&data)
}

/// Weight of a transaction: its blob size, plus a clawback for batched
/// proofs over more than two outputs.
///
/// A batched proof grows logarithmically with the output count, so weighing
/// by size alone would underprice many-output transactions. The clawback
/// charges 80% of the difference to what per-output proofs would cost.
pub fn tx_weight(tx: &Transaction, blob_len: usize) -> u64 {
    let size = blob_len as u64;
    if !tx.is_batched() || tx.outputs.len() <= 2 {
        return size;
    }
    size.saturating_add(proof_clawback(tx.outputs.len()))
}

fn proof_clawback(outputs: usize) -> u64 {
    let padded = outputs.next_power_of_two() as u64;
    let nlr = u64::from(padded.trailing_zeros()) + 6;
    let proof_size = 32 * (9 + 2 * nlr);
    (BP_BASE * padded).saturating_sub(proof_size) * 4 / 5
}
