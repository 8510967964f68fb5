//! # Context-Free Semantics
//!
//! Checks that depend only on the transaction itself and the block weight
//! limit read at the start of the run. They are safe to run in parallel.
//! Key images claimed by other transactions are checked separately, in
//! input order, by the service.

use std::collections::HashSet;

use curve25519_dalek::edwards::CompressedEdwardsY;
use curve25519_dalek::traits::IsIdentity;
use shared_types::KeyImage;

use super::entities::{ProofKind, Transaction, TxInput};
use super::errors::SemanticsFailure;

/// Block weight kept free for the miner transaction.
pub const COINBASE_BLOB_RESERVED_SIZE: u64 = 600;

/// Limits shared by every transaction of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemanticsContext {
    /// Largest weight a single transaction may have.
    pub weight_limit: u64,
    /// Transactions taken from a block skip the weight cap.
    pub kept_by_block: bool,
}

impl SemanticsContext {
    pub fn new(block_weight_limit: u64, reserved: u64, kept_by_block: bool) -> Self {
        Self {
            weight_limit: tx_weight_limit(block_weight_limit, reserved),
            kept_by_block,
        }
    }
}

/// Half the block weight limit minus the miner transaction reserve.
pub fn tx_weight_limit(block_weight_limit: u64, reserved: u64) -> u64 {
    (block_weight_limit / 2).saturating_sub(reserved)
}

/// Run every context-free check, stopping at the first failure.
pub fn check(tx: &Transaction, weight: u64, ctx: &SemanticsContext) -> Result<(), SemanticsFailure> {
    check_input_count(tx)?;
    check_input_types(tx)?;
    check_outputs(tx)?;
    check_counts(tx)?;
    check_money(tx)?;
    if !ctx.kept_by_block && weight > ctx.weight_limit {
        return Err(SemanticsFailure::TooLargeForBlock);
    }
    check_unique_key_images(tx)?;
    check_ring_offsets(tx)?;
    for key_image in tx.key_images() {
        if !key_image_in_domain(key_image) {
            return Err(SemanticsFailure::InvalidKeyImageDomain);
        }
    }
    Ok(())
}

fn check_input_count(tx: &Transaction) -> Result<(), SemanticsFailure> {
    if tx.tx_type.is_transfer() == tx.inputs.is_empty() {
        return Err(SemanticsFailure::EmptyInputs);
    }
    Ok(())
}

fn check_input_types(tx: &Transaction) -> Result<(), SemanticsFailure> {
    for input in &tx.inputs {
        match input {
            TxInput::ToKey { key_offsets, .. } if !key_offsets.is_empty() => {}
            _ => return Err(SemanticsFailure::UnsupportedInputType),
        }
    }
    Ok(())
}

fn check_outputs(tx: &Transaction) -> Result<(), SemanticsFailure> {
    if tx.tx_type.is_transfer() && tx.outputs.is_empty() {
        return Err(SemanticsFailure::InvalidOutputs);
    }
    let hidden_amounts = tx.is_batched();
    for output in &tx.outputs {
        if (output.amount == 0) != hidden_amounts {
            return Err(SemanticsFailure::InvalidOutputs);
        }
        if CompressedEdwardsY(output.key).decompress().is_none() {
            return Err(SemanticsFailure::InvalidOutputs);
        }
    }
    Ok(())
}

fn check_counts(tx: &Transaction) -> Result<(), SemanticsFailure> {
    if tx.signatures.len() != tx.inputs.len() {
        return Err(SemanticsFailure::OutputCountMismatch);
    }
    if let ProofKind::Batched { commitments, .. } = &tx.proof {
        if commitments.len() != tx.outputs.len() {
            return Err(SemanticsFailure::OutputCountMismatch);
        }
    }
    Ok(())
}

fn check_money(tx: &Transaction) -> Result<(), SemanticsFailure> {
    if tx.is_batched() {
        return Ok(());
    }
    let mut inputs: u64 = 0;
    for input in &tx.inputs {
        if let TxInput::ToKey { amount, .. } = input {
            inputs = inputs
                .checked_add(*amount)
                .ok_or(SemanticsFailure::MoneyOverflow)?;
        }
    }
    let mut outputs: u64 = 0;
    for output in &tx.outputs {
        outputs = outputs
            .checked_add(output.amount)
            .ok_or(SemanticsFailure::MoneyOverflow)?;
    }
    if outputs > inputs {
        return Err(SemanticsFailure::MoneyOverflow);
    }
    Ok(())
}

fn check_unique_key_images(tx: &Transaction) -> Result<(), SemanticsFailure> {
    let mut seen = HashSet::with_capacity(tx.inputs.len());
    if tx.key_images().all(|ki| seen.insert(*ki)) {
        Ok(())
    } else {
        Err(SemanticsFailure::DuplicateKeyImage)
    }
}

fn check_ring_offsets(tx: &Transaction) -> Result<(), SemanticsFailure> {
    for input in &tx.inputs {
        if let TxInput::ToKey { key_offsets, .. } = input {
            if key_offsets.iter().skip(1).any(|&offset| offset == 0) {
                return Err(SemanticsFailure::DuplicateRingMember);
            }
        }
    }
    Ok(())
}

/// A key image must be a torsion-free curve point other than the identity.
pub fn key_image_in_domain(key_image: &KeyImage) -> bool {
    match CompressedEdwardsY(*key_image).decompress() {
        Some(point) => !point.is_identity() && point.is_torsion_free(),
        None => false,
    }
}
