//! # Input Signatures
//!
//! Each input carries an Ed25519 signature over its input message. Inputs of
//! batched-proof transactions are checked together with one multi-scalar
//! batch equation; a failing batch is re-checked signature by signature to
//! find the culprit.
//!
//! Batch and single verification must agree on every input. `verify_batch`
//! uses the cofactored equation and `verify_strict` the cofactorless one, so
//! keys and nonce points with a torsion component are rejected up front
//! while preparing, before either equation runs.

use curve25519_dalek::edwards::CompressedEdwardsY;
use ed25519_dalek::{Signature, VerifyingKey};
use shared_types::{Hash, PublicKey};
use thiserror::Error;

use super::codec::{input_message, prefix_hash, CodecError};
use super::entities::Transaction;

/// Why an input signature was refused before verification.
#[derive(Debug, Error)]
pub enum SignatureCheckError {
    #[error("Failed to hash transaction prefix: {0}")]
    Prefix(#[from] CodecError),

    #[error("Input {index}: public key is not a valid point")]
    InvalidKey { index: usize },

    #[error("Input {index}: public key has small order or a torsion component")]
    WeakKey { index: usize },

    #[error("Input {index}: nonce point is not in the prime-order subgroup")]
    InvalidNonce { index: usize },

    #[error("Input {index} has no key image")]
    MissingKeyImage { index: usize },
}

/// Decoded signatures of one transaction, ready for verification.
#[derive(Debug, Clone)]
pub struct PreparedSignatures {
    messages: Vec<Hash>,
    signatures: Vec<Signature>,
    keys: Vec<VerifyingKey>,
}

impl PreparedSignatures {
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

/// Decode keys and signatures and derive the per-input messages.
///
/// Expects a transaction that passed the semantics checks, so signature and
/// input counts match.
pub fn prepare(tx: &Transaction) -> Result<PreparedSignatures, SignatureCheckError> {
    let prefix = prefix_hash(tx)?;
    let count = tx.signatures.len();
    let mut prepared = PreparedSignatures {
        messages: Vec::with_capacity(count),
        signatures: Vec::with_capacity(count),
        keys: Vec::with_capacity(count),
    };

    for (index, (input, signed)) in tx.inputs.iter().zip(&tx.signatures).enumerate() {
        let key_image = input
            .key_image()
            .ok_or(SignatureCheckError::MissingKeyImage { index })?;
        prepared.keys.push(decode_key(&signed.public_key, index)?);
        prepared.signatures.push(decode_signature(&signed.signature, index)?);
        prepared.messages.push(input_message(&prefix, key_image));
    }
    Ok(prepared)
}

fn decode_key(bytes: &PublicKey, index: usize) -> Result<VerifyingKey, SignatureCheckError> {
    let point = CompressedEdwardsY(*bytes)
        .decompress()
        .ok_or(SignatureCheckError::InvalidKey { index })?;
    if point.is_small_order() || !point.is_torsion_free() {
        return Err(SignatureCheckError::WeakKey { index });
    }
    let key =
        VerifyingKey::from_bytes(bytes).map_err(|_| SignatureCheckError::InvalidKey { index })?;
    if key.is_weak() {
        return Err(SignatureCheckError::WeakKey { index });
    }
    Ok(key)
}

fn decode_signature(bytes: &[u8; 64], index: usize) -> Result<Signature, SignatureCheckError> {
    let mut nonce = [0u8; 32];
    nonce.copy_from_slice(&bytes[..32]);
    let point = CompressedEdwardsY(nonce)
        .decompress()
        .ok_or(SignatureCheckError::InvalidNonce { index })?;
    if point.is_small_order() || !point.is_torsion_free() {
        return Err(SignatureCheckError::InvalidNonce { index });
    }
    Ok(Signature::from_bytes(bytes))
}

/// Verify every signature of every transaction in one batch equation.
///
/// True for an empty batch.
pub fn verify_batch(batch: &[&PreparedSignatures]) -> bool {
    let total: usize = batch.iter().map(|p| p.len()).sum();
    if total == 0 {
        return true;
    }

    let mut messages: Vec<&[u8]> = Vec::with_capacity(total);
    let mut signatures = Vec::with_capacity(total);
    let mut keys = Vec::with_capacity(total);
    for prepared in batch {
        messages.extend(prepared.messages.iter().map(|m| m.as_slice()));
        signatures.extend_from_slice(&prepared.signatures);
        keys.extend_from_slice(&prepared.keys);
    }
    ed25519_dalek::verify_batch(&messages, &signatures, &keys).is_ok()
}

/// Verify the signatures of one transaction one at a time.
pub fn verify_each(prepared: &PreparedSignatures) -> bool {
    prepared
        .messages
        .iter()
        .zip(&prepared.signatures)
        .zip(&prepared.keys)
        .all(|((message, signature), key)| key.verify_strict(message, signature).is_ok())
}
