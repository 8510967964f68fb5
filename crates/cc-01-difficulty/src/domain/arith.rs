//! Portable wide arithmetic on 64-bit limbs.

use shared_types::{Difficulty, Hash};

/// Full 64x64 -> 128-bit product as `(low, high)`.
///
/// Built from 32-bit halves so the result does not depend on the host
/// having a native 128-bit multiply.
pub fn mul128(a: u64, b: u64) -> (u64, u64) {
    const MASK: u64 = 0xffff_ffff;

    let (a_lo, a_hi) = (a & MASK, a >> 32);
    let (b_lo, b_hi) = (b & MASK, b >> 32);

    let lo_lo = a_lo * b_lo;
    let hi_lo = a_hi * b_lo;
    let lo_hi = a_lo * b_hi;
    let hi_hi = a_hi * b_hi;

    // Cannot overflow: at most (2^32 - 1) * 2 + (2^32 - 1)^2 = 2^64 - 1.
    let cross = (lo_lo >> 32) + (hi_lo & MASK) + lo_hi;

    let high = (hi_lo >> 32) + (cross >> 32) + hi_hi;
    let low = (cross << 32) | (lo_lo & MASK);
    (low, high)
}

fn carry_add(a: u64, b: u64) -> bool {
    a.overflowing_add(b).1
}

fn carry_add_with(a: u64, b: u64, carry: bool) -> bool {
    let (sum, overflow) = a.overflowing_add(b);
    overflow || (carry && sum == u64::MAX)
}

/// Whether `hash * difficulty < 2^256`.
///
/// The hash is read as a 256-bit little-endian integer of four limbs; the
/// 320-bit product is assembled limb by limb with explicit carries and the
/// check passes iff its top 64 bits are zero.
pub fn check_hash_meets_difficulty(hash: &Hash, difficulty: Difficulty) -> bool {
    let mut limbs = [0u64; 4];
    for (limb, chunk) in limbs.iter_mut().zip(hash.chunks_exact(8)) {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(chunk);
        *limb = u64::from_le_bytes(bytes);
    }

    // The top limb decides almost every random hash.
    let (top, high) = mul128(limbs[3], difficulty);
    if high != 0 {
        return false;
    }

    let (_, mut cur) = mul128(limbs[0], difficulty);
    let (low, high) = mul128(limbs[1], difficulty);
    let mut carry = carry_add(cur, low);
    cur = high;
    let (low, high) = mul128(limbs[2], difficulty);
    carry = carry_add_with(cur, low, carry);
    carry = carry_add_with(high, top, carry);
    !carry
}
