/*
 *
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Chunks and equations.

The variables of a function are partitioned into chunks. The first word of
the signature of a key selects a chunk by fixed-point range reduction; the
signature is then rehashed with the seed of the chunk, and the resulting
words select the variables of the chunk whose fields are XOR'd to obtain
the codeword of the key.

Each chunk is described by a word of the chunk table: the lower
[`OFFSET_BITS`] bits contain the bit offset of the chunk in the packed array,
and the upper [`SEED_BITS`] bits contain the seed of the chunk. The seed is
used as it is, without shifting it down.

*/

use crate::hash::CsfHasher;

/// The number of upper bits of a chunk-table entry holding the chunk seed.
pub const SEED_BITS: u32 = 10;
/// The number of lower bits of a chunk-table entry holding the chunk offset.
pub const OFFSET_BITS: u32 = 64 - SEED_BITS;
/// Mask extracting the offset from a chunk-table entry.
pub const OFFSET_MASK: u64 = u64::MAX >> SEED_BITS;
/// Mask extracting the (unshifted) seed from a chunk-table entry.
pub const SEED_MASK: u64 = !OFFSET_MASK;

/// Returns the bit offset stored in a chunk-table entry.
#[inline(always)]
pub const fn chunk_offset(offset_seed: u64) -> u64 {
    offset_seed & OFFSET_MASK
}

/// Returns the seed stored in a chunk-table entry, still in the upper bits.
#[inline(always)]
pub const fn chunk_seed(offset_seed: u64) -> u64 {
    offset_seed & SEED_MASK
}

/// Maps the first word of a signature to a chunk.
///
/// The lower 63 bits of `h0 >> 1` are multiplied by `multiplier` and the
/// upper 64 bits of the 128-bit product are returned. The encoder chooses
/// `multiplier` so that the result spans exactly the available chunks.
#[inline(always)]
pub const fn chunk_index(h0: u64, multiplier: u64) -> u64 {
    (((h0 >> 1) as u128 * multiplier as u128) >> 64) as u64
}

/// Returns the largest chunk index [`chunk_index`] can produce with the
/// given multiplier.
#[inline]
pub const fn max_chunk_index(multiplier: u64) -> u64 {
    chunk_index(u64::MAX, multiplier)
}

/// Returns the `K` variables of a chunk with `num_variables` variables
/// associated with a signature.
///
/// The signature is rehashed with the seed of the chunk, and the lower `s`
/// bits of the first `K` words of the result, where `s` is the number of
/// leading zeros of `num_variables`, are scaled to `[0..num_variables)`.
/// Since the scaled value is smaller than 2<sup>`s`</sup> and `num_variables`
/// is smaller than 2<sup>64 − `s`</sup>, the product never overflows.
///
/// If the chunk has no variables, all positions are zero.
#[inline(always)]
pub fn equation<H: CsfHasher + ?Sized, const K: usize>(
    hasher: &H,
    sig: &[u64; 4],
    seed: u64,
    num_variables: u64,
) -> [u64; K] {
    const { assert!(K >= 1 && K <= 4, "equations have between one and four variables") };
    if num_variables == 0 {
        return [0; K];
    }
    let hash = hasher.rehash(sig, seed);
    let shift = num_variables.leading_zeros();
    let mask = (1_u64 << shift) - 1;
    std::array::from_fn(|i| ((hash[i] & mask) * num_variables) >> shift)
}
