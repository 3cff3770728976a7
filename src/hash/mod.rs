/*
 *
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Keyed hashing of keys into 256-bit signatures.

A [static function](crate::func::Csf) never stores its keys: everything it
knows about a key is a 256-bit signature (four 64-bit words) computed by a
[`CsfHasher`] with the global seed of the function, and a second signature
derived from the first one using the seed of the chunk the key falls in.

Both operations must be bit-for-bit identical to those used by the encoder
that built the function, so a function is always queried with the same
hasher it was built with. The production hasher is [`SpookyHasher`]; tests
can plug in any deterministic implementation.

*/

pub mod spooky;

use mem_dbg::*;
use spooky::{spooky_short, spooky_short_rehash};

/// A seeded hash function returning 256-bit signatures.
///
/// Implementations must be deterministic: the same key (or signature) and
/// seed must always yield the same result.
pub trait CsfHasher {
    /// Hashes a key with the given seed.
    fn hash(&self, key: &[u8], seed: u64) -> [u64; 4];

    /// Derives a new signature from an existing one and a new seed.
    ///
    /// This is used once per query to fold the seed of a chunk into the
    /// signature of a key, and it is expected to be faster than hashing the
    /// key again.
    fn rehash(&self, sig: &[u64; 4], seed: u64) -> [u64; 4];

    /// Hashes a 64-bit key with the given seed.
    ///
    /// The key is hashed as its little-endian byte representation. The
    /// default implementation just calls [`hash`](CsfHasher::hash) on a
    /// stack buffer.
    #[inline(always)]
    fn hash_u64(&self, key: u64, seed: u64) -> [u64; 4] {
        self.hash(&key.to_le_bytes(), seed)
    }
}

impl<H: CsfHasher + ?Sized> CsfHasher for &H {
    #[inline(always)]
    fn hash(&self, key: &[u8], seed: u64) -> [u64; 4] {
        (**self).hash(key, seed)
    }

    #[inline(always)]
    fn rehash(&self, sig: &[u64; 4], seed: u64) -> [u64; 4] {
        (**self).rehash(sig, seed)
    }

    #[inline(always)]
    fn hash_u64(&self, key: u64, seed: u64) -> [u64; 4] {
        (**self).hash_u64(key, seed)
    }
}

/// The hasher used by stored functions: [SpookyHash::Short
/// V2](spooky) for keys, and a single SpookyHash mixing round for
/// rehashing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, MemDbg, MemSize)]
pub struct SpookyHasher;

impl CsfHasher for SpookyHasher {
    #[inline(always)]
    fn hash(&self, key: &[u8], seed: u64) -> [u64; 4] {
        spooky_short(key, seed)
    }

    #[inline(always)]
    fn rehash(&self, sig: &[u64; 4], seed: u64) -> [u64; 4] {
        spooky_short_rehash(sig, seed)
    }
}
