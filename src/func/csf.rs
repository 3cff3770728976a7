/*
 *
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::chunk::*;
use super::decoder::CanonicalDecoder;
use super::error::FormatError;
use crate::bits::get_field_unchecked;
use crate::hash::{CsfHasher, SpookyHasher};
use mem_dbg::*;

/// The tables of a compressed static function, as they are stored.
///
/// This is the input of [`Csf::from_parts`], and it is what
/// [`Csf::into_parts`] returns. No consistency check is performed until the
/// parts are turned into a [`Csf`].
#[derive(Debug, Clone, Default, PartialEq, Eq, MemDbg, MemSize)]
pub struct CsfParts {
    /// The number of chunks.
    pub chunk_count: u64,
    /// The multiplier mapping signatures to chunks.
    pub multiplier: u64,
    /// The bit width of codewords, and thus of variables.
    pub codeword_width: u64,
    /// The seed used to hash keys.
    pub global_seed: u64,
    /// For each chunk, its offset and its seed; a last entry contains the end
    /// offset of the last chunk.
    pub offset_and_seed: Vec<u64>,
    /// The packed variables.
    pub data: Vec<u64>,
    /// Reserved escape parameter; stored but not used by queries.
    pub escaped_symbol_length: u64,
    /// Reserved escape parameter; stored but not used by queries.
    pub escape_length: u64,
    /// For each decoding block, the first value it does not decode.
    pub thresholds: Vec<u64>,
    /// For each decoding block, the number of symbols of the block and of
    /// the previous blocks.
    pub cumulative_counts: Vec<u32>,
    /// For each decoding block, the number of low bits to discard.
    pub shifts: Vec<u8>,
    /// The symbols, in codeword order.
    pub symbols: Vec<u64>,
}

/// A compressed static function.
///
/// A compressed static function maps each key of a fixed set to a value
/// using space close to the empirical entropy of the values: keys are not
/// stored, and values are stored using a canonical code. On keys outside the
/// original set, the function returns an arbitrary value.
///
/// A key is hashed with the global seed, the first word of its signature
/// [selects a chunk](chunk_index), and the signature rehashed with the seed
/// of the chunk [selects three or four variables](equation) of the chunk. The XOR of the
/// variables, which are fields of [`codeword_width`](Csf::codeword_width)
/// bits, is a codeword that is finally decoded by a [`CanonicalDecoder`].
///
/// The number of variables per key is given by the [`Degree`] of the
/// function, which is three unless set otherwise with
/// [`with_degree`](Csf::with_degree). It must match the encoder, as must the
/// hasher `H`.
///
/// Instances are immutable, and they are validated when they are built
/// (by [`from_parts`](Csf::from_parts) or by [loading](Csf::load) them), so
/// queries never fail and never read outside of the tables. They can be
/// shared freely between threads.
#[derive(Debug, Clone, MemDbg, MemSize)]
pub struct Csf<H = SpookyHasher> {
    degree: Degree,
    multiplier: u64,
    width: usize,
    global_seed: u64,
    offset_and_seed: Box<[u64]>,
    data: Box<[u64]>,
    escaped_symbol_length: u64,
    escape_length: u64,
    decoder: CanonicalDecoder,
    hasher: H,
}

/// The number of variables XOR'd to obtain the codeword of a key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, MemDbg, MemSize)]
pub enum Degree {
    /// Three variables, from the first three words of the rehashed signature.
    #[default]
    Three,
    /// Four variables, from all the words of the rehashed signature.
    Four,
}

impl<H: CsfHasher> Csf<H> {
    /// Builds a function from its tables, checking their consistency.
    ///
    /// The following properties are checked:
    /// - the chunk table has one entry more than the number of chunks;
    /// - the multiplier maps every signature to an existing chunk;
    /// - the codeword width is at most 64;
    /// - consecutive chunk offsets differ by at least the codeword width;
    /// - the last chunk ends within the packed array;
    /// - every codeword decodes to a symbol (see [`CanonicalDecoder::new`]).
    pub fn from_parts(parts: CsfParts, hasher: H) -> Result<Self, FormatError> {
        let CsfParts {
            chunk_count,
            multiplier,
            codeword_width,
            global_seed,
            offset_and_seed,
            data,
            escaped_symbol_length,
            escape_length,
            thresholds,
            cumulative_counts,
            shifts,
            symbols,
        } = parts;

        let expected = chunk_count.checked_add(1).ok_or(FormatError::LengthOverflow(chunk_count))?;
        if offset_and_seed.len() as u64 != expected {
            return Err(FormatError::ChunkTableLength {
                chunk_count,
                expected,
                found: offset_and_seed.len() as u64,
            });
        }

        let max_chunk = max_chunk_index(multiplier);
        if max_chunk >= chunk_count {
            return Err(FormatError::RangeMultiplier {
                multiplier,
                chunk_count,
                max_chunk,
            });
        }

        if codeword_width > 64 {
            return Err(FormatError::CodewordWidth(codeword_width));
        }

        for (chunk, window) in offset_and_seed.windows(2).enumerate() {
            let offset = chunk_offset(window[0]);
            let next_offset = chunk_offset(window[1]);
            if next_offset < offset || next_offset - offset < codeword_width {
                return Err(FormatError::NegativeVariables {
                    chunk,
                    offset,
                    next_offset,
                    width: codeword_width,
                });
            }
        }

        // The chunk table is not empty, as it has chunk_count + 1 entries
        let required = chunk_offset(offset_and_seed[offset_and_seed.len() - 1]);
        let available = (data.len() as u64).saturating_mul(64);
        if required > available {
            return Err(FormatError::ArrayTooShort {
                required,
                available,
            });
        }
        // Bit positions are computed with usize arithmetic
        usize::try_from(required).map_err(|_| FormatError::LengthOverflow(required))?;

        let decoder =
            CanonicalDecoder::new(thresholds, cumulative_counts, shifts, symbols, codeword_width)?;

        Ok(Self {
            degree: Degree::Three,
            multiplier,
            width: codeword_width as usize,
            global_seed,
            offset_and_seed: offset_and_seed.into_boxed_slice(),
            data: data.into_boxed_slice(),
            escaped_symbol_length,
            escape_length,
            decoder,
            hasher,
        })
    }

    /// Returns the value associated with the given signature, or an arbitrary
    /// value if the signature is not the signature of a key.
    ///
    /// The signature must have been computed with the
    /// [global seed](Csf::global_seed) of this function. The user should not
    /// normally call this method, but rather [`lookup_bytes`](Csf::lookup_bytes)
    /// or [`lookup_u64`](Csf::lookup_u64).
    #[inline(always)]
    pub fn get_by_sig(&self, sig: &[u64; 4]) -> u64 {
        if self.width == 0 {
            return self.decoder.decode(0);
        }
        let chunk = chunk_index(sig[0], self.multiplier) as usize;
        // SAFETY: from_parts checked that the multiplier maps into
        // [0..chunk_count), and the chunk table has chunk_count + 1 entries.
        let (offset_seed, next_offset_seed) = unsafe {
            (
                *self.offset_and_seed.get_unchecked(chunk),
                *self.offset_and_seed.get_unchecked(chunk + 1),
            )
        };
        let offset = chunk_offset(offset_seed);
        let num_variables = chunk_offset(next_offset_seed) - offset - self.width as u64;
        let seed = chunk_seed(offset_seed);
        let value = match self.degree {
            Degree::Three => {
                self.xor_fields(offset, equation::<_, 3>(&self.hasher, sig, seed, num_variables))
            }
            Degree::Four => {
                self.xor_fields(offset, equation::<_, 4>(&self.hasher, sig, seed, num_variables))
            }
        };
        self.decoder.decode(value)
    }

    #[inline(always)]
    fn xor_fields<const K: usize>(&self, offset: u64, e: [u64; K]) -> u64 {
        let mut value = 0;
        for v in e {
            // SAFETY: v < num_variables (or v = 0 for empty chunks), so the
            // field ends by the next chunk offset, which from_parts checked
            // to be within the packed array.
            value ^= unsafe {
                get_field_unchecked(&self.data, (offset + v) as usize, self.width)
            };
        }
        value
    }

    /// Returns the value associated with the given key, or an arbitrary value
    /// if the key was not in the key set the function was built on.
    #[inline]
    pub fn lookup_bytes(&self, key: impl AsRef<[u8]>) -> u64 {
        self.get_by_sig(&self.hasher.hash(key.as_ref(), self.global_seed))
    }

    /// Returns the value associated with the given 64-bit key, or an
    /// arbitrary value if the key was not in the key set the function was
    /// built on.
    ///
    /// The key is hashed as its 8-byte little-endian representation.
    #[inline]
    pub fn lookup_u64(&self, key: u64) -> u64 {
        self.get_by_sig(&self.hasher.hash_u64(key, self.global_seed))
    }

    /// Returns the number of variables of a chunk.
    ///
    /// # Panics
    ///
    /// If `chunk` is not smaller than [`num_chunks`](Csf::num_chunks).
    pub fn num_variables(&self, chunk: usize) -> u64 {
        chunk_offset(self.offset_and_seed[chunk + 1])
            - chunk_offset(self.offset_and_seed[chunk])
            - self.width as u64
    }
}

impl<H> Csf<H> {
    /// Sets the number of variables per key.
    pub fn with_degree(mut self, degree: Degree) -> Self {
        self.degree = degree;
        self
    }

    /// Returns the number of variables per key.
    pub fn degree(&self) -> Degree {
        self.degree
    }

    /// Returns the number of chunks.
    pub fn num_chunks(&self) -> usize {
        self.offset_and_seed.len() - 1
    }

    /// Returns the multiplier mapping signatures to chunks.
    pub fn multiplier(&self) -> u64 {
        self.multiplier
    }

    /// Returns the bit width of codewords.
    pub fn codeword_width(&self) -> usize {
        self.width
    }

    /// Returns the seed used to hash keys.
    pub fn global_seed(&self) -> u64 {
        self.global_seed
    }

    /// Returns the chunk table.
    pub fn offset_and_seed(&self) -> &[u64] {
        &self.offset_and_seed
    }

    /// Returns the packed variables.
    pub fn data(&self) -> &[u64] {
        &self.data
    }

    /// Returns the first reserved escape parameter.
    ///
    /// Escapes are not used by queries; the value is preserved as stored.
    pub fn escaped_symbol_length(&self) -> u64 {
        self.escaped_symbol_length
    }

    /// Returns the second reserved escape parameter.
    ///
    /// Escapes are not used by queries; the value is preserved as stored.
    pub fn escape_length(&self) -> u64 {
        self.escape_length
    }

    /// Returns the decoder of codewords.
    pub fn decoder(&self) -> &CanonicalDecoder {
        &self.decoder
    }

    /// Returns the hasher.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Returns the number of bits used by the tables of this function.
    pub fn num_bits(&self) -> u64 {
        (self.data.len() as u64) * 64
            + (self.offset_and_seed.len() as u64) * 64
            + self.decoder.num_bits()
    }

    /// Returns the tables of this function, and its hasher.
    pub fn into_parts(self) -> (CsfParts, H) {
        let parts = CsfParts {
            chunk_count: self.num_chunks() as u64,
            multiplier: self.multiplier,
            codeword_width: self.width as u64,
            global_seed: self.global_seed,
            offset_and_seed: self.offset_and_seed.into_vec(),
            data: self.data.into_vec(),
            escaped_symbol_length: self.escaped_symbol_length,
            escape_length: self.escape_length,
            thresholds: self.decoder.thresholds().to_vec(),
            cumulative_counts: self.decoder.cumulative_counts().to_vec(),
            shifts: self.decoder.shifts().to_vec(),
            symbols: self.decoder.symbols().to_vec(),
        };
        (parts, self.hasher)
    }
}
