/*
 *
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Table-driven decoding of canonical codes.

Codewords are left-aligned in `w` bits and grouped in blocks by length.
Block `b` decodes the values smaller than its threshold (the last codeword
of the block plus one, as a `w`-bit value) and not smaller than the threshold
of the previous block (zero for the first block). Its shift is the number of
low bits that are not part of its codewords, so all values sharing a
codeword collapse to the same index once shifted.

The symbols of block `b` follow the symbols of all previous blocks in the
symbol table, and its cumulative count is the number of symbols of blocks
`0..=b`. A value `v` decoded by block `b` is thus mapped to the symbol of
index

```text
(v >> shift[b]) - (threshold[b] >> shift[b]) + cumulative_count[b]
```

that is, the threshold of the block, shifted, points just past the last
symbol of the block.

*/

use super::error::FormatError;
use mem_dbg::*;

/// A decoder for canonical codes of bounded length.
///
/// Instances are immutable, and they are validated at construction time:
/// every value smaller than 2<sup>`w`</sup> decodes to an entry of the symbol
/// table.
#[derive(Debug, Clone, PartialEq, Eq, MemDbg, MemSize)]
pub struct CanonicalDecoder {
    /// For each block, the first value not decoded by the block.
    thresholds: Box<[u64]>,
    /// For each block, the number of symbols of the block and of the
    /// previous blocks.
    cumulative_counts: Box<[u32]>,
    /// For each block, the number of low bits to discard.
    shifts: Box<[u8]>,
    /// The symbols, in codeword order.
    symbols: Box<[u64]>,
}

impl CanonicalDecoder {
    /// Creates a decoder for `width`-bit values, checking that every such
    /// value decodes to an entry of the symbol table.
    pub fn new(
        thresholds: impl Into<Box<[u64]>>,
        cumulative_counts: impl Into<Box<[u32]>>,
        shifts: impl Into<Box<[u8]>>,
        symbols: impl Into<Box<[u64]>>,
        width: u64,
    ) -> Result<Self, FormatError> {
        let decoder = Self {
            thresholds: thresholds.into(),
            cumulative_counts: cumulative_counts.into(),
            shifts: shifts.into(),
            symbols: symbols.into(),
        };
        decoder.check(width)?;
        Ok(decoder)
    }

    fn check(&self, width: u64) -> Result<(), FormatError> {
        if self.thresholds.len() != self.cumulative_counts.len()
            || self.thresholds.len() != self.shifts.len()
        {
            return Err(FormatError::DecodingTableLengths {
                thresholds: self.thresholds.len(),
                counts: self.cumulative_counts.len(),
                shifts: self.shifts.len(),
            });
        }

        let Some(&last) = self.thresholds.last() else {
            return Err(FormatError::EmptyDecodingTable);
        };
        if width >= 64 || last < 1 << width {
            return Err(FormatError::ThresholdsIncomplete {
                threshold: last,
                width,
            });
        }

        let mut start = 0;
        for (block, (&threshold, &shift)) in self.thresholds.iter().zip(&self.shifts).enumerate() {
            if threshold <= start {
                return Err(FormatError::ThresholdsNotIncreasing(block));
            }
            if shift >= 64 {
                return Err(FormatError::BlockShift { block, shift });
            }
            start = threshold;
        }

        // Values of 2^width or more never reach the decoder
        let limit = 1_u64 << width;
        let mut start = 0;
        let mut total = 0_u64;
        for block in 0..self.thresholds.len() {
            let threshold = self.thresholds[block];
            let shift = self.shifts[block];
            let end = threshold.min(limit);
            if start < end {
                let base = self.cumulative_counts[block] as i128 - (threshold >> shift) as i128;
                let first = (start >> shift) as i128 + base;
                let last = ((end - 1) >> shift) as i128 + base;
                if first < 0 {
                    return Err(FormatError::NegativeSymbolIndex(block));
                }
                if last >= self.symbols.len() as i128 {
                    return Err(FormatError::SymbolOutOfBounds {
                        block,
                        index: last as u64,
                        symbols: self.symbols.len(),
                    });
                }
                // Each count is at most the number of symbols
                total += (last - first + 1) as u64;
            }
            start = threshold;
        }

        if total != self.symbols.len() as u64 {
            return Err(FormatError::SymbolCount {
                expected: total,
                found: self.symbols.len(),
            });
        }

        Ok(())
    }

    /// Returns the block decoding `value` and the index of the decoded symbol
    /// in the symbol table.
    ///
    /// # Panics
    ///
    /// If `value` is not smaller than the last threshold.
    #[inline(always)]
    pub fn locate(&self, value: u64) -> (usize, usize) {
        let mut curr = 0;
        while value >= self.thresholds[curr] {
            curr += 1;
        }
        let shift = self.shifts[curr];
        // Never wraps around for values checked at construction time
        let index = (value >> shift)
            .wrapping_sub(self.thresholds[curr] >> shift)
            .wrapping_add(self.cumulative_counts[curr] as u64) as usize;
        (curr, index)
    }

    /// Decodes a value.
    ///
    /// # Panics
    ///
    /// If `value` is not smaller than the last threshold. This never happens
    /// for values of the width the decoder has been built for.
    #[inline(always)]
    pub fn decode(&self, value: u64) -> u64 {
        self.symbols[self.locate(value).1]
    }

    /// Returns the number of blocks.
    pub fn num_blocks(&self) -> usize {
        self.thresholds.len()
    }

    /// Returns the thresholds of the blocks.
    pub fn thresholds(&self) -> &[u64] {
        &self.thresholds
    }

    /// Returns the cumulative symbol counts of the blocks.
    pub fn cumulative_counts(&self) -> &[u32] {
        &self.cumulative_counts
    }

    /// Returns the shifts of the blocks.
    pub fn shifts(&self) -> &[u8] {
        &self.shifts
    }

    /// Returns the symbol table.
    pub fn symbols(&self) -> &[u64] {
        &self.symbols
    }

    /// Returns the number of bits used by the tables of the decoder.
    pub fn num_bits(&self) -> u64 {
        (self.thresholds.len() as u64) * 64
            + (self.cumulative_counts.len() as u64) * 32
            + (self.shifts.len() as u64) * 8
            + (self.symbols.len() as u64) * 64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Decodes as the reference C implementation does, with unsigned
    /// 64-bit arithmetic and no checks.
    fn reference_decode(
        thresholds: &[u64],
        shifts: &[u8],
        cumulative_counts: &[u32],
        symbols: &[u64],
        value: u64,
    ) -> u64 {
        let mut curr = 0;
        loop {
            if value < thresholds[curr] {
                let s = shifts[curr];
                return symbols[(value >> s)
                    .wrapping_sub(thresholds[curr] >> s)
                    .wrapping_add(cumulative_counts[curr] as u64)
                    as usize];
            }
            curr += 1;
        }
    }

    fn two_blocks() -> CanonicalDecoder {
        CanonicalDecoder::new(vec![4, 10], vec![4, 7], vec![0, 1], vec![10, 11, 12, 13, 14, 15], 3)
            .unwrap()
    }

    #[test]
    fn test_block_boundaries() {
        let decoder = two_blocks();
        assert_eq!(decoder.locate(0), (0, 0));
        assert_eq!(decoder.locate(3), (0, 3));
        assert_eq!(decoder.locate(4), (1, 4));
        assert_eq!(decoder.locate(5), (1, 4));
        assert_eq!(decoder.locate(6), (1, 5));
        assert_eq!(decoder.locate(7), (1, 5));
        // Values of more than three bits are never decoded, but the
        // arithmetic still holds
        assert_eq!(decoder.locate(9), (1, 6));
        assert_eq!(decoder.decode(3), 13);
        assert_eq!(decoder.decode(4), 14);
        assert_eq!(decoder.decode(7), 15);
    }

    #[test]
    fn test_reference_decode() {
        // Codewords 0, 10, 110, 111 left-aligned in three bits, and
        // 00, 01, 10, 110, 1110, 1111 left-aligned in four bits
        let codes: [(&[u64], &[u32], &[u8], &[u64], u64, &[u64]); 2] = [
            (
                &[4, 6, 8],
                &[1, 2, 4],
                &[2, 1, 0],
                &[7, 8, 9, 10],
                3,
                &[7, 7, 7, 7, 8, 8, 9, 10],
            ),
            (
                &[12, 14, 16],
                &[3, 4, 6],
                &[2, 1, 0],
                &[20, 21, 22, 23, 24, 25],
                4,
                &[20, 20, 20, 20, 21, 21, 21, 21, 22, 22, 22, 22, 23, 23, 24, 25],
            ),
        ];
        for (thresholds, counts, shifts, symbols, width, expected) in codes {
            let decoder =
                CanonicalDecoder::new(thresholds, counts, shifts, symbols, width).unwrap();
            for value in 0..1 << width {
                let reference = reference_decode(thresholds, shifts, counts, symbols, value);
                assert_eq!(decoder.decode(value), reference, "value {}", value);
                assert_eq!(decoder.decode(value), expected[value as usize]);
            }
        }
    }

    #[test]
    fn test_canonical_code() {
        // Codewords 0, 10, 110, 111 left-aligned in three bits
        let decoder =
            CanonicalDecoder::new(vec![4, 6, 8], vec![1, 2, 4], vec![2, 1, 0], vec![7, 8, 9, 10], 3)
                .unwrap();
        assert_eq!(decoder.locate(5), (1, 1));
        assert_eq!(decoder.locate(7), (2, 3));
        assert_eq!(decoder.num_blocks(), 3);
        assert_eq!(decoder.num_bits(), 3 * 64 + 3 * 32 + 3 * 8 + 4 * 64);
    }

    #[test]
    fn test_zero_width() {
        let decoder = CanonicalDecoder::new(vec![1], vec![1], vec![0], vec![42], 0).unwrap();
        assert_eq!(decoder.decode(0), 42);
    }

    #[test]
    fn test_incomplete() {
        assert_eq!(
            CanonicalDecoder::new(vec![4, 7], vec![4, 7], vec![0, 0], vec![0; 7], 3),
            Err(FormatError::ThresholdsIncomplete {
                threshold: 7,
                width: 3
            })
        );
        assert_eq!(
            CanonicalDecoder::new(vec![], vec![], vec![], vec![], 3),
            Err(FormatError::EmptyDecodingTable)
        );
        assert!(matches!(
            CanonicalDecoder::new(vec![u64::MAX], vec![0], vec![0], vec![0], 64),
            Err(FormatError::ThresholdsIncomplete { .. })
        ));
    }

    #[test]
    fn test_not_increasing() {
        assert_eq!(
            CanonicalDecoder::new(vec![8, 8], vec![8, 8], vec![0, 0], vec![0; 8], 3),
            Err(FormatError::ThresholdsNotIncreasing(1))
        );
        assert_eq!(
            CanonicalDecoder::new(vec![0, 8], vec![0, 8], vec![0, 0], vec![0; 8], 3),
            Err(FormatError::ThresholdsNotIncreasing(0))
        );
    }

    #[test]
    fn test_symbols() {
        assert_eq!(
            CanonicalDecoder::new(vec![4, 10], vec![4, 8], vec![0, 1], vec![0; 6], 3),
            Err(FormatError::SymbolOutOfBounds {
                block: 1,
                index: 6,
                symbols: 6
            })
        );
        // Exclusive counts point before the start of the symbol table
        assert_eq!(
            CanonicalDecoder::new(vec![4, 6, 8], vec![0, 1, 2], vec![2, 1, 0], vec![0; 4], 3),
            Err(FormatError::NegativeSymbolIndex(0))
        );
        assert_eq!(
            CanonicalDecoder::new(vec![4, 10], vec![4, 7], vec![0, 1], vec![0; 9], 3),
            Err(FormatError::SymbolCount {
                expected: 6,
                found: 9
            })
        );
        assert!(matches!(
            CanonicalDecoder::new(vec![8], vec![1], vec![64], vec![0], 3),
            Err(FormatError::BlockShift { block: 0, shift: 64 })
        ));
        assert!(matches!(
            CanonicalDecoder::new(vec![8], vec![0, 0], vec![0], vec![0; 8], 3),
            Err(FormatError::DecodingTableLengths { .. })
        ));
    }
}
