/*
 *
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/// Structural inconsistencies detected while building a function from its
/// tables.
///
/// Each one would make some query read outside of a table.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Chunk table has {found} entries, but {expected} are needed for {chunk_count} chunks")]
    /// The chunk table does not contain exactly one entry more than the
    /// number of chunks.
    ChunkTableLength {
        chunk_count: u64,
        expected: u64,
        found: u64,
    },
    #[error("Range multiplier {multiplier} maps signatures to chunk {max_chunk}, but there are {chunk_count} chunks")]
    /// Range reduction with the given multiplier can select a nonexistent
    /// chunk (in particular, this happens whenever there are no chunks).
    RangeMultiplier {
        multiplier: u64,
        chunk_count: u64,
        max_chunk: u64,
    },
    #[error("Codeword width {0} is larger than 64")]
    /// The codeword width does not fit a word.
    CodewordWidth(u64),
    #[error("Chunk {chunk} starts at bit {offset} but the next chunk starts at bit {next_offset}, leaving less than {width} bits")]
    /// The offsets of two consecutive chunks differ by less than the
    /// codeword width, that is, the chunk has a negative number of
    /// variables.
    NegativeVariables {
        chunk: usize,
        offset: u64,
        next_offset: u64,
        width: u64,
    },
    #[error("Chunks span {required} bits, but the packed array contains only {available} bits")]
    /// The last chunk ends beyond the end of the packed array.
    ArrayTooShort { required: u64, available: u64 },
    #[error("Decoding table sections have different lengths ({thresholds} thresholds, {counts} counts, {shifts} shifts)")]
    /// The parallel sections of the decoding table differ in length.
    DecodingTableLengths {
        thresholds: usize,
        counts: usize,
        shifts: usize,
    },
    #[error("Empty decoding table")]
    /// The decoding table has no blocks.
    EmptyDecodingTable,
    #[error("Threshold of block {0} is not larger than the previous one")]
    /// Thresholds are not strictly increasing (the first threshold must be
    /// positive).
    ThresholdsNotIncreasing(usize),
    #[error("Last threshold {threshold} does not cover {width}-bit codewords")]
    /// Some codeword of the given width is not smaller than the last
    /// threshold.
    ThresholdsIncomplete { threshold: u64, width: u64 },
    #[error("Shift {shift} of block {block} is not smaller than 64")]
    /// A block shift is too large.
    BlockShift { block: usize, shift: u8 },
    #[error("Block {0} decodes to a negative symbol index")]
    /// The cumulative count of a block is too small for its first codeword.
    NegativeSymbolIndex(usize),
    #[error("Block {block} decodes to symbol {index}, but there are {symbols} symbols")]
    /// Some codeword of a block would decode outside of the symbol table.
    SymbolOutOfBounds {
        block: usize,
        index: u64,
        symbols: usize,
    },
    #[error("Blocks decode {expected} symbols, but the symbol table contains {found} symbols")]
    /// The per-block symbol counts do not add up to the length of the
    /// symbol table.
    SymbolCount { expected: u64, found: usize },
    #[error("Length {0} does not fit this platform")]
    /// A declared length is not representable in memory.
    LengthOverflow(u64),
}

/// Errors returned when loading a function.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    /// The stream could not be read, or it ended before a declared section
    /// was complete.
    Io(#[from] std::io::Error),
    #[error(transparent)]
    /// The stream was read completely, but its content is inconsistent.
    Format(#[from] FormatError),
}
