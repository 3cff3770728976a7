/*
 *
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Binary serialization of compressed static functions.

All integers are little-endian. The layout is:

| Field                   | Size                                     |
|-------------------------|------------------------------------------|
| chunk count             | 8 bytes                                  |
| range multiplier        | 8 bytes                                  |
| codeword width          | 8 bytes                                  |
| global seed             | 8 bytes                                  |
| chunk-table length      | 8 bytes                                  |
| chunk table             | 8 bytes per entry                        |
| packed-array length     | 8 bytes                                  |
| packed array            | 8 bytes per word                         |
| escaped symbol length   | 8 bytes                                  |
| escape length           | 8 bytes                                  |
| decoding-table length   | 8 bytes                                  |
| symbol count            | 8 bytes                                  |
| thresholds              | 8 bytes per block                        |
| cumulative counts       | 4 bytes per block                        |
| shifts                  | 1 byte per block, zero-padded to 8 bytes |
| symbols                 | 8 bytes per symbol                       |

Loading reads the tables and then [checks them](Csf::from_parts): a
function is returned only if the stream contains all declared sections and
they are consistent. Bytes following the symbols are not read.

*/

use super::csf::{Csf, CsfParts};
use super::error::{FormatError, LoadError};
use crate::hash::{CsfHasher, SpookyHasher};
use log::{debug, info};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Sections are read in blocks of this many bytes, so that the memory
/// allocated never exceeds by much the data actually read.
const BLOCK_BYTES: usize = 1 << 16;

fn read_u64(reader: &mut impl Read) -> std::io::Result<u64> {
    let mut bytes = [0; 8];
    reader.read_exact(&mut bytes)?;
    Ok(u64::from_le_bytes(bytes))
}

fn to_len(len: u64) -> Result<usize, FormatError> {
    usize::try_from(len).map_err(|_| FormatError::LengthOverflow(len))
}

/// Reads `len` little-endian values of `N` bytes.
fn read_array<T, const N: usize>(
    reader: &mut impl Read,
    len: usize,
    from_le_bytes: impl Fn([u8; N]) -> T,
) -> Result<Vec<T>, LoadError> {
    let mut values = Vec::with_capacity(len.min(BLOCK_BYTES / N));
    let mut buffer = vec![0; BLOCK_BYTES - BLOCK_BYTES % N];
    let mut remaining = len;
    while remaining > 0 {
        let n = remaining.min(buffer.len() / N);
        let bytes = &mut buffer[..n * N];
        reader.read_exact(bytes)?;
        values.extend(bytes.chunks_exact(N).map(|chunk| {
            let mut value = [0; N];
            value.copy_from_slice(chunk);
            from_le_bytes(value)
        }));
        remaining -= n;
    }
    Ok(values)
}

fn write_array<T: Copy, const N: usize>(
    writer: &mut impl Write,
    values: &[T],
    to_le_bytes: impl Fn(T) -> [u8; N],
) -> std::io::Result<()> {
    for &value in values {
        writer.write_all(&to_le_bytes(value))?;
    }
    Ok(())
}

impl CsfParts {
    /// Reads the tables of a function from a stream.
    ///
    /// Only the lengths are checked: if the stream ends before a section is
    /// complete, an [I/O error](LoadError::Io) of kind
    /// [`UnexpectedEof`](std::io::ErrorKind::UnexpectedEof) is returned.
    pub fn read(mut reader: impl Read) -> Result<Self, LoadError> {
        let reader = &mut reader;
        let chunk_count = read_u64(reader)?;
        let multiplier = read_u64(reader)?;
        let codeword_width = read_u64(reader)?;
        let global_seed = read_u64(reader)?;

        let offset_and_seed_len = to_len(read_u64(reader)?)?;
        let offset_and_seed = read_array(reader, offset_and_seed_len, u64::from_le_bytes)?;
        debug!("Read chunk table ({} entries)", offset_and_seed.len());

        let data_len = to_len(read_u64(reader)?)?;
        let data = read_array(reader, data_len, u64::from_le_bytes)?;
        debug!("Read packed array ({} words)", data.len());

        let escaped_symbol_length = read_u64(reader)?;
        let escape_length = read_u64(reader)?;
        let decoding_table_len = to_len(read_u64(reader)?)?;
        let symbol_count = to_len(read_u64(reader)?)?;

        let thresholds = read_array(reader, decoding_table_len, u64::from_le_bytes)?;
        let cumulative_counts = read_array(reader, decoding_table_len, u32::from_le_bytes)?;
        let shifts = read_array(reader, decoding_table_len, u8::from_le_bytes)?;
        let mut padding = [0; 8];
        reader.read_exact(&mut padding[..(8 - decoding_table_len % 8) % 8])?;
        debug!("Read decoding table ({} blocks)", decoding_table_len);

        let symbols = read_array(reader, symbol_count, u64::from_le_bytes)?;
        debug!("Read symbol table ({} symbols)", symbols.len());

        Ok(Self {
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
        })
    }

    /// Writes the tables of a function to a stream.
    pub fn write(&self, writer: impl Write) -> std::io::Result<()> {
        Sections {
            chunk_count: self.chunk_count,
            multiplier: self.multiplier,
            codeword_width: self.codeword_width,
            global_seed: self.global_seed,
            offset_and_seed: &self.offset_and_seed,
            data: &self.data,
            escaped_symbol_length: self.escaped_symbol_length,
            escape_length: self.escape_length,
            thresholds: &self.thresholds,
            cumulative_counts: &self.cumulative_counts,
            shifts: &self.shifts,
            symbols: &self.symbols,
        }
        .write(writer)
    }
}

/// Borrowed tables, written in order.
struct Sections<'a> {
    chunk_count: u64,
    multiplier: u64,
    codeword_width: u64,
    global_seed: u64,
    offset_and_seed: &'a [u64],
    data: &'a [u64],
    escaped_symbol_length: u64,
    escape_length: u64,
    thresholds: &'a [u64],
    cumulative_counts: &'a [u32],
    shifts: &'a [u8],
    symbols: &'a [u64],
}

impl Sections<'_> {
    fn write(&self, mut writer: impl Write) -> std::io::Result<()> {
        let writer = &mut writer;
        write_array(
            writer,
            &[
                self.chunk_count,
                self.multiplier,
                self.codeword_width,
                self.global_seed,
                self.offset_and_seed.len() as u64,
            ],
            u64::to_le_bytes,
        )?;
        write_array(writer, self.offset_and_seed, u64::to_le_bytes)?;
        write_array(writer, &[self.data.len() as u64], u64::to_le_bytes)?;
        write_array(writer, self.data, u64::to_le_bytes)?;
        write_array(
            writer,
            &[
                self.escaped_symbol_length,
                self.escape_length,
                self.thresholds.len() as u64,
                self.symbols.len() as u64,
            ],
            u64::to_le_bytes,
        )?;
        write_array(writer, self.thresholds, u64::to_le_bytes)?;
        write_array(writer, self.cumulative_counts, u32::to_le_bytes)?;
        write_array(writer, self.shifts, u8::to_le_bytes)?;
        writer.write_all(&[0; 8][..(8 - self.shifts.len() % 8) % 8])?;
        write_array(writer, self.symbols, u64::to_le_bytes)
    }
}

impl Csf<SpookyHasher> {
    /// Loads a function from a stream, using [`SpookyHasher`].
    pub fn load(reader: impl Read) -> Result<Self, LoadError> {
        Self::load_with_hasher(reader, SpookyHasher)
    }

    /// Loads a function from a file, using [`SpookyHasher`].
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        info!("Loading function from {}...", path.display());
        Self::load(BufReader::new(File::open(path)?))
    }
}

impl<H: CsfHasher> Csf<H> {
    /// Loads a function from a stream, using the given hasher.
    ///
    /// The hasher must be the one used by the encoder: the format contains
    /// no information about it.
    pub fn load_with_hasher(reader: impl Read, hasher: H) -> Result<Self, LoadError> {
        let csf = Self::from_parts(CsfParts::read(reader)?, hasher)?;
        info!(
            "Loaded function: {} chunks, {}-bit codewords, {} decoding blocks, {} symbols, {} bits",
            csf.num_chunks(),
            csf.codeword_width(),
            csf.decoder().num_blocks(),
            csf.decoder().symbols().len(),
            csf.num_bits()
        );
        Ok(csf)
    }
}

impl<H> Csf<H> {
    /// Writes this function to a stream in the format read by
    /// [`load`](Csf::load).
    pub fn store(&self, writer: impl Write) -> std::io::Result<()> {
        let decoder = self.decoder();
        Sections {
            chunk_count: self.num_chunks() as u64,
            multiplier: self.multiplier(),
            codeword_width: self.codeword_width() as u64,
            global_seed: self.global_seed(),
            offset_and_seed: self.offset_and_seed(),
            data: self.data(),
            escaped_symbol_length: self.escaped_symbol_length(),
            escape_length: self.escape_length(),
            thresholds: decoder.thresholds(),
            cumulative_counts: decoder.cumulative_counts(),
            shifts: decoder.shifts(),
            symbols: decoder.symbols(),
        }
        .write(writer)
    }

    /// Writes this function to a file in the format read by
    /// [`load_file`](Csf::load_file).
    pub fn store_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.store(&mut writer)?;
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts() -> CsfParts {
        CsfParts {
            chunk_count: 1,
            multiplier: 0,
            codeword_width: 3,
            global_seed: 17,
            offset_and_seed: vec![0, 8],
            data: vec![0xDEAD],
            escaped_symbol_length: 5,
            escape_length: 6,
            thresholds: vec![4, 8],
            cumulative_counts: vec![4, 8],
            shifts: vec![0, 0],
            symbols: vec![1, 2, 3, 4, 5, 6, 7, 8],
        }
    }

    #[test]
    fn test_layout() -> anyhow::Result<()> {
        let mut bytes = vec![];
        parts().write(&mut bytes)?;
        // Header, chunk table, array, decoder header, thresholds, counts,
        // padded shifts, symbols
        assert_eq!(bytes.len(), 5 * 8 + 2 * 8 + 8 + 8 + 4 * 8 + 2 * 8 + 2 * 4 + 8 + 8 * 8);
        assert_eq!(&bytes[0..8], &1_u64.to_le_bytes());
        assert_eq!(&bytes[24..32], &17_u64.to_le_bytes());
        assert_eq!(&bytes[32..40], &2_u64.to_le_bytes());
        assert_eq!(&bytes[64..72], &0xDEAD_u64.to_le_bytes());
        let shifts = 5 * 8 + 2 * 8 + 8 + 8 + 4 * 8 + 2 * 8 + 2 * 4;
        assert_eq!(&bytes[shifts..shifts + 8], &[0; 8]);

        let mut stored = vec![];
        Csf::from_parts(parts(), SpookyHasher)?.store(&mut stored)?;
        assert_eq!(stored, bytes);
        Ok(())
    }

    #[test]
    fn test_read_write() -> anyhow::Result<()> {
        let mut bytes = vec![];
        parts().write(&mut bytes)?;
        assert_eq!(CsfParts::read(bytes.as_slice())?, parts());
        let csf = Csf::load(bytes.as_slice())?;
        assert_eq!(csf.global_seed(), 17);
        assert_eq!(csf.escaped_symbol_length(), 5);
        assert_eq!(csf.escape_length(), 6);
        Ok(())
    }

    #[test]
    fn test_truncated() -> anyhow::Result<()> {
        let mut bytes = vec![];
        parts().write(&mut bytes)?;
        for len in [0, 7, 40, 60, bytes.len() - 1] {
            match Csf::load(&bytes[..len]) {
                Err(LoadError::Io(e)) => {
                    assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof)
                }
                other => panic!("Unexpected result {:?} for length {}", other.map(|_| ()), len),
            }
        }
        Ok(())
    }

    #[test]
    fn test_huge_length() {
        // A packed array of 2^60 words in a stream of a few bytes
        let mut bytes = vec![];
        for word in [1, 0, 3, 0, 2, 0, 8, 1 << 60] {
            bytes.extend_from_slice(&u64::to_le_bytes(word));
        }
        #[cfg(target_pointer_width = "64")]
        match CsfParts::read(bytes.as_slice()) {
            Err(LoadError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
            other => panic!("Unexpected result {:?}", other.map(|_| ())),
        }
        #[cfg(not(target_pointer_width = "64"))]
        assert!(matches!(
            CsfParts::read(bytes.as_slice()),
            Err(LoadError::Format(FormatError::LengthOverflow(_)))
        ));
    }
}
