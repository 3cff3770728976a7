/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */
use crate::prelude::*;
use arbitrary::Arbitrary;

#[derive(Arbitrary, Debug)]
pub struct Data {
    /// the tables of the function, mostly garbage
    parts: Parts,
    /// keys to look up if the tables are accepted
    keys: Vec<Vec<u8>>,
    /// 64-bit keys to look up if the tables are accepted
    int_keys: Vec<u64>,
    /// whether to read four variables per key
    four: bool,
}

#[derive(Arbitrary, Debug)]
struct Parts {
    chunk_count: u8,
    multiplier: u64,
    codeword_width: u8,
    global_seed: u64,
    offset_and_seed: Vec<u64>,
    data: Vec<u64>,
    thresholds: Vec<u64>,
    cumulative_counts: Vec<u32>,
    shifts: Vec<u8>,
    symbols: Vec<u64>,
    /// bytes appended to the serialized tables, or cut from them if negative
    tail: i8,
}

/// Serializes random tables, loads them back, and checks that whatever is
/// accepted by the loader can be queried without panicking.
pub fn harness(data: Data) {
    let parts = CsfParts {
        chunk_count: data.parts.chunk_count as u64,
        multiplier: data.parts.multiplier,
        codeword_width: data.parts.codeword_width as u64,
        global_seed: data.parts.global_seed,
        offset_and_seed: data.parts.offset_and_seed,
        data: data.parts.data,
        escaped_symbol_length: 0,
        escape_length: 0,
        thresholds: data.parts.thresholds,
        cumulative_counts: data.parts.cumulative_counts,
        shifts: data.parts.shifts,
        symbols: data.parts.symbols,
    };
    let mut bytes = vec![];
    parts.write(&mut bytes).unwrap();
    if data.parts.tail < 0 {
        bytes.truncate(bytes.len().saturating_sub(data.parts.tail.unsigned_abs() as usize));
    } else {
        bytes.resize(bytes.len() + data.parts.tail as usize, 0xff);
    }

    let Ok(csf) = Csf::load(bytes.as_slice()) else {
        return;
    };
    let csf = if data.four {
        csf.with_degree(Degree::Four)
    } else {
        csf
    };
    for key in &data.keys {
        assert_eq!(csf.lookup_bytes(key), csf.lookup_bytes(key));
    }
    for &key in &data.int_keys {
        assert_eq!(csf.lookup_u64(key), csf.lookup_u64(key));
    }
}
