/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! A minimal encoder building compressed static functions by solving their
//! equations over GF(2), used to test and benchmark queries.

#![allow(dead_code)]

use csf::bits::set_field;
use csf::func::chunk::*;
use csf::func::{CsfParts, Degree};
use csf::hash::CsfHasher;

/// Codewords are three bits wide.
pub const WIDTH: u64 = 3;

/// The symbols of the test code, with canonical codewords 0, 10, 110 and 111.
pub const SYMBOLS: [u64; 4] = [7, 8, 9, 10];

/// Returns a left-aligned codeword for a symbol of [`SYMBOLS`].
pub fn codeword(symbol: u64) -> u64 {
    match symbol {
        7 => 0b000,
        8 => 0b100,
        9 => 0b110,
        10 => 0b111,
        _ => panic!("Symbol {} has no codeword", symbol),
    }
}

/// Solves the equations of a chunk by Gaussian elimination, returning the
/// bits of the chunk, or `None` if the system has no solution.
///
/// Fields overlap: the field at position `v` contains bits `[v..v + WIDTH)`,
/// so each key yields `WIDTH` equations, one for each bit of its codeword.
fn solve<H: CsfHasher, const K: usize>(
    hasher: &H,
    sigs: &[[u64; 4]],
    keys: &[usize],
    values: &[u64],
    seed: u64,
    num_variables: u64,
) -> Option<Vec<bool>> {
    let w = WIDTH as usize;
    let num_bits = num_variables as usize + w;
    let words = num_bits.div_ceil(64);
    let mut rows = vec![];
    for &k in keys {
        let e = equation::<_, K>(hasher, &sigs[k], seed, num_variables);
        for a in 0..K {
            if e[a + 1..].contains(&e[a]) {
                return None;
            }
        }
        let c = codeword(values[k]);
        for j in 0..w {
            let mut row = vec![0_u64; words];
            for &v in &e {
                let b = v as usize + j;
                row[b / 64] ^= 1 << (b % 64);
            }
            rows.push((row, (c >> j) & 1 != 0));
        }
    }

    let mut pivots = vec![];
    for col in 0..num_bits {
        let (word, bit) = (col / 64, col % 64);
        let r = pivots.len();
        let Some(p) = (r..rows.len()).find(|&i| (rows[i].0[word] >> bit) & 1 != 0) else {
            continue;
        };
        rows.swap(r, p);
        let pivot = rows[r].clone();
        for (i, (row, rhs)) in rows.iter_mut().enumerate() {
            if i != r && (row[word] >> bit) & 1 != 0 {
                row.iter_mut().zip(&pivot.0).for_each(|(x, y)| *x ^= y);
                *rhs ^= pivot.1;
            }
        }
        pivots.push(col);
    }
    // Rows past the pivots are zero, so their right-hand side must be too
    if rows[pivots.len()..].iter().any(|&(_, rhs)| rhs) {
        return None;
    }

    // Free bits are zero
    let mut bits = vec![false; num_bits];
    for (r, &col) in pivots.iter().enumerate() {
        bits[col] = rows[r].1;
    }
    Some(bits)
}

/// Builds the tables of a function mapping each key to the corresponding
/// value, which must be one of [`SYMBOLS`].
pub fn build<H: CsfHasher>(
    hasher: &H,
    keys: &[Vec<u8>],
    values: &[u64],
    chunk_count: u64,
    degree: Degree,
    global_seed: u64,
) -> CsfParts {
    assert_eq!(keys.len(), values.len());
    // Twice the number of chunks spreads 63-bit values on all chunks
    let multiplier = 2 * chunk_count;
    let sigs = keys
        .iter()
        .map(|key| hasher.hash(key, global_seed))
        .collect::<Vec<_>>();
    let mut chunks = vec![vec![]; chunk_count as usize];
    for (i, sig) in sigs.iter().enumerate() {
        chunks[chunk_index(sig[0], multiplier) as usize].push(i);
    }

    let mut offset_and_seed = vec![];
    let mut solutions = vec![];
    let mut offset = 0;
    for chunk in &chunks {
        let num_variables = (chunk.len() as u64 * WIDTH * 5).div_ceil(4) + 8;
        let (seed, bits) = (0..1_u64 << SEED_BITS)
            .find_map(|s| {
                let seed = s << OFFSET_BITS;
                match degree {
                    Degree::Three => {
                        solve::<_, 3>(hasher, &sigs, chunk, values, seed, num_variables)
                    }
                    Degree::Four => {
                        solve::<_, 4>(hasher, &sigs, chunk, values, seed, num_variables)
                    }
                }
                .map(|bits| (seed, bits))
            })
            .expect("Unsolvable chunk");
        offset_and_seed.push(offset | seed);
        solutions.push((offset, bits));
        offset += num_variables + WIDTH;
    }
    offset_and_seed.push(offset);

    let mut data = vec![0; offset.div_ceil(64) as usize];
    for (offset, bits) in solutions {
        for (b, &x) in bits.iter().enumerate() {
            set_field(&mut data, offset as usize + b, 1, x as u64);
        }
    }

    CsfParts {
        chunk_count,
        multiplier,
        codeword_width: WIDTH,
        global_seed,
        offset_and_seed,
        data,
        escaped_symbol_length: 0,
        escape_length: 0,
        thresholds: vec![4, 6, 8],
        cumulative_counts: vec![1, 2, 4],
        shifts: vec![2, 1, 0],
        symbols: SYMBOLS.to_vec(),
    }
}

/// Returns `n` string keys and values cycling over [`SYMBOLS`].
pub fn string_keys(n: usize) -> (Vec<Vec<u8>>, Vec<u64>) {
    (
        (0..n).map(|i| format!("key{}", i).into_bytes()).collect(),
        (0..n).map(|i| SYMBOLS[i * 7 % 4]).collect(),
    )
}

/// Returns the 64-bit keys `[0..n)` as byte strings, and values cycling over
/// [`SYMBOLS`].
pub fn int_keys(n: u64) -> (Vec<Vec<u8>>, Vec<u64>) {
    (
        (0..n).map(|i| i.to_le_bytes().to_vec()).collect(),
        (0..n).map(|i| SYMBOLS[(i % 3) as usize]).collect(),
    )
}
