/*
 *
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! [SpookyHash::Short V2](https://burtleburtle.net/bob/hash/spooky.html).
//!
//! Only the short version is provided: the keys of a static function are
//! hashed into the full 256-bit internal state, which is then used as a
//! signature, and the state is mixed again with a seed to obtain the
//! per-chunk signature.

pub const SC_CONST: u64 = 0xdeadbeefdeadbeef;

#[inline(always)]
#[must_use]
const fn spooky_short_mix(mut h: [u64; 4]) -> [u64; 4] {
    h[2] = h[2].rotate_left(50);
    h[2] = h[2].wrapping_add(h[3]);
    h[0] ^= h[2];
    h[3] = h[3].rotate_left(52);
    h[3] = h[3].wrapping_add(h[0]);
    h[1] ^= h[3];
    h[0] = h[0].rotate_left(30);
    h[0] = h[0].wrapping_add(h[1]);
    h[2] ^= h[0];
    h[1] = h[1].rotate_left(41);
    h[1] = h[1].wrapping_add(h[2]);
    h[3] ^= h[1];
    h[2] = h[2].rotate_left(54);
    h[2] = h[2].wrapping_add(h[3]);
    h[0] ^= h[2];
    h[3] = h[3].rotate_left(48);
    h[3] = h[3].wrapping_add(h[0]);
    h[1] ^= h[3];
    h[0] = h[0].rotate_left(38);
    h[0] = h[0].wrapping_add(h[1]);
    h[2] ^= h[0];
    h[1] = h[1].rotate_left(37);
    h[1] = h[1].wrapping_add(h[2]);
    h[3] ^= h[1];
    h[2] = h[2].rotate_left(62);
    h[2] = h[2].wrapping_add(h[3]);
    h[0] ^= h[2];
    h[3] = h[3].rotate_left(34);
    h[3] = h[3].wrapping_add(h[0]);
    h[1] ^= h[3];
    h[0] = h[0].rotate_left(5);
    h[0] = h[0].wrapping_add(h[1]);
    h[2] ^= h[0];
    h[1] = h[1].rotate_left(36);
    h[1] = h[1].wrapping_add(h[2]);
    h[3] ^= h[1];
    h
}

#[inline(always)]
#[must_use]
const fn spooky_short_end(mut h: [u64; 4]) -> [u64; 4] {
    h[3] ^= h[2];
    h[2] = h[2].rotate_left(15);
    h[3] = h[3].wrapping_add(h[2]);
    h[0] ^= h[3];
    h[3] = h[3].rotate_left(52);
    h[0] = h[0].wrapping_add(h[3]);
    h[1] ^= h[0];
    h[0] = h[0].rotate_left(26);
    h[1] = h[1].wrapping_add(h[0]);
    h[2] ^= h[1];
    h[1] = h[1].rotate_left(51);
    h[2] = h[2].wrapping_add(h[1]);
    h[3] ^= h[2];
    h[2] = h[2].rotate_left(28);
    h[3] = h[3].wrapping_add(h[2]);
    h[0] ^= h[3];
    h[3] = h[3].rotate_left(9);
    h[0] = h[0].wrapping_add(h[3]);
    h[1] ^= h[0];
    h[0] = h[0].rotate_left(47);
    h[1] = h[1].wrapping_add(h[0]);
    h[2] ^= h[1];
    h[1] = h[1].rotate_left(54);
    h[2] = h[2].wrapping_add(h[1]);
    h[3] ^= h[2];
    h[2] = h[2].rotate_left(32);
    h[3] = h[3].wrapping_add(h[2]);
    h[0] ^= h[3];
    h[3] = h[3].rotate_left(25);
    h[0] = h[0].wrapping_add(h[3]);
    h[1] ^= h[0];
    h[0] = h[0].rotate_left(63);
    h[1] = h[1].wrapping_add(h[0]);
    h
}

/// Reads a little-endian word from the first eight bytes of `bytes`.
#[inline(always)]
fn le_word(bytes: &[u8]) -> u64 {
    let mut word = [0; 8];
    word.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(word)
}

/// Mixes a seed into a signature computed by [`spooky_short`].
///
/// Only the first two words of the signature are used.
#[inline(always)]
#[must_use]
pub const fn spooky_short_rehash(sig: &[u64; 4], seed: u64) -> [u64; 4] {
    spooky_short_mix([
        seed,
        SC_CONST.wrapping_add(sig[0]),
        SC_CONST.wrapping_add(sig[1]),
        SC_CONST,
    ])
}

/// Computes the 256-bit internal state of SpookyHash (short version) for a
/// slice of bytes.
///
/// Bob Jenkins's SpookyHash uses two 64-bit hash seeds: the only value
/// provided here is used for both seeds. The 128-bit standard SpookyHash
/// is given by the first two values of the returned array.
#[must_use]
#[inline]
pub fn spooky_short(data: &[u8], seed: u64) -> [u64; 4] {
    let mut h = [seed, seed, SC_CONST, SC_CONST];

    let blocks = data.chunks_exact(32);
    let mut rest = blocks.remainder();

    for block in blocks {
        h[2] = h[2].wrapping_add(le_word(&block[0..]));
        h[3] = h[3].wrapping_add(le_word(&block[8..]));
        h = spooky_short_mix(h);
        h[0] = h[0].wrapping_add(le_word(&block[16..]));
        h[1] = h[1].wrapping_add(le_word(&block[24..]));
    }

    if rest.len() >= 16 {
        h[2] = h[2].wrapping_add(le_word(&rest[0..]));
        h[3] = h[3].wrapping_add(le_word(&rest[8..]));
        h = spooky_short_mix(h);
        rest = &rest[16..];
    }

    h[3] = h[3].wrapping_add((data.len() as u64) << 56);

    // The last 0..15 bytes are zero-padded
    if rest.is_empty() {
        h[2] = h[2].wrapping_add(SC_CONST);
        h[3] = h[3].wrapping_add(SC_CONST);
    } else {
        let mut buffer = [0; 16];
        buffer[..rest.len()].copy_from_slice(rest);
        h[2] = h[2].wrapping_add(le_word(&buffer[0..]));
        h[3] = h[3].wrapping_add(le_word(&buffer[8..]));
    }

    spooky_short_end(h)
}

#[test]
fn test() {
    let s = spooky_short(b"ciaociaociaociaoc", 0);
    assert_eq!(s[0], 0xfb9a067cf49b4b1c);
    assert_eq!(s[1], 0xd30b86ad7fb48d4);

    let s = spooky_short(b"ciaociaociaociaoc", 1);
    assert_eq!(s[0], 0x4b378d1bc317b08a);
    assert_eq!(s[1], 0x26087823be213893);

    let s = spooky_short(b"ciaociaociaociao", 0);
    assert_eq!(s[0], 0x4ff16aa850d481df);
    assert_eq!(s[1], 0xbc025187c0cb9eaf);

    let s = spooky_short(b"ciaociaociaocia", 0);
    assert_eq!(s[0], 0xf56ea3bd694d8c09);
    assert_eq!(s[1], 0xba8a7cfe1a359dd5);
}

#[test]
fn test_long() {
    let data = [0x5a_u8; 100];
    assert_eq!(spooky_short(&data, 3), spooky_short(&data, 3));
    let mut other = data;
    other[99] ^= 1;
    assert_ne!(spooky_short(&data, 3), spooky_short(&other, 3));
    assert_ne!(spooky_short(&data[..99], 3), spooky_short(&data, 3));
}
