/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Fields of fixed bit width packed in a slice of 64-bit words.

A slice of words is seen as a bit array in which bit `p` is bit `p % 64` of
word `p / 64` (that is, bits are numbered from the least significant bit
of each word). A field of width `w` at position `p` is made of the bits
`p..p + w`, the bit at position `p` being the least significant one. Fields
are stored with no padding, so a field may cross a word boundary.

The query path of a [static function](crate::func::Csf) reads fields using
[`get_field_unchecked`], as all positions have been validated once when the
function was built; [`get_field`] and [`set_field`] are bound-checked and
are used to prepare and inspect packed arrays.

*/

/// Returns the field of width `width` starting at bit `pos` of `words`.
///
/// # Safety
///
/// `width` must be in `1..=64`, and `pos + width` must not exceed `64 *
/// words.len()`.
#[inline(always)]
pub unsafe fn get_field_unchecked(words: &[u64], pos: usize, width: usize) -> u64 {
    debug_assert!(width != 0 && width <= 64);
    debug_assert!(pos + width <= words.len() * 64);
    let l = 64 - width;
    let word_index = pos / 64;
    let bit_index = pos % 64;
    if bit_index <= l {
        *words.get_unchecked(word_index) << (l - bit_index) >> l
    } else {
        *words.get_unchecked(word_index) >> bit_index
            | *words.get_unchecked(word_index + 1) << (64 + l - bit_index) >> l
    }
}

/// Returns the field of width `width` starting at bit `pos` of `words`.
///
/// # Panics
///
/// If `width` is not in `1..=64` or if the field does not lie within
/// `words`.
#[inline]
pub fn get_field(words: &[u64], pos: usize, width: usize) -> u64 {
    check_field(words.len(), pos, width);
    unsafe { get_field_unchecked(words, pos, width) }
}

/// Stores `value` in the field of width `width` starting at bit `pos` of
/// `words`, leaving all other bits untouched.
///
/// # Panics
///
/// If `width` is not in `1..=64`, if the field does not lie within `words`,
/// or if `value` does not fit in `width` bits.
pub fn set_field(words: &mut [u64], pos: usize, width: usize, value: u64) {
    check_field(words.len(), pos, width);
    let mask = u64::MAX >> (64 - width);
    assert!(
        value & !mask == 0,
        "Value {} does not fit in {} bits",
        value,
        width
    );
    let word_index = pos / 64;
    let bit_index = pos % 64;

    if bit_index + width <= 64 {
        let mut word = words[word_index];
        word &= !(mask << bit_index);
        word |= value << bit_index;
        words[word_index] = word;
    } else {
        let mut word = words[word_index];
        word &= (1 << bit_index) - 1;
        word |= value << bit_index;
        words[word_index] = word;

        let mut word = words[word_index + 1];
        word &= !(mask >> (64 - bit_index));
        word |= value >> (64 - bit_index);
        words[word_index + 1] = word;
    }
}

#[inline(always)]
fn check_field(len: usize, pos: usize, width: usize) {
    assert!(
        width != 0 && width <= 64,
        "Bit width {} is not in [1..64]",
        width
    );
    assert!(
        pos.checked_add(width)
            .is_some_and(|end| end <= len.saturating_mul(64)),
        "Field of width {} at position {} exceeds {} words",
        width,
        pos,
        len
    );
}
