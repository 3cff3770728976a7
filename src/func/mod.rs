/*
 *
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Compressed static functions.

A static function is an immutable data structure that stores key/value pairs
and retrieves the value associated with a key. Differently from a
dictionary, static functions may return any result on a key that is not
part of the original set of keys. This property makes it possible to design
static functions using space very close to the theoretical lower bound. A
_compressed_ static function stores values using a canonical code, so its
space depends on the empirical entropy of the values rather than on their
largest bit width.

The typical use case is that of a very large set of keys: the function is
built and serialized once by an external encoder, and then
[loaded](Csf::load) and queried many times. This module contains the query
side: [loading and checking](load) the tables, mapping keys to
[chunks and equations](chunk), and [decoding](decoder) codewords.

*/

pub mod chunk;
pub mod decoder;
mod csf;
mod error;
pub mod load;

pub use csf::{Csf, CsfParts, Degree};
pub use decoder::CanonicalDecoder;
pub use error::{FormatError, LoadError};
