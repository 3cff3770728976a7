/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Access to [fields of bounded bit width](`mod@bit_field`) packed in
//! arrays of 64-bit words.

pub mod bit_field;
pub use bit_field::*;
