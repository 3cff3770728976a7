/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![deny(unconditional_recursion)]
#![doc = include_str!("../README.md")]

pub mod bits;
pub mod func;
pub mod hash;
pub mod utils;

#[cfg(feature = "fuzz")]
pub mod fuzz;

pub mod prelude {
    pub use crate::bits::*;
    pub use crate::func::*;
    pub use crate::hash::*;
}
