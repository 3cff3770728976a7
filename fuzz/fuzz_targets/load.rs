#![no_main]

use csf::fuzz::load::{harness, Data};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: Data| harness(data));
