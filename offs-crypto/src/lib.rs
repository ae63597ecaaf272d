//! Checksum and randomizer primitives shared by the OFFS block-storage engine.

mod checksum;
mod randomizer;

pub use checksum::{Checksum, ChecksumError, CHECKSUM_BYTES};
pub use randomizer::{OsRandomizer, RandomizerSource};
