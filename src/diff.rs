//! Unified diff segmentation and token-budget packing.

pub mod pack;
pub mod split;

pub use pack::{pack, DiffChunk};
pub use split::{split_by_file, split_oversized_unit, DiffUnit, UNKNOWN_FILE};
