//! Fatal pipeline conditions.

use thiserror::Error;

/// Conditions that abort a pipeline run.
///
/// Everything else (resolution problems, single batch failures, a failed
/// merge call) degrades to a best-effort result instead.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PipelineError {
    /// The diff was empty or whitespace only.
    #[error("Diff is empty")]
    EmptyDiff,

    /// The diff exceeds the absolute input ceiling.
    #[error("Diff is too large: {size} bytes exceeds the {max} byte limit")]
    DiffTooLarge {
        /// Size of the input in bytes.
        size: usize,
        /// Maximum accepted size in bytes.
        max: usize,
    },

    /// The input does not look like a unified diff.
    #[error("Input does not look like a unified diff")]
    NotADiff,

    /// Segmentation produced no file units.
    #[error("Diff segmentation produced no file units")]
    NoDiffUnits,

    /// Packing produced no chunks.
    #[error("Batch packing produced no chunks")]
    NoChunks,

    /// Every batch request failed.
    #[error("All batch processing failed ({failed} batches)")]
    AllBatchesFailed {
        /// Number of batches attempted.
        failed: usize,
    },
}
