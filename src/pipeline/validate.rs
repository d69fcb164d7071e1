//! Input checks run before any model request.

use crate::pipeline::error::PipelineError;

/// Largest diff accepted, in bytes.
pub const MAX_DIFF_BYTES: usize = 10 * 1024 * 1024;

/// Line prefixes that mark unified diff structure.
const DIFF_LINE_MARKERS: [&str; 5] = ["diff --git ", "@@", "+++ ", "--- ", "Binary files "];

/// Rejects input that is empty, oversized, or not diff-like.
pub fn validate_diff(diff: &str) -> Result<(), PipelineError> {
    if diff.trim().is_empty() {
        return Err(PipelineError::EmptyDiff);
    }
    if diff.len() > MAX_DIFF_BYTES {
        return Err(PipelineError::DiffTooLarge {
            size: diff.len(),
            max: MAX_DIFF_BYTES,
        });
    }
    if !looks_like_diff(diff) {
        return Err(PipelineError::NotADiff);
    }
    Ok(())
}

/// Accepts text with any diff header line or any added/removed line.
fn looks_like_diff(diff: &str) -> bool {
    diff.lines().any(|line| {
        DIFF_LINE_MARKERS.iter().any(|m| line.starts_with(m))
            || line.starts_with('+')
            || line.starts_with('-')
    })
}
