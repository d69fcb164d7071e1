//! Per-file diff packing into token-budget-constrained chunks.
//!
//! Groups diff units into the fewest chunks that fit a token budget using a
//! greedy single pass that keeps the original file order. Units that alone
//! exceed the budget are split line-wise via [`split_oversized_unit`] and
//! emitted as standalone chunks.

use tracing::debug;

use crate::diff::split::{split_oversized_unit, DiffUnit};
use crate::llm::token_budget::estimate_tokens;

/// A group of diff units (or a slice of one oversized unit) that fits
/// within one LLM request's token budget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffChunk {
    /// Concatenated diff text.
    pub content: String,
    /// Paths of every file contributing to this chunk, in order.
    pub files: Vec<String>,
    /// Running token estimate of `content`.
    pub token_count: usize,
}

impl DiffChunk {
    fn push_unit(&mut self, unit: &DiffUnit, tokens: usize) {
        self.content.push_str(&unit.content);
        if !self.files.contains(&unit.file_path) {
            self.files.push(unit.file_path.clone());
        }
        self.token_count += tokens;
    }

    fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Packs diff units into chunks of at most `max_tokens_per_batch` estimated
/// tokens.
///
/// Deterministic: the same units and budget always produce the same chunk
/// boundaries. Only a single line that cannot fit on its own can produce a
/// chunk over budget, and such a chunk is never merged with other content.
#[must_use]
pub fn pack(units: &[DiffUnit], max_tokens_per_batch: usize) -> Vec<DiffChunk> {
    let mut chunks = Vec::new();
    let mut current = DiffChunk::default();

    for unit in units {
        let unit_tokens = estimate_tokens(&unit.content);

        if unit_tokens > max_tokens_per_batch {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let parts = split_oversized_unit(&unit.content, max_tokens_per_batch);
            debug!(
                file = %unit.file_path,
                unit_tokens,
                parts = parts.len(),
                "Split oversized file diff"
            );
            chunks.extend(parts.into_iter().map(|content| DiffChunk {
                token_count: estimate_tokens(&content),
                content,
                files: vec![unit.file_path.clone()],
            }));
            continue;
        }

        if !current.is_empty() && current.token_count + unit_tokens > max_tokens_per_batch {
            chunks.push(std::mem::take(&mut current));
        }
        current.push_unit(unit, unit_tokens);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
