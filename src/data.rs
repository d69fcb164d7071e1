//! Result types produced by the generation pipeline.

pub mod language;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use language::Language;

/// Structured output of one LLM call over one diff chunk (or the whole diff).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchGenerationResult {
    /// Conventional commit message, `type(scope): description`.
    pub commit: String,
    /// Branch name, `type/kebab-case-words`, always English.
    pub branch: String,
    /// Markdown merge request description.
    pub description: String,
    /// Short merge request title.
    pub title: String,
}

/// Final answer handed to the commit/branch/merge-request layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitGenerationResult {
    /// Conventional commit message, `type(scope): description`.
    pub commit: String,
    /// Branch name, `type/kebab-case-words`, always English.
    pub branch: String,
    /// Markdown merge request description.
    pub description: String,
    /// Short merge request title.
    pub title: String,
}

impl From<BatchGenerationResult> for CommitGenerationResult {
    fn from(batch: BatchGenerationResult) -> Self {
        Self {
            commit: batch.commit,
            branch: batch.branch,
            description: batch.description,
            title: batch.title,
        }
    }
}

impl fmt::Display for CommitGenerationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Commit: {}", self.commit)?;
        writeln!(f, "Branch: {}", self.branch)?;
        writeln!(f, "Title:  {}", self.title)?;
        writeln!(f)?;
        write!(f, "{}", self.description)
    }
}
