//! Merging of per-batch results into one final answer.

use anyhow::Result;
use tracing::{info, warn};

use crate::data::{BatchGenerationResult, CommitGenerationResult, Language};
use crate::llm::client::GenerationClient;
use crate::pipeline::error::PipelineError;

/// Separator placed between batch descriptions in the fallback merge.
pub const DESCRIPTION_SEPARATOR: &str = "\n\n---\n\n";

/// Combines successful batch results.
///
/// A single result is returned verbatim. Several results are merged by one
/// extra model call; if that call fails for any reason the deterministic
/// [`fallback_merge`] is used instead.
pub async fn aggregate(
    client: &GenerationClient,
    results: Vec<BatchGenerationResult>,
    language: Language,
) -> Result<CommitGenerationResult> {
    if results.len() > 1 {
        return match client.merge(&results, language).await {
            Ok(merged) => Ok(merged.into()),
            Err(e) => {
                let error = format!("{e:#}");
                warn!(
                    batches = results.len(),
                    %error,
                    "Merge request failed, using deterministic merge"
                );
                Ok(fallback_merge(&results))
            }
        };
    }

    let only = results
        .into_iter()
        .next()
        .ok_or(PipelineError::AllBatchesFailed { failed: 0 })?;
    info!("Single successful batch, skipping merge");
    Ok(only.into())
}

/// Builds a result from the first batch's commit, branch and title, with
/// every description joined by [`DESCRIPTION_SEPARATOR`].
pub fn fallback_merge(results: &[BatchGenerationResult]) -> CommitGenerationResult {
    let first = results.first();
    let description = results
        .iter()
        .map(|r| r.description.as_str())
        .collect::<Vec<_>>()
        .join(DESCRIPTION_SEPARATOR);

    CommitGenerationResult {
        commit: first.map(|r| r.commit.clone()).unwrap_or_default(),
        branch: first.map(|r| r.branch.clone()).unwrap_or_default(),
        description,
        title: first.map(|r| r.title.clone()).unwrap_or_default(),
    }
}
