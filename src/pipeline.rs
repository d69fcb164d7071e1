//! Diff-to-generation pipeline.
//!
//! Validates the diff, resolves the model's context limit and either sends
//! the whole diff in one request or splits it per file, packs the files
//! into budget-sized batches, analyses each batch and merges the results.

pub mod aggregate;
pub mod error;
pub mod validate;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::LlmConfig;
use crate::data::{CommitGenerationResult, Language};
use crate::diff::{pack, split_by_file, DiffChunk};
use crate::llm::ai::openai::OpenAiClient;
use crate::llm::client::GenerationClient;
use crate::llm::context_limit::{ContextLimitCache, ContextLimitResolver};
use crate::llm::token_budget::{estimate_tokens, TokenBudget};

pub use error::PipelineError;
pub use validate::{validate_diff, MAX_DIFF_BYTES};

/// Smallest per-batch budget used when the reserve swallows the whole
/// context window.
const MIN_BATCH_TOKENS: usize = 256;

/// Runs diffs through the generation client with a shared limit resolver.
pub struct GenerationPipeline {
    client: GenerationClient,
    resolver: ContextLimitResolver,
}

impl GenerationPipeline {
    /// Creates a pipeline from its parts.
    pub fn new(client: GenerationClient, resolver: ContextLimitResolver) -> Self {
        Self { client, resolver }
    }

    /// Creates a pipeline talking to the configured OpenAI-compatible
    /// endpoint.
    pub fn from_config(config: &LlmConfig, cache: ContextLimitCache) -> Result<Self> {
        let ai_client = OpenAiClient::from_config(config)?;
        let resolver = ContextLimitResolver::new(cache, config.probe_policy)?;
        Ok(Self::new(
            GenerationClient::new(Box::new(ai_client)),
            resolver,
        ))
    }

    /// Produces a commit message, branch name, description and title for
    /// `diff`.
    ///
    /// Fails on invalid input, empty segmentation or packing, and when
    /// every batch request fails. A diff that fits the budget is sent in
    /// one request whose failure propagates directly.
    pub async fn run(&self, diff: &str, language: Language) -> Result<CommitGenerationResult> {
        validate_diff(diff)?;

        let metadata = self.client.metadata();
        let model = metadata.model;
        let resolved = self
            .resolver
            .resolve(&model, Some(self.client.ai_client()))
            .await;
        let budget = TokenBudget::new(resolved.limit);
        let available = budget.available_tokens();
        let diff_tokens = estimate_tokens(diff);

        info!(
            provider = %metadata.provider,
            model = %model,
            limit = resolved.limit,
            source = %resolved.source,
            available,
            estimated_tokens = diff_tokens,
            "Planning generation"
        );

        if diff_tokens <= available {
            let result = self.client.generate_full(diff, language).await?;
            return Ok(result.into());
        }

        let batch_budget = if available == 0 {
            warn!(
                limit = resolved.limit,
                reserved = budget.reserved_tokens(),
                "Context limit leaves no room for diff content, using minimum batch size"
            );
            MIN_BATCH_TOKENS
        } else {
            available
        };

        let units = split_by_file(diff);
        if units.is_empty() {
            return Err(PipelineError::NoDiffUnits.into());
        }

        let chunks = pack(&units, batch_budget);
        if chunks.is_empty() {
            return Err(PipelineError::NoChunks.into());
        }
        info!(
            files = units.len(),
            batches = chunks.len(),
            batch_budget,
            "Diff exceeds budget, processing in batches"
        );

        self.run_batches(&chunks, language).await
    }

    /// Analyses each chunk in order, tolerating individual failures, then
    /// aggregates the successes.
    async fn run_batches(
        &self,
        chunks: &[DiffChunk],
        language: Language,
    ) -> Result<CommitGenerationResult> {
        let total = chunks.len();
        let mut successes = Vec::with_capacity(total);
        let mut failed = 0;

        for (i, chunk) in chunks.iter().enumerate() {
            let index = i + 1;
            match self
                .client
                .generate_batch(chunk, index, total, language)
                .await
            {
                Ok(result) => {
                    debug!(batch = index, commit = %result.commit, "Batch succeeded");
                    successes.push(result);
                }
                Err(e) => {
                    failed += 1;
                    let error = format!("{e:#}");
                    warn!(
                        batch = index,
                        total,
                        files = ?chunk.files,
                        %error,
                        "Batch failed, continuing with remaining batches"
                    );
                }
            }
        }

        if successes.is_empty() {
            return Err(PipelineError::AllBatchesFailed { failed }.into());
        }
        if failed > 0 {
            warn!(
                failed,
                succeeded = successes.len(),
                "Some batches failed, aggregating partial results"
            );
        }

        aggregate::aggregate(&self.client, successes, language).await
    }
}
