//! Generation invoker: one model call per diff, batch or merge.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::data::{BatchGenerationResult, Language};
use crate::diff::DiffChunk;
use crate::llm::ai::{AiClient, AiClientMetadata};
use crate::llm::output::parse_generation_output;
use crate::llm::prompts::{self, PromptScope};

/// Stage name reported when a full-diff response cannot be parsed.
pub const STAGE_FULL: &str = "full diff analysis";

/// Stage name reported when a merge response cannot be parsed.
pub const STAGE_MERGE: &str = "batch merge";

/// Builds prompts, dispatches them to an [`AiClient`] and parses the
/// structured result.
pub struct GenerationClient {
    ai_client: Box<dyn AiClient>,
}

impl GenerationClient {
    /// Creates a client over any AI backend.
    pub fn new(ai_client: Box<dyn AiClient>) -> Self {
        Self { ai_client }
    }

    /// Returns metadata about the underlying AI client.
    pub fn metadata(&self) -> AiClientMetadata {
        self.ai_client.get_metadata()
    }

    /// Returns the underlying AI client, e.g. for context-limit probing.
    pub fn ai_client(&self) -> &dyn AiClient {
        self.ai_client.as_ref()
    }

    /// Analyses a whole diff in one request.
    pub async fn generate_full(
        &self,
        diff: &str,
        language: Language,
    ) -> Result<BatchGenerationResult> {
        let uses_tools = self.metadata().uses_tools;
        let scope = PromptScope::FullDiff;
        let system_prompt = prompts::generate_system_prompt(language, &scope, uses_tools);
        let user_prompt = prompts::generate_user_prompt(diff, &scope);

        info!(diff_len = diff.len(), %language, "Generating from full diff");
        self.dispatch(&system_prompt, &user_prompt, STAGE_FULL).await
    }

    /// Analyses one packed batch. `index` is 1-based.
    pub async fn generate_batch(
        &self,
        chunk: &DiffChunk,
        index: usize,
        total: usize,
        language: Language,
    ) -> Result<BatchGenerationResult> {
        let uses_tools = self.metadata().uses_tools;
        let scope = PromptScope::Batch {
            index,
            total,
            files: &chunk.files,
        };
        let system_prompt = prompts::generate_system_prompt(language, &scope, uses_tools);
        let user_prompt = prompts::generate_user_prompt(&chunk.content, &scope);

        debug!(
            batch = index,
            total,
            files = chunk.files.len(),
            tokens = chunk.token_count,
            "Generating batch"
        );
        let stage = format!("batch {index}/{total}");
        self.dispatch(&system_prompt, &user_prompt, &stage).await
    }

    /// Asks the model to merge several batch results into one.
    pub async fn merge(
        &self,
        results: &[BatchGenerationResult],
        language: Language,
    ) -> Result<BatchGenerationResult> {
        let uses_tools = self.metadata().uses_tools;
        let system_prompt = prompts::generate_merge_system_prompt(language, uses_tools);
        let user_prompt = prompts::generate_merge_user_prompt(results);

        info!(batches = results.len(), "Merging batch results");
        self.dispatch(&system_prompt, &user_prompt, STAGE_MERGE).await
    }

    async fn dispatch(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        stage: &str,
    ) -> Result<BatchGenerationResult> {
        let output = self
            .ai_client
            .send_request(system_prompt, user_prompt)
            .await
            .with_context(|| format!("Model request failed during {stage}"))?;
        Ok(parse_generation_output(&output, stage)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::llm::error::LlmError;
    use crate::llm::output::ModelOutput;
    use crate::llm::test_utils::{tool_output, ConfigurableMockAiClient};

    fn client_with(responses: Vec<Result<ModelOutput>>) -> (GenerationClient, crate::llm::test_utils::PromptRecordHandle) {
        let mock = ConfigurableMockAiClient::new(responses);
        let prompts = mock.prompt_handle();
        (GenerationClient::new(Box::new(mock)), prompts)
    }

    #[tokio::test]
    async fn generate_full_parses_tool_call() {
        let (client, prompts) = client_with(vec![Ok(tool_output(
            "feat(api): add login",
            "feat/add-login",
            "## What changed\n- login",
            "Add login",
        ))]);

        let result = client
            .generate_full("diff --git a/x b/x\n+y\n", Language::English)
            .await
            .unwrap();
        assert_eq!(result.commit, "feat(api): add login");
        assert_eq!(result.branch, "feat/add-login");

        assert_eq!(prompts.request_count(), 1);
        let (system, user) = &prompts.prompts()[0];
        assert!(system.contains("in English"));
        assert!(user.contains("+y"));
    }

    #[tokio::test]
    async fn generate_batch_prompts_carry_scope() {
        let (client, prompts) = client_with(vec![Ok(tool_output("fix: a", "fix/a", "d", "t"))]);
        let chunk = DiffChunk {
            content: "diff --git a/a.rs b/a.rs\n+a\n".to_string(),
            files: vec!["a.rs".to_string()],
            token_count: 10,
        };
        client
            .generate_batch(&chunk, 2, 4, Language::English)
            .await
            .unwrap();

        let (system, user) = &prompts.prompts()[0];
        assert!(system.contains("batch 2 of 4"));
        assert!(user.contains("- a.rs"));
    }

    #[tokio::test]
    async fn parse_failure_names_stage() {
        let (client, _) = client_with(vec![Ok(ModelOutput::Text("not json".to_string()))]);
        let chunk = DiffChunk::default();
        let err = client
            .generate_batch(&chunk, 3, 5, Language::English)
            .await
            .unwrap_err();
        match err.downcast_ref::<LlmError>() {
            Some(LlmError::ResponseParsingFailed { stage, .. }) => assert_eq!(stage, "batch 3/5"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_error_propagates() {
        let (client, _) = client_with(vec![Err(anyhow::anyhow!("connection reset"))]);
        let err = client.generate_full("+x", Language::English).await.unwrap_err();
        assert!(format!("{err:#}").contains("connection reset"));
        assert!(err.to_string().contains(STAGE_FULL));
    }

    #[tokio::test]
    async fn merge_sends_every_result() {
        let (client, prompts) = client_with(vec![Ok(tool_output(
            "feat: merged",
            "feat/merged",
            "all",
            "Merged",
        ))]);
        let parts = vec![
            BatchGenerationResult {
                commit: "feat: one".to_string(),
                branch: "feat/one".to_string(),
                description: "first".to_string(),
                title: "One".to_string(),
            },
            BatchGenerationResult {
                commit: "fix: two".to_string(),
                branch: "fix/two".to_string(),
                description: "second".to_string(),
                title: "Two".to_string(),
            },
        ];
        let merged = client.merge(&parts, Language::French).await.unwrap();
        assert_eq!(merged.title, "Merged");

        let (system, user) = &prompts.prompts()[0];
        assert!(system.contains("in French"));
        assert!(user.contains("feat: one"));
        assert!(user.contains("fix: two"));
    }
}
