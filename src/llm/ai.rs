//! AI client trait and metadata definitions.

pub mod openai;

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;

use crate::llm::error::LlmError;
use crate::llm::output::ModelOutput;

/// Metadata about an AI client implementation.
#[derive(Clone, Debug)]
pub struct AiClientMetadata {
    /// Service provider name.
    pub provider: String,
    /// Model identifier.
    pub model: String,
    /// Whether requests declare and force the structured-output tool.
    pub uses_tools: bool,
}

// ── Shared helpers for AI client implementations ────────────────────

/// Phrases providers use when a request overflows the context window.
const CONTEXT_ERROR_MARKERS: [&str; 6] = [
    "context_length",
    "context length",
    "maximum context",
    "context window",
    "too many tokens",
    "too long",
];

/// Returns true when an error body reports a context-window overflow.
pub(crate) fn is_context_length_error(body: &str) -> bool {
    let lower = body.to_lowercase();
    CONTEXT_ERROR_MARKERS.iter().any(|m| lower.contains(m))
}

/// Checks an HTTP response for error status and returns a structured error
/// if non-success.
///
/// Context-window overflows map to [`LlmError::ContextLengthExceeded`],
/// everything else to [`LlmError::ApiRequestFailed`].
pub(crate) async fn check_error_response(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response.text().await.unwrap_or_else(|e| {
        tracing::debug!("Failed to read error response body: {e}");
        String::new()
    });
    if is_context_length_error(&error_text) {
        return Err(LlmError::ContextLengthExceeded(format!("HTTP {status}: {error_text}")).into());
    }
    Err(LlmError::ApiRequestFailed(format!("HTTP {status}: {error_text}")).into())
}

/// Trait for AI service clients.
pub trait AiClient: Send + Sync {
    /// Sends a system/user prompt pair and returns the model's output.
    fn send_request<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ModelOutput>> + Send + 'a>>;

    /// Sends a minimal request padded to roughly 80% of `candidate_tokens`.
    ///
    /// Succeeds only if the API accepted the request.
    fn probe_context<'a>(
        &'a self,
        candidate_tokens: usize,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    /// Returns metadata about the AI client implementation.
    fn get_metadata(&self) -> AiClientMetadata;
}
