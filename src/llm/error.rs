//! LLM-specific error handling.

use thiserror::Error;

/// Errors raised by the chat-completion transport and response handling.
#[derive(Error, Debug)]
pub enum LlmError {
    /// API key not found in environment variables or settings.
    #[error("LLM API key not found. Set DIFFSCRIBE_API_KEY or OPENAI_API_KEY")]
    ApiKeyNotFound,

    /// The API answered with a non-success status.
    #[error("LLM API request failed: {0}")]
    ApiRequestFailed(String),

    /// The request exceeded the model's context window.
    #[error("Context length exceeded: {0}")]
    ContextLengthExceeded(String),

    /// Invalid response format from the API.
    #[error("Invalid response format from LLM API: {0}")]
    InvalidResponseFormat(String),

    /// The model output could not be turned into a structured result.
    #[error("Failed to parse model output during {stage}: {reason}")]
    ResponseParsingFailed {
        /// Processing stage that failed (e.g. "batch 2/5 generation").
        stage: String,
        /// Underlying parse failure.
        reason: String,
    },

    /// Network connectivity error.
    #[error("Network error: {0}")]
    NetworkError(String),
}
