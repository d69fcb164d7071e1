//! Normalisation of raw model output into structured generation results.

use serde::Deserialize;
use tracing::warn;

use crate::data::BatchGenerationResult;
use crate::llm::error::LlmError;

/// What a chat completion returned, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelOutput {
    /// The model invoked the structured-output tool.
    ToolCall {
        /// Raw JSON arguments of the tool invocation.
        arguments: String,
        /// Message content sent alongside the tool call, if any.
        content: Option<String>,
    },
    /// The model answered with free text only.
    Text(String),
}

/// Required fields of the structured-output tool.
#[derive(Debug, Deserialize)]
struct RawGeneration {
    commit: String,
    branch: String,
    description: String,
    title: String,
}

/// Parses model output into a [`BatchGenerationResult`].
///
/// Tool-call arguments are preferred; free text is parsed after stripping
/// a surrounding fenced code block. `stage` names the processing step in
/// the error returned when the JSON cannot be parsed.
pub fn parse_generation_output(
    output: &ModelOutput,
    stage: &str,
) -> Result<BatchGenerationResult, LlmError> {
    let json = match output {
        ModelOutput::ToolCall { arguments, content } => {
            if let Some(text) = content.as_deref().filter(|c| !c.trim().is_empty()) {
                warn!(
                    stage,
                    content_len = text.len(),
                    "Model returned message content alongside the tool call; using tool arguments"
                );
            }
            arguments.as_str()
        }
        ModelOutput::Text(text) => strip_code_fence(text),
    };

    let raw: RawGeneration =
        serde_json::from_str(json).map_err(|e| LlmError::ResponseParsingFailed {
            stage: stage.to_string(),
            reason: e.to_string(),
        })?;

    Ok(normalize(raw))
}

/// Removes a leading ```` ```json ```` / ```` ``` ```` fence and its closing
/// fence, if present.
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

fn normalize(raw: RawGeneration) -> BatchGenerationResult {
    BatchGenerationResult {
        commit: raw.commit.trim().to_string(),
        branch: normalize_branch(&raw.branch),
        description: unescape_newlines(&raw.description).trim().to_string(),
        title: unescape_newlines(&raw.title).trim().to_string(),
    }
}

/// Turns literal `\n` sequences into real newlines.
fn unescape_newlines(text: &str) -> String {
    text.replace("\\n", "\n")
}

/// Collapses whitespace runs inside a branch name into single dashes.
fn normalize_branch(branch: &str) -> String {
    branch.split_whitespace().collect::<Vec<_>>().join("-")
}
