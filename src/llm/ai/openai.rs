//! OpenAI-compatible chat-completion client (OpenAI, DeepSeek, Qwen, Moonshot,
//! self-hosted gateways).

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{check_error_response, AiClient, AiClientMetadata};
use crate::config::LlmConfig;
use crate::llm::error::LlmError;
use crate::llm::output::ModelOutput;

/// HTTP request timeout for generation calls.
///
/// Large diffs can take minutes to analyse; the timeout only guards against
/// indefinite hangs.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Abort timeout for each context-limit probe.
pub(crate) const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Name of the structured-output tool the model is forced to call.
pub const OUTPUT_TOOL_NAME: &str = "output_with_json";

/// Word used to pad probe requests; roughly one token each.
const PROBE_PADDING_WORD: &str = "test ";

/// Chat message.
#[derive(Serialize, Debug)]
struct Message {
    role: &'static str,
    content: String,
}

/// Chat-completion request body.
#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

/// Declared callable tool.
#[derive(Serialize, Debug)]
struct ToolDefinition {
    #[serde(rename = "type")]
    kind: &'static str,
    function: FunctionDefinition,
}

#[derive(Serialize, Debug)]
struct FunctionDefinition {
    name: &'static str,
    description: &'static str,
    parameters: Value,
}

/// Forces the model to call one named tool.
#[derive(Serialize, Debug)]
struct ToolChoice {
    #[serde(rename = "type")]
    kind: &'static str,
    function: ToolChoiceFunction,
}

#[derive(Serialize, Debug)]
struct ToolChoiceFunction {
    name: &'static str,
}

/// Chat-completion response.
#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<Choice>,
    model: Option<String>,
    usage: Option<Usage>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: Option<ResponseMessage>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Deserialize, Debug)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Deserialize, Debug)]
struct FunctionCall {
    name: String,
    arguments: String,
}

/// Token usage statistics.
#[derive(Deserialize, Debug)]
#[allow(dead_code)]
struct Usage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
    total_tokens: Option<u64>,
}

/// Builds the structured-output tool declaration.
fn output_tool() -> ToolDefinition {
    ToolDefinition {
        kind: "function",
        function: FunctionDefinition {
            name: OUTPUT_TOOL_NAME,
            description: "Return the generated commit message, branch name, merge request description and title",
            parameters: json!({
                "type": "object",
                "properties": {
                    "commit": { "type": "string", "description": "Conventional commit message" },
                    "branch": { "type": "string", "description": "Branch name in type/kebab-case, English only" },
                    "description": { "type": "string", "description": "Markdown merge request description" },
                    "title": { "type": "string", "description": "Short merge request title" }
                },
                "required": ["commit", "branch", "description", "title"]
            }),
        },
    }
}

fn forced_tool_choice() -> ToolChoice {
    ToolChoice {
        kind: "function",
        function: ToolChoiceFunction {
            name: OUTPUT_TOOL_NAME,
        },
    }
}

/// OpenAI-compatible chat-completion client.
pub struct OpenAiClient {
    /// HTTP client for API requests.
    client: Client,
    /// Bearer token.
    api_key: String,
    /// Model identifier.
    model: String,
    /// Base URL including the version prefix (e.g. "https://api.openai.com/v1").
    base_url: String,
    /// Sampling temperature.
    temperature: f32,
    /// Whether to declare and force the structured-output tool.
    use_tools: bool,
}

impl OpenAiClient {
    /// Creates a new OpenAI-compatible client.
    pub fn new(
        model: String,
        api_key: String,
        base_url: String,
        temperature: f32,
        use_tools: bool,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url,
            temperature,
            use_tools,
        })
    }

    /// Creates a client from resolved configuration.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Self::new(
            config.model.clone(),
            config.api_key.clone(),
            config.base_url.clone(),
            config.temperature,
            config.use_tools,
        )
    }

    /// Builds the full API URL.
    fn get_api_url(&self) -> String {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        debug!(base_url = %self.base_url, full_url = %url, "Constructed chat completions URL");
        url
    }

    /// Posts a request body and returns the raw successful response.
    async fn post(&self, request: &ChatRequest<'_>, timeout: Option<Duration>) -> Result<reqwest::Response> {
        let mut builder = self
            .client
            .post(self.get_api_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        check_error_response(response).await
    }

    /// Extracts the model output from the first choice.
    fn extract_output(response: ChatResponse) -> Result<ModelOutput> {
        debug!(
            choice_count = response.choices.len(),
            model = ?response.model,
            usage = ?response.usage,
            "Received chat completion response"
        );

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            LlmError::InvalidResponseFormat("No choices in response".to_string())
        })?;
        debug!(finish_reason = ?choice.finish_reason, "First choice finish reason");

        let message = choice.message.ok_or_else(|| {
            LlmError::InvalidResponseFormat("Choice has no message".to_string())
        })?;

        let tool_call = message.tool_calls.and_then(|calls| {
            let mut calls = calls.into_iter();
            let first = calls.next()?;
            if first.function.name == OUTPUT_TOOL_NAME {
                Some(first)
            } else {
                calls
                    .find(|c| c.function.name == OUTPUT_TOOL_NAME)
                    .or(Some(first))
            }
        });

        match (tool_call, message.content) {
            (Some(call), content) => Ok(ModelOutput::ToolCall {
                arguments: call.function.arguments,
                content,
            }),
            (None, Some(content)) => Ok(ModelOutput::Text(content)),
            (None, None) => Err(LlmError::InvalidResponseFormat(
                "Message has neither tool calls nor content".to_string(),
            )
            .into()),
        }
    }
}

impl AiClient for OpenAiClient {
    fn send_request<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ModelOutput>> + Send + 'a>> {
        Box::pin(async move {
            debug!(
                system_prompt_len = system_prompt.len(),
                user_prompt_len = user_prompt.len(),
                model = %self.model,
                use_tools = self.use_tools,
                "Preparing chat completion request"
            );

            let request = ChatRequest {
                model: &self.model,
                messages: vec![
                    Message {
                        role: "system",
                        content: system_prompt.to_string(),
                    },
                    Message {
                        role: "user",
                        content: user_prompt.to_string(),
                    },
                ],
                temperature: self.temperature,
                max_tokens: None,
                tools: self.use_tools.then(|| vec![output_tool()]),
                tool_choice: self.use_tools.then(forced_tool_choice),
            };

            info!(model = %self.model, "Sending chat completion request");
            let response = self.post(&request, None).await?;

            let chat_response: ChatResponse = response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponseFormat(e.to_string()))?;

            Self::extract_output(chat_response)
        })
    }

    fn probe_context<'a>(
        &'a self,
        candidate_tokens: usize,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let padding = PROBE_PADDING_WORD.repeat(candidate_tokens * 8 / 10);
            let request = ChatRequest {
                model: &self.model,
                messages: vec![Message {
                    role: "user",
                    content: format!("{padding}\nReply with OK."),
                }],
                temperature: 0.0,
                max_tokens: Some(1),
                tools: None,
                tool_choice: None,
            };

            debug!(model = %self.model, candidate_tokens, "Sending context limit probe");
            self.post(&request, Some(PROBE_TIMEOUT)).await?;
            Ok(())
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        AiClientMetadata {
            provider: "OpenAI-compatible".to_string(),
            model: self.model.clone(),
            uses_tools: self.use_tools,
        }
    }
}
