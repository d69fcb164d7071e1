//! Shared test utilities for the `llm` module.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::llm::ai::{AiClient, AiClientMetadata};
use crate::llm::output::ModelOutput;

/// Mock AI client with pre-programmed queues of responses.
///
/// Generation responses and probe results are returned in FIFO order.
/// When a queue is exhausted, subsequent calls return an error.
///
/// Every call to [`send_request`](AiClient::send_request) records the
/// `(system_prompt, user_prompt)` pair and every probe records its
/// candidate size, so tests can inspect what was dispatched after the
/// client has been moved into a
/// [`GenerationClient`](super::client::GenerationClient).
pub(crate) struct ConfigurableMockAiClient {
    responses: Arc<Mutex<VecDeque<Result<ModelOutput>>>>,
    probe_results: Arc<Mutex<VecDeque<Result<()>>>>,
    metadata: AiClientMetadata,
    recorded_prompts: Arc<Mutex<Vec<(String, String)>>>,
    probed_candidates: Arc<Mutex<Vec<usize>>>,
}

impl ConfigurableMockAiClient {
    /// Creates a new mock client that will return the given responses in order.
    pub(crate) fn new(responses: Vec<Result<ModelOutput>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            probe_results: Arc::new(Mutex::new(VecDeque::new())),
            metadata: AiClientMetadata {
                provider: "Mock".to_string(),
                model: "mock-model".to_string(),
                uses_tools: true,
            },
            recorded_prompts: Arc::new(Mutex::new(Vec::new())),
            probed_candidates: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns a new mock client with queued probe outcomes.
    pub(crate) fn with_probe_results(mut self, results: Vec<Result<()>>) -> Self {
        self.probe_results = Arc::new(Mutex::new(VecDeque::from(results)));
        self
    }

    /// Returns a new mock client reporting a different model name.
    pub(crate) fn with_model(mut self, model: &str) -> Self {
        self.metadata.model = model.to_string();
        self
    }

    /// Returns a handle for inspecting the response queue.
    pub(crate) fn response_handle(&self) -> ResponseQueueHandle {
        ResponseQueueHandle {
            responses: self.responses.clone(),
        }
    }

    /// Returns a handle for inspecting which prompts were sent.
    pub(crate) fn prompt_handle(&self) -> PromptRecordHandle {
        PromptRecordHandle {
            recorded_prompts: self.recorded_prompts.clone(),
        }
    }

    /// Returns a handle for inspecting which probe sizes were tried.
    pub(crate) fn probe_handle(&self) -> ProbeRecordHandle {
        ProbeRecordHandle {
            probed_candidates: self.probed_candidates.clone(),
        }
    }
}

/// Builds a tool-call output carrying the four result fields.
pub(crate) fn tool_output(commit: &str, branch: &str, description: &str, title: &str) -> ModelOutput {
    ModelOutput::ToolCall {
        arguments: serde_json::json!({
            "commit": commit,
            "branch": branch,
            "description": description,
            "title": title,
        })
        .to_string(),
        content: None,
    }
}

/// Shared handle to a mock client's response queue.
pub(crate) struct ResponseQueueHandle {
    responses: Arc<Mutex<VecDeque<Result<ModelOutput>>>>,
}

impl ResponseQueueHandle {
    /// Returns the number of unconsumed responses remaining in the queue.
    pub(crate) fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

/// Shared handle to a mock client's recorded prompts.
pub(crate) struct PromptRecordHandle {
    recorded_prompts: Arc<Mutex<Vec<(String, String)>>>,
}

impl PromptRecordHandle {
    /// Returns all recorded `(system_prompt, user_prompt)` pairs.
    pub(crate) fn prompts(&self) -> Vec<(String, String)> {
        self.recorded_prompts.lock().unwrap().clone()
    }

    /// Returns the number of AI requests that were made.
    pub(crate) fn request_count(&self) -> usize {
        self.recorded_prompts.lock().unwrap().len()
    }
}

/// Shared handle to a mock client's recorded probes.
pub(crate) struct ProbeRecordHandle {
    probed_candidates: Arc<Mutex<Vec<usize>>>,
}

impl ProbeRecordHandle {
    /// Returns every candidate size probed, in order.
    pub(crate) fn probed_candidates(&self) -> Vec<usize> {
        self.probed_candidates.lock().unwrap().clone()
    }
}

impl AiClient for ConfigurableMockAiClient {
    fn send_request<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ModelOutput>> + Send + 'a>> {
        let responses = self.responses.clone();
        let recorded = self.recorded_prompts.clone();
        let sys = system_prompt.to_string();
        let usr = user_prompt.to_string();
        Box::pin(async move {
            recorded.lock().unwrap().push((sys, usr));
            responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("no more mock responses")))
        })
    }

    fn probe_context<'a>(
        &'a self,
        candidate_tokens: usize,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        let results = self.probe_results.clone();
        let probed = self.probed_candidates.clone();
        Box::pin(async move {
            probed.lock().unwrap().push(candidate_tokens);
            results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("no more mock probe results")))
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        self.metadata.clone()
    }
}
