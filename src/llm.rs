//! LLM access: context limits, token budgets, prompts and the generation client.

pub mod ai;
pub mod client;
pub mod context_limit;
pub mod error;
pub mod output;
pub mod prompts;
pub mod token_budget;

#[cfg(test)]
pub(crate) mod test_utils;

pub use client::GenerationClient;
pub use context_limit::{ContextLimitCache, ContextLimitResolver, ProbePolicy};
pub use error::LlmError;
