//! # diffscribe
//!
//! Generates conventional commit messages, branch names and merge request
//! descriptions from a unified diff using an OpenAI-compatible chat API.
//!
//! Large diffs are split per file, packed into batches that fit the model's
//! context window, analysed batch by batch and merged into one result.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use diffscribe::config::LlmConfig;
//! use diffscribe::llm::ContextLimitCache;
//! use diffscribe::pipeline::GenerationPipeline;
//!
//! # async fn run(diff: &str) -> anyhow::Result<()> {
//! let config = LlmConfig::load(None)?;
//! let pipeline = GenerationPipeline::from_config(&config, ContextLimitCache::new())?;
//! let result = pipeline.run(diff, config.language).await?;
//! println!("{result}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod data;
pub mod diff;
pub mod llm;
pub mod pipeline;
pub mod utils;

pub use crate::cli::Cli;

/// The current version of diffscribe.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
