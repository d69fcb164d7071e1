//! The `generate` command.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use crate::config::LlmConfig;
use crate::data::{CommitGenerationResult, Language};
use crate::llm::context_limit::ContextLimitCache;
use crate::pipeline::GenerationPipeline;

/// How the result is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Labelled plain-text sections.
    #[default]
    Text,
    /// Pretty-printed JSON object.
    Json,
}

/// Generates a commit message, branch name, description and title.
#[derive(Parser)]
pub struct GenerateCommand {
    /// Reads the diff from this file instead of stdin.
    #[arg(long, value_name = "PATH")]
    pub diff_file: Option<PathBuf>,

    /// Output language code (en, zh-cn, zh-tw, ja, ko, fr, de, es, ru, pt, it).
    #[arg(long, value_name = "CODE")]
    pub language: Option<String>,

    /// AI model to use (overrides environment configuration).
    #[arg(long)]
    pub model: Option<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl GenerateCommand {
    /// Executes the generate command.
    pub async fn execute(self) -> Result<()> {
        let config = LlmConfig::load(self.model.as_deref())?;
        let language = self
            .language
            .as_deref()
            .map_or(config.language, Language::from_code);
        let diff = self.read_diff()?;

        let pipeline = GenerationPipeline::from_config(&config, ContextLimitCache::new())?;
        let result = pipeline.run(&diff, language).await?;

        println!("{}", render(&result, self.format)?);
        Ok(())
    }

    fn read_diff(&self) -> Result<String> {
        match &self.diff_file {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read diff file: {}", path.display())),
            None => {
                let mut diff = String::new();
                io::stdin()
                    .read_to_string(&mut diff)
                    .context("Failed to read diff from stdin")?;
                Ok(diff)
            }
        }
    }
}

/// Formats a result for stdout.
fn render(result: &CommitGenerationResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(result.to_string()),
        OutputFormat::Json => {
            serde_json::to_string_pretty(result).context("Failed to serialize result to JSON")
        }
    }
}
