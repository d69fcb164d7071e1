//! Configuration-related CLI commands.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::LlmConfig;
use crate::llm::ai::openai::OpenAiClient;
use crate::llm::context_limit::{
    ContextLimitCache, ContextLimitResolver, ProbePolicy, ResolvedLimit, MODELS_YAML,
};
use crate::llm::token_budget::TokenBudget;

/// Configuration operations.
#[derive(Parser)]
pub struct ConfigCommand {
    /// Configuration subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigSubcommands,
}

/// Configuration subcommands.
#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Shows the embedded model limit table.
    Models,
    /// Shows the resolved context limit and token budget for a model.
    Limit(LimitCommand),
}

/// Limit command options.
#[derive(Parser)]
pub struct LimitCommand {
    /// Model identifier to resolve.
    pub model: String,

    /// Probes the configured endpoint when the model is not in the table.
    #[arg(long)]
    pub probe: bool,
}

impl ConfigCommand {
    /// Executes the config command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            ConfigSubcommands::Models => {
                println!("{MODELS_YAML}");
                Ok(())
            }
            ConfigSubcommands::Limit(cmd) => cmd.execute().await,
        }
    }
}

impl LimitCommand {
    /// Executes the limit command.
    pub async fn execute(self) -> Result<()> {
        let resolved = if self.probe {
            let config = LlmConfig::load(Some(&self.model))?;
            let client = OpenAiClient::from_config(&config)?;
            let resolver = ContextLimitResolver::new(ContextLimitCache::new(), ProbePolicy::Enabled)?;
            resolver.resolve(&self.model, Some(&client)).await
        } else {
            let resolver =
                ContextLimitResolver::new(ContextLimitCache::new(), ProbePolicy::Disabled)?;
            resolver.resolve(&self.model, None).await
        };

        println!("{}", format_limit_report(&self.model, &resolved));
        Ok(())
    }
}

fn format_limit_report(model: &str, resolved: &ResolvedLimit) -> String {
    let budget = TokenBudget::new(resolved.limit);
    format!(
        "Model:          {model}\n\
         Source:         {}\n\
         Context limit:  {}\n\
         Reserved:       {}\n\
         Available:      {}",
        resolved.source,
        budget.context_limit(),
        budget.reserved_tokens(),
        budget.available_tokens()
    )
}
