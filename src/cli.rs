//! CLI interface for diffscribe.

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod config;
pub mod generate;

/// diffscribe: commit messages, branch names and merge request text from a diff.
#[derive(Parser)]
#[command(name = "diffscribe")]
#[command(
    about = "Generate commit messages, branch names and merge request text from a diff",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// The main command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Main command categories.
#[derive(Subcommand)]
pub enum Commands {
    /// Generates a commit message, branch name, description and title.
    Generate(generate::GenerateCommand),
    /// Configuration and model information.
    Config(config::ConfigCommand),
}

impl Cli {
    /// Executes the CLI command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Generate(cmd) => cmd.execute().await,
            Commands::Config(cmd) => cmd.execute().await,
        }
    }
}
