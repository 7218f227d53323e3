//! CLI module for Backstab.
//!
//! Subcommands:
//! - `process`: Generate aggregate modules for every `@Backstab` component
//! - `parse`: Print the parsed component models as JSON
//! - `generate`: Render one component model to stdout

mod generate;
mod parse;
mod process;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

pub use process::ProcessArgs;

/// Backstab - aggregate Dagger modules for Kotlin components
#[derive(Parser)]
#[command(name = "backstab")]
#[command(about = "Generates aggregate Dagger modules for annotated Kotlin components")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Read configuration from this file instead of the user and project files
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Discover components, generate their modules and write them out
    Process(ProcessArgs),

    /// Print discovered components as JSON models
    Parse {
        /// Kotlin sources, JSON symbol dumps, or directories holding them
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Render a JSON component model to stdout
    Generate {
        /// Path to a JSON-encoded component
        input: PathBuf,
    },
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match &self.command {
            Command::Process(args) => self.run_process(args).await,
            Command::Parse { inputs } => self.run_parse(inputs),
            Command::Generate { input } => self.run_generate(input),
        }
    }

    fn load_config(&self) -> color_eyre::Result<Config> {
        let config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        Ok(config)
    }
}
