//! Process command handler.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use color_eyre::Result;
use tokio_util::sync::CancellationToken;

use crate::context::{AppWriter, Context};
use crate::declarations::load_sources;
use crate::di::FromRef;
use crate::processor::Processor;
use crate::writer::{FileSystemWriter, StdoutWriter};

use super::App;

/// Arguments for `backstab process`.
#[derive(Args)]
pub struct ProcessArgs {
    /// Kotlin sources, JSON symbol dumps, or directories holding them
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output root, overriding `output.directory`
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Print generated modules instead of writing them
    #[arg(long)]
    pub dry_run: bool,

    /// Maximum number of declarations processed at once
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

impl App {
    /// Run the process command over every discovered component.
    pub async fn run_process(&self, args: &ProcessArgs) -> Result<()> {
        let mut config = self.load_config()?;
        if let Some(out) = &args.out {
            config.output.directory = out.clone();
        }
        if let Some(jobs) = args.jobs {
            config.processor.max_concurrency = jobs;
        }

        let loaded = load_sources(&args.inputs)?;
        for rejected in &loaded.rejected {
            tracing::error!(
                code = rejected.error.code(),
                "{}: {}",
                rejected.path.display(),
                rejected.error
            );
        }
        let rejected = loaded.rejected.len();

        let table = Arc::new(loaded.table);
        let handles = table.discover(&config.framework.trigger);
        if handles.is_empty() && rejected == 0 {
            tracing::warn!(
                "No declarations annotated with @{} found",
                config.framework.trigger
            );
            return Ok(());
        }

        let writer: AppWriter = if args.dry_run {
            Arc::new(StdoutWriter::new())
        } else {
            tracing::info!("Writing modules to {}", config.output.directory.display());
            Arc::new(FileSystemWriter::new(&config.output.directory))
        };
        let ctx = Context::new(config, writer);
        let processor = Processor::from_ref(&ctx);

        // Ctrl-C cancels whatever has not been written yet.
        let token = CancellationToken::new();
        let interrupt = tokio::spawn({
            let token = token.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupted, cancelling remaining declarations");
                    token.cancel();
                }
            }
        });

        let report = processor.process_with_cancellation(handles, token).await;
        interrupt.abort();

        for failure in &report.failures {
            tracing::error!(code = failure.error.code(), "{}: {}", failure.origin, failure.error);
        }

        if report.is_success() && rejected == 0 {
            tracing::info!("Generated {} modules", report.written.len());
            Ok(())
        } else {
            Err(color_eyre::eyre::eyre!(
                "{} source files rejected, {} declarations failed and {} were cancelled ({} written)",
                rejected,
                report.failures.len(),
                report.cancelled.len(),
                report.written.len()
            ))
        }
    }
}
