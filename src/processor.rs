//! Batch orchestration: parse, generate and write every discovered component.
//!
//! Each declaration runs through its own pipeline task. Pipelines are
//! independent: a failure is recorded against the declaration that caused
//! it and the rest of the batch carries on. Concurrency is bounded by a
//! semaphore sized from `processor.max_concurrency`.
//!
//! # Example
//!
//! ```ignore
//! let processor = Processor::from_ref(&ctx);
//! let report = processor.process(table.discover(&trigger)).await;
//! for failure in &report.failures {
//!     eprintln!("{}: {}", failure.origin, failure.error);
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::context::{AppGenerator, AppParser, AppWriter, Context};
use crate::declarations::{DeclarationHandle, DeclarationOrigin};
use crate::di::FromContext;
use crate::error::AppError;
use crate::generator::GeneratedModule;

// ============================================================================
// Report Types
// ============================================================================

/// A module written for one declaration.
#[derive(Debug, Clone)]
pub struct WrittenModule {
    pub origin: DeclarationOrigin,
    /// Fully-qualified name of the generated module.
    pub module: String,
    /// Where the writer put it.
    pub location: PathBuf,
}

/// A declaration that could not be processed.
#[derive(Debug)]
pub struct DeclarationFailure {
    pub origin: DeclarationOrigin,
    pub error: AppError,
}

/// Outcome of a batch, each list in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: Vec<WrittenModule>,
    pub failures: Vec<DeclarationFailure>,
    /// Declarations whose pipeline was cancelled before writing.
    pub cancelled: Vec<DeclarationOrigin>,
}

impl BatchReport {
    /// True when every declaration was written.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.cancelled.is_empty()
    }
}

enum Outcome {
    Written(WrittenModule),
    Failed(AppError),
    Cancelled,
}

// ============================================================================
// Processor
// ============================================================================

/// Runs the parse → generate → write pipeline over a batch of declarations.
#[derive(FromContext, Clone)]
pub struct Processor {
    config: Arc<Config>,
    parser: AppParser,
    generator: AppGenerator,
    writer: AppWriter,
}

impl Processor {
    /// Processes every handle and waits for all of them to finish.
    pub async fn process(&self, handles: Vec<DeclarationHandle>) -> BatchReport {
        self.process_with_cancellation(handles, CancellationToken::new())
            .await
    }

    /// Like [`process`](Self::process), stopping early once `token` is
    /// cancelled.
    ///
    /// Pipelines that have not handed their module to the writer by then
    /// are reported as cancelled. A module already handed to the writer is
    /// always written to completion.
    pub async fn process_with_cancellation(
        &self,
        handles: Vec<DeclarationHandle>,
        token: CancellationToken,
    ) -> BatchReport {
        let permits = self.config.processor.max_concurrency.max(1);
        let semaphore = Arc::new(Semaphore::new(permits));
        let origins: Vec<DeclarationOrigin> = handles.iter().map(|h| h.origin()).collect();

        tracing::info!(
            "Processing {} declarations with up to {} in flight",
            handles.len(),
            permits
        );

        let mut tasks = JoinSet::new();
        for (index, handle) in handles.into_iter().enumerate() {
            let pipeline = self.clone();
            let semaphore = semaphore.clone();
            let token = token.clone();

            tasks.spawn(async move {
                let prepared = tokio::select! {
                    biased;
                    _ = token.cancelled() => None,
                    prepared = pipeline.prepare(handle, semaphore) => Some(prepared),
                };
                let outcome = match prepared {
                    None => Outcome::Cancelled,
                    Some(Ok(prepared)) => pipeline.write(prepared).await,
                    Some(Err(e)) => Outcome::Failed(e),
                };
                (index, outcome)
            });
        }

        let mut outcomes: Vec<Option<Outcome>> = origins.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => tracing::error!("Pipeline task did not complete: {}", e),
            }
        }

        let mut report = BatchReport::default();
        for (origin, outcome) in origins.into_iter().zip(outcomes) {
            match outcome {
                Some(Outcome::Written(written)) => report.written.push(written),
                Some(Outcome::Failed(error)) => {
                    tracing::warn!("Failed to process {}: {}", origin, error);
                    report.failures.push(DeclarationFailure { origin, error });
                }
                Some(Outcome::Cancelled) => report.cancelled.push(origin),
                // The task panicked before reporting back.
                None => report.failures.push(DeclarationFailure {
                    error: AppError::TaskFailed(format!("pipeline for {} panicked", origin)),
                    origin,
                }),
            }
        }

        tracing::info!(
            "Batch finished: {} written, {} failed, {} cancelled",
            report.written.len(),
            report.failures.len(),
            report.cancelled.len()
        );
        report
    }

    /// Waits for a permit, then parses and renders the declaration.
    async fn prepare(
        &self,
        handle: DeclarationHandle,
        semaphore: Arc<Semaphore>,
    ) -> Result<Prepared, AppError> {
        let permit = semaphore
            .acquire_owned()
            .await
            .map_err(|e| AppError::TaskFailed(e.to_string()))?;

        let origin = handle.origin();
        tracing::debug!("Processing {}", origin);

        let component = self.parser.parse(&handle)?;
        let module = self.generator.generate(&component)?;
        Ok(Prepared {
            origin,
            module,
            _permit: permit,
        })
    }

    async fn write(&self, prepared: Prepared) -> Outcome {
        let Prepared { origin, module, .. } = &prepared;
        match self.writer.write(module, origin).await {
            Ok(location) => Outcome::Written(WrittenModule {
                origin: origin.clone(),
                module: module.qualified_name(),
                location,
            }),
            Err(e) => Outcome::Failed(e),
        }
    }
}

/// A rendered module waiting for the writer. Holds its concurrency permit
/// until the write finishes.
struct Prepared {
    origin: DeclarationOrigin,
    module: GeneratedModule,
    _permit: OwnedSemaphorePermit,
}
