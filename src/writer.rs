//! Destinations for generated modules.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::declarations::DeclarationOrigin;
use crate::error::AppError;
use crate::generator::GeneratedModule;

/// Persists a generated module.
///
/// Called at most once per declaration, possibly from several tasks at once.
#[async_trait]
pub trait ModuleWriter: Send + Sync {
    /// Writes `module`, returning where it went.
    async fn write(
        &self,
        module: &GeneratedModule,
        origin: &DeclarationOrigin,
    ) -> Result<PathBuf, AppError>;
}

/// Writes modules under a source root, one file per module.
#[derive(Debug, Clone)]
pub struct FileSystemWriter {
    root: PathBuf,
}

impl FileSystemWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ModuleWriter for FileSystemWriter {
    async fn write(
        &self,
        module: &GeneratedModule,
        origin: &DeclarationOrigin,
    ) -> Result<PathBuf, AppError> {
        let path = self.root.join(module.relative_path());
        let write_error = |source| AppError::Write {
            module: module.qualified_name(),
            source,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
        }
        tokio::fs::write(&path, module.source_text())
            .await
            .map_err(write_error)?;

        tracing::info!("Wrote {} for {}", path.display(), origin);
        Ok(path)
    }
}

/// Prints modules to stdout, each under a banner naming its declaration.
///
/// Output from concurrent writes is never interleaved.
#[derive(Debug, Default)]
pub struct StdoutWriter {
    lock: Mutex<()>,
}

impl StdoutWriter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ModuleWriter for StdoutWriter {
    async fn write(
        &self,
        module: &GeneratedModule,
        origin: &DeclarationOrigin,
    ) -> Result<PathBuf, AppError> {
        let _guard = self.lock.lock().await;

        let mut stdout = std::io::stdout().lock();
        write!(stdout, "// {}\n{}", origin, module.source_text())
            .and_then(|_| stdout.flush())
            .map_err(|source| AppError::Write {
                module: module.qualified_name(),
                source,
            })?;

        Ok(module.relative_path())
    }
}
