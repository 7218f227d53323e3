//! Application error types.

use std::path::PathBuf;

use thiserror::Error;

/// Application-level errors for Backstab.
#[derive(Error, Debug)]
pub enum AppError {
    // Pipeline errors
    #[error("Malformed declaration {declaration}: {reason}")]
    MalformedDeclaration { declaration: String, reason: String },

    #[error("Cannot render component {component}: {reason}")]
    UnrenderableContract { component: String, reason: String },

    #[error("Invalid name: {0}")]
    InvalidName(String),

    // Source loading errors
    #[error("Syntax error in {path}: {message}")]
    SourceSyntax { path: PathBuf, message: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Pipeline task failed: {0}")]
    TaskFailed(String),

    // Output errors
    #[error("Failed to write module {module}: {source}")]
    Write {
        module: String,
        #[source]
        source: std::io::Error,
    },

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl AppError {
    pub(crate) fn malformed(declaration: impl ToString, reason: impl Into<String>) -> Self {
        AppError::MalformedDeclaration {
            declaration: declaration.to_string(),
            reason: reason.into(),
        }
    }

    /// Short machine-readable code, used in batch reports.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::MalformedDeclaration { .. } => "MALFORMED_DECLARATION",
            AppError::UnrenderableContract { .. } => "UNRENDERABLE_CONTRACT",
            AppError::InvalidName(_) => "INVALID_NAME",
            AppError::SourceSyntax { .. } => "SOURCE_SYNTAX",
            AppError::Io { .. } => "IO_ERROR",
            AppError::Json(_) => "JSON_ERROR",
            AppError::TaskFailed(_) => "TASK_FAILED",
            AppError::Write { .. } => "WRITE_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
        }
    }
}
