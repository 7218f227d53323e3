//! Generate command handler.

use std::path::Path;
use std::sync::Arc;

use color_eyre::Result;

use crate::context::Context;
use crate::error::AppError;
use crate::models::Component;
use crate::writer::StdoutWriter;

use super::App;

impl App {
    /// Render one JSON component model and print the module source.
    pub fn run_generate(&self, input: &Path) -> Result<()> {
        let config = self.load_config()?;
        let ctx = Context::new(config, Arc::new(StdoutWriter::new()));

        let content = std::fs::read_to_string(input).map_err(|source| AppError::Io {
            path: input.to_path_buf(),
            source,
        })?;
        let component: Component = serde_json::from_str(&content).map_err(AppError::from)?;

        let module = ctx.generator.generate(&component)?;
        tracing::debug!("Rendered {}", module.qualified_name());
        print!("{}", module.source_text());
        Ok(())
    }
}
