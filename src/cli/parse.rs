//! Parse command handler.

use std::path::PathBuf;
use std::sync::Arc;

use color_eyre::Result;

use crate::context::Context;
use crate::declarations::load_sources;
use crate::writer::StdoutWriter;

use super::App;

impl App {
    /// Print every discovered component model as pretty JSON.
    pub fn run_parse(&self, inputs: &[PathBuf]) -> Result<()> {
        let config = self.load_config()?;
        let trigger = config.framework.trigger.clone();
        let ctx = Context::new(config, Arc::new(StdoutWriter::new()));

        let loaded = load_sources(inputs)?;
        let mut failed = loaded.rejected.len();
        for rejected in &loaded.rejected {
            tracing::error!(
                code = rejected.error.code(),
                "{}: {}",
                rejected.path.display(),
                rejected.error
            );
        }

        let table = Arc::new(loaded.table);
        let mut components = Vec::new();

        for handle in table.discover(&trigger) {
            match ctx.parser.parse(&handle) {
                Ok(component) => components.push(component),
                Err(e) => {
                    failed += 1;
                    tracing::error!(code = e.code(), "{}: {}", handle.origin(), e);
                }
            }
        }

        println!("{}", serde_json::to_string_pretty(&components)?);

        if failed > 0 {
            return Err(color_eyre::eyre::eyre!(
                "{} sources or declarations could not be parsed",
                failed
            ));
        }
        Ok(())
    }
}
