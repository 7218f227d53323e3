//! Application context providing dependency injection root.

use std::sync::Arc;

use crate::config::Config;
use crate::di::Context as ContextDerive;
use crate::generator::{AggregateModuleGenerator, ModuleGenerator};
use crate::parser::{ComponentParser, DeclarationParser};
use crate::writer::ModuleWriter;

/// Shared component parser.
pub type AppParser = Arc<dyn ComponentParser>;
/// Shared module generator.
pub type AppGenerator = Arc<dyn ModuleGenerator>;
/// Shared module writer.
pub type AppWriter = Arc<dyn ModuleWriter>;

/// Root application context for dependency injection.
///
/// Uses `#[derive(Context)]` to generate `FromRef` implementations for
/// each field, so services pick their dependencies with
/// `#[derive(FromContext)]`.
#[derive(ContextDerive, Clone)]
pub struct Context {
    /// Application configuration.
    pub config: Arc<Config>,
    pub parser: AppParser,
    pub generator: AppGenerator,
    /// Where generated modules go.
    pub writer: AppWriter,
}

impl Context {
    /// Creates a context with the default parser and generator for `config`.
    pub fn new(config: Config, writer: AppWriter) -> Self {
        let parser = DeclarationParser::new(config.framework.clone());
        let generator =
            AggregateModuleGenerator::new(config.framework.clone(), config.output.line_width);

        Self {
            config: Arc::new(config),
            parser: Arc::new(parser),
            generator: Arc::new(generator),
            writer,
        }
    }
}
