//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. Built-in defaults
//! 2. User config: `~/.config/backstab/config.toml` (XDG) or platform config dir
//! 3. Project config: `.backstab.toml`
//! 4. Environment variables: `BACKSTAB_*`, with `__` between nested keys
//!    (e.g. `BACKSTAB_PROCESSOR__MAX_CONCURRENCY=4`)
//!
//! An explicit file passed with `--config` replaces layers 2 and 3.
//!
//! # Example
//!
//! ```toml
//! [framework]
//! scope = "com.example.di.AppScope"
//! qualifier_markers = ["javax.inject.Qualifier"]
//!
//! [output]
//! directory = "build/generated/backstab"
//!
//! [processor]
//! max_concurrency = 4
//! ```

use std::ops::Deref;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

use crate::models::ClassName;

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub framework: FrameworkSymbols,
    pub output: OutputConfig,
    pub processor: ProcessorConfig,
}

/// Fully-qualified names of the framework symbols the parser recognizes and
/// the generator emits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FrameworkSymbols {
    /// Marks a component declaration (`@Component`).
    pub component: ClassName,
    /// Marks a nested builder contract (`@Component.Builder`).
    pub component_builder: ClassName,
    /// Marks a nested factory contract (`@Component.Factory`).
    pub component_factory: ClassName,
    /// Marks an instance binding (`@BindsInstance`).
    pub binds_instance: ClassName,
    /// Annotates the generated object (`@Module`).
    pub module: ClassName,
    /// Annotates the provider function (`@Provides`).
    pub provides: ClassName,
    /// Scope placed on the provider function.
    pub scope: ClassName,
    /// The string-discriminated qualifier (`@Named`).
    pub named: ClassName,
    /// Meta-annotations that make an annotation a qualifier.
    pub qualifier_markers: Vec<ClassName>,
    /// Selects which components get an aggregate module (`@Backstab`).
    pub trigger: ClassName,
    /// Prefix of the framework-generated implementation class.
    pub implementation_prefix: String,
}

/// Where and how generated modules are written.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory for generated sources.
    pub directory: PathBuf,
    /// Column limit used when laying out provider functions.
    pub line_width: usize,
}

/// Batch processing limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Maximum number of declarations processed at once.
    pub max_concurrency: usize,
}

/// Default line width for generated sources.
pub const DEFAULT_LINE_WIDTH: usize = 100;

impl Default for FrameworkSymbols {
    fn default() -> Self {
        Self {
            component: ClassName::builtin("dagger", &["Component"]),
            component_builder: ClassName::builtin("dagger", &["Component", "Builder"]),
            component_factory: ClassName::builtin("dagger", &["Component", "Factory"]),
            binds_instance: ClassName::builtin("dagger", &["BindsInstance"]),
            module: ClassName::builtin("dagger", &["Module"]),
            provides: ClassName::builtin("dagger", &["Provides"]),
            scope: ClassName::builtin(
                "com.jackbradshaw.backstab.annotations.aggregate",
                &["AggregateScope"],
            ),
            named: ClassName::builtin("javax.inject", &["Named"]),
            qualifier_markers: vec![
                ClassName::builtin("javax.inject", &["Qualifier"]),
                ClassName::builtin("jakarta.inject", &["Qualifier"]),
            ],
            trigger: ClassName::builtin(
                "com.jackbradshaw.backstab.annotations.backstab",
                &["Backstab"],
            ),
            implementation_prefix: "Dagger".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("build/generated/backstab"),
            line_width: DEFAULT_LINE_WIDTH,
        }
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }
}

impl Config {
    /// Load config with layered resolution (user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        let user_config = Self::user_config_path();

        Self::extract(
            Figment::new()
                // Layer 1: User config (lowest priority)
                .merge(Toml::file(user_config))
                // Layer 2: Project config
                .merge(Toml::file(".backstab.toml")),
        )
    }

    /// Load config from an explicit file, still honoring environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::extract(Figment::new().merge(Toml::file(path)))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment
            // Environment variables (highest priority)
            .merge(Env::prefixed("BACKSTAB_").split("__"))
            .extract()
            .map_err(ConfigError::from)
    }

    /// User config path: ~/.config/backstab/config.toml (XDG) or platform config dir.
    fn user_config_path() -> PathBuf {
        // Prefer XDG config location (~/.config) on all platforms
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("backstab").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        // Fall back to platform-specific config dir
        dirs::config_dir()
            .map(|p| p.join("backstab").join("config.toml"))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_defaults_name_dagger_symbols() {
        let config = Config::default();
        assert_eq!(config.framework.module.canonical(), "dagger.Module");
        assert_eq!(
            config.framework.component_builder.simple_names(),
            ["Component", "Builder"]
        );
        assert_eq!(config.framework.implementation_prefix, "Dagger");
        assert_eq!(config.output.line_width, DEFAULT_LINE_WIDTH);
        assert!(config.processor.max_concurrency >= 1);
    }

    #[test]
    #[serial]
    fn test_load_from_overrides_selected_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[framework]
scope = "com.example.AppScope"
implementation_prefix = "Generated"

[processor]
max_concurrency = 3
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.framework.scope.canonical(), "com.example.AppScope");
        assert_eq!(config.framework.implementation_prefix, "Generated");
        assert_eq!(config.processor.max_concurrency, 3);
        // Untouched keys keep their defaults.
        assert_eq!(config.framework.named.canonical(), "javax.inject.Named");
        assert_eq!(config.output.line_width, DEFAULT_LINE_WIDTH);
    }

    #[test]
    #[serial]
    fn test_env_overrides_nested_key() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::env::set_var("BACKSTAB_OUTPUT__LINE_WIDTH", "80");
        let config = Config::load_from(file.path());
        std::env::remove_var("BACKSTAB_OUTPUT__LINE_WIDTH");

        assert_eq!(config.unwrap().output.line_width, 80);
    }

    #[test]
    #[serial]
    fn test_invalid_symbol_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[framework]\nmodule = \"dagger\"").unwrap();

        assert!(Config::load_from(file.path()).is_err());
    }
}
