//! Backstab - aggregate Dagger modules for Kotlin components
//!
//! Reads Kotlin declarations, finds components marked for aggregation, and
//! generates one `@Module` per component that exposes it through a scoped
//! provider function.

pub mod cli;
pub mod config;
pub mod context;
pub mod declarations;
pub mod di;
pub mod error;
pub mod generator;
pub mod models;
pub mod parser;
pub mod processor;
pub mod writer;

// Re-export FromRef at crate root for backstab-macros generated code
pub use di::FromRef;
