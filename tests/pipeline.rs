//! End-to-end tests: load Kotlin sources, process them and check the files written.

use std::path::PathBuf;
use std::sync::Arc;

use backstab::config::Config;
use backstab::context::Context;
use backstab::declarations::load_sources;
use backstab::processor::Processor;
use backstab::writer::FileSystemWriter;
use backstab::FromRef;
use tokio_util::sync::CancellationToken;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn processor(out: &std::path::Path) -> (Processor, Config) {
    let mut config = Config::default();
    config.processor.max_concurrency = 2;
    let ctx = Context::new(config.clone(), Arc::new(FileSystemWriter::new(out)));
    (Processor::from_ref(&ctx), config)
}

#[tokio::test]
async fn test_processes_fixture_components() {
    let out = tempfile::tempdir().unwrap();
    let (processor, config) = processor(out.path());

    let loaded = load_sources([fixtures()]).unwrap();
    assert!(loaded.rejected.is_empty());
    let table = Arc::new(loaded.table);
    let handles = table.discover(&config.framework.trigger);
    assert_eq!(handles.len(), 3);

    let report = processor.process(handles).await;

    let written: Vec<&str> = report.written.iter().map(|w| w.module.as_str()).collect();
    assert_eq!(
        written,
        [
            "com.example.Implicit_AggregateModule",
            "com.example.Built_AggregateModule"
        ]
    );
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].origin.declaration, "com.example.Broken");
    assert_eq!(report.failures[0].error.code(), "MALFORMED_DECLARATION");
    assert!(!report.is_success());

    let implicit = std::fs::read_to_string(
        out.path()
            .join("com")
            .join("example")
            .join("Implicit_AggregateModule.kt"),
    )
    .unwrap();
    assert_eq!(
        implicit,
        r#"package com.example

import com.jackbradshaw.backstab.annotations.aggregate.AggregateScope
import dagger.Module
import dagger.Provides

@Module
public object Implicit_AggregateModule {
  @Provides
  @AggregateScope
  public fun provideImplicit(): Implicit = DaggerImplicit.create()
}
"#
    );

    let built = std::fs::read_to_string(
        out.path()
            .join("com")
            .join("example")
            .join("Built_AggregateModule.kt"),
    )
    .unwrap();
    assert!(built.contains("public fun provideBuilt("));
    assert!(built.contains("DaggerBuilt.builder()"));
    assert!(built.contains("    .leaf(arg"));
    assert!(built.contains("    .port(arg"));
    assert!(built.contains("    .build()\n"));
    assert!(!out
        .path()
        .join("com")
        .join("example")
        .join("Broken_AggregateModule.kt")
        .exists());
}

#[tokio::test]
async fn test_cancelled_batch_writes_nothing() {
    let out = tempfile::tempdir().unwrap();
    let (processor, config) = processor(out.path());

    let table = Arc::new(load_sources([fixtures().join("components.kt")]).unwrap().table);
    let handles = table.discover(&config.framework.trigger);

    let token = CancellationToken::new();
    token.cancel();
    let report = processor.process_with_cancellation(handles, token).await;

    assert!(report.written.is_empty());
    assert!(report.failures.is_empty());
    assert_eq!(report.cancelled.len(), 3);
    assert!(!out.path().join("com").exists());
}
