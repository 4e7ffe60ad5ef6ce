// tests/pipeline_end_to_end.rs
//
// Drives `shipit::run` with a real pipeline file and real shell commands.
// Unix-only: the commands use `sh` semantics.

#![cfg(unix)]

mod common;
use crate::common::init_tracing;

use std::fs;
use std::path::Path;

use shipit::cli::CliArgs;
use shipit::errors::PipelineError;

fn args_for(config: &Path) -> CliArgs {
    CliArgs {
        config: Some(config.to_string_lossy().into_owned()),
        dry_run: false,
        skip_publish: false,
        log_level: None,
    }
}

#[tokio::test]
async fn full_pipeline_builds_and_publishes() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path();

    // Every stage writes the version it sees; the publisher writes the
    // release id. Identical version files prove the resolver outputs reach
    // every instance byte-for-byte.
    let pipeline = format!(
        r#"
[resolver]
cmd = "echo VERSION=9.9.9; echo RELEASE_ID=rel-e2e"

[publish]
cmd = "printf '%s' \"$RELEASE_ID\" > {out}/published"

[stage.engine]
cmd = "printf '%s' \"$VERSION\" > {out}/engine"

[stage.wasm]
cmd = "printf '%s' \"$VERSION\" > {out}/wasm"

[stage.ide]
cmd = "printf '%s' \"$VERSION\" > {out}/ide"
needs = ["engine", "wasm"]
"#,
        out = out.display()
    );

    let config_path = out.join("Shipit.toml");
    fs::write(&config_path, pipeline).unwrap();

    shipit::run(args_for(&config_path)).await.unwrap();

    let engine = fs::read_to_string(out.join("engine")).unwrap();
    let wasm = fs::read_to_string(out.join("wasm")).unwrap();
    let ide = fs::read_to_string(out.join("ide")).unwrap();
    assert_eq!(engine, "9.9.9");
    assert_eq!(engine, wasm);
    assert_eq!(engine, ide);

    assert_eq!(fs::read_to_string(out.join("published")).unwrap(), "rel-e2e");
}

#[tokio::test]
async fn failed_stage_fails_the_run_and_skips_publish() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path();

    let pipeline = format!(
        r#"
[resolver]
cmd = "echo VERSION=1.0.0; echo RELEASE_ID=rel-fail"

[publish]
cmd = "touch {out}/published"

[stage.engine]
cmd = "exit 2"

[stage.ide]
cmd = "touch {out}/ide"
needs = ["engine"]
"#,
        out = out.display()
    );

    let config_path = out.join("Shipit.toml");
    fs::write(&config_path, pipeline).unwrap();

    let err = shipit::run(args_for(&config_path)).await.unwrap_err();
    assert!(matches!(err, PipelineError::RunFailed(_)));
    let msg = err.to_string();
    assert!(msg.contains("engine@local: failed (exit 2)"));
    assert!(msg.contains("ide@local: skipped"));
    assert!(msg.contains("publish: skipped"));

    assert!(!out.join("ide").exists(), "join stage must not run");
    assert!(!out.join("published").exists(), "publisher must not run");
}

#[tokio::test]
async fn skip_publish_leaves_release_in_draft_but_succeeds() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path();

    let pipeline = format!(
        r#"
[resolver]
cmd = "echo VERSION=1.0.0; echo RELEASE_ID=rel-draft"

[publish]
cmd = "touch {out}/published"

[stage.engine]
cmd = "true"
"#,
        out = out.display()
    );

    let config_path = out.join("Shipit.toml");
    fs::write(&config_path, pipeline).unwrap();

    let mut args = args_for(&config_path);
    args.skip_publish = true;

    shipit::run(args).await.unwrap();
    assert!(!out.join("published").exists());
}

#[tokio::test]
async fn resolver_failure_aborts_before_any_stage() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path();

    let pipeline = format!(
        r#"
[resolver]
cmd = "exit 1"

[publish]
cmd = "true"

[stage.engine]
cmd = "touch {out}/engine"
"#,
        out = out.display()
    );

    let config_path = out.join("Shipit.toml");
    fs::write(&config_path, pipeline).unwrap();

    let err = shipit::run(args_for(&config_path)).await.unwrap_err();
    assert!(matches!(err, PipelineError::Resolver(_)));
    assert!(!out.join("engine").exists(), "no stage may start");
}

#[tokio::test]
async fn dry_run_executes_nothing() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path();

    let pipeline = format!(
        r#"
[resolver]
cmd = "touch {out}/resolved"

[publish]
cmd = "touch {out}/published"

[stage.engine]
cmd = "touch {out}/engine"
"#,
        out = out.display()
    );

    let config_path = out.join("Shipit.toml");
    fs::write(&config_path, pipeline).unwrap();

    let mut args = args_for(&config_path);
    args.dry_run = true;

    shipit::run(args).await.unwrap();
    assert!(!out.join("resolved").exists());
    assert!(!out.join("engine").exists());
    assert!(!out.join("published").exists());
}
