// tests/config_validation.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, StageConfigBuilder};

use std::io::Write;

use shipit::config::{load_and_validate, ConfigFile, TargetConfig};
use shipit::errors::PipelineError;

#[test]
fn rejects_empty_stage_list() {
    let raw = ConfigFileBuilder::new().build_raw();
    let err = ConfigFile::try_from(raw).unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
    assert!(err.to_string().contains("at least one [stage"));
}

#[test]
fn rejects_unknown_dependency() {
    let raw = ConfigFileBuilder::new()
        .with_stage(
            "ide",
            StageConfigBuilder::new("echo ide").needs("engine").build(),
        )
        .build_raw();

    let err = ConfigFile::try_from(raw).unwrap_err();
    assert!(err.to_string().contains("unknown dependency 'engine'"));
}

#[test]
fn rejects_self_dependency() {
    let raw = ConfigFileBuilder::new()
        .with_stage(
            "engine",
            StageConfigBuilder::new("echo engine").needs("engine").build(),
        )
        .build_raw();

    let err = ConfigFile::try_from(raw).unwrap_err();
    assert!(err.to_string().contains("cannot depend on itself"));
}

#[test]
fn rejects_dependency_cycle() {
    let raw = ConfigFileBuilder::new()
        .with_stage("a", StageConfigBuilder::new("echo a").needs("b").build())
        .with_stage("b", StageConfigBuilder::new("echo b").needs("a").build())
        .build_raw();

    let err = ConfigFile::try_from(raw).unwrap_err();
    assert!(matches!(err, PipelineError::StageCycle(_)));
}

#[test]
fn rejects_unknown_target() {
    let raw = ConfigFileBuilder::new()
        .with_stage(
            "engine",
            StageConfigBuilder::new("echo engine").target("windows").build(),
        )
        .build_raw();

    let err = ConfigFile::try_from(raw).unwrap_err();
    assert!(err.to_string().contains("unknown target 'windows'"));
}

#[test]
fn rejects_duplicate_targets() {
    let raw = ConfigFileBuilder::new()
        .with_target("linux", TargetConfig::default())
        .with_stage(
            "engine",
            StageConfigBuilder::new("echo engine")
                .target("linux")
                .target("linux")
                .build(),
        )
        .build_raw();

    let err = ConfigFile::try_from(raw).unwrap_err();
    assert!(err.to_string().contains("more than once"));
}

#[test]
fn accepts_declared_and_local_targets() {
    let cfg = ConfigFileBuilder::new()
        .with_target("linux", TargetConfig::default())
        .with_stage(
            "engine",
            StageConfigBuilder::new("echo engine")
                .target("linux")
                .target("local")
                .build(),
        )
        .build();

    assert_eq!(
        cfg.stage["engine"].effective_targets(),
        vec!["linux".to_string(), "local".to_string()]
    );
}

#[test]
fn rejects_zero_concurrency_limits() {
    let raw = ConfigFileBuilder::new()
        .with_max_parallel_per_target(0)
        .with_stage("a", StageConfigBuilder::new("echo a").build())
        .build_raw();

    let err = ConfigFile::try_from(raw).unwrap_err();
    assert!(err.to_string().contains("max_parallel_per_target"));
}

#[test]
fn rejects_empty_resolver_command() {
    let raw = ConfigFileBuilder::new()
        .with_resolver_cmd("  ")
        .with_stage("a", StageConfigBuilder::new("echo a").build())
        .build_raw();

    let err = ConfigFile::try_from(raw).unwrap_err();
    assert!(err.to_string().contains("[resolver].cmd"));
}

#[test]
fn target_max_parallel_overrides_pipeline_default() {
    let cfg = ConfigFileBuilder::new()
        .with_max_parallel_per_target(4)
        .with_target(
            "linux",
            TargetConfig {
                max_parallel: Some(1),
                ..TargetConfig::default()
            },
        )
        .with_stage(
            "a",
            StageConfigBuilder::new("echo a").target("linux").build(),
        )
        .build();

    assert_eq!(cfg.max_parallel_for_target("linux"), 1);
    assert_eq!(cfg.max_parallel_for_target("local"), 4);
}

#[test]
fn loads_and_validates_a_toml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[resolver]
cmd = "build-cli release create-draft"
version_var = "ENSO_VERSION"
release_id_var = "ENSO_RELEASE_ID"

[publish]
cmd = "build-cli release publish"
pass_env = ["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY", "AWS_REGION"]

[target.linux]
env = {{ OS = "linux" }}

[stage.engine]
cmd = "build-cli engine build"
targets = ["linux"]

[stage.wasm]
cmd = "build-cli wasm build"

[stage.ide]
cmd = "build-cli ide build"
needs = ["engine", "wasm"]
"#
    )
    .unwrap();

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.stage.len(), 3);
    assert_eq!(cfg.resolver.version_var, "ENSO_VERSION");
    assert_eq!(cfg.stage["ide"].needs, vec!["engine", "wasm"]);
    assert_eq!(cfg.publish.pass_env.len(), 3);
    assert_eq!(cfg.target["linux"].env["OS"], "linux");
}

#[test]
fn resolver_vars_have_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[resolver]
cmd = "resolve"

[publish]
cmd = "publish"

[stage.build]
cmd = "make"
"#
    )
    .unwrap();

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.resolver.version_var, "VERSION");
    assert_eq!(cfg.resolver.release_id_var, "RELEASE_ID");
    assert_eq!(cfg.pipeline.max_parallel_per_target, 2);
}
