// tests/resolver_publish.rs
//
// Runs the resolver and publisher against real shell commands. Unix-only:
// the commands use `sh` semantics.

#![cfg(unix)]

mod common;
use crate::common::init_tracing;

use shipit::config::{PublishSection, ResolverSection};
use shipit::errors::PipelineError;
use shipit::release::{publish, resolve, RunContext};

fn resolver(cmd: &str) -> ResolverSection {
    ResolverSection {
        cmd: cmd.to_string(),
        version_var: "VERSION".to_string(),
        release_id_var: "RELEASE_ID".to_string(),
    }
}

fn context() -> RunContext {
    RunContext {
        version: "2024.5.1".to_string(),
        release_id: "draft-7".to_string(),
        version_var: "ENSO_VERSION".to_string(),
        release_id_var: "ENSO_RELEASE_ID".to_string(),
    }
}

#[tokio::test]
async fn resolver_parses_outputs_from_stdout() {
    init_tracing();

    let cfg = resolver("echo ignored; echo VERSION=2024.5.1; echo RELEASE_ID=draft-7");
    let ctx = resolve(&cfg).await.unwrap();
    assert_eq!(ctx.version, "2024.5.1");
    assert_eq!(ctx.release_id, "draft-7");
    assert_eq!(
        ctx.env_vars(),
        vec![
            ("VERSION".to_string(), "2024.5.1".to_string()),
            ("RELEASE_ID".to_string(), "draft-7".to_string()),
        ]
    );
}

#[tokio::test]
async fn resolver_nonzero_exit_is_fatal() {
    init_tracing();

    let cfg = resolver("echo VERSION=1.0.0; echo RELEASE_ID=r1; exit 7");
    let err = resolve(&cfg).await.unwrap_err();
    assert!(matches!(err, PipelineError::Resolver(_)));
    assert!(err.to_string().contains("code 7"));
}

#[tokio::test]
async fn resolver_missing_output_is_fatal() {
    init_tracing();

    let cfg = resolver("echo VERSION=1.0.0");
    let err = resolve(&cfg).await.unwrap_err();
    assert!(matches!(err, PipelineError::Resolver(_)));
    assert!(err.to_string().contains("RELEASE_ID"));
}

#[tokio::test]
async fn publish_receives_run_context_env() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("published");

    let cfg = PublishSection {
        cmd: format!(
            "printf '%s %s' \"$ENSO_VERSION\" \"$ENSO_RELEASE_ID\" > {}",
            marker.display()
        ),
        pass_env: vec![],
    };

    publish(&cfg, &context()).await.unwrap();

    let written = std::fs::read_to_string(&marker).unwrap();
    assert_eq!(written, "2024.5.1 draft-7");
}

#[tokio::test]
async fn publish_forwards_declared_credentials_only() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("creds");

    // SAFETY: test-local variable name, not read by anything else.
    unsafe { std::env::set_var("SHIPIT_TEST_PUBLISH_CRED", "s3cret") };

    let cfg = PublishSection {
        cmd: format!(
            "printf '%s' \"$SHIPIT_TEST_PUBLISH_CRED\" > {}",
            marker.display()
        ),
        pass_env: vec!["SHIPIT_TEST_PUBLISH_CRED".to_string()],
    };

    publish(&cfg, &context()).await.unwrap();

    let written = std::fs::read_to_string(&marker).unwrap();
    assert_eq!(written, "s3cret");
}

#[tokio::test]
async fn publish_failure_is_fatal_and_names_the_release() {
    init_tracing();

    let cfg = PublishSection {
        cmd: "exit 3".to_string(),
        pass_env: vec![],
    };

    let err = publish(&cfg, &context()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Publish(_)));
    assert!(err.to_string().contains("draft-7"));
    assert!(err.to_string().contains("draft"));
}
