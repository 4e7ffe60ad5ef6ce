// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cycle detected in stage graph: {0}")]
    StageCycle(String),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Resolver failed: {0}")]
    Resolver(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Pipeline run failed:\n{0}")]
    RunFailed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipelineError>;
