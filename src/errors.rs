// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Only data-driven failures (plan construction, plan files) are errors.
//! Misusing the engine API, e.g. asking for a stage id the plan does not
//! contain, panics instead.

use thiserror::Error;

use crate::plan::StageId;

#[derive(Error, Debug)]
pub enum WavedagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unknown stage: {0}")]
    UnknownStage(StageId),

    #[error("Duplicate stage id: {0}")]
    DuplicateStage(StageId),

    #[error("Plan '{0}' has an empty start set")]
    EmptyStartSet(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WavedagError>;
