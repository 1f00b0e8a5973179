use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerityError {
    #[error("Input error: {0}")]
    Input(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Stage failure: {0}")]
    Stage(#[from] StageFailure),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VerityError {
    /// Short machine-readable code, used by the CLI exit path.
    pub fn code(&self) -> &'static str {
        match self {
            VerityError::Input(_) => "input_error",
            VerityError::Config(_) => "config_error",
            VerityError::Stage(_) => "stage_failure",
            VerityError::Json(_) => "json_error",
            VerityError::Io(_) => "io_error",
        }
    }
}

/// A recoverable failure inside one pipeline stage.
///
/// Stage failures never abort an analysis. They are collected by the stage
/// that hit them and surface as notes on a degraded audit entry.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{stage}: {detail}")]
#[serde(rename_all = "camelCase")]
pub struct StageFailure {
    pub stage: String,
    pub detail: String,
}

impl StageFailure {
    pub fn new(stage: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            detail: detail.into(),
        }
    }
}

pub type Result<T, E = VerityError> = std::result::Result<T, E>;
