//! Error types for E2E testing

use molview_waiters::{HandleError, WaitError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("chromedriver failed to start: {0}")]
    ChromedriverStartup(String),

    #[error("WebDriver error ({error}): {message}")]
    WebDriver { error: String, message: String },

    #[error("Unexpected WebDriver response: {0}")]
    Protocol(String),

    #[error("Scenario parse error: {0}")]
    ScenarioParse(String),

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Wait(#[from] WaitError),

    #[error(transparent)]
    Handle(#[from] HandleError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
