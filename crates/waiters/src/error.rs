//! Error types for waits

use std::time::Duration;

use thiserror::Error;

use crate::handle::HandleError;
use crate::locator::Locator;

/// Why a wait ended without success.
///
/// "Not yet" is not an error; it is [`Outcome::NotYet`](crate::Outcome) and
/// never leaves the poller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WaitError {
    #[error("Timed out after {elapsed:?} waiting for {description}")]
    Timeout {
        description: String,
        elapsed: Duration,
    },

    #[error("Lookup of {locator} failed: {source}")]
    Lookup {
        locator: Locator,
        #[source]
        source: HandleError,
    },

    #[error("Probe `{script}` failed: {source}")]
    Probe {
        script: String,
        #[source]
        source: HandleError,
    },
}

impl WaitError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }
}

pub type WaitResult<T> = Result<T, WaitError>;
