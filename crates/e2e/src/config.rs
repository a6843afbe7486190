//! Harness configuration
//!
//! Defaults match the environment variables the front-end's CI already
//! exports; the CLI can override every field.

use std::path::PathBuf;
use std::time::Duration;

use molview_waiters::{MissingElement, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT};

use crate::error::{E2eError, E2eResult};

/// Configuration shared by every scenario in a run
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Base URL of the front-end under test
    pub url: String,

    /// Path to the chromedriver binary
    pub chromedriver: PathBuf,

    /// Chrome binary, if not the one chromedriver finds on its own
    pub chrome_binary: Option<PathBuf>,

    /// Run Chrome without a window
    pub headless: bool,

    /// Deadline for waits on server-side work (uploads, cuts, growing)
    pub server_timeout: Duration,

    /// Time between evaluations of a wait condition
    pub poll_interval: Duration,

    /// Directory holding the structure files scenarios upload
    pub test_files: PathBuf,

    /// Directory containing scenario YAML files
    pub scenarios_dir: PathBuf,

    /// Output directory for results
    pub output_dir: PathBuf,

    /// Default policy for waits whose element has not rendered yet
    pub missing_element: MissingElement,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            chromedriver: PathBuf::from("bin/chromedriver"),
            chrome_binary: None,
            headless: false,
            server_timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            test_files: PathBuf::from("tests/test_files"),
            scenarios_dir: PathBuf::from("scenarios"),
            output_dir: PathBuf::from("test-results"),
            missing_element: MissingElement::Error,
        }
    }
}

impl HarnessConfig {
    /// Build from the process environment
    pub fn from_env() -> E2eResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> E2eResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("URL") {
            config.url = url;
        }
        if let Some(path) = lookup("CHROMEDRIVER") {
            config.chromedriver = PathBuf::from(path);
        }
        if let Some(path) = lookup("CHROME") {
            config.chrome_binary = Some(PathBuf::from(path));
        }
        // presence alone enables headless mode, whatever the value
        config.headless = lookup("HEADLESS").is_some();
        if let Some(secs) = lookup("SERVER_TIMEOUT") {
            config.server_timeout = parse_seconds(&secs)?;
        }
        if let Some(path) = lookup("TEST_FILES") {
            config.test_files = PathBuf::from(path);
        }

        Ok(config)
    }
}

/// Parse a non-negative number of seconds, as `SERVER_TIMEOUT` and
/// `--server-timeout` take it
pub fn parse_seconds(value: &str) -> E2eResult<Duration> {
    let secs: f64 = value.trim().parse().map_err(|_| {
        E2eError::Config(format!("timeout must be a number of seconds, got '{}'", value))
    })?;
    if secs < 0.0 {
        return Err(E2eError::Config(format!(
            "timeout must be a non-negative number of seconds, got '{}'",
            value
        )));
    }
    // rejects NaN, infinity and values beyond what a Duration holds
    Duration::try_from_secs_f64(secs).map_err(|e| {
        E2eError::Config(format!("timeout '{}' is out of range: {}", value, e))
    })
}
