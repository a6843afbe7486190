//! Scenario runner: drives a browser through each scenario and collects
//! per-step results

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use molview_waiters::{MissingElement, Poller};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::actions;
use crate::config::HarnessConfig;
use crate::driver::Driver;
use crate::error::{E2eError, E2eResult};
use crate::scenario::{Scenario, Step};

/// Result of executing a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
}

impl ScenarioResult {
    fn failed(name: &str, error: String) -> Self {
        Self {
            name: name.to_string(),
            success: false,
            duration_ms: 0,
            steps: vec![],
            error: Some(error),
        }
    }
}

/// Result of running all scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub started_at: DateTime<Utc>,
    pub results: Vec<ScenarioResult>,
}

/// Runs scenarios against a [`Driver`]
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    base_url: String,
    test_files: PathBuf,
    server_timeout: Duration,
    poll_interval: Duration,
    missing_element: MissingElement,
}

impl ScenarioRunner {
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            base_url: config.url.clone(),
            test_files: config.test_files.clone(),
            server_timeout: config.server_timeout,
            poll_interval: config.poll_interval,
            missing_element: config.missing_element,
        }
    }

    /// Run scenarios, each in a freshly opened driver that is closed afterwards
    pub fn run_all<D, F>(&self, scenarios: &[Scenario], mut open: F) -> SuiteResult
    where
        D: Driver,
        F: FnMut() -> E2eResult<D>,
    {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut results = Vec::with_capacity(scenarios.len());

        info!("Running {} scenario(s)...", scenarios.len());

        for scenario in scenarios {
            let result = match open() {
                Ok(driver) => {
                    let result = self.run_scenario(&driver, scenario);
                    if let Err(e) = driver.close() {
                        warn!("Failed to close browser after '{}': {}", scenario.name, e);
                    }
                    result
                }
                Err(e) => ScenarioResult::failed(&scenario.name, format!("browser did not start: {}", e)),
            };

            if result.success {
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let passed = results.iter().filter(|r| r.success).count();
        let failed = results.len() - passed;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!("Scenario results: {} passed, {} failed ({} ms)", passed, failed, duration_ms);

        SuiteResult {
            total: scenarios.len(),
            passed,
            failed,
            duration_ms,
            started_at,
            results,
        }
    }

    /// Run a single scenario, stopping at the first failing step
    pub fn run_scenario<D: Driver>(&self, driver: &D, scenario: &Scenario) -> ScenarioResult {
        let start = Instant::now();
        debug!("Running scenario: {}", scenario.name);

        let mut steps = Vec::with_capacity(scenario.steps.len());
        let mut scenario_error = None;

        for step in &scenario.steps {
            let step_start = Instant::now();
            let name = step.name();
            debug!("Executing step: {}", name);

            let outcome = self.execute_step(driver, step);
            let duration_ms = step_start.elapsed().as_millis() as u64;

            match outcome {
                Ok(()) => steps.push(StepResult {
                    step: name,
                    success: true,
                    duration_ms,
                    error: None,
                }),
                Err(e) => {
                    let reason = e.to_string();
                    scenario_error = Some(
                        E2eError::StepFailed {
                            step: name.clone(),
                            reason: reason.clone(),
                        }
                        .to_string(),
                    );
                    steps.push(StepResult {
                        step: name,
                        success: false,
                        duration_ms,
                        error: Some(reason),
                    });
                    break;
                }
            }
        }

        ScenarioResult {
            name: scenario.name.clone(),
            success: scenario_error.is_none(),
            duration_ms: start.elapsed().as_millis() as u64,
            steps,
            error: scenario_error,
        }
    }

    fn execute_step<D: Driver>(&self, driver: &D, step: &Step) -> E2eResult<()> {
        match step {
            Step::Navigate { url } => driver.navigate(&self.resolve_url(url)),
            Step::Click { locator } => actions::click(driver, locator),
            Step::ClickNth {
                within,
                locator,
                index,
            } => {
                let container = actions::find(driver, within)?;
                let matches = driver.find_all_within(&container, locator)?;
                let element = matches.get(*index).ok_or_else(|| {
                    E2eError::AssertionFailed(format!(
                        "wanted match #{} of {} in {}, found {}",
                        index,
                        locator,
                        within,
                        matches.len()
                    ))
                })?;
                driver.click(element)
            }
            Step::Upload { field, files } => {
                let paths: Vec<PathBuf> = files.iter().map(|f| self.resolve_file(f)).collect();
                actions::upload_files(driver, field, &paths)
            }
            Step::Execute { script } => {
                driver.execute(script)?;
                Ok(())
            }
            Step::Sleep { ms } => {
                thread::sleep(Duration::from_millis(*ms));
                Ok(())
            }
            Step::Wait {
                until,
                timeout_ms,
                missing,
            } => {
                let timeout = timeout_ms
                    .map(Duration::from_millis)
                    .unwrap_or(self.server_timeout);
                let predicate = until.predicate(missing.unwrap_or(self.missing_element));
                actions::wait_until(driver, predicate, &self.poller(timeout))?;
                Ok(())
            }
            Step::SwitchTab { tab, dropdown } => actions::switch_tab(
                driver,
                tab,
                dropdown.as_deref(),
                &self.poller(self.server_timeout),
            ),
            Step::AssertCount {
                within,
                locator,
                skip_header,
                equals,
                at_least,
            } => {
                let count = actions::count_rows(driver, within, locator, *skip_header)?;
                if let Some(expected) = equals {
                    if count != *expected {
                        return Err(E2eError::AssertionFailed(format!(
                            "expected {} {} in {}, found {}",
                            expected, locator, within, count
                        )));
                    }
                }
                if let Some(minimum) = at_least {
                    if count < *minimum {
                        return Err(E2eError::AssertionFailed(format!(
                            "expected at least {} {} in {}, found {}",
                            minimum, locator, within, count
                        )));
                    }
                }
                Ok(())
            }
            Step::AssertValue { locator, equals } => {
                let element = actions::find(driver, locator)?;
                let value = driver.property(&element, "value")?;
                let actual = match value.as_str() {
                    Some(s) => s.to_string(),
                    None if value.is_null() => String::new(),
                    None => value.to_string(),
                };
                if &actual != equals {
                    return Err(E2eError::AssertionFailed(format!(
                        "expected {} to have value '{}', found '{}'",
                        locator, equals, actual
                    )));
                }
                Ok(())
            }
            Step::Log { message } => {
                info!("[SCENARIO LOG] {}", message);
                Ok(())
            }
        }
    }

    fn poller(&self, timeout: Duration) -> Poller {
        Poller::new(timeout).with_interval(self.poll_interval)
    }

    fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") || url.starts_with("file://") {
            return url.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }

    fn resolve_file(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.test_files.join(file)
        }
    }

    /// Write results to `test-results.json` in `output_dir`
    pub fn write_results(&self, output_dir: &Path, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(output_dir)?;

        let path = output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
