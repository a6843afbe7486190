//! Mocha report scraping
//!
//! The front-end's browser unit tests run in a mocha HTML page. This loads
//! the page, waits for the run to settle and reads the rendered report.

use std::fmt::Write as _;
use std::sync::OnceLock;

use molview_waiters::{Locator, MissingElement, Poller, Predicate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::actions;
use crate::driver::Driver;
use crate::error::E2eResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MochaTest {
    pub title: String,
    pub passed: bool,
    /// Only rendered by mocha for medium and slow tests
    pub duration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MochaSuite {
    pub title: String,
    pub tests: Vec<MochaTest>,
}

/// The stats bar as rendered, plus the numbers parsed out of it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MochaStats {
    pub passes_text: String,
    pub failures_text: String,
    pub duration_text: String,
    pub passes: Option<usize>,
    pub failures: Option<usize>,
    pub duration_secs: Option<f64>,
}

impl MochaStats {
    fn parse(passes_text: String, failures_text: String, duration_text: String) -> Self {
        Self {
            passes: first_number(&passes_text).and_then(|n| n.parse().ok()),
            failures: first_number(&failures_text).and_then(|n| n.parse().ok()),
            duration_secs: first_number(&duration_text).and_then(|n| n.parse().ok()),
            passes_text,
            failures_text,
            duration_text,
        }
    }
}

fn first_number(text: &str) -> Option<&str> {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    let re = NUMBER.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid regex"));
    re.find(text).map(|m| m.as_str())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MochaReport {
    pub suites: Vec<MochaSuite>,
    pub stats: MochaStats,
    /// Number of `.fail` elements on the page
    pub failures: usize,
}

impl MochaReport {
    /// Open the runner page, wait for the run to finish and scrape it
    pub fn collect<D: Driver>(driver: &D, runner_url: &str, poller: &Poller) -> E2eResult<Self> {
        info!("Opening mocha runner {}", runner_url);
        driver.navigate(runner_url)?;

        // the stats bar may render after the page loads
        let settled = Predicate::unchanged(Locator::class_name("duration"))
            .on_missing(MissingElement::NotYet);
        actions::wait_until(driver, settled, poller)?;

        Self::scrape(driver)
    }

    /// [`collect`](Self::collect), then close the driver. A failure to close
    /// is logged and never hides the collection result.
    pub fn collect_and_close<D: Driver>(
        driver: &D,
        runner_url: &str,
        poller: &Poller,
    ) -> E2eResult<Self> {
        let collected = Self::collect(driver, runner_url, poller);
        if let Err(e) = driver.close() {
            warn!("Failed to close browser after the mocha run: {}", e);
        }
        collected
    }

    /// Read the rendered report
    pub fn scrape<D: Driver>(driver: &D) -> E2eResult<Self> {
        let report = actions::find(driver, &Locator::id("mocha-report"))?;
        let suite_elements = driver.find_all_within(&report, &Locator::class_name("suite"))?;

        let mut suites = Vec::with_capacity(suite_elements.len());
        for suite in &suite_elements {
            suites.push(scrape_suite(driver, suite)?);
        }

        let stats = MochaStats::parse(
            stat_text(driver, "passes")?,
            stat_text(driver, "failures")?,
            stat_text(driver, "duration")?,
        );
        let failures = driver.find_all(&Locator::class_name("fail"))?.len();
        debug!(suites = suites.len(), failures, "Scraped mocha report");

        Ok(Self {
            suites,
            stats,
            failures,
        })
    }

    pub fn has_failures(&self) -> bool {
        self.failures > 0
    }

    /// Console rendering in mocha's spec reporter style
    pub fn render(&self) -> String {
        let mut out = String::new();
        for suite in &self.suites {
            let _ = writeln!(out, "  {}", suite.title);
            for test in &suite.tests {
                match (test.passed, &test.duration) {
                    (false, _) => {
                        let _ = writeln!(out, "    ✕ {}", test.title);
                    }
                    (true, Some(duration)) => {
                        let _ = writeln!(out, "    ✓ {} ({})", test.title, duration);
                    }
                    (true, None) => {
                        let _ = writeln!(out, "    ✓ {}", test.title);
                    }
                }
            }
            out.push('\n');
        }
        out.push_str("\n\n");
        let _ = writeln!(
            out,
            "  {}  {}",
            self.stats.passes_text, self.stats.duration_text
        );
        if self.has_failures() {
            let _ = writeln!(out, "  {}", self.stats.failures_text);
        }
        out
    }
}

fn stat_text<D: Driver>(driver: &D, class: &str) -> E2eResult<String> {
    let element = actions::find(driver, &Locator::class_name(class))?;
    driver.text(&element)
}

fn scrape_suite<D: Driver>(driver: &D, suite: &D::Element) -> E2eResult<MochaSuite> {
    let heading = driver.find_within(suite, &Locator::css(":scope > h1"))?;
    let title = driver.text(&heading)?;

    let test_elements = driver.find_all_within(suite, &Locator::css(":scope > ul > li.test"))?;
    let mut tests = Vec::with_capacity(test_elements.len());
    for test in &test_elements {
        tests.push(scrape_test(driver, test)?);
    }

    Ok(MochaSuite { title, tests })
}

fn scrape_test<D: Driver>(driver: &D, test: &D::Element) -> E2eResult<MochaTest> {
    let heading = driver.find_within(test, &Locator::tag_name("h2"))?;
    let heading_text = driver.text(&heading)?;
    let mut title = heading_text.lines().next().unwrap_or_default().to_string();

    let classes = driver.attribute(test, "class")?.unwrap_or_default();
    if classes.split_whitespace().any(|c| c == "fail") {
        return Ok(MochaTest {
            title,
            passed: false,
            duration: None,
        });
    }

    let spans = driver.find_all_within(&heading, &Locator::tag_name("span"))?;
    let duration = match spans.first() {
        Some(span) => Some(driver.text(span)?).filter(|d| !d.is_empty()),
        None => None,
    };
    if let Some(duration) = &duration {
        if let Some(stripped) = title.split(duration.as_str()).next() {
            title = stripped.trim_end().to_string();
        }
    }

    Ok(MochaTest {
        title,
        passed: true,
        duration,
    })
}
