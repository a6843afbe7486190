//! MolView E2E Test Framework
//!
//! This crate provides a Rust-controlled E2E testing framework that:
//! - Spawns chromedriver as a subprocess
//! - Drives Chrome over the W3C WebDriver protocol
//! - Parses declarative YAML scenarios
//! - Scrapes the in-browser mocha unit test report
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  DriverProcess::spawn() -> chromedriver on a free port       │
//! │  Session::start()       -> one browser per scenario          │
//! │  ScenarioRunner                                              │
//! │    ├── run_scenario(driver, scenario) -> ScenarioResult      │
//! │    └── run_all(scenarios, open) -> SuiteResult               │
//! │  MochaReport::collect(driver, url) -> suites + stats         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario (YAML)                                             │
//! │    ├── name, description, tags                               │
//! │    └── steps: [Step]                                         │
//! │          ├── navigate / click / click_nth / upload           │
//! │          ├── execute { script } / sleep { ms }               │
//! │          ├── wait { until: WaitSpec, timeout_ms?, missing? } │
//! │          ├── switch_tab { tab, dropdown? }                   │
//! │          └── assert_count / assert_value / log               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Waits go through `molview-waiters`: every `wait` step builds a fresh
//! predicate and polls it until it holds or the server timeout expires.

pub mod actions;
pub mod chromedriver;
pub mod config;
pub mod driver;
pub mod error;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod webdriver;

pub use config::HarnessConfig;
pub use driver::Driver;
pub use error::{E2eError, E2eResult};
pub use runner::ScenarioRunner;
pub use scenario::{Scenario, Step, WaitSpec};
pub use webdriver::{ElementRef, Session};
