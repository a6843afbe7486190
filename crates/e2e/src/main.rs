//! MolView E2E runner entry point
//!
//! Run with: cargo run --package molview-e2e -- scenarios

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use molview_waiters::{MissingElement, Poller};
use tracing::info;
use tracing_subscriber::EnvFilter;

use molview_e2e::chromedriver::{DriverConfig, DriverProcess};
use molview_e2e::config;
use molview_e2e::report::MochaReport;
use molview_e2e::webdriver::BrowserOptions;
use molview_e2e::{HarnessConfig, Scenario, ScenarioRunner, Session};

#[derive(Parser, Debug)]
#[command(name = "molview-e2e")]
#[command(about = "E2E test runner for the MolView front-end")]
#[command(version)]
struct Cli {
    /// Base URL of the front-end (overrides URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Path to chromedriver (overrides CHROMEDRIVER)
    #[arg(long, global = true)]
    chromedriver: Option<PathBuf>,

    /// Chrome binary (overrides CHROME)
    #[arg(long, global = true)]
    chrome: Option<PathBuf>,

    /// Run Chrome headless (same as setting HEADLESS)
    #[arg(long, global = true)]
    headless: bool,

    /// Seconds to wait for server-side work (overrides SERVER_TIMEOUT)
    #[arg(long, global = true, value_parser = parse_timeout)]
    server_timeout: Option<Duration>,

    /// Milliseconds between wait condition checks
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,

    /// Keep polling when a waited-for element has not rendered yet
    #[arg(long, global = true)]
    wait_for_missing: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run YAML scenarios against the front-end
    Scenarios {
        /// Path to scenarios directory
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Directory holding the structure files to upload (overrides TEST_FILES)
        #[arg(long)]
        test_files: Option<PathBuf>,

        /// Run only scenarios matching this tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Run only a specific scenario by name
        #[arg(short, long)]
        name: Option<String>,

        /// Output directory for results
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the in-browser mocha unit tests and report the results
    Mocha {
        /// Path to the mocha runner page
        #[arg(long, default_value = "tests/browser/SpecRunner.html")]
        runner: PathBuf,
    },
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    config::parse_seconds(value).map_err(|e| e.to_string())
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut config = HarnessConfig::from_env().context("reading configuration")?;
    if let Some(url) = cli.url {
        config.url = url;
    }
    if let Some(path) = cli.chromedriver {
        config.chromedriver = path;
    }
    if let Some(path) = cli.chrome {
        config.chrome_binary = Some(path);
    }
    if cli.headless {
        config.headless = true;
    }
    if let Some(timeout) = cli.server_timeout {
        config.server_timeout = timeout;
    }
    if let Some(ms) = cli.poll_interval_ms {
        config.poll_interval = Duration::from_millis(ms);
    }
    if cli.wait_for_missing {
        config.missing_element = MissingElement::NotYet;
    }

    match cli.command {
        Commands::Scenarios {
            dir,
            test_files,
            tag,
            name,
            output,
        } => {
            if let Some(dir) = dir {
                config.scenarios_dir = dir;
            }
            if let Some(test_files) = test_files {
                config.test_files = test_files;
            }
            if let Some(output) = output {
                config.output_dir = output;
            }
            run_scenarios(&config, tag.as_deref(), name.as_deref())
        }
        Commands::Mocha { runner } => run_mocha(&config, &runner),
    }
}

fn start_driver(config: &HarnessConfig) -> anyhow::Result<(DriverProcess, BrowserOptions)> {
    let driver = DriverProcess::spawn(DriverConfig {
        binary_path: config.chromedriver.clone(),
        ..Default::default()
    })?;
    let options = BrowserOptions {
        headless: config.headless,
        binary: config.chrome_binary.clone(),
        args: vec![],
    };
    Ok((driver, options))
}

fn run_scenarios(config: &HarnessConfig, tag: Option<&str>, name: Option<&str>) -> anyhow::Result<bool> {
    let all = Scenario::load_all(&config.scenarios_dir)?;
    let selected = Scenario::select(&all, tag, name);
    anyhow::ensure!(!selected.is_empty(), "no scenarios selected in {}", config.scenarios_dir.display());

    let (driver, options) = start_driver(config)?;
    let runner = ScenarioRunner::new(config);

    let results = runner.run_all(&selected, || Session::start(driver.base_url(), &options));
    runner.write_results(&config.output_dir, &results)?;

    Ok(results.failed == 0)
}

fn run_mocha(config: &HarnessConfig, runner_page: &Path) -> anyhow::Result<bool> {
    let page = runner_page
        .canonicalize()
        .with_context(|| format!("mocha runner not found: {}", runner_page.display()))?;

    let (driver, options) = start_driver(config)?;
    let session = Session::start(driver.base_url(), &options)?;
    let poller = Poller::new(config.server_timeout).with_interval(config.poll_interval);

    let report =
        MochaReport::collect_and_close(&session, &format!("file://{}", page.display()), &poller)?;

    println!("{}", report.render());
    info!("{} suite(s), {} failure(s)", report.suites.len(), report.failures);

    Ok(!report.has_failures())
}
