//! chromedriver management - spawning and readiness checking the driver

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use molview_waiters::{from_fn, HandleError, Outcome, Poller, WaitError};
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};

/// Handle to a running chromedriver process
pub struct DriverProcess {
    child: Child,
    pub base_url: String,
    pub port: u16,
}

impl DriverProcess {
    /// Spawn chromedriver and wait until it accepts sessions
    pub fn spawn(config: DriverConfig) -> E2eResult<Self> {
        let port = match config.port {
            Some(port) => port,
            None => find_free_port()?,
        };
        let base_url = format!("http://127.0.0.1:{}", port);

        info!("Spawning chromedriver on port {}", port);

        let child = Command::new(&config.binary_path)
            .arg(format!("--port={}", port))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                E2eError::ChromedriverStartup(format!(
                    "Failed to spawn {}: {}",
                    config.binary_path.display(),
                    e
                ))
            })?;

        let mut handle = DriverProcess {
            child,
            base_url,
            port,
        };

        handle.wait_for_ready(config.startup_timeout)?;

        info!("chromedriver is ready at {}", handle.base_url);
        Ok(handle)
    }

    /// Poll `/status` until the driver reports `ready`
    fn wait_for_ready(&mut self, timeout: Duration) -> E2eResult<()> {
        let client = Client::builder().timeout(Duration::from_secs(2)).build()?;
        let status_url = format!("{}/status", self.base_url);
        let child = &mut self.child;

        let ready = from_fn(
            format!("chromedriver at {}", status_url),
            |client: &Client| {
                if let Ok(Some(status)) = child.try_wait() {
                    return Err(WaitError::Probe {
                        script: "GET /status".to_string(),
                        source: HandleError::Driver(format!("chromedriver exited with {}", status)),
                    });
                }
                match client.get(&status_url).send() {
                    Ok(resp) if resp.status().is_success() => {
                        let body: Value = match resp.json() {
                            Ok(body) => body,
                            Err(e) => {
                                warn!("Unreadable status response: {}", e);
                                return Ok(Outcome::NotYet);
                            }
                        };
                        if body["value"]["ready"].as_bool() == Some(true) {
                            Ok(Outcome::Ready(()))
                        } else {
                            debug!("chromedriver not ready: {}", body["value"]["message"]);
                            Ok(Outcome::NotYet)
                        }
                    }
                    Ok(resp) => {
                        warn!("Status check returned {}", resp.status());
                        Ok(Outcome::NotYet)
                    }
                    Err(e) => {
                        // Connection refused is expected while the driver is starting
                        if !e.is_connect() {
                            warn!("Status check error: {}", e);
                        }
                        Ok(Outcome::NotYet)
                    }
                }
            },
        );

        Poller::new(timeout)
            .with_interval(Duration::from_millis(100))
            .until(&client, ready)
            .map_err(|e| E2eError::ChromedriverStartup(e.to_string()))
    }

    /// Get the base URL for this driver
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stop the driver
    pub fn stop(&mut self) -> E2eResult<()> {
        if let Ok(Some(_)) = self.child.try_wait() {
            return Ok(());
        }

        info!("Stopping chromedriver (pid: {})", self.child.id());

        // Try graceful shutdown first
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(200));
            }
        }

        // Force kill if still running
        let _ = self.child.kill();
        self.child.wait()?;

        Ok(())
    }
}

impl Drop for DriverProcess {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Configuration for spawning chromedriver
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Path to the chromedriver binary
    pub binary_path: PathBuf,

    /// Port to listen on (None = find free port)
    pub port: Option<u16>,

    /// Timeout for driver startup
    pub startup_timeout: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from("bin/chromedriver"),
            port: None,
            startup_timeout: Duration::from_secs(15),
        }
    }
}

/// Find a free port to use
fn find_free_port() -> E2eResult<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}
