//! Fixed-interval polling under a deadline

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::error::{WaitError, WaitResult};
use crate::predicate::{Condition, Outcome};

/// Default time between evaluations.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default deadline for a wait.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Evaluates a condition until it holds or the deadline passes.
///
/// Blocks the calling thread. Only "not yet" is retried; any error from the
/// condition ends the poll immediately.
#[derive(Debug, Clone, Copy)]
pub struct Poller {
    timeout: Duration,
    interval: Duration,
}

impl Default for Poller {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Poller {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Poll `condition` against `handle`.
    ///
    /// The condition is consumed: stateful conditions must not outlive the
    /// poll they were built for.
    pub fn until<H, C>(&self, handle: &H, mut condition: C) -> WaitResult<C::Output>
    where
        H: ?Sized,
        C: Condition<H>,
    {
        let start = Instant::now();
        // a timeout too large to represent as an instant never expires
        let deadline = start.checked_add(self.timeout);
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            if let Outcome::Ready(value) = condition.evaluate(handle)? {
                debug!(
                    attempts,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Condition met: {}",
                    condition.describe()
                );
                return Ok(value);
            }
            trace!(attempts, "Not yet: {}", condition.describe());

            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        let elapsed = start.elapsed();
                        debug!(attempts, ?elapsed, "Timed out: {}", condition.describe());
                        return Err(WaitError::Timeout {
                            description: condition.describe(),
                            elapsed,
                        });
                    }
                    // The last sleep lands on the deadline so the final
                    // evaluation happens no later than one interval past it.
                    self.interval.min(deadline - now)
                }
                None => self.interval,
            };
            thread::sleep(pause);
        }
    }
}

/// Poll with the default interval.
pub fn poll<H, C>(handle: &H, condition: C, timeout: Duration) -> WaitResult<C::Output>
where
    H: ?Sized,
    C: Condition<H>,
{
    Poller::new(timeout).until(handle, condition)
}
