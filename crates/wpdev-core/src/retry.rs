use std::fmt::Display;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Bounded retry with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    times: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// `times` counts every attempt, the first one included. Zero is treated as one.
    pub fn new(times: u32, delay: Duration) -> Self {
        Self {
            times: times.max(1),
            delay,
        }
    }

    pub fn times(&self) -> u32 {
        self.times
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Suspends the calling thread. Injected so tests run without waiting.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Records requested sleeps and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.slept.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn total(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        if let Ok(mut slept) = self.slept.lock() {
            slept.push(duration);
        }
    }
}

/// Run `operation` until it succeeds or `policy.times()` attempts have failed.
///
/// Sleeps `policy.delay()` between attempts, never after the last one. The
/// error of the final attempt is returned as is.
pub fn retry<T, E, F>(policy: RetryPolicy, sleeper: &dyn Sleeper, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: Display,
{
    let mut attempts = 0;

    loop {
        attempts += 1;

        match operation() {
            Ok(value) => return Ok(value),
            Err(error) => {
                if attempts >= policy.times {
                    return Err(error);
                }
                debug!(
                    attempt = attempts,
                    max_attempts = policy.times,
                    delay_ms = policy.delay.as_millis(),
                    error = %error,
                    "retrying operation"
                );
                sleeper.sleep(policy.delay);
            }
        }
    }
}
