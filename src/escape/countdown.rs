//! Cancellable countdown owned by the host.
//!
//! The countdown only reports time remaining and whether it has expired. A
//! gameplay engine may observe it through [`TimeLimit`] but never starts or
//! stops it. Periodic tick callbacks run on a tokio task that is aborted on
//! [`Countdown::cancel`] or drop, so no callback outlives the play session.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use log::debug;
use tokio::task::JoinHandle;

/// Read-only view of a running time limit.
pub trait TimeLimit: Send + Sync {
    fn remaining(&self) -> Duration;

    fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }
}

pub struct Countdown {
    limit: Duration,
    deadline: Instant,
    frozen: Mutex<Option<Duration>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl Countdown {
    /// Countdown without a tick callback.
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            deadline: Instant::now() + limit,
            frozen: Mutex::new(None),
            ticker: Mutex::new(None),
        }
    }

    /// Start a countdown that calls `on_tick` with the time remaining every
    /// `every`, and once more with zero when it runs out. Must be called
    /// from within a tokio runtime.
    pub fn start<F>(limit: Duration, every: Duration, mut on_tick: F) -> Arc<Self>
    where
        F: FnMut(Duration) + Send + 'static,
    {
        let countdown = Arc::new(Self::new(limit));
        let deadline = tokio::time::Instant::from_std(countdown.deadline);
        let every = every.max(Duration::from_millis(1));
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;
            loop {
                let now = tokio::time::Instant::now();
                if now >= deadline {
                    on_tick(Duration::ZERO);
                    break;
                }
                on_tick(deadline - now);
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
        });
        if let Ok(mut ticker) = countdown.ticker.lock() {
            *ticker = Some(handle);
        }
        countdown
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Stop ticking and freeze the remaining time.
    pub fn cancel(&self) {
        let remaining = self.live_remaining();
        if let Ok(mut frozen) = self.frozen.lock() {
            if frozen.is_none() {
                *frozen = Some(remaining);
            }
        }
        if let Ok(mut ticker) = self.ticker.lock() {
            if let Some(handle) = ticker.take() {
                handle.abort();
                debug!("Countdown cancelled with {:?} remaining", remaining);
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.frozen.lock().map(|f| f.is_some()).unwrap_or(false)
    }

    fn live_remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

impl TimeLimit for Countdown {
    fn remaining(&self) -> Duration {
        match self.frozen.lock() {
            Ok(frozen) => frozen.unwrap_or_else(|| self.live_remaining()),
            Err(_) => self.live_remaining(),
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        if let Ok(mut ticker) = self.ticker.lock() {
            if let Some(handle) = ticker.take() {
                handle.abort();
            }
        }
    }
}

/// Format a duration as `MM:SS` for status lines.
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
