//! "Movement stop" watchdog
//!
//! Covers report their position while moving but send nothing once they
//! stop. The watchdog notices the silence: every `interval` it counts down
//! the remaining time, and when the countdown runs out it asks for a
//! position query. After `max_queries` unanswered queries it gives up.
//!
//! [`WatchdogTimer`] holds the countdown; it is owned by the cover and
//! mutated under the cover's lock. The periodic task started by [`spawn`]
//! only drives the ticks.

use enocean_config_entries::WatchdogConfig;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

/// Outcome of a watchdog tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Watchdog not armed
    Disabled,
    /// Countdown still running
    Waiting,
    /// Countdown expired: send a position query
    Query,
    /// Last query sent; the watchdog disarmed itself
    Exhausted,
}

/// Countdown state of a cover's watchdog
#[derive(Debug)]
pub struct WatchdogTimer {
    config: WatchdogConfig,
    remaining: Duration,
    queries_remaining: u32,
    token: Option<CancellationToken>,
}

impl WatchdogTimer {
    pub fn new(config: WatchdogConfig) -> Self {
        Self {
            config,
            remaining: Duration::ZERO,
            queries_remaining: 0,
            token: None,
        }
    }

    pub fn config(&self) -> &WatchdogConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.token.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn queries_remaining(&self) -> u32 {
        self.queries_remaining
    }

    /// Reset the countdown and the query budget
    ///
    /// Returns a fresh token when no task is running; the caller must start
    /// one with it.
    pub fn arm_or_feed(&mut self) -> Option<CancellationToken> {
        self.remaining = self.config.timeout();
        self.queries_remaining = self.config.max_queries;

        if self.is_enabled() {
            return None;
        }

        let token = CancellationToken::new();
        self.token = Some(token.clone());
        Some(token)
    }

    /// Deactivate the watchdog; its task exits on the next wake
    pub fn disarm(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }

    /// Advance the countdown by one interval
    pub fn tick(&mut self) -> Tick {
        if !self.is_enabled() {
            return Tick::Disabled;
        }

        if !self.remaining.is_zero() {
            self.remaining = self.remaining.saturating_sub(self.config.interval());
            return Tick::Waiting;
        }

        self.remaining = self.config.timeout();
        self.queries_remaining = self.queries_remaining.saturating_sub(1);
        if self.queries_remaining == 0 {
            self.disarm();
            Tick::Exhausted
        } else {
            Tick::Query
        }
    }
}

/// Start the periodic watchdog task on the current runtime
///
/// `on_tick` runs once per `period` until it returns `false` or `token` is
/// cancelled. Returns `false` (and cancels `token`) when there is no runtime
/// to spawn on.
pub fn spawn<F>(token: CancellationToken, period: Duration, on_tick: F) -> bool
where
    F: FnMut(&CancellationToken) -> bool + Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => {
            handle.spawn(run(token, period, on_tick));
            true
        }
        Err(_) => {
            warn!("No async runtime available, watchdog not started");
            token.cancel();
            false
        }
    }
}

async fn run<F>(token: CancellationToken, period: Duration, mut on_tick: F)
where
    F: FnMut(&CancellationToken) -> bool + Send + 'static,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                if !on_tick(&token) {
                    break;
                }
            }
        }
    }
    trace!("Watchdog task exited");
}
