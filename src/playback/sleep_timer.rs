//! Countdown that pauses playback when it runs out.
//!
//! The countdown runs as a tokio task. It reports the remaining time once
//! immediately and then once per second, and fires its expiry callback exactly
//! once unless cancelled first.

use std::time::Duration;

use {
    tokio::{
        runtime::Handle,
        task::JoinHandle,
        time::{Instant, MissedTickBehavior, interval},
    },
    tracing::{debug, warn},
};

/// Cadence of remaining-time reports.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Single active countdown; starting a new one replaces the old.
#[derive(Debug, Default)]
pub struct SleepTimer {
    handle: Option<JoinHandle<()>>,
    deadline: Option<Instant>,
}

impl SleepTimer {
    /// Creates an idle timer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a countdown of `duration`, cancelling any running one.
    ///
    /// `on_tick` receives the remaining time right away and then every
    /// second while time remains; `on_expire` runs once at the end. A zero
    /// duration expires without ticking. Returns `false` when called outside
    /// a tokio runtime, in which case nothing is scheduled.
    pub fn start<T, X>(&mut self, duration: Duration, on_tick: T, on_expire: X) -> bool
    where
        T: Fn(Duration) + Send + 'static,
        X: FnOnce() + Send + 'static,
    {
        self.cancel();

        let Ok(runtime) = Handle::try_current() else {
            warn!("Sleep timer requested outside of an async runtime");
            return false;
        };

        let deadline = Instant::now() + duration;
        debug!(seconds = duration.as_secs(), "Starting sleep timer");

        self.deadline = Some(deadline);
        self.handle = Some(runtime.spawn(async move {
            let mut ticker = interval(TICK_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break;
                }
                on_tick(remaining);
                if remaining < TICK_INTERVAL {
                    tokio::time::sleep_until(deadline).await;
                    break;
                }
            }
            debug!("Sleep timer expired");
            on_expire();
        }));
        true
    }

    /// Stops the countdown without firing its expiry.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Sleep timer cancelled");
        }
        self.deadline = None;
    }

    /// Whether a countdown is still running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Time left on the running countdown.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        if !self.is_active() {
            return None;
        }
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}

impl Drop for SleepTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
