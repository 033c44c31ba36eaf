//! The refresh scheduler.
//!
//! At most one periodic task exists at a time. Scheduling a new period stops
//! the previous task before the new one is spawned, under a single lock, so
//! two schedules never coexist.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::InputError;

/// A validated, positive refresh period in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshPeriod(Duration);

impl RefreshPeriod {
    /// Create a period from seconds, rejecting zero.
    pub fn from_secs(secs: u64) -> Result<Self, InputError> {
        if secs == 0 {
            return Err(InputError::RefreshPeriod(secs.to_string()));
        }
        Ok(Self(Duration::from_secs(secs)))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn as_secs(&self) -> u64 {
        self.0.as_secs()
    }
}

impl FromStr for RefreshPeriod {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .ok()
            .and_then(|secs| Self::from_secs(secs).ok())
            .ok_or_else(|| InputError::RefreshPeriod(s.to_string()))
    }
}

impl fmt::Display for RefreshPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.as_secs())
    }
}

struct RefreshHandle {
    period: RefreshPeriod,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    fn stop(self) {
        let _ = self.stop_tx.send(true);
    }
}

/// Owns the single periodic refresh task.
#[derive(Default)]
pub struct RefreshScheduler {
    active: Mutex<Option<RefreshHandle>>,
}

impl fmt::Debug for RefreshScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshScheduler")
            .field("period", &self.period())
            .finish()
    }
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `tick` every `period`, starting immediately, replacing any
    /// existing schedule.
    ///
    /// A tick already in progress on the old schedule runs to completion;
    /// the old task then exits without ticking again.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F, Fut>(&self, period: RefreshPeriod, tick: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut active = self.active.lock();
        if let Some(previous) = active.take() {
            tracing::info!(from = %previous.period, to = %period, "Replacing refresh schedule");
            previous.stop();
        } else {
            tracing::info!(period = %period, "Starting refresh schedule");
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut timer = tokio::time::interval(period.as_duration());
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    changed = stop_rx.changed() => {
                        // A dropped sender also means stop.
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                    _ = timer.tick() => {
                        tick().await;
                    }
                }
            }
        });

        *active = Some(RefreshHandle {
            period,
            stop_tx,
            task,
        });
    }

    /// Stop the current schedule, if any. Returns whether one was running.
    pub fn cancel(&self) -> bool {
        match self.active.lock().take() {
            Some(handle) => {
                tracing::info!(period = %handle.period, "Refresh schedule cancelled");
                handle.stop();
                true
            }
            None => false,
        }
    }

    /// Period of the current schedule.
    pub fn period(&self) -> Option<RefreshPeriod> {
        self.active.lock().as_ref().map(|h| h.period)
    }

    pub fn is_active(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|h| !h.task.is_finished())
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.active.get_mut().take() {
            handle.stop();
        }
    }
}
