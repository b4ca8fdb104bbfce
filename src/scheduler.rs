//! Prediction scheduler.
//!
//! A recurring timer whose every expiry runs one sample-and-predict cycle.
//! Two stimuli produce that cycle:
//!
//! ```text
//! ┌──────────────────┐        ┌──────────────────┐
//! │ Periodic expiry  │        │ Manual press     │
//! └────────┬─────────┘        └────────┬─────────┘
//!          │ keep running              │ restart: full period
//!          ▼                           ▼  from the press moment
//!     ┌─────────────────────────────────────────┐
//!     │        sample → predict → emit          │
//!     └─────────────────────────────────────────┘
//! ```
//!
//! A press snoozes the cadence rather than stacking an extra expiry: an
//! expiry that was about to fire is pushed a whole period out.

use crate::app::ports::PeriodicTimer;

pub struct PredictionScheduler<'a> {
    timer: &'a dyn PeriodicTimer,
}

impl<'a> PredictionScheduler<'a> {
    pub fn new(timer: &'a dyn PeriodicTimer) -> Self {
        Self { timer }
    }

    pub fn start(&self) {
        self.timer.start();
    }

    pub fn stop(&self) {
        self.timer.stop();
    }

    /// Re-prime after a manual press.
    pub fn snooze(&self) {
        self.timer.restart();
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn period_ms(&self) -> u32 {
        self.timer.period_ms()
    }
}
