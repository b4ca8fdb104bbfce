//! Supervisory loop.
//!
//! The foreground does no real work: all of it happens in interrupt and
//! timer callbacks. The loop exists to prove liveness by resetting the
//! watchdog on every iteration. If a callback stalls long enough that the
//! loop misses the watchdog window, the hardware restarts the whole
//! process. That restart is the only recovery path.

use crate::app::ports::WatchdogPort;

pub struct Supervisor<'a> {
    watchdog: &'a dyn WatchdogPort,
}

impl<'a> Supervisor<'a> {
    pub fn new(watchdog: &'a dyn WatchdogPort) -> Self {
        Self { watchdog }
    }

    /// One loop iteration.
    pub fn step(&self) {
        self.watchdog.reset();
    }

    /// Busy-loop forever, resetting the watchdog each iteration.
    pub fn run(&self) -> ! {
        loop {
            self.step();
        }
    }

    /// Like [`run`](Self::run), calling `idle` before every watchdog reset.
    ///
    /// `idle` must return well within the watchdog timeout.
    pub fn run_with(&self, mut idle: impl FnMut()) -> ! {
        loop {
            idle();
            self.step();
        }
    }
}
