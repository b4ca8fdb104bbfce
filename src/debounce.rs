//! Button debounce state machine.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up; the GPIO raises an interrupt
//! on every level change. Contact bounce produces a burst of further edges.
//!
//! ## Protocol
//!
//! ```text
//!            button edge                      debounce expiry
//!   Idle ───────────────────▶ Suppressed ───────────────────▶ Idle
//!          1. mask line irq                 1. stop timer
//!          2. start timer                   2. unmask line irq
//!          3. read pin → pressed?
//! ```
//!
//! Masking happens first, at the interrupt source, so bounce edges never
//! reach software. There is no software "suppressed" flag: the state is
//! the debounce timer's running state. If the timer refuses to start, the
//! line is unmasked again so it can never stay masked while `Idle`.

use crate::app::ports::{DigitalLine, PeriodicTimer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// Button interrupts enabled.
    Idle,
    /// Button interrupts masked, debounce timer running.
    Suppressed,
}

pub struct Debouncer<'a> {
    line: &'a dyn DigitalLine,
    timer: &'a dyn PeriodicTimer,
}

impl<'a> Debouncer<'a> {
    pub fn new(line: &'a dyn DigitalLine, timer: &'a dyn PeriodicTimer) -> Self {
        Self { line, timer }
    }

    /// `Idle → Suppressed`. Returns whether the pin reads pressed.
    ///
    /// Runs in the button interrupt.
    pub fn on_edge(&self) -> bool {
        self.line.enable_interrupt_on_port(false);
        self.timer.start();
        if !self.timer.is_running() {
            self.line.enable_interrupt_on_port(true);
        }
        self.line.read()
    }

    /// `Suppressed → Idle`. Runs in the debounce timer callback.
    pub fn on_expiry(&self) {
        self.timer.stop();
        self.line.enable_interrupt_on_port(true);
    }

    pub fn state(&self) -> DebounceState {
        if self.timer.is_running() {
            DebounceState::Suppressed
        } else {
            DebounceState::Idle
        }
    }

    /// Stop the timer without unmasking; used on shutdown.
    pub fn halt(&self) {
        self.timer.stop();
    }
}
