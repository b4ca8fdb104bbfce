//! Port traits: the boundary between controller logic and the hardware.
//!
//! ```text
//!   Driver ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! Drivers implement these traits; the [`Controller`](super::controller::Controller)
//! borrows them as `&dyn` references, so tests can substitute mocks.
//!
//! ## Interrupt context
//!
//! Every port is shared between the foreground loop and interrupt
//! handlers, so all methods take `&self` and every trait requires `Sync`.
//! Implementations keep their mutable state in atomics or
//! `critical_section::Mutex` cells.

use core::fmt::{self, Write as _};

use crate::error::StorageError;

/// Capacity of one formatted serial message.
pub const SERIAL_LINE_CAP: usize = 128;

// ───────────────────────────────────────────────────────────────
// Digital line (button, LED)
// ───────────────────────────────────────────────────────────────

/// A single GPIO line. The edge callback is fixed when the driver is built.
pub trait DigitalLine: Sync {
    /// Logical level: `true` = active (pressed / lit), after any
    /// active-low inversion.
    fn read(&self) -> bool;

    /// Drive the line to the given logical level.
    fn write(&self, active: bool);

    /// Enable or disable edge interrupts for this line altogether.
    fn enable_interrupt(&self, enable: bool);

    /// Mask or unmask this line's interrupt source at the controller.
    ///
    /// While masked, edges never reach software. The debounce protocol
    /// relies on this.
    fn enable_interrupt_on_port(&self, enable: bool);
}

// ───────────────────────────────────────────────────────────────
// Periodic timer
// ───────────────────────────────────────────────────────────────

/// A recurring timer with a fixed period and expiry callback.
pub trait PeriodicTimer: Sync {
    /// Start counting a full period. No effect if already running.
    fn start(&self);

    /// Stop the timer; no further expiries until started again.
    fn stop(&self);

    /// Stop and start again, so the next expiry is one full period away.
    fn restart(&self);

    /// Whether the timer is counting.
    fn is_running(&self) -> bool;

    /// Fixed period in milliseconds.
    fn period_ms(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Analog input
// ───────────────────────────────────────────────────────────────

/// Linear ADC count → volts conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdcScale {
    /// Reference voltage at full scale.
    pub vref: f64,
    /// Count that corresponds to `vref`.
    pub max_count: u16,
}

impl AdcScale {
    pub fn to_volts(self, raw: u16) -> f64 {
        f64::from(raw) / f64::from(self.max_count) * self.vref
    }
}

/// Read-side port for the ADC.
pub trait AnalogInput: Sync {
    fn set_enabled(&self, enable: bool);

    /// Raw conversion result for `channel`.
    fn read(&self, channel: u8) -> u16;

    /// Conversion applied by [`input_voltage`](Self::input_voltage).
    fn scale(&self) -> AdcScale;

    /// Input voltage on `channel` in volts.
    fn input_voltage(&self, channel: u8) -> f64 {
        self.scale().to_volts(self.read(channel))
    }
}

// ───────────────────────────────────────────────────────────────
// Text output channel
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget serial output. Output while disabled is dropped.
pub trait SerialPort: Sync {
    fn set_enabled(&self, enable: bool);

    fn is_enabled(&self) -> bool;

    /// Emit a string verbatim.
    fn write_str(&self, s: &str);

    /// Format into a fixed-capacity buffer and emit it.
    ///
    /// Messages longer than [`SERIAL_LINE_CAP`] are truncated.
    fn print(&self, args: fmt::Arguments<'_>) {
        if !self.is_enabled() {
            return;
        }
        let mut line: heapless::String<SERIAL_LINE_CAP> = heapless::String::new();
        // A full buffer is the only error; keep what fitted.
        let _ = line.write_fmt(args);
        self.write_str(&line);
    }
}

// ───────────────────────────────────────────────────────────────
// Watchdog
// ───────────────────────────────────────────────────────────────

/// Hardware watchdog. Must be reset more often than its timeout.
pub trait WatchdogPort: Sync {
    fn set_enabled(&self, enable: bool);

    fn reset(&self);
}

// ───────────────────────────────────────────────────────────────
// Non-volatile single value
// ───────────────────────────────────────────────────────────────

/// One boolean that survives a power cycle (the last LED state).
pub trait NonVolatileStore: Sync {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<bool>, StorageError>;

    /// Persist atomically.
    fn store(&self, value: bool) -> Result<(), StorageError>;
}
