//! Interrupt vector table.
//!
//! Hardware vectors are fixed-signature `fn()` entry points. They reach the
//! controller through one process-wide handle that is installed exactly
//! once, before any interrupt source is enabled.
//!
//! ```text
//! ┌────────────┐     ┌──────────────────────┐     ┌───────────────────┐
//! │ GPIO ISR   │────▶│ button_edge()        │────▶│                   │
//! │ esp_timer  │────▶│ debounce_expired()   │────▶│ InterruptHandlers │
//! │ esp_timer  │────▶│ prediction_expired() │────▶│   (Controller)    │
//! └────────────┘     └──────────────────────┘     └───────────────────┘
//! ```
//!
//! Vectors that fire before [`install`] are dropped.

use core::cell::Cell;

use critical_section::Mutex;

use crate::error::{Error, Result};

/// The three interrupt entry points of the controller.
pub trait InterruptHandlers: Sync {
    fn on_button_edge(&self);
    fn on_debounce_expired(&self);
    fn on_prediction_expired(&self);
}

static HANDLERS: Mutex<Cell<Option<&'static dyn InterruptHandlers>>> =
    Mutex::new(Cell::new(None));

/// Install the process-wide handler. Fails if one is already installed.
pub fn install(handlers: &'static dyn InterruptHandlers) -> Result<()> {
    critical_section::with(|cs| {
        let slot = HANDLERS.borrow(cs);
        if slot.get().is_some() {
            return Err(Error::Init("interrupt handlers already installed"));
        }
        slot.set(Some(handlers));
        Ok(())
    })
}

/// Whether [`install`] has run.
pub fn is_installed() -> bool {
    critical_section::with(|cs| HANDLERS.borrow(cs).get().is_some())
}

/// Button line edge vector.
pub fn button_edge() {
    dispatch(|h| h.on_button_edge());
}

/// Debounce timer expiry vector.
pub fn debounce_expired() {
    dispatch(|h| h.on_debounce_expired());
}

/// Prediction timer expiry vector.
pub fn prediction_expired() {
    dispatch(|h| h.on_prediction_expired());
}

// The handler runs outside the critical section so other interrupts stay
// live while it works.
fn dispatch(f: impl FnOnce(&'static dyn InterruptHandlers)) {
    if let Some(handlers) = critical_section::with(|cs| HANDLERS.borrow(cs).get()) {
        f(handlers);
    }
}
