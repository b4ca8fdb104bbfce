//! Peripheral drivers and one-shot hardware initialisation.
//!
//! Each driver implements one port trait from [`crate::app::ports`] and has
//! an ESP-IDF backend plus a host simulation backend selected by
//! `target_os`.

pub mod adc;
pub mod gpio;
pub mod hw_init;
pub mod hw_timer;
pub mod serial;
pub mod watchdog;
