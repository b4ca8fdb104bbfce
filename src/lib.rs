//! TempSense firmware library.
//!
//! Exposes the control logic and drivers for integration testing. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module; host builds get the simulation backends.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod debounce;
pub mod error;
pub mod isr;
pub mod ml;
pub mod pins;
pub mod scheduler;
pub mod supervisor;

pub mod adapters;
pub mod drivers;
