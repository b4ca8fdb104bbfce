//! Application core.
//!
//! The [`controller`] wires the debounce, scheduling and supervisory logic
//! onto the hardware. All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod controller;
pub mod ports;
pub mod status;
