//! GPIO / peripheral pin assignments for the TempSense board.
//!
//! Single source of truth: the configuration defaults reference this module
//! rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Digital I/O
// ---------------------------------------------------------------------------

/// Status LED (active HIGH).
pub const LED_GPIO: i32 = 8;
/// Momentary push-button to GND with internal pull-up.
/// LOW = pressed. Every level change raises the button interrupt.
pub const BUTTON_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// Analog
// ---------------------------------------------------------------------------

/// TMP36 temperature sensor output.
/// ADC1 channel 0 (GPIO 1 on ESP32-S3).
pub const TEMP_ADC_CHANNEL: u8 = 0;
