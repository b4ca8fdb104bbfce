//! Status line emitted after every sample-and-predict cycle.
//!
//! ```text
//! ADC: 307, input: 1500 mV, predicted output: 100
//! ```
//!
//! The boot report uses the same rounding without the ADC field.

use core::fmt;

use crate::app::ports::SerialPort;
use crate::ml::Predictor;

/// Round to the nearest integer, halves away from zero.
///
/// `2.7 → 3`, `2.5 → 3`, `-2.4 → -2`, `-2.6 → -3`. Out-of-range values
/// saturate at the `i32` bounds.
pub fn round_half_away(value: f64) -> i32 {
    if value >= 0.0 {
        (value + 0.5) as i32
    } else {
        (value - 0.5) as i32
    }
}

/// One sample-and-predict result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusLine {
    /// Raw ADC count.
    pub raw: u16,
    /// Converted input voltage.
    pub volts: f64,
    /// Unrounded model output.
    pub prediction: f64,
}

impl StatusLine {
    pub fn millivolts(&self) -> i32 {
        round_half_away(self.volts * 1000.0)
    }

    pub fn rounded_prediction(&self) -> i32 {
        round_half_away(self.prediction)
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ADC: {}, input: {} mV, predicted output: {}",
            self.raw,
            self.millivolts(),
            self.rounded_prediction()
        )
    }
}

/// Print the model's output for every training input.
pub fn report_fit(serial: &dyn SerialPort, inputs: &[f64], model: &dyn Predictor) {
    for &input in inputs {
        serial.print(format_args!(
            "Input: {} mV, predicted output: {}",
            round_half_away(input * 1000.0),
            round_half_away(model.predict(input))
        ));
    }
}
