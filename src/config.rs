//! System configuration parameters
//!
//! All tunable parameters for the TempSense controller. Values are
//! compiled-in defaults; there is no runtime config loading.

use serde::{Deserialize, Serialize};

use crate::app::ports::AdcScale;
use crate::error::{Error, Result};
use crate::pins;

/// ADC1 at 12 bits and 12 dB attenuation, full scale about 3.3 V.
#[cfg(target_os = "espidf")]
const ADC_FULL_SCALE: (f64, u16) = (3.3, 4095);

/// 10-bit converter with a 5 V reference, as on the reference board.
#[cfg(not(target_os = "espidf"))]
const ADC_FULL_SCALE: (f64, u16) = (5.0, 1023);

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- GPIO ---
    /// Status LED output pin
    pub led_gpio: i32,
    /// Push-button input pin (active-low, internal pull-up)
    pub button_gpio: i32,

    // --- Timing ---
    /// Quiet interval after a button edge (milliseconds)
    pub debounce_ms: u32,
    /// Sample-and-predict period (milliseconds)
    pub prediction_period_ms: u32,
    /// Watchdog timeout (milliseconds)
    pub watchdog_timeout_ms: u32,

    // --- Sensor ---
    /// ADC channel the temperature sensor is wired to
    pub sensor_channel: u8,
    /// ADC reference voltage (volts)
    pub adc_vref: f64,
    /// Full-scale ADC count
    pub adc_max_count: u16,

    // --- Training ---
    /// Gradient-descent epochs run at boot
    pub train_epochs: u32,
    /// Gradient-descent step size
    pub learning_rate: f64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // GPIO
            led_gpio: pins::LED_GPIO,
            button_gpio: pins::BUTTON_GPIO,

            // Timing
            debounce_ms: 300,
            prediction_period_ms: 100,
            watchdog_timeout_ms: 2000,

            // Sensor
            sensor_channel: pins::TEMP_ADC_CHANNEL,
            adc_vref: ADC_FULL_SCALE.0,
            adc_max_count: ADC_FULL_SCALE.1,

            // Training
            train_epochs: 500,
            learning_rate: 0.1,
        }
    }
}

impl SystemConfig {
    /// ADC conversion derived from `adc_vref` and `adc_max_count`.
    pub fn adc_scale(&self) -> AdcScale {
        AdcScale {
            vref: self.adc_vref,
            max_count: self.adc_max_count,
        }
    }

    /// Range-check every field. Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<()> {
        if self.led_gpio == self.button_gpio {
            return Err(Error::Config("led_gpio and button_gpio must differ"));
        }
        if !(10..=2000).contains(&self.debounce_ms) {
            return Err(Error::Config("debounce_ms must be 10–2000"));
        }
        if !(10..=60_000).contains(&self.prediction_period_ms) {
            return Err(Error::Config("prediction_period_ms must be 10–60000"));
        }
        if self.watchdog_timeout_ms <= self.debounce_ms {
            return Err(Error::Config("watchdog_timeout_ms must exceed debounce_ms"));
        }
        if !(self.adc_vref > 0.0 && self.adc_vref <= 5.5) {
            return Err(Error::Config("adc_vref must be in (0, 5.5] V"));
        }
        if self.adc_max_count == 0 {
            return Err(Error::Config("adc_max_count must be non-zero"));
        }
        if self.train_epochs == 0 {
            return Err(Error::Config("train_epochs must be at least 1"));
        }
        if !(self.learning_rate > 0.0) {
            return Err(Error::Config("learning_rate must be positive"));
        }
        Ok(())
    }
}
