//! One-shot ADC driver for the temperature sensor input.
//!
//! On ESP-IDF the conversion runs on ADC1 at native 12-bit width; the
//! configured scale must describe that converter (3.3 V / 4095 counts by
//! default). On host/test each channel holds an injectable raw value.

use core::sync::atomic::{AtomicBool, Ordering};

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::AtomicU16;

#[cfg(target_os = "espidf")]
use core::sync::atomic::AtomicPtr;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use crate::app::ports::{AdcScale, AnalogInput};

use super::hw_init::HwInitError;

#[cfg(not(target_os = "espidf"))]
const SIM_CHANNELS: usize = 8;

#[cfg(target_os = "espidf")]
const NATIVE_MAX: u16 = 4095;

pub struct Adc {
    scale: AdcScale,
    enabled: AtomicBool,
    #[cfg(target_os = "espidf")]
    unit: AtomicPtr<adc_oneshot_unit_ctx_t>,
    #[cfg(not(target_os = "espidf"))]
    raw: [AtomicU16; SIM_CHANNELS],
}

impl Adc {
    /// Bring up ADC1 and configure `channel`. The converter starts disabled.
    #[cfg(target_os = "espidf")]
    pub fn new(scale: AdcScale, channel: u8) -> Result<Self, HwInitError> {
        let init_cfg = adc_oneshot_unit_init_cfg_t {
            unit_id: adc_unit_t_ADC_UNIT_1,
            ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
            ..Default::default()
        };
        let mut unit: adc_oneshot_unit_handle_t = core::ptr::null_mut();
        // SAFETY: the handle is owned by this struct and deleted in Drop.
        let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &mut unit) };
        if ret != ESP_OK {
            return Err(HwInitError::AdcInitFailed(ret));
        }

        let chan_cfg = adc_oneshot_chan_cfg_t {
            atten: adc_atten_t_ADC_ATTEN_DB_12,
            bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
        };
        let ret = unsafe { adc_oneshot_config_channel(unit, u32::from(channel), &chan_cfg) };
        if ret != ESP_OK {
            unsafe { adc_oneshot_del_unit(unit) };
            return Err(HwInitError::AdcInitFailed(ret));
        }

        if scale.max_count != NATIVE_MAX {
            log::warn!(
                "adc: scale expects {} counts, ADC1 delivers {}",
                scale.max_count,
                NATIVE_MAX
            );
        }
        log::info!("adc: ADC1 CH{} configured ({:.2} V full scale)", channel, scale.vref);
        Ok(Self {
            scale,
            enabled: AtomicBool::new(false),
            unit: AtomicPtr::new(unit),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(scale: AdcScale, channel: u8) -> Result<Self, HwInitError> {
        log::info!("adc(sim): CH{} ({} counts)", channel, scale.max_count);
        Ok(Self {
            scale,
            enabled: AtomicBool::new(false),
            raw: core::array::from_fn(|_| AtomicU16::new(0)),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Inject a raw conversion result, clamped to full scale.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_raw(&self, channel: u8, raw: u16) {
        if let Some(slot) = self.raw.get(usize::from(channel)) {
            slot.store(raw.min(self.scale.max_count), Ordering::Release);
        }
    }

    /// Inject the count nearest to `volts`.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_voltage(&self, channel: u8, volts: f64) {
        let counts = (volts / self.scale.vref * f64::from(self.scale.max_count)).round();
        let counts = counts.clamp(0.0, f64::from(self.scale.max_count)) as u16;
        self.set_raw(channel, counts);
    }

    #[cfg(target_os = "espidf")]
    fn convert(&self, channel: u8) -> u16 {
        let mut raw: i32 = 0;
        let unit = self.unit.load(Ordering::Acquire);
        // SAFETY: unit handle is valid for the lifetime of self. The press
        // path samples from the GPIO ISR, where only the _isr variant is
        // allowed.
        let ret = unsafe {
            if xPortInIsrContext() != 0 {
                adc_oneshot_read_isr(unit, u32::from(channel), &mut raw)
            } else {
                adc_oneshot_read(unit, u32::from(channel), &mut raw)
            }
        };
        if ret != ESP_OK {
            return 0;
        }
        raw.clamp(0, i32::from(self.scale.max_count)) as u16
    }

    #[cfg(not(target_os = "espidf"))]
    fn convert(&self, channel: u8) -> u16 {
        self.raw
            .get(usize::from(channel))
            .map_or(0, |slot| slot.load(Ordering::Acquire))
    }
}

impl AnalogInput for Adc {
    fn set_enabled(&self, enable: bool) {
        self.enabled.store(enable, Ordering::Release);
    }

    /// Reads 0 while the converter is disabled.
    fn read(&self, channel: u8) -> u16 {
        if !self.is_enabled() {
            return 0;
        }
        self.convert(channel)
    }

    fn scale(&self) -> AdcScale {
        self.scale
    }
}

#[cfg(target_os = "espidf")]
impl Drop for Adc {
    fn drop(&mut self) {
        // SAFETY: handle came from adc_oneshot_new_unit and is released once.
        unsafe { adc_oneshot_del_unit(*self.unit.get_mut()) };
    }
}
