//! GPIO line driver for the button and the status LED.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: `gpio_config` at construction, level access through
//! `gpio_get_level`/`gpio_set_level`, and the per-pin interrupt enable bit
//! as the interrupt-source mask.
//! On host/test: the physical level lives in an atomic and
//! [`GpioLine::set_input`] plays the role of the outside world, raising
//! the edge vector only when the hardware would.
//!
//! Edges are reported on both directions (pin-change semantics); the
//! handler reads the level to tell press from release.
//!
//! The line also implements the `embedded-hal` digital traits on the
//! physical level, so it can be handed to generic HAL code.

use core::convert::Infallible;
use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::digital::{ErrorType, InputPin, OutputPin, StatefulOutputPin};

use crate::app::ports::DigitalLine;

use super::hw_init::HwInitError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

pub struct GpioLine {
    pin: i32,
    active_low: bool,
    on_edge: Option<fn()>,
    irq_enabled: AtomicBool,
    port_unmasked: AtomicBool,
    #[cfg(not(target_os = "espidf"))]
    level: AtomicBool,
}

impl GpioLine {
    /// Push-pull output, active HIGH, driven low at construction.
    pub fn output(pin: i32) -> Result<Self, HwInitError> {
        #[cfg(target_os = "espidf")]
        {
            let cfg = gpio_config_t {
                pin_bit_mask: 1u64 << pin,
                mode: gpio_mode_t_GPIO_MODE_OUTPUT,
                pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
                pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
                intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
            };
            // SAFETY: called once per pin from the main task during bring-up.
            let ret = unsafe { gpio_config(&cfg) };
            if ret != ESP_OK {
                return Err(HwInitError::GpioConfigFailed(ret));
            }
            unsafe { gpio_set_level(pin, 0) };
        }

        Ok(Self::build(pin, false, None))
    }

    /// Input with internal pull-up, active LOW, raising `on_edge` on every
    /// level change once interrupts are enabled.
    pub fn button(pin: i32, on_edge: fn()) -> Result<Self, HwInitError> {
        #[cfg(target_os = "espidf")]
        {
            let cfg = gpio_config_t {
                pin_bit_mask: 1u64 << pin,
                mode: gpio_mode_t_GPIO_MODE_INPUT,
                pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
                pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
                intr_type: gpio_int_type_t_GPIO_INTR_ANYEDGE,
            };
            // SAFETY: called once per pin from the main task during bring-up.
            let ret = unsafe { gpio_config(&cfg) };
            if ret != ESP_OK {
                return Err(HwInitError::GpioConfigFailed(ret));
            }
            // Nothing may fire until the controller enables the line.
            unsafe { gpio_intr_disable(pin) };
        }

        let line = Self::build(pin, true, Some(on_edge));
        #[cfg(not(target_os = "espidf"))]
        line.level.store(true, Ordering::Relaxed); // pulled up
        Ok(line)
    }

    fn build(pin: i32, active_low: bool, on_edge: Option<fn()>) -> Self {
        Self {
            pin,
            active_low,
            on_edge,
            irq_enabled: AtomicBool::new(false),
            port_unmasked: AtomicBool::new(true),
            #[cfg(not(target_os = "espidf"))]
            level: AtomicBool::new(false),
        }
    }

    pub fn pin(&self) -> i32 {
        self.pin
    }

    /// Line interrupt enabled by [`DigitalLine::enable_interrupt`].
    pub fn interrupt_enabled(&self) -> bool {
        self.irq_enabled.load(Ordering::Acquire)
    }

    /// Interrupt source currently unmasked.
    pub fn port_unmasked(&self) -> bool {
        self.port_unmasked.load(Ordering::Acquire)
    }

    fn edges_reach_software(&self) -> bool {
        self.interrupt_enabled() && self.port_unmasked()
    }

    #[cfg(target_os = "espidf")]
    fn physical_level(&self) -> bool {
        // SAFETY: register read on a configured pin; ISR-safe.
        (unsafe { gpio_get_level(self.pin) }) != 0
    }

    #[cfg(not(target_os = "espidf"))]
    fn physical_level(&self) -> bool {
        self.level.load(Ordering::Acquire)
    }

    #[cfg(target_os = "espidf")]
    fn set_physical(&self, high: bool) {
        // SAFETY: register write on a configured output pin.
        unsafe { gpio_set_level(self.pin, u32::from(high)) };
    }

    #[cfg(not(target_os = "espidf"))]
    fn set_physical(&self, high: bool) {
        self.level.store(high, Ordering::Release);
    }

    #[cfg(target_os = "espidf")]
    fn apply_hw_mask(&self) {
        // SAFETY: per-pin interrupt enable bit; callable from ISR context.
        unsafe {
            if self.edges_reach_software() {
                gpio_intr_enable(self.pin);
            } else {
                gpio_intr_disable(self.pin);
            }
        }
    }

    /// Simulate the outside world driving the input to `active`.
    ///
    /// Returns `true` if the edge reached software (the vector ran).
    #[cfg(not(target_os = "espidf"))]
    pub fn set_input(&self, active: bool) -> bool {
        let physical = active != self.active_low;
        if self.level.swap(physical, Ordering::AcqRel) == physical {
            return false;
        }
        match self.on_edge {
            Some(vector) if self.edges_reach_software() => {
                vector();
                true
            }
            _ => false,
        }
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn gpio_trampoline(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the `fn()` registered in `enable_interrupt`.
    let vector = unsafe { core::mem::transmute::<*mut core::ffi::c_void, fn()>(arg) };
    vector();
}

impl DigitalLine for GpioLine {
    fn read(&self) -> bool {
        self.physical_level() != self.active_low
    }

    fn write(&self, active: bool) {
        self.set_physical(active != self.active_low);
    }

    fn enable_interrupt(&self, enable: bool) {
        #[cfg(target_os = "espidf")]
        {
            if let Some(vector) = self.on_edge {
                // SAFETY: the ISR service is installed during bring-up; the
                // handler argument is a plain function pointer.
                unsafe {
                    if enable {
                        gpio_isr_handler_add(
                            self.pin,
                            Some(gpio_trampoline),
                            vector as *mut core::ffi::c_void,
                        );
                    } else {
                        gpio_intr_disable(self.pin);
                        gpio_isr_handler_remove(self.pin);
                    }
                }
            }
        }
        self.irq_enabled.store(enable, Ordering::Release);
        #[cfg(target_os = "espidf")]
        self.apply_hw_mask();
    }

    fn enable_interrupt_on_port(&self, enable: bool) {
        self.port_unmasked.store(enable, Ordering::Release);
        #[cfg(target_os = "espidf")]
        self.apply_hw_mask();
    }
}

// ── embedded-hal ──────────────────────────────────────────────

impl ErrorType for GpioLine {
    type Error = Infallible;
}

impl InputPin for GpioLine {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.physical_level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.physical_level())
    }
}

impl OutputPin for GpioLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_physical(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_physical(true);
        Ok(())
    }
}

impl StatefulOutputPin for GpioLine {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.physical_level())
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.physical_level())
    }
}
