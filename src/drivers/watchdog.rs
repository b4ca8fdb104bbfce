//! Task Watchdog Timer (TWDT) driver.
//!
//! Wraps the ESP-IDF TWDT API to reset the device if the supervisory loop
//! stalls for longer than the configured timeout. Subscription of the
//! calling task happens on `set_enabled(true)`, not at construction.
//!
//! The supervisory loop must call `reset()` on every iteration.

use core::sync::atomic::{AtomicBool, Ordering};

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::AtomicU32;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::app::ports::WatchdogPort;

pub struct Watchdog {
    timeout_ms: u32,
    enabled: AtomicBool,
    #[cfg(not(target_os = "espidf"))]
    resets: AtomicU32,
}

impl Watchdog {
    pub fn new(timeout_ms: u32) -> Self {
        #[cfg(not(target_os = "espidf"))]
        log::info!("Watchdog(sim): {} ms, reset counter only", timeout_ms);

        Self {
            timeout_ms,
            enabled: AtomicBool::new(false),
            #[cfg(not(target_os = "espidf"))]
            resets: AtomicU32::new(0),
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Resets accepted while enabled.
    #[cfg(not(target_os = "espidf"))]
    pub fn reset_count(&self) -> u32 {
        self.resets.load(Ordering::Acquire)
    }

    #[cfg(target_os = "espidf")]
    fn subscribe(&self) -> bool {
        unsafe {
            let cfg = esp_task_wdt_config_t {
                timeout_ms: self.timeout_ms,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            let ret = esp_task_wdt_reconfigure(&cfg);
            if ret != ESP_OK {
                log::warn!("TWDT reconfigure returned {} (may already be configured)", ret);
            }

            let ret = esp_task_wdt_add(core::ptr::null_mut());
            if ret == ESP_OK {
                info!("Watchdog: subscribed ({} ms timeout, panic on trigger)", self.timeout_ms);
                true
            } else {
                log::warn!("Watchdog: failed to subscribe ({})", ret);
                false
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn unsubscribe(&self) {
        // SAFETY: removes the calling task; harmless if it was never added.
        unsafe { esp_task_wdt_delete(core::ptr::null_mut()) };
    }
}

impl WatchdogPort for Watchdog {
    fn set_enabled(&self, enable: bool) {
        let was = self.enabled.swap(enable, Ordering::AcqRel);
        if was == enable {
            return;
        }
        #[cfg(target_os = "espidf")]
        {
            if enable {
                if !self.subscribe() {
                    self.enabled.store(false, Ordering::Release);
                }
            } else {
                self.unsubscribe();
            }
        }
    }

    fn reset(&self) {
        if !self.is_enabled() {
            return;
        }
        #[cfg(target_os = "espidf")]
        unsafe {
            esp_task_wdt_reset();
        }
        #[cfg(not(target_os = "espidf"))]
        self.resets.fetch_add(1, Ordering::AcqRel);
    }
}
