//! Periodic hardware timer using ESP-IDF's esp_timer API.
//!
//! Each timer carries a fixed period and a `fn()` expiry vector (one of the
//! [`isr`](crate::isr) entry points). On simulation targets the countdown is
//! a millisecond counter advanced explicitly with [`HwTimer::tick`].
//!
//! Timer callbacks execute in the ESP timer task context (not ISR).

use core::sync::atomic::{AtomicBool, Ordering};

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::AtomicU32;

#[cfg(target_os = "espidf")]
use core::sync::atomic::AtomicPtr;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use crate::app::ports::PeriodicTimer;

use super::hw_init::HwInitError;

pub struct HwTimer {
    period_ms: u32,
    running: AtomicBool,
    #[cfg(target_os = "espidf")]
    handle: AtomicPtr<esp_timer>,
    #[cfg(not(target_os = "espidf"))]
    remaining_ms: AtomicU32,
    #[cfg(not(target_os = "espidf"))]
    on_expiry: fn(),
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn timer_trampoline(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the `fn()` passed to `esp_timer_create` in `new`.
    let vector = unsafe { core::mem::transmute::<*mut core::ffi::c_void, fn()>(arg) };
    vector();
}

impl HwTimer {
    /// Create a stopped timer. A zero period is raised to 1 ms.
    #[cfg(target_os = "espidf")]
    pub fn new(label: &'static str, period_ms: u32, on_expiry: fn()) -> Result<Self, HwInitError> {
        let args = esp_timer_create_args_t {
            callback: Some(timer_trampoline),
            arg: on_expiry as *mut core::ffi::c_void,
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: core::ptr::null(),
            skip_unhandled_events: true,
        };
        let mut handle: esp_timer_handle_t = core::ptr::null_mut();
        // SAFETY: args outlives the call; the handle is owned by this struct
        // and deleted in Drop.
        let ret = unsafe { esp_timer_create(&args, &mut handle) };
        if ret != ESP_OK {
            return Err(HwInitError::TimerCreateFailed(ret));
        }
        log::info!("hw_timer: '{}' created ({} ms)", label, period_ms.max(1));
        Ok(Self {
            period_ms: period_ms.max(1),
            running: AtomicBool::new(false),
            handle: AtomicPtr::new(handle),
        })
    }

    /// Create a stopped timer. A zero period is raised to 1 ms.
    #[cfg(not(target_os = "espidf"))]
    pub fn new(label: &'static str, period_ms: u32, on_expiry: fn()) -> Result<Self, HwInitError> {
        log::info!("hw_timer(sim): '{}' created ({} ms)", label, period_ms.max(1));
        Ok(Self {
            period_ms: period_ms.max(1),
            running: AtomicBool::new(false),
            remaining_ms: AtomicU32::new(0),
            on_expiry,
        })
    }

    #[cfg(target_os = "espidf")]
    fn arm(&self) {
        let period_us = u64::from(self.period_ms) * 1_000;
        // SAFETY: handle is valid for the lifetime of self.
        let ret = unsafe { esp_timer_start_periodic(self.handle.load(Ordering::Acquire), period_us) };
        if ret != ESP_OK {
            self.running.store(false, Ordering::Release);
            // May run in the GPIO ISR, where the log facade is off limits.
            // SAFETY: the format string is NUL-terminated and static.
            unsafe { esp_rom_printf(c"hw_timer: start failed (rc=%d)\n".as_ptr(), ret) };
        }
    }

    #[cfg(target_os = "espidf")]
    fn disarm(&self) {
        // SAFETY: handle is valid; stopping an idle timer returns
        // ESP_ERR_INVALID_STATE, which is harmless here.
        unsafe { esp_timer_stop(self.handle.load(Ordering::Acquire)) };
    }

    #[cfg(not(target_os = "espidf"))]
    fn arm(&self) {
        self.remaining_ms.store(self.period_ms, Ordering::Release);
    }

    #[cfg(not(target_os = "espidf"))]
    fn disarm(&self) {}

    /// Milliseconds until the next expiry (0 when stopped).
    #[cfg(not(target_os = "espidf"))]
    pub fn remaining_ms(&self) -> u32 {
        if self.is_running() {
            self.remaining_ms.load(Ordering::Acquire)
        } else {
            0
        }
    }

    /// Advance simulated time by `elapsed_ms`, running the expiry vector for
    /// every period boundary crossed. Returns the number of expiries.
    ///
    /// The vector may stop or restart this timer; counting follows suit.
    #[cfg(not(target_os = "espidf"))]
    pub fn tick(&self, elapsed_ms: u32) -> u32 {
        let mut left = elapsed_ms;
        let mut fired = 0;
        while self.is_running() {
            let remaining = self.remaining_ms.load(Ordering::Acquire);
            if left < remaining {
                self.remaining_ms.store(remaining - left, Ordering::Release);
                break;
            }
            left -= remaining;
            self.remaining_ms.store(self.period_ms, Ordering::Release);
            fired += 1;
            (self.on_expiry)();
        }
        fired
    }
}

impl PeriodicTimer for HwTimer {
    fn start(&self) {
        if !self.running.swap(true, Ordering::AcqRel) {
            self.arm();
        }
    }

    fn stop(&self) {
        self.running.store(false, Ordering::Release);
        self.disarm();
    }

    fn restart(&self) {
        self.disarm();
        self.running.store(true, Ordering::Release);
        self.arm();
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn period_ms(&self) -> u32 {
        self.period_ms
    }
}

#[cfg(target_os = "espidf")]
impl Drop for HwTimer {
    fn drop(&mut self) {
        let handle = *self.handle.get_mut();
        // SAFETY: handle came from esp_timer_create and is deleted once.
        unsafe {
            esp_timer_stop(handle);
            esp_timer_delete(handle);
        }
    }
}
