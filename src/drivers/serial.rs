//! Serial console output.
//!
//! On ESP-IDF each line goes out through `esp_rom_printf`, which is safe to
//! call from the timer task and GPIO ISR context (the `log` facade is not).
//! On host/test lines go to stdout and into a bounded history for
//! inspection.

use core::sync::atomic::{AtomicBool, Ordering};

#[cfg(not(target_os = "espidf"))]
use core::cell::RefCell;

#[cfg(not(target_os = "espidf"))]
use critical_section::Mutex;

#[cfg(not(target_os = "espidf"))]
use heapless::HistoryBuffer;

use crate::app::ports::{SERIAL_LINE_CAP, SerialPort};

/// Lines kept by the simulated console.
#[cfg(not(target_os = "espidf"))]
pub const HISTORY_DEPTH: usize = 32;

#[cfg(not(target_os = "espidf"))]
type Line = heapless::String<SERIAL_LINE_CAP>;

pub struct SerialConsole {
    enabled: AtomicBool,
    #[cfg(not(target_os = "espidf"))]
    history: Mutex<RefCell<HistoryBuffer<Line, HISTORY_DEPTH>>>,
}

impl Default for SerialConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialConsole {
    /// Starts disabled; the controller enables it.
    pub fn new() -> Self {
        #[cfg(not(target_os = "espidf"))]
        log::info!("SerialConsole(sim): stdout");

        Self {
            enabled: AtomicBool::new(false),
            #[cfg(not(target_os = "espidf"))]
            history: Mutex::new(RefCell::new(HistoryBuffer::new())),
        }
    }

    /// Most recent line, if any.
    #[cfg(not(target_os = "espidf"))]
    pub fn last_line(&self) -> Option<Line> {
        critical_section::with(|cs| self.history.borrow_ref(cs).recent().cloned())
    }

    /// Retained lines, oldest first.
    #[cfg(not(target_os = "espidf"))]
    pub fn lines(&self) -> Vec<Line> {
        critical_section::with(|cs| self.history.borrow_ref(cs).oldest_ordered().cloned().collect())
    }

    #[cfg(target_os = "espidf")]
    fn emit(&self, s: &str) {
        let mut buf: heapless::Vec<u8, { SERIAL_LINE_CAP + 1 }> = heapless::Vec::new();
        let len = s.len().min(SERIAL_LINE_CAP);
        // Both fit: len <= SERIAL_LINE_CAP and capacity is one larger.
        let _ = buf.extend_from_slice(&s.as_bytes()[..len]);
        let _ = buf.push(0);
        // SAFETY: buf is NUL-terminated and outlives the call.
        unsafe {
            esp_idf_svc::sys::esp_rom_printf(c"%s\n".as_ptr(), buf.as_ptr());
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn emit(&self, s: &str) {
        println!("{s}");
        let mut line = Line::new();
        for ch in s.chars() {
            if line.push(ch).is_err() {
                break;
            }
        }
        critical_section::with(|cs| self.history.borrow_ref_mut(cs).write(line));
    }
}

impl SerialPort for SerialConsole {
    fn set_enabled(&self, enable: bool) {
        self.enabled.store(enable, Ordering::Release);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    fn write_str(&self, s: &str) {
        if self.is_enabled() {
            self.emit(s);
        }
    }
}
