//! Mock hardware for integration tests.
//!
//! Every mock records into one shared [`CallLog`] so tests can assert on
//! the exact order of hardware commands across devices without touching
//! real GPIO/timer registers.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use critical_section::Mutex;

use tempsense::app::controller::Board;
use tempsense::app::ports::{
    AdcScale, AnalogInput, DigitalLine, NonVolatileStore, PeriodicTimer, SerialPort, WatchdogPort,
};
use tempsense::error::StorageError;

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum HwCall {
    Write { dev: &'static str, active: bool },
    Read { dev: &'static str },
    EnableIrq { dev: &'static str, enable: bool },
    UnmaskPort { dev: &'static str, enable: bool },
    TimerStart(&'static str),
    TimerStop(&'static str),
    TimerRestart(&'static str),
    SerialEnable(bool),
    Serial(String),
    WatchdogEnable(bool),
    WatchdogReset,
    AdcEnable(bool),
    AdcRead(u8),
    StoreLoad,
}

pub struct CallLog {
    calls: Mutex<RefCell<Vec<HwCall>>>,
}

#[allow(dead_code)]
impl CallLog {
    pub fn new() -> Self {
        Self { calls: Mutex::new(RefCell::new(Vec::new())) }
    }

    fn push(&self, call: HwCall) {
        critical_section::with(|cs| self.calls.borrow_ref_mut(cs).push(call));
    }

    pub fn take(&self) -> Vec<HwCall> {
        critical_section::with(|cs| self.calls.borrow_ref_mut(cs).drain(..).collect())
    }

    pub fn clear(&self) {
        critical_section::with(|cs| self.calls.borrow_ref_mut(cs).clear());
    }

    pub fn serial_lines(&self) -> Vec<String> {
        critical_section::with(|cs| {
            self.calls
                .borrow_ref(cs)
                .iter()
                .filter_map(|c| match c {
                    HwCall::Serial(s) => Some(s.clone()),
                    _ => None,
                })
                .collect()
        })
    }
}

impl Default for CallLog {
    fn default() -> Self {
        Self::new()
    }
}

// ── MockLine ──────────────────────────────────────────────────

pub struct MockLine<'a> {
    dev: &'static str,
    log: &'a CallLog,
    level: AtomicBool,
    pub irq_enabled: AtomicBool,
    pub unmasked: AtomicBool,
}

#[allow(dead_code)]
impl<'a> MockLine<'a> {
    pub fn new(dev: &'static str, log: &'a CallLog) -> Self {
        Self {
            dev,
            log,
            level: AtomicBool::new(false),
            irq_enabled: AtomicBool::new(false),
            unmasked: AtomicBool::new(true),
        }
    }

    /// Set the logical level without recording a call.
    pub fn set_level(&self, active: bool) {
        self.level.store(active, Ordering::SeqCst);
    }

    pub fn level(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }
}

impl DigitalLine for MockLine<'_> {
    fn read(&self) -> bool {
        self.log.push(HwCall::Read { dev: self.dev });
        self.level()
    }

    fn write(&self, active: bool) {
        self.log.push(HwCall::Write { dev: self.dev, active });
        self.set_level(active);
    }

    fn enable_interrupt(&self, enable: bool) {
        self.log.push(HwCall::EnableIrq { dev: self.dev, enable });
        self.irq_enabled.store(enable, Ordering::SeqCst);
    }

    fn enable_interrupt_on_port(&self, enable: bool) {
        self.log.push(HwCall::UnmaskPort { dev: self.dev, enable });
        self.unmasked.store(enable, Ordering::SeqCst);
    }
}

// ── MockTimer ─────────────────────────────────────────────────

pub struct MockTimer<'a> {
    dev: &'static str,
    log: &'a CallLog,
    period_ms: u32,
    running: AtomicBool,
}

impl<'a> MockTimer<'a> {
    pub fn new(dev: &'static str, period_ms: u32, log: &'a CallLog) -> Self {
        Self { dev, log, period_ms, running: AtomicBool::new(false) }
    }
}

impl PeriodicTimer for MockTimer<'_> {
    fn start(&self) {
        self.log.push(HwCall::TimerStart(self.dev));
        self.running.store(true, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.log.push(HwCall::TimerStop(self.dev));
        self.running.store(false, Ordering::SeqCst);
    }

    fn restart(&self) {
        self.log.push(HwCall::TimerRestart(self.dev));
        self.running.store(true, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn period_ms(&self) -> u32 {
        self.period_ms
    }
}

// ── MockSerial ────────────────────────────────────────────────

pub struct MockSerial<'a> {
    log: &'a CallLog,
    enabled: AtomicBool,
}

impl SerialPort for MockSerial<'_> {
    fn set_enabled(&self, enable: bool) {
        self.log.push(HwCall::SerialEnable(enable));
        self.enabled.store(enable, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn write_str(&self, s: &str) {
        self.log.push(HwCall::Serial(s.to_string()));
    }
}

// ── MockWatchdog ──────────────────────────────────────────────

pub struct MockWatchdog<'a> {
    log: &'a CallLog,
    pub enabled: AtomicBool,
}

impl WatchdogPort for MockWatchdog<'_> {
    fn set_enabled(&self, enable: bool) {
        self.log.push(HwCall::WatchdogEnable(enable));
        self.enabled.store(enable, Ordering::SeqCst);
    }

    fn reset(&self) {
        self.log.push(HwCall::WatchdogReset);
    }
}

// ── MockAdc ───────────────────────────────────────────────────

pub struct MockAdc<'a> {
    log: &'a CallLog,
    raw: Mutex<RefCell<u16>>,
}

#[allow(dead_code)]
impl MockAdc<'_> {
    pub const SCALE: AdcScale = AdcScale { vref: 5.0, max_count: 1023 };

    pub fn set_raw(&self, raw: u16) {
        critical_section::with(|cs| *self.raw.borrow_ref_mut(cs) = raw);
    }
}

impl AnalogInput for MockAdc<'_> {
    fn set_enabled(&self, enable: bool) {
        self.log.push(HwCall::AdcEnable(enable));
    }

    fn read(&self, channel: u8) -> u16 {
        self.log.push(HwCall::AdcRead(channel));
        critical_section::with(|cs| *self.raw.borrow_ref(cs))
    }

    fn scale(&self) -> AdcScale {
        Self::SCALE
    }
}

// ── MockStore ─────────────────────────────────────────────────

pub struct MockStore<'a> {
    log: &'a CallLog,
    value: Mutex<RefCell<Result<Option<bool>, StorageError>>>,
}

#[allow(dead_code)]
impl MockStore<'_> {
    pub fn set(&self, value: Result<Option<bool>, StorageError>) {
        critical_section::with(|cs| *self.value.borrow_ref_mut(cs) = value);
    }
}

impl NonVolatileStore for MockStore<'_> {
    fn load(&self) -> Result<Option<bool>, StorageError> {
        self.log.push(HwCall::StoreLoad);
        critical_section::with(|cs| *self.value.borrow_ref(cs))
    }

    fn store(&self, value: bool) -> Result<(), StorageError> {
        self.set(Ok(Some(value)));
        Ok(())
    }
}

// ── MockHw ────────────────────────────────────────────────────

pub const DEBOUNCE_MS: u32 = 300;
pub const PREDICTION_MS: u32 = 100;

/// A full set of mocks sharing one log.
pub struct MockHw<'a> {
    pub led: MockLine<'a>,
    pub button: MockLine<'a>,
    pub debounce_timer: MockTimer<'a>,
    pub prediction_timer: MockTimer<'a>,
    pub serial: MockSerial<'a>,
    pub watchdog: MockWatchdog<'a>,
    pub store: MockStore<'a>,
    pub adc: MockAdc<'a>,
}

impl<'a> MockHw<'a> {
    pub fn new(log: &'a CallLog) -> Self {
        Self {
            led: MockLine::new("led", log),
            button: MockLine::new("button", log),
            debounce_timer: MockTimer::new("debounce", DEBOUNCE_MS, log),
            prediction_timer: MockTimer::new("prediction", PREDICTION_MS, log),
            serial: MockSerial { log, enabled: AtomicBool::new(false) },
            watchdog: MockWatchdog { log, enabled: AtomicBool::new(false) },
            store: MockStore { log, value: Mutex::new(RefCell::new(Ok(None))) },
            adc: MockAdc { log, raw: Mutex::new(RefCell::new(0)) },
        }
    }

    pub fn board(&self) -> Board<'_> {
        Board {
            led: &self.led,
            button: &self.button,
            debounce_timer: &self.debounce_timer,
            prediction_timer: &self.prediction_timer,
            serial: &self.serial,
            watchdog: &self.watchdog,
            store: &self.store,
            adc: &self.adc,
        }
    }
}
