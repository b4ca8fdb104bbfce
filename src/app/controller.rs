//! Controller: the composition root of the firmware.
//!
//! Borrows every hardware collaborator and the trained model, owns the
//! small state machines that sit on top of them, and exposes the three
//! interrupt entry points.
//!
//! ```text
//!   button edge ──────▶ handle_button_interrupt ──▶ Debouncer::on_edge
//!                                                     └─ pressed? ─▶ sample+predict, snooze
//!   debounce expiry ──▶ handle_debounce_timer_interrupt ──▶ Debouncer::on_expiry
//!   prediction expiry ▶ handle_prediction_timer_interrupt ──▶ sample+predict
//! ```
//!
//! Handlers never block and never log through the `log` facade; their only
//! output goes through the serial port.

use crate::app::ports::{
    AnalogInput, DigitalLine, NonVolatileStore, PeriodicTimer, SerialPort, WatchdogPort,
};
use crate::app::status::StatusLine;
use crate::debounce::{DebounceState, Debouncer};
use crate::isr::InterruptHandlers;
use crate::ml::Predictor;
use crate::scheduler::PredictionScheduler;
use crate::supervisor::Supervisor;

/// Every hardware collaborator the controller borrows.
#[derive(Clone, Copy)]
pub struct Board<'a> {
    pub led: &'a dyn DigitalLine,
    pub button: &'a dyn DigitalLine,
    pub debounce_timer: &'a dyn PeriodicTimer,
    pub prediction_timer: &'a dyn PeriodicTimer,
    pub serial: &'a dyn SerialPort,
    pub watchdog: &'a dyn WatchdogPort,
    pub store: &'a dyn NonVolatileStore,
    pub adc: &'a dyn AnalogInput,
}

pub struct Controller<'a> {
    led: &'a dyn DigitalLine,
    button: &'a dyn DigitalLine,
    serial: &'a dyn SerialPort,
    watchdog: &'a dyn WatchdogPort,
    store: &'a dyn NonVolatileStore,
    adc: &'a dyn AnalogInput,
    model: &'a dyn Predictor,
    sensor_channel: u8,
    debounce: Debouncer<'a>,
    scheduler: PredictionScheduler<'a>,
    supervisor: Supervisor<'a>,
}

impl<'a> Controller<'a> {
    /// Wire the collaborators and bring the hardware up.
    ///
    /// Enables, in order: button interrupt, serial output, watchdog, ADC.
    /// Then starts the prediction scheduler.
    pub fn new(board: Board<'a>, model: &'a dyn Predictor, sensor_channel: u8) -> Self {
        let controller = Self {
            led: board.led,
            button: board.button,
            serial: board.serial,
            watchdog: board.watchdog,
            store: board.store,
            adc: board.adc,
            model,
            sensor_channel,
            debounce: Debouncer::new(board.button, board.debounce_timer),
            scheduler: PredictionScheduler::new(board.prediction_timer),
            supervisor: Supervisor::new(board.watchdog),
        };

        controller.button.enable_interrupt(true);
        controller.serial.set_enabled(true);
        controller.watchdog.set_enabled(true);
        controller.adc.set_enabled(true);
        controller.scheduler.start();

        log::info!(
            "Controller: up (sensor CH{}, prediction every {} ms)",
            sensor_channel,
            controller.scheduler.period_ms()
        );
        controller
    }

    // ── Interrupt entry points ────────────────────────────────

    /// Button line edge.
    pub fn handle_button_interrupt(&self) {
        if self.debounce.on_edge() {
            self.handle_button_pressed();
        }
    }

    /// Debounce timer expiry.
    pub fn handle_debounce_timer_interrupt(&self) {
        self.debounce.on_expiry();
    }

    /// Prediction timer expiry.
    pub fn handle_prediction_timer_interrupt(&self) {
        self.sample_and_predict();
    }

    fn handle_button_pressed(&self) {
        self.serial.print(format_args!("Button pressed!"));
        self.sample_and_predict();
        self.scheduler.snooze();
    }

    // ── Operations ────────────────────────────────────────────

    /// Read the sensor, run the model and emit one status line.
    pub fn sample_and_predict(&self) -> StatusLine {
        let raw = self.adc.read(self.sensor_channel);
        let volts = self.adc.scale().to_volts(raw);
        let line = StatusLine { raw, volts, prediction: self.model.predict(volts) };
        self.serial.print(format_args!("{line}"));
        line
    }

    pub fn enable_serial_transmission(&self, enable: bool) {
        self.serial.set_enabled(enable);
    }

    pub fn debounce_state(&self) -> DebounceState {
        self.debounce.state()
    }

    pub fn prediction_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Last LED state saved before power-down, if readable.
    ///
    /// Read errors are logged and reported as `None`.
    pub fn persisted_led_state(&self) -> Option<bool> {
        match self.store.load() {
            Ok(state) => state,
            Err(e) => {
                log::warn!("Controller: persisted LED state unreadable: {}", e);
                None
            }
        }
    }

    // ── Foreground ────────────────────────────────────────────

    /// Enter the supervisory loop. Never returns.
    pub fn run(&self) -> ! {
        self.serial.print(format_args!("Running the system!"));
        self.supervisor.run()
    }

    /// [`run`](Self::run) with an idle hook before every watchdog reset.
    pub fn run_with(&self, idle: impl FnMut()) -> ! {
        self.serial.print(format_args!("Running the system!"));
        self.supervisor.run_with(idle)
    }
}

impl Drop for Controller<'_> {
    /// Leave the outputs in their safe resting state.
    fn drop(&mut self) {
        self.led.write(false);
        self.button.enable_interrupt(false);
        self.debounce.halt();
        self.scheduler.stop();
        self.watchdog.set_enabled(false);
    }
}

impl InterruptHandlers for Controller<'_> {
    fn on_button_edge(&self) {
        self.handle_button_interrupt();
    }

    fn on_debounce_expired(&self) {
        self.handle_debounce_timer_interrupt();
    }

    fn on_prediction_expired(&self) {
        self.handle_prediction_timer_interrupt();
    }
}
