//! TempSense Firmware: Main Entry Point
//!
//! Interrupt-driven temperature predictor: a debounced button, a periodic
//! sample-and-predict cycle and a watchdog-fed supervisory loop.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Drivers: GpioLine ×2  HwTimer ×2  Adc  SerialConsole        │
//! │           Watchdog     NvsStore                              │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ────────────────       │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  Controller: Debouncer · PredictionScheduler ·         │  │
//! │  │              Supervisor · LinReg                       │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  isr vectors ──▶ installed Controller                        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use tempsense::adapters::nvs::NvsStore;
use tempsense::app::controller::{Board, Controller};
use tempsense::app::ports::SerialPort;
use tempsense::app::status::report_fit;
use tempsense::config::SystemConfig;
use tempsense::drivers::adc::Adc;
use tempsense::drivers::gpio::GpioLine;
use tempsense::drivers::hw_init::{self, HwInitError};
use tempsense::drivers::hw_timer::HwTimer;
use tempsense::drivers::serial::SerialConsole;
use tempsense::drivers::watchdog::Watchdog;
use tempsense::error::Error;
use tempsense::isr;
use tempsense::ml::lin_reg::{LinReg, TrainingSet};

/// Sensor voltage presented by the simulated ADC (25 °C on a TMP36).
#[cfg(not(target_os = "espidf"))]
const SIM_SENSOR_VOLTS: f64 = 0.75;

/// Simulated time advanced per supervisory-loop iteration.
#[cfg(not(target_os = "espidf"))]
const SIM_TICK_MS: u32 = 10;

/// Everything the controller borrows lives for the rest of the program.
fn leak<T>(value: T) -> &'static T {
    Box::leak(Box::new(value))
}

/// Log a peripheral bring-up failure with its return code, then fold it
/// into the crate error.
fn init_failed(e: HwInitError) -> Error {
    error!("hw_init: {}", e);
    Error::from(e)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }

    info!("╔══════════════════════════════════════╗");
    info!("║  TempSense v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let cfg = SystemConfig::default();
    cfg.validate()?;
    info!("Config: {}", serde_json::to_string(&cfg)?);

    // ── 3. Train the model ────────────────────────────────────
    let mut model = LinReg::new(&TrainingSet::INPUT_VOLTS, &TrainingSet::OUTPUT_CELSIUS);
    model
        .train(cfg.train_epochs, cfg.learning_rate)
        .map_err(Error::from)?;
    info!(
        "Model: weight={:.3} bias={:.3} mse={:.5} ({} samples, {} epochs)",
        model.weight(),
        model.bias(),
        model.mse().unwrap_or(f64::NAN),
        model.sample_count(),
        cfg.train_epochs
    );
    let model = leak(model);

    // ── 4. Peripherals ────────────────────────────────────────
    hw_init::install_isr_service().map_err(init_failed)?;

    let serial = leak(SerialConsole::new());
    serial.set_enabled(true);
    serial.print(format_args!("Machine learning project!"));
    report_fit(serial, model.inputs(), model);

    let led = leak(GpioLine::output(cfg.led_gpio).map_err(init_failed)?);
    let button = leak(GpioLine::button(cfg.button_gpio, isr::button_edge).map_err(init_failed)?);
    let debounce_timer = leak(
        HwTimer::new("debounce", cfg.debounce_ms, isr::debounce_expired).map_err(init_failed)?,
    );
    let prediction_timer = leak(
        HwTimer::new("prediction", cfg.prediction_period_ms, isr::prediction_expired)
            .map_err(init_failed)?,
    );
    let watchdog = leak(Watchdog::new(cfg.watchdog_timeout_ms));
    info!(
        "Board: LED GPIO{}, button GPIO{}, watchdog {} ms",
        led.pin(),
        button.pin(),
        watchdog.timeout_ms()
    );
    let store = leak(NvsStore::new().map_err(Error::from)?);
    let adc = leak(Adc::new(cfg.adc_scale(), cfg.sensor_channel).map_err(init_failed)?);

    #[cfg(not(target_os = "espidf"))]
    adc.set_voltage(cfg.sensor_channel, SIM_SENSOR_VOLTS);

    // ── 5. Controller ─────────────────────────────────────────
    let board = Board {
        led,
        button,
        debounce_timer,
        prediction_timer,
        serial,
        watchdog,
        store,
        adc,
    };
    let controller = leak(Controller::new(board, model, cfg.sensor_channel));
    isr::install(controller)?;

    match controller.persisted_led_state() {
        Some(on) => info!("Persisted LED state: {}", if on { "on" } else { "off" }),
        None => warn!("No persisted LED state"),
    }

    // ── 6. Supervisory loop ───────────────────────────────────
    // Yield one RTOS tick per iteration so lower-priority tasks get CPU time.
    #[cfg(target_os = "espidf")]
    let idle = || esp_idf_svc::hal::delay::FreeRtos::delay_ms(10);

    #[cfg(not(target_os = "espidf"))]
    let idle = || {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(SIM_TICK_MS)));
        debounce_timer.tick(SIM_TICK_MS);
        prediction_timer.tick(SIM_TICK_MS);
    };

    controller.run_with(idle)
}
