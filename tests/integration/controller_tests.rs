//! Integration tests for the Controller → debounce/scheduler → hardware
//! pipeline.
//!
//! Mocks record every hardware command so the tests can check the exact
//! ordering the interrupt handlers rely on. The last few tests swap in the
//! simulation drivers to exercise real timer countdown and ADC scaling.

use std::panic::{self, AssertUnwindSafe};

use super::mock_hw::{CallLog, HwCall, MockHw, PREDICTION_MS};

use tempsense::app::controller::{Board, Controller};
use tempsense::app::ports::{AdcScale, AnalogInput, PeriodicTimer};
use tempsense::app::status::round_half_away;
use tempsense::debounce::DebounceState;
use tempsense::drivers::adc::Adc;
use tempsense::drivers::hw_timer::HwTimer;
use tempsense::drivers::serial::SerialConsole;
use tempsense::error::StorageError;
use tempsense::ml::Predictor;
use tempsense::ml::lin_reg::{LinReg, TrainingSet};

const CHANNEL: u8 = 0;

/// `T = 100 · V − 50`, the TMP36 transfer function.
struct Tmp36;

impl Predictor for Tmp36 {
    fn predict(&self, input: f64) -> f64 {
        100.0 * input - 50.0
    }
}

// ── Construction & teardown ───────────────────────────────────

#[test]
fn construction_enables_hardware_in_order() {
    let log = CallLog::new();
    let hw = MockHw::new(&log);
    let ctrl = Controller::new(hw.board(), &Tmp36, CHANNEL);

    assert_eq!(
        log.take(),
        vec![
            HwCall::EnableIrq { dev: "button", enable: true },
            HwCall::SerialEnable(true),
            HwCall::WatchdogEnable(true),
            HwCall::AdcEnable(true),
            HwCall::TimerStart("prediction"),
        ]
    );
    assert_eq!(ctrl.debounce_state(), DebounceState::Idle);
    assert!(ctrl.prediction_running());
}

#[test]
fn drop_leaves_outputs_in_safe_state() {
    let log = CallLog::new();
    let hw = MockHw::new(&log);
    hw.led.set_level(true);
    {
        let _ctrl = Controller::new(hw.board(), &Tmp36, CHANNEL);
        log.clear();
    }

    assert_eq!(
        log.take(),
        vec![
            HwCall::Write { dev: "led", active: false },
            HwCall::EnableIrq { dev: "button", enable: false },
            HwCall::TimerStop("debounce"),
            HwCall::TimerStop("prediction"),
            HwCall::WatchdogEnable(false),
        ]
    );
    assert!(!hw.led.level());
    assert!(!hw.prediction_timer.is_running());
}

// ── Button / debounce ─────────────────────────────────────────

#[test]
fn press_masks_first_then_predicts_and_snoozes() {
    let log = CallLog::new();
    let hw = MockHw::new(&log);
    hw.adc.set_raw(307);
    let ctrl = Controller::new(hw.board(), &Tmp36, CHANNEL);
    log.clear();

    hw.button.set_level(true);
    ctrl.handle_button_interrupt();

    let calls = log.take();
    assert_eq!(
        calls[..3],
        [
            HwCall::UnmaskPort { dev: "button", enable: false },
            HwCall::TimerStart("debounce"),
            HwCall::Read { dev: "button" },
        ],
        "mask must precede every other action"
    );
    assert_eq!(calls[3], HwCall::Serial("Button pressed!".into()));
    assert_eq!(calls[4], HwCall::AdcRead(CHANNEL));
    assert!(matches!(&calls[5], HwCall::Serial(s) if s.starts_with("ADC: 307,")));
    assert_eq!(calls[6], HwCall::TimerRestart("prediction"));
    assert_eq!(calls.len(), 7);
    assert_eq!(ctrl.debounce_state(), DebounceState::Suppressed);
}

#[test]
fn release_edge_only_starts_debounce() {
    let log = CallLog::new();
    let hw = MockHw::new(&log);
    let ctrl = Controller::new(hw.board(), &Tmp36, CHANNEL);
    log.clear();

    hw.button.set_level(false);
    ctrl.handle_button_interrupt();

    assert_eq!(
        log.take(),
        vec![
            HwCall::UnmaskPort { dev: "button", enable: false },
            HwCall::TimerStart("debounce"),
            HwCall::Read { dev: "button" },
        ]
    );
    assert_eq!(ctrl.debounce_state(), DebounceState::Suppressed);
}

#[test]
fn debounce_expiry_stops_timer_then_unmasks() {
    let log = CallLog::new();
    let hw = MockHw::new(&log);
    let ctrl = Controller::new(hw.board(), &Tmp36, CHANNEL);
    ctrl.handle_button_interrupt();
    log.clear();

    ctrl.handle_debounce_timer_interrupt();

    assert_eq!(
        log.take(),
        vec![
            HwCall::TimerStop("debounce"),
            HwCall::UnmaskPort { dev: "button", enable: true },
        ]
    );
    assert_eq!(ctrl.debounce_state(), DebounceState::Idle);
    assert!(hw.button.unmasked.load(core::sync::atomic::Ordering::SeqCst));
}

// ── Prediction ────────────────────────────────────────────────

#[test]
fn prediction_expiry_emits_status_line_only() {
    let log = CallLog::new();
    let hw = MockHw::new(&log);
    // 154 / 1023 · 5 V = 752.7 mV → 25.3 °C
    hw.adc.set_raw(154);
    let ctrl = Controller::new(hw.board(), &Tmp36, CHANNEL);
    log.clear();

    ctrl.handle_prediction_timer_interrupt();

    assert_eq!(
        log.take(),
        vec![
            HwCall::AdcRead(CHANNEL),
            HwCall::Serial("ADC: 154, input: 753 mV, predicted output: 25".into()),
        ]
    );
    assert_eq!(ctrl.debounce_state(), DebounceState::Idle);
}

#[test]
fn sample_and_predict_returns_unrounded_values() {
    let log = CallLog::new();
    let hw = MockHw::new(&log);
    hw.adc.set_raw(1023);
    let ctrl = Controller::new(hw.board(), &Tmp36, CHANNEL);

    let line = ctrl.sample_and_predict();
    assert_eq!(line.raw, 1023);
    assert!((line.volts - 5.0).abs() < 1e-12);
    assert!((line.prediction - 450.0).abs() < 1e-9);
}

#[test]
fn disabled_serial_drops_status_lines() {
    let log = CallLog::new();
    let hw = MockHw::new(&log);
    let ctrl = Controller::new(hw.board(), &Tmp36, CHANNEL);
    log.clear();

    ctrl.enable_serial_transmission(false);
    ctrl.handle_prediction_timer_interrupt();
    assert!(log.serial_lines().is_empty());

    ctrl.enable_serial_transmission(true);
    ctrl.handle_prediction_timer_interrupt();
    assert_eq!(log.serial_lines().len(), 1);
}

// ── Persistence ───────────────────────────────────────────────

#[test]
fn persisted_led_state_reports_store_contents() {
    let log = CallLog::new();
    let hw = MockHw::new(&log);
    let ctrl = Controller::new(hw.board(), &Tmp36, CHANNEL);

    assert_eq!(ctrl.persisted_led_state(), None);
    hw.store.set(Ok(Some(true)));
    assert_eq!(ctrl.persisted_led_state(), Some(true));
    hw.store.set(Err(StorageError::Corrupted));
    assert_eq!(ctrl.persisted_led_state(), None);
}

// ── Supervisory loop ──────────────────────────────────────────

#[test]
fn run_announces_then_resets_watchdog_every_iteration() {
    let log = CallLog::new();
    let hw = MockHw::new(&log);
    let ctrl = Controller::new(hw.board(), &Tmp36, CHANNEL);
    log.clear();

    let mut idles = 0u32;
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        ctrl.run_with(|| {
            idles += 1;
            if idles > 50 {
                panic!("stop the loop");
            }
        });
    }));
    assert!(result.is_err());

    let calls = log.take();
    assert_eq!(calls[0], HwCall::Serial("Running the system!".into()));
    let resets = calls.iter().filter(|c| **c == HwCall::WatchdogReset).count();
    assert_eq!(resets, 50);
}

// ── Simulation drivers ────────────────────────────────────────

#[test]
fn press_resets_partially_elapsed_prediction_countdown() {
    let log = CallLog::new();
    let hw = MockHw::new(&log);
    let prediction = HwTimer::new("prediction", PREDICTION_MS, || {}).unwrap();
    let board = Board { prediction_timer: &prediction, ..hw.board() };
    let ctrl = Controller::new(board, &Tmp36, CHANNEL);

    assert_eq!(prediction.remaining_ms(), PREDICTION_MS);
    prediction.tick(70);
    assert_eq!(prediction.remaining_ms(), 30);

    hw.button.set_level(true);
    ctrl.handle_button_interrupt();

    assert_eq!(prediction.remaining_ms(), PREDICTION_MS);
    assert!(prediction.is_running());
    assert_eq!(prediction.tick(PREDICTION_MS - 1), 0);
}

#[test]
fn end_to_end_prediction_matches_trained_model() {
    let log = CallLog::new();
    let hw = MockHw::new(&log);

    let mut model = LinReg::new(&TrainingSet::INPUT_VOLTS, &TrainingSet::OUTPUT_CELSIUS);
    model.train(2000, 0.1).unwrap();

    let scale = AdcScale { vref: 5.0, max_count: 1023 };
    let adc = Adc::new(scale, CHANNEL).unwrap();
    adc.set_voltage(CHANNEL, 0.6);
    let serial = SerialConsole::new();

    let board = Board { adc: &adc, serial: &serial, ..hw.board() };
    let ctrl = Controller::new(board, &model, CHANNEL);
    ctrl.handle_prediction_timer_interrupt();

    let volts = adc.input_voltage(CHANNEL);
    let expected = round_half_away(model.predict(volts));
    let line = serial.last_line().expect("status line emitted");
    assert!(
        line.ends_with(&format!("predicted output: {expected}")),
        "unexpected line: {line}"
    );
    assert!(line.starts_with(&format!("ADC: {}, ", adc.read(CHANNEL))));
    assert!((expected - 10).abs() <= 1, "0.6 V is about 10 °C, got {expected}");
}
