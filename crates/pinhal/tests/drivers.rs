//! Per-driver behaviour against the simulated backends.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

mod common;

use pinhal::sim::SimPlatform;
use pinhal::{
    Board, DataBits, GpioConfig, GpioMode, HalError, I2cPeripheral, InitState, InputPeripheral,
    LedPeripheral, Parity, Peripheral, PinFunction, PinId, PullResistor, PwmConfig,
    SerialOptions, SerialPeripheral, StopBits, TransportError, Value,
};

const SENSOR: u8 = 0x48;

// ── Bring-up ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn factories_require_init() {
    let board = Board::new(SimPlatform::new());
    assert!(matches!(
        board.create_digital_input(17u32),
        Err(HalError::NotInitialized)
    ));
    board.init().await.unwrap();
    assert!(board.create_digital_input(17u32).is_ok());
}

#[tokio::test]
async fn init_runs_once_and_rejects_overlap() {
    let sim = SimPlatform::new();
    let board = Board::new(sim.clone());

    let (first, second) = embassy_futures::join::join(board.init(), board.init()).await;
    assert_eq!(first, Ok(()));
    assert_eq!(second, Err(HalError::InitInProgress));

    board.init().await.unwrap();
    assert_eq!(sim.init_calls(), 1);
    assert!(board.registry().is_ready());
}

#[tokio::test]
async fn failed_init_can_be_retried() {
    let sim = SimPlatform::new();
    sim.fail_init(true);
    let board = Board::new(sim.clone());

    assert_eq!(
        board.init().await,
        Err(HalError::Transport(TransportError::Io))
    );
    assert_eq!(board.registry().init_state(), InitState::Failed);

    sim.fail_init(false);
    board.init().await.unwrap();
    assert_eq!(board.registry().init_state(), InitState::Ready);
    assert_eq!(sim.init_calls(), 2);
}

#[test]
fn cancelled_init_can_be_retried() {
    use embassy_futures::select::{select, Either};

    let sim = SimPlatform::new();
    let board = Board::new(sim.clone());

    let raced = embassy_futures::block_on(select(board.init(), core::future::ready(())));
    assert!(matches!(raced, Either::Second(())));
    assert_eq!(board.registry().init_state(), InitState::Failed);
    assert!(matches!(
        board.create_digital_output(17u32),
        Err(HalError::NotInitialized)
    ));

    embassy_futures::block_on(board.init()).unwrap();
    assert!(board.create_digital_output(17u32).is_ok());
}

// ── Resolution ───────────────────────────────────────────────────────────────

#[test]
fn unknown_alias_is_reported() {
    let (board, _sim) = common::ready_board();
    assert_eq!(
        board.create_digital_output("GPIO99").err(),
        Some(HalError::UnknownAlias("GPIO99".into()))
    );
    assert_eq!(board.resolve(99u32), Ok(PinId::new(99)));
    assert!(board.registry().is_empty());
}

#[test]
fn pin_info_lists_functions() {
    let (board, _sim) = common::ready_board();
    let info = board.pin_info("GPIO18").unwrap().unwrap();
    assert!(info.supports(PinFunction::Pwm));
    assert!(info.aliases.iter().any(|alias| alias == "P1-12"));
    assert_eq!(board.pin_info(99u32), Ok(None));
}

// ── Digital I/O ──────────────────────────────────────────────────────────────

#[test]
fn input_follows_external_level_and_bias() {
    let (board, sim) = common::ready_board();

    let mut button = board
        .create_digital_input(GpioConfig::new("GPIO4").with_pull(PullResistor::Up))
        .unwrap();
    assert_eq!(sim.mode(4), Some(GpioMode::Input(PullResistor::Up)));
    assert_eq!(button.pull_resistor(), PullResistor::Up);
    assert_eq!(button.value(), Value::High);

    sim.set_level(4, Value::Low);
    assert_eq!(button.read().unwrap(), Value::Low);
    assert_eq!(button.value(), Value::Low);

    button.destroy().unwrap();
    assert_eq!(button.read(), Err(HalError::PeripheralDestroyed));
}

#[test]
fn input_bias_defaults_to_platform_setting() {
    let (board, _sim) = common::ready_board();
    let input = board.create_digital_input(27u32).unwrap();
    assert_eq!(input.pull_resistor(), PullResistor::None);
    assert_eq!(input.value(), Value::Low);
}

// ── PWM ──────────────────────────────────────────────────────────────────────

#[test]
fn pwm_rejects_incapable_pins_and_zero_settings() {
    let (board, _sim) = common::ready_board();

    assert_eq!(
        board.create_pwm(17u32).err(),
        Some(HalError::Unsupported {
            pin: PinId::new(17),
            function: PinFunction::Pwm,
        })
    );
    assert_eq!(
        board.create_pwm(PwmConfig::new(18u32).with_frequency(0)).err(),
        Some(HalError::InvalidConfig("frequency"))
    );
    assert_eq!(
        board.create_pwm(PwmConfig::new(18u32).with_range(0)).err(),
        Some(HalError::InvalidConfig("range"))
    );
    assert!(board.registry().is_empty());
}

#[test]
fn differential_pwm_claims_both_outputs() {
    let (board, _sim) = common::ready_board();

    let pwm = board.create_pwm("GPIO13").unwrap();
    assert_eq!(pwm.pins().as_slice(), &[PinId::new(13), PinId::new(19)]);
    assert_eq!(
        board.create_digital_output(19u32).err(),
        Some(HalError::PinConflict {
            pin: PinId::new(19),
            owner: pinhal::PeripheralKind::Pwm,
        })
    );

    drop(pwm);
    assert!(board.registry().is_empty());
    assert!(board.create_pwm(19u32).is_ok());
}

// ── I2C ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn i2c_register_access() {
    let (board, sim) = common::ready_board();
    sim.add_i2c_device(SENSOR);
    let mut i2c = board.create_i2c().unwrap();

    i2c.write_byte_register(SENSOR, 0x01, 0x60).await.unwrap();
    assert_eq!(sim.i2c_register(SENSOR, 0x01), Some(0x60));
    assert_eq!(i2c.read_byte_register(SENSOR, 0x01).await.unwrap(), 0x60);

    i2c.write_word_register(SENSOR, 0x02, 0xBEEF).await.unwrap();
    assert_eq!(sim.i2c_register(SENSOR, 0x02), Some(0xEF));
    assert_eq!(sim.i2c_register(SENSOR, 0x03), Some(0xBE));
    assert_eq!(i2c.read_word_register(SENSOR, 0x02).await.unwrap(), 0xBEEF);

    i2c.write_register(SENSOR, 0x10, &[1, 2, 3]).await.unwrap();
    assert_eq!(
        i2c.read_register(SENSOR, 0x10, 3).await.unwrap(),
        vec![1, 2, 3]
    );
}

#[tokio::test]
async fn i2c_plain_transfers_use_the_register_pointer() {
    let (board, sim) = common::ready_board();
    sim.add_i2c_device(SENSOR);
    sim.set_i2c_register(SENSOR, 0x00, 0x34);
    sim.set_i2c_register(SENSOR, 0x01, 0x12);
    let mut i2c = board.create_i2c().unwrap();

    i2c.write_byte(SENSOR, 0x00).await.unwrap();
    assert_eq!(i2c.read_word(SENSOR).await.unwrap(), 0x1234);

    i2c.write(SENSOR, &[0x01]).await.unwrap();
    assert_eq!(i2c.read_byte(SENSOR).await.unwrap(), 0x12);

    i2c.write_word(SENSOR, 0x5500).await.unwrap();
    assert_eq!(sim.i2c_register(SENSOR, 0x00), Some(0x55));
    i2c.write_byte(SENSOR, 0x00).await.unwrap();
    assert_eq!(i2c.read(SENSOR, 2).await.unwrap(), vec![0x55, 0x12]);
}

#[tokio::test]
async fn i2c_errors_surface_through_results() {
    let (board, sim) = common::ready_board();
    sim.add_i2c_device(SENSOR);
    let mut i2c = board.create_i2c().unwrap();

    assert_eq!(
        i2c.read_byte(0x80).await,
        Err(HalError::InvalidAddress(0x80))
    );
    assert_eq!(
        i2c.read_byte(0x20).await,
        Err(HalError::Transport(TransportError::Nack))
    );

    sim.inject_i2c_fault(Some(TransportError::Timeout));
    assert_eq!(
        i2c.write_byte(SENSOR, 0).await,
        Err(HalError::Transport(TransportError::Timeout))
    );
    sim.inject_i2c_fault(None);
    assert!(i2c.write_byte(SENSOR, 0).await.is_ok());
}

#[tokio::test]
async fn i2c_destroy_closes_the_bus() {
    let (board, sim) = common::ready_board();
    sim.add_i2c_device(SENSOR);
    let mut i2c = board.create_i2c().unwrap();
    assert!(sim.i2c_open());

    i2c.destroy().unwrap();
    assert!(!sim.i2c_open());
    assert_eq!(
        i2c.read_byte(SENSOR).await,
        Err(HalError::PeripheralDestroyed)
    );
}

// ── LED ──────────────────────────────────────────────────────────────────────

#[test]
fn led_switches_when_present() {
    let (board, sim) = common::ready_board();
    let mut led = board.create_led().unwrap();
    assert!(led.has_led());

    led.write(Value::High).unwrap();
    assert_eq!(sim.led(), Value::High);
    assert_eq!(led.read().unwrap(), Value::High);
}

#[test]
fn led_absent_accepts_writes_and_reads_low() {
    let (board, sim) = common::ready_board();
    sim.set_led_present(false);
    let mut led = board.create_led().unwrap();

    assert!(!led.has_led());
    led.write(Value::High).unwrap();
    assert_eq!(led.read().unwrap(), Value::Low);
    assert_eq!(sim.led(), Value::Low);
    assert!(led.alive());
}

// ── Serial ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn serial_requires_open() {
    let (board, sim) = common::ready_board();
    let mut serial = board.create_serial(SerialOptions::default()).unwrap();

    assert!(!serial.is_open());
    assert_eq!(serial.write("hello").await, Err(HalError::NotOpen));
    assert_eq!(serial.flush().await, Err(HalError::NotOpen));

    serial.open().await.unwrap();
    serial.open().await.unwrap();
    assert!(sim.serial_is_open("/dev/ttyAMA0"));

    serial.write("hello").await.unwrap();
    serial.write(b"\r\n").await.unwrap();
    serial.flush().await.unwrap();
    assert_eq!(sim.serial_output("/dev/ttyAMA0"), b"hello\r\n".to_vec());

    serial.close().await.unwrap();
    serial.close().await.unwrap();
    assert!(!sim.serial_is_open("/dev/ttyAMA0"));
    assert_eq!(serial.write("late").await, Err(HalError::NotOpen));
}

#[tokio::test]
async fn serial_options_and_defaults() {
    let (board, _sim) = common::ready_board();
    let options = SerialOptions {
        port_id: Some("/dev/ttyS0".into()),
        baud_rate: Some(115_200),
        data_bits: Some(7),
        stop_bits: Some(2),
        parity: Some("odd".into()),
    };
    let serial = board.create_serial(options).unwrap();
    assert_eq!(serial.port(), "/dev/ttyS0");
    assert_eq!(serial.baud_rate(), 115_200);
    assert_eq!(serial.data_bits(), DataBits::Seven);
    assert_eq!(serial.stop_bits(), StopBits::Two);
    assert_eq!(serial.parity(), Parity::Odd);
}

#[test]
fn serial_rejects_unknown_ports_and_bad_framing() {
    let (board, _sim) = common::ready_board();
    assert_eq!(
        board.create_serial(SerialOptions::port("/dev/ttyUSB9")).err(),
        Some(HalError::UnknownAlias("/dev/ttyUSB9".into()))
    );
    let options = SerialOptions {
        data_bits: Some(9),
        ..SerialOptions::default()
    };
    assert_eq!(
        board.create_serial(options).err(),
        Some(HalError::InvalidDataBits(9))
    );
    assert!(board.registry().is_empty());
}

#[tokio::test]
async fn serial_destroy_aborts_an_open_port() {
    let (board, sim) = common::ready_board();
    let mut serial = board.create_serial(SerialOptions::default()).unwrap();
    serial.open().await.unwrap();

    serial.destroy().unwrap();
    assert_eq!(sim.serial_aborts(), 1);
    assert!(!sim.serial_is_open("/dev/ttyAMA0"));
    assert_eq!(serial.open().await, Err(HalError::PeripheralDestroyed));
    assert!(board.registry().is_empty());
}
