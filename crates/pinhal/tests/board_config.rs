//! Boards described by JSON pin tables.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use pinhal::sim::SimPlatform;
use pinhal::{
    Board, BoardConfig, ConfigError, HalError, PinFunction, PinId, PwmPeripheral, SerialOptions,
    SerialPeripheral,
};

const BOARD: &str = r#"{
    "defaults": {
        "pwm_frequency": 800,
        "pwm_range": 255,
        "serial_port": "/dev/ttyS0",
        "baud_rate": 57600,
        "pull_resistor": "down"
    },
    "pins": [
        { "id": 4,  "aliases": ["D4"],  "functions": ["gpio"] },
        { "id": 5,  "aliases": ["D5"],  "functions": ["gpio", "pwm"] },
        { "id": 14, "aliases": ["TX"],  "functions": ["gpio", "uart"] },
        { "id": 15, "aliases": ["RX"],  "functions": ["gpio", "uart"] }
    ]
}"#;

fn board_from_json(json: &str) -> Board<SimPlatform> {
    let config = BoardConfig::from_json(json).unwrap();
    let defaults = config.defaults.clone();
    let sim = SimPlatform::with_pin_map(config.into_pin_map().unwrap(), defaults);
    let board = Board::new(sim);
    embassy_futures::block_on(board.init()).unwrap();
    board
}

#[test]
fn aliases_and_capabilities_come_from_the_table() {
    let board = board_from_json(BOARD);
    assert_eq!(board.resolve("D5"), Ok(PinId::new(5)));
    assert_eq!(
        board.create_digital_output("GPIO17").err(),
        Some(HalError::UnknownAlias("GPIO17".into()))
    );

    let info = board.pin_info("TX").unwrap().unwrap();
    assert_eq!(info.functions, vec![PinFunction::Gpio, PinFunction::Uart]);
}

#[test]
fn omitted_options_use_board_defaults() {
    let board = board_from_json(BOARD);

    let pwm = board.create_pwm("D5").unwrap();
    assert_eq!(pwm.frequency(), 800);
    assert_eq!(pwm.range(), 255);

    let input = board.create_digital_input("D4").unwrap();
    assert_eq!(
        pinhal::InputPeripheral::pull_resistor(&input),
        pinhal::PullResistor::Down
    );

    let serial = board.create_serial(SerialOptions::default()).unwrap();
    assert_eq!(serial.port(), "/dev/ttyS0");
    assert_eq!(serial.baud_rate(), 57600);
}

#[test]
fn malformed_tables_are_rejected() {
    assert!(matches!(
        BoardConfig::from_json("{ \"pins\": 3 }"),
        Err(ConfigError::Parse(_))
    ));
    let duplicate = r#"{ "pins": [ { "id": 4 }, { "id": 4 } ] }"#;
    assert_eq!(
        BoardConfig::from_json(duplicate),
        Err(ConfigError::DuplicatePin(4))
    );
}
