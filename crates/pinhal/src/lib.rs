//! Pin-ownership HAL for single-board computers
//!
//! One pin, one owner. A [`Registry`] arbitrates exclusive ownership of
//! physical pins among the peripheral drivers built on top of it: digital
//! input and output, PWM, I2C, the status LED and serial ports. Every driver
//! composes a [`PinOwner`] that holds its claim and releases it on
//! `destroy()` or drop.
//!
//! # Architecture Layers
//!
//! ```text
//! Application
//!         ↓
//! Board factories (resolve → claim → configure backend)
//!         ↓
//! Drivers (Peripheral + kind-specific traits)
//!         ↓
//! Registry (pin → live peripheral)
//!         ↓
//! Platform backends (GPIO, PWM, I2C, LED, UART)
//! ```
//!
//! # Features
//!
//! - `std` (default): `std::error::Error` impls and the [`sim`] platform
//! - `serde` (default): serde derives on option types and [`config`]
//! - `defmt`: `defmt::Format` derives and defmt log output
//! - `tracing`: log output through `tracing`
//!
//! # Example
//!
//! ```no_run
//! use pinhal::{Board, OutputPeripheral, Peripheral, Platform, Value};
//!
//! async fn blink<P: Platform>(board: &Board<P>) -> Result<(), pinhal::HalError> {
//!     board.init().await?;
//!     let mut led = board.create_digital_output("GPIO17")?;
//!     led.write(Value::High)?;
//!     led.destroy()
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // log through defmt/tracing, never println!
#![allow(clippy::doc_markdown)] // device paths and register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors — callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

extern crate alloc;

mod log;

pub mod board;
#[cfg(feature = "serde")]
pub mod config;
pub mod error;
pub mod gpio;
pub mod i2c;
pub mod led;
pub mod peripheral;
pub mod pin;
pub mod platform;
pub mod pwm;
pub mod registry;
pub mod serial;
#[cfg(any(test, feature = "std"))]
pub mod sim;

pub use board::Board;
pub use error::{HalError, TransportError};
pub use registry::{InitState, Registry};

// Re-export pin types
pub use pin::{resolve, PinAlias, PinFunction, PinId, PinInfo, PinMap, PinResolver, PinSet};

// Re-export peripheral base types
pub use peripheral::{
    DestroyListener, DestroyedEvent, Peripheral, PeripheralId, PeripheralKind, PeripheralRef,
    PinOwner,
};

// Re-export platform traits
pub use platform::{
    GpioLine, GpioMode, I2cBus, LedLine, Platform, PlatformDefaults, PwmChannel, SerialTransport,
};

// Re-export drivers
pub use gpio::{
    DigitalInput, DigitalOutput, GpioConfig, InputPeripheral, OutputPeripheral, PullResistor,
    Value,
};
pub use i2c::{I2c, I2cPeripheral};
pub use led::{Led, LedPeripheral};
pub use pwm::{Pwm, PwmConfig, PwmPeripheral};
pub use serial::{
    DataBits, Parity, Serial, SerialConfig, SerialOptions, SerialPeripheral, StopBits,
};

#[cfg(feature = "serde")]
pub use config::{BoardConfig, ConfigError, PinEntry};
