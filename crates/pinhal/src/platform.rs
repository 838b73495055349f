//! Platform collaborator traits
//!
//! A [`Platform`] knows the board's pin topology and hands out backend
//! handles for individual hardware functions. Drivers own those handles for
//! their lifetime; the core never touches hardware any other way.

use alloc::string::String;

use crate::error::{HalError, TransportError};
use crate::gpio::{PullResistor, Value};
use crate::pin::{PinId, PinMap, PinResolver, PinSet};
use crate::serial::{DataBits, Parity, SerialConfig, StopBits};

/// Direction a GPIO line is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioMode {
    /// Input with the given bias
    Input(PullResistor),
    /// Push-pull output, starting low
    Output,
}

/// One configured GPIO line.
pub trait GpioLine {
    /// Sample the line level.
    fn read(&mut self) -> Value;

    /// Drive the line level (output lines only).
    fn write(&mut self, value: Value);
}

/// Hardware PWM channel.
pub trait PwmChannel {
    /// Set the high time in ticks out of the configured range.
    fn set_ticks(&mut self, ticks: u32);
}

/// I2C bus master.
pub trait I2cBus {
    /// Write data to a device
    fn write(
        &mut self,
        address: u8,
        data: &[u8],
    ) -> impl core::future::Future<Output = Result<(), TransportError>>;

    /// Read from a device
    fn read(
        &mut self,
        address: u8,
        buffer: &mut [u8],
    ) -> impl core::future::Future<Output = Result<(), TransportError>>;

    /// Write then read (repeated start)
    fn write_read(
        &mut self,
        address: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> impl core::future::Future<Output = Result<(), TransportError>>;

    /// Release the bus handle.
    fn close(&mut self);
}

/// On-board status LED.
pub trait LedLine {
    /// Current LED state
    fn read(&self) -> Value;

    /// Switch the LED
    fn write(&mut self, value: Value);
}

/// UART device.
pub trait SerialTransport {
    /// Open the device with the configuration it was created with
    fn open(&mut self) -> impl core::future::Future<Output = Result<(), TransportError>>;

    /// Close the device gracefully
    fn close(&mut self) -> impl core::future::Future<Output = Result<(), TransportError>>;

    /// Queue bytes for transmission
    fn write(&mut self, data: &[u8])
        -> impl core::future::Future<Output = Result<(), TransportError>>;

    /// Wait until queued bytes are transmitted
    fn flush(&mut self) -> impl core::future::Future<Output = Result<(), TransportError>>;

    /// Close immediately, discarding anything pending.
    fn abort(&mut self);
}

/// Values used for options a caller leaves unset.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlatformDefaults {
    /// GPIO input bias
    pub pull_resistor: PullResistor,
    /// PWM frequency (Hz)
    pub pwm_frequency: u32,
    /// PWM range (ticks per period)
    pub pwm_range: u32,
    /// Serial device
    pub serial_port: String,
    /// Serial baud rate
    pub baud_rate: u32,
    /// Serial data bits
    pub data_bits: DataBits,
    /// Serial stop bits
    pub stop_bits: StopBits,
    /// Serial parity
    pub parity: Parity,
}

impl Default for PlatformDefaults {
    fn default() -> Self {
        Self {
            pull_resistor: PullResistor::None,
            pwm_frequency: 50,
            pwm_range: 1024,
            serial_port: String::from("/dev/ttyAMA0"),
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
        }
    }
}

/// Board support: topology, bring-up and backend construction.
///
/// Backend constructors are only called after the pins involved have been
/// claimed, so an implementation may assume exclusive access.
pub trait Platform: PinResolver {
    /// GPIO backend
    type Gpio: GpioLine;
    /// PWM backend
    type Pwm: PwmChannel;
    /// I2C backend
    type I2c: I2cBus;
    /// LED backend
    type Led: LedLine;
    /// Serial backend
    type Serial: SerialTransport;

    /// One-time hardware bring-up.
    fn init(&self) -> impl core::future::Future<Output = Result<(), HalError>>;

    /// Defaults for unset options.
    fn defaults(&self) -> PlatformDefaults {
        PlatformDefaults::default()
    }

    /// Pin topology, if the platform publishes one.
    fn pin_map(&self) -> Option<&PinMap> {
        None
    }

    /// Configure `pin` as a GPIO line.
    fn gpio(&self, pin: PinId, mode: GpioMode) -> Result<Self::Gpio, TransportError>;

    /// Pins a PWM on `pin` occupies, or `None` if `pin` has no PWM.
    fn pwm_pins(&self, pin: PinId) -> Option<PinSet>;

    /// Start a PWM channel on `pin` with zero duty.
    fn pwm(&self, pin: PinId, frequency: u32, range: u32) -> Result<Self::Pwm, TransportError>;

    /// Pins used by the I2C bus.
    fn i2c_pins(&self) -> PinSet;

    /// Open the I2C bus.
    fn i2c(&self) -> Result<Self::I2c, TransportError>;

    /// Pin reserved for the status LED.
    fn led_pins(&self) -> PinSet;

    /// Status LED handle, `None` when the board has no LED.
    fn led(&self) -> Result<Option<Self::Led>, TransportError>;

    /// Pins used by serial `port`, or `None` for an unknown port.
    fn serial_pins(&self, port: &str) -> Option<PinSet>;

    /// Create an unopened serial transport.
    fn serial(&self, config: &SerialConfig) -> Result<Self::Serial, TransportError>;
}
