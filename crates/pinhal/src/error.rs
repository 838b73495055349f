//! Error taxonomy shared by the resolver, the registry and every driver.

use alloc::string::String;

use crate::peripheral::PeripheralKind;
use crate::pin::{PinFunction, PinId};

/// Failure reported by a platform backend while talking to hardware.
///
/// These only ever reach callers through the result of an I/O operation
/// (or of a factory whose backend configuration failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Device file or register access failed
    Io,
    /// I2C target did not acknowledge
    Nack,
    /// Operation did not complete in time
    Timeout,
    /// Bus or port is in use by something outside this process
    Busy,
    /// Underlying handle has been closed
    Closed,
}

impl core::fmt::Display for TransportError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io => write!(f, "I/O error"),
            Self::Nack => write!(f, "no acknowledge from device"),
            Self::Timeout => write!(f, "operation timed out"),
            Self::Busy => write!(f, "bus busy"),
            Self::Closed => write!(f, "handle closed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TransportError {}

/// Every failure the HAL can report.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// Symbolic pin name has no entry in the platform alias table
    UnknownAlias(String),
    /// Pin set was empty or larger than a peripheral may occupy
    InvalidPinSet,
    /// Pin is already claimed by another live peripheral
    PinConflict {
        /// First pin of the request found to be owned
        pin: PinId,
        /// Kind of the current owner
        owner: PeripheralKind,
    },
    /// Operation attempted on a destroyed peripheral
    PeripheralDestroyed,
    /// Pin acquisition attempted before platform bring-up completed
    NotInitialized,
    /// `init` called while a previous `init` is still running
    InitInProgress,
    /// Pin cannot serve the requested function on this platform
    Unsupported {
        /// Requested pin
        pin: PinId,
        /// Requested function
        function: PinFunction,
    },
    /// PWM duty cycle outside `0.0..=1.0` (or NaN)
    InvalidDutyCycle,
    /// Configuration value rejected; the payload names the field
    InvalidConfig(&'static str),
    /// I2C address outside the 7-bit space
    InvalidAddress(u8),
    /// Serial data bits other than 5, 6, 7 or 8
    InvalidDataBits(u8),
    /// Serial stop bits other than 1 or 2
    InvalidStopBits(u8),
    /// Serial parity name not one of none/even/odd/mark/space
    InvalidParity,
    /// Serial baud rate of zero
    InvalidBaudRate,
    /// Serial write or flush before `open`
    NotOpen,
    /// Backend failure
    Transport(TransportError),
}

impl From<TransportError> for HalError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}

impl core::fmt::Display for HalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownAlias(name) => write!(f, "unknown pin alias \"{name}\""),
            Self::InvalidPinSet => write!(f, "pin set must hold between 1 and 4 pins"),
            Self::PinConflict { pin, owner } => {
                write!(f, "pin {pin} is already in use by a {owner} peripheral")
            }
            Self::PeripheralDestroyed => {
                write!(f, "attempted to use a peripheral that has been destroyed")
            }
            Self::NotInitialized => write!(f, "platform has not been initialized"),
            Self::InitInProgress => write!(f, "platform initialization already in progress"),
            Self::Unsupported { pin, function } => {
                write!(f, "pin {pin} does not support {function}")
            }
            Self::InvalidDutyCycle => write!(f, "duty cycle must be between 0 and 1"),
            Self::InvalidConfig(field) => write!(f, "invalid configuration value for {field}"),
            Self::InvalidAddress(addr) => write!(f, "invalid I2C address 0x{addr:02x}"),
            Self::InvalidDataBits(bits) => write!(f, "invalid data bits {bits}"),
            Self::InvalidStopBits(bits) => write!(f, "invalid stop bits {bits}"),
            Self::InvalidParity => write!(f, "invalid parity"),
            Self::InvalidBaudRate => write!(f, "invalid baud rate"),
            Self::NotOpen => write!(f, "serial port is not open"),
            Self::Transport(err) => write!(f, "transport error: {err}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}
