//! Digital input and output peripherals

use crate::error::HalError;
use crate::peripheral::{Peripheral, PinOwner};
use crate::pin::{PinAlias, PinId};
use crate::platform::GpioLine;

/// Logic level of a digital pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum Value {
    /// Logic low (0)
    #[default]
    Low = 0,
    /// Logic high (1)
    High = 1,
}

impl Value {
    /// Numeric level, `0` or `1`.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Opposite level.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }
}

impl From<bool> for Value {
    fn from(high: bool) -> Self {
        if high {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl From<Value> for bool {
    fn from(value: Value) -> Self {
        value == Value::High
    }
}

impl TryFrom<u8> for Value {
    type Error = HalError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Low),
            1 => Ok(Self::High),
            _ => Err(HalError::InvalidConfig("value")),
        }
    }
}

/// Input bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PullResistor {
    /// Floating
    #[default]
    None,
    /// Pulled to VCC
    Up,
    /// Pulled to ground
    Down,
}

/// Options for a digital input or output.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpioConfig {
    /// Pin number or alias
    pub pin: PinAlias,
    /// Input bias; platform default when unset. Ignored for outputs.
    #[cfg_attr(feature = "serde", serde(default))]
    pub pull_resistor: Option<PullResistor>,
}

impl GpioConfig {
    /// Config for `pin` with default bias.
    pub fn new(pin: impl Into<PinAlias>) -> Self {
        Self {
            pin: pin.into(),
            pull_resistor: None,
        }
    }

    /// Set the input bias.
    #[must_use]
    pub fn with_pull(mut self, pull: PullResistor) -> Self {
        self.pull_resistor = Some(pull);
        self
    }
}

impl From<PinAlias> for GpioConfig {
    fn from(pin: PinAlias) -> Self {
        Self::new(pin)
    }
}

impl From<PinId> for GpioConfig {
    fn from(pin: PinId) -> Self {
        Self::new(pin)
    }
}

impl From<u32> for GpioConfig {
    fn from(pin: u32) -> Self {
        Self::new(pin)
    }
}

impl From<&str> for GpioConfig {
    fn from(pin: &str) -> Self {
        Self::new(pin)
    }
}

/// Reading side of a digital pin.
pub trait InputPeripheral: Peripheral {
    /// Sample the pin.
    ///
    /// # Errors
    ///
    /// [`HalError::PeripheralDestroyed`] once destroyed.
    fn read(&mut self) -> Result<Value, HalError>;

    /// Last sampled level.
    fn value(&self) -> Value;

    /// Configured bias.
    fn pull_resistor(&self) -> PullResistor;
}

/// Driving side of a digital pin.
pub trait OutputPeripheral: Peripheral {
    /// Drive the pin.
    ///
    /// # Errors
    ///
    /// [`HalError::PeripheralDestroyed`] once destroyed.
    fn write(&mut self, value: Value) -> Result<(), HalError>;

    /// Level last written.
    fn value(&self) -> Value;
}

/// Digital input pin.
pub struct DigitalInput<L: GpioLine> {
    owner: PinOwner,
    line: L,
    value: Value,
    pull: PullResistor,
}

impl<L: GpioLine> DigitalInput<L> {
    /// Wrap a claimed pin and its configured line, sampling it once.
    pub fn new(owner: PinOwner, mut line: L, pull: PullResistor) -> Self {
        let value = line.read();
        Self {
            owner,
            line,
            value,
            pull,
        }
    }
}

impl<L: GpioLine> Peripheral for DigitalInput<L> {
    fn owner(&self) -> &PinOwner {
        &self.owner
    }
}

impl<L: GpioLine> InputPeripheral for DigitalInput<L> {
    fn read(&mut self) -> Result<Value, HalError> {
        self.validate_alive()?;
        self.value = self.line.read();
        Ok(self.value)
    }

    fn value(&self) -> Value {
        self.value
    }

    fn pull_resistor(&self) -> PullResistor {
        self.pull
    }
}

/// Digital output pin.
pub struct DigitalOutput<L: GpioLine> {
    owner: PinOwner,
    line: L,
    value: Value,
}

impl<L: GpioLine> DigitalOutput<L> {
    /// Wrap a claimed pin and its configured line. The line starts low.
    pub fn new(owner: PinOwner, mut line: L) -> Self {
        line.write(Value::Low);
        Self {
            owner,
            line,
            value: Value::Low,
        }
    }
}

impl<L: GpioLine> Peripheral for DigitalOutput<L> {
    fn owner(&self) -> &PinOwner {
        &self.owner
    }
}

impl<L: GpioLine> OutputPeripheral for DigitalOutput<L> {
    fn write(&mut self, value: Value) -> Result<(), HalError> {
        self.validate_alive()?;
        self.line.write(value);
        self.value = value;
        Ok(())
    }

    fn value(&self) -> Value {
        self.value
    }
}
