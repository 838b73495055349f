//! On-board status LED

use crate::error::HalError;
use crate::gpio::Value;
use crate::peripheral::{Peripheral, PinOwner};
use crate::platform::LedLine;

/// LED control. Boards without an LED accept writes and read `Low`.
pub trait LedPeripheral: Peripheral {
    /// `true` when the board has a physical LED.
    fn has_led(&self) -> bool;

    /// Current LED state.
    ///
    /// # Errors
    ///
    /// [`HalError::PeripheralDestroyed`] once destroyed.
    fn read(&self) -> Result<Value, HalError>;

    /// Switch the LED.
    ///
    /// # Errors
    ///
    /// [`HalError::PeripheralDestroyed`] once destroyed.
    fn write(&mut self, value: Value) -> Result<(), HalError>;
}

/// Status LED.
pub struct Led<L: LedLine> {
    owner: PinOwner,
    line: Option<L>,
}

impl<L: LedLine> Led<L> {
    /// Wrap the claimed LED pin and the board's LED, if any.
    pub fn new(owner: PinOwner, line: Option<L>) -> Self {
        Self { owner, line }
    }
}

impl<L: LedLine> Peripheral for Led<L> {
    fn owner(&self) -> &PinOwner {
        &self.owner
    }
}

impl<L: LedLine> LedPeripheral for Led<L> {
    fn has_led(&self) -> bool {
        self.line.is_some()
    }

    fn read(&self) -> Result<Value, HalError> {
        self.validate_alive()?;
        Ok(self.line.as_ref().map_or(Value::Low, LedLine::read))
    }

    fn write(&mut self, value: Value) -> Result<(), HalError> {
        self.validate_alive()?;
        if let Some(line) = self.line.as_mut() {
            line.write(value);
        }
        Ok(())
    }
}
