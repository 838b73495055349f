//! Hardware PWM peripheral

use crate::error::HalError;
use crate::peripheral::{Peripheral, PinOwner};
use crate::pin::{PinAlias, PinId};
use crate::platform::PwmChannel;

/// Options for a PWM output.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PwmConfig {
    /// Pin number or alias
    pub pin: PinAlias,
    /// Frequency in Hz; platform default when unset
    #[cfg_attr(feature = "serde", serde(default))]
    pub frequency: Option<u32>,
    /// Ticks per period; platform default when unset
    #[cfg_attr(feature = "serde", serde(default))]
    pub range: Option<u32>,
}

impl PwmConfig {
    /// Config for `pin` with default frequency and range.
    pub fn new(pin: impl Into<PinAlias>) -> Self {
        Self {
            pin: pin.into(),
            frequency: None,
            range: None,
        }
    }

    /// Set the frequency in Hz.
    #[must_use]
    pub fn with_frequency(mut self, frequency: u32) -> Self {
        self.frequency = Some(frequency);
        self
    }

    /// Set the range in ticks.
    #[must_use]
    pub fn with_range(mut self, range: u32) -> Self {
        self.range = Some(range);
        self
    }
}

impl From<PinAlias> for PwmConfig {
    fn from(pin: PinAlias) -> Self {
        Self::new(pin)
    }
}

impl From<PinId> for PwmConfig {
    fn from(pin: PinId) -> Self {
        Self::new(pin)
    }
}

impl From<u32> for PwmConfig {
    fn from(pin: u32) -> Self {
        Self::new(pin)
    }
}

impl From<&str> for PwmConfig {
    fn from(pin: &str) -> Self {
        Self::new(pin)
    }
}

/// Convert a duty cycle to ticks, rejecting NaN and values outside `0..=1`.
///
/// # Errors
///
/// [`HalError::InvalidDutyCycle`]
pub fn duty_to_ticks(duty_cycle: f64, range: u32) -> Result<u32, HalError> {
    if !(0.0..=1.0).contains(&duty_cycle) {
        return Err(HalError::InvalidDutyCycle);
    }
    // Non-negative and at most `range + 0.5`, so the cast cannot wrap.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let ticks = (duty_cycle * f64::from(range) + 0.5) as u32;
    Ok(ticks.min(range))
}

/// Duty-cycle control.
pub trait PwmPeripheral: Peripheral {
    /// Set the duty cycle as a fraction of the range.
    ///
    /// # Errors
    ///
    /// [`HalError::InvalidDutyCycle`] for NaN or values outside `0..=1`
    /// (the previous duty is kept); [`HalError::PeripheralDestroyed`] once
    /// destroyed.
    fn write(&mut self, duty_cycle: f64) -> Result<(), HalError>;

    /// Configured frequency in Hz.
    fn frequency(&self) -> u32;

    /// Configured range in ticks.
    fn range(&self) -> u32;

    /// Duty cycle last written.
    fn duty_cycle(&self) -> f64;
}

/// PWM output.
pub struct Pwm<C: PwmChannel> {
    owner: PinOwner,
    channel: C,
    frequency: u32,
    range: u32,
    duty_cycle: f64,
}

impl<C: PwmChannel> Pwm<C> {
    /// Wrap a claimed pin and its started channel. Duty starts at zero.
    pub fn new(owner: PinOwner, channel: C, frequency: u32, range: u32) -> Self {
        Self {
            owner,
            channel,
            frequency,
            range,
            duty_cycle: 0.0,
        }
    }
}

impl<C: PwmChannel> Peripheral for Pwm<C> {
    fn owner(&self) -> &PinOwner {
        &self.owner
    }

    fn destroy(&mut self) -> Result<(), HalError> {
        self.validate_alive()?;
        self.channel.set_ticks(0);
        self.duty_cycle = 0.0;
        self.owner.destroy()
    }
}

impl<C: PwmChannel> PwmPeripheral for Pwm<C> {
    fn write(&mut self, duty_cycle: f64) -> Result<(), HalError> {
        self.validate_alive()?;
        let ticks = duty_to_ticks(duty_cycle, self.range)?;
        self.channel.set_ticks(ticks);
        self.duty_cycle = duty_cycle;
        Ok(())
    }

    fn frequency(&self) -> u32 {
        self.frequency
    }

    fn range(&self) -> u32 {
        self.range
    }

    fn duty_cycle(&self) -> f64 {
        self.duty_cycle
    }
}

impl<C: PwmChannel> Drop for Pwm<C> {
    fn drop(&mut self) {
        if self.alive() {
            let _ = self.destroy();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn ticks_round_to_nearest() {
        assert_eq!(duty_to_ticks(0.5, 1024).unwrap(), 512);
        assert_eq!(duty_to_ticks(1.0, 1024).unwrap(), 1024);
        assert_eq!(duty_to_ticks(0.0, 1024).unwrap(), 0);
        assert_eq!(duty_to_ticks(0.3333, 3).unwrap(), 1);
    }

    #[test]
    fn out_of_range_duty_is_rejected() {
        for duty in [1.5, -0.1, f64::NAN, f64::INFINITY] {
            assert_eq!(duty_to_ticks(duty, 1024), Err(HalError::InvalidDutyCycle));
        }
    }
}
