//! Board: a platform plus its pin registry, and the driver factories
//!
//! Every factory follows the same sequence: resolve the pin alias, validate
//! the options, claim the full pin set atomically, then configure the
//! backend. A failure at any step returns before a driver exists; a claim
//! made before a backend failure is released when its owner drops.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;

use crate::error::HalError;
use crate::gpio::{DigitalInput, DigitalOutput, GpioConfig};
use crate::i2c::I2c;
use crate::led::Led;
use crate::log::hal_debug;
use crate::peripheral::{PeripheralKind, PeripheralRef, PinOwner};
use crate::pin::{self, PinAlias, PinFunction, PinId, PinInfo, PinSet};
use crate::platform::{GpioMode, Platform};
use crate::pwm::{Pwm, PwmConfig};
use crate::registry::Registry;
use crate::serial::{Serial, SerialConfig, SerialOptions};

/// A platform and the registry arbitrating its pins.
pub struct Board<P: Platform> {
    platform: P,
    registry: Rc<Registry>,
}

impl<P: Platform> Board<P> {
    /// Board over `platform` with a fresh registry.
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            registry: Rc::new(Registry::new()),
        }
    }

    /// Bring the platform up. Must succeed before any factory is used.
    ///
    /// # Errors
    ///
    /// See [`Registry::init`].
    pub async fn init(&self) -> Result<(), HalError> {
        self.registry.init(&self.platform).await
    }

    /// Pin registry.
    pub fn registry(&self) -> &Rc<Registry> {
        &self.registry
    }

    /// Underlying platform.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Canonical id for a pin number or alias.
    ///
    /// # Errors
    ///
    /// [`HalError::UnknownAlias`] for unknown names.
    pub fn resolve(&self, alias: impl Into<PinAlias>) -> Result<PinId, HalError> {
        pin::resolve(&self.platform, &alias.into())
    }

    /// Aliases and functions of a pin, if the platform publishes a table.
    ///
    /// # Errors
    ///
    /// [`HalError::UnknownAlias`] for unknown names.
    pub fn pin_info(&self, alias: impl Into<PinAlias>) -> Result<Option<PinInfo>, HalError> {
        let pin = self.resolve(alias)?;
        Ok(self
            .platform
            .pin_map()
            .and_then(|map| map.info(pin))
            .cloned())
    }

    /// Snapshot of claimed pins and their owners.
    pub fn active_peripherals(&self) -> BTreeMap<PinId, PeripheralRef> {
        self.registry.active_peripherals()
    }

    fn check_function(&self, pin: PinId, function: PinFunction) -> Result<(), HalError> {
        let supported = self
            .platform
            .pin_map()
            .map_or(true, |map| map.supports(pin, function));
        if supported {
            Ok(())
        } else {
            Err(HalError::Unsupported { pin, function })
        }
    }

    fn claim(&self, kind: PeripheralKind, pins: PinSet) -> Result<PinOwner, HalError> {
        let owner = PinOwner::claim(&self.registry, kind, pins)?;
        hal_debug!("created {} peripheral {}", kind, owner.id().get());
        Ok(owner)
    }

    /// Claim a pin as a digital input.
    ///
    /// # Errors
    ///
    /// [`HalError::UnknownAlias`], [`HalError::Unsupported`],
    /// [`HalError::PinConflict`], [`HalError::NotInitialized`] or a backend
    /// [`HalError::Transport`] failure.
    pub fn create_digital_input(
        &self,
        config: impl Into<GpioConfig>,
    ) -> Result<DigitalInput<P::Gpio>, HalError> {
        let config = config.into();
        let pin = pin::resolve(&self.platform, &config.pin)?;
        self.check_function(pin, PinFunction::Gpio)?;
        let pull = config
            .pull_resistor
            .unwrap_or_else(|| self.platform.defaults().pull_resistor);

        let owner = self.claim(PeripheralKind::DigitalInput, PinSet::single(pin))?;
        let line = self.platform.gpio(pin, GpioMode::Input(pull))?;
        Ok(DigitalInput::new(owner, line, pull))
    }

    /// Claim a pin as a digital output, driven low.
    ///
    /// # Errors
    ///
    /// As [`Board::create_digital_input`].
    pub fn create_digital_output(
        &self,
        config: impl Into<GpioConfig>,
    ) -> Result<DigitalOutput<P::Gpio>, HalError> {
        let config = config.into();
        let pin = pin::resolve(&self.platform, &config.pin)?;
        self.check_function(pin, PinFunction::Gpio)?;

        let owner = self.claim(PeripheralKind::DigitalOutput, PinSet::single(pin))?;
        let line = self.platform.gpio(pin, GpioMode::Output)?;
        Ok(DigitalOutput::new(owner, line))
    }

    /// Start a hardware PWM output with zero duty.
    ///
    /// # Errors
    ///
    /// [`HalError::InvalidConfig`] for a zero frequency or range,
    /// [`HalError::Unsupported`] for pins without PWM, otherwise as
    /// [`Board::create_digital_input`].
    pub fn create_pwm(&self, config: impl Into<PwmConfig>) -> Result<Pwm<P::Pwm>, HalError> {
        let config = config.into();
        let pin = pin::resolve(&self.platform, &config.pin)?;
        let defaults = self.platform.defaults();
        let frequency = config.frequency.unwrap_or(defaults.pwm_frequency);
        if frequency == 0 {
            return Err(HalError::InvalidConfig("frequency"));
        }
        let range = config.range.unwrap_or(defaults.pwm_range);
        if range == 0 {
            return Err(HalError::InvalidConfig("range"));
        }
        let pins = self.platform.pwm_pins(pin).ok_or(HalError::Unsupported {
            pin,
            function: PinFunction::Pwm,
        })?;

        let owner = self.claim(PeripheralKind::Pwm, pins)?;
        let channel = self.platform.pwm(pin, frequency, range)?;
        Ok(Pwm::new(owner, channel, frequency, range))
    }

    /// Open the I2C bus.
    ///
    /// # Errors
    ///
    /// [`HalError::PinConflict`] if a bus pin is taken, or a backend failure.
    pub fn create_i2c(&self) -> Result<I2c<P::I2c>, HalError> {
        let owner = self.claim(PeripheralKind::I2c, self.platform.i2c_pins())?;
        let bus = self.platform.i2c()?;
        Ok(I2c::new(owner, bus))
    }

    /// Claim the status LED. Succeeds on boards without one.
    ///
    /// # Errors
    ///
    /// [`HalError::PinConflict`] if the LED pin is taken, or a backend
    /// failure.
    pub fn create_led(&self) -> Result<Led<P::Led>, HalError> {
        let owner = self.claim(PeripheralKind::Led, self.platform.led_pins())?;
        let line = self.platform.led()?;
        Ok(Led::new(owner, line))
    }

    /// Create a closed serial port.
    ///
    /// # Errors
    ///
    /// Framing validation errors, [`HalError::UnknownAlias`] for a port the
    /// platform does not know, otherwise as [`Board::create_i2c`].
    pub fn create_serial(&self, options: SerialOptions) -> Result<Serial<P::Serial>, HalError> {
        let config = SerialConfig::resolve(&options, &self.platform.defaults())?;
        let pins = self
            .platform
            .serial_pins(&config.port)
            .ok_or_else(|| HalError::UnknownAlias(config.port.clone()))?;

        let owner = self.claim(PeripheralKind::Serial, pins)?;
        let transport = self.platform.serial(&config)?;
        Ok(Serial::new(owner, transport, config))
    }
}
