//! Serial (UART) peripheral
//!
//! An open/closed state machine layered over the alive/dead lifecycle.
//! Writing or flushing a closed port fails with [`HalError::NotOpen`];
//! opening an open port or closing a closed one completes immediately.

use alloc::string::String;

use crate::error::HalError;
use crate::log::hal_debug;
use crate::peripheral::{Peripheral, PinOwner};
use crate::platform::{PlatformDefaults, SerialTransport};

/// Data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub enum DataBits {
    /// 5 data bits
    Five,
    /// 6 data bits
    Six,
    /// 7 data bits
    Seven,
    /// 8 data bits
    Eight,
}

impl DataBits {
    /// Number of bits.
    #[must_use]
    pub fn bits(self) -> u8 {
        match self {
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
        }
    }
}

impl TryFrom<u8> for DataBits {
    type Error = HalError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            5 => Ok(Self::Five),
            6 => Ok(Self::Six),
            7 => Ok(Self::Seven),
            8 => Ok(Self::Eight),
            other => Err(HalError::InvalidDataBits(other)),
        }
    }
}

impl From<DataBits> for u8 {
    fn from(bits: DataBits) -> Self {
        bits.bits()
    }
}

/// Stop bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub enum StopBits {
    /// 1 stop bit
    One,
    /// 2 stop bits
    Two,
}

impl StopBits {
    /// Number of bits.
    #[must_use]
    pub fn bits(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

impl TryFrom<u8> for StopBits {
    type Error = HalError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(HalError::InvalidStopBits(other)),
        }
    }
}

impl From<StopBits> for u8 {
    fn from(bits: StopBits) -> Self {
        bits.bits()
    }
}

/// Parity mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Parity {
    /// No parity bit
    None,
    /// Even parity
    Even,
    /// Odd parity
    Odd,
    /// Parity bit always 1
    Mark,
    /// Parity bit always 0
    Space,
}

impl Parity {
    /// Lower-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Even => "even",
            Self::Odd => "odd",
            Self::Mark => "mark",
            Self::Space => "space",
        }
    }
}

impl core::str::FromStr for Parity {
    type Err = HalError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "none" => Ok(Self::None),
            "even" => Ok(Self::Even),
            "odd" => Ok(Self::Odd),
            "mark" => Ok(Self::Mark),
            "space" => Ok(Self::Space),
            _ => Err(HalError::InvalidParity),
        }
    }
}

impl core::fmt::Display for Parity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied serial options, validated by [`SerialConfig::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SerialOptions {
    /// Device name, e.g. `/dev/ttyAMA0`
    pub port_id: Option<String>,
    /// Baud rate
    pub baud_rate: Option<u32>,
    /// 5, 6, 7 or 8
    pub data_bits: Option<u8>,
    /// 1 or 2
    pub stop_bits: Option<u8>,
    /// none, even, odd, mark or space
    pub parity: Option<String>,
}

impl SerialOptions {
    /// Options for `port` with everything else defaulted.
    pub fn port(port: impl Into<String>) -> Self {
        Self {
            port_id: Some(port.into()),
            ..Self::default()
        }
    }

    /// Set the baud rate.
    #[must_use]
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = Some(baud_rate);
        self
    }
}

/// Validated serial configuration handed to the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device name
    pub port: String,
    /// Baud rate (non-zero)
    pub baud_rate: u32,
    /// Data bits
    pub data_bits: DataBits,
    /// Stop bits
    pub stop_bits: StopBits,
    /// Parity
    pub parity: Parity,
}

impl SerialConfig {
    /// Fill unset options from `defaults` and validate the result.
    ///
    /// # Errors
    ///
    /// [`HalError::InvalidBaudRate`], [`HalError::InvalidDataBits`],
    /// [`HalError::InvalidStopBits`] or [`HalError::InvalidParity`].
    pub fn resolve(options: &SerialOptions, defaults: &PlatformDefaults) -> Result<Self, HalError> {
        let baud_rate = options.baud_rate.unwrap_or(defaults.baud_rate);
        if baud_rate == 0 {
            return Err(HalError::InvalidBaudRate);
        }
        let data_bits = match options.data_bits {
            Some(bits) => DataBits::try_from(bits)?,
            None => defaults.data_bits,
        };
        let stop_bits = match options.stop_bits {
            Some(bits) => StopBits::try_from(bits)?,
            None => defaults.stop_bits,
        };
        let parity = match options.parity.as_deref() {
            Some(name) => name.parse()?,
            None => defaults.parity,
        };
        let port = options
            .port_id
            .clone()
            .unwrap_or_else(|| defaults.serial_port.clone());

        Ok(Self {
            port,
            baud_rate,
            data_bits,
            stop_bits,
            parity,
        })
    }
}

/// Serial port operations.
pub trait SerialPeripheral: Peripheral {
    /// Device name.
    fn port(&self) -> &str;

    /// Baud rate.
    fn baud_rate(&self) -> u32;

    /// Data bits.
    fn data_bits(&self) -> DataBits;

    /// Stop bits.
    fn stop_bits(&self) -> StopBits;

    /// Parity.
    fn parity(&self) -> Parity;

    /// `true` between a successful `open` and `close`.
    fn is_open(&self) -> bool;

    /// Open the port. No-op if already open.
    fn open(&mut self) -> impl core::future::Future<Output = Result<(), HalError>>;

    /// Close the port. No-op if already closed.
    fn close(&mut self) -> impl core::future::Future<Output = Result<(), HalError>>;

    /// Send bytes or text.
    fn write<D: AsRef<[u8]>>(
        &mut self,
        data: D,
    ) -> impl core::future::Future<Output = Result<(), HalError>>;

    /// Wait for pending output to drain.
    fn flush(&mut self) -> impl core::future::Future<Output = Result<(), HalError>>;
}

/// UART.
pub struct Serial<T: SerialTransport> {
    owner: PinOwner,
    transport: T,
    config: SerialConfig,
    open: bool,
}

impl<T: SerialTransport> Serial<T> {
    /// Wrap the claimed TX/RX pins and an unopened transport.
    pub fn new(owner: PinOwner, transport: T, config: SerialConfig) -> Self {
        Self {
            owner,
            transport,
            config,
            open: false,
        }
    }

    /// Validated configuration.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    fn ensure_open(&self) -> Result<(), HalError> {
        self.validate_alive()?;
        if self.open {
            Ok(())
        } else {
            Err(HalError::NotOpen)
        }
    }
}

impl<T: SerialTransport> Peripheral for Serial<T> {
    fn owner(&self) -> &PinOwner {
        &self.owner
    }

    fn destroy(&mut self) -> Result<(), HalError> {
        self.validate_alive()?;
        if self.open {
            self.transport.abort();
            self.open = false;
        }
        self.owner.destroy()
    }
}

impl<T: SerialTransport> SerialPeripheral for Serial<T> {
    fn port(&self) -> &str {
        &self.config.port
    }

    fn baud_rate(&self) -> u32 {
        self.config.baud_rate
    }

    fn data_bits(&self) -> DataBits {
        self.config.data_bits
    }

    fn stop_bits(&self) -> StopBits {
        self.config.stop_bits
    }

    fn parity(&self) -> Parity {
        self.config.parity
    }

    fn is_open(&self) -> bool {
        self.open
    }

    async fn open(&mut self) -> Result<(), HalError> {
        self.validate_alive()?;
        if self.open {
            return Ok(());
        }
        self.transport.open().await?;
        self.open = true;
        hal_debug!(
            "serial port {} opened at {} baud",
            self.config.port.as_str(),
            self.config.baud_rate
        );
        Ok(())
    }

    async fn close(&mut self) -> Result<(), HalError> {
        self.validate_alive()?;
        if !self.open {
            return Ok(());
        }
        self.transport.close().await?;
        self.open = false;
        hal_debug!("serial port {} closed", self.config.port.as_str());
        Ok(())
    }

    async fn write<D: AsRef<[u8]>>(&mut self, data: D) -> Result<(), HalError> {
        self.ensure_open()?;
        self.transport.write(data.as_ref()).await?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), HalError> {
        self.ensure_open()?;
        self.transport.flush().await?;
        Ok(())
    }
}

impl<T: SerialTransport> Drop for Serial<T> {
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
    fn framing_values_are_validated() {
        assert_eq!(DataBits::try_from(7).unwrap(), DataBits::Seven);
        assert_eq!(DataBits::try_from(9), Err(HalError::InvalidDataBits(9)));
        assert_eq!(StopBits::try_from(2).unwrap(), StopBits::Two);
        assert_eq!(StopBits::try_from(0), Err(HalError::InvalidStopBits(0)));
        assert_eq!("mark".parse::<Parity>().unwrap(), Parity::Mark);
        assert_eq!("MARK".parse::<Parity>(), Err(HalError::InvalidParity));
    }

    #[test]
    fn unset_options_take_platform_defaults() {
        let config = SerialConfig::resolve(&SerialOptions::default(), &PlatformDefaults::default())
            .unwrap();
        assert_eq!(config.port, "/dev/ttyAMA0");
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.stop_bits, StopBits::One);
        assert_eq!(config.parity, Parity::None);
    }

    #[test]
    fn explicit_options_are_checked() {
        let defaults = PlatformDefaults::default();
        let options = SerialOptions {
            baud_rate: Some(0),
            ..SerialOptions::default()
        };
        assert_eq!(
            SerialConfig::resolve(&options, &defaults),
            Err(HalError::InvalidBaudRate)
        );

        let options = SerialOptions {
            parity: Some("sideways".into()),
            ..SerialOptions::port("/dev/ttyUSB0").with_baud_rate(115_200)
        };
        assert_eq!(
            SerialConfig::resolve(&options, &defaults),
            Err(HalError::InvalidParity)
        );
    }
}
