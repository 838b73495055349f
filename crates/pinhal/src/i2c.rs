//! I2C bus master peripheral
//!
//! Addresses are 7-bit. Word transfers use SMBus byte order (low byte
//! first). Register forms write the register number and then either read
//! with a repeated start or append the payload to the same write.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::{HalError, TransportError};
use crate::log::hal_warn;
use crate::peripheral::{Peripheral, PinOwner};
use crate::platform::I2cBus;

/// Highest valid 7-bit address.
pub const MAX_ADDRESS: u8 = 0x7F;

fn check_address(address: u8) -> Result<(), HalError> {
    if address > MAX_ADDRESS {
        return Err(HalError::InvalidAddress(address));
    }
    Ok(())
}

fn transport(address: u8, err: TransportError) -> HalError {
    hal_warn!("i2c transfer with device {} failed: {}", address, err);
    HalError::Transport(err)
}

/// Bus operations. Every operation checks liveness and the address first.
pub trait I2cPeripheral: Peripheral {
    /// Read `length` bytes.
    fn read(
        &mut self,
        address: u8,
        length: usize,
    ) -> impl core::future::Future<Output = Result<Vec<u8>, HalError>>;

    /// Read `length` bytes starting at `register`.
    fn read_register(
        &mut self,
        address: u8,
        register: u8,
        length: usize,
    ) -> impl core::future::Future<Output = Result<Vec<u8>, HalError>>;

    /// Read one byte.
    fn read_byte(&mut self, address: u8)
        -> impl core::future::Future<Output = Result<u8, HalError>>;

    /// Read one byte from `register`.
    fn read_byte_register(
        &mut self,
        address: u8,
        register: u8,
    ) -> impl core::future::Future<Output = Result<u8, HalError>>;

    /// Read a little-endian word.
    fn read_word(&mut self, address: u8)
        -> impl core::future::Future<Output = Result<u16, HalError>>;

    /// Read a little-endian word from `register`.
    fn read_word_register(
        &mut self,
        address: u8,
        register: u8,
    ) -> impl core::future::Future<Output = Result<u16, HalError>>;

    /// Write raw bytes.
    fn write(
        &mut self,
        address: u8,
        data: &[u8],
    ) -> impl core::future::Future<Output = Result<(), HalError>>;

    /// Write bytes starting at `register`.
    fn write_register(
        &mut self,
        address: u8,
        register: u8,
        data: &[u8],
    ) -> impl core::future::Future<Output = Result<(), HalError>>;

    /// Write one byte.
    fn write_byte(
        &mut self,
        address: u8,
        byte: u8,
    ) -> impl core::future::Future<Output = Result<(), HalError>>;

    /// Write one byte to `register`.
    fn write_byte_register(
        &mut self,
        address: u8,
        register: u8,
        byte: u8,
    ) -> impl core::future::Future<Output = Result<(), HalError>>;

    /// Write a little-endian word.
    fn write_word(
        &mut self,
        address: u8,
        word: u16,
    ) -> impl core::future::Future<Output = Result<(), HalError>>;

    /// Write a little-endian word to `register`.
    fn write_word_register(
        &mut self,
        address: u8,
        register: u8,
        word: u16,
    ) -> impl core::future::Future<Output = Result<(), HalError>>;
}

/// I2C bus master.
pub struct I2c<B: I2cBus> {
    owner: PinOwner,
    bus: B,
}

impl<B: I2cBus> I2c<B> {
    /// Wrap the claimed bus pins and an open bus.
    pub fn new(owner: PinOwner, bus: B) -> Self {
        Self { owner, bus }
    }

    fn guard(&self, address: u8) -> Result<(), HalError> {
        self.validate_alive()?;
        check_address(address)
    }

    async fn read_into(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), HalError> {
        self.guard(address)?;
        self.bus
            .read(address, buffer)
            .await
            .map_err(|err| transport(address, err))
    }

    async fn read_register_into(
        &mut self,
        address: u8,
        register: u8,
        buffer: &mut [u8],
    ) -> Result<(), HalError> {
        self.guard(address)?;
        self.bus
            .write_read(address, &[register], buffer)
            .await
            .map_err(|err| transport(address, err))
    }

    async fn send(&mut self, address: u8, data: &[u8]) -> Result<(), HalError> {
        self.guard(address)?;
        self.bus
            .write(address, data)
            .await
            .map_err(|err| transport(address, err))
    }
}

impl<B: I2cBus> Peripheral for I2c<B> {
    fn owner(&self) -> &PinOwner {
        &self.owner
    }

    fn destroy(&mut self) -> Result<(), HalError> {
        self.validate_alive()?;
        self.bus.close();
        self.owner.destroy()
    }
}

impl<B: I2cBus> I2cPeripheral for I2c<B> {
    async fn read(&mut self, address: u8, length: usize) -> Result<Vec<u8>, HalError> {
        let mut buffer = vec![0u8; length];
        self.read_into(address, &mut buffer).await?;
        Ok(buffer)
    }

    async fn read_register(
        &mut self,
        address: u8,
        register: u8,
        length: usize,
    ) -> Result<Vec<u8>, HalError> {
        let mut buffer = vec![0u8; length];
        self.read_register_into(address, register, &mut buffer).await?;
        Ok(buffer)
    }

    async fn read_byte(&mut self, address: u8) -> Result<u8, HalError> {
        let mut buffer = [0u8; 1];
        self.read_into(address, &mut buffer).await?;
        let [byte] = buffer;
        Ok(byte)
    }

    async fn read_byte_register(&mut self, address: u8, register: u8) -> Result<u8, HalError> {
        let mut buffer = [0u8; 1];
        self.read_register_into(address, register, &mut buffer).await?;
        let [byte] = buffer;
        Ok(byte)
    }

    async fn read_word(&mut self, address: u8) -> Result<u16, HalError> {
        let mut buffer = [0u8; 2];
        self.read_into(address, &mut buffer).await?;
        Ok(u16::from_le_bytes(buffer))
    }

    async fn read_word_register(&mut self, address: u8, register: u8) -> Result<u16, HalError> {
        let mut buffer = [0u8; 2];
        self.read_register_into(address, register, &mut buffer).await?;
        Ok(u16::from_le_bytes(buffer))
    }

    async fn write(&mut self, address: u8, data: &[u8]) -> Result<(), HalError> {
        self.send(address, data).await
    }

    async fn write_register(
        &mut self,
        address: u8,
        register: u8,
        data: &[u8],
    ) -> Result<(), HalError> {
        let mut frame = Vec::with_capacity(data.len().saturating_add(1));
        frame.push(register);
        frame.extend_from_slice(data);
        self.send(address, &frame).await
    }

    async fn write_byte(&mut self, address: u8, byte: u8) -> Result<(), HalError> {
        self.send(address, &[byte]).await
    }

    async fn write_byte_register(
        &mut self,
        address: u8,
        register: u8,
        byte: u8,
    ) -> Result<(), HalError> {
        self.send(address, &[register, byte]).await
    }

    async fn write_word(&mut self, address: u8, word: u16) -> Result<(), HalError> {
        self.send(address, &word.to_le_bytes()).await
    }

    async fn write_word_register(
        &mut self,
        address: u8,
        register: u8,
        word: u16,
    ) -> Result<(), HalError> {
        let [lo, hi] = word.to_le_bytes();
        self.send(address, &[register, lo, hi]).await
    }
}

impl<B: I2cBus> Drop for I2c<B> {
    fn drop(&mut self) {
        if self.alive() {
            let _ = self.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_space_is_seven_bit() {
        assert!(check_address(0x00).is_ok());
        assert!(check_address(0x7F).is_ok());
        assert_eq!(check_address(0x80), Err(HalError::InvalidAddress(0x80)));
    }
}
