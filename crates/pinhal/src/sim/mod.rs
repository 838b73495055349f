//! In-memory platform for host tests
//!
//! [`SimPlatform`] models a Raspberry Pi style 40-pin header: BCM numbered
//! GPIO 2..=27 with `GPIOn` and `P1-n` aliases, PWM on 12/13/18/19 (a PWM
//! on 13 also drives its complementary output on 19), I2C on 2/3, the
//! primary UART on 14/15 and the activity LED on 47. Every backend handle
//! shares one state cell, so tests can drive inputs and inspect outputs
//! through the platform while drivers hold the handles.

#![cfg(any(test, feature = "std"))]

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::error::{HalError, TransportError};
use crate::gpio::{PullResistor, Value};
use crate::pin::{PinFunction, PinId, PinInfo, PinMap, PinResolver, PinSet};
use crate::platform::{
    GpioLine, GpioMode, I2cBus, LedLine, Platform, PlatformDefaults, PwmChannel, SerialTransport,
};
use crate::serial::SerialConfig;

/// BCM number and physical header position.
const HEADER: [(u32, u32); 26] = [
    (2, 3),
    (3, 5),
    (4, 7),
    (17, 11),
    (27, 13),
    (22, 15),
    (10, 19),
    (9, 21),
    (11, 23),
    (5, 29),
    (6, 31),
    (13, 33),
    (19, 35),
    (26, 37),
    (14, 8),
    (15, 10),
    (18, 12),
    (23, 16),
    (24, 18),
    (25, 22),
    (8, 24),
    (7, 26),
    (12, 32),
    (16, 36),
    (20, 38),
    (21, 40),
];

const PWM_PINS: [u32; 4] = [12, 13, 18, 19];
/// Primary pin and complementary output of the differential PWM channel.
const PWM_PAIR: (u32, u32) = (13, 19);
const I2C_PINS: (u32, u32) = (2, 3);
const UART_PINS: (u32, u32) = (14, 15);
const LED_PIN: u32 = 47;
const UART_PORTS: [&str; 2] = ["/dev/ttyAMA0", "/dev/ttyS0"];

/// Size of each simulated I2C device's register file.
const REGISTER_FILE: usize = 256;

struct I2cDevice {
    registers: Vec<u8>,
    pointer: u8,
}

impl I2cDevice {
    fn new() -> Self {
        Self {
            registers: alloc::vec![0; REGISTER_FILE],
            pointer: 0,
        }
    }

    fn write(&mut self, data: &[u8]) {
        let Some((&register, payload)) = data.split_first() else {
            return;
        };
        self.pointer = register;
        for &byte in payload {
            if let Some(slot) = self.registers.get_mut(usize::from(self.pointer)) {
                *slot = byte;
            }
            self.pointer = self.pointer.wrapping_add(1);
        }
    }

    fn read(&mut self, buffer: &mut [u8]) {
        for byte in buffer.iter_mut() {
            *byte = self
                .registers
                .get(usize::from(self.pointer))
                .copied()
                .unwrap_or(0);
            self.pointer = self.pointer.wrapping_add(1);
        }
    }
}

#[derive(Default)]
struct SimState {
    init_calls: u32,
    fail_init: bool,
    levels: BTreeMap<PinId, Value>,
    modes: BTreeMap<PinId, GpioMode>,
    pwm_ticks: BTreeMap<PinId, u32>,
    i2c_devices: BTreeMap<u8, I2cDevice>,
    i2c_fault: Option<TransportError>,
    i2c_open: bool,
    serial_open: BTreeMap<String, bool>,
    serial_output: BTreeMap<String, Vec<u8>>,
    serial_aborts: u32,
    led_present: bool,
    led: Value,
}

/// Simulated board.
///
/// Cloning shares the underlying state.
#[derive(Clone)]
pub struct SimPlatform {
    state: Rc<RefCell<SimState>>,
    pin_map: Rc<PinMap>,
    defaults: PlatformDefaults,
}

impl SimPlatform {
    /// Raspberry Pi style board with an activity LED.
    #[must_use]
    pub fn new() -> Self {
        Self::with_pin_map(raspberry_pi_header(), PlatformDefaults::default())
    }

    /// Board with a custom pin table and defaults.
    #[must_use]
    pub fn with_pin_map(pin_map: PinMap, defaults: PlatformDefaults) -> Self {
        let state = SimState {
            led_present: true,
            ..SimState::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
            pin_map: Rc::new(pin_map),
            defaults,
        }
    }

    /// Make the next `init` calls fail with an I/O error.
    pub fn fail_init(&self, fail: bool) {
        self.state.borrow_mut().fail_init = fail;
    }

    /// Number of times `init` reached the platform.
    #[must_use]
    pub fn init_calls(&self) -> u32 {
        self.state.borrow().init_calls
    }

    /// Physical level of `pin`.
    #[must_use]
    pub fn level(&self, pin: u32) -> Value {
        let state = self.state.borrow();
        let pin = PinId::new(pin);
        match state.levels.get(&pin) {
            Some(level) => *level,
            None => match state.modes.get(&pin) {
                Some(GpioMode::Input(PullResistor::Up)) => Value::High,
                _ => Value::Low,
            },
        }
    }

    /// Drive `pin` externally, as a button or sensor would.
    pub fn set_level(&self, pin: u32, value: Value) {
        self.state.borrow_mut().levels.insert(PinId::new(pin), value);
    }

    /// Configured mode of `pin`, if a backend was created for it.
    #[must_use]
    pub fn mode(&self, pin: u32) -> Option<GpioMode> {
        self.state.borrow().modes.get(&PinId::new(pin)).copied()
    }

    /// Current PWM high time of `pin` in ticks.
    #[must_use]
    pub fn pwm_ticks(&self, pin: u32) -> Option<u32> {
        self.state.borrow().pwm_ticks.get(&PinId::new(pin)).copied()
    }

    /// Attach an I2C device with a zeroed register file at `address`.
    pub fn add_i2c_device(&self, address: u8) {
        self.state
            .borrow_mut()
            .i2c_devices
            .insert(address, I2cDevice::new());
    }

    /// Register contents of the device at `address`.
    #[must_use]
    pub fn i2c_register(&self, address: u8, register: u8) -> Option<u8> {
        self.state
            .borrow()
            .i2c_devices
            .get(&address)
            .and_then(|device| device.registers.get(usize::from(register)).copied())
    }

    /// Preload a register of the device at `address`.
    pub fn set_i2c_register(&self, address: u8, register: u8, value: u8) {
        if let Some(device) = self.state.borrow_mut().i2c_devices.get_mut(&address) {
            if let Some(slot) = device.registers.get_mut(usize::from(register)) {
                *slot = value;
            }
        }
    }

    /// Fail every I2C transfer with `fault` until cleared with `None`.
    pub fn inject_i2c_fault(&self, fault: Option<TransportError>) {
        self.state.borrow_mut().i2c_fault = fault;
    }

    /// `true` while an I2C backend is open.
    #[must_use]
    pub fn i2c_open(&self) -> bool {
        self.state.borrow().i2c_open
    }

    /// Bytes written to serial `port` so far.
    #[must_use]
    pub fn serial_output(&self, port: &str) -> Vec<u8> {
        self.state
            .borrow()
            .serial_output
            .get(port)
            .cloned()
            .unwrap_or_default()
    }

    /// `true` while serial `port` is open.
    #[must_use]
    pub fn serial_is_open(&self, port: &str) -> bool {
        self.state
            .borrow()
            .serial_open
            .get(port)
            .copied()
            .unwrap_or(false)
    }

    /// Number of serial transports torn down with `abort`.
    #[must_use]
    pub fn serial_aborts(&self) -> u32 {
        self.state.borrow().serial_aborts
    }

    /// Fit or remove the activity LED.
    pub fn set_led_present(&self, present: bool) {
        self.state.borrow_mut().led_present = present;
    }

    /// Activity LED state.
    #[must_use]
    pub fn led(&self) -> Value {
        self.state.borrow().led
    }
}

impl Default for SimPlatform {
    fn default() -> Self {
        Self::new()
    }
}

/// Pin table of the simulated 40-pin header.
#[must_use]
pub fn raspberry_pi_header() -> PinMap {
    let mut map = PinMap::new();
    for (bcm, physical) in HEADER {
        let mut functions = alloc::vec![PinFunction::Gpio];
        if PWM_PINS.contains(&bcm) {
            functions.push(PinFunction::Pwm);
        }
        if bcm == I2C_PINS.0 || bcm == I2C_PINS.1 {
            functions.push(PinFunction::I2c);
        }
        if bcm == UART_PINS.0 || bcm == UART_PINS.1 {
            functions.push(PinFunction::Uart);
        }
        if (7..=11).contains(&bcm) {
            functions.push(PinFunction::Spi);
        }
        map.insert(
            PinId::new(bcm),
            PinInfo::new([format!("GPIO{bcm}"), format!("P1-{physical}")], &functions),
        );
    }
    map.insert(
        PinId::new(LED_PIN),
        PinInfo::new(["LED0", "ACT"], &[PinFunction::Gpio]),
    );
    map
}

impl PinResolver for SimPlatform {
    fn lookup_alias(&self, name: &str) -> Option<PinId> {
        self.pin_map.lookup_alias(name)
    }
}

impl Platform for SimPlatform {
    type Gpio = SimGpio;
    type Pwm = SimPwm;
    type I2c = SimI2c;
    type Led = SimLed;
    type Serial = SimSerial;

    async fn init(&self) -> Result<(), HalError> {
        embassy_futures::yield_now().await;
        let mut state = self.state.borrow_mut();
        state.init_calls = state.init_calls.saturating_add(1);
        if state.fail_init {
            return Err(HalError::Transport(TransportError::Io));
        }
        Ok(())
    }

    fn defaults(&self) -> PlatformDefaults {
        self.defaults.clone()
    }

    fn pin_map(&self) -> Option<&PinMap> {
        Some(&*self.pin_map)
    }

    fn gpio(&self, pin: PinId, mode: GpioMode) -> Result<SimGpio, TransportError> {
        self.state.borrow_mut().modes.insert(pin, mode);
        Ok(SimGpio {
            pin,
            mode,
            state: Rc::clone(&self.state),
        })
    }

    fn pwm_pins(&self, pin: PinId) -> Option<PinSet> {
        self.pin_map
            .info(pin)
            .filter(|info| info.supports(PinFunction::Pwm))
            .map(|_| {
                if pin.get() == PWM_PAIR.0 {
                    PinSet::pair(pin, PinId::new(PWM_PAIR.1))
                } else {
                    PinSet::single(pin)
                }
            })
    }

    fn pwm(&self, pin: PinId, _frequency: u32, _range: u32) -> Result<SimPwm, TransportError> {
        self.state.borrow_mut().pwm_ticks.insert(pin, 0);
        Ok(SimPwm {
            pin,
            state: Rc::clone(&self.state),
        })
    }

    fn i2c_pins(&self) -> PinSet {
        PinSet::pair(PinId::new(I2C_PINS.0), PinId::new(I2C_PINS.1))
    }

    fn i2c(&self) -> Result<SimI2c, TransportError> {
        self.state.borrow_mut().i2c_open = true;
        Ok(SimI2c {
            state: Rc::clone(&self.state),
        })
    }

    fn led_pins(&self) -> PinSet {
        PinSet::single(PinId::new(LED_PIN))
    }

    fn led(&self) -> Result<Option<SimLed>, TransportError> {
        if !self.state.borrow().led_present {
            return Ok(None);
        }
        Ok(Some(SimLed {
            state: Rc::clone(&self.state),
        }))
    }

    fn serial_pins(&self, port: &str) -> Option<PinSet> {
        UART_PORTS
            .iter()
            .any(|known| *known == port)
            .then(|| PinSet::pair(PinId::new(UART_PINS.0), PinId::new(UART_PINS.1)))
    }

    fn serial(&self, config: &SerialConfig) -> Result<SimSerial, TransportError> {
        Ok(SimSerial {
            port: config.port.clone(),
            open: false,
            state: Rc::clone(&self.state),
        })
    }
}

/// Simulated GPIO line.
pub struct SimGpio {
    pin: PinId,
    mode: GpioMode,
    state: Rc<RefCell<SimState>>,
}

impl GpioLine for SimGpio {
    fn read(&mut self) -> Value {
        let state = self.state.borrow();
        match state.levels.get(&self.pin) {
            Some(level) => *level,
            None if self.mode == GpioMode::Input(PullResistor::Up) => Value::High,
            None => Value::Low,
        }
    }

    fn write(&mut self, value: Value) {
        if self.mode == GpioMode::Output {
            self.state.borrow_mut().levels.insert(self.pin, value);
        }
    }
}

/// Simulated PWM channel.
pub struct SimPwm {
    pin: PinId,
    state: Rc<RefCell<SimState>>,
}

impl PwmChannel for SimPwm {
    fn set_ticks(&mut self, ticks: u32) {
        self.state.borrow_mut().pwm_ticks.insert(self.pin, ticks);
    }
}

/// Simulated I2C bus with per-address register files.
pub struct SimI2c {
    state: Rc<RefCell<SimState>>,
}

impl SimI2c {
    fn transfer(
        &self,
        address: u8,
        f: impl FnOnce(&mut I2cDevice),
    ) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        if !state.i2c_open {
            return Err(TransportError::Closed);
        }
        if let Some(fault) = state.i2c_fault {
            return Err(fault);
        }
        let device = state
            .i2c_devices
            .get_mut(&address)
            .ok_or(TransportError::Nack)?;
        f(device);
        Ok(())
    }
}

impl I2cBus for SimI2c {
    async fn write(&mut self, address: u8, data: &[u8]) -> Result<(), TransportError> {
        embassy_futures::yield_now().await;
        self.transfer(address, |device| device.write(data))
    }

    async fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), TransportError> {
        embassy_futures::yield_now().await;
        self.transfer(address, |device| device.read(buffer))
    }

    async fn write_read(
        &mut self,
        address: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), TransportError> {
        embassy_futures::yield_now().await;
        self.transfer(address, |device| {
            device.write(write);
            device.read(read);
        })
    }

    fn close(&mut self) {
        self.state.borrow_mut().i2c_open = false;
    }
}

/// Simulated activity LED.
pub struct SimLed {
    state: Rc<RefCell<SimState>>,
}

impl LedLine for SimLed {
    fn read(&self) -> Value {
        self.state.borrow().led
    }

    fn write(&mut self, value: Value) {
        self.state.borrow_mut().led = value;
    }
}

/// Simulated UART recording everything written while open.
pub struct SimSerial {
    port: String,
    open: bool,
    state: Rc<RefCell<SimState>>,
}

impl SimSerial {
    fn set_open(&mut self, open: bool) {
        self.open = open;
        self.state
            .borrow_mut()
            .serial_open
            .insert(self.port.clone(), open);
    }
}

impl SerialTransport for SimSerial {
    async fn open(&mut self) -> Result<(), TransportError> {
        embassy_futures::yield_now().await;
        self.set_open(true);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        embassy_futures::yield_now().await;
        self.set_open(false);
        Ok(())
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        embassy_futures::yield_now().await;
        if !self.open {
            return Err(TransportError::Closed);
        }
        self.state
            .borrow_mut()
            .serial_output
            .entry(self.port.clone())
            .or_default()
            .extend_from_slice(data);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), TransportError> {
        embassy_futures::yield_now().await;
        if self.open {
            Ok(())
        } else {
            Err(TransportError::Closed)
        }
    }

    fn abort(&mut self) {
        self.set_open(false);
        let mut state = self.state.borrow_mut();
        state.serial_aborts = state.serial_aborts.saturating_add(1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn header_aliases_resolve() {
        let sim = SimPlatform::new();
        assert_eq!(sim.lookup_alias("GPIO17"), Some(PinId::new(17)));
        assert_eq!(sim.lookup_alias("P1-12"), Some(PinId::new(18)));
        assert_eq!(sim.lookup_alias("ACT"), Some(PinId::new(47)));
        assert_eq!(sim.lookup_alias("GPIO99"), None);
    }

    #[test]
    fn pwm_only_on_capable_pins() {
        let sim = SimPlatform::new();
        assert!(sim.pwm_pins(PinId::new(18)).is_some());
        assert!(sim.pwm_pins(PinId::new(17)).is_none());
        assert!(sim.pwm_pins(PinId::new(99)).is_none());
    }

    #[test]
    fn register_file_pointer_advances() {
        let mut device = I2cDevice::new();
        device.write(&[0x10, 0xAA, 0xBB]);
        device.write(&[0x10]);
        let mut buffer = [0u8; 2];
        device.read(&mut buffer);
        assert_eq!(buffer, [0xAA, 0xBB]);
    }
}
