//! Pin identifiers and alias resolution.
//!
//! Every factory turns a [`PinAlias`] into a canonical [`PinId`] before it
//! touches the registry. Resolution is a pure table lookup: numeric ids pass
//! through unchanged and names are matched exactly against the platform's
//! alias table.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::HalError;

/// Most pins a single peripheral may occupy (e.g. UART TX/RX plus flow control).
pub const MAX_PINS_PER_PERIPHERAL: usize = 4;

// ── PinId ────────────────────────────────────────────────────────────────────

/// Canonical numeric pin identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct PinId(u32);

impl PinId {
    /// Wrap a raw pin number.
    #[must_use]
    pub const fn new(pin: u32) -> Self {
        Self(pin)
    }

    /// Return the raw pin number.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for PinId {
    fn from(pin: u32) -> Self {
        Self(pin)
    }
}

impl core::fmt::Display for PinId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── PinAlias ─────────────────────────────────────────────────────────────────

/// A pin as callers name it: a number or a symbolic alias such as `"GPIO17"`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum PinAlias {
    /// Already-canonical pin number
    Id(PinId),
    /// Symbolic name looked up in the alias table
    Name(String),
}

impl From<PinId> for PinAlias {
    fn from(pin: PinId) -> Self {
        Self::Id(pin)
    }
}

impl From<u32> for PinAlias {
    fn from(pin: u32) -> Self {
        Self::Id(PinId(pin))
    }
}

impl From<&str> for PinAlias {
    fn from(name: &str) -> Self {
        Self::Name(String::from(name))
    }
}

impl From<String> for PinAlias {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

// ── PinSet ───────────────────────────────────────────────────────────────────

/// Non-empty, sorted, duplicate-free set of pins owned by one peripheral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinSet(heapless::Vec<PinId, MAX_PINS_PER_PERIPHERAL>);

impl PinSet {
    /// Set holding exactly one pin.
    #[must_use]
    pub fn single(pin: PinId) -> Self {
        let mut pins = heapless::Vec::new();
        // Capacity is at least one.
        let _ = pins.push(pin);
        Self(pins)
    }

    /// Set holding two pins (collapses to one if they are equal).
    #[must_use]
    pub fn pair(a: PinId, b: PinId) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let mut set = Self::single(lo);
        if hi != lo {
            let _ = set.0.push(hi);
        }
        set
    }

    /// Build a set from arbitrary pins, sorting and removing duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`HalError::InvalidPinSet`] if no pins are given or more than
    /// [`MAX_PINS_PER_PERIPHERAL`] distinct pins remain.
    pub fn try_from_slice(pins: &[PinId]) -> Result<Self, HalError> {
        let mut sorted: Vec<PinId> = pins.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.is_empty() {
            return Err(HalError::InvalidPinSet);
        }
        let inner = heapless::Vec::from_slice(&sorted).map_err(|_| HalError::InvalidPinSet)?;
        Ok(Self(inner))
    }

    /// Pins in ascending order.
    #[must_use]
    pub fn as_slice(&self) -> &[PinId] {
        &self.0
    }

    /// Iterate pins in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = PinId> + '_ {
        self.0.iter().copied()
    }

    /// `true` if `pin` is part of the set.
    #[must_use]
    pub fn contains(&self, pin: PinId) -> bool {
        self.0.binary_search(&pin).is_ok()
    }

    /// Number of pins in the set (always at least one).
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowest pin of the set.
    #[must_use]
    pub fn first(&self) -> PinId {
        // Non-empty by construction.
        self.0.first().copied().unwrap_or(PinId(0))
    }
}

impl From<PinId> for PinSet {
    fn from(pin: PinId) -> Self {
        Self::single(pin)
    }
}

// ── Pin capabilities ─────────────────────────────────────────────────────────

/// Hardware function a pin can be muxed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PinFunction {
    /// Digital input/output
    Gpio,
    /// Hardware PWM
    Pwm,
    /// I2C SDA/SCL
    I2c,
    /// SPI MOSI/MISO/SCLK/CE
    Spi,
    /// UART TX/RX
    Uart,
}

impl core::fmt::Display for PinFunction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Gpio => "gpio",
            Self::Pwm => "pwm",
            Self::I2c => "i2c",
            Self::Spi => "spi",
            Self::Uart => "uart",
        };
        f.write_str(name)
    }
}

/// What the board knows about one pin: its names and supported functions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinInfo {
    /// Symbolic names accepted by the resolver (e.g. `"GPIO18"`, `"P1-12"`)
    pub aliases: Vec<String>,
    /// Functions this pin can be muxed to
    pub functions: Vec<PinFunction>,
}

impl PinInfo {
    /// Create pin info from aliases and functions.
    pub fn new<I, S>(aliases: I, functions: &[PinFunction]) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            aliases: aliases.into_iter().map(Into::into).collect(),
            functions: functions.to_vec(),
        }
    }

    /// `true` if the pin can serve `function`.
    #[must_use]
    pub fn supports(&self, function: PinFunction) -> bool {
        self.functions.contains(&function)
    }
}

// ── Resolution ───────────────────────────────────────────────────────────────

/// Platform-provided alias table.
pub trait PinResolver {
    /// Canonical id for `name`, or `None` if the name is unknown.
    fn lookup_alias(&self, name: &str) -> Option<PinId>;
}

/// Resolve `alias` to a canonical [`PinId`].
///
/// Numeric ids are returned unchanged without any topology check.
///
/// # Errors
///
/// Returns [`HalError::UnknownAlias`] if a symbolic name has no mapping.
pub fn resolve<R: PinResolver + ?Sized>(resolver: &R, alias: &PinAlias) -> Result<PinId, HalError> {
    match alias {
        PinAlias::Id(pin) => Ok(*pin),
        PinAlias::Name(name) => resolver
            .lookup_alias(name)
            .ok_or_else(|| HalError::UnknownAlias(name.clone())),
    }
}

/// Board pin table keyed by canonical id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinMap {
    pins: BTreeMap<PinId, PinInfo>,
}

impl PinMap {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the entry for `pin`.
    pub fn insert(&mut self, pin: PinId, info: PinInfo) {
        self.pins.insert(pin, info);
    }

    /// Entry for `pin`, if the board lists it.
    #[must_use]
    pub fn info(&self, pin: PinId) -> Option<&PinInfo> {
        self.pins.get(&pin)
    }

    /// `true` if `pin` can serve `function`. Pins missing from the table
    /// are not restricted.
    #[must_use]
    pub fn supports(&self, pin: PinId, function: PinFunction) -> bool {
        self.pins.get(&pin).map_or(true, |info| info.supports(function))
    }

    /// All entries in ascending pin order.
    pub fn iter(&self) -> impl Iterator<Item = (PinId, &PinInfo)> + '_ {
        self.pins.iter().map(|(pin, info)| (*pin, info))
    }

    /// Number of listed pins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pins.len()
    }

    /// `true` if no pins are listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

impl PinResolver for PinMap {
    fn lookup_alias(&self, name: &str) -> Option<PinId> {
        self.pins
            .iter()
            .find(|(_, info)| info.aliases.iter().any(|alias| alias == name))
            .map(|(pin, _)| *pin)
    }
}
