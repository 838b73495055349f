//! Board description files
//!
//! A board is described by its option defaults and its pin table:
//!
//! ```json
//! {
//!   "defaults": { "pwm_frequency": 1000, "serial_port": "/dev/ttyS0" },
//!   "pins": [
//!     { "id": 17, "aliases": ["GPIO17", "P1-11"], "functions": ["gpio"] },
//!     { "id": 18, "aliases": ["GPIO18"], "functions": ["gpio", "pwm"] }
//!   ]
//! }
//! ```
//!
//! Omitted defaults keep their [`PlatformDefaults`] values.

use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;

use crate::pin::{PinFunction, PinId, PinInfo, PinMap};
use crate::platform::PlatformDefaults;

/// Errors loading a board description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Malformed JSON or wrong field types
    Parse(String),
    /// Two entries share a pin id
    DuplicatePin(u32),
    /// Two pins share an alias
    DuplicateAlias(String),
    /// A default is out of range; the payload names the field
    InvalidDefault(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::DuplicatePin(pin) => write!(f, "pin {pin} listed twice"),
            Self::DuplicateAlias(alias) => write!(f, "alias \"{alias}\" names more than one pin"),
            Self::InvalidDefault(field) => write!(f, "invalid default for {field}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// One pin table entry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PinEntry {
    /// Canonical pin number
    pub id: u32,
    /// Names accepted by the resolver
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Supported functions
    #[serde(default)]
    pub functions: Vec<PinFunction>,
}

/// Board description.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BoardConfig {
    /// Defaults for unset driver options
    #[serde(default)]
    pub defaults: PlatformDefaults,
    /// Pin table
    #[serde(default)]
    pub pins: Vec<PinEntry>,
}

impl BoardConfig {
    /// Parse and validate a JSON board description.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed input, otherwise as
    /// [`BoardConfig::validate`].
    #[cfg(feature = "std")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        use alloc::string::ToString;

        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the defaults and the uniqueness of pin ids and aliases.
    ///
    /// # Errors
    ///
    /// The first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.defaults.pwm_frequency == 0 {
            return Err(ConfigError::InvalidDefault("pwm_frequency"));
        }
        if self.defaults.pwm_range == 0 {
            return Err(ConfigError::InvalidDefault("pwm_range"));
        }
        if self.defaults.baud_rate == 0 {
            return Err(ConfigError::InvalidDefault("baud_rate"));
        }

        let mut ids = BTreeSet::new();
        let mut aliases = BTreeSet::new();
        for entry in &self.pins {
            if !ids.insert(entry.id) {
                return Err(ConfigError::DuplicatePin(entry.id));
            }
            for alias in &entry.aliases {
                if !aliases.insert(alias.as_str()) {
                    return Err(ConfigError::DuplicateAlias(alias.clone()));
                }
            }
        }
        Ok(())
    }

    /// Build the resolver table.
    ///
    /// # Errors
    ///
    /// As [`BoardConfig::validate`].
    pub fn into_pin_map(self) -> Result<PinMap, ConfigError> {
        self.validate()?;
        let mut map = PinMap::new();
        for entry in self.pins {
            map.insert(
                PinId::new(entry.id),
                PinInfo {
                    aliases: entry.aliases,
                    functions: entry.functions,
                },
            );
        }
        Ok(map)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::pin::PinResolver;
    use crate::serial::Parity;

    const BOARD: &str = r#"{
        "defaults": { "pwm_frequency": 1000, "parity": "even", "data_bits": 7 },
        "pins": [
            { "id": 17, "aliases": ["GPIO17", "P1-11"], "functions": ["gpio"] },
            { "id": 18, "aliases": ["GPIO18"], "functions": ["gpio", "pwm"] }
        ]
    }"#;

    #[test]
    fn loads_defaults_and_pins() {
        let config = BoardConfig::from_json(BOARD).unwrap();
        assert_eq!(config.defaults.pwm_frequency, 1000);
        assert_eq!(config.defaults.pwm_range, 1024);
        assert_eq!(config.defaults.parity, Parity::Even);
        assert_eq!(config.defaults.data_bits.bits(), 7);

        let map = config.into_pin_map().unwrap();
        assert_eq!(map.lookup_alias("P1-11"), Some(PinId::new(17)));
        assert!(map.supports(PinId::new(18), PinFunction::Pwm));
        assert!(!map.supports(PinId::new(17), PinFunction::Pwm));
    }

    #[test]
    fn rejects_bad_framing_defaults() {
        let err = BoardConfig::from_json(r#"{ "defaults": { "data_bits": 9 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_duplicate_aliases() {
        let json = r#"{ "pins": [
            { "id": 1, "aliases": ["A"] },
            { "id": 2, "aliases": ["A"] }
        ] }"#;
        assert_eq!(
            BoardConfig::from_json(json),
            Err(ConfigError::DuplicateAlias("A".into()))
        );
    }

    #[test]
    fn rejects_zero_defaults() {
        let json = r#"{ "defaults": { "baud_rate": 0 } }"#;
        assert_eq!(
            BoardConfig::from_json(json),
            Err(ConfigError::InvalidDefault("baud_rate"))
        );
    }
}
