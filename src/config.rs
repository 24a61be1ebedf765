//! Configuration for spot augmentation.
//!
//! ## Column layout
//!
//! The default `SpotSchema` matches the wsprnet spot export. A different
//! export can be described in a TOML file:
//!
//! ```toml
//! jobs = 4
//! on_invalid = "sentinel"
//!
//! [schema]
//! column_count = 16
//! frequency_column = 6
//! rx_locator_column = 4
//! tx_locator_column = 8
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::constants::{FREQUENCY_COLUMN, RX_LOCATOR_COLUMN, SPOT_COLUMN_COUNT, TX_LOCATOR_COLUMN};
use crate::error::{PathError, Result};

/// What to do with a row whose locator or frequency cannot be decoded
///
/// Rows with the wrong number of columns are always skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InvalidRowPolicy {
    /// Log the row and leave it out of the output
    #[default]
    Skip,
    /// Emit the row with placeholder values in every derived field
    Sentinel,
}

/// Column positions of the fields read from each spot record
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpotSchema {
    /// Number of columns a record must have to be accepted
    pub column_count: usize,
    /// Column holding the frequency in MHz
    pub frequency_column: usize,
    /// Column holding the receiver locator
    pub rx_locator_column: usize,
    /// Column holding the transmitter locator
    pub tx_locator_column: usize,
}

impl Default for SpotSchema {
    fn default() -> Self {
        Self {
            column_count: SPOT_COLUMN_COUNT,
            frequency_column: FREQUENCY_COLUMN,
            rx_locator_column: RX_LOCATOR_COLUMN,
            tx_locator_column: TX_LOCATOR_COLUMN,
        }
    }
}

impl SpotSchema {
    /// Check that every referenced column exists.
    pub fn validate(&self) -> Result<()> {
        for (name, column) in [
            ("frequency_column", self.frequency_column),
            ("rx_locator_column", self.rx_locator_column),
            ("tx_locator_column", self.tx_locator_column),
        ] {
            if column >= self.column_count {
                return Err(PathError::Config(format!(
                    "{} = {} is outside a {}-column record",
                    name, column, self.column_count
                )));
            }
        }
        Ok(())
    }
}

/// Spot augmentation configuration
///
/// # Example
/// ```
/// use wsprpath::config::{AugmentConfig, InvalidRowPolicy};
///
/// let mut config = AugmentConfig::default();
/// config.jobs = 4;
/// config.on_invalid = InvalidRowPolicy::Sentinel;
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AugmentConfig {
    /// Input record layout
    pub schema: SpotSchema,
    /// Worker threads for row processing (1 = process on the calling thread)
    pub jobs: usize,
    /// Recovery for rows with undecodable locators or frequencies
    pub on_invalid: InvalidRowPolicy,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            schema: SpotSchema::default(),
            jobs: 1,
            on_invalid: InvalidRowPolicy::Skip,
        }
    }
}

impl AugmentConfig {
    /// Parse a configuration from TOML text. Missing keys keep their
    /// defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            return Err(PathError::Config("jobs must be at least 1".to_string()));
        }
        self.schema.validate()
    }
}
