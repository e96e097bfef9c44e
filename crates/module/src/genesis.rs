//! Genesis configuration for the auction module.
//!
//! This module defines the initial state and configuration of the auction
//! system: the collaborators' addresses, the first round's start time and fee
//! observation, and the settings snapshotted into every new round.

use candle_types::{Address, Settings};
use serde::{Deserialize, Serialize};

/// Genesis configuration for the auction module.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CandleGenesisConfig {
    /// May update settings for future rounds
    pub admin: Address,

    /// Receives swept auction proceeds
    pub beneficiary: Address,

    /// Address allowed to deliver randomness callbacks
    pub oracle: Address,

    /// Start of the first auction
    pub start_time: u64,

    /// Gas price used to size the first round's minimum bid
    pub initial_gas_price: u64,

    /// Auction settings
    #[serde(default)]
    pub settings: Settings,
}

impl Default for CandleGenesisConfig {
    fn default() -> Self {
        Self {
            admin: [1u8; 32],
            beneficiary: [2u8; 32],
            oracle: [3u8; 32],
            start_time: 0,
            initial_gas_price: 1,
            settings: Settings::default(),
        }
    }
}

impl CandleGenesisConfig {
    /// Create a genesis config with custom settings.
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    /// Parse a genesis config from JSON.
    pub fn from_json(data: &str) -> Result<Self, GenesisValidationError> {
        let config: Self = serde_json::from_str(data)
            .map_err(|e| GenesisValidationError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the genesis configuration.
    pub fn validate(&self) -> Result<(), GenesisValidationError> {
        for (name, address) in [
            ("admin", &self.admin),
            ("beneficiary", &self.beneficiary),
            ("oracle", &self.oracle),
        ] {
            if *address == [0u8; 32] {
                return Err(GenesisValidationError::MissingAddress(name.into()));
            }
        }

        self.settings
            .validate()
            .map_err(|e| GenesisValidationError::InvalidSettings(e.into()))?;

        Ok(())
    }
}

/// Errors that can occur during genesis validation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenesisValidationError {
    #[error("Missing address: {0}")]
    MissingAddress(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid genesis JSON: {0}")]
    Parse(String),
}
