//! Application configuration.

use crate::agent::{CalibrationConfig, NetworkConfig};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Value network dimensions and output band
    pub network: NetworkConfig,
    /// Step calibration settings
    pub calibration: CalibrationConfig,
    /// Seed for the uniform engine; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            calibration: CalibrationConfig::default(),
            seed: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file(&self, path: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(seed) = std::env::var("VALUE_NET_SEED") {
            if let Ok(seed) = seed.parse() {
                config.seed = Some(seed);
            }
        }
        if let Ok(size) = std::env::var("VALUE_NET_INPUT_SIZE") {
            if let Ok(size) = size.parse() {
                config.network.input_size = size;
            }
        }
        if let Ok(units) = std::env::var("VALUE_NET_HIDDEN_UNITS") {
            if let Ok(units) = units.parse() {
                config.network.hidden_units = units;
            }
        }

        config
    }
}
