use epochal_protocol::CompressionSettings;
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct CompressionConfig {
    /// Bodies at least this large are compressed. Negative disables compression.
    #[serde(default = "default_threshold")]
    pub threshold: i32,

    /// zlib level, 0 to 9.
    #[serde(default = "default_level")]
    pub level: u32,
}

fn default_threshold() -> i32 {
    256
}

fn default_level() -> u32 {
    6
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            level: default_level(),
        }
    }
}

impl CompressionConfig {
    pub fn to_settings(&self) -> Result<Option<CompressionSettings>, ConfigError> {
        if self.level > 9 {
            return Err(ConfigError::invalid(
                "compression.level",
                format!("{} is not between 0 and 9", self.level),
            ));
        }
        Ok(usize::try_from(self.threshold)
            .ok()
            .map(|threshold| CompressionSettings {
                threshold,
                level: self.level,
            }))
    }
}
