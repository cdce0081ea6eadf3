use epochal_protocol::CodecLimits;
use epochal_protocol::codec::{MAX_PACKET_LENGTH, MAX_UNCOMPRESSED_LENGTH};
use epochal_protocol::types::MAX_STRING_LENGTH;
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_frame_length: usize,
    pub max_uncompressed_length: usize,
    pub max_string_length: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_frame_length: MAX_PACKET_LENGTH,
            max_uncompressed_length: MAX_UNCOMPRESSED_LENGTH,
            max_string_length: MAX_STRING_LENGTH,
        }
    }
}

impl LimitsConfig {
    pub fn to_codec_limits(&self) -> Result<CodecLimits, ConfigError> {
        if self.max_frame_length == 0 || self.max_frame_length > MAX_PACKET_LENGTH {
            return Err(ConfigError::invalid(
                "limits.max_frame_length",
                format!("must be between 1 and {MAX_PACKET_LENGTH}"),
            ));
        }
        if self.max_uncompressed_length == 0 {
            return Err(ConfigError::invalid(
                "limits.max_uncompressed_length",
                "must be positive",
            ));
        }
        if self.max_string_length == 0 || self.max_string_length > MAX_STRING_LENGTH {
            return Err(ConfigError::invalid(
                "limits.max_string_length",
                format!("must be between 1 and {MAX_STRING_LENGTH}"),
            ));
        }

        Ok(CodecLimits {
            max_frame_length: self.max_frame_length,
            max_uncompressed_length: self.max_uncompressed_length,
            max_string_length: self.max_string_length,
        })
    }
}
