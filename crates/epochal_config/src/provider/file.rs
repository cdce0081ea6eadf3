use std::fs;
use std::path::Path;

use tracing::{debug, instrument};

use crate::EpochalConfig;
use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Loads the configuration from a YAML file on disk.
pub struct FileProvider;

impl FileProvider {
    /// Reads `path` (or `config.yaml`) and merges it over the defaults.
    #[instrument(name = "file_provider: try_load_config")]
    pub fn try_load_config(path: Option<&str>) -> Result<EpochalConfig, ConfigError> {
        let path = Path::new(path.unwrap_or(DEFAULT_CONFIG_PATH));
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(bytes = content.len(), "Read configuration file");
        Self::load_str(&content)
    }

    /// Parses YAML text and merges it over the defaults.
    pub fn load_str(content: &str) -> Result<EpochalConfig, ConfigError> {
        let mut config = EpochalConfig::default();
        if content.trim().is_empty() {
            return Ok(config);
        }

        let parsed: EpochalConfig = serde_yaml::from_str(content)?;
        config.merge(parsed);

        config.supported_versions()?;
        config.codec_limits()?;
        config.compression.unwrap_or_default().to_settings()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epochal_protocol::types::ComponentShape;

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(FileProvider::load_str("  \n").unwrap(), EpochalConfig::default());
    }

    #[test]
    fn test_components_parse() {
        let config = FileProvider::load_str(
            "components:\n  0: empty\n  1: var_int\n  5:\n    list:\n      fixed: 2\n",
        )
        .unwrap();
        assert_eq!(config.components.0.get(&1), Some(&ComponentShape::VarInt));
        assert_eq!(
            config.components.0.get(&5),
            Some(&ComponentShape::List(Box::new(ComponentShape::Fixed(2))))
        );
    }

    #[test]
    fn test_unknown_version_rejected() {
        assert!(matches!(
            FileProvider::load_str("versions: [47, 48]\n"),
            Err(ConfigError::UnknownVersion(48))
        ));
    }

    #[test]
    fn test_bad_compression_level() {
        assert!(matches!(
            FileProvider::load_str("compression:\n  level: 12\n"),
            Err(ConfigError::InvalidValue {
                field: "compression.level",
                ..
            })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            FileProvider::try_load_config(Some("/nonexistent/epochal.yaml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
