use std::sync::Arc;

use epochal_protocol::packets::{ClientBoundLoginDisconnect, ClientBoundStatusResponse};
use epochal_protocol::types::{ComponentShapes, TextComponent};
use epochal_protocol::{
    CodecLimits, ConnectionSettings, PacketRegistry, ProtocolVersion, RejectionFrames,
};
use serde::Deserialize;
use tracing::{debug, info};

use super::{
    compression::CompressionConfig, limits::LimitsConfig, logging::LoggingConfig,
    status::StatusConfig,
};
use crate::error::ConfigError;

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct EpochalConfig {
    pub limits: Option<LimitsConfig>,

    pub compression: Option<CompressionConfig>,

    /// Protocol numbers to accept; every known version when absent.
    pub versions: Option<Vec<i32>>,

    #[serde(default)]
    pub status: StatusConfig,

    /// Data-component payload shapes by component type id.
    #[serde(default)]
    pub components: ComponentShapes,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EpochalConfig {
    pub fn merge(&mut self, other: EpochalConfig) {
        if let Some(limits) = other.limits {
            self.limits = Some(limits);
        }

        if let Some(compression) = other.compression {
            self.compression = Some(compression);
        }

        if let Some(versions) = other.versions {
            self.versions = Some(versions);
        }

        if !other.components.0.is_empty() {
            self.components.0.extend(other.components.0);
        }

        self.status = other.status;
        self.logging = other.logging;
    }

    /// Versions to accept, oldest first.
    pub fn supported_versions(&self) -> Result<Vec<ProtocolVersion>, ConfigError> {
        let Some(numbers) = &self.versions else {
            return Ok(ProtocolVersion::SUPPORTED.to_vec());
        };
        if numbers.is_empty() {
            return Err(ConfigError::invalid("versions", "must not be empty"));
        }

        let mut versions = numbers
            .iter()
            .map(|&number| {
                let version = ProtocolVersion::new(number);
                if version.is_known() {
                    Ok(version)
                } else {
                    Err(ConfigError::UnknownVersion(number))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        versions.sort();
        versions.dedup();
        Ok(versions)
    }

    pub fn codec_limits(&self) -> Result<CodecLimits, ConfigError> {
        self.limits.unwrap_or_default().to_codec_limits()
    }

    pub fn build_registry(&self) -> Result<PacketRegistry, ConfigError> {
        let versions = self.supported_versions()?;
        let registry = PacketRegistry::builtin_for(&versions)?;
        if let (Some(oldest), Some(latest)) = (versions.first(), versions.last()) {
            info!(%oldest, %latest, count = versions.len(), "Protocol versions enabled");
        }
        Ok(registry)
    }

    /// Everything connections share, with the rejection frames encoded up front.
    pub fn connection_settings(
        &self,
        registry: Arc<PacketRegistry>,
    ) -> Result<ConnectionSettings, ConfigError> {
        let limits = self.codec_limits()?;
        let compression = self.compression.unwrap_or_default().to_settings()?;

        let advertised = registry
            .versions()
            .last()
            .copied()
            .unwrap_or(ProtocolVersion::LATEST);
        let status = ClientBoundStatusResponse::new(
            &self.status.version_name,
            advertised,
            self.status.max_players,
            0,
            &TextComponent::plain(self.status.description.as_str()),
        );
        let disconnect = ClientBoundLoginDisconnect {
            reason: TextComponent::plain(self.status.rejection_message.as_str()),
        };
        let rejection = RejectionFrames::build(&status, &disconnect, &limits)?;
        debug!(?limits, ?compression, components = self.components.0.len(), "Connection settings ready");

        Ok(ConnectionSettings {
            registry,
            limits,
            components: Arc::new(self.components.clone()),
            compression,
            rejection,
        })
    }
}
