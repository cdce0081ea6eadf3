use once_cell::sync::OnceCell;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::ConfigError;
use crate::models::logging::LoggingConfig;

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Filter from `RUST_LOG`, then `config.filter`, then the default directives.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directives = config
        .filter
        .clone()
        .unwrap_or_else(|| config.default_directives());
    EnvFilter::try_new(&directives).map_err(|e| ConfigError::invalid("logging.filter", e.to_string()))
}

/// Installs the global fmt subscriber. Later calls are no-ops.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    INSTALLED
        .get_or_try_init(|| {
            let filter = env_filter(config)?;
            let fmt_layer = fmt::layer()
                .compact()
                .with_level(true)
                .with_ansi(config.use_color)
                .with_target(config.show_target);

            let registry = tracing_subscriber::registry().with(filter);
            let installed = if config.show_timestamp {
                registry.with(fmt_layer).try_init()
            } else {
                registry.with(fmt_layer.without_time()).try_init()
            };
            installed.map_err(|e| ConfigError::Logging(e.to_string()))
        })
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_follow_debug_flag() {
        let mut config = LoggingConfig::default();
        assert_eq!(
            config.default_directives(),
            "epochal_protocol=info,epochal_config=info"
        );
        config.debug = true;
        assert!(config.default_directives().contains("=debug"));
    }

    #[test]
    fn test_invalid_filter_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig {
            filter: Some("epochal=[".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            env_filter(&config),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
