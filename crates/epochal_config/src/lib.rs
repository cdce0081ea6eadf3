//! YAML configuration for Epochal and its conversion into protocol settings.

pub mod error;
pub mod logging;
pub mod models;
pub mod provider;

pub use error::ConfigError;
pub use logging::init_logging;
pub use models::compression::CompressionConfig;
pub use models::epochal::EpochalConfig;
pub use models::limits::LimitsConfig;
pub use models::logging::LoggingConfig;
pub use models::status::StatusConfig;
pub use provider::file::FileProvider;
