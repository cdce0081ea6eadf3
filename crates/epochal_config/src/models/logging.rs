use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub debug: bool,

    #[serde(default = "default_true")]
    pub use_color: bool,

    #[serde(default)]
    pub show_target: bool,

    #[serde(default = "default_true")]
    pub show_timestamp: bool,

    /// `EnvFilter` directives; `RUST_LOG` still wins when set.
    #[serde(default)]
    pub filter: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            debug: false,
            use_color: true,
            show_target: false,
            show_timestamp: true,
            filter: None,
        }
    }
}

impl LoggingConfig {
    /// Directives used when neither `RUST_LOG` nor `filter` is set.
    pub fn default_directives(&self) -> String {
        let level = if self.debug { "debug" } else { "info" };
        format!("epochal_protocol={level},epochal_config={level}")
    }
}
