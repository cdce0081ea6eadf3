use serde::Deserialize;

/// Content of the responses sent to clients whose version is not supported.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatusConfig {
    pub version_name: String,
    pub description: String,
    pub max_players: i32,
    /// Login disconnect reason.
    pub rejection_message: String,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            version_name: "Epochal".to_string(),
            description: "An Epochal server".to_string(),
            max_players: 20,
            rejection_message: "Your client version is not supported".to_string(),
        }
    }
}
