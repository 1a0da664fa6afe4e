//! Global configuration types for Studium.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls
//! how the answering-service relay is reached.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the Studium backend.
///
/// Loaded from `~/.studium/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Base URL of the external answering service.
    #[serde(default = "default_relay_base_url")]
    pub relay_base_url: String,

    /// Bound on each relay call, in seconds.
    #[serde(default = "default_relay_timeout_secs")]
    pub relay_timeout_secs: u64,
}

fn default_relay_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_relay_timeout_secs() -> u64 {
    10
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            relay_base_url: default_relay_base_url(),
            relay_timeout_secs: default_relay_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_config_default_values() {
        let config = GlobalConfig::default();
        assert_eq!(config.relay_base_url, "http://localhost:8000");
        assert_eq!(config.relay_timeout_secs, 10);
    }

    #[test]
    fn test_global_config_deserialize_with_defaults() {
        let config: GlobalConfig = toml::from_str("").unwrap();
        assert_eq!(config.relay_base_url, "http://localhost:8000");
        assert_eq!(config.relay_timeout_secs, 10);
    }

    #[test]
    fn test_global_config_deserialize_with_values() {
        let toml_str = r#"
relay_base_url = "http://answers.internal:9000"
relay_timeout_secs = 30
"#;
        let config: GlobalConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.relay_base_url, "http://answers.internal:9000");
        assert_eq!(config.relay_timeout_secs, 30);
    }
}
