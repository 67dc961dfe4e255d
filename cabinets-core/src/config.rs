//! Cabinet configuration.

use serde::{Deserialize, Serialize};

/// Options shared by every store mounted in a [`Cabinet`](crate::Cabinet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CabinetConfig {
    /// Joins source store names when a combined store is not given a name.
    pub combined_name_separator: String,

    /// Emit a warning when mounting a store takes over an action type
    /// already owned by another mounted store.
    pub warn_on_action_shadowing: bool,
}

impl CabinetConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for CabinetConfig {
    fn default() -> Self {
        Self {
            combined_name_separator: "-".to_string(),
            warn_on_action_shadowing: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CabinetConfig::default();
        assert_eq!(config.combined_name_separator, "-");
        assert!(config.warn_on_action_shadowing);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = CabinetConfig::from_json(r#"{"combined_name_separator": "+"}"#).unwrap();
        assert_eq!(config.combined_name_separator, "+");
        assert!(config.warn_on_action_shadowing);
    }
}
