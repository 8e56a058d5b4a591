use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Active config values of a node, keyed by config key.
pub type ConfigValuesMap = HashMap<String, serde_json::Value>;

/// How each config key surfaces to the backend process.
pub type ConfigTranslationMap = HashMap<String, ConfigTranslation>;

/// Canonical node specifications keyed by spec id.
pub type NodeLibrary = HashMap<String, NodeSpec>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigTranslation {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cli_config_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// the value of this key is an external-facing port
    #[serde(default)]
    pub port: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionInput {
    #[serde(default)]
    pub default_config: ConfigValuesMap,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeExecution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_image_tag: Option<String>,
    #[serde(default)]
    pub input: ExecutionInput,
}

/// Declarative description of a node: what to run, its default config and
/// how config keys translate to the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub spec_id: String,
    #[serde(default)]
    pub version: String,
    pub display_name: String,
    #[serde(default)]
    pub execution: NodeExecution,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_translation: Option<ConfigTranslationMap>,
}

impl NodeSpec {
    pub fn from_json(s: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str::<NodeSpec>(s)?)
    }

    pub fn default_config(&self) -> &ConfigValuesMap {
        &self.execution.input.default_config
    }

    /// Config keys flagged as external-facing ports.
    pub fn port_keys(&self) -> Vec<&str> {
        self.config_translation
            .iter()
            .flat_map(|translation| translation.iter())
            .filter(|(_, t)| t.port)
            .map(|(key, _)| key.as_str())
            .collect()
    }
}

/// Order-independent comparison of the key sets of two translation maps.
pub fn same_translation_keys(
    a: &ConfigTranslationMap,
    b: &ConfigTranslationMap,
) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let keys: HashSet<&String> = a.keys().collect();
    b.keys().all(|key| keys.contains(key))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn translation(keys: &[&str]) -> ConfigTranslationMap {
        keys.iter()
            .map(|k| {
                (
                    k.to_string(),
                    ConfigTranslation {
                        display_name: k.to_string(),
                        ..Default::default()
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_same_translation_keys() {
        assert!(same_translation_keys(&translation(&["a", "b", "c"]), &translation(&["c", "a", "b"])));
        assert!(!same_translation_keys(&translation(&["a", "b"]), &translation(&["a", "b", "c"])));
        assert!(!same_translation_keys(&translation(&["a", "b"]), &translation(&["a", "d"])));
        assert!(same_translation_keys(&translation(&[]), &translation(&[])));
    }

    #[test]
    fn test_spec_from_json() {
        let spec = NodeSpec::from_json(
            &json!({
                "spec_id": "geth",
                "version": "1.0.0",
                "display_name": "Geth",
                "execution": {
                    "image_name": "docker.io/ethereum/client-go",
                    "input": { "default_config": { "httpPort": "8545" } }
                },
                "config_translation": {
                    "httpPort": { "display_name": "HTTP port", "port": true },
                    "syncMode": { "display_name": "Sync mode" }
                }
            })
            .to_string(),
        )
        .unwrap();

        assert_eq!(spec.spec_id, "geth");
        assert_eq!(spec.default_config().get("httpPort"), Some(&json!("8545")));
        assert_eq!(spec.port_keys(), vec!["httpPort"]);
    }
}
