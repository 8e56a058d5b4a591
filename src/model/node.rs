use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    model::{ConfigValuesMap, NodeSpec},
    utils,
};

/// node id
pub type NodeId = String;

/// Lifecycle state of a node. Only the manager writes it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumString, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum NodeStatus {
    Starting,
    Running,
    Stopping,
    #[default]
    Stopped,
    ErrorStarting,
    ErrorStopping,
    Removing,
    Updating,
}

impl NodeStatus {
    /// `stopped` or `errorStopping`, the states a node may be updated from.
    pub fn is_stopped_family(&self) -> bool {
        matches!(self, NodeStatus::Stopped | NodeStatus::ErrorStopping)
    }
}

/// Who initiated the most recent stop.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum NodeStoppedBy {
    User,
    NodeUpdate,
    Shutdown,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UsageSample {
    pub timestamp: i64,
    pub value: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct NodeUsage {
    pub disk_gbs: Vec<UsageSample>,
    pub memory_bytes: Vec<UsageSample>,
    pub cpu_percent: Vec<UsageSample>,
    pub synced_block: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct NodeRuntime {
    pub data_dir: PathBuf,
    #[serde(default)]
    pub usage: NodeUsage,
    /// container ids from the last successful start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_ids: Option<Vec<String>>,
    /// ports observed at the last successful start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_ports: Option<BTreeMap<String, String>>,
}

impl NodeRuntime {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct NodeConfig {
    pub config_values_map: ConfigValuesMap,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub spec: NodeSpec,
    pub runtime: NodeRuntime,
    pub config: NodeConfig,
    pub status: NodeStatus,
    /// detail of the backend failure behind an error status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_started_timestamp_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_stopped_timestamp_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_running_timestamp_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_by: Option<NodeStoppedBy>,
    #[serde(default)]
    pub update_available: bool,
    pub created_timestamp_ms: i64,
}

impl Node {
    /// Creates a stopped node. The config starts from the spec defaults with
    /// the caller's values laid over them.
    pub fn new(
        spec: NodeSpec,
        runtime: NodeRuntime,
        initial_config: Option<ConfigValuesMap>,
    ) -> Self {
        let mut config_values_map = spec.default_config().clone();
        if let Some(initial) = initial_config {
            config_values_map.extend(initial);
        }

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            spec,
            runtime,
            config: NodeConfig {
                config_values_map,
            },
            status: NodeStatus::Stopped,
            last_error: None,
            last_started_timestamp_ms: None,
            last_stopped_timestamp_ms: None,
            last_running_timestamp_ms: None,
            stopped_by: None,
            update_available: false,
            created_timestamp_ms: utils::time::time_millis(),
        }
    }

    /// Current values of the config keys flagged as ports.
    pub fn ports(&self) -> BTreeMap<String, String> {
        self.spec
            .port_keys()
            .into_iter()
            .filter_map(|key| {
                self.config.config_values_map.get(key).map(|value| {
                    let value = match value {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (key.to_string(), value)
                })
            })
            .collect()
    }
}
