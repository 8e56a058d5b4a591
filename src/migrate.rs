//! Config migration between node spec versions.

use crate::{
    Result,
    model::{ConfigValuesMap, NodeSpec},
};

/// Computes a node's config for a new spec.
///
/// `inject_defaults` must run on the new spec before `recompute`.
pub trait ConfigMigrator: Send + Sync {
    /// Ensures the spec's default config holds every translation default.
    fn inject_defaults(
        &self,
        spec: &mut NodeSpec,
    );

    /// Derives the config values for `spec` from the node's current values.
    fn recompute(
        &self,
        spec: &NodeSpec,
        current: &ConfigValuesMap,
    ) -> Result<ConfigValuesMap>;
}

/// Keeps every current value the new spec still recognizes and fills the rest
/// from the new spec's defaults.
#[derive(Debug, Clone, Default)]
pub struct ControllerConfigMigrator;

impl ConfigMigrator for ControllerConfigMigrator {
    fn inject_defaults(
        &self,
        spec: &mut NodeSpec,
    ) {
        let Some(translation) = spec.config_translation.as_ref() else {
            return;
        };
        let default_config = &mut spec.execution.input.default_config;
        for (key, entry) in translation {
            if let Some(default_value) = &entry.default_value {
                default_config.entry(key.clone()).or_insert_with(|| default_value.clone());
            }
        }
    }

    fn recompute(
        &self,
        spec: &NodeSpec,
        current: &ConfigValuesMap,
    ) -> Result<ConfigValuesMap> {
        let mut values = spec.default_config().clone();
        match &spec.config_translation {
            Some(translation) => {
                values.extend(current.iter().filter(|(key, _)| translation.contains_key(*key)).map(|(k, v)| (k.clone(), v.clone())));
                values.retain(|key, _| translation.contains_key(key));
            }
            None => {
                for (key, value) in values.iter_mut() {
                    if let Some(current_value) = current.get(key) {
                        *value = current_value.clone();
                    }
                }
            }
        }
        Ok(values)
    }
}
