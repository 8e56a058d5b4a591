use tracing::{error, info, warn};

use crate::{
    NodeherdError, Result,
    events::{NodeEvent, NotificationKind},
    manager::NodeManager,
    model::{ConfigTranslationMap, Node, NodeStatus, NodeStoppedBy, same_translation_keys},
};

impl NodeManager {
    /// Moves the node to the newest spec the registry has for it.
    ///
    /// Returns `Ok(false)` after a warning notification when there is no newer
    /// spec. Otherwise the node is stopped, marked `updating`, given the new
    /// spec and a migrated config, and restarted if it was running before.
    pub async fn apply_node_update(
        &self,
        node_id: &str,
    ) -> Result<bool> {
        let _guard = self.locks.lock(node_id).await;
        let node = self.store.find(node_id)?;

        let Some(mut new_spec) = self.registry.check_for_newer_spec(&node).await? else {
            warn!(node_id, spec_id = %node.spec.spec_id, "unable to update node, no newer controller found");
            self.notifier.notify(NotificationKind::ClientUpdateError, &node.spec.display_name);
            return Ok(false);
        };

        let was_running = node.status == NodeStatus::Running;
        let mut node = if node.status != NodeStatus::Stopped {
            self.stop_node_locked(node_id, NodeStoppedBy::NodeUpdate).await?;
            self.store.find(node_id)?
        } else {
            node
        };

        if !node.status.is_stopped_family() {
            self.notifier.notify(NotificationKind::ClientUpdateError, &node.spec.display_name);
            return Err(NodeherdError::InvalidState {
                node_id: node_id.to_string(),
                message: format!("unable to stop node before updating, status is {}", node.status),
            });
        }

        info!(node_id, from = %node.spec.version, to = %new_spec.version, "updating node");
        node.status = NodeStatus::Updating;
        self.persist_status(&node)?;

        self.migrator.inject_defaults(&mut new_spec);
        let config_values_map = match self.migrator.recompute(&new_spec, &node.config.config_values_map) {
            Ok(values) => values,
            Err(e) => {
                error!(node_id, error = %e, "failed to migrate node config");
                node.status = NodeStatus::Stopped;
                node.last_error = Some(e.to_string());
                self.persist_status(&node)?;
                self.notifier.notify(NotificationKind::ClientUpdateError, &node.spec.display_name);
                return Err(e);
            }
        };

        node.config.config_values_map = config_values_map;
        node.spec = new_spec;
        node.update_available = false;
        if !was_running {
            node.status = NodeStatus::Stopped;
        }
        self.persist(&node, NodeEvent::SpecUpdated)?;
        if !was_running {
            self.channel.publish(node_id, NodeEvent::StatusChanged(node.status));
        }

        self.notifier.notify(NotificationKind::ClientUpdated, &node.spec.display_name);

        if was_running {
            self.start_node_locked(node_id).await?;
        }

        Ok(true)
    }
}

/// Replaces the node's config translation map with the library's when their
/// key sets differ. Key order does not matter. Returns whether the map was
/// replaced.
///
/// Nothing changes unless both the node and the library have a map.
pub fn compare_specs_and_update(
    node: &mut Node,
    library_translation: Option<&ConfigTranslationMap>,
) -> bool {
    let (Some(translation), Some(library_translation)) = (&node.spec.config_translation, library_translation) else {
        return false;
    };
    let differs = !same_translation_keys(translation, library_translation);
    if differs {
        node.spec.config_translation = Some(library_translation.clone());
    }
    differs
}
