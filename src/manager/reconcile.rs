use tracing::{error, info, warn};

use crate::{
    NodeherdError, Result,
    manager::{NodeManager, compare_specs_and_update},
    model::{Node, NodeId, NodeLibrary, NodeStatus},
};

/// Outcome of startup reconciliation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    /// Nodes whose status was aligned with the backend, with that status.
    pub reconciled: Vec<(NodeId, NodeStatus)>,
    /// Nodes that could not be reconciled. They are left as persisted.
    pub failed: Vec<(NodeId, NodeherdError)>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

impl NodeManager {
    /// Runs once at process start.
    ///
    /// Prepares the driver and registry, starts the event channel, then sets
    /// every persisted node to `running` or `stopped` according to what the
    /// backend reports and refreshes its config translation map from the
    /// registry library. A backend that cannot be reached means `stopped`. A
    /// node without recorded container ids is reported as failed and the
    /// remaining nodes are still reconciled.
    pub async fn initialize(&self) -> Result<ReconcileReport> {
        if let Err(e) = self.driver.init().await {
            warn!(error = %e, "runtime driver failed to initialize");
        }
        if let Err(e) = self.registry.init().await {
            warn!(error = %e, "spec registry failed to initialize");
        }
        self.channel.listen();

        let library = self.registry.library().await.unwrap_or_else(|e| {
            warn!(error = %e, "unable to load node library, config translations are left as persisted");
            NodeLibrary::new()
        });

        let mut report = ReconcileReport::default();
        for node in self.store.list()? {
            let node_id = node.id.clone();
            let _guard = self.locks.lock(&node_id).await;
            match self.reconcile_node(node, &library).await {
                Ok(status) => report.reconciled.push((node_id, status)),
                Err(e) => {
                    error!(node_id, error = %e, "failed to reconcile node");
                    report.failed.push((node_id, e));
                }
            }
        }

        info!(reconciled = report.reconciled.len(), failed = report.failed.len(), "node reconciliation finished");
        Ok(report)
    }

    async fn reconcile_node(
        &self,
        mut node: Node,
        library: &NodeLibrary,
    ) -> Result<NodeStatus> {
        let process_ids = match &node.runtime.process_ids {
            Some(ids) if !ids.is_empty() => ids.clone(),
            _ => return Err(NodeherdError::DataIntegrity(format!("no container ids found for node {}", node.id))),
        };

        node.status = match self.driver.inspect(&process_ids).await {
            Ok(details) if details.running => NodeStatus::Running,
            Ok(_) => NodeStatus::Stopped,
            Err(e) => {
                warn!(node_id = %node.id, error = %e, "unable to inspect node containers, the runtime is likely stopped");
                NodeStatus::Stopped
            }
        };

        let library_translation = library.get(&node.spec.spec_id).and_then(|spec| spec.config_translation.as_ref());
        if compare_specs_and_update(&mut node, library_translation) {
            info!(node_id = %node.id, "config translation replaced from node library");
        }

        self.persist_status(&node)?;
        Ok(node.status)
    }
}
