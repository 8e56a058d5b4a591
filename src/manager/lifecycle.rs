use tracing::{error, info, warn};

use crate::{
    Result,
    events::NodeEvent,
    manager::NodeManager,
    model::{Node, NodeStatus, NodeStoppedBy},
    utils,
};

impl NodeManager {
    /// Starts the node's containers.
    ///
    /// The node is persisted as `starting` before the driver is called and as
    /// `running` or `errorStarting` after it returns. A driver failure is
    /// recorded on the node, not returned.
    pub async fn start_node(
        &self,
        node_id: &str,
    ) -> Result<()> {
        let _guard = self.locks.lock(node_id).await;
        self.start_node_locked(node_id).await
    }

    /// Stops the node's containers. The node always ends `stopped`, even if
    /// the driver fails to stop it.
    pub async fn stop_node(
        &self,
        node_id: &str,
        stopped_by: NodeStoppedBy,
    ) -> Result<()> {
        let _guard = self.locks.lock(node_id).await;
        self.stop_node_locked(node_id, stopped_by).await
    }

    /// Stops the node, removes its containers, optionally deletes its data
    /// directory, and deletes it from the store.
    ///
    /// Stop and container removal failures are logged and do not prevent the
    /// deletion.
    pub async fn remove_node(
        &self,
        node_id: &str,
        delete_storage: bool,
    ) -> Result<Node> {
        let _guard = self.locks.lock(node_id).await;
        self.store.find(node_id)?;
        info!(node_id, delete_storage, "removing node");

        if let Err(e) = self.stop_node_locked(node_id, NodeStoppedBy::User).await {
            warn!(node_id, error = %e, "unable to stop the node before removing, continuing with removal");
        }

        let mut node = self.store.find(node_id)?;
        node.status = NodeStatus::Removing;
        self.persist_status(&node)?;

        match self.driver.remove(&node).await {
            Ok(removed) => info!(node_id, removed, "removed node containers"),
            Err(e) => error!(node_id, error = %e, "failed to remove node containers"),
        }

        if delete_storage {
            if let Err(e) = self.delete_storage(&node).await {
                error!(node_id, error = %e, "failed to delete node storage");
            }
        }

        self.cancel_port_check(node_id);
        let removed = self.store.delete(node_id)?;
        self.channel.publish(node_id, NodeEvent::Removed);
        self.locks.forget(node_id);
        Ok(removed)
    }

    /// Removes every node and its storage, one at a time. A failure on one
    /// node is logged and the rest are still removed.
    pub async fn remove_all_nodes(&self) -> Result<()> {
        let nodes = self.store.list()?;
        info!(count = nodes.len(), "removing all nodes");
        for node in nodes {
            if let Err(e) = self.remove_node(&node.id, true).await {
                error!(node_id = %node.id, error = %e, "failed to remove node");
            }
        }
        Ok(())
    }

    pub(super) async fn start_node_locked(
        &self,
        node_id: &str,
    ) -> Result<()> {
        let mut node = self.store.find(node_id)?;
        info!(node_id, spec_id = %node.spec.spec_id, "starting node");

        node.status = NodeStatus::Starting;
        node.last_started_timestamp_ms = Some(utils::time::time_millis());
        node.stopped_by = None;
        self.persist_status(&node)?;

        match self.driver.start(&node).await {
            Ok(process_ids) => {
                node.runtime.process_ids = Some(process_ids);
                node.status = NodeStatus::Running;
                node.last_error = None;
                node.last_running_timestamp_ms = Some(utils::time::time_millis());
                if self.store.ports_changed_since_last_run(&mut node) {
                    if let Some(port_checker) = &self.port_checker {
                        port_checker.check_ports_and_notify(&node);
                    }
                }
            }
            Err(e) => {
                error!(node_id, error = %e, "failed to start node");
                node.status = NodeStatus::ErrorStarting;
                node.last_error = Some(e.to_string());
            }
        }

        self.persist_status(&node)
    }

    pub(super) async fn stop_node_locked(
        &self,
        node_id: &str,
        stopped_by: NodeStoppedBy,
    ) -> Result<()> {
        let mut node = self.store.find(node_id)?;
        info!(node_id, stopped_by = stopped_by.as_ref(), "stopping node");

        node.status = NodeStatus::Stopping;
        node.last_stopped_timestamp_ms = Some(utils::time::time_millis());
        node.stopped_by = Some(stopped_by);
        self.persist_status(&node)?;

        if let Err(e) = self.driver.stop(&node).await {
            error!(node_id, error = %e, "failed to stop node, marking it stopped");
            node.last_error = Some(e.to_string());
        }

        node.status = NodeStatus::Stopped;
        self.persist_status(&node)
    }
}
