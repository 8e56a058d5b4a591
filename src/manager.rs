//! Node manager - the lifecycle orchestrator.
//!
//! The manager owns every status transition of every node. It reads and
//! writes the [`NodeStore`], drives containers through the [`RuntimeDriver`],
//! takes updates from the [`SpecRegistry`] and [`ConfigMigrator`], and
//! reports user-visible outcomes through the [`Notifier`].
//!
//! Operations that mutate a node hold that node's lock for their whole
//! duration. Backend failures of a single node end up in its status and are
//! logged; only `NotFound` and `InvalidState` are returned to the caller.

mod lifecycle;
mod locks;
mod reconcile;
mod update;


use std::{path::Path, sync::Arc, time::Duration};

use tokio::{runtime::Handle, sync::oneshot, task::AbortHandle};
use tracing::{error, info, trace, warn};

use crate::{
    Config, Result,
    common::MemCache,
    driver::RuntimeDriver,
    events::{Channel, NodeEvent, Notifier},
    migrate::ConfigMigrator,
    model::{ConfigValuesMap, Node, NodeId, NodeRuntime, NodeSpec, NodeStatus},
    ports::PortChecker,
    registry::SpecRegistry,
    store::NodeStore,
    utils,
};

use locks::NodeLocks;

pub use reconcile::ReconcileReport;
pub use update::compare_specs_and_update;

/// Maximum number of pending deferred port checks tracked for cancellation.
const DEFERRED_CHECK_CACHE_SIZE: usize = 4096;

/// The lifecycle orchestrator for nodes.
///
/// Build one with [`crate::ManagerBuilder`], call [`NodeManager::initialize`]
/// once at startup and [`NodeManager::on_exit`] before the process ends.
///
/// # Example
///
/// ```rust,ignore
/// let manager = ManagerBuilder::new().driver(driver).registry(registry).build()?;
/// let report = manager.initialize().await?;
///
/// let node = manager.add_node(spec, None, None).await?;
/// manager.start_node(&node.id).await?;
/// assert_eq!(manager.get_node(&node.id)?.status, NodeStatus::Running);
///
/// manager.on_exit();
/// ```
pub struct NodeManager {
    config: Config,
    /// Persistent node registry.
    store: Arc<dyn NodeStore>,
    driver: Arc<dyn RuntimeDriver>,
    registry: Arc<dyn SpecRegistry>,
    migrator: Arc<dyn ConfigMigrator>,
    notifier: Arc<dyn Notifier>,
    port_checker: Option<Arc<dyn PortChecker>>,
    /// Event channel for node events and notifications.
    channel: Arc<Channel>,

    locks: NodeLocks,
    /// Abort handles of scheduled port checks, keyed by node id.
    deferred_checks: Arc<MemCache<NodeId, AbortHandle>>,
    port_check_delay: Duration,
    runtime: Handle,
}

impl NodeManager {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        config: Config,
        store: Arc<dyn NodeStore>,
        driver: Arc<dyn RuntimeDriver>,
        registry: Arc<dyn SpecRegistry>,
        migrator: Arc<dyn ConfigMigrator>,
        notifier: Arc<dyn Notifier>,
        port_checker: Option<Arc<dyn PortChecker>>,
        channel: Arc<Channel>,
        port_check_delay: Duration,
        runtime: Handle,
    ) -> Self {
        Self {
            config,
            store,
            driver,
            registry,
            migrator,
            notifier,
            port_checker,
            channel,
            locks: NodeLocks::new(),
            deferred_checks: Arc::new(MemCache::new(DEFERRED_CHECK_CACHE_SIZE)),
            port_check_delay,
            runtime,
        }
    }

    /// Creates a node from `spec`, persists it as `stopped` and schedules a
    /// one-shot port check.
    ///
    /// The data directory is `<storage_location>/<spec_id>-<utc seconds>`,
    /// `storage_location` defaulting to the configured nodes dir.
    pub async fn add_node(
        &self,
        spec: NodeSpec,
        storage_location: Option<&Path>,
        initial_config: Option<ConfigValuesMap>,
    ) -> Result<Node> {
        let parent = storage_location.unwrap_or(self.config.nodes_dir.as_path());
        let data_dir = utils::fs::claim_node_dir(&format!("{}-{}", spec.spec_id, utils::time::time_secs()), parent).await?;

        let node = Node::new(spec, NodeRuntime::new(data_dir), initial_config);
        info!(node_id = %node.id, spec_id = %node.spec.spec_id, data_dir = %node.runtime.data_dir.display(), "adding node");
        self.store.create(&node)?;
        self.channel.publish(&node.id, NodeEvent::Added);

        self.schedule_port_check(&node);
        Ok(node)
    }

    pub fn get_node(
        &self,
        node_id: &str,
    ) -> Result<Node> {
        self.store.find(node_id)
    }

    pub fn get_nodes(&self) -> Result<Vec<Node>> {
        self.store.list()
    }

    /// Replaces the node's config values with its spec's defaults. The status
    /// is left as it is.
    pub async fn reset_node_config(
        &self,
        node_id: &str,
    ) -> Result<()> {
        let _guard = self.locks.lock(node_id).await;
        let mut node = self.store.find(node_id)?;
        node.config.config_values_map = node.spec.default_config().clone();
        self.persist(&node, NodeEvent::ConfigReset)
    }

    /// The command a user could run to start the node outside the manager.
    /// Driver failures are logged and yield an empty string.
    pub fn get_node_start_command(
        &self,
        node_id: &str,
    ) -> Result<String> {
        let node = self.store.find(node_id)?;
        match self.driver.build_start_command(&node) {
            Ok(command) => {
                trace!(node_id, %command, "created node start command");
                Ok(command)
            }
            Err(e) => {
                error!(node_id, error = %e, "failed to build node start command");
                Ok(String::new())
            }
        }
    }

    /// Deletes the node's data directory. The node itself stays in the store.
    pub async fn delete_node_storage(
        &self,
        node_id: &str,
    ) -> Result<bool> {
        let _guard = self.locks.lock(node_id).await;
        let node = self.store.find(node_id)?;
        self.delete_storage(&node).await
    }

    pub fn send_node_logs(
        &self,
        node_id: &str,
    ) -> Result<()> {
        let node = self.store.find(node_id)?;
        self.driver.send_logs(&node);
        Ok(())
    }

    /// Stops log streaming, for the given node or for whatever is streaming.
    pub fn stop_sending_node_logs(
        &self,
        node_id: Option<&str>,
    ) -> Result<()> {
        if let Some(node_id) = node_id {
            self.store.find(node_id)?;
        }
        self.driver.stop_sending_logs();
        Ok(())
    }

    /// Releases driver resources and stops background work. Node statuses
    /// are left untouched.
    pub fn on_exit(&self) {
        info!("node manager exiting");
        for check in self.deferred_checks.drain() {
            check.abort();
        }
        self.driver.shutdown();
        self.channel.shutdown();
    }

    /// Returns a reference to the event channel.
    pub fn channel(&self) -> Arc<Channel> {
        self.channel.clone()
    }

    pub fn store(&self) -> Arc<dyn NodeStore> {
        self.store.clone()
    }

    /// Persists the node and publishes its current status.
    fn persist_status(
        &self,
        node: &Node,
    ) -> Result<()> {
        self.persist(node, NodeEvent::StatusChanged(node.status))
    }

    fn persist(
        &self,
        node: &Node,
        event: NodeEvent,
    ) -> Result<()> {
        self.store.update(node)?;
        trace!(node_id = %node.id, status = %node.status, event = event.str(), "node persisted");
        self.channel.publish(&node.id, event);
        Ok(())
    }

    async fn delete_storage(
        &self,
        node: &Node,
    ) -> Result<bool> {
        let deleted = utils::fs::delete_disk(&node.runtime.data_dir).await?;
        info!(node_id = %node.id, deleted, "deleted node storage");
        Ok(deleted)
    }

    /// After the configured delay, checks the ports of the node created from
    /// this spec if it is running at that point. The node is looked up again
    /// when the check fires.
    fn schedule_port_check(
        &self,
        node: &Node,
    ) {
        let Some(port_checker) = self.port_checker.clone() else {
            return;
        };

        let store = self.store.clone();
        let checks = self.deferred_checks.clone();
        let delay = self.port_check_delay;
        let node_id = node.id.clone();
        let spec_id = node.spec.spec_id.clone();

        let (registered_tx, registered_rx) = oneshot::channel::<()>();
        let task = self.runtime.spawn({
            let node_id = node_id.clone();
            async move {
                let _ = registered_rx.await;
                tokio::time::sleep(delay).await;
                checks.remove(&node_id);
                match store.find_by_spec_id(&spec_id) {
                    Ok(Some(node)) if node.status == NodeStatus::Running => {
                        trace!(node_id = %node.id, "running deferred port check");
                        port_checker.check_ports_and_notify(&node);
                    }
                    Ok(_) => trace!(node_id, spec_id, "deferred port check skipped, node not running"),
                    Err(e) => warn!(node_id, error = %e, "deferred port check failed to read node"),
                }
            }
        });
        self.deferred_checks.set(node_id, task.abort_handle());
        let _ = registered_tx.send(());
    }

    fn cancel_port_check(
        &self,
        node_id: &str,
    ) {
        if let Some(check) = self.deferred_checks.remove(&node_id.to_string()) {
            trace!(node_id, "cancelled deferred port check");
            check.abort();
        }
    }
}
