//! Container backend seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Result, model::Node};

/// What the backend reports about a node's containers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerDetails {
    pub running: bool,
}

/// Executes container operations for nodes.
///
/// Any call may fail with [`crate::NodeherdError::Backend`]. The manager does
/// not assume a call is atomic, and the driver is not expected to retry.
#[async_trait]
pub trait RuntimeDriver: Send + Sync {
    /// Prepares the backend. Called once before startup reconciliation.
    async fn init(&self) -> Result<()>;

    /// Starts the node's containers and returns their ids.
    async fn start(
        &self,
        node: &Node,
    ) -> Result<Vec<String>>;

    async fn stop(
        &self,
        node: &Node,
    ) -> Result<()>;

    /// Removes the node's containers, returns whether anything was removed.
    async fn remove(
        &self,
        node: &Node,
    ) -> Result<bool>;

    async fn inspect(
        &self,
        process_ids: &[String],
    ) -> Result<ContainerDetails>;

    /// The run arguments the backend would use, for users running the node by hand.
    fn build_start_command(
        &self,
        node: &Node,
    ) -> Result<String>;

    fn send_logs(
        &self,
        node: &Node,
    );

    fn stop_sending_logs(&self);

    /// Releases backend resources on process exit.
    fn shutdown(&self);
}
