//! Spec registry seam.

use async_trait::async_trait;

use crate::{
    Result,
    model::{Node, NodeLibrary, NodeSpec},
};

/// Source of canonical node specifications and controller updates.
#[async_trait]
pub trait SpecRegistry: Send + Sync {
    async fn init(&self) -> Result<()>;

    /// A spec newer than the one `node` runs, if the registry has one.
    async fn check_for_newer_spec(
        &self,
        node: &Node,
    ) -> Result<Option<NodeSpec>>;

    /// Current canonical specs keyed by spec id.
    async fn library(&self) -> Result<NodeLibrary>;
}
