//! Storage layer for persisting nodes.
//!
//! Provides an abstraction over different storage backends:
//! - `MemStore`: In-memory storage for testing and ephemeral use
//! - `PostgresStore`: PostgreSQL for production persistence

mod db;

use std::error::Error;

use crate::{NodeherdError, Result, model::Node};

pub use db::{MemStore, PostgresStore};

/// Maps database errors to NodeherdError.
fn map_db_err(err: impl Error) -> NodeherdError {
    NodeherdError::Store(err.to_string())
}

/// Authoritative registry of nodes.
///
/// A node present in the store is the current truth about it; a node absent
/// from it no longer exists. Implementations must be safe to call from many
/// tasks at once; each call is applied atomically on its own.
pub trait NodeStore: Send + Sync {
    /// Checks if a node with the given ID exists.
    fn exists(
        &self,
        id: &str,
    ) -> Result<bool>;

    /// Finds a node by ID, [`NodeherdError::NotFound`] if absent.
    fn find(
        &self,
        id: &str,
    ) -> Result<Node>;

    /// Finds the oldest node created from the given spec.
    fn find_by_spec_id(
        &self,
        spec_id: &str,
    ) -> Result<Option<Node>>;

    /// All nodes, oldest first.
    fn list(&self) -> Result<Vec<Node>>;

    fn create(
        &self,
        node: &Node,
    ) -> Result<bool>;

    fn update(
        &self,
        node: &Node,
    ) -> Result<bool>;

    /// Deletes a node by ID and returns it.
    fn delete(
        &self,
        id: &str,
    ) -> Result<Node>;

    /// Records the node's current ports as its last-run ports and reports
    /// whether they differ from the previous run. A first run is not a change.
    /// The caller persists the node afterwards.
    fn ports_changed_since_last_run(
        &self,
        node: &mut Node,
    ) -> bool {
        let ports = node.ports();
        match node.runtime.last_run_ports.replace(ports.clone()) {
            Some(previous) => previous != ports,
            None => false,
        }
    }
}
