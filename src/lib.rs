//! # nodeherd
//!
//! nodeherd manages the lifecycle of locally run, containerized nodes on
//! behalf of an application: creating them, starting and stopping their
//! containers, removing them, applying spec updates with config migration,
//! and reconciling persisted status with the real container state after a
//! restart.
//!
//! ## Core Features
//!
//! - **Single Status Owner**: Only the [`NodeManager`] writes a node's status, before and after every backend call
//! - **Per-Node Ordering**: Operations on the same node never interleave
//! - **Pluggable Collaborators**: Container backend, spec registry, config migration and notifications are traits
//! - **Pluggable Storage**: Supports in-memory storage and PostgreSQL
//! - **Event Channel**: Subscribe to status changes and notifications
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nodeherd::{ManagerBuilder, NodeStoppedBy};
//!
//! let manager = ManagerBuilder::new().driver(driver).registry(registry).build()?;
//! manager.initialize().await?;
//!
//! let node = manager.add_node(spec, None, None).await?;
//! manager.start_node(&node.id).await?;
//! manager.stop_node(&node.id, NodeStoppedBy::User).await?;
//! manager.remove_node(&node.id, true).await?;
//! ```

mod builder;
mod common;
mod config;
mod error;
mod manager;
mod model;
mod utils;

pub mod driver;
pub mod events;
pub mod migrate;
pub mod ports;
pub mod registry;
pub mod store;

use std::sync::{Arc, RwLock};

pub use builder::ManagerBuilder;
pub use config::{Config, PostgresConfig, StoreConfig, StoreType};
pub use error::NodeherdError;
pub use manager::{NodeManager, ReconcileReport, compare_specs_and_update};
pub use model::*;

/// Result type alias for nodeherd operations.
pub type Result<T> = std::result::Result<T, NodeherdError>;

/// Thread-safe shared lock wrapper using Arc<RwLock<T>>.
pub(crate) type ShareLock<T> = Arc<RwLock<T>>;
