use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{ShareLock, model::NodeId};

/// One async mutex per node id. Every mutating manager operation holds the
/// node's guard for its whole duration, so operations on the same node run
/// one after another while different nodes proceed independently.
#[derive(Default)]
pub(crate) struct NodeLocks {
    locks: ShareLock<HashMap<NodeId, Arc<Mutex<()>>>>,
}

impl NodeLocks {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn lock(
        &self,
        node_id: &str,
    ) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.write().unwrap_or_else(PoisonError::into_inner);
            locks.entry(node_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Drops the entry of a removed node. Tasks already waiting on the old
    /// mutex still get it and then find the node gone.
    pub fn forget(
        &self,
        node_id: &str,
    ) {
        self.locks.write().unwrap_or_else(PoisonError::into_inner).remove(node_id);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.locks.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}
