use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use tracing::trace;

use crate::{
    NodeherdError, Result, ShareLock,
    model::{Node, NodeId},
    store::NodeStore,
};

/// In-memory node store. Clones share the same nodes.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    nodes: ShareLock<HashMap<NodeId, Node>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            nodes: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl NodeStore for MemStore {
    fn exists(
        &self,
        id: &str,
    ) -> Result<bool> {
        Ok(self.nodes.read().unwrap_or_else(PoisonError::into_inner).contains_key(id))
    }

    fn find(
        &self,
        id: &str,
    ) -> Result<Node> {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner).get(id).cloned().ok_or_else(|| NodeherdError::NotFound(id.to_string()))
    }

    fn find_by_spec_id(
        &self,
        spec_id: &str,
    ) -> Result<Option<Node>> {
        Ok(self.list()?.into_iter().find(|node| node.spec.spec_id == spec_id))
    }

    fn list(&self) -> Result<Vec<Node>> {
        let mut nodes: Vec<Node> = self.nodes.read().unwrap_or_else(PoisonError::into_inner).values().cloned().collect();
        nodes.sort_by(|a, b| a.created_timestamp_ms.cmp(&b.created_timestamp_ms).then_with(|| a.id.cmp(&b.id)));
        Ok(nodes)
    }

    fn create(
        &self,
        node: &Node,
    ) -> Result<bool> {
        trace!("mem::create({})", node.id);
        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        if nodes.contains_key(&node.id) {
            return Err(NodeherdError::Store(format!("node {} already exists", node.id)));
        }
        nodes.insert(node.id.clone(), node.clone());
        Ok(true)
    }

    fn update(
        &self,
        node: &Node,
    ) -> Result<bool> {
        trace!("mem::update({}, {})", node.id, node.status);
        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        match nodes.get_mut(&node.id) {
            Some(existing) => {
                *existing = node.clone();
                Ok(true)
            }
            None => Err(NodeherdError::NotFound(node.id.clone())),
        }
    }

    fn delete(
        &self,
        id: &str,
    ) -> Result<Node> {
        trace!("mem::delete({})", id);
        self.nodes.write().unwrap_or_else(PoisonError::into_inner).remove(id).ok_or_else(|| NodeherdError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::model::{NodeRuntime, NodeSpec, NodeStatus};

    fn node(spec_id: &str) -> Node {
        let spec = NodeSpec {
            spec_id: spec_id.to_string(),
            display_name: spec_id.to_string(),
            ..Default::default()
        };
        Node::new(spec, NodeRuntime::new(PathBuf::from(format!("/tmp/{}", spec_id))), None)
    }

    #[test]
    fn test_crud() {
        let store = MemStore::new();
        let mut node = node("geth");

        assert!(!store.exists(&node.id).unwrap());
        assert!(store.create(&node).unwrap());
        assert!(store.create(&node).is_err());
        assert!(store.exists(&node.id).unwrap());

        node.status = NodeStatus::Running;
        assert!(store.update(&node).unwrap());
        assert_eq!(store.find(&node.id).unwrap().status, NodeStatus::Running);

        let removed = store.delete(&node.id).unwrap();
        assert_eq!(removed.id, node.id);
        assert_eq!(store.find(&node.id), Err(NodeherdError::NotFound(node.id.clone())));
        assert_eq!(store.update(&node), Err(NodeherdError::NotFound(node.id.clone())));
        assert!(store.delete(&node.id).is_err());
    }

    #[test]
    fn test_find_by_spec_id_and_list() {
        let store = MemStore::new();
        let mut geth = node("geth");
        geth.created_timestamp_ms = 1;
        let mut lighthouse = node("lighthouse");
        lighthouse.created_timestamp_ms = 2;
        store.create(&lighthouse).unwrap();
        store.create(&geth).unwrap();

        assert_eq!(store.find_by_spec_id("lighthouse").unwrap().map(|n| n.id), Some(lighthouse.id.clone()));
        assert!(store.find_by_spec_id("nethermind").unwrap().is_none());

        let ids: Vec<_> = store.list().unwrap().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![geth.id, lighthouse.id]);
    }

    #[test]
    fn test_clones_share_nodes() {
        let store = MemStore::new();
        let other = store.clone();
        let node = node("geth");
        store.create(&node).unwrap();
        assert!(other.exists(&node.id).unwrap());
    }
}
