use crate::model::Node;

/// Checks a running node's external ports for conflicts and notifies the user.
pub trait PortChecker: Send + Sync {
    fn check_ports_and_notify(
        &self,
        node: &Node,
    );
}
