use crate::model::NodeStatus;

#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    Added,
    StatusChanged(NodeStatus),
    ConfigReset,
    SpecUpdated,
    Removed,
}

impl NodeEvent {
    pub fn str(&self) -> &str {
        match self {
            NodeEvent::Added => "Added",
            NodeEvent::StatusChanged(_) => "StatusChanged",
            NodeEvent::ConfigReset => "ConfigReset",
            NodeEvent::SpecUpdated => "SpecUpdated",
            NodeEvent::Removed => "Removed",
        }
    }

    pub fn status(&self) -> Option<NodeStatus> {
        match self {
            NodeEvent::StatusChanged(status) => Some(*status),
            _ => None,
        }
    }
}
