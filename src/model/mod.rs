mod node;
mod spec;

pub use node::{Node, NodeConfig, NodeId, NodeRuntime, NodeStatus, NodeStoppedBy, NodeUsage, UsageSample};
pub use spec::{ConfigTranslation, ConfigTranslationMap, ConfigValuesMap, ExecutionInput, NodeExecution, NodeLibrary, NodeSpec, same_translation_keys};
