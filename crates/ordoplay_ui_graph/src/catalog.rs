// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node catalog for authoring tools.

use crate::node::{Node, NodeCategory, NodeKind, NodeType};
use indexmap::IndexMap;

/// Description of a node type shown in the graph palette
#[derive(Debug, Clone)]
pub struct NodeDescriptor {
    /// Type tag
    pub node_type: NodeType,
    /// Display name
    pub name: String,
    /// Category
    pub category: NodeCategory,
    /// Description
    pub description: String,
}

/// Registry of available node types
pub struct NodeCatalog {
    types: IndexMap<NodeType, NodeDescriptor>,
}

impl NodeCatalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self {
            types: IndexMap::new(),
        }
    }

    /// Register a node type
    pub fn register(&mut self, node_type: NodeType, description: impl Into<String>) {
        self.types.insert(
            node_type,
            NodeDescriptor {
                node_type,
                name: node_type.display_name().to_string(),
                category: node_type.category(),
                description: description.into(),
            },
        );
    }

    /// Get a descriptor
    pub fn get(&self, node_type: NodeType) -> Option<&NodeDescriptor> {
        self.types.get(&node_type)
    }

    /// All registered descriptors
    pub fn descriptors(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.types.values()
    }

    /// Descriptors in a category
    pub fn in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeDescriptor> {
        self.types.values().filter(move |d| d.category == category)
    }

    /// Create an unconfigured node of a registered type
    pub fn create_node(&self, node_type: NodeType) -> Option<Node> {
        let descriptor = self.get(node_type)?;
        Some(Node::new(NodeKind::empty(node_type)).with_name(descriptor.name.clone()))
    }
}

impl Default for NodeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Catalog with every UI flow node type
pub fn create_ui_flow_catalog() -> NodeCatalog {
    let mut catalog = NodeCatalog::new();

    // Triggers
    catalog.register(NodeType::TriggerByClick, "Runs the connected nodes when a button is clicked");
    catalog.register(NodeType::TriggerByKey, "Runs the connected nodes when a key is pressed");

    // Layers
    catalog.register(NodeType::ShowLayer, "Shows every group of the listed layers");
    catalog.register(NodeType::HideLayer, "Hides every group of the listed layers");
    catalog.register(
        NodeType::ToggleLayer,
        "Hides a layer if any of its groups is visible, shows it otherwise",
    );

    // Objects
    catalog.register(NodeType::ShowObject, "Activates the target objects");
    catalog.register(NodeType::HideObject, "Deactivates the target objects");
    catalog.register(NodeType::ToggleObject, "Flips the active state of the target objects");

    // Flow
    catalog.register(NodeType::Delay, "Waits before continuing");

    // Script
    catalog.register(NodeType::CallMethod, "Invokes an action registered on the target object");

    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_covers_every_type() {
        let catalog = create_ui_flow_catalog();
        for node_type in NodeType::ALL {
            assert!(catalog.get(node_type).is_some(), "{node_type:?} missing");
        }
        assert_eq!(catalog.in_category(NodeCategory::Trigger).count(), 2);
    }

    #[test]
    fn test_create_node() {
        let catalog = create_ui_flow_catalog();
        let node = catalog.create_node(NodeType::Delay).unwrap();
        assert_eq!(node.name, "Delay");
        assert_eq!(node.kind, NodeKind::Delay { seconds: 0.0 });
        assert!(NodeCatalog::new().create_node(NodeType::Delay).is_none());
    }
}
