// SPDX-License-Identifier: MIT OR Apache-2.0
//! Persisted graph assets.
//!
//! RON is the on-disk format; JSON is offered for tools outside the engine.

use crate::graph::Graph;
use std::path::Path;

/// Error loading or saving a graph asset
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// File system error
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// RON serialization error
    #[error("Serialization error: {0}")]
    RonSerialize(#[from] ron::Error),

    /// RON parse error
    #[error("Deserialization error: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Graph {
    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String, AssetError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Parse from RON
    pub fn from_ron(source: &str) -> Result<Self, AssetError> {
        Ok(ron::from_str(source)?)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, AssetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON
    pub fn from_json(source: &str) -> Result<Self, AssetError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Save as a RON asset
    pub fn save(&self, path: &Path) -> Result<(), AssetError> {
        std::fs::write(path, self.to_ron()?)?;
        tracing::info!("Saved graph {} to {:?}", self.name, path);
        Ok(())
    }

    /// Load a RON asset
    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let content = std::fs::read_to_string(path)?;
        let graph = Self::from_ron(&content)?;
        tracing::info!("Loaded graph {} from {:?}", graph.name, path);
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bake::{bake, BakeHost};
    use crate::connection::Connection;
    use crate::key::KeyCode;
    use crate::node::{Node, NodeId, NodeKind, ObjectId};

    struct FixedHost;

    impl BakeHost for FixedHost {
        fn target_id(&mut self, object: ObjectId) -> Option<String> {
            Some(object.to_string())
        }

        fn bind_click_trigger(&mut self, _object: ObjectId, _node_id: &NodeId) {}
    }

    fn sample() -> Graph {
        let mut graph = Graph::new("Inventory Flow");
        graph.add_node(Node::click("open", Some(ObjectId::new())).with_position(10.0, 20.0));
        graph.add_node(Node::show_layer("show", "Inventory"));
        graph.add_node(
            Node::new(NodeKind::CallMethod {
                target: None,
                component: "Shop".into(),
                method: "refresh".into(),
            })
            .with_id("call"),
        );
        graph.connect("open", "show").unwrap();
        graph.connect("show", "call").unwrap();
        bake(&mut graph, &mut FixedHost);
        graph
    }

    #[test]
    fn test_ron_keeps_baked_program() {
        let graph = sample();
        let loaded = Graph::from_ron(&graph.to_ron().unwrap()).unwrap();
        assert_eq!(loaded, graph);
        assert!(loaded.is_baked());
    }

    #[test]
    fn test_json_asset_shape() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(json["connections"][0]["fromId"], "open");
        assert_eq!(json["connections"][0]["toId"], "show");
        assert_eq!(json["bakedProgram"][1]["nodeType"], "ShowLayer");
        assert_eq!(json["bakedProgram"][1]["layerParams"][0], "Inventory");

        let open = &json["nodes"][0];
        assert_eq!(open["displayName"], "On Click");
        assert_eq!(open["type"], "TriggerByClick");
        assert_eq!(open["position"][1], 20.0);
        assert!(open.get("kind").is_none());
        let call = &json["nodes"][2];
        assert_eq!(call["component"], "Shop");
        assert_eq!(call["method"], "refresh");
        assert!(call.get("layers").is_none());
    }

    #[test]
    fn test_load_flat_json_asset() {
        let json = r#"{
            "name": "flat",
            "nodes": [
                {"id": "open", "position": [0, 0], "displayName": "Open",
                 "type": "TriggerByKey", "key": "I"},
                {"id": "wait", "position": [120, 0], "displayName": "Wait",
                 "type": "Delay", "seconds": 1.0},
                {"id": "show", "position": [240, 0], "displayName": "Show",
                 "type": "ShowLayer", "layers": ["Inventory"]}
            ],
            "connections": [
                {"fromId": "open", "toId": "wait", "fromPort": 0, "toPort": 0},
                {"fromId": "wait", "toId": "show"}
            ]
        }"#;
        let graph = Graph::from_json(json).unwrap();

        assert_eq!(graph.node_count(), 3);
        let wait = graph.node("wait").unwrap();
        assert_eq!(wait.name, "Wait");
        assert_eq!(wait.position, [120.0, 0.0]);
        assert_eq!(wait.kind, NodeKind::Delay { seconds: 1.0 });
        assert_eq!(
            graph.node("open").unwrap().kind,
            NodeKind::TriggerByKey { key: Some(KeyCode::I) }
        );
        assert_eq!(graph.successors("wait").next(), Some(&NodeId::from("show")));
        assert!(!graph.is_baked());
    }

    #[test]
    fn test_unbaked_asset_loads_with_dangling_edge() {
        let mut graph = Graph::from_parts(
            "partial",
            vec![Node::delay("a", 0.5)],
            vec![Connection::new("a", "gone")],
        );
        graph.invalidate();
        let json = graph.to_json().unwrap();
        let loaded = Graph::from_json(&json).unwrap();
        assert!(!loaded.is_baked());
        assert_eq!(loaded.connection_count(), 1);
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("ordoplay_ui_graph_{}.ron", NodeId::new()));
        let graph = sample();
        graph.save(&path).unwrap();
        let loaded = Graph::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.baked_program(), graph.baked_program());
    }
}
