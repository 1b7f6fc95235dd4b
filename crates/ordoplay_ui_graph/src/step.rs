// SPDX-License-Identifier: MIT OR Apache-2.0
//! Execution steps, the serialized instruction set produced by baking.

use crate::node::{NodeId, NodeType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Well-known parameter keys
pub mod param {
    /// Key name of a key trigger (string)
    pub const KEY: &str = "key";
    /// Delay duration in seconds (float)
    pub const SECONDS: &str = "seconds";
    /// Component name of a call method step (string)
    pub const COMPONENT: &str = "component";
    /// Action name of a call method step (string)
    pub const METHOD: &str = "method";
}

/// One instruction of a baked program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStep {
    /// Type of the originating node
    pub node_type: NodeType,
    /// ID of the originating node
    pub node_id: NodeId,
    /// String literals
    #[serde(default)]
    pub string_params: IndexMap<String, String>,
    /// Integer literals
    #[serde(default)]
    pub int_params: IndexMap<String, i32>,
    /// Float literals
    #[serde(default)]
    pub float_params: IndexMap<String, f32>,
    /// Layer names
    #[serde(default)]
    pub layer_params: Vec<String>,
    /// Stable target ids
    #[serde(default)]
    pub target_ids: Vec<String>,
}

impl ExecutionStep {
    /// Create a step with no parameters
    pub fn new(node_type: NodeType, node_id: NodeId) -> Self {
        Self {
            node_type,
            node_id,
            string_params: IndexMap::new(),
            int_params: IndexMap::new(),
            float_params: IndexMap::new(),
            layer_params: Vec::new(),
            target_ids: Vec::new(),
        }
    }

    /// Add a string parameter
    pub fn with_string(mut self, key: &str, value: impl Into<String>) -> Self {
        self.string_params.insert(key.to_string(), value.into());
        self
    }

    /// Add a float parameter
    pub fn with_float(mut self, key: &str, value: f32) -> Self {
        self.float_params.insert(key.to_string(), value);
        self
    }

    /// Append layer names
    pub fn with_layers(mut self, layers: impl IntoIterator<Item = String>) -> Self {
        self.layer_params.extend(layers);
        self
    }

    /// Append target ids
    pub fn with_targets(mut self, targets: impl IntoIterator<Item = String>) -> Self {
        self.target_ids.extend(targets);
        self
    }

    /// Get a string parameter
    pub fn string(&self, key: &str) -> Option<&str> {
        self.string_params.get(key).map(String::as_str)
    }

    /// Get a float parameter
    pub fn float(&self, key: &str) -> Option<f32> {
        self.float_params.get(key).copied()
    }

    /// First target id, if any
    pub fn first_target(&self) -> Option<&str> {
        self.target_ids.first().map(String::as_str)
    }
}

/// Ordered list of execution steps derived from a graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BakedProgram {
    steps: Vec<ExecutionStep>,
}

impl BakedProgram {
    /// Wrap a list of steps
    pub fn new(steps: Vec<ExecutionStep>) -> Self {
        Self { steps }
    }

    /// Steps in stored order
    pub fn steps(&self) -> &[ExecutionStep] {
        &self.steps
    }

    /// Iterate over steps
    pub fn iter(&self) -> impl Iterator<Item = &ExecutionStep> {
        self.steps.iter()
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the program has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step compiled from a node
    pub fn step_for(&self, node_id: &str) -> Option<&ExecutionStep> {
        self.steps.iter().find(|s| s.node_id.as_str() == node_id)
    }
}

impl<'a> IntoIterator for &'a BakedProgram {
    type Item = &'a ExecutionStep;
    type IntoIter = std::slice::Iter<'a, ExecutionStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let step = ExecutionStep::new(NodeType::Delay, NodeId::from("wait"))
            .with_float(param::SECONDS, 1.5)
            .with_targets(["t1".to_string()]);
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["nodeType"], "Delay");
        assert_eq!(json["nodeId"], "wait");
        assert_eq!(json["floatParams"]["seconds"], 1.5);
        assert_eq!(json["targetIds"][0], "t1");
        assert!(json["layerParams"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_missing_param_maps_default_to_empty() {
        let json = r#"{ "nodeType": "ShowLayer", "nodeId": "n", "layerParams": ["Map"] }"#;
        let step: ExecutionStep = serde_json::from_str(json).unwrap();
        assert!(step.string_params.is_empty());
        assert_eq!(step.layer_params, vec!["Map".to_string()]);
        assert_eq!(step.float(param::SECONDS), None);
    }
}
