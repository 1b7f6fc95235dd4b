// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for the graph.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// A directed edge between two nodes.
///
/// Ports are kept for the authoring surface only; execution follows node
/// endpoints alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Source node ID
    pub from_id: NodeId,
    /// Target node ID
    pub to_id: NodeId,
    /// Source port index
    #[serde(default)]
    pub from_port: u32,
    /// Target port index
    #[serde(default)]
    pub to_port: u32,
}

impl Connection {
    /// Create a new connection on the default ports
    pub fn new(from_id: impl Into<NodeId>, to_id: impl Into<NodeId>) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
            from_port: 0,
            to_port: 0,
        }
    }

    /// Check if this connection involves a specific node
    pub fn involves_node(&self, node_id: &str) -> bool {
        self.from_id.as_str() == node_id || self.to_id.as_str() == node_id
    }

    /// Check if this connection joins the same two nodes as another
    pub fn same_endpoints(&self, from_id: &str, to_id: &str) -> bool {
        self.from_id.as_str() == from_id && self.to_id.as_str() == to_id
    }
}
