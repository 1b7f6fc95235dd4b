// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes, connections and the baked program.

use crate::connection::Connection;
use crate::node::{Node, NodeId};
use crate::step::BakedProgram;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A UI behavior graph.
///
/// The baked program is derived from nodes and connections by
/// [`bake`](crate::bake::bake). Any structural edit drops it, so an edited
/// graph has to be baked again before it can run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    /// Graph name
    pub name: String,
    /// Nodes in authoring order
    nodes: Vec<Node>,
    /// Connections between nodes
    #[serde(default)]
    connections: Vec<Connection>,
    /// Compiled program, empty until baked
    #[serde(default)]
    baked_program: BakedProgram,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            connections: Vec::new(),
            baked_program: BakedProgram::default(),
        }
    }

    /// Build a graph from raw parts without validating connections.
    ///
    /// This is how loaded assets arrive; dangling edges are kept and stay inert.
    pub fn from_parts(
        name: impl Into<String>,
        nodes: Vec<Node>,
        connections: Vec<Connection>,
    ) -> Self {
        Self {
            name: name.into(),
            nodes,
            connections,
            baked_program: BakedProgram::default(),
        }
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id.clone();
        self.nodes.push(node);
        self.invalidate();
        id
    }

    /// Remove a node and its connections
    pub fn remove_node(&mut self, node_id: &str) -> Option<Node> {
        let index = self.nodes.iter().position(|n| n.id.as_str() == node_id)?;
        self.connections.retain(|c| !c.involves_node(node_id));
        self.invalidate();
        Some(self.nodes.remove(index))
    }

    /// Get a node by ID
    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id.as_str() == node_id)
    }

    /// Get a mutable node by ID. Drops the baked program if the node exists.
    pub fn node_mut(&mut self, node_id: &str) -> Option<&mut Node> {
        let index = self.nodes.iter().position(|n| n.id.as_str() == node_id)?;
        self.invalidate();
        Some(&mut self.nodes[index])
    }

    /// Nodes in authoring order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter().map(|n| &n.id)
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Connect two existing nodes
    pub fn connect(
        &mut self,
        from_id: impl Into<NodeId>,
        to_id: impl Into<NodeId>,
    ) -> Result<(), ConnectionError> {
        let from_id = from_id.into();
        let to_id = to_id.into();

        if self.node(from_id.as_str()).is_none() {
            return Err(ConnectionError::NodeNotFound(from_id));
        }
        if self.node(to_id.as_str()).is_none() {
            return Err(ConnectionError::NodeNotFound(to_id));
        }
        if from_id == to_id {
            return Err(ConnectionError::SelfLoop(from_id));
        }
        if self
            .connections
            .iter()
            .any(|c| c.same_endpoints(from_id.as_str(), to_id.as_str()))
        {
            return Err(ConnectionError::AlreadyConnected { from: from_id, to: to_id });
        }

        self.connections.push(Connection::new(from_id, to_id));
        self.invalidate();
        Ok(())
    }

    /// Remove the connection between two nodes, if any
    pub fn disconnect(&mut self, from_id: &str, to_id: &str) -> bool {
        let before = self.connections.len();
        self.connections.retain(|c| !c.same_endpoints(from_id, to_id));
        let removed = self.connections.len() != before;
        if removed {
            self.invalidate();
        }
        removed
    }

    /// Get all connections
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Targets of the outgoing edges of a node, in connection order
    pub fn successors<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a NodeId> + 'a {
        self.connections
            .iter()
            .filter(move |c| c.from_id.as_str() == node_id)
            .map(|c| &c.to_id)
    }

    /// Sources of the incoming edges of a node, in connection order
    pub fn predecessors<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a NodeId> + 'a {
        self.connections
            .iter()
            .filter(move |c| c.to_id.as_str() == node_id)
            .map(|c| &c.from_id)
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Whether both endpoints of a connection exist
    pub fn is_live(&self, connection: &Connection) -> bool {
        self.node(connection.from_id.as_str()).is_some()
            && self.node(connection.to_id.as_str()).is_some()
    }

    /// Nodes without a live incoming edge, in authoring order
    pub fn roots(&self) -> impl Iterator<Item = &Node> {
        let targets: HashSet<&str> = self
            .connections
            .iter()
            .filter(|c| self.is_live(c))
            .map(|c| c.to_id.as_str())
            .collect();
        self.nodes
            .iter()
            .filter(move |n| !targets.contains(n.id.as_str()))
    }

    /// Whether a program has been baked
    pub fn is_baked(&self) -> bool {
        !self.baked_program.is_empty()
    }

    /// The baked program (empty if not baked)
    pub fn baked_program(&self) -> &BakedProgram {
        &self.baked_program
    }

    pub(crate) fn set_baked_program(&mut self, program: BakedProgram) {
        self.baked_program = program;
    }

    /// Drop the baked program
    pub fn invalidate(&mut self) {
        self.baked_program = BakedProgram::default();
    }

    /// Report authoring inconsistencies.
    ///
    /// None of these stop a bake; they explain why an edge or node ends up inert.
    pub fn diagnostics(&self) -> Vec<GraphDiagnostic> {
        let mut diagnostics = Vec::new();
        let mut seen = HashSet::new();

        for (index, node) in self.nodes.iter().enumerate() {
            if node.id.is_blank() {
                diagnostics.push(GraphDiagnostic::EmptyNodeId { index });
            } else if !seen.insert(node.id.as_str()) {
                diagnostics.push(GraphDiagnostic::DuplicateNodeId(node.id.clone()));
            }
        }

        for connection in &self.connections {
            if !self.is_live(connection) {
                diagnostics.push(GraphDiagnostic::DanglingConnection {
                    from: connection.from_id.clone(),
                    to: connection.to_id.clone(),
                });
            }
        }

        diagnostics
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Error when creating a connection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Self-loop not allowed
    #[error("Self-loop not allowed on node {0}")]
    SelfLoop(NodeId),

    /// Nodes are already connected
    #[error("Nodes already connected: {from} -> {to}")]
    AlreadyConnected {
        /// Source node
        from: NodeId,
        /// Target node
        to: NodeId,
    },
}

/// Authoring inconsistency found in a graph
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphDiagnostic {
    /// A node has an empty ID and can never be reached
    #[error("Node at index {index} has an empty id")]
    EmptyNodeId {
        /// Position in the node list
        index: usize,
    },

    /// Two nodes share an ID
    #[error("Duplicate node id: {0}")]
    DuplicateNodeId(NodeId),

    /// A connection references a missing node
    #[error("Dangling connection: {from} -> {to}")]
    DanglingConnection {
        /// Source node
        from: NodeId,
        /// Target node
        to: NodeId,
    },
}
