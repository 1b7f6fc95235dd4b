// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for UI behavior graphs.

use crate::key::KeyCode;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

/// Identifier of a node, unique within its graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a live scene object a node refers to.
///
/// Nodes hold these as authoring-time references. Baking exchanges them for
/// stable target ids, which is what the runtime resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    /// Create a new random object ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Node type tag, carried by every execution step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Starts a run when a UI element is clicked
    TriggerByClick,
    /// Starts a run when a key is pressed
    TriggerByKey,
    /// Hides every group of one or more layers
    HideLayer,
    /// Shows every group of one or more layers
    ShowLayer,
    /// Flips each layer as one on/off unit
    ToggleLayer,
    /// Deactivates target objects
    HideObject,
    /// Activates target objects
    ShowObject,
    /// Flips the active state of target objects
    ToggleObject,
    /// Suspends the run for a number of seconds
    Delay,
    /// Invokes a named action registered on a target object
    CallMethod,
}

impl NodeType {
    /// Every node type, in palette order
    pub const ALL: [NodeType; 10] = [
        NodeType::TriggerByClick,
        NodeType::TriggerByKey,
        NodeType::ShowLayer,
        NodeType::HideLayer,
        NodeType::ToggleLayer,
        NodeType::ShowObject,
        NodeType::HideObject,
        NodeType::ToggleObject,
        NodeType::Delay,
        NodeType::CallMethod,
    ];

    /// Trigger nodes start runs and are never executed themselves
    pub fn is_trigger(self) -> bool {
        matches!(self, Self::TriggerByClick | Self::TriggerByKey)
    }

    /// Palette category
    pub fn category(self) -> NodeCategory {
        match self {
            Self::TriggerByClick | Self::TriggerByKey => NodeCategory::Trigger,
            Self::HideLayer | Self::ShowLayer | Self::ToggleLayer => NodeCategory::Layer,
            Self::HideObject | Self::ShowObject | Self::ToggleObject => NodeCategory::Object,
            Self::Delay => NodeCategory::Flow,
            Self::CallMethod => NodeCategory::Script,
        }
    }

    /// Default display name
    pub fn display_name(self) -> &'static str {
        match self {
            Self::TriggerByClick => "On Click",
            Self::TriggerByKey => "On Key",
            Self::HideLayer => "Hide Layer",
            Self::ShowLayer => "Show Layer",
            Self::ToggleLayer => "Toggle Layer",
            Self::HideObject => "Hide Object",
            Self::ShowObject => "Show Object",
            Self::ToggleObject => "Toggle Object",
            Self::Delay => "Delay",
            Self::CallMethod => "Call Method",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Node type category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Entry points (click, key)
    Trigger,
    /// Layer visibility
    Layer,
    /// Single object visibility
    Object,
    /// Timing
    Flow,
    /// Calls into game code
    Script,
}

/// Variant-specific configuration of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Run from this node when `target` is clicked
    TriggerByClick {
        /// Clickable object the trigger is attached to
        target: Option<ObjectId>,
    },
    /// Run from this node when `key` is pressed
    TriggerByKey {
        /// Bound key; an unbound trigger never fires
        key: Option<KeyCode>,
    },
    /// Hide layers
    HideLayer {
        /// Layer names
        layers: Vec<String>,
    },
    /// Show layers
    ShowLayer {
        /// Layer names
        layers: Vec<String>,
    },
    /// Toggle layers
    ToggleLayer {
        /// Layer names
        layers: Vec<String>,
    },
    /// Deactivate objects
    HideObject {
        /// Object slots, unassigned slots are ignored
        targets: Vec<Option<ObjectId>>,
    },
    /// Activate objects
    ShowObject {
        /// Object slots, unassigned slots are ignored
        targets: Vec<Option<ObjectId>>,
    },
    /// Flip objects
    ToggleObject {
        /// Object slots, unassigned slots are ignored
        targets: Vec<Option<ObjectId>>,
    },
    /// Wait before continuing
    Delay {
        /// Duration in seconds
        seconds: f32,
    },
    /// Invoke `component.method` registered on `target`
    CallMethod {
        /// Object owning the action
        target: Option<ObjectId>,
        /// Component (type) name the action is registered under
        component: String,
        /// Action name
        method: String,
    },
}

impl NodeKind {
    /// Type tag of this variant
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::TriggerByClick { .. } => NodeType::TriggerByClick,
            Self::TriggerByKey { .. } => NodeType::TriggerByKey,
            Self::HideLayer { .. } => NodeType::HideLayer,
            Self::ShowLayer { .. } => NodeType::ShowLayer,
            Self::ToggleLayer { .. } => NodeType::ToggleLayer,
            Self::HideObject { .. } => NodeType::HideObject,
            Self::ShowObject { .. } => NodeType::ShowObject,
            Self::ToggleObject { .. } => NodeType::ToggleObject,
            Self::Delay { .. } => NodeType::Delay,
            Self::CallMethod { .. } => NodeType::CallMethod,
        }
    }

    /// Unconfigured variant for a type
    pub fn empty(node_type: NodeType) -> Self {
        match node_type {
            NodeType::TriggerByClick => Self::TriggerByClick { target: None },
            NodeType::TriggerByKey => Self::TriggerByKey { key: None },
            NodeType::HideLayer => Self::HideLayer { layers: Vec::new() },
            NodeType::ShowLayer => Self::ShowLayer { layers: Vec::new() },
            NodeType::ToggleLayer => Self::ToggleLayer { layers: Vec::new() },
            NodeType::HideObject => Self::HideObject { targets: Vec::new() },
            NodeType::ShowObject => Self::ShowObject { targets: Vec::new() },
            NodeType::ToggleObject => Self::ToggleObject { targets: Vec::new() },
            NodeType::Delay => Self::Delay { seconds: 0.0 },
            NodeType::CallMethod => Self::CallMethod {
                target: None,
                component: String::new(),
                method: String::new(),
            },
        }
    }

    /// Every scene object this node refers to
    pub fn object_refs(&self) -> Vec<ObjectId> {
        match self {
            Self::TriggerByClick { target } | Self::CallMethod { target, .. } => {
                target.iter().copied().collect()
            }
            Self::HideObject { targets }
            | Self::ShowObject { targets }
            | Self::ToggleObject { targets } => targets.iter().flatten().copied().collect(),
            _ => Vec::new(),
        }
    }
}

/// A node instance in the graph.
///
/// Persisted as one flat record: `id`, `position`, `displayName`, a `type`
/// tag and the variant's own fields inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "NodeRecord", into = "NodeRecord")]
pub struct Node {
    /// Unique ID within the graph
    pub id: NodeId,
    /// Display name (can be customized)
    pub name: String,
    /// Position in the graph UI, authoring only
    pub position: [f32; 2],
    /// Variant configuration
    pub kind: NodeKind,
}

impl Node {
    /// Create a node with a fresh ID and the default display name
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: NodeId::new(),
            name: kind.node_type().display_name().to_string(),
            position: [0.0, 0.0],
            kind,
        }
    }

    /// Replace the ID
    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Type tag of this node
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    /// Shorthand for a click trigger node
    pub fn click(id: impl Into<NodeId>, target: Option<ObjectId>) -> Self {
        Self::new(NodeKind::TriggerByClick { target }).with_id(id)
    }

    /// Shorthand for a key trigger node
    pub fn key(id: impl Into<NodeId>, key: KeyCode) -> Self {
        Self::new(NodeKind::TriggerByKey { key: Some(key) }).with_id(id)
    }

    /// Shorthand for a show layer node
    pub fn show_layer(id: impl Into<NodeId>, layer: &str) -> Self {
        Self::new(NodeKind::ShowLayer { layers: vec![layer.to_string()] }).with_id(id)
    }

    /// Shorthand for a hide layer node
    pub fn hide_layer(id: impl Into<NodeId>, layer: &str) -> Self {
        Self::new(NodeKind::HideLayer { layers: vec![layer.to_string()] }).with_id(id)
    }

    /// Shorthand for a delay node
    pub fn delay(id: impl Into<NodeId>, seconds: f32) -> Self {
        Self::new(NodeKind::Delay { seconds }).with_id(id)
    }
}

/// Flat persisted form of a [`Node`].
///
/// Fields a variant does not use are left out when writing and ignored when
/// reading. Missing variant fields load as empty.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeRecord {
    id: NodeId,
    #[serde(default)]
    position: [f32; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    #[serde(rename = "type")]
    node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<KeyCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    layers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    targets: Option<Vec<Option<ObjectId>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    seconds: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    method: Option<String>,
}

impl NodeRecord {
    fn new(node_type: NodeType, id: NodeId, position: [f32; 2], display_name: String) -> Self {
        Self {
            id,
            position,
            display_name: Some(display_name),
            node_type,
            target: None,
            key: None,
            layers: None,
            targets: None,
            seconds: None,
            component: None,
            method: None,
        }
    }
}

impl From<Node> for NodeRecord {
    fn from(node: Node) -> Self {
        let mut record = Self::new(node.node_type(), node.id, node.position, node.name);
        match node.kind {
            NodeKind::TriggerByClick { target } => record.target = target,
            NodeKind::TriggerByKey { key } => record.key = key,
            NodeKind::HideLayer { layers }
            | NodeKind::ShowLayer { layers }
            | NodeKind::ToggleLayer { layers } => record.layers = Some(layers),
            NodeKind::HideObject { targets }
            | NodeKind::ShowObject { targets }
            | NodeKind::ToggleObject { targets } => record.targets = Some(targets),
            NodeKind::Delay { seconds } => record.seconds = Some(seconds),
            NodeKind::CallMethod {
                target,
                component,
                method,
            } => {
                record.target = target;
                record.component = Some(component);
                record.method = Some(method);
            }
        }
        record
    }
}

impl From<NodeRecord> for Node {
    fn from(record: NodeRecord) -> Self {
        let layers = record.layers.unwrap_or_default();
        let targets = record.targets.unwrap_or_default();
        let kind = match record.node_type {
            NodeType::TriggerByClick => NodeKind::TriggerByClick {
                target: record.target,
            },
            NodeType::TriggerByKey => NodeKind::TriggerByKey { key: record.key },
            NodeType::HideLayer => NodeKind::HideLayer { layers },
            NodeType::ShowLayer => NodeKind::ShowLayer { layers },
            NodeType::ToggleLayer => NodeKind::ToggleLayer { layers },
            NodeType::HideObject => NodeKind::HideObject { targets },
            NodeType::ShowObject => NodeKind::ShowObject { targets },
            NodeType::ToggleObject => NodeKind::ToggleObject { targets },
            NodeType::Delay => NodeKind::Delay {
                seconds: record.seconds.unwrap_or_default(),
            },
            NodeType::CallMethod => NodeKind::CallMethod {
                target: record.target,
                component: record.component.unwrap_or_default(),
                method: record.method.unwrap_or_default(),
            },
        };

        Self {
            id: record.id,
            name: record
                .display_name
                .unwrap_or_else(|| record.node_type.display_name().to_string()),
            position: record.position,
            kind,
        }
    }
}
