// SPDX-License-Identifier: MIT OR Apache-2.0
//! UI behavior graphs for `OrdoPlay`.
//!
//! Designers compose UI behavior (show/hide panels, toggle objects, timed
//! delays, calls into game code) as a directed graph of typed nodes. Baking
//! turns that graph into a linear program of [`ExecutionStep`]s which the
//! runtime interprets, either in full or from a single trigger node.
//!
//! ## Architecture
//!
//! - [`Node`]s are a closed set of variants ([`NodeKind`])
//! - [`Connection`]s are plain directed edges between node ids
//! - [`bake()`] orders and compiles nodes through a [`BakeHost`], which gives
//!   scene objects stable target ids and wires click triggers
//! - The [`BakedProgram`] is stored with the [`Graph`] and persisted with it

pub mod asset;
pub mod bake;
pub mod catalog;
pub mod connection;
pub mod graph;
pub mod key;
pub mod node;
pub mod step;

pub use asset::AssetError;
pub use bake::{bake, BakeHost, BakeReport};
pub use catalog::{create_ui_flow_catalog, NodeCatalog, NodeDescriptor};
pub use connection::Connection;
pub use graph::{ConnectionError, Graph, GraphDiagnostic};
pub use key::KeyCode;
pub use node::{Node, NodeCategory, NodeId, NodeKind, NodeType, ObjectId};
pub use step::{param, BakedProgram, ExecutionStep};
