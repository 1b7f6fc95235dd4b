// SPDX-License-Identifier: MIT OR Apache-2.0
//! Bake compiler: turns a graph into a linear, serializable program.
//!
//! Nodes are ordered by a depth-first walk from every root (a node with no
//! live incoming edge), appending each node the first time it is reached.
//! Nodes the walk never reaches, either isolated or only reachable through a
//! cycle, follow in authoring order. Each ordered node is then compiled into an
//! [`ExecutionStep`].
//!
//! The pre-order walk does not guarantee that every predecessor of a node with
//! several incoming edges lands before it. Such edges are reported in
//! [`BakeReport::ordering_violations`] and left as they are.

use crate::graph::Graph;
use crate::node::{Node, NodeId, NodeKind, ObjectId};
use crate::step::{param, BakedProgram, ExecutionStep};
use std::collections::HashMap;

/// Services the compiler needs from the scene while baking
pub trait BakeHost {
    /// Stable target id of `object`, minting and attaching one if it has none.
    ///
    /// `None` when the object does not exist; the reference is then dropped.
    fn target_id(&mut self, object: ObjectId) -> Option<String>;

    /// Attach (or replace) the click callback on `object` so that clicking it
    /// starts a triggered run from `node_id`.
    fn bind_click_trigger(&mut self, object: ObjectId, node_id: &NodeId);
}

/// Outcome of a bake
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BakeReport {
    /// Number of steps in the new program
    pub step_count: usize,
    /// Nodes that produced no step
    pub omitted: Vec<NodeId>,
    /// Live edges whose target step precedes its source step
    pub ordering_violations: Vec<(NodeId, NodeId)>,
}

/// Bake `graph`, replacing any previous program.
///
/// Never fails: nodes that cannot be compiled are left out of the program.
pub fn bake(graph: &mut Graph, host: &mut dyn BakeHost) -> BakeReport {
    for diagnostic in graph.diagnostics() {
        tracing::debug!(graph = %graph.name, "{diagnostic}");
    }

    let order = bake_order(graph);
    let mut steps = Vec::with_capacity(order.len());
    let mut omitted = Vec::new();

    for index in order {
        let node = &graph.nodes()[index];
        match compile_node(node, host) {
            Some(step) => steps.push(step),
            None => omitted.push(node.id.clone()),
        }
    }

    let program = BakedProgram::new(steps);
    let ordering_violations = ordering_violations(graph, &program);
    for (from, to) in &ordering_violations {
        tracing::debug!(
            graph = %graph.name,
            "Step for {to} is baked before its predecessor {from}"
        );
    }

    let report = BakeReport {
        step_count: program.len(),
        omitted,
        ordering_violations,
    };
    graph.set_baked_program(program);

    tracing::info!(
        graph = %graph.name,
        steps = report.step_count,
        omitted = report.omitted.len(),
        "Baked graph"
    );
    report
}

/// Node indices in bake order
pub fn bake_order(graph: &Graph) -> Vec<usize> {
    let nodes = graph.nodes();
    let mut index_of: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
    for (index, node) in nodes.iter().enumerate() {
        index_of.entry(node.id.as_str()).or_insert(index);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for connection in graph.connections() {
        let from = index_of.get(connection.from_id.as_str());
        let to = index_of.get(connection.to_id.as_str());
        if let (Some(&from), Some(&to)) = (from, to) {
            children[from].push(to);
        }
    }

    let mut visited = vec![false; nodes.len()];
    let mut order = Vec::with_capacity(nodes.len());

    let roots = graph
        .roots()
        .filter_map(|node| index_of.get(node.id.as_str()).copied());
    for root in roots {
        // Explicit stack; children are pushed reversed so they pop in edge order.
        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            if visited[index] {
                continue;
            }
            visited[index] = true;
            order.push(index);
            stack.extend(children[index].iter().rev().filter(|&&c| !visited[c]));
        }
    }

    order.extend((0..nodes.len()).filter(|&i| !visited[i]));
    order
}

/// Compile one node into its step
pub fn compile_node(node: &Node, host: &mut dyn BakeHost) -> Option<ExecutionStep> {
    if node.id.is_blank() {
        return None;
    }

    let step = ExecutionStep::new(node.node_type(), node.id.clone());
    match &node.kind {
        NodeKind::TriggerByClick { target } => {
            let Some(object) = *target else {
                return Some(step);
            };
            let step = step.with_targets(host.target_id(object));
            host.bind_click_trigger(object, &node.id);
            Some(step)
        }
        NodeKind::TriggerByKey { key } => Some(match key {
            Some(key) => step.with_string(param::KEY, key.to_string()),
            None => step,
        }),
        NodeKind::HideLayer { layers }
        | NodeKind::ShowLayer { layers }
        | NodeKind::ToggleLayer { layers } => Some(step.with_layers(
            layers
                .iter()
                .map(|layer| layer.trim())
                .filter(|layer| !layer.is_empty())
                .map(str::to_string),
        )),
        NodeKind::HideObject { targets }
        | NodeKind::ShowObject { targets }
        | NodeKind::ToggleObject { targets } => Some(
            step.with_targets(targets.iter().flatten().filter_map(|&o| host.target_id(o))),
        ),
        NodeKind::Delay { seconds } => Some(step.with_float(param::SECONDS, *seconds)),
        NodeKind::CallMethod { target, component, method } => {
            if method.trim().is_empty() {
                return None;
            }
            let step = step
                .with_string(param::COMPONENT, component.trim())
                .with_string(param::METHOD, method.trim());
            Some(match *target {
                Some(object) => step.with_targets(host.target_id(object)),
                None => step,
            })
        }
    }
}

fn ordering_violations(graph: &Graph, program: &BakedProgram) -> Vec<(NodeId, NodeId)> {
    let position: HashMap<&str, usize> = program
        .iter()
        .enumerate()
        .map(|(i, step)| (step.node_id.as_str(), i))
        .collect();

    graph
        .connections()
        .iter()
        .filter_map(|c| {
            let from = position.get(c.from_id.as_str())?;
            let to = position.get(c.to_id.as_str())?;
            (to < from).then(|| (c.from_id.clone(), c.to_id.clone()))
        })
        .collect()
}
