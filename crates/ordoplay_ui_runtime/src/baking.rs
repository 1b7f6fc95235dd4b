// SPDX-License-Identifier: MIT OR Apache-2.0
//! Baking against a live scene.

use crate::scene::{SharedGraph, SharedWorld, TriggerBinding};
use crate::targets::TargetRegistry;
use ordoplay_ui_graph::{bake, BakeHost, BakeReport, NodeId, ObjectId};

/// Bake host that mints target ids in the world and attaches click triggers
pub struct SceneBakeHost<'a> {
    world: &'a SharedWorld,
    targets: &'a TargetRegistry,
    graph: &'a SharedGraph,
}

impl<'a> SceneBakeHost<'a> {
    /// Create a host baking `graph` against `world`
    pub fn new(
        world: &'a SharedWorld,
        targets: &'a TargetRegistry,
        graph: &'a SharedGraph,
    ) -> Self {
        Self { world, targets, graph }
    }
}

impl BakeHost for SceneBakeHost<'_> {
    fn target_id(&mut self, object: ObjectId) -> Option<String> {
        self.targets.ensure_target_id(&mut self.world.write(), object)
    }

    fn bind_click_trigger(&mut self, object: ObjectId, node_id: &NodeId) {
        let mut world = self.world.write();
        let Some(scene_object) = world.get_mut(object) else {
            tracing::warn!("Click trigger {node_id} refers to missing object {object}");
            return;
        };
        if scene_object.components.click_trigger.is_some() {
            tracing::debug!("Replacing click trigger on {}", scene_object.name);
        }
        scene_object.components.click_trigger =
            Some(TriggerBinding::new(self.graph.clone(), node_id.clone()));
    }
}

/// Bake a shared graph against the world, replacing its program
pub fn bake_in_world(
    graph: &SharedGraph,
    world: &SharedWorld,
    targets: &TargetRegistry,
) -> BakeReport {
    let mut host = SceneBakeHost::new(world, targets, graph);
    let mut guard = graph.write();
    bake(&mut guard, &mut host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{share_graph, SceneObject, SceneWorld};
    use ordoplay_ui_graph::{Graph, Node, NodeKind};
    use std::sync::Arc;

    #[test]
    fn test_bake_attaches_click_trigger_and_target_ids() {
        let world = SceneWorld::shared();
        let targets = TargetRegistry::new();
        let button = world.write().spawn(SceneObject::new("Main", "Button"));
        let panel = world.write().spawn(SceneObject::new("Main", "Panel"));

        let mut graph = Graph::new("ui");
        graph.add_node(Node::click("open", Some(button)));
        graph.add_node(
            Node::new(NodeKind::ShowObject { targets: vec![Some(panel)] }).with_id("show"),
        );
        graph.connect("open", "show").unwrap();
        let graph = share_graph(graph);

        let report = bake_in_world(&graph, &world, &targets);
        assert_eq!(report.step_count, 2);

        let world = world.read();
        let binding = world.get(button).unwrap().components.click_trigger.clone().unwrap();
        assert!(Arc::ptr_eq(&binding.graph, &graph));
        assert_eq!(binding.node_id.as_str(), "open");

        let panel_id = world.get(panel).unwrap().components.target_id.clone().unwrap();
        assert_eq!(targets.resolve(&panel_id), Some(panel));
        assert_eq!(
            graph.read().baked_program().step_for("show").unwrap().target_ids,
            vec![panel_id]
        );
    }

    #[test]
    fn test_missing_object_reference_is_dropped() {
        let world = SceneWorld::shared();
        let targets = TargetRegistry::new();
        let mut graph = Graph::new("ui");
        graph.add_node(
            Node::new(NodeKind::HideObject { targets: vec![Some(ObjectId::new())] })
                .with_id("hide"),
        );
        let graph = share_graph(graph);

        bake_in_world(&graph, &world, &targets);
        assert!(graph.read().baked_program().step_for("hide").unwrap().target_ids.is_empty());
        assert!(targets.is_empty());
    }
}
