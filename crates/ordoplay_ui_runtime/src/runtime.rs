// SPDX-License-Identifier: MIT OR Apache-2.0
//! The UI flow runtime facade.
//!
//! [`UiFlowRuntime`] owns one instance of every service and keeps their
//! registrations in step with the scene: objects spawned through it register
//! like self-registering components would, and scene load/unload run the bulk
//! passes.

use crate::baking::bake_in_world;
use crate::config::RuntimeConfig;
use crate::events::{EventManager, InputFrame};
use crate::executor::{spawn_run, GraphExecutor, RunFuture, RunSummary};
use crate::layers::LayerManager;
use crate::scene::{SceneObject, SceneWorld, SharedGraph, SharedWorld, TriggerBinding};
use crate::targets::TargetRegistry;
use ordoplay_ui_graph::{BakeReport, ObjectId};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Counts from a scene registration pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneRegistration {
    /// Target components registered
    pub targets: usize,
    /// Layer groups registered
    pub layer_groups: usize,
    /// Key triggers bound
    pub key_triggers: usize,
}

/// Long-lived composition of the UI flow services
#[derive(Debug)]
pub struct UiFlowRuntime {
    config: RuntimeConfig,
    world: SharedWorld,
    targets: Arc<TargetRegistry>,
    layers: Arc<LayerManager>,
    executor: GraphExecutor,
    events: EventManager,
}

impl UiFlowRuntime {
    /// Build the services over an empty world
    pub fn new(config: RuntimeConfig) -> Self {
        let world = SceneWorld::shared();
        let targets = Arc::new(TargetRegistry::new());
        let layers = Arc::new(LayerManager::with_catalog(
            world.clone(),
            config.layers.iter().cloned(),
        ));
        let executor = GraphExecutor::new(world.clone(), targets.clone(), layers.clone());
        let events = EventManager::new(world.clone(), layers.clone(), executor.clone());

        for (action, layer) in &config.cancel_actions {
            events.bind_action(action.as_str(), layer.as_str());
        }

        tracing::info!(
            "UI flow runtime ready ({} declared layers, {} cancel actions)",
            config.layers.len(),
            config.cancel_actions.len()
        );

        Self {
            config,
            world,
            targets,
            layers,
            executor,
            events,
        }
    }

    /// Configuration the runtime was built with
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Shared scene world
    pub fn world(&self) -> &SharedWorld {
        &self.world
    }

    /// Target registry
    pub fn targets(&self) -> &TargetRegistry {
        &self.targets
    }

    /// Layer manager
    pub fn layers(&self) -> &LayerManager {
        &self.layers
    }

    /// Graph executor
    pub fn executor(&self) -> &GraphExecutor {
        &self.executor
    }

    /// Event manager
    pub fn events(&self) -> &EventManager {
        &self.events
    }

    /// Spawn an object and register its components
    pub fn spawn_object(&self, object: SceneObject) -> ObjectId {
        let id = {
            let mut world = self.world.write();
            self.targets.register_object(&object);
            self.layers.register_object(&object);
            world.spawn(object)
        };
        self.events.register_key_trigger(id);
        id
    }

    /// Despawn an object subtree and drop its registrations
    pub fn despawn_object(&self, object: ObjectId) -> usize {
        let removed = self.world.write().despawn(object);
        for scene_object in &removed {
            self.forget(scene_object);
        }
        removed.len()
    }

    /// Spawn a scene's objects and run the scene registration pass
    pub fn load_scene(
        &self,
        scene: &str,
        objects: impl IntoIterator<Item = SceneObject>,
    ) -> SceneRegistration {
        {
            let mut world = self.world.write();
            for object in objects {
                if object.scene != scene {
                    tracing::warn!(
                        "Object {} belongs to scene {}, not {scene}",
                        object.name,
                        object.scene
                    );
                }
                world.spawn(object);
            }
        }
        self.on_scene_loaded(scene)
    }

    /// Register targets, layer groups and key triggers of a loaded scene
    pub fn on_scene_loaded(&self, scene: &str) -> SceneRegistration {
        let (targets, layer_groups) = {
            let world = self.world.read();
            (
                self.targets.register_scene(&world, scene),
                self.layers.register_scene(&world, scene),
            )
        };
        let key_triggers = self.events.register_scene(scene);

        let registration = SceneRegistration {
            targets,
            layer_groups,
            key_triggers,
        };
        tracing::info!("Scene {scene} registered: {registration:?}");
        registration
    }

    /// Drop the key triggers that belonged to an unloading scene
    pub fn on_scene_unloaded(&self, scene: &str) -> usize {
        self.events.unregister_scene(scene)
    }

    /// Remove a scene's objects and their registrations
    pub fn unload_scene(&self, scene: &str) -> usize {
        let removed = self.world.write().unload_scene(scene);
        for scene_object in &removed {
            self.targets.unregister_object(scene_object);
            self.layers.unregister_group(scene_object.id);
        }
        self.on_scene_unloaded(scene);
        tracing::info!("Scene {scene} unloaded ({} objects)", removed.len());
        removed.len()
    }

    fn forget(&self, object: &SceneObject) {
        self.targets.unregister_object(object);
        self.layers.unregister_group(object.id);
        self.events.unregister_object(object.id);
    }

    /// Bake a graph against the live scene
    pub fn bake(&self, graph: &SharedGraph) -> BakeReport {
        bake_in_world(graph, &self.world, &self.targets)
    }

    /// Run every baked step in order
    pub fn run_full(&self, graph: &SharedGraph) -> RunFuture {
        self.executor.run_full(&graph.read())
    }

    /// Run the steps reachable from a trigger node
    pub fn run_from_trigger(&self, graph: &SharedGraph, trigger_id: &str) -> RunFuture {
        self.executor.run_from_trigger(&graph.read(), trigger_id)
    }

    /// Invoke an object's click trigger.
    ///
    /// Needs a tokio runtime; inactive objects and unconfigured triggers do nothing.
    pub fn click(&self, object: ObjectId) -> Option<JoinHandle<RunSummary>> {
        let binding = {
            let world = self.world.read();
            if !world.is_active_in_hierarchy(object) {
                tracing::debug!("Ignoring click on inactive object {object}");
                return None;
            }
            world.get(object)?.components.click_trigger.clone()
        };
        let binding = binding.filter(TriggerBinding::is_configured)?;

        let run = self
            .executor
            .run_from_trigger(&binding.graph.read(), binding.node_id.as_str());
        spawn_run(run)
    }

    /// Process one frame of input
    pub fn tick(&self, frame: &InputFrame) -> Vec<JoinHandle<RunSummary>> {
        self.events.poll(frame)
    }

    /// Clear every binding and registration
    pub fn shutdown(&self) {
        self.events.clear();
        self.layers.clear();
        self.targets.clear();
        tracing::info!("UI flow runtime shut down");
    }
}

impl Default for UiFlowRuntime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}
