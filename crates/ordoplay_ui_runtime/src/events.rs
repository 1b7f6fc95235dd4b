// SPDX-License-Identifier: MIT OR Apache-2.0
//! Input bindings that decide when triggered runs start.
//!
//! Key triggers are objects carrying a key trigger component; the key they
//! answer to is read from the trigger node in their graph. Input actions
//! (cancel, close) are bound straight to a layer that gets hidden when the
//! action is performed.

use crate::executor::{spawn_run, GraphExecutor, RunSummary};
use crate::layers::LayerManager;
use crate::scene::{SharedWorld, TriggerBinding};
use indexmap::IndexMap;
use ordoplay_ui_graph::{KeyCode, NodeKind, ObjectId};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Input observed during one frame
#[derive(Debug, Clone, Default)]
pub struct InputFrame {
    pressed: HashSet<KeyCode>,
    performed: Vec<String>,
}

impl InputFrame {
    /// Create an empty frame
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a key as pressed this frame
    pub fn press(mut self, key: KeyCode) -> Self {
        self.pressed.insert(key);
        self
    }

    /// Mark an input action as performed this frame
    pub fn perform(mut self, action: impl Into<String>) -> Self {
        self.performed.push(action.into());
        self
    }

    /// Whether a key went down this frame
    pub fn was_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    /// Actions performed this frame, in order
    pub fn performed_actions(&self) -> &[String] {
        &self.performed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct KeyBinding {
    object: ObjectId,
    scene: String,
}

/// Binds keys and input actions to the executor and layers
#[derive(Debug)]
pub struct EventManager {
    world: SharedWorld,
    layers: Arc<LayerManager>,
    executor: GraphExecutor,
    key_bindings: Mutex<IndexMap<KeyCode, Vec<KeyBinding>>>,
    action_bindings: Mutex<IndexMap<String, String>>,
}

impl EventManager {
    /// Create a manager with no bindings
    pub fn new(world: SharedWorld, layers: Arc<LayerManager>, executor: GraphExecutor) -> Self {
        Self {
            world,
            layers,
            executor,
            key_bindings: Mutex::new(IndexMap::new()),
            action_bindings: Mutex::new(IndexMap::new()),
        }
    }

    /// Bind an object's key trigger component.
    ///
    /// Returns the bound key, or `None` when the object has no usable trigger.
    pub fn register_key_trigger(&self, object: ObjectId) -> Option<KeyCode> {
        let (binding, scene) = {
            let world = self.world.read();
            let scene_object = world.get(object)?;
            let binding = scene_object.components.key_trigger.clone()?;
            (binding, scene_object.scene.clone())
        };

        let Some(key) = trigger_key(&binding) else {
            tracing::warn!("Key trigger on {object} does not name a key trigger node");
            return None;
        };

        let mut bindings = self.key_bindings.lock();
        let entry = bindings.entry(key).or_default();
        if !entry.iter().any(|b| b.object == object) {
            entry.push(KeyBinding { object, scene });
        }
        Some(key)
    }

    /// Bind every key trigger of a scene, active or not
    pub fn register_scene(&self, scene: &str) -> usize {
        let objects: Vec<ObjectId> = self
            .world
            .read()
            .objects_in_scene(scene)
            .filter(|o| o.components.key_trigger.is_some())
            .map(|o| o.id)
            .collect();

        let count = objects
            .into_iter()
            .filter_map(|object| self.register_key_trigger(object))
            .count();
        tracing::debug!("Registered {count} key triggers in scene {scene}");
        count
    }

    /// Unbind one object's key trigger
    pub fn unregister_object(&self, object: ObjectId) {
        self.remove_key_bindings(|b| b.object == object);
    }

    /// Unbind the key triggers that belong to a scene
    pub fn unregister_scene(&self, scene: &str) -> usize {
        let removed = self.remove_key_bindings(|b| b.scene == scene);
        tracing::debug!("Unregistered {removed} key triggers of scene {scene}");
        removed
    }

    fn remove_key_bindings(&self, mut doomed: impl FnMut(&KeyBinding) -> bool) -> usize {
        let mut bindings = self.key_bindings.lock();
        let mut removed = 0;
        for list in bindings.values_mut() {
            let before = list.len();
            list.retain(|b| !doomed(b));
            removed += before - list.len();
        }
        bindings.retain(|_, list| !list.is_empty());
        removed
    }

    /// Number of objects bound to a key
    pub fn key_binding_count(&self, key: KeyCode) -> usize {
        self.key_bindings.lock().get(&key).map_or(0, Vec::len)
    }

    /// Hide `layer` whenever `action` is performed. Rebinding replaces the old layer.
    pub fn bind_action(&self, action: impl Into<String>, layer: impl Into<String>) {
        let action = action.into();
        let layer = layer.into();
        if let Some(previous) = self.action_bindings.lock().insert(action.clone(), layer.clone()) {
            tracing::debug!("Rebinding action {action}: {previous} -> {layer}");
        }
    }

    /// Remove an action binding
    pub fn unbind_action(&self, action: &str) -> Option<String> {
        self.action_bindings.lock().shift_remove(action)
    }

    /// Layer an action is bound to
    pub fn action_layer(&self, action: &str) -> Option<String> {
        self.action_bindings.lock().get(action).cloned()
    }

    /// React to an action's performed transition
    pub fn handle_action_performed(&self, action: &str) -> bool {
        let Some(layer) = self.action_layer(action) else {
            return false;
        };
        self.layers.hide(&layer)
    }

    /// Process one frame of input, starting a triggered run for every live
    /// key trigger whose key went down.
    pub fn poll(&self, frame: &InputFrame) -> Vec<JoinHandle<RunSummary>> {
        let fired: Vec<ObjectId> = self
            .key_bindings
            .lock()
            .iter()
            .filter(|(key, _)| frame.was_pressed(**key))
            .flat_map(|(_, list)| list.iter().map(|b| b.object))
            .collect();

        let mut runs = Vec::new();
        for object in fired {
            let binding = {
                let world = self.world.read();
                if !world.is_active_in_hierarchy(object) {
                    continue;
                }
                world.get(object).and_then(|o| o.components.key_trigger.clone())
            };
            let Some(binding) = binding.filter(TriggerBinding::is_configured) else {
                tracing::debug!("Key trigger on {object} is not configured");
                continue;
            };

            let run = self
                .executor
                .run_from_trigger(&binding.graph.read(), binding.node_id.as_str());
            runs.extend(spawn_run(run));
        }

        for action in frame.performed_actions() {
            self.handle_action_performed(action);
        }

        runs
    }

    /// Drop every key and action binding
    pub fn clear(&self) {
        self.key_bindings.lock().clear();
        self.action_bindings.lock().clear();
    }
}

fn trigger_key(binding: &TriggerBinding) -> Option<KeyCode> {
    if !binding.is_configured() {
        return None;
    }
    match binding.graph.read().node(binding.node_id.as_str())?.kind {
        NodeKind::TriggerByKey { key } => key,
        _ => None,
    }
}
