// SPDX-License-Identifier: MIT OR Apache-2.0
//! Live scene objects the UI flow acts on.
//!
//! Objects form parent/child hierarchies per loaded scene. The flow only
//! cares about a handful of components: a stable target id, layer group
//! membership, key and click triggers, and the table of named actions that
//! `CallMethod` steps invoke.

use indexmap::IndexMap;
use ordoplay_ui_graph::{Graph, NodeId, ObjectId};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// World shared between the runtime services
pub type SharedWorld = Arc<RwLock<SceneWorld>>;

/// Graph shared between the runtime and the trigger components referring to it
pub type SharedGraph = Arc<RwLock<Graph>>;

/// Wrap a graph for sharing
pub fn share_graph(graph: Graph) -> SharedGraph {
    Arc::new(RwLock::new(graph))
}

/// Zero-argument callback registered on an object
#[derive(Clone)]
pub struct Action(Arc<dyn Fn() + Send + Sync>);

impl Action {
    /// Wrap a callback
    pub fn new(callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(callback))
    }

    /// Invoke the callback
    pub fn invoke(&self) {
        (self.0)();
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Action")
    }
}

/// Named actions an object exposes, keyed by component and method name
#[derive(Debug, Clone, Default)]
pub struct ActionTable {
    actions: IndexMap<(String, String), Action>,
}

impl ActionTable {
    /// Register (or replace) an action
    pub fn register(&mut self, component: &str, method: &str, action: Action) {
        self.actions
            .insert((component.to_string(), method.to_string()), action);
    }

    /// Remove an action
    pub fn unregister(&mut self, component: &str, method: &str) -> Option<Action> {
        self.actions
            .shift_remove(&(component.to_string(), method.to_string()))
    }

    /// Look up an action.
    ///
    /// A blank component matches the first action registered under `method`.
    pub fn get(&self, component: &str, method: &str) -> Option<&Action> {
        if component.trim().is_empty() {
            return self
                .actions
                .iter()
                .find(|((_, m), _)| m == method)
                .map(|(_, action)| action);
        }
        self.actions
            .get(&(component.to_string(), method.to_string()))
    }

    /// Number of registered actions
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether no action is registered
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// A graph node a trigger component starts runs from
#[derive(Debug, Clone)]
pub struct TriggerBinding {
    /// Graph to run
    pub graph: SharedGraph,
    /// Trigger node in that graph
    pub node_id: NodeId,
}

impl TriggerBinding {
    /// Create a binding
    pub fn new(graph: SharedGraph, node_id: impl Into<NodeId>) -> Self {
        Self {
            graph,
            node_id: node_id.into(),
        }
    }

    /// Whether the binding names a node at all
    pub fn is_configured(&self) -> bool {
        !self.node_id.is_blank()
    }
}

/// Components the UI flow reads from or attaches to an object
#[derive(Debug, Clone, Default)]
pub struct Components {
    /// Stable target id, minted at bake time
    pub target_id: Option<String>,
    /// Layer this object is a group of
    pub layer_group: Option<String>,
    /// Key trigger, discovered by the scene scan
    pub key_trigger: Option<TriggerBinding>,
    /// Click trigger, attached at bake time
    pub click_trigger: Option<TriggerBinding>,
    /// Actions for `CallMethod` steps
    pub actions: ActionTable,
}

/// An object in a loaded scene
#[derive(Debug, Clone)]
pub struct SceneObject {
    /// Unique object ID
    pub id: ObjectId,
    /// Display name
    pub name: String,
    /// Owning scene
    pub scene: String,
    /// Parent object
    pub parent: Option<ObjectId>,
    /// Own active flag; the object is live only if every ancestor is active too
    pub active_self: bool,
    /// Attached components
    pub components: Components,
}

impl SceneObject {
    /// Create an active root object
    pub fn new(scene: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ObjectId::new(),
            name: name.into(),
            scene: scene.into(),
            parent: None,
            active_self: true,
            components: Components::default(),
        }
    }

    /// Replace the ID
    pub fn with_id(mut self, id: ObjectId) -> Self {
        self.id = id;
        self
    }

    /// Set the parent
    pub fn with_parent(mut self, parent: ObjectId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Start inactive
    pub fn inactive(mut self) -> Self {
        self.active_self = false;
        self
    }

    /// Attach a stable target id
    pub fn with_target_id(mut self, target_id: impl Into<String>) -> Self {
        self.components.target_id = Some(target_id.into());
        self
    }

    /// Make this object a group of `layer`
    pub fn with_layer_group(mut self, layer: impl Into<String>) -> Self {
        self.components.layer_group = Some(layer.into());
        self
    }

    /// Attach a key trigger
    pub fn with_key_trigger(mut self, graph: SharedGraph, node_id: impl Into<NodeId>) -> Self {
        self.components.key_trigger = Some(TriggerBinding::new(graph, node_id));
        self
    }

    /// Register a named action
    pub fn with_action(
        mut self,
        component: &str,
        method: &str,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.components
            .actions
            .register(component, method, Action::new(callback));
        self
    }
}

/// All objects of every loaded scene
#[derive(Debug, Default)]
pub struct SceneWorld {
    objects: IndexMap<ObjectId, SceneObject>,
}

impl SceneWorld {
    /// Create an empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty shared world
    pub fn shared() -> SharedWorld {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Insert an object, replacing any object with the same ID
    pub fn spawn(&mut self, object: SceneObject) -> ObjectId {
        let id = object.id;
        self.objects.insert(id, object);
        id
    }

    /// Remove an object and its descendants, returning them root first
    pub fn despawn(&mut self, id: ObjectId) -> Vec<SceneObject> {
        if !self.objects.contains_key(&id) {
            return Vec::new();
        }

        let mut doomed = vec![id];
        let mut cursor = 0;
        while cursor < doomed.len() {
            let children: Vec<_> = self
                .children(doomed[cursor])
                .filter(|c| !doomed.contains(c))
                .collect();
            doomed.extend(children);
            cursor += 1;
        }

        doomed
            .into_iter()
            .filter_map(|id| self.objects.shift_remove(&id))
            .collect()
    }

    /// Remove every object of a scene
    pub fn unload_scene(&mut self, scene: &str) -> Vec<SceneObject> {
        let ids: Vec<_> = self.objects_in_scene(scene).map(|o| o.id).collect();
        ids.into_iter()
            .filter_map(|id| self.objects.shift_remove(&id))
            .collect()
    }

    /// Get an object
    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    /// Get a mutable object
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(&id)
    }

    /// Whether an object exists
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the world is empty
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// All objects in spawn order
    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.values()
    }

    /// Objects of one scene, active or not
    pub fn objects_in_scene<'a>(
        &'a self,
        scene: &'a str,
    ) -> impl Iterator<Item = &'a SceneObject> + 'a {
        self.objects.values().filter(move |o| o.scene == scene)
    }

    /// Direct children of an object
    pub fn children(&self, id: ObjectId) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects
            .values()
            .filter(move |o| o.parent == Some(id))
            .map(|o| o.id)
    }

    /// Set an object's own active flag. Returns false if the object is gone.
    pub fn set_active(&mut self, id: ObjectId, active: bool) -> bool {
        match self.objects.get_mut(&id) {
            Some(object) => {
                object.active_self = active;
                true
            }
            None => false,
        }
    }

    /// Flip an object's own active flag, returning the new state
    pub fn toggle_active(&mut self, id: ObjectId) -> Option<bool> {
        let object = self.objects.get_mut(&id)?;
        object.active_self = !object.active_self;
        Some(object.active_self)
    }

    /// Own active flag
    pub fn is_active_self(&self, id: ObjectId) -> bool {
        self.objects.get(&id).is_some_and(|o| o.active_self)
    }

    /// Whether the object and all of its ancestors are active
    pub fn is_active_in_hierarchy(&self, id: ObjectId) -> bool {
        let mut current = Some(id);
        // Bounded by the object count so a malformed parent cycle cannot spin.
        for _ in 0..=self.objects.len() {
            let Some(id) = current else {
                return true;
            };
            match self.objects.get(&id) {
                Some(object) if object.active_self => current = object.parent,
                _ => return false,
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_active_in_hierarchy() {
        let mut world = SceneWorld::new();
        let root = world.spawn(SceneObject::new("Main", "Canvas"));
        let panel = world.spawn(SceneObject::new("Main", "Panel").with_parent(root));
        let label = world.spawn(SceneObject::new("Main", "Label").with_parent(panel));

        assert!(world.is_active_in_hierarchy(label));
        world.set_active(root, false);
        assert!(!world.is_active_in_hierarchy(label));
        assert!(world.is_active_self(label));
    }

    #[test]
    fn test_despawn_removes_subtree() {
        let mut world = SceneWorld::new();
        let root = world.spawn(SceneObject::new("Main", "Canvas"));
        let panel = world.spawn(SceneObject::new("Main", "Panel").with_parent(root));
        world.spawn(SceneObject::new("Main", "Label").with_parent(panel));
        let other = world.spawn(SceneObject::new("Main", "Other"));

        let removed = world.despawn(root);
        assert_eq!(removed.len(), 3);
        assert_eq!(removed[0].id, root);
        assert_eq!(world.len(), 1);
        assert!(world.contains(other));
    }

    #[test]
    fn test_unload_scene() {
        let mut world = SceneWorld::new();
        world.spawn(SceneObject::new("Main", "A"));
        world.spawn(SceneObject::new("Shop", "B"));
        world.spawn(SceneObject::new("Shop", "C").inactive());

        let removed = world.unload_scene("Shop");
        assert_eq!(removed.len(), 2);
        assert_eq!(world.objects().map(|o| o.name.as_str()).collect::<Vec<_>>(), vec!["A"]);
    }

    #[test]
    fn test_action_lookup() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let object = SceneObject::new("Main", "Shop").with_action("Shop", "open", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let actions = &object.components.actions;

        actions.get("Shop", "open").unwrap().invoke();
        actions.get("", "open").unwrap().invoke();
        assert!(actions.get("Bank", "open").is_none());
        assert!(actions.get("Shop", "close").is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
