// SPDX-License-Identifier: MIT OR Apache-2.0
//! Layer manager: named visibility groups.
//!
//! A layer is a name; its groups are the root objects of the subtrees that
//! belong to it. Showing or hiding a layer sets every group's own active flag.

use crate::scene::{SceneObject, SceneWorld, SharedWorld};
use indexmap::{IndexMap, IndexSet};
use ordoplay_ui_graph::ObjectId;
use parking_lot::RwLock;

/// Layer name meaning "no layer"
pub const NONE_LAYER: &str = "none";

/// Tracks layer groups and switches their visibility
#[derive(Debug)]
pub struct LayerManager {
    world: SharedWorld,
    /// Declared layer names; empty accepts any name
    catalog: IndexSet<String>,
    groups: RwLock<IndexMap<String, IndexSet<ObjectId>>>,
}

impl LayerManager {
    /// Create a manager that accepts any layer name
    pub fn new(world: SharedWorld) -> Self {
        Self::with_catalog(world, Vec::<String>::new())
    }

    /// Create a manager restricted to declared layer names
    pub fn with_catalog(
        world: SharedWorld,
        layers: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let catalog = layers
            .into_iter()
            .map(Into::into)
            .filter(|name: &String| !name.trim().is_empty())
            .collect();
        Self {
            world,
            catalog,
            groups: RwLock::new(IndexMap::new()),
        }
    }

    /// Parse a layer name into its canonical key.
    ///
    /// Blank names, the `none` sentinel and names outside a non-empty catalog
    /// do not parse.
    pub fn parse_layer(&self, name: &str) -> Option<String> {
        let name = name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case(NONE_LAYER) {
            return None;
        }
        if self.catalog.is_empty() {
            return Some(name.to_string());
        }
        self.catalog
            .iter()
            .find(|declared| declared.eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Add a group to a layer. Duplicate registrations are ignored.
    pub fn register_group(&self, layer: &str, object: ObjectId) -> bool {
        let Some(key) = self.parse_layer(layer) else {
            tracing::debug!("Not registering group {object}: unknown layer {layer:?}");
            return false;
        };
        self.groups.write().entry(key).or_default().insert(object)
    }

    /// Remove a group from every layer
    pub fn unregister_group(&self, object: ObjectId) {
        let mut groups = self.groups.write();
        for members in groups.values_mut() {
            members.shift_remove(&object);
        }
        groups.retain(|_, members| !members.is_empty());
    }

    /// Register an object's layer group component, if it has one
    pub fn register_object(&self, object: &SceneObject) -> bool {
        match &object.components.layer_group {
            Some(layer) => self.register_group(layer, object.id),
            None => false,
        }
    }

    /// Register every layer group of a scene, active or not
    pub fn register_scene(&self, world: &SceneWorld, scene: &str) -> usize {
        let count = world
            .objects_in_scene(scene)
            .filter(|object| self.register_object(object))
            .count();
        tracing::debug!("Registered {count} layer groups in scene {scene}");
        count
    }

    /// Groups registered under a layer
    pub fn groups(&self, layer: &str) -> Vec<ObjectId> {
        let Some(key) = self.parse_layer(layer) else {
            return Vec::new();
        };
        self.groups
            .read()
            .get(&key)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Layers with at least one group
    pub fn layers(&self) -> Vec<String> {
        self.groups.read().keys().cloned().collect()
    }

    /// Show every group of a layer
    pub fn show(&self, layer: &str) -> bool {
        self.set_visible(layer, true)
    }

    /// Hide every group of a layer
    pub fn hide(&self, layer: &str) -> bool {
        self.set_visible(layer, false)
    }

    /// Set every group of a layer active or inactive.
    ///
    /// Returns false for names that do not resolve to a layer with groups.
    pub fn set_visible(&self, layer: &str, visible: bool) -> bool {
        let members = self.groups(layer);
        if members.is_empty() {
            tracing::debug!("Layer {layer:?} has no registered groups");
            return false;
        }

        let mut world = self.world.write();
        for object in members {
            world.set_active(object, visible);
        }
        true
    }

    /// Toggle each layer as one unit: hidden if any group is visible, shown otherwise.
    ///
    /// Returns the number of layers that were switched.
    pub fn toggle<S: AsRef<str>>(&self, layers: &[S]) -> usize {
        let mut switched = 0;
        for layer in layers {
            let layer = layer.as_ref();
            let visible = self.is_visible(layer);
            if self.set_visible(layer, !visible) {
                switched += 1;
            }
        }
        switched
    }

    /// Whether any group of a layer is active
    pub fn is_visible(&self, layer: &str) -> bool {
        let members = self.groups(layer);
        let world = self.world.read();
        members.into_iter().any(|object| world.is_active_self(object))
    }

    /// Forget every group
    pub fn clear(&self) {
        self.groups.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (SharedWorld, LayerManager, Vec<ObjectId>) {
        let world = SceneWorld::shared();
        let ids = {
            let mut w = world.write();
            vec![
                w.spawn(SceneObject::new("Main", "Bag").with_layer_group("Inventory")),
                w.spawn(SceneObject::new("Main", "Equip").with_layer_group("Inventory").inactive()),
                w.spawn(SceneObject::new("Main", "Map").with_layer_group("Map").inactive()),
            ]
        };
        let layers = LayerManager::new(world.clone());
        layers.register_scene(&world.read(), "Main");
        (world, layers, ids)
    }

    #[test]
    fn test_show_then_hide() {
        let (world, layers, ids) = setup();
        assert!(layers.show("Inventory"));
        assert!(world.read().is_active_self(ids[1]));
        assert!(layers.hide("Inventory"));
        let world = world.read();
        assert!(!world.is_active_self(ids[0]));
        assert!(!world.is_active_self(ids[1]));
    }

    #[test]
    fn test_toggle_treats_layer_as_unit() {
        let (world, layers, ids) = setup();

        // One of two groups visible: the whole layer hides
        assert_eq!(layers.toggle(&["Inventory"]), 1);
        assert!(!layers.is_visible("Inventory"));

        // None visible: the whole layer shows
        layers.toggle(&["Inventory"]);
        let world = world.read();
        assert!(world.is_active_self(ids[0]));
        assert!(world.is_active_self(ids[1]));
    }

    #[test]
    fn test_toggle_each_key_independently() {
        let (_world, layers, _ids) = setup();
        assert_eq!(layers.toggle(&["Inventory", "Map", "none", "Missing"]), 2);
        assert!(!layers.is_visible("Inventory"));
        assert!(layers.is_visible("Map"));
    }

    #[test]
    fn test_unknown_and_none_are_noops() {
        let (_world, layers, _ids) = setup();
        assert!(!layers.show("Missing"));
        assert!(!layers.hide("none"));
        assert!(!layers.show("NONE"));
    }

    #[test]
    fn test_duplicate_registration_ignored() {
        let (_world, layers, ids) = setup();
        assert!(!layers.register_group("Inventory", ids[0]));
        assert_eq!(layers.groups("Inventory").len(), 2);
    }

    #[test]
    fn test_catalog_restricts_and_canonicalizes() {
        let world = SceneWorld::shared();
        let bag = world.write().spawn(SceneObject::new("Main", "Bag").inactive());
        let layers = LayerManager::with_catalog(world.clone(), ["Inventory"]);

        assert_eq!(layers.parse_layer(" inventory "), Some("Inventory".to_string()));
        assert_eq!(layers.parse_layer("Map"), None);
        assert!(!layers.register_group("Map", bag));
        assert!(layers.register_group("inventory", bag));
        assert!(layers.show("INVENTORY"));
        assert!(world.read().is_active_self(bag));
    }

    #[test]
    fn test_unregister_group() {
        let (_world, layers, ids) = setup();
        layers.unregister_group(ids[2]);
        assert!(layers.groups("Map").is_empty());
        assert_eq!(layers.layers(), vec!["Inventory".to_string()]);
    }
}
