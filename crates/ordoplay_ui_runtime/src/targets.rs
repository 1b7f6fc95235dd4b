// SPDX-License-Identifier: MIT OR Apache-2.0
//! Target registry: stable ids to live scene objects.
//!
//! Baked programs refer to objects only through target ids. Ids are minted
//! the first time a node references an object and stay with the object's
//! target component for its whole lifetime.

use crate::scene::{SceneObject, SceneWorld};
use ordoplay_ui_graph::ObjectId;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// Maps stable target ids to objects.
///
/// Deactivating an object keeps its mapping, so a hidden object can still be
/// shown again. Mappings go away on despawn or scene unload.
#[derive(Debug, Default)]
pub struct TargetRegistry {
    targets: RwLock<HashMap<String, ObjectId>>,
}

impl TargetRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `id` to `object`, replacing any previous mapping.
    ///
    /// Blank ids are rejected.
    pub fn register(&self, id: &str, object: ObjectId) -> bool {
        if id.trim().is_empty() {
            tracing::debug!("Ignoring blank target id for {object}");
            return false;
        }
        self.targets.write().insert(id.to_string(), object);
        true
    }

    /// Remove a mapping
    pub fn unregister(&self, id: &str) -> Option<ObjectId> {
        self.targets.write().remove(id)
    }

    /// Look up the object behind an id
    pub fn resolve(&self, id: &str) -> Option<ObjectId> {
        if id.trim().is_empty() {
            return None;
        }
        self.targets.read().get(id).copied()
    }

    /// Number of registered targets
    pub fn len(&self) -> usize {
        self.targets.read().len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.targets.read().is_empty()
    }

    /// Drop every mapping
    pub fn clear(&self) {
        self.targets.write().clear();
    }

    /// Register an object's target component, if it has one
    pub fn register_object(&self, object: &SceneObject) -> bool {
        match &object.components.target_id {
            Some(id) => self.register(id, object.id),
            None => false,
        }
    }

    /// Remove an object's target component mapping
    pub fn unregister_object(&self, object: &SceneObject) {
        let Some(id) = &object.components.target_id else {
            return;
        };
        // Only drop the mapping if it still points at this object.
        let mut targets = self.targets.write();
        if targets.get(id) == Some(&object.id) {
            targets.remove(id);
        }
    }

    /// Register every tagged object of a scene, active or not
    pub fn register_scene(&self, world: &SceneWorld, scene: &str) -> usize {
        let count = world
            .objects_in_scene(scene)
            .filter(|object| self.register_object(object))
            .count();
        tracing::debug!("Registered {count} targets in scene {scene}");
        count
    }

    /// Target id of `object`, minting and attaching one if it has none yet
    pub fn ensure_target_id(&self, world: &mut SceneWorld, object: ObjectId) -> Option<String> {
        let Some(scene_object) = world.get_mut(object) else {
            tracing::warn!("Cannot assign a target id to missing object {object}");
            return None;
        };

        let id = match &scene_object.components.target_id {
            Some(id) if !id.trim().is_empty() => id.clone(),
            _ => {
                let id = Uuid::new_v4().to_string();
                tracing::debug!("Minted target id {id} for {}", scene_object.name);
                scene_object.components.target_id = Some(id.clone());
                id
            }
        };

        self.register(&id, object);
        Some(id)
    }
}
