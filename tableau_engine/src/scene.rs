//! Scenes own their actors and layers.
//!
//! Actors live in an insertion-ordered table so that per-frame proximity checks,
//! and therefore the order in which enter/exit verbs fire, are deterministic.

use crate::actor::{Actor, Crossing};
use crate::geometry::Vec2;
use crate::verb::VerbManager;

use anyhow::{Result, bail};
use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use std::collections::HashMap;

/// A named drawing/interaction layer listing the ids of the actors on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneLayer {
    pub name: String,
    pub visible: bool,
    pub dynamic: bool,
    pub actors: Vec<String>,
}

impl SceneLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            dynamic: false,
            actors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    pub state: Option<String>,
    pub verbs: VerbManager,
    actors: IndexMap<String, Actor>,
    /// Top-most layer first.
    pub layers: Vec<SceneLayer>,
    pub properties: HashMap<String, String>,
}

impl Scene {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: None,
            verbs: VerbManager::new(),
            actors: IndexMap::new(),
            layers: Vec::new(),
            properties: HashMap::new(),
        }
    }

    pub fn add_layer(&mut self, layer: SceneLayer) {
        self.layers.push(layer);
    }

    pub fn layer(&self, name: &str) -> Option<&SceneLayer> {
        self.layers.iter().find(|l| l.name == name)
    }

    fn layer_entry(&mut self, name: &str) -> &mut SceneLayer {
        if let Some(pos) = self.layers.iter().position(|l| l.name == name) {
            return &mut self.layers[pos];
        }
        debug!("scene '{}': creating layer '{name}'", self.id);
        self.layers.push(SceneLayer::new(name));
        let last = self.layers.len() - 1;
        &mut self.layers[last]
    }

    fn unlink_from_layers(&mut self, actor_id: &str) {
        for layer in &mut self.layers {
            layer.actors.retain(|id| id != actor_id);
        }
    }

    /// Add an actor, placing it on its layer (created if missing). An actor with the
    /// same id is replaced, keeping its slot in the insertion order, and returned.
    pub fn add_actor(&mut self, mut actor: Actor) -> Option<Actor> {
        actor.scene = Some(self.id.clone());
        self.unlink_from_layers(&actor.id);
        self.layer_entry(&actor.layer.clone()).actors.push(actor.id.clone());
        info!("actor '{}' added to scene '{}'", actor.id, self.id);
        self.actors.insert(actor.id.clone(), actor)
    }

    /// Remove an actor from the scene and its layer. The returned actor no longer
    /// names a scene.
    pub fn remove_actor(&mut self, actor_id: &str) -> Option<Actor> {
        let mut actor = self.actors.shift_remove(actor_id)?;
        self.unlink_from_layers(actor_id);
        actor.scene = None;
        info!("actor '{actor_id}' removed from scene '{}'", self.id);
        Some(actor)
    }

    pub fn actor(&self, actor_id: &str) -> Option<&Actor> {
        self.actors.get(actor_id)
    }

    pub fn actor_mut(&mut self, actor_id: &str) -> Option<&mut Actor> {
        self.actors.get_mut(actor_id)
    }

    /// Actors in insertion order.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    /// Actor ids in insertion order.
    pub fn actor_ids(&self) -> Vec<String> {
        self.actors.keys().cloned().collect()
    }

    /// Move an actor to another layer, creating the layer if needed.
    ///
    /// # Errors
    /// - if the actor is not in this scene
    pub fn set_actor_layer(&mut self, actor_id: &str, layer: &str) -> Result<()> {
        if !self.actors.contains_key(actor_id) {
            bail!("actor '{actor_id}' not found in scene '{}'", self.id);
        }
        self.unlink_from_layers(actor_id);
        self.layer_entry(layer).actors.push(actor_id.to_string());
        if let Some(actor) = self.actors.get_mut(actor_id) {
            actor.layer = layer.to_string();
        }
        Ok(())
    }

    /// Topmost interactive actor under `point`: layers top-most first, and within a
    /// layer the highest z-index (latest added on ties).
    pub fn actor_at(&self, point: Vec2) -> Option<&Actor> {
        for layer in self.layers.iter().filter(|l| l.visible) {
            let mut on_layer: Vec<&Actor> = layer.actors.iter().filter_map(|id| self.actors.get(id)).collect();
            on_layer.sort_by(|a, b| a.z_index.total_cmp(&b.z_index));
            if let Some(hit) = on_layer
                .into_iter()
                .rev()
                .find(|actor| actor.is_interactive() && actor.hit(point))
            {
                return Some(hit);
            }
        }
        None
    }

    /// Check one actor against the player's position and record the result.
    ///
    /// Nothing is reported when the player is missing or not in this scene, and the
    /// player's own actor is never checked.
    pub fn proximity_crossing(&mut self, actor_id: &str, player: Option<&str>) -> Option<Crossing> {
        let player_id = player.filter(|id| *id != actor_id)?;
        let player_pos = self.actors.get(player_id).map(Actor::position)?;
        self.actors.get_mut(actor_id)?.check_proximity(player_pos)
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn set_property(&mut self, name: &str, value: Option<String>) {
        match value {
            Some(value) => {
                self.properties.insert(name.to_string(), value);
            },
            None => {
                self.properties.remove(name);
            },
        }
    }
}
