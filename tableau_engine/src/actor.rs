//! Actors: the characters, props and hotspots placed in a scene.
//!
//! An actor carries its own verb table, a hit region used both for pointer
//! picking and for proximity triggers, and the dialogs and sound effects its
//! verbs refer to. It stores the id of the scene that owns it rather than a
//! reference to it.

use crate::geometry::{Polygon, Vec2};
use crate::verb::VerbManager;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use std::collections::HashMap;

/// A player position crossing an actor's hit region boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    Enter,
    Exit,
}

impl Crossing {
    /// Id of the verb fired for this crossing.
    pub fn verb_id(self) -> &'static str {
        match self {
            Crossing::Enter => "enter",
            Crossing::Exit => "exit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundFx {
    pub id: String,
    pub file: String,
    pub looping: bool,
    pub volume: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogOption {
    pub text: String,
    /// Verb run on the dialog's actor when chosen.
    pub verb: Option<String>,
    pub once: bool,
    pub chosen: bool,
}

impl DialogOption {
    pub fn is_visible(&self) -> bool {
        !(self.once && self.chosen)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dialog {
    pub id: String,
    pub options: Vec<DialogOption>,
}

impl Dialog {
    pub fn visible_options(&self) -> impl Iterator<Item = &DialogOption> {
        self.options.iter().filter(|option| option.is_visible())
    }

    /// Mark the `index`th visible option as chosen and return it.
    pub fn choose(&mut self, index: usize) -> Option<&DialogOption> {
        let option = self
            .options
            .iter_mut()
            .filter(|option| option.is_visible())
            .nth(index)?;
        option.chosen = true;
        Some(option)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub desc: String,
    /// Id of the owning scene, set when the actor is added to one.
    pub scene: Option<String>,
    pub state: Option<String>,
    pub verbs: VerbManager,
    pub bbox: Polygon,
    pub layer: String,
    pub z_index: f32,
    pub visible: bool,
    pub interaction: bool,
    pub properties: HashMap<String, String>,
    pub dialogs: Vec<Dialog>,
    pub sounds: Vec<SoundFx>,
    pub playing_sound: Option<String>,
    pub animation: Option<String>,
    /// Whether the player stood inside the hit region at the last proximity check.
    pub player_inside: bool,
}

impl Actor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            desc: String::new(),
            scene: None,
            state: None,
            verbs: VerbManager::new(),
            bbox: Polygon::default(),
            layer: "main".to_string(),
            z_index: 0.0,
            visible: true,
            interaction: true,
            properties: HashMap::new(),
            dialogs: Vec::new(),
            sounds: Vec::new(),
            playing_sound: None,
            animation: None,
            player_inside: false,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.bbox.position
    }

    pub fn set_position(&mut self, pos: Vec2) {
        self.bbox.set_position(pos);
    }

    pub fn hit(&self, point: Vec2) -> bool {
        self.bbox.contains(point)
    }

    /// Visible and accepting player interaction.
    pub fn is_interactive(&self) -> bool {
        self.visible && self.interaction
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Set or (with `None`) remove a custom property.
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

    pub fn dialog(&self, id: &str) -> Option<&Dialog> {
        self.dialogs.iter().find(|d| d.id == id)
    }

    pub fn dialog_mut(&mut self, id: &str) -> Option<&mut Dialog> {
        self.dialogs.iter_mut().find(|d| d.id == id)
    }

    pub fn sound(&self, id: &str) -> Option<&SoundFx> {
        self.sounds.iter().find(|s| s.id == id)
    }

    /// Start a sound effect owned by this actor.
    ///
    /// # Errors
    /// - if the actor has no sound with that id
    pub fn play_sound(&mut self, id: &str) -> Result<&SoundFx> {
        let fx = self
            .sounds
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| anyhow!("actor '{}' has no sound '{id}'", self.id))?;
        self.playing_sound = Some(id.to_string());
        Ok(fx)
    }

    /// Compare the player's position with the hit region and record the result.
    ///
    /// Returns a crossing only when the inside/outside status changes. Invisible actors
    /// are skipped and keep their previous status.
    pub fn check_proximity(&mut self, player_pos: Vec2) -> Option<Crossing> {
        if !self.visible {
            return None;
        }
        let inside = self.bbox.contains(player_pos);
        match (self.player_inside, inside) {
            (false, true) => {
                self.player_inside = true;
                Some(Crossing::Enter)
            },
            (true, false) => {
                self.player_inside = false;
                Some(Crossing::Exit)
            },
            _ => None,
        }
    }
}
