//! Execution context handed to actions.
//!
//! A verb runs while taken out of its owner's [`VerbManager`](super::VerbManager), so the
//! context can lend the interpreter `&mut World` without aliasing the verb itself.

use crate::actor::Actor;
use crate::events::EngineEvent;
use crate::scene::Scene;
use crate::world::World;

use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use tableau_data::TargetDef;

use std::fmt;

use super::VerbKey;

/// The entity whose verb table holds a verb.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerbOwner {
    World,
    Scene(String),
    Actor { scene: String, actor: String },
}

impl VerbOwner {
    pub fn actor(scene: impl Into<String>, actor: impl Into<String>) -> Self {
        VerbOwner::Actor {
            scene: scene.into(),
            actor: actor.into(),
        }
    }

    pub fn actor_id(&self) -> Option<&str> {
        match self {
            VerbOwner::Actor { actor, .. } => Some(actor),
            _ => None,
        }
    }

    pub fn scene_id(&self) -> Option<&str> {
        match self {
            VerbOwner::Scene(scene) | VerbOwner::Actor { scene, .. } => Some(scene),
            VerbOwner::World => None,
        }
    }
}

impl fmt::Display for VerbOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerbOwner::World => write!(f, "world"),
            VerbOwner::Scene(scene) => write!(f, "scene '{scene}'"),
            VerbOwner::Actor { scene, actor } => write!(f, "actor '{actor}' in '{scene}'"),
        }
    }
}

/// Identifies one verb in the world: its owner plus its key in the owner's table.
///
/// External completion sources hold a handle to deliver their single `resume`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerbHandle {
    pub owner: VerbOwner,
    pub key: VerbKey,
}

impl VerbHandle {
    pub fn new(owner: VerbOwner, key: VerbKey) -> Self {
        Self { owner, key }
    }
}

impl fmt::Display for VerbHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {}", self.key, self.owner)
    }
}

/// Entity addressed by an action or condition, relative to the running verb.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Target {
    #[default]
    Owner,
    Actor(String),
    Scene,
    World,
}

impl From<&TargetDef> for Target {
    fn from(def: &TargetDef) -> Self {
        match def {
            TargetDef::Owner => Target::Owner,
            TargetDef::Actor(id) => Target::Actor(id.clone()),
            TargetDef::Scene => Target::Scene,
            TargetDef::World => Target::World,
        }
    }
}

/// Mutable world access for the actions of one running verb.
pub struct ActionContext<'w> {
    pub world: &'w mut World,
    handle: VerbHandle,
    owner: VerbOwner,
    cancel_requested: bool,
}

impl<'w> ActionContext<'w> {
    pub fn new(world: &'w mut World, handle: VerbHandle) -> Self {
        let owner = handle.owner.clone();
        Self {
            world,
            handle,
            owner,
            cancel_requested: false,
        }
    }

    /// The verb being executed. Suspensions register against this handle.
    pub fn handle(&self) -> &VerbHandle {
        &self.handle
    }

    /// Owner that unqualified actor references resolve against. Differs from the handle's
    /// owner while a `RunVerb` executes another entity's verb inline.
    pub fn owner(&self) -> &VerbOwner {
        &self.owner
    }

    pub fn label(&self) -> String {
        self.handle.key.to_string()
    }

    /// Run `f` with unqualified references bound to `owner` (or unchanged for `None`).
    pub fn scoped<R>(&mut self, owner: Option<&VerbOwner>, f: impl FnOnce(&mut Self) -> R) -> R {
        let Some(owner) = owner else {
            return f(self);
        };
        let outer = std::mem::replace(&mut self.owner, owner.clone());
        let result = f(self);
        self.owner = outer;
        result
    }

    /// Ask the interpreter to cancel the executing verb once the current step returns.
    pub fn request_cancel(&mut self) {
        self.cancel_requested = true;
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested
    }

    pub fn take_cancel_request(&mut self) -> bool {
        std::mem::take(&mut self.cancel_requested)
    }

    /// Scene the running verb acts in: the owner's scene, or the current scene for world verbs.
    pub fn scene_id(&self) -> Result<String> {
        match self.owner.scene_id() {
            Some(scene) => Ok(scene.to_string()),
            None => self
                .world
                .current_scene
                .clone()
                .ok_or_else(|| anyhow!("no current scene")),
        }
    }

    pub fn scene(&self) -> Result<&Scene> {
        let id = self.scene_id()?;
        self.world
            .scene(&id)
            .ok_or_else(|| anyhow!("scene '{id}' not found"))
    }

    pub fn scene_mut(&mut self) -> Result<&mut Scene> {
        let id = self.scene_id()?;
        self.world
            .scene_mut(&id)
            .ok_or_else(|| anyhow!("scene '{id}' not found"))
    }

    /// Resolve an optional actor reference to `(scene, actor)` ids.
    /// `None` means the actor owning the verb.
    pub fn resolve_actor(&self, actor: Option<&str>) -> Result<(String, String)> {
        if let Some(id) = actor {
            return Ok((self.scene_id()?, id.to_string()));
        }
        match &self.owner {
            VerbOwner::Actor { scene, actor } => Ok((scene.clone(), actor.clone())),
            other => bail!("no actor given and {other} is not an actor"),
        }
    }

    pub fn actor(&self, actor: Option<&str>) -> Result<&Actor> {
        let (scene, id) = self.resolve_actor(actor)?;
        self.world
            .scene(&scene)
            .and_then(|s| s.actor(&id))
            .ok_or_else(|| anyhow!("actor '{id}' not found in scene '{scene}'"))
    }

    pub fn actor_mut(&mut self, actor: Option<&str>) -> Result<&mut Actor> {
        let (scene, id) = self.resolve_actor(actor)?;
        self.world
            .scene_mut(&scene)
            .and_then(|s| s.actor_mut(&id))
            .ok_or_else(|| anyhow!("actor '{id}' not found in scene '{scene}'"))
    }

    /// Resolve a target to the entity it names.
    pub fn resolve_target(&self, target: &Target) -> Result<VerbOwner> {
        Ok(match target {
            Target::Owner => self.owner.clone(),
            Target::Actor(id) => VerbOwner::actor(self.scene_id()?, id.as_str()),
            Target::Scene => VerbOwner::Scene(self.scene_id()?),
            Target::World => VerbOwner::World,
        })
    }

    pub fn emit(&mut self, event: EngineEvent) {
        self.world.push_event(event);
    }
}
