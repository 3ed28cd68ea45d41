//! Data structures representing the game world.
//!
//! This module defines [`World`], which owns every scene, knows the current
//! scene and the player actor (by id), and routes verb execution, external
//! completion signals and per-frame updates.

use crate::TABLEAU_VERSION;
use crate::actor::Actor;
use crate::config::RuntimeSettings;
use crate::events::EngineEvent;
use crate::scene::Scene;
use crate::verb::{
    Action, ActionContext, RunState, Verb, VerbError, VerbHandle, VerbKey, VerbManager, VerbOwner,
};

use anyhow::{Result, anyhow, bail};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use std::collections::HashMap;

/// The dialog currently on screen and the verb waiting for the player's choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveDialog {
    pub handle: VerbHandle,
    pub scene: String,
    pub actor: String,
    pub dialog: String,
}

/// Complete state of the running game.
///
/// Everything needed to resume a session lives here, including the cursor and
/// progress of every suspended verb. The event outbox and runtime settings are
/// not persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    pub title: String,
    pub scenes: HashMap<String, Scene>,
    pub current_scene: Option<String>,
    /// Id of the player's actor in the current scene.
    pub player: Option<String>,
    pub state: Option<String>,
    /// Global verbs, the last fallback for player commands.
    pub verbs: VerbManager,
    pub properties: HashMap<String, String>,
    pub active_dialog: Option<ActiveDialog>,
    /// Game time in seconds.
    pub elapsed: f64,
    pub version: String,
    #[serde(skip)]
    pub settings: RuntimeSettings,
    #[serde(skip)]
    events: Vec<EngineEvent>,
    /// Verbs taken out of their tables for execution, outermost first.
    #[serde(skip)]
    executing: Vec<VerbHandle>,
}

impl World {
    /// Create a new empty world.
    pub fn new_empty() -> World {
        let world = Self {
            version: TABLEAU_VERSION.to_string(),
            ..Self::default()
        };
        info!("new, empty 'World' created");
        world
    }

    /// Add a scene, replacing (and returning) any scene with the same id.
    pub fn add_scene(&mut self, scene: Scene) -> Option<Scene> {
        self.scenes.insert(scene.id.clone(), scene)
    }

    pub fn scene(&self, id: &str) -> Option<&Scene> {
        self.scenes.get(id)
    }

    pub fn scene_mut(&mut self, id: &str) -> Option<&mut Scene> {
        self.scenes.get_mut(id)
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        self.current_scene.as_deref().and_then(|id| self.scenes.get(id))
    }

    pub fn current_scene_mut(&mut self) -> Option<&mut Scene> {
        let id = self.current_scene.as_deref()?;
        self.scenes.get_mut(id)
    }

    /// Make `id` the current scene and run its `init` verb.
    ///
    /// # Errors
    /// - if no scene has that id
    pub fn set_current_scene(&mut self, id: &str) -> Result<()> {
        if !self.scenes.contains_key(id) {
            bail!("scene '{id}' not found");
        }
        self.current_scene = Some(id.to_string());
        info!("current scene is now '{id}'");
        self.push_event(EngineEvent::SceneChanged { scene: id.to_string() });
        self.run_verb(&VerbOwner::Scene(id.to_string()), "init", None);
        Ok(())
    }

    /// Enter the current scene at the start of a session.
    ///
    /// # Errors
    /// - if the world has no current scene
    pub fn start(&mut self) -> Result<()> {
        let id = self
            .current_scene
            .clone()
            .ok_or_else(|| anyhow!("world has no current scene"))?;
        self.set_current_scene(&id)
    }

    /// The player's actor, looked up in the current scene. `None` once it has been removed.
    pub fn player_actor(&self) -> Option<&Actor> {
        let id = self.player.as_deref()?;
        self.current_scene()?.actor(id)
    }

    pub fn player_actor_mut(&mut self) -> Option<&mut Actor> {
        let id = self.player.clone()?;
        self.current_scene_mut()?.actor_mut(&id)
    }

    /// Hand player control to another actor of the current scene (or to nobody).
    /// The player's actor never accepts interaction itself.
    ///
    /// # Errors
    /// - if the actor is not in the current scene
    pub fn set_player(&mut self, actor: Option<&str>) -> Result<()> {
        if let Some(id) = actor
            && self.current_scene().and_then(|s| s.actor(id)).is_none()
        {
            bail!("actor '{id}' is not in the current scene");
        }
        if let Some(previous) = self.player_actor_mut() {
            previous.interaction = true;
        }
        self.player = actor.map(str::to_string);
        if let Some(player) = self.player_actor_mut() {
            player.interaction = false;
        }
        info!("player is now {:?}", self.player);
        Ok(())
    }

    fn missing(owner: &VerbOwner) -> anyhow::Error {
        anyhow!("{owner} not found")
    }

    fn actor_of(&self, scene: &str, actor: &str) -> Option<&Actor> {
        self.scenes.get(scene)?.actor(actor)
    }

    fn actor_of_mut(&mut self, scene: &str, actor: &str) -> Option<&mut Actor> {
        self.scenes.get_mut(scene)?.actor_mut(actor)
    }

    /// State string of an entity (the state key used for verb lookup).
    ///
    /// # Errors
    /// - if the entity does not exist
    pub fn state_of(&self, owner: &VerbOwner) -> Result<Option<&str>> {
        match owner {
            VerbOwner::World => Ok(self.state.as_deref()),
            VerbOwner::Scene(scene) => self
                .scenes
                .get(scene)
                .map(|s| s.state.as_deref())
                .ok_or_else(|| Self::missing(owner)),
            VerbOwner::Actor { scene, actor } => self
                .actor_of(scene, actor)
                .map(|a| a.state.as_deref())
                .ok_or_else(|| Self::missing(owner)),
        }
    }

    /// # Errors
    /// - if the entity does not exist
    pub fn set_state_of(&mut self, owner: &VerbOwner, state: Option<String>) -> Result<()> {
        let slot = match owner {
            VerbOwner::World => &mut self.state,
            VerbOwner::Scene(scene) => &mut self.scenes.get_mut(scene).ok_or_else(|| Self::missing(owner))?.state,
            VerbOwner::Actor { scene, actor } => {
                &mut self
                    .actor_of_mut(scene, actor)
                    .ok_or_else(|| Self::missing(owner))?
                    .state
            },
        };
        *slot = state;
        Ok(())
    }

    /// # Errors
    /// - if the entity does not exist
    pub fn property_of(&self, owner: &VerbOwner, name: &str) -> Result<Option<&str>> {
        match owner {
            VerbOwner::World => Ok(self.properties.get(name).map(String::as_str)),
            VerbOwner::Scene(scene) => self
                .scenes
                .get(scene)
                .map(|s| s.property(name))
                .ok_or_else(|| Self::missing(owner)),
            VerbOwner::Actor { scene, actor } => self
                .actor_of(scene, actor)
                .map(|a| a.property(name))
                .ok_or_else(|| Self::missing(owner)),
        }
    }

    /// Set or (with `None`) remove a custom property.
    ///
    /// # Errors
    /// - if the entity does not exist
    pub fn set_property_of(&mut self, owner: &VerbOwner, name: &str, value: Option<String>) -> Result<()> {
        match owner {
            VerbOwner::World => {
                match value {
                    Some(value) => self.properties.insert(name.to_string(), value),
                    None => self.properties.remove(name),
                };
            },
            VerbOwner::Scene(scene) => self
                .scenes
                .get_mut(scene)
                .ok_or_else(|| Self::missing(owner))?
                .set_property(name, value),
            VerbOwner::Actor { scene, actor } => self
                .actor_of_mut(scene, actor)
                .ok_or_else(|| Self::missing(owner))?
                .set_property(name, value),
        }
        Ok(())
    }

    pub fn verb_manager(&self, owner: &VerbOwner) -> Option<&VerbManager> {
        match owner {
            VerbOwner::World => Some(&self.verbs),
            VerbOwner::Scene(scene) => self.scenes.get(scene).map(|s| &s.verbs),
            VerbOwner::Actor { scene, actor } => self.actor_of(scene, actor).map(|a| &a.verbs),
        }
    }

    pub fn verb_manager_mut(&mut self, owner: &VerbOwner) -> Option<&mut VerbManager> {
        match owner {
            VerbOwner::World => Some(&mut self.verbs),
            VerbOwner::Scene(scene) => self.scenes.get_mut(scene).map(|s| &mut s.verbs),
            VerbOwner::Actor { scene, actor } => self.actor_of_mut(scene, actor).map(|a| &mut a.verbs),
        }
    }

    /// Resolve `(id, owner state, target)` in the owner's verb table.
    ///
    /// Verbs that are executing (and so absent from their table) still take part, so a
    /// lookup never falls through to a less specific verb because the better match is
    /// busy running.
    pub fn resolve_handle(&self, owner: &VerbOwner, id: &str, target: Option<&str>) -> Option<VerbHandle> {
        let state = self.state_of(owner).ok()?;
        let manager = self.verb_manager(owner)?;
        let lent: Vec<&VerbKey> = self
            .executing
            .iter()
            .filter(|h| h.owner == *owner)
            .map(|h| &h.key)
            .collect();
        manager
            .resolve_key_with(id, state, target, &lent)
            .map(|key| VerbHandle::new(owner.clone(), key))
    }

    /// Whether `handle` is currently executing somewhere up the call stack.
    pub fn is_executing(&self, handle: &VerbHandle) -> bool {
        self.executing.contains(handle)
    }

    pub fn verb(&self, handle: &VerbHandle) -> Option<&Verb> {
        self.verb_manager(&handle.owner)?.get(&handle.key)
    }

    /// Run `f` on a verb with the rest of the world lent to it through an [`ActionContext`].
    ///
    /// The verb is taken out of its table for the duration and put back afterwards, unless
    /// its owner disappeared or the key was redefined in the meantime. Returns `None` if the
    /// verb is not in its table (including while it is already executing).
    pub fn with_verb<R>(
        &mut self,
        handle: &VerbHandle,
        f: impl FnOnce(&mut Verb, &mut ActionContext<'_>) -> R,
    ) -> Option<R> {
        if self.is_executing(handle) {
            warn!("verb {handle} is already executing");
            return None;
        }
        let mut verb = self.verb_manager_mut(&handle.owner)?.take(&handle.key)?;
        self.executing.push(handle.clone());
        let result = {
            let mut ctx = ActionContext::new(self, handle.clone());
            f(&mut verb, &mut ctx)
        };
        self.executing.pop();
        match self.verb_manager_mut(&handle.owner) {
            Some(manager) => {
                manager.restore(verb);
            },
            None => warn!("owner of verb {handle} is gone; verb dropped"),
        }
        Some(result)
    }

    /// Resolve a verb on `owner` and run it. Nothing resolving is not an error.
    pub fn run_verb(&mut self, owner: &VerbOwner, id: &str, target: Option<&str>) -> Option<RunState> {
        let Some(handle) = self.resolve_handle(owner, id, target) else {
            debug!("no verb '{id}' on {owner}");
            return None;
        };
        self.with_verb(&handle, |verb, ctx| verb.run(ctx))
    }

    /// The player issued `verb` on `actor` (optionally with `target`).
    ///
    /// The verb is looked up on the actor, then on the current scene, then in the global
    /// verbs. Returns `None` if the actor is not interactive or nothing resolves.
    pub fn interact(&mut self, actor: &str, verb: &str, target: Option<&str>) -> Option<RunState> {
        let scene = self.current_scene.clone()?;
        match self.actor_of(&scene, actor) {
            Some(found) if found.is_interactive() => {},
            Some(_) => {
                info!("actor '{actor}' does not accept interaction");
                return None;
            },
            None => {
                warn!("interact: no actor '{actor}' in scene '{scene}'");
                return None;
            },
        }
        let owners = [
            VerbOwner::actor(scene.as_str(), actor),
            VerbOwner::Scene(scene.clone()),
            VerbOwner::World,
        ];
        for owner in owners {
            if let Some(handle) = self.resolve_handle(&owner, verb, target) {
                info!("player: {verb} {actor} -> {handle}");
                return self.with_verb(&handle, |v, ctx| v.run(ctx));
            }
        }
        info!("player: {verb} {actor}: nothing happens");
        None
    }

    /// Deliver the completion signal for a suspended verb.
    ///
    /// # Errors
    /// - [`VerbError::NotFound`] if the handle does not name a verb
    /// - [`VerbError::NotSuspended`] if the verb is not parked on an action
    pub fn resume_verb(&mut self, handle: &VerbHandle) -> Result<RunState, VerbError> {
        self.with_verb(handle, |verb, ctx| verb.resume(ctx))
            .unwrap_or_else(|| Err(VerbError::NotFound(handle.to_string())))
    }

    /// Cancel a verb. Returns `false` if it is not in its table.
    pub fn cancel_verb(&mut self, handle: &VerbHandle) -> bool {
        self.with_verb(handle, |verb, ctx| verb.cancel(ctx)).is_some()
    }

    /// Handles of every verb in the world: global verbs, then scenes by id, each
    /// scene's verbs followed by its actors' verbs in insertion order.
    pub fn verb_handles(&self) -> Vec<VerbHandle> {
        let mut handles: Vec<VerbHandle> = self
            .verbs
            .keys()
            .into_iter()
            .map(|key| VerbHandle::new(VerbOwner::World, key.clone()))
            .collect();
        let mut scene_ids: Vec<&String> = self.scenes.keys().collect();
        scene_ids.sort();
        for scene_id in scene_ids {
            handles.extend(self.scene_verb_handles(scene_id));
        }
        handles
    }

    fn scene_verb_handles(&self, scene_id: &str) -> Vec<VerbHandle> {
        let Some(scene) = self.scenes.get(scene_id) else {
            return Vec::new();
        };
        let mut handles: Vec<VerbHandle> = scene
            .verbs
            .keys()
            .into_iter()
            .map(|key| VerbHandle::new(VerbOwner::Scene(scene_id.to_string()), key.clone()))
            .collect();
        for actor in scene.actors() {
            let owner = VerbOwner::actor(scene_id, actor.id.as_str());
            handles.extend(
                actor
                    .verbs
                    .keys()
                    .into_iter()
                    .map(|key| VerbHandle::new(owner.clone(), key.clone())),
            );
        }
        handles
    }

    /// Suspended verbs that receive time: global verbs and those of the current scene.
    /// Verbs parked in other scenes stay paused until their scene is current again.
    pub fn suspended_verbs(&self) -> Vec<VerbHandle> {
        let mut handles: Vec<VerbHandle> = self
            .verbs
            .suspended_keys()
            .into_iter()
            .map(|key| VerbHandle::new(VerbOwner::World, key))
            .collect();
        if let Some(scene) = self.current_scene.as_deref() {
            handles.extend(self.scene_verb_handles(scene));
        }
        handles.retain(|h| self.verb(h).is_some_and(Verb::is_suspended));
        handles
    }

    /// Advance the world by `delta` seconds.
    ///
    /// Suspended verbs get their time first (a timed action that completes resumes its
    /// verb exactly once), then the current scene's actors are checked against the
    /// player's position and `enter`/`exit` verbs fire in actor insertion order.
    pub fn update(&mut self, delta: f32) {
        self.elapsed += f64::from(delta);
        for handle in self.suspended_verbs() {
            self.with_verb(&handle, |verb, ctx| verb.tick(delta, ctx));
        }

        let Some(scene_id) = self.current_scene.clone() else {
            return;
        };
        let actor_ids = self.scene(&scene_id).map(Scene::actor_ids).unwrap_or_default();
        for actor_id in actor_ids {
            // an earlier actor's verb may have changed scene, player or this actor
            if self.current_scene.as_deref() != Some(scene_id.as_str()) {
                break;
            }
            let player = self.player.clone();
            let Some(crossing) = self
                .scenes
                .get_mut(&scene_id)
                .and_then(|scene| scene.proximity_crossing(&actor_id, player.as_deref()))
            else {
                continue;
            };
            info!("player crossed into/out of '{actor_id}': {crossing:?}");
            self.run_verb(&VerbOwner::actor(scene_id.as_str(), actor_id.as_str()), crossing.verb_id(), None);
        }
    }

    /// The renderer finished an animation on `actor`: resume every verb waiting on it.
    /// Returns the number of verbs resumed.
    pub fn signal_animation_finished(&mut self, actor: &str) -> usize {
        let waiting: Vec<VerbHandle> = self
            .suspended_verbs()
            .into_iter()
            .filter(|handle| {
                self.verb(handle)
                    .and_then(|verb| verb.script.in_flight_leaf(&handle.owner))
                    .is_some_and(|(action, owner)| match action {
                        Action::PlayAnimation {
                            actor: animated,
                            wait: true,
                            ..
                        } => animated.as_deref().or(owner.actor_id()) == Some(actor),
                        _ => false,
                    })
            })
            .collect();
        let mut resumed = 0;
        for handle in waiting {
            match self.resume_verb(&handle) {
                Ok(_) => resumed += 1,
                Err(e) => error!("animation finished on '{actor}': {e}"),
            }
        }
        resumed
    }

    /// The player picked option `index` (among the visible ones) of the open dialog.
    ///
    /// The option's verb runs on the dialog's actor, then the verb that opened the
    /// dialog is resumed exactly once.
    ///
    /// # Errors
    /// - if no dialog is open or `index` is out of range (the dialog stays open)
    /// - if the waiting verb cannot be resumed
    pub fn select_dialog_option(&mut self, index: usize) -> Result<RunState> {
        let Some(open) = self.active_dialog.take() else {
            bail!("no dialog is open");
        };
        let chosen = self
            .actor_of_mut(&open.scene, &open.actor)
            .and_then(|actor| actor.dialog_mut(&open.dialog))
            .and_then(|dialog| dialog.choose(index))
            .map(|option| (option.text.clone(), option.verb.clone()));
        let Some((text, verb)) = chosen else {
            let dialog = open.dialog.clone();
            self.active_dialog = Some(open);
            bail!("dialog '{dialog}' has no option {}", index + 1);
        };

        info!("dialog '{}': chose \"{text}\"", open.dialog);
        self.push_event(EngineEvent::DialogClosed {
            actor: open.actor.clone(),
            dialog: open.dialog.clone(),
        });
        if let Some(player) = self.player.clone() {
            self.push_event(EngineEvent::Speech { actor: player, text });
        }
        if let Some(verb) = verb {
            self.run_verb(&VerbOwner::actor(open.scene.as_str(), open.actor.as_str()), &verb, None);
        }
        Ok(self.resume_verb(&open.handle)?)
    }

    /// Check and settle interpreter state restored from a save.
    ///
    /// Verbs saved between steps are re-entered where they stopped; suspended verbs
    /// stay parked on the same action.
    ///
    /// # Errors
    /// - [`VerbError::CorruptState`] for an inconsistent verb cursor, or an open dialog
    ///   whose verb is not waiting on it
    pub fn restore_after_load(&mut self) -> Result<(), VerbError> {
        self.validate_verbs()?;
        for handle in &self.verb_handles() {
            let between_steps = self
                .verb(handle)
                .is_some_and(|verb| verb.is_running() && !verb.is_suspended());
            if between_steps {
                info!("re-entering verb {handle} after load");
                self.with_verb(handle, |verb, ctx| verb.reenter(ctx));
            }
        }
        Ok(())
    }

    /// Check every verb cursor and the open dialog without running anything.
    ///
    /// # Errors
    /// - [`VerbError::CorruptState`] for the first inconsistency found
    pub fn validate_verbs(&self) -> Result<(), VerbError> {
        for handle in &self.verb_handles() {
            if let Some(verb) = self.verb(handle) {
                verb.validate()?;
            }
        }
        if let Some(open) = &self.active_dialog {
            let waiting = self
                .verb(&open.handle)
                .and_then(|verb| verb.script.in_flight_leaf(&open.handle.owner))
                .is_some_and(|(action, _)| matches!(action, Action::ShowDialog { .. }));
            if !waiting {
                return Err(VerbError::CorruptState {
                    verb: open.handle.to_string(),
                    reason: format!("dialog '{}' is open but the verb is not waiting on it", open.dialog),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn push_event(&mut self, event: EngineEvent) {
        debug!("event: {event:?}");
        self.events.push(event);
    }

    /// Take every event published since the last drain.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }
}
