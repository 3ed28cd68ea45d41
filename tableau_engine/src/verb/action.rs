//! Runtime actions: the instructions a verb executes.
//!
//! Each action is run once when the interpreter reaches it and reports a
//! [`StepOutcome`]. Actions that span frames suspend their verb and keep their
//! progress (elapsed time, walk origin, nested cursor) inline so a save taken
//! mid-verb restores exactly.

use super::{ActionContext, Condition, RunState, Script, Target, Verb, VerbOwner};
use crate::events::EngineEvent;
use crate::geometry::Vec2;
use crate::world::ActiveDialog;

use anyhow::{Result, anyhow, bail};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// What the interpreter should do after running one action.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Done; advance to the next action.
    Continue,
    /// Park the verb until `resume`.
    Suspend,
    /// The action failed. The failure is logged and the verb advances.
    Fault(String),
}

impl From<RunState> for StepOutcome {
    fn from(state: RunState) -> Self {
        match state {
            RunState::Suspended => StepOutcome::Suspend,
            RunState::Finished => StepOutcome::Continue,
        }
    }
}

/// One atomic operation of a verb.
///
/// Fields named `elapsed`, `origin`, `bound` and `script` (inside `RunVerb`) are progress,
/// everything else is a parameter fixed at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    SetState {
        target: Target,
        state: Option<String>,
    },
    SetProperty {
        target: Target,
        name: String,
        value: Option<String>,
    },
    SetActorAttr {
        actor: Option<String>,
        visible: Option<bool>,
        interaction: Option<bool>,
        layer: Option<String>,
    },
    Position {
        actor: Option<String>,
        pos: Vec2,
    },
    Goto {
        actor: Option<String>,
        pos: Vec2,
        speed: Option<f32>,
        /// Where the walk started; set while in flight.
        #[serde(deserialize_with = "Option::deserialize")]
        origin: Option<Vec2>,
    },
    PlayAnimation {
        actor: Option<String>,
        animation: String,
        duration: f32,
        wait: bool,
        elapsed: f32,
    },
    PlaySound {
        actor: Option<String>,
        sound: String,
    },
    Say {
        actor: Option<String>,
        text: String,
        duration: Option<f32>,
        wait: bool,
        elapsed: f32,
    },
    Wait {
        seconds: f32,
        elapsed: f32,
    },
    ShowDialog {
        actor: Option<String>,
        dialog: String,
    },
    Conditional {
        condition: Condition,
        script: Script,
    },
    /// Runs another verb's actions inline, as a nested sequence.
    RunVerb {
        owner: Target,
        verb: String,
        target: Option<String>,
        /// Owner the inlined actions run for, fixed when the verb is resolved.
        #[serde(deserialize_with = "Option::deserialize")]
        bound: Option<VerbOwner>,
        script: Script,
    },
    CancelVerb {
        owner: Target,
        verb: String,
        target: Option<String>,
    },
    AddVerb {
        owner: Target,
        verb: Box<Verb>,
    },
    ChangeScene {
        scene: String,
    },
    SetPlayer {
        actor: Option<String>,
    },
    RemoveActor {
        actor: String,
    },
}

impl Action {
    pub fn goto(actor: Option<&str>, pos: Vec2, speed: Option<f32>) -> Self {
        Action::Goto {
            actor: actor.map(str::to_string),
            pos,
            speed,
            origin: None,
        }
    }

    pub fn play_animation(actor: Option<&str>, animation: &str, duration: f32, wait: bool) -> Self {
        Action::PlayAnimation {
            actor: actor.map(str::to_string),
            animation: animation.to_string(),
            duration,
            wait,
            elapsed: 0.0,
        }
    }

    pub fn say(actor: Option<&str>, text: &str, duration: Option<f32>, wait: bool) -> Self {
        Action::Say {
            actor: actor.map(str::to_string),
            text: text.to_string(),
            duration,
            wait,
            elapsed: 0.0,
        }
    }

    pub fn wait(seconds: f32) -> Self {
        Action::Wait { seconds, elapsed: 0.0 }
    }

    pub fn conditional(condition: Condition, actions: Vec<Action>) -> Self {
        Action::Conditional {
            condition,
            script: Script::new(actions),
        }
    }

    pub fn run_verb(owner: Target, verb: &str, target: Option<&str>) -> Self {
        Action::RunVerb {
            owner,
            verb: verb.to_string(),
            target: target.map(str::to_string),
            bound: None,
            script: Script::default(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::SetState { .. } => "SetState",
            Action::SetProperty { .. } => "SetProperty",
            Action::SetActorAttr { .. } => "SetActorAttr",
            Action::Position { .. } => "Position",
            Action::Goto { .. } => "Goto",
            Action::PlayAnimation { .. } => "PlayAnimation",
            Action::PlaySound { .. } => "PlaySound",
            Action::Say { .. } => "Say",
            Action::Wait { .. } => "Wait",
            Action::ShowDialog { .. } => "ShowDialog",
            Action::Conditional { .. } => "Conditional",
            Action::RunVerb { .. } => "RunVerb",
            Action::CancelVerb { .. } => "CancelVerb",
            Action::AddVerb { .. } => "AddVerb",
            Action::ChangeScene { .. } => "ChangeScene",
            Action::SetPlayer { .. } => "SetPlayer",
            Action::RemoveActor { .. } => "RemoveActor",
        }
    }

    /// Whether a verb may legitimately be parked on this action.
    pub fn can_suspend(&self) -> bool {
        match self {
            Action::PlayAnimation { wait, .. } | Action::Say { wait, .. } => *wait,
            Action::Goto { .. }
            | Action::Wait { .. }
            | Action::ShowDialog { .. }
            | Action::Conditional { .. }
            | Action::RunVerb { .. } => true,
            _ => false,
        }
    }

    /// Run the action. Errors become [`StepOutcome::Fault`].
    pub fn run(&mut self, ctx: &mut ActionContext<'_>) -> StepOutcome {
        match self.execute(ctx) {
            Ok(outcome) => outcome,
            Err(err) => StepOutcome::Fault(format!("{err:#}")),
        }
    }

    fn execute(&mut self, ctx: &mut ActionContext<'_>) -> Result<StepOutcome> {
        match self {
            Action::SetState { target, state } => set_state(ctx, target, state.as_deref()),
            Action::SetProperty { target, name, value } => set_property(ctx, target, name, value.as_deref()),
            Action::SetActorAttr {
                actor,
                visible,
                interaction,
                layer,
            } => set_actor_attr(ctx, actor.as_deref(), *visible, *interaction, layer.as_deref()),
            Action::Position { actor, pos } => position(ctx, actor.as_deref(), *pos),
            Action::Goto { actor, pos, origin, .. } => start_walk(ctx, actor.as_deref(), *pos, origin),
            Action::PlayAnimation {
                actor,
                animation,
                wait,
                elapsed,
                ..
            } => {
                *elapsed = 0.0;
                play_animation(ctx, actor.as_deref(), animation, *wait)
            },
            Action::PlaySound { actor, sound } => play_sound(ctx, actor.as_deref(), sound),
            Action::Say {
                actor,
                text,
                wait,
                elapsed,
                ..
            } => {
                *elapsed = 0.0;
                say(ctx, actor.as_deref(), text, *wait)
            },
            Action::Wait { seconds, elapsed } => {
                *elapsed = 0.0;
                info!("└─ action: Wait({seconds}s)");
                Ok(if *seconds > 0.0 {
                    StepOutcome::Suspend
                } else {
                    StepOutcome::Continue
                })
            },
            Action::ShowDialog { actor, dialog } => show_dialog(ctx, actor.as_deref(), dialog),
            Action::Conditional { condition, script } => {
                if condition.eval(ctx)? {
                    info!("└─ action: Conditional(true), entering {} action(s)", script.len());
                    Ok(script.start(ctx).into())
                } else {
                    info!("└─ action: Conditional(false), skipped");
                    Ok(StepOutcome::Continue)
                }
            },
            Action::RunVerb {
                owner,
                verb,
                target,
                bound,
                script,
            } => {
                let Some((resolved, actions)) = inline_verb(ctx, owner, verb, target.as_deref())? else {
                    return Ok(StepOutcome::Continue);
                };
                *bound = Some(resolved);
                *script = Script::new(actions);
                Ok(ctx.scoped(bound.as_ref(), |ctx| script.start(ctx)).into())
            },
            Action::CancelVerb { owner, verb, target } => cancel_verb(ctx, owner, verb, target.as_deref()),
            Action::AddVerb { owner, verb } => add_verb(ctx, owner, verb),
            Action::ChangeScene { scene } => {
                info!("└─ action: ChangeScene({scene})");
                ctx.world.set_current_scene(scene)?;
                Ok(StepOutcome::Continue)
            },
            Action::SetPlayer { actor } => {
                info!("└─ action: SetPlayer({actor:?})");
                ctx.world.set_player(actor.as_deref())?;
                Ok(StepOutcome::Continue)
            },
            Action::RemoveActor { actor } => {
                info!("└─ action: RemoveActor({actor})");
                let scene = ctx.scene_mut()?;
                scene
                    .remove_actor(actor)
                    .ok_or_else(|| anyhow!("actor '{actor}' not found in scene '{}'", scene.id))?;
                Ok(StepOutcome::Continue)
            },
        }
    }

    /// Advance time-driven progress of a suspended action. Returns `true` once complete.
    ///
    /// # Errors
    /// - if an entity the action works on has disappeared
    pub fn tick(&mut self, delta: f32, ctx: &mut ActionContext<'_>) -> Result<bool> {
        match self {
            Action::Goto { actor, pos, speed, .. } => {
                let speed = speed.unwrap_or(ctx.world.settings.walk_speed);
                if !(speed.is_finite() && speed > 0.0) {
                    bail!("walk speed {speed} can never reach ({}, {})", pos.x, pos.y);
                }
                let walker = ctx.actor_mut(actor.as_deref())?;
                let next = walker.position().step_toward(*pos, speed * delta);
                walker.set_position(next);
                Ok(next == *pos)
            },
            Action::PlayAnimation {
                duration, elapsed, ..
            } => {
                // zero duration: only the renderer knows when it ends
                if *duration <= 0.0 {
                    return Ok(false);
                }
                *elapsed += delta;
                Ok(*elapsed >= *duration)
            },
            Action::Say {
                text,
                duration,
                elapsed,
                ..
            } => {
                *elapsed += delta;
                let limit = duration.unwrap_or_else(|| ctx.world.settings.speech_seconds(text));
                Ok(*elapsed >= limit)
            },
            Action::Wait { seconds, elapsed } => {
                *elapsed += delta;
                Ok(*elapsed >= *seconds)
            },
            Action::ShowDialog { .. } => Ok(false),
            Action::Conditional { script, .. } => Ok(script.tick(delta, ctx).is_finished()),
            Action::RunVerb { bound, script, .. } => {
                Ok(ctx.scoped(bound.as_ref(), |ctx| script.tick(delta, ctx)).is_finished())
            },
            Action::SetState { .. }
            | Action::SetProperty { .. }
            | Action::SetActorAttr { .. }
            | Action::Position { .. }
            | Action::PlaySound { .. }
            | Action::CancelVerb { .. }
            | Action::AddVerb { .. }
            | Action::ChangeScene { .. }
            | Action::SetPlayer { .. }
            | Action::RemoveActor { .. } => Ok(true),
        }
    }

    /// Release anything this action holds while in flight. Synchronous kinds do nothing.
    ///
    /// A cancelled `Goto` leaves its actor wherever the last completed frame put it.
    pub fn cancel(&mut self, ctx: &mut ActionContext<'_>) {
        match self {
            Action::Goto { origin, .. } => *origin = None,
            Action::PlayAnimation { elapsed, .. } | Action::Say { elapsed, .. } | Action::Wait { elapsed, .. } => {
                *elapsed = 0.0;
            },
            Action::ShowDialog { .. } => release_dialog(ctx),
            Action::Conditional { script, .. } => script.cancel(ctx),
            Action::RunVerb { bound, script, .. } => ctx.scoped(bound.as_ref(), |ctx| script.cancel(ctx)),
            Action::SetState { .. }
            | Action::SetProperty { .. }
            | Action::SetActorAttr { .. }
            | Action::Position { .. }
            | Action::PlaySound { .. }
            | Action::CancelVerb { .. }
            | Action::AddVerb { .. }
            | Action::ChangeScene { .. }
            | Action::SetPlayer { .. }
            | Action::RemoveActor { .. } => {},
        }
    }

    /// Clear progress so the action can run again from scratch.
    pub fn reset(&mut self) {
        match self {
            Action::Goto { origin, .. } => *origin = None,
            Action::PlayAnimation { elapsed, .. } | Action::Say { elapsed, .. } | Action::Wait { elapsed, .. } => {
                *elapsed = 0.0;
            },
            Action::Conditional { script, .. } => script.reset(),
            Action::RunVerb { bound, script, .. } => {
                *bound = None;
                *script = Script::default();
            },
            _ => {},
        }
    }

    /// The nested sequence this action drives, with the owner its actions are scoped to
    /// (`None` when they share the enclosing verb's owner).
    pub fn nested_script_mut(&mut self) -> Option<(&mut Script, Option<&VerbOwner>)> {
        match self {
            Action::Conditional { script, .. } => Some((script, None)),
            Action::RunVerb { bound, script, .. } => Some((script, bound.as_ref())),
            Action::SetState { .. }
            | Action::SetProperty { .. }
            | Action::SetActorAttr { .. }
            | Action::Position { .. }
            | Action::Goto { .. }
            | Action::PlayAnimation { .. }
            | Action::PlaySound { .. }
            | Action::Say { .. }
            | Action::Wait { .. }
            | Action::ShowDialog { .. }
            | Action::CancelVerb { .. }
            | Action::AddVerb { .. }
            | Action::ChangeScene { .. }
            | Action::SetPlayer { .. }
            | Action::RemoveActor { .. } => None,
        }
    }

    pub fn nested_script(&self) -> Option<(&Script, Option<&VerbOwner>)> {
        match self {
            Action::Conditional { script, .. } => Some((script, None)),
            Action::RunVerb { bound, script, .. } => Some((script, bound.as_ref())),
            _ => None,
        }
    }
}

fn set_state(ctx: &mut ActionContext<'_>, target: &Target, state: Option<&str>) -> Result<StepOutcome> {
    let owner = ctx.resolve_target(target)?;
    ctx.world.set_state_of(&owner, state.map(str::to_string))?;
    info!("└─ action: SetState({owner}, {state:?})");
    Ok(StepOutcome::Continue)
}

fn set_property(ctx: &mut ActionContext<'_>, target: &Target, name: &str, value: Option<&str>) -> Result<StepOutcome> {
    let owner = ctx.resolve_target(target)?;
    ctx.world.set_property_of(&owner, name, value.map(str::to_string))?;
    match value {
        Some(value) => info!("└─ action: SetProperty({owner}, {name} = \"{value}\")"),
        None => info!("└─ action: SetProperty({owner}, {name} removed)"),
    }
    Ok(StepOutcome::Continue)
}

fn set_actor_attr(
    ctx: &mut ActionContext<'_>,
    actor: Option<&str>,
    visible: Option<bool>,
    interaction: Option<bool>,
    layer: Option<&str>,
) -> Result<StepOutcome> {
    let (scene_id, actor_id) = ctx.resolve_actor(actor)?;
    let scene = ctx
        .world
        .scene_mut(&scene_id)
        .ok_or_else(|| anyhow!("scene '{scene_id}' not found"))?;
    if let Some(layer) = layer {
        scene.set_actor_layer(&actor_id, layer)?;
    }
    let target = scene
        .actor_mut(&actor_id)
        .ok_or_else(|| anyhow!("actor '{actor_id}' not found in scene '{scene_id}'"))?;
    if let Some(visible) = visible {
        target.visible = visible;
    }
    if let Some(interaction) = interaction {
        target.interaction = interaction;
    }
    info!("└─ action: SetActorAttr({actor_id}, visible {visible:?}, interaction {interaction:?}, layer {layer:?})");
    Ok(StepOutcome::Continue)
}

fn position(ctx: &mut ActionContext<'_>, actor: Option<&str>, pos: Vec2) -> Result<StepOutcome> {
    let target = ctx.actor_mut(actor)?;
    target.set_position(pos);
    info!("└─ action: Position({}, {}, {})", target.id, pos.x, pos.y);
    Ok(StepOutcome::Continue)
}

fn start_walk(
    ctx: &mut ActionContext<'_>,
    actor: Option<&str>,
    pos: Vec2,
    origin: &mut Option<Vec2>,
) -> Result<StepOutcome> {
    let walker = ctx.actor(actor)?;
    let start = walker.position();
    let actor_id = walker.id.clone();
    if start == pos {
        info!("└─ action: Goto({actor_id}) already at ({}, {})", pos.x, pos.y);
        return Ok(StepOutcome::Continue);
    }
    *origin = Some(start);
    info!(
        "└─ action: Goto({actor_id}) from ({}, {}) to ({}, {})",
        start.x, start.y, pos.x, pos.y
    );
    ctx.emit(EngineEvent::Walk {
        actor: actor_id,
        to: pos,
    });
    Ok(StepOutcome::Suspend)
}

fn play_animation(ctx: &mut ActionContext<'_>, actor: Option<&str>, animation: &str, wait: bool) -> Result<StepOutcome> {
    let target = ctx.actor_mut(actor)?;
    target.animation = Some(animation.to_string());
    let actor_id = target.id.clone();
    info!("└─ action: PlayAnimation({actor_id}, \"{animation}\", wait: {wait})");
    ctx.emit(EngineEvent::Animation {
        actor: actor_id,
        animation: animation.to_string(),
    });
    Ok(if wait {
        StepOutcome::Suspend
    } else {
        StepOutcome::Continue
    })
}

fn play_sound(ctx: &mut ActionContext<'_>, actor: Option<&str>, sound: &str) -> Result<StepOutcome> {
    let target = ctx.actor_mut(actor)?;
    let actor_id = target.id.clone();
    let fx = target.play_sound(sound)?.clone();
    info!("└─ action: PlaySound({actor_id}, \"{sound}\")");
    ctx.emit(EngineEvent::Sound {
        actor: actor_id,
        sound: fx.id,
        file: fx.file,
        looping: fx.looping,
        volume: fx.volume,
    });
    Ok(StepOutcome::Continue)
}

fn say(ctx: &mut ActionContext<'_>, actor: Option<&str>, text: &str, wait: bool) -> Result<StepOutcome> {
    let actor_id = ctx.actor(actor)?.id.clone();
    info!("└─ action: Say({actor_id}, \"{text}\")");
    ctx.emit(EngineEvent::Speech {
        actor: actor_id,
        text: text.to_string(),
    });
    Ok(if wait {
        StepOutcome::Suspend
    } else {
        StepOutcome::Continue
    })
}

fn show_dialog(ctx: &mut ActionContext<'_>, actor: Option<&str>, dialog: &str) -> Result<StepOutcome> {
    let (scene_id, actor_id) = ctx.resolve_actor(actor)?;
    let options: Vec<String> = ctx
        .actor(actor)?
        .dialog(dialog)
        .ok_or_else(|| anyhow!("actor '{actor_id}' has no dialog '{dialog}'"))?
        .visible_options()
        .map(|option| option.text.clone())
        .collect();
    if options.is_empty() {
        info!("└─ action: ShowDialog({actor_id}, {dialog}) has no options left, skipped");
        return Ok(StepOutcome::Continue);
    }
    if let Some(open) = &ctx.world.active_dialog
        && open.handle != *ctx.handle()
    {
        bail!("dialog '{}' of '{}' is already open", open.dialog, open.actor);
    }

    info!("└─ action: ShowDialog({actor_id}, {dialog}) with {} option(s)", options.len());
    ctx.world.active_dialog = Some(ActiveDialog {
        handle: ctx.handle().clone(),
        scene: scene_id,
        actor: actor_id.clone(),
        dialog: dialog.to_string(),
    });
    ctx.emit(EngineEvent::DialogOpened {
        actor: actor_id,
        dialog: dialog.to_string(),
        options,
    });
    Ok(StepOutcome::Suspend)
}

/// Close the active dialog if the running verb opened it.
fn release_dialog(ctx: &mut ActionContext<'_>) {
    let owned = ctx
        .world
        .active_dialog
        .as_ref()
        .is_some_and(|open| open.handle == *ctx.handle());
    if owned && let Some(open) = ctx.world.active_dialog.take() {
        info!("└─ action: closing dialog '{}' of '{}'", open.dialog, open.actor);
        ctx.emit(EngineEvent::DialogClosed {
            actor: open.actor,
            dialog: open.dialog,
        });
    }
}

/// Resolve the verb a `RunVerb` names and return fresh copies of its actions.
fn inline_verb(
    ctx: &mut ActionContext<'_>,
    owner: &Target,
    verb: &str,
    target: Option<&str>,
) -> Result<Option<(VerbOwner, Vec<Action>)>> {
    let resolved = ctx.resolve_target(owner)?;
    let Some(handle) = ctx.world.resolve_handle(&resolved, verb, target) else {
        info!("└─ action: RunVerb({verb}) on {resolved}: no such verb, skipped");
        return Ok(None);
    };
    if handle == *ctx.handle() {
        bail!("verb {handle} cannot run itself");
    }
    let actions = ctx
        .world
        .verb(&handle)
        .map(Verb::fresh_actions)
        .ok_or_else(|| anyhow!("verb {handle} is already running"))?;
    info!("└─ action: RunVerb({handle})");
    Ok(Some((resolved, actions)))
}

fn cancel_verb(ctx: &mut ActionContext<'_>, owner: &Target, verb: &str, target: Option<&str>) -> Result<StepOutcome> {
    let resolved = ctx.resolve_target(owner)?;
    let Some(handle) = ctx.world.resolve_handle(&resolved, verb, target) else {
        info!("└─ action: CancelVerb({verb}) on {resolved}: no such verb, skipped");
        return Ok(StepOutcome::Continue);
    };
    if handle == *ctx.handle() {
        info!("└─ action: CancelVerb({handle}), cancelling self");
        ctx.request_cancel();
        return Ok(StepOutcome::Continue);
    }
    info!("└─ action: CancelVerb({handle})");
    if !ctx.world.cancel_verb(&handle) {
        warn!("verb {handle} is executing further up the stack and was not cancelled");
    }
    Ok(StepOutcome::Continue)
}

fn add_verb(ctx: &mut ActionContext<'_>, owner: &Target, verb: &Verb) -> Result<StepOutcome> {
    let resolved = ctx.resolve_target(owner)?;
    if resolved == ctx.handle().owner {
        bail!(
            "{resolved} cannot gain verbs while its verb {} is executing",
            ctx.handle().key
        );
    }
    let manager = ctx
        .world
        .verb_manager_mut(&resolved)
        .ok_or_else(|| anyhow!("{resolved} not found"))?;
    let mut fresh = verb.clone();
    fresh.script.reset();
    info!("└─ action: AddVerb({resolved}, {})", fresh.key());
    manager.add_verb(fresh);
    Ok(StepOutcome::Continue)
}
