//! WorldDef loader and conversion helpers.
//!
//! Converts the serialized `WorldDef` data model into runtime engine structs.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

use tableau_data::{
    ActionDef, ActorDef, ConditionDef, DialogDef, LayerDef, SceneDef, SoundDef, VerbDef, WorldDef,
};

use crate::actor::{Actor, Dialog, DialogOption, SoundFx};
use crate::geometry::{Polygon, Vec2};
use crate::scene::{Scene, SceneLayer};
use crate::verb::{Action, Condition, Target, Verb, VerbManager};
use crate::world::World;

/// Load a `WorldDef` from a RON file.
///
/// # Errors
/// - if the file cannot be read or is not a valid `WorldDef`
pub fn load_worlddef(path: &Path) -> Result<WorldDef> {
    let text = fs::read_to_string(path).with_context(|| format!("reading worlddef from '{}'", path.display()))?;
    ron::from_str(&text).with_context(|| format!("parsing worlddef RON from '{}'", path.display()))
}

/// Convert a validated `WorldDef` into a `World` positioned at its initial scene.
///
/// The initial scene's `init` verb has not run yet; see [`World::start`].
///
/// # Errors
/// - if the initial scene or the player actor does not exist
pub fn build_world_from_def(def: &WorldDef) -> Result<World> {
    let mut world = World::new_empty();
    world.title.clone_from(&def.game.title);
    world.properties = def.properties.clone().into_iter().collect();
    world.verbs = verbs_from_defs(&def.verbs);

    for scene_def in &def.scenes {
        world.add_scene(scene_from_def(scene_def));
    }

    if !world.scenes.contains_key(&def.game.initial_scene) {
        bail!("initial scene '{}' not found", def.game.initial_scene);
    }
    world.current_scene = Some(def.game.initial_scene.clone());
    if let Some(player) = &def.game.player {
        world
            .set_player(Some(player))
            .with_context(|| format!("placing player '{player}'"))?;
    }
    Ok(world)
}

fn scene_from_def(def: &SceneDef) -> Scene {
    let mut scene = Scene::new(def.id.clone());
    scene.state.clone_from(&def.state);
    for layer in &def.layers {
        scene.add_layer(layer_from_def(layer));
    }
    for actor_def in &def.actors {
        scene.add_actor(actor_from_def(actor_def));
    }
    scene.verbs = verbs_from_defs(&def.verbs);
    scene.properties = def.properties.clone().into_iter().collect();
    scene
}

fn layer_from_def(def: &LayerDef) -> SceneLayer {
    SceneLayer {
        name: def.name.clone(),
        visible: def.visible,
        dynamic: def.dynamic,
        actors: Vec::new(),
    }
}

fn actor_from_def(def: &ActorDef) -> Actor {
    let mut actor = Actor::new(def.id.clone());
    actor.desc.clone_from(&def.desc);
    actor.state.clone_from(&def.state);
    actor.layer.clone_from(&def.layer);
    actor.z_index = def.z_index;
    actor.visible = def.visible;
    actor.interaction = def.interaction;
    actor.bbox = Polygon::new(
        Vec2::from(def.pos),
        def.bbox.iter().copied().map(Vec2::from).collect(),
    );
    actor.verbs = verbs_from_defs(&def.verbs);
    actor.dialogs = def.dialogs.iter().map(dialog_from_def).collect();
    actor.sounds = def.sounds.iter().map(sound_from_def).collect();
    actor.properties = def.properties.clone().into_iter().collect();
    actor
}

fn dialog_from_def(def: &DialogDef) -> Dialog {
    Dialog {
        id: def.id.clone(),
        options: def
            .options
            .iter()
            .map(|option| DialogOption {
                text: option.text.clone(),
                verb: option.verb.clone(),
                once: option.once,
                chosen: false,
            })
            .collect(),
    }
}

fn sound_from_def(def: &SoundDef) -> SoundFx {
    SoundFx {
        id: def.id.clone(),
        file: def.file.clone(),
        looping: def.looping,
        volume: def.volume,
    }
}

fn verbs_from_defs(defs: &[VerbDef]) -> VerbManager {
    let mut manager = VerbManager::new();
    for def in defs {
        manager.add_verb(verb_from_def(def));
    }
    manager
}

/// Convert one verb definition into a not-yet-started verb.
fn verb_from_def(def: &VerbDef) -> Verb {
    Verb::new(def.id.clone())
        .with_state(def.state.as_deref())
        .with_target(def.target.as_deref())
        .with_actions(def.actions.iter().map(action_from_def).collect())
}

fn action_from_def(def: &ActionDef) -> Action {
    match def {
        ActionDef::SetState { target, state } => Action::SetState {
            target: Target::from(target),
            state: state.clone(),
        },
        ActionDef::SetProperty { target, name, value } => Action::SetProperty {
            target: Target::from(target),
            name: name.clone(),
            value: value.clone(),
        },
        ActionDef::SetActorAttr {
            actor,
            visible,
            interaction,
            layer,
        } => Action::SetActorAttr {
            actor: actor.clone(),
            visible: *visible,
            interaction: *interaction,
            layer: layer.clone(),
        },
        ActionDef::Position { actor, pos } => Action::Position {
            actor: actor.clone(),
            pos: Vec2::from(*pos),
        },
        ActionDef::Goto { actor, pos, speed } => Action::goto(actor.as_deref(), Vec2::from(*pos), *speed),
        ActionDef::PlayAnimation {
            actor,
            animation,
            duration,
            wait,
        } => Action::play_animation(actor.as_deref(), animation, *duration, *wait),
        ActionDef::PlaySound { actor, sound } => Action::PlaySound {
            actor: actor.clone(),
            sound: sound.clone(),
        },
        ActionDef::Say {
            actor,
            text,
            duration,
            wait,
        } => Action::say(actor.as_deref(), text, *duration, *wait),
        ActionDef::Wait { seconds } => Action::wait(*seconds),
        ActionDef::ShowDialog { actor, dialog } => Action::ShowDialog {
            actor: actor.clone(),
            dialog: dialog.clone(),
        },
        ActionDef::Conditional { condition, actions } => Action::conditional(
            condition_from_def(condition),
            actions.iter().map(action_from_def).collect(),
        ),
        ActionDef::RunVerb { owner, verb, target } => {
            Action::run_verb(Target::from(owner), verb, target.as_deref())
        },
        ActionDef::CancelVerb { owner, verb, target } => Action::CancelVerb {
            owner: Target::from(owner),
            verb: verb.clone(),
            target: target.clone(),
        },
        ActionDef::AddVerb { owner, verb } => Action::AddVerb {
            owner: Target::from(owner),
            verb: Box::new(verb_from_def(verb)),
        },
        ActionDef::ChangeScene { scene } => Action::ChangeScene { scene: scene.clone() },
        ActionDef::SetPlayer { actor } => Action::SetPlayer { actor: actor.clone() },
        ActionDef::RemoveActor { actor } => Action::RemoveActor { actor: actor.clone() },
    }
}

fn condition_from_def(def: &ConditionDef) -> Condition {
    match def {
        ConditionDef::StateIs { target, state } => Condition::StateIs {
            target: Target::from(target),
            state: state.clone(),
        },
        ConditionDef::PropertyIs { target, name, value } => Condition::PropertyIs {
            target: Target::from(target),
            name: name.clone(),
            value: value.clone(),
        },
        ConditionDef::Visible { actor } => Condition::Visible { actor: actor.clone() },
        ConditionDef::PlayerInside { actor } => Condition::PlayerInside { actor: actor.clone() },
        ConditionDef::Not(inner) => Condition::Not(Box::new(condition_from_def(inner))),
        ConditionDef::All(list) => Condition::All(list.iter().map(condition_from_def).collect()),
        ConditionDef::Any(list) => Condition::Any(list.iter().map(condition_from_def).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tableau_data::{GameDef, PointDef, TargetDef};

    fn def() -> WorldDef {
        WorldDef {
            game: GameDef {
                title: "Test".into(),
                initial_scene: "hall".into(),
                player: Some("hero".into()),
                ..GameDef::default()
            },
            scenes: vec![SceneDef {
                id: "hall".into(),
                actors: vec![
                    ActorDef {
                        id: "hero".into(),
                        ..ActorDef::default()
                    },
                    ActorDef {
                        id: "door".into(),
                        layer: "walls".into(),
                        pos: PointDef { x: 10.0, y: 0.0 },
                        bbox: vec![
                            PointDef { x: 0.0, y: 0.0 },
                            PointDef { x: 5.0, y: 0.0 },
                            PointDef { x: 5.0, y: 5.0 },
                        ],
                        verbs: vec![VerbDef {
                            id: "open".into(),
                            state: Some("closed".into()),
                            target: None,
                            actions: vec![
                                ActionDef::Wait { seconds: 1.0 },
                                ActionDef::Conditional {
                                    condition: ConditionDef::Not(Box::new(ConditionDef::Visible { actor: None })),
                                    actions: vec![ActionDef::SetState {
                                        target: TargetDef::Owner,
                                        state: Some("open".into()),
                                    }],
                                },
                            ],
                        }],
                        ..ActorDef::default()
                    },
                ],
                ..SceneDef::default()
            }],
            ..WorldDef::default()
        }
    }

    #[test]
    fn builds_scenes_actors_and_player() {
        let world = build_world_from_def(&def()).unwrap();
        assert_eq!(world.title, "Test");
        assert_eq!(world.current_scene.as_deref(), Some("hall"));
        assert_eq!(world.player_actor().unwrap().id, "hero");

        let hall = world.scene("hall").unwrap();
        assert_eq!(hall.layer("walls").unwrap().actors, vec!["door".to_string()]);
        let door = hall.actor("door").unwrap();
        assert_eq!(door.scene.as_deref(), Some("hall"));
        assert!(door.hit(Vec2::new(12.0, 1.0)));
        assert!(!door.hit(Vec2::new(1.0, 1.0)));
    }

    #[test]
    fn verbs_keep_keys_and_nested_actions() {
        let world = build_world_from_def(&def()).unwrap();
        let door = world.scene("hall").unwrap().actor("door").unwrap();
        let open = door.verbs.get_verb("open", Some("closed"), None).unwrap();
        assert_eq!(open.ip(), None);
        assert_eq!(open.actions().len(), 2);
        match &open.actions()[1] {
            Action::Conditional { script, .. } => assert_eq!(script.len(), 1),
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn missing_initial_scene_is_an_error() {
        let mut def = def();
        def.game.initial_scene = "attic".into();
        assert!(build_world_from_def(&def).is_err());
    }
}
