use std::collections::HashSet;
use std::fmt;

use crate::*;

/// Validation error for malformed or missing references in a WorldDef.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    DuplicateId { kind: &'static str, id: String },
    MissingReference { kind: &'static str, id: String, context: String },
    InvalidValue { context: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateId { kind, id } => {
                write!(f, "duplicate {kind} id '{id}'")
            },
            ValidationError::MissingReference { kind, id, context } => {
                write!(f, "missing {kind} '{id}' ({context})")
            },
            ValidationError::InvalidValue { context } => {
                write!(f, "invalid value ({context})")
            },
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate cross-references and basic invariants in a WorldDef.
///
/// ```
/// use tableau_data::{ActorDef, GameDef, SceneDef, WorldDef, validate_world};
///
/// let world = WorldDef {
///     game: GameDef {
///         title: "Demo".into(),
///         initial_scene: "hall".into(),
///         player: Some("hero".into()),
///         ..GameDef::default()
///     },
///     scenes: vec![SceneDef {
///         id: "hall".into(),
///         actors: vec![ActorDef {
///             id: "hero".into(),
///             ..ActorDef::default()
///         }],
///         ..SceneDef::default()
///     }],
///     ..WorldDef::default()
/// };
/// assert!(validate_world(&world).is_empty());
/// ```
pub fn validate_world(world: &WorldDef) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut scenes = HashSet::new();
    track_ids(
        "scene",
        world.scenes.iter().map(|s| s.id.as_str()),
        &mut scenes,
        &mut errors,
    );

    if world.game.initial_scene.trim().is_empty() {
        errors.push(ValidationError::InvalidValue {
            context: "game initial scene missing".to_string(),
        });
    } else {
        check_ref(
            "scene",
            &world.game.initial_scene,
            &scenes,
            "game initial scene".to_string(),
            &mut errors,
        );
    }

    if let Some(player) = &world.game.player {
        let in_initial = world
            .scenes
            .iter()
            .filter(|s| s.id == world.game.initial_scene)
            .any(|s| s.actors.iter().any(|a| &a.id == player));
        if !in_initial {
            errors.push(ValidationError::MissingReference {
                kind: "actor",
                id: player.clone(),
                context: "game player must live in the initial scene".to_string(),
            });
        }
    }

    for scene in &world.scenes {
        let mut actors = HashSet::new();
        track_ids(
            "actor",
            scene.actors.iter().map(|a| a.id.as_str()),
            &mut actors,
            &mut errors,
        );
        let mut layers = HashSet::new();
        track_ids(
            "layer",
            scene.layers.iter().map(|l| l.name.as_str()),
            &mut layers,
            &mut errors,
        );

        for actor in &scene.actors {
            validate_actor(actor, &scene.id, &mut errors);
            let scope = VerbScope {
                world,
                scenes: &scenes,
                scene: Some(scene),
                actor: Some(actor),
            };
            for verb in &actor.verbs {
                validate_verb(verb, &scope, &mut errors, &format!("actor '{}.{}'", scene.id, actor.id));
            }
        }

        let scope = VerbScope {
            world,
            scenes: &scenes,
            scene: Some(scene),
            actor: None,
        };
        for verb in &scene.verbs {
            validate_verb(verb, &scope, &mut errors, &format!("scene '{}'", scene.id));
        }
    }

    let scope = VerbScope {
        world,
        scenes: &scenes,
        scene: None,
        actor: None,
    };
    for verb in &world.verbs {
        validate_verb(verb, &scope, &mut errors, "global verbs");
    }

    errors
}

/// Where a verb lives, which decides how actor references resolve.
struct VerbScope<'a> {
    world: &'a WorldDef,
    scenes: &'a HashSet<String>,
    scene: Option<&'a SceneDef>,
    actor: Option<&'a ActorDef>,
}

impl<'a> VerbScope<'a> {
    /// Resolve an optional actor reference, defaulting to the verb's owning actor.
    fn resolve_actor(&self, actor: Option<&Id>, errors: &mut Vec<ValidationError>, context: &str) -> Option<&'a ActorDef> {
        match actor {
            Some(id) => {
                let found = match self.scene {
                    Some(scene) => scene.actors.iter().find(|a| &a.id == id),
                    None => self.world.scenes.iter().flat_map(|s| s.actors.iter()).find(|a| &a.id == id),
                };
                if found.is_none() {
                    errors.push(ValidationError::MissingReference {
                        kind: "actor",
                        id: id.clone(),
                        context: context.to_string(),
                    });
                }
                found
            },
            None => {
                if self.actor.is_none() {
                    errors.push(ValidationError::InvalidValue {
                        context: format!("{context}: no actor given and the verb is not owned by an actor"),
                    });
                }
                self.actor
            },
        }
    }

    fn check_target(&self, target: &TargetDef, errors: &mut Vec<ValidationError>, context: &str) {
        if let TargetDef::Actor(id) = target {
            self.resolve_actor(Some(id), errors, context);
        }
    }
}

fn validate_actor(actor: &ActorDef, scene_id: &str, errors: &mut Vec<ValidationError>) {
    let context = format!("actor '{scene_id}.{}'", actor.id);
    if actor.id.trim().is_empty() {
        errors.push(ValidationError::InvalidValue {
            context: format!("scene '{scene_id}' has an actor with an empty id"),
        });
    }
    if matches!(actor.bbox.len(), 1 | 2) {
        errors.push(ValidationError::InvalidValue {
            context: format!("{context} hit region needs at least 3 vertices, got {}", actor.bbox.len()),
        });
    }
    if !point_is_finite(actor.pos) || !actor.bbox.iter().all(|p| point_is_finite(*p)) {
        errors.push(ValidationError::InvalidValue {
            context: format!("{context} has non-finite geometry"),
        });
    }

    let mut dialogs = HashSet::new();
    track_ids(
        "dialog",
        actor.dialogs.iter().map(|d| d.id.as_str()),
        &mut dialogs,
        errors,
    );
    let mut sounds = HashSet::new();
    track_ids("sound", actor.sounds.iter().map(|s| s.id.as_str()), &mut sounds, errors);
    for sound in &actor.sounds {
        if !(0.0..=1.0).contains(&sound.volume) {
            errors.push(ValidationError::InvalidValue {
                context: format!("{context} sound '{}' volume out of range ({})", sound.id, sound.volume),
            });
        }
    }
}

fn validate_verb(verb: &VerbDef, scope: &VerbScope<'_>, errors: &mut Vec<ValidationError>, context: &str) {
    if verb.id.trim().is_empty() {
        errors.push(ValidationError::InvalidValue {
            context: format!("{context} has a verb with an empty id"),
        });
    }
    let context = format!("{context} verb '{}'", verb.id);
    for (idx, action) in verb.actions.iter().enumerate() {
        validate_action(action, scope, errors, &format!("{context} action {idx}"));
    }
}

fn validate_action(action: &ActionDef, scope: &VerbScope<'_>, errors: &mut Vec<ValidationError>, context: &str) {
    match action {
        ActionDef::SetState { target, .. } | ActionDef::SetProperty { target, .. } => {
            scope.check_target(target, errors, context);
        },
        ActionDef::SetActorAttr { actor, .. } => {
            scope.resolve_actor(actor.as_ref(), errors, context);
        },
        ActionDef::Position { actor, pos } => {
            scope.resolve_actor(actor.as_ref(), errors, context);
            check_point(*pos, errors, context);
        },
        ActionDef::Goto { actor, pos, speed } => {
            scope.resolve_actor(actor.as_ref(), errors, context);
            check_point(*pos, errors, context);
            if let Some(speed) = speed
                && !(speed.is_finite() && *speed > 0.0)
            {
                errors.push(ValidationError::InvalidValue {
                    context: format!("{context}: walk speed must be positive ({speed})"),
                });
            }
        },
        ActionDef::PlayAnimation { actor, duration, .. } => {
            scope.resolve_actor(actor.as_ref(), errors, context);
            check_duration(*duration, errors, context);
        },
        ActionDef::PlaySound { actor, sound } => {
            if let Some(owner) = scope.resolve_actor(actor.as_ref(), errors, context)
                && !owner.sounds.iter().any(|s| &s.id == sound)
            {
                errors.push(ValidationError::MissingReference {
                    kind: "sound",
                    id: sound.clone(),
                    context: format!("{context} on actor '{}'", owner.id),
                });
            }
        },
        ActionDef::Say { actor, duration, .. } => {
            scope.resolve_actor(actor.as_ref(), errors, context);
            if let Some(duration) = duration {
                check_duration(*duration, errors, context);
            }
        },
        ActionDef::Wait { seconds } => check_duration(*seconds, errors, context),
        ActionDef::ShowDialog { actor, dialog } => {
            if let Some(owner) = scope.resolve_actor(actor.as_ref(), errors, context)
                && !owner.dialogs.iter().any(|d| &d.id == dialog)
            {
                errors.push(ValidationError::MissingReference {
                    kind: "dialog",
                    id: dialog.clone(),
                    context: format!("{context} on actor '{}'", owner.id),
                });
            }
        },
        ActionDef::Conditional { condition, actions } => {
            validate_condition(condition, scope, errors, context);
            for (idx, nested) in actions.iter().enumerate() {
                validate_action(nested, scope, errors, &format!("{context} nested {idx}"));
            }
        },
        ActionDef::RunVerb { owner, verb, .. } | ActionDef::CancelVerb { owner, verb, .. } => {
            scope.check_target(owner, errors, context);
            if verb.trim().is_empty() {
                errors.push(ValidationError::InvalidValue {
                    context: format!("{context}: verb id is empty"),
                });
            }
        },
        ActionDef::AddVerb { owner, verb } => {
            scope.check_target(owner, errors, context);
            validate_verb(verb, scope, errors, context);
        },
        ActionDef::ChangeScene { scene } => {
            check_ref("scene", scene, scope.scenes, context.to_string(), errors);
        },
        ActionDef::SetPlayer { actor } => {
            if let Some(actor) = actor {
                scope.resolve_actor(Some(actor), errors, context);
            }
        },
        ActionDef::RemoveActor { actor } => {
            scope.resolve_actor(Some(actor), errors, context);
        },
    }
}

fn validate_condition(cond: &ConditionDef, scope: &VerbScope<'_>, errors: &mut Vec<ValidationError>, context: &str) {
    match cond {
        ConditionDef::StateIs { target, .. } | ConditionDef::PropertyIs { target, .. } => {
            scope.check_target(target, errors, context);
        },
        ConditionDef::Visible { actor } | ConditionDef::PlayerInside { actor } => {
            scope.resolve_actor(actor.as_ref(), errors, context);
        },
        ConditionDef::Not(inner) => validate_condition(inner, scope, errors, context),
        ConditionDef::All(conds) | ConditionDef::Any(conds) => {
            for inner in conds {
                validate_condition(inner, scope, errors, context);
            }
        },
    }
}

fn check_duration(seconds: f32, errors: &mut Vec<ValidationError>, context: &str) {
    if !(seconds.is_finite() && seconds >= 0.0) {
        errors.push(ValidationError::InvalidValue {
            context: format!("{context}: duration must be a non-negative number of seconds ({seconds})"),
        });
    }
}

fn check_point(point: PointDef, errors: &mut Vec<ValidationError>, context: &str) {
    if !point_is_finite(point) {
        errors.push(ValidationError::InvalidValue {
            context: format!("{context}: non-finite position"),
        });
    }
}

fn point_is_finite(point: PointDef) -> bool {
    point.x.is_finite() && point.y.is_finite()
}

fn track_ids<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
    set: &mut HashSet<String>,
    errors: &mut Vec<ValidationError>,
) {
    for id in ids {
        if !set.insert(id.to_string()) {
            errors.push(ValidationError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
}

fn check_ref(kind: &'static str, id: &str, set: &HashSet<String>, context: String, errors: &mut Vec<ValidationError>) {
    if !set.contains(id) {
        errors.push(ValidationError::MissingReference {
            kind,
            id: id.to_string(),
            context,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(id: &str) -> ActorDef {
        ActorDef {
            id: id.to_string(),
            ..ActorDef::default()
        }
    }

    fn base_world() -> WorldDef {
        WorldDef {
            game: GameDef {
                title: "Demo".into(),
                initial_scene: "hall".into(),
                player: Some("hero".into()),
                ..GameDef::default()
            },
            scenes: vec![SceneDef {
                id: "hall".into(),
                actors: vec![actor("hero"), actor("door")],
                ..SceneDef::default()
            }],
            ..WorldDef::default()
        }
    }

    fn verb(id: &str, actions: Vec<ActionDef>) -> VerbDef {
        VerbDef {
            id: id.to_string(),
            state: None,
            target: None,
            actions,
        }
    }

    #[test]
    fn base_world_is_valid() {
        assert!(validate_world(&base_world()).is_empty());
    }

    #[test]
    fn duplicate_ids_are_reported() {
        let mut world = base_world();
        world.scenes[0].actors.push(actor("door"));

        let errors = validate_world(&world);
        assert!(
            errors
                .iter()
                .any(|err| matches!(err, ValidationError::DuplicateId { kind, id } if *kind == "actor" && id == "door"))
        );
    }

    #[test]
    fn missing_initial_scene_and_player_are_reported() {
        let mut world = base_world();
        world.game.initial_scene = "attic".into();

        let errors = validate_world(&world);
        assert!(errors.iter().any(|err| matches!(err, ValidationError::MissingReference { kind, id, .. } if *kind == "scene" && id == "attic")));
        assert!(errors.iter().any(|err| matches!(err, ValidationError::MissingReference { kind, id, .. } if *kind == "actor" && id == "hero")));
    }

    #[test]
    fn degenerate_hit_region_is_reported() {
        let mut world = base_world();
        world.scenes[0].actors[1].bbox = vec![PointDef { x: 0.0, y: 0.0 }, PointDef { x: 1.0, y: 0.0 }];

        let errors = validate_world(&world);
        assert!(
            errors
                .iter()
                .any(|err| matches!(err, ValidationError::InvalidValue { context } if context.contains("3 vertices")))
        );
    }

    #[test]
    fn negative_wait_is_reported() {
        let mut world = base_world();
        world.scenes[0].verbs.push(verb("init", vec![ActionDef::Wait { seconds: -1.0 }]));

        let errors = validate_world(&world);
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], ValidationError::InvalidValue { context } if context.contains("scene 'hall' verb 'init' action 0")));
    }

    #[test]
    fn owner_actor_required_outside_actor_verbs() {
        let mut world = base_world();
        world.scenes[0].verbs.push(verb(
            "init",
            vec![ActionDef::Say {
                actor: None,
                text: "hello".into(),
                duration: None,
                wait: false,
            }],
        ));

        let errors = validate_world(&world);
        assert!(
            errors
                .iter()
                .any(|err| matches!(err, ValidationError::InvalidValue { context } if context.contains("not owned by an actor")))
        );
    }

    #[test]
    fn dialog_and_sound_references_are_checked_on_the_resolved_actor() {
        let mut world = base_world();
        world.scenes[0].actors[1].verbs.push(verb(
            "talkto",
            vec![
                ActionDef::ShowDialog {
                    actor: None,
                    dialog: "chat".into(),
                },
                ActionDef::PlaySound {
                    actor: Some("hero".into()),
                    sound: "creak".into(),
                },
            ],
        ));

        let errors = validate_world(&world);
        assert!(errors.iter().any(|err| matches!(err, ValidationError::MissingReference { kind, id, .. } if *kind == "dialog" && id == "chat")));
        assert!(errors.iter().any(|err| matches!(err, ValidationError::MissingReference { kind, id, .. } if *kind == "sound" && id == "creak")));
    }

    #[test]
    fn nested_conditional_actions_are_validated() {
        let mut world = base_world();
        world.scenes[0].actors[1].verbs.push(verb(
            "use",
            vec![ActionDef::Conditional {
                condition: ConditionDef::Not(Box::new(ConditionDef::Visible {
                    actor: Some("ghost".into()),
                })),
                actions: vec![ActionDef::ChangeScene {
                    scene: "nowhere".into(),
                }],
            }],
        ));

        let errors = validate_world(&world);
        assert!(errors.iter().any(|err| matches!(err, ValidationError::MissingReference { kind, id, .. } if *kind == "actor" && id == "ghost")));
        assert!(errors.iter().any(|err| matches!(err, ValidationError::MissingReference { kind, id, .. } if *kind == "scene" && id == "nowhere")));
    }

    #[test]
    fn world_def_parses_from_ron() {
        let src = r#"(
            game: (title: "Demo", initial_scene: "hall", player: Some("hero")),
            scenes: [(
                id: "hall",
                actors: [
                    (id: "hero"),
                    (
                        id: "door",
                        bbox: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0)],
                        verbs: [(id: "enter", actions: [SetState(target: Owner, state: Some("open")), Wait(seconds: 1.0)])],
                    ),
                ],
            )],
        )"#;
        let world: WorldDef = ron::from_str(src).expect("parse worlddef");
        assert!(validate_world(&world).is_empty());
        assert_eq!(world.scenes[0].actors[1].verbs[0].actions.len(), 2);
        assert_eq!(world.scenes[0].actors[0].layer, "main");
    }
}
