use ae::verb::{Condition, Target};
use ae::*;
use tableau_engine as ae;

fn set(name: &str, value: &str) -> Action {
    Action::SetProperty {
        target: Target::World,
        name: name.into(),
        value: Some(value.into()),
    }
}

fn prop<'a>(world: &'a World, name: &str) -> Option<&'a str> {
    world.properties.get(name).map(String::as_str)
}

/// A scene "hall" with actors "hero" (the player) and "chest".
fn hall_world() -> World {
    let mut world = World::new_empty();
    let mut scene = Scene::new("hall");
    scene.add_actor(Actor::new("hero"));
    scene.add_actor(Actor::new("chest"));
    world.add_scene(scene);
    world.current_scene = Some("hall".into());
    world.set_player(Some("hero")).unwrap();
    world
}

fn chest() -> VerbOwner {
    VerbOwner::actor("hall", "chest")
}

fn give_chest(world: &mut World, verb: Verb) -> VerbHandle {
    let handle = VerbHandle::new(chest(), verb.key());
    world
        .scene_mut("hall")
        .and_then(|s| s.actor_mut("chest"))
        .unwrap()
        .verbs
        .add_verb(verb);
    handle
}

#[test]
fn synchronous_verb_runs_to_completion() {
    let mut world = hall_world();
    let handle = give_chest(
        &mut world,
        Verb::new("open").with_actions(vec![
            set("a", "1"),
            Action::SetState {
                target: Target::Owner,
                state: Some("open".into()),
            },
            set("b", "2"),
        ]),
    );

    assert_eq!(world.run_verb(&chest(), "open", None), Some(RunState::Finished));
    let verb = world.verb(&handle).unwrap();
    assert_eq!(verb.ip(), Some(3));
    assert!(verb.is_finished());
    assert_eq!(prop(&world, "a"), Some("1"));
    assert_eq!(prop(&world, "b"), Some("2"));
    assert_eq!(world.state_of(&chest()).unwrap(), Some("open"));
}

#[test]
fn suspend_then_resume_continues_after_the_suspending_action() {
    let mut world = hall_world();
    let handle = give_chest(
        &mut world,
        Verb::new("open").with_actions(vec![set("a", "1"), Action::wait(10.0), set("b", "2")]),
    );

    assert_eq!(world.run_verb(&chest(), "open", None), Some(RunState::Suspended));
    assert_eq!(world.verb(&handle).unwrap().ip(), Some(1));
    assert_eq!(prop(&world, "a"), Some("1"));
    assert_eq!(prop(&world, "b"), None);

    assert_eq!(world.resume_verb(&handle), Ok(RunState::Finished));
    assert_eq!(prop(&world, "b"), Some("2"));

    // a second resume is rejected and leaves the cursor alone
    let err = world.resume_verb(&handle).unwrap_err();
    assert!(matches!(err, VerbError::NotSuspended { ip: Some(3), .. }));
    assert_eq!(world.verb(&handle).unwrap().ip(), Some(3));
}

#[test]
fn resume_before_run_is_rejected() {
    let mut world = hall_world();
    let handle = give_chest(&mut world, Verb::new("open").with_actions(vec![Action::wait(1.0)]));
    assert!(matches!(
        world.resume_verb(&handle),
        Err(VerbError::NotSuspended { ip: None, .. })
    ));

    let missing = VerbHandle::new(chest(), VerbKey::new("kick", None, None));
    assert!(matches!(world.resume_verb(&missing), Err(VerbError::NotFound(_))));
}

#[test]
fn timed_actions_complete_through_update() {
    let mut world = hall_world();
    let handle = give_chest(
        &mut world,
        Verb::new("rattle").with_actions(vec![
            Action::wait(1.0),
            set("waited", "yes"),
            Action::say(None, "Creak.", Some(0.5), true),
            set("spoke", "yes"),
        ]),
    );

    world.run_verb(&chest(), "rattle", None);
    world.update(0.6);
    assert_eq!(prop(&world, "waited"), None);
    world.update(0.6);
    assert_eq!(prop(&world, "waited"), Some("yes"));
    assert!(world.verb(&handle).unwrap().is_suspended());
    world.update(0.6);
    assert_eq!(prop(&world, "spoke"), Some("yes"));
    assert!(world.verb(&handle).unwrap().is_finished());

    let speech: Vec<_> = world.drain_events().into_iter().filter(EngineEvent::is_speech).collect();
    assert_eq!(speech.len(), 1);
}

#[test]
fn cancel_skips_remaining_actions_but_keeps_earlier_effects() {
    let mut world = hall_world();
    let handle = give_chest(
        &mut world,
        Verb::new("open").with_actions(vec![set("a", "1"), Action::wait(1.0), set("b", "2")]),
    );

    world.run_verb(&chest(), "open", None);
    assert!(world.cancel_verb(&handle));
    let verb = world.verb(&handle).unwrap();
    assert_eq!(verb.ip(), Some(3));
    assert!(!verb.is_suspended());

    world.update(5.0);
    assert_eq!(prop(&world, "a"), Some("1"));
    assert_eq!(prop(&world, "b"), None);
    assert!(world.resume_verb(&handle).is_err());
}

#[test]
fn a_failing_action_is_skipped() {
    let mut world = hall_world();
    let handle = give_chest(
        &mut world,
        Verb::new("open").with_actions(vec![
            set("a", "1"),
            Action::SetState {
                target: Target::Actor("ghost".into()),
                state: Some("spooked".into()),
            },
            Action::PlaySound {
                actor: None,
                sound: "no-such-sound".into(),
            },
            set("b", "2"),
        ]),
    );

    assert_eq!(world.run_verb(&chest(), "open", None), Some(RunState::Finished));
    assert_eq!(world.verb(&handle).unwrap().ip(), Some(4));
    assert_eq!(prop(&world, "b"), Some("2"));
}

#[test]
fn conditional_suspends_inside_and_resumes_the_nested_sequence() {
    let mut world = hall_world();
    let handle = give_chest(
        &mut world,
        Verb::new("open").with_actions(vec![
            Action::conditional(
                Condition::StateIs {
                    target: Target::Owner,
                    state: None,
                },
                vec![Action::wait(1.0), set("inner", "done")],
            ),
            set("outer", "done"),
            Action::conditional(
                Condition::Not(Box::new(Condition::Visible { actor: None })),
                vec![set("hidden", "yes")],
            ),
        ]),
    );

    world.run_verb(&chest(), "open", None);
    assert_eq!(world.verb(&handle).unwrap().ip(), Some(0));
    assert_eq!(prop(&world, "inner"), None);

    assert_eq!(world.resume_verb(&handle), Ok(RunState::Finished));
    assert_eq!(prop(&world, "inner"), Some("done"));
    assert_eq!(prop(&world, "outer"), Some("done"));
    assert_eq!(prop(&world, "hidden"), None);
}

#[test]
fn run_verb_executes_the_other_verb_inline_for_its_owner() {
    let mut world = hall_world();
    give_chest(
        &mut world,
        Verb::new("wobble").with_actions(vec![
            Action::play_animation(None, "wobble", 0.0, true),
            Action::SetState {
                target: Target::Owner,
                state: Some("wobbled".into()),
            },
        ]),
    );
    world
        .scene_mut("hall")
        .unwrap()
        .verbs
        .add_verb(Verb::new("quake").with_actions(vec![
            Action::run_verb(Target::Actor("chest".into()), "wobble", None),
            set("quake", "over"),
        ]));
    let quake = VerbHandle::new(VerbOwner::Scene("hall".into()), VerbKey::new("quake", None, None));

    assert_eq!(
        world.run_verb(&VerbOwner::Scene("hall".into()), "quake", None),
        Some(RunState::Suspended)
    );
    // the inlined actions wait on the chest's animation
    assert_eq!(world.signal_animation_finished("hero"), 0);
    assert_eq!(world.signal_animation_finished("chest"), 1);

    assert!(world.verb(&quake).unwrap().is_finished());
    assert_eq!(world.state_of(&chest()).unwrap(), Some("wobbled"));
    assert_eq!(prop(&world, "quake"), Some("over"));
    let wobble = world
        .scene("hall")
        .and_then(|s| s.actor("chest"))
        .and_then(|a| a.verbs.get_verb("wobble", None, None))
        .unwrap();
    assert_eq!(wobble.ip(), None);
}

#[test]
fn a_verb_can_cancel_itself() {
    let mut world = hall_world();
    let handle = give_chest(
        &mut world,
        Verb::new("fidget").with_actions(vec![
            set("a", "1"),
            Action::CancelVerb {
                owner: Target::Owner,
                verb: "fidget".into(),
                target: None,
            },
            set("b", "2"),
        ]),
    );

    assert_eq!(world.run_verb(&chest(), "fidget", None), Some(RunState::Finished));
    assert_eq!(prop(&world, "a"), Some("1"));
    assert_eq!(prop(&world, "b"), None);
    assert_eq!(world.verb(&handle).unwrap().ip(), Some(3));
}

#[test]
fn cancel_verb_stops_another_suspended_verb() {
    let mut world = hall_world();
    let lid = give_chest(
        &mut world,
        Verb::new("creak").with_actions(vec![Action::wait(3.0), set("creaked", "yes")]),
    );
    give_chest(
        &mut world,
        Verb::new("shush").with_actions(vec![Action::CancelVerb {
            owner: Target::Owner,
            verb: "creak".into(),
            target: None,
        }]),
    );

    world.run_verb(&chest(), "creak", None);
    world.run_verb(&chest(), "shush", None);
    assert!(world.verb(&lid).unwrap().is_finished());
    world.update(5.0);
    assert_eq!(prop(&world, "creaked"), None);
}

#[test]
fn verbs_resolve_by_owner_state_and_target() {
    let mut world = hall_world();
    give_chest(
        &mut world,
        Verb::new("open")
            .with_state(Some("locked"))
            .with_actions(vec![set("open", "locked")]),
    );
    give_chest(&mut world, Verb::new("open").with_actions(vec![set("open", "any")]));
    give_chest(
        &mut world,
        Verb::new("use")
            .with_target(Some("key"))
            .with_actions(vec![Action::SetState {
                target: Target::Owner,
                state: None,
            }]),
    );

    world.set_state_of(&chest(), Some("locked".into())).unwrap();
    world.interact("chest", "open", None);
    assert_eq!(prop(&world, "open"), Some("locked"));

    assert_eq!(world.interact("chest", "use", None), None);
    world.interact("chest", "use", Some("key"));
    assert_eq!(world.state_of(&chest()).unwrap(), None);

    world.interact("chest", "open", None);
    assert_eq!(prop(&world, "open"), Some("any"));
}

#[test]
fn add_verb_installs_a_fresh_verb_on_another_entity() {
    let mut world = hall_world();
    give_chest(
        &mut world,
        Verb::new("open").with_actions(vec![Action::AddVerb {
            owner: Target::Scene,
            verb: Box::new(Verb::new("echo").with_actions(vec![set("echo", "heard")])),
        }]),
    );

    world.run_verb(&chest(), "open", None);
    assert_eq!(
        world.run_verb(&VerbOwner::Scene("hall".into()), "echo", None),
        Some(RunState::Finished)
    );
    assert_eq!(prop(&world, "echo"), Some("heard"));
}

#[test]
fn goto_walks_over_frames_and_rerun_restarts() {
    let mut world = hall_world();
    let handle = give_chest(
        &mut world,
        Verb::new("slide").with_actions(vec![Action::goto(None, Vec2::new(100.0, 0.0), Some(50.0))]),
    );

    world.run_verb(&chest(), "slide", None);
    world.update(1.0);
    let pos = world.scene("hall").unwrap().actor("chest").unwrap().position();
    assert_eq!(pos, Vec2::new(50.0, 0.0));

    // cancelling leaves the chest where it got to
    world.cancel_verb(&handle);
    world.update(1.0);
    let pos = world.scene("hall").unwrap().actor("chest").unwrap().position();
    assert_eq!(pos, Vec2::new(50.0, 0.0));

    world.run_verb(&chest(), "slide", None);
    world.update(1.0);
    assert!(world.verb(&handle).unwrap().is_finished());
    let pos = world.scene("hall").unwrap().actor("chest").unwrap().position();
    assert_eq!(pos, Vec2::new(100.0, 0.0));
}

#[test]
fn a_walk_that_can_never_arrive_ends_instead_of_hanging() {
    let mut world = hall_world();
    world.settings.walk_speed = -50.0;
    let handle = give_chest(
        &mut world,
        Verb::new("slide").with_actions(vec![Action::goto(None, Vec2::new(10.0, 0.0), None), set("slid", "yes")]),
    );

    world.run_verb(&chest(), "slide", None);
    world.update(0.1);
    assert!(world.verb(&handle).unwrap().is_finished());
    assert_eq!(prop(&world, "slid"), Some("yes"));
    let pos = world.scene("hall").unwrap().actor("chest").unwrap().position();
    assert_eq!(pos, Vec2::default());
}

#[test]
fn a_busy_verb_is_not_replaced_by_a_less_specific_one() {
    let mut world = hall_world();
    let locked = give_chest(
        &mut world,
        Verb::new("open").with_state(Some("locked")).with_actions(vec![
            set("rattled", "yes"),
            Action::run_verb(Target::Scene, "echo", None),
            set("after", "yes"),
        ]),
    );
    give_chest(&mut world, Verb::new("open").with_actions(vec![set("opened", "wide")]));
    world
        .scene_mut("hall")
        .unwrap()
        .verbs
        .add_verb(Verb::new("echo").with_actions(vec![Action::run_verb(
            Target::Actor("chest".into()),
            "open",
            None,
        )]));
    world.set_state_of(&chest(), Some("locked".into())).unwrap();

    assert_eq!(world.run_verb(&chest(), "open", None), Some(RunState::Finished));
    assert_eq!(prop(&world, "rattled"), Some("yes"));
    assert_eq!(prop(&world, "after"), Some("yes"));
    // the wildcard verb must not stand in for the locked one while it runs
    assert_eq!(prop(&world, "opened"), None);
    assert!(!world.is_executing(&locked));
    assert!(world.verb(&locked).unwrap().is_finished());
}
