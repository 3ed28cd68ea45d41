use ae::loader::{load_worlddef, validate_worlddef};
use ae::*;
use tableau_engine as ae;

use std::path::Path;

fn demo_world() -> World {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/world.ron");
    let def = load_worlddef(&path).unwrap();
    validate_worlddef(&def).unwrap();
    build_world_from_def(&def).unwrap()
}

fn run_for(world: &mut World, seconds: f32) {
    let frames = (seconds / 0.1).ceil() as u32;
    for _ in 0..frames {
        world.update(0.1);
    }
}

#[test]
fn demo_world_loads_and_starts() {
    let mut world = demo_world();
    assert_eq!(world.title, "The Lighthouse Keeper");
    assert_eq!(world.player_actor().unwrap().id, "hero");
    assert!(!world.player_actor().unwrap().interaction);

    world.start().unwrap();
    let events = world.drain_events();
    assert_eq!(events[0], EngineEvent::SceneChanged { scene: "dock".into() });
    assert!(events[1].is_speech());
    // the opening line keeps the scene's init verb waiting
    assert_eq!(world.suspended_verbs().len(), 1);
}

#[test]
fn talking_to_the_keeper_reaches_the_dialog() {
    let mut world = demo_world();
    world.start().unwrap();
    assert_eq!(world.interact("keeper", "talkto", None), Some(RunState::Suspended));
    run_for(&mut world, 4.0);
    let open = world.active_dialog.clone().unwrap();
    assert_eq!(open.actor, "keeper");
    assert_eq!(open.dialog, "greeting");

    world.select_dialog_option(0).unwrap();
    run_for(&mut world, 5.0);
    assert_eq!(world.properties.get("lamp").map(String::as_str), Some("wick"));
}

#[test]
fn the_door_needs_help_offered_and_an_animation_to_open() {
    let mut world = demo_world();
    world.start().unwrap();
    assert_eq!(world.interact("door", "open", None), None);

    world.interact("keeper", "talkto", None);
    run_for(&mut world, 4.0);
    world.select_dialog_option(1).unwrap();
    // the keeper finishes speaking before unlocking the door
    assert!(!world.current_scene().unwrap().actor("door").unwrap().interaction);
    run_for(&mut world, 4.0);
    assert!(world.current_scene().unwrap().actor("door").unwrap().interaction);

    assert_eq!(world.interact("door", "open", None), Some(RunState::Suspended));
    // walk to the door, then the creak waits for the renderer
    run_for(&mut world, 3.0);
    assert_eq!(world.signal_animation_finished("door"), 1);
    let door = VerbOwner::actor("dock", "door");
    assert_eq!(world.state_of(&door).unwrap(), Some("open"));
}
