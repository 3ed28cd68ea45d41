use ae::*;
use tableau_engine as ae;

/// Region actor whose `enter`/`exit` verbs announce themselves without waiting.
fn region(id: &str, x: f32) -> Actor {
    let mut actor = Actor::new(id);
    actor.interaction = false;
    actor.bbox = Polygon::rect(Vec2::new(x, 0.0), 10.0, 10.0);
    actor.verbs.add_verb(
        Verb::new("enter").with_actions(vec![Action::say(None, &format!("enter {id}"), Some(0.0), false)]),
    );
    actor.verbs.add_verb(
        Verb::new("exit").with_actions(vec![Action::say(None, &format!("exit {id}"), Some(0.0), false)]),
    );
    actor
}

fn shore() -> World {
    let mut world = World::new_empty();
    let mut scene = Scene::new("shore");
    scene.add_actor(Actor::new("hero"));
    scene.add_actor(region("pool", 20.0));
    scene.add_actor(region("reeds", 40.0));
    world.add_scene(scene);
    world.current_scene = Some("shore".into());
    world.set_player(Some("hero")).unwrap();
    world
}

fn place_player(world: &mut World, x: f32, y: f32) {
    world.player_actor_mut().unwrap().set_position(Vec2::new(x, y));
}

fn spoken(world: &mut World) -> Vec<String> {
    world
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            EngineEvent::Speech { text, .. } => Some(text),
            _ => None,
        })
        .collect()
}

#[test]
fn enter_fires_once_while_the_player_stays_inside() {
    let mut world = shore();
    place_player(&mut world, 25.0, 5.0);
    for _ in 0..20 {
        world.update(0.1);
    }
    assert_eq!(spoken(&mut world), vec!["enter pool"]);
}

#[test]
fn exit_fires_when_the_player_leaves() {
    let mut world = shore();
    place_player(&mut world, 25.0, 5.0);
    world.update(0.1);
    place_player(&mut world, 0.0, 50.0);
    world.update(0.1);
    world.update(0.1);
    assert_eq!(spoken(&mut world), vec!["enter pool", "exit pool"]);
}

#[test]
fn nothing_fires_for_a_region_never_entered() {
    let mut world = shore();
    for step in 0..10u8 {
        place_player(&mut world, f32::from(step), 50.0);
        world.update(0.1);
    }
    assert!(spoken(&mut world).is_empty());
}

#[test]
fn crossings_fire_in_actor_insertion_order() {
    let mut world = shore();
    place_player(&mut world, 25.0, 5.0);
    world.update(0.1);
    // one step from the pool straight into the reeds
    place_player(&mut world, 45.0, 5.0);
    world.update(0.1);
    assert_eq!(spoken(&mut world), vec!["enter pool", "exit pool", "enter reeds"]);
}

#[test]
fn invisible_regions_and_the_player_itself_never_fire() {
    let mut world = shore();
    world
        .current_scene_mut()
        .and_then(|scene| scene.actor_mut("pool"))
        .unwrap()
        .visible = false;
    // the player's own hit region always contains its position
    world.player_actor_mut().unwrap().bbox = Polygon::rect(Vec2::new(25.0, 5.0), 2.0, 2.0);
    world
        .player_actor_mut()
        .unwrap()
        .verbs
        .add_verb(Verb::new("enter").with_actions(vec![Action::say(None, "self", Some(0.0), false)]));

    place_player(&mut world, 25.0, 5.0);
    world.update(0.1);
    assert!(spoken(&mut world).is_empty());
}

#[test]
fn no_player_means_no_crossings() {
    let mut world = shore();
    place_player(&mut world, 25.0, 5.0);
    world.set_player(None).unwrap();
    world.update(0.1);
    assert!(spoken(&mut world).is_empty());
    // the former player accepts interaction again
    assert!(world.current_scene().unwrap().actor("hero").unwrap().interaction);
}

#[test]
fn an_enter_verb_that_hides_a_later_region_stops_it_firing() {
    let mut world = shore();
    // both regions cover the same ground
    world
        .current_scene_mut()
        .and_then(|scene| scene.actor_mut("reeds"))
        .unwrap()
        .bbox = Polygon::rect(Vec2::new(20.0, 0.0), 10.0, 10.0);
    world
        .current_scene_mut()
        .and_then(|scene| scene.actor_mut("pool"))
        .unwrap()
        .verbs
        .add_verb(Verb::new("enter").with_actions(vec![Action::SetActorAttr {
            actor: Some("reeds".into()),
            visible: Some(false),
            interaction: None,
            layer: None,
        }]));

    place_player(&mut world, 25.0, 5.0);
    world.update(0.1);
    assert!(spoken(&mut world).is_empty());
    let reeds = world.current_scene().unwrap().actor("reeds").unwrap();
    assert!(!reeds.visible);
    assert!(!reeds.player_inside);
}

#[test]
fn an_enter_verb_that_moves_the_player_is_seen_by_later_regions() {
    let mut world = shore();
    world
        .current_scene_mut()
        .and_then(|scene| scene.actor_mut("pool"))
        .unwrap()
        .verbs
        .add_verb(Verb::new("enter").with_actions(vec![Action::Position {
            actor: Some("hero".into()),
            pos: Vec2::new(45.0, 5.0),
        }]));

    place_player(&mut world, 25.0, 5.0);
    world.update(0.1);
    // the reeds see the new position on the same frame
    assert_eq!(spoken(&mut world), vec!["enter reeds"]);
}
