//! `repl::verbs` module
//!
//! Handlers that run verbs for the player and deliver the completion signals a
//! renderer would normally send.

use crate::geometry::Vec2;
use crate::style::GameStyle;
use crate::verb::RunState;
use crate::world::World;

use log::{info, warn};

/// Issue `verb` on an actor of the current scene.
pub fn do_handler(world: &mut World, verb: &str, actor: &str, target: Option<&str>) {
    report_run(world.interact(actor, verb, target));
}

/// Issue `verb` on the top-most interactive actor under a point.
pub fn click_handler(world: &mut World, x: f32, y: f32, verb: &str) {
    let hit = world
        .current_scene()
        .and_then(|scene| scene.actor_at(Vec2::new(x, y)))
        .map(|actor| actor.id.clone());
    let Some(actor) = hit else {
        println!("{}", "Nothing there.".dimmed_style());
        return;
    };
    println!("{} {}", verb.verb_style(), actor.actor_style());
    report_run(world.interact(&actor, verb, None));
}

fn report_run(result: Option<RunState>) {
    match result {
        None => println!("{}", "Nothing happens.".dimmed_style()),
        Some(RunState::Suspended) => println!("{}", "(in progress)".dimmed_style()),
        Some(RunState::Finished) => {},
    }
}

/// Answer the open dialog with visible option `index`.
pub fn choose_handler(world: &mut World, index: usize) {
    if let Err(err) = world.select_dialog_option(index) {
        warn!("choose {}: {err:#}", index + 1);
        println!("{}", format!("{err}").error_style());
    }
}

/// Deliver an animation-finished signal for `actor`.
pub fn animation_done_handler(world: &mut World, actor: &str) {
    let resumed = world.signal_animation_finished(actor);
    info!("animation finished on '{actor}': {resumed} verb(s) resumed");
    if resumed == 0 {
        println!("{}", format!("Nothing was waiting on '{actor}'.").dimmed_style());
    }
}

/// List the verbs currently parked on an action, numbered for `cancel`.
pub fn running_handler(world: &World) {
    let handles = world.suspended_verbs();
    if handles.is_empty() {
        println!("{}", "No verbs are running.".dimmed_style());
        return;
    }
    for (n, handle) in handles.iter().enumerate() {
        let step = world
            .verb(handle)
            .and_then(|verb| {
                let ip = verb.ip()?;
                verb.actions().get(ip).map(|action| format!("step {} ({})", ip + 1, action.name()))
            })
            .unwrap_or_default();
        println!("{:>3}. {} {}", n + 1, handle.to_string().verb_style(), step.dimmed_style());
    }
}

/// Cancel the `index`th verb of the `running` list.
pub fn cancel_handler(world: &mut World, index: usize) {
    let Some(handle) = world.suspended_verbs().into_iter().nth(index) else {
        println!("{}", format!("No running verb number {}.", index + 1).error_style());
        return;
    };
    if world.cancel_verb(&handle) {
        println!("Cancelled {}.", handle.to_string().verb_style());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verb::{Action, Verb};
    use crate::{Actor, Scene};

    #[test]
    fn cancel_by_running_number() {
        let mut world = World::new_empty();
        let mut scene = Scene::new("yard");
        let mut dog = Actor::new("dog");
        dog.verbs
            .add_verb(Verb::new("pet").with_actions(vec![Action::wait(5.0), Action::wait(5.0)]));
        scene.add_actor(dog);
        world.add_scene(scene);
        world.current_scene = Some("yard".into());

        do_handler(&mut world, "pet", "dog", None);
        let handles = world.suspended_verbs();
        assert_eq!(handles.len(), 1);

        cancel_handler(&mut world, 0);
        assert!(world.suspended_verbs().is_empty());
        assert!(world.verb(&handles[0]).unwrap().is_finished());
    }
}
