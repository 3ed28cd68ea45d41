//! `repl::look` module
//!
//! Handlers that describe the current scene and what can be done in it.

use crate::actor::Actor;
use crate::style::GameStyle;
use crate::verb::{Verb, VerbManager};
use crate::world::World;

use colored::Colorize;

/// Describe the current scene: its layers top-most first, and every actor on them.
pub fn look_handler(world: &World) {
    let Some(scene) = world.current_scene() else {
        println!("{}", "There is no current scene.".error_style());
        return;
    };
    let state = scene.state.as_deref().map(|s| format!(" [{s}]")).unwrap_or_default();
    println!("{}{}", scene.id.scene_style(), state.dimmed_style());
    for layer in &scene.layers {
        let hidden = if layer.visible { "" } else { " (hidden)" };
        println!("{}{}", format!("layer {}", layer.name).subheading_style(), hidden.dimmed_style());
        for actor in layer.actors.iter().filter_map(|id| scene.actor(id)) {
            println!("  {}", describe_actor(actor, world.player.as_deref()));
        }
    }
    if let Some(dialog) = &world.active_dialog {
        println!(
            "{} is waiting for your answer ('choose <n>').",
            dialog.actor.actor_style()
        );
    }
}

fn describe_actor(actor: &Actor, player: Option<&str>) -> String {
    let pos = actor.position();
    let mut line = format!("{} ({:.0}, {:.0})", actor.id.actor_style(), pos.x, pos.y);
    if let Some(state) = &actor.state {
        line.push_str(&format!(" [{state}]"));
    }
    if player == Some(actor.id.as_str()) {
        line.push_str(&" <- you".bold().to_string());
    } else if !actor.visible {
        line.push_str(&" (invisible)".dimmed_style().to_string());
    } else if !actor.interaction {
        line.push_str(&" (scenery)".dimmed_style().to_string());
    }
    if !actor.desc.is_empty() {
        line.push_str(&format!(" - {}", actor.desc.description_style()));
    }
    line
}

/// List the verbs defined on an actor of the current scene, and the scene's own.
pub fn verbs_handler(world: &World, actor_id: &str) {
    let Some(scene) = world.current_scene() else {
        println!("{}", "There is no current scene.".error_style());
        return;
    };
    let Some(actor) = scene.actor(actor_id) else {
        println!("{}", format!("No actor '{actor_id}' here.").error_style());
        return;
    };
    println!("{}", format!("verbs on {}", actor.id).subheading_style());
    print_verbs(&actor.verbs);
    if !scene.verbs.is_empty() {
        println!("{}", format!("verbs on scene {}", scene.id).subheading_style());
        print_verbs(&scene.verbs);
    }
    if !world.verbs.is_empty() {
        println!("{}", "global verbs".subheading_style());
        print_verbs(&world.verbs);
    }
}

fn print_verbs(verbs: &VerbManager) {
    if verbs.is_empty() {
        println!("  {}", "(none)".dimmed_style());
    }
    for key in verbs.keys() {
        let status = verbs.get(key).map(verb_status).unwrap_or_default();
        println!("  {}{}", key.to_string().verb_style(), status.dimmed_style());
    }
}

fn verb_status(verb: &Verb) -> String {
    if verb.is_suspended() {
        format!(" waiting at step {}", verb.ip().unwrap_or_default() + 1)
    } else if verb.is_running() {
        " running".to_string()
    } else {
        String::new()
    }
}
