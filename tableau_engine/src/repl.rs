//! Console loop and command handling.
//!
//! The console stands in for a renderer: it advances game time in fixed frames,
//! delivers completion signals on the player's behalf and prints the events the
//! world publishes. Handlers live in the submodules.

mod input;
pub mod look;
pub mod movement;
pub mod system;
pub mod verbs;

pub use look::*;
pub use movement::*;
pub use system::*;
pub use verbs::*;

use crate::command::{Command, parse_command};
use crate::config::{ConsoleConfig, EngineConfig};
use crate::events::EngineEvent;
use crate::save_files::save_dir_for_world;
use crate::style::GameStyle;
use crate::world::World;

use anyhow::Result;
use log::info;

use std::fmt::Write as _;
use std::path::PathBuf;

use input::{InputEvent, InputManager};

/// Control flow signal used by handlers to exit the console.
pub enum ReplControl {
    Continue,
    Quit,
}

/// Console settings shared by the handlers.
#[derive(Debug, Clone)]
pub struct Session {
    pub console: ConsoleConfig,
    /// Root of all save folders; each world saves into its own subfolder.
    pub save_root: PathBuf,
}

impl Session {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            console: config.console.clone(),
            save_root: PathBuf::from(&config.save_dir),
        }
    }

    pub fn save_dir(&self, world: &World) -> PathBuf {
        save_dir_for_world(&self.save_root, world)
    }
}

/// Run the console until the player quits or input ends.
///
/// # Errors
/// - propagates failures from handlers
pub fn run_repl(world: &mut World, config: &EngineConfig) -> Result<()> {
    #[allow(clippy::enum_glob_use)]
    use Command::*;

    let session = Session::new(config);
    let mut input_manager = InputManager::new(&session.save_dir(world));
    print_events(world);

    loop {
        let prompt = prompt_for(world).prompt_style().to_string();
        let input = match input_manager.read_line(&prompt) {
            Ok(InputEvent::Line(line)) => line,
            Ok(InputEvent::Eof) => "quit".to_string(),
            Ok(InputEvent::Interrupted) => {
                println!("Command canceled.");
                continue;
            },
            Err(err) => {
                println!("{}", format!("Failed to read input ({err}). Try again.").error_style());
                continue;
            },
        };

        let command = parse_command(&input);
        info!("console: {command:?}");
        match command {
            Look => look_handler(world),
            Verbs(actor) => verbs_handler(world, &actor),
            Do { verb, actor, target } => do_handler(world, &verb, &actor, target.as_deref()),
            Click { x, y, verb } => click_handler(world, x, y, &verb),
            Walk { x, y } => walk_handler(world, &session, x, y),
            Tick(secs) => tick_handler(world, &session, secs),
            Wait(secs) => wait_handler(world, &session, secs),
            Choose(index) => choose_handler(world, index),
            AnimationDone(actor) => animation_done_handler(world, &actor),
            Running => running_handler(world),
            Cancel(index) => cancel_handler(world, index),
            Scene(id) => scene_handler(world, &id),
            Save(slot) => save_handler(world, &session, &slot)?,
            Load(slot) => load_handler(world, &session, &slot),
            ListSaves => list_saves_handler(world, &session),
            Help => help_handler(),
            Quit => {
                if let ReplControl::Quit = quit_handler(world) {
                    break;
                }
            },
            Unknown => println!("{}", "Didn't quite catch that. Try 'help'.".error_style()),
        }
        print_events(world);
    }
    Ok(())
}

fn prompt_for(world: &World) -> String {
    let scene = world.current_scene.as_deref().unwrap_or("-");
    let mut prompt = format!("\n[{scene} | {:.1}s", world.elapsed);
    let waiting = world.suspended_verbs().len();
    if waiting > 0 {
        let _ = write!(prompt, " | {waiting} running");
    }
    if world.active_dialog.is_some() {
        prompt.push_str(" | choose");
    }
    prompt.push_str("]>> ");
    prompt
}

/// Drain the world's outbox and print each event.
pub fn print_events(world: &mut World) {
    for event in world.drain_events() {
        println!("{}", render_event(&event));
    }
}

/// One event as console text.
pub fn render_event(event: &EngineEvent) -> String {
    match event {
        EngineEvent::SceneChanged { scene } => format!("\n=== {} ===", scene.scene_style()),
        EngineEvent::Speech { actor, text } => format!("{}: \"{}\"", actor.actor_style(), text.speech_style()),
        EngineEvent::Sound { actor, sound, looping, .. } => {
            let looping = if *looping { " (looping)" } else { "" };
            format!("~ {} plays {sound}{looping}", actor.actor_style()).event_style().to_string()
        },
        EngineEvent::Animation { actor, animation } => {
            format!("~ {actor} animates: {animation}").event_style().to_string()
        },
        EngineEvent::Walk { actor, to } => {
            format!("~ {actor} walks to ({:.0}, {:.0})", to.x, to.y).event_style().to_string()
        },
        EngineEvent::DialogOpened { actor, options, .. } => {
            let mut text = format!("{} is waiting for an answer:", actor.actor_style());
            for (n, option) in options.iter().enumerate() {
                let _ = write!(text, "\n  {}. {}", n + 1, option.dialog_style());
            }
            text
        },
        EngineEvent::DialogClosed { dialog, .. } => format!("~ dialog '{dialog}' closed").dimmed_style().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec2;

    #[test]
    fn dialog_options_are_numbered_from_one() {
        let text = render_event(&EngineEvent::DialogOpened {
            actor: "keeper".into(),
            dialog: "greeting".into(),
            options: vec!["Hello".into(), "Goodbye".into()],
        });
        assert!(text.contains("1. "));
        assert!(text.contains("2. "));
        assert!(text.contains("Goodbye"));
    }

    #[test]
    fn walk_event_shows_destination() {
        let text = render_event(&EngineEvent::Walk {
            actor: "hero".into(),
            to: Vec2::new(10.0, 42.0),
        });
        assert!(text.contains("(10, 42)"));
    }

    #[test]
    fn prompt_mentions_scene_and_time() {
        let mut world = World::new_empty();
        world.current_scene = Some("dock".into());
        world.elapsed = 2.25;
        let prompt = prompt_for(&world);
        assert!(prompt.contains("dock"));
        assert!(prompt.contains("2.2") || prompt.contains("2.3"));
    }
}
