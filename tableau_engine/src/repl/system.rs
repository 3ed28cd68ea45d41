//! `repl::system` module
//!
//! Console handlers for saves, scene switching and other utilities.

use super::{ReplControl, Session};
use crate::TABLEAU_VERSION;
use crate::save_files::{
    SaveFileStatus, build_save_entries, find_save_slot, format_modified, load_save_file, save_world,
};
use crate::style::GameStyle;
use crate::world::World;

use anyhow::Result;
use colored::Colorize;
use log::{info, warn};

/// Quit the console.
pub fn quit_handler(world: &World) -> ReplControl {
    info!(
        "quitting '{}' after {:.1}s of game time in scene {:?}",
        world.title, world.elapsed, world.current_scene
    );
    for handle in world.suspended_verbs() {
        info!("still running at exit: {handle}");
    }
    println!("Goodbye.");
    ReplControl::Quit
}

/// Show available commands.
pub fn help_handler() {
    const COMMANDS: &[(&str, &str)] = &[
        ("look", "describe the current scene"),
        ("verbs <actor>", "list the verbs an actor answers to"),
        ("do <verb> <actor> [with <target>]", "run a verb as the player"),
        ("click <x> <y> [verb]", "run a verb on whatever is under a point"),
        ("walk <x> <y>", "walk the player to a point"),
        ("tick [secs]", "advance one frame"),
        ("wait <secs>", "advance game time"),
        ("choose <n>", "answer the open dialog"),
        ("done <actor>", "finish the animation playing on an actor"),
        ("running", "list verbs waiting on an action"),
        ("cancel <n>", "cancel a running verb"),
        ("scene <id>", "switch to another scene"),
        ("save <slot> / load <slot> / saves", "manage saved games"),
        ("quit", "leave"),
    ];
    println!("{}", "Commands".subheading_style());
    for (usage, what) in COMMANDS {
        println!("  {:<36} {}", usage.verb_style(), what.dimmed_style());
    }
}

/// Switch scenes by hand.
pub fn scene_handler(world: &mut World, id: &str) {
    if let Err(err) = world.set_current_scene(id) {
        println!("{}", format!("{err}").error_style());
    }
}

/// Save the game into the world's save folder.
///
/// # Errors
/// - if the world cannot be serialized or written
pub fn save_handler(world: &World, session: &Session, slot: &str) -> Result<()> {
    save_world(world, &session.save_dir(world), slot)?;
    println!("Game saved as {}", slot.underline());
    info!("player saved game to \"{slot}\"");
    Ok(())
}

/// Replace the running world with a saved one.
pub fn load_handler(world: &mut World, session: &Session, slot: &str) {
    let dir = session.save_dir(world);
    let path = match find_save_slot(&dir, slot) {
        Ok(Some(path)) => path,
        Ok(None) => {
            println!("Unable to find {} save file. Load aborted.", slot.error_style());
            return;
        },
        Err(err) => {
            warn!("looking for save '{slot}': {err:#}");
            println!("{}", format!("Unable to read saves: {err}").error_style());
            return;
        },
    };
    match load_save_file(&path) {
        Ok(mut loaded) => {
            if loaded.version != TABLEAU_VERSION {
                warn!(
                    "player loaded '{slot}' (v{}), current version is v{TABLEAU_VERSION}",
                    loaded.version
                );
                println!(
                    "{}: '{slot}' was saved by v{}; this is v{TABLEAU_VERSION}.",
                    "WARNING".bold().yellow(),
                    loaded.version.error_style(),
                );
            }
            loaded.settings = world.settings.clone();
            *world = loaded;
            println!("Saved game {} loaded.", slot.underline().green());
            info!("player reloaded world from '{}'", path.display());
            super::look_handler(world);
        },
        Err(err) => {
            warn!("player attempted to load '{slot}': {err:#}");
            println!("Unable to load the {} save file: {err}", slot.error_style());
        },
    }
}

/// List save files for this world with their status.
pub fn list_saves_handler(world: &World, session: &Session) {
    let entries = match build_save_entries(&session.save_dir(world)) {
        Ok(entries) => entries,
        Err(err) => {
            println!("{}", format!("Unable to read saves: {err}").error_style());
            return;
        },
    };
    if entries.is_empty() {
        println!("{}", "No saved games yet.".dimmed_style());
        return;
    }
    for entry in entries {
        let when = entry.modified.map(format_modified).unwrap_or_default();
        let detail = entry
            .summary
            .as_ref()
            .map(|s| {
                format!(
                    "{} at {:.0}s, {} verb(s) waiting",
                    s.scene.as_deref().unwrap_or("-"),
                    s.elapsed,
                    s.waiting_verbs
                )
            })
            .unwrap_or_default();
        let status = match &entry.status {
            SaveFileStatus::Ready => String::new(),
            SaveFileStatus::VersionMismatch { save_version, .. } => format!(" [v{save_version}]"),
            SaveFileStatus::Corrupted { message } => format!(" [unreadable: {message}]"),
        };
        println!(
            "  {} {} {}{}",
            entry.slot.verb_style(),
            when.dimmed_style(),
            detail,
            status.error_style()
        );
    }
}
