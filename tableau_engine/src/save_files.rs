//! Save-game discovery and serialization helpers.
//!
//! Saves are RON snapshots of the whole [`World`], interpreter state included,
//! named `<slot>-tableau-<version>.ron` inside a per-world directory.

use crate::{TABLEAU_VERSION, World};

use anyhow::{Context, Result};
use log::{info, warn};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const FILE_MARKER: &str = "-tableau-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveSlot {
    pub slot: String,
    pub version: String,
    pub path: PathBuf,
    pub file_name: String,
    pub modified: Option<SystemTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveSummary {
    pub world_title: String,
    pub scene: Option<String>,
    pub player: Option<String>,
    /// Game time in seconds.
    pub elapsed: f64,
    /// Verbs parked on a suspending action.
    pub waiting_verbs: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveFileStatus {
    Ready,
    VersionMismatch { save_version: String, current_version: String },
    Corrupted { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveFileEntry {
    pub slot: String,
    pub version: String,
    pub path: PathBuf,
    pub file_name: String,
    pub modified: Option<SystemTime>,
    pub summary: Option<SaveSummary>,
    pub status: SaveFileStatus,
}

/// Per-world save directory under `root`, derived from the world title.
pub fn save_dir_for_world(root: &Path, world: &World) -> PathBuf {
    root.join(world_slug(&world.title))
}

fn world_slug(title: &str) -> String {
    let slug = title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() { "world".to_string() } else { slug }
}

/// File name used for `slot` by this engine version.
pub fn save_file_name(slot: &str) -> String {
    format!("{slot}{FILE_MARKER}{TABLEAU_VERSION}.ron")
}

/// Write the world to `dir`, creating the directory if needed. Returns the file written.
///
/// # Errors
/// - if the world cannot be serialized or the file cannot be written
pub fn save_world(world: &World, dir: &Path, slot: &str) -> Result<PathBuf> {
    let world_ron = ron::ser::to_string(world).context("error converting World to 'ron' format")?;
    fs::create_dir_all(dir).with_context(|| format!("error creating save folder '{}'", dir.display()))?;
    let path = dir.join(save_file_name(slot));
    fs::write(&path, world_ron).with_context(|| format!("writing save file '{}'", path.display()))?;
    info!("game saved to '{}'", path.display());
    Ok(path)
}

/// Path of the newest-version save file for `slot` in `dir`, if any.
///
/// # Errors
/// Returns an error if the directory cannot be read.
pub fn find_save_slot(dir: &Path, slot: &str) -> Result<Option<PathBuf>> {
    let current = dir.join(save_file_name(slot));
    if current.is_file() {
        return Ok(Some(current));
    }
    Ok(collect_save_slots(dir)?
        .into_iter()
        .filter(|s| s.slot == slot)
        .max_by(|a, b| a.modified.cmp(&b.modified))
        .map(|s| s.path))
}

/// Discover save slot files stored in `dir`.
///
/// # Errors
/// Returns an error if the directory contents cannot be read or enumerated.
pub fn collect_save_slots(dir: &Path) -> Result<Vec<SaveSlot>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let listing = fs::read_dir(dir).with_context(|| format!("listing save folder {}", dir.display()))?;
    let mut slots = listing
        .map(|entry| entry.and_then(|entry| slot_from_entry(&entry)))
        .filter_map(Result::transpose)
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("listing save folder {}", dir.display()))?;
    slots.sort_by(|a, b| (&a.slot, &a.version).cmp(&(&b.slot, &b.version)));
    Ok(slots)
}

/// Slots in `dir` with their status and summary, most recently written first.
///
/// # Errors
/// Returns an error if reading the directory fails.
pub fn build_save_entries(dir: &Path) -> Result<Vec<SaveFileEntry>> {
    let mut entries: Vec<SaveFileEntry> = collect_save_slots(dir)?.into_iter().map(inspect_slot).collect();
    entries.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.slot.cmp(&b.slot)));
    Ok(entries)
}

/// Load a save file and settle its interpreter state.
///
/// Suspended verbs stay parked on the action they were saved on; verbs saved between
/// steps continue where they stopped.
///
/// # Errors
/// Returns an error if the file cannot be read or deserialized, or if the saved verb
/// state is inconsistent.
pub fn load_save_file(path: &Path) -> Result<World> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading save file {}", path.display()))?;
    let mut world =
        ron::from_str::<World>(&raw).with_context(|| format!("parsing save file {}", path.display()))?;
    world
        .restore_after_load()
        .with_context(|| format!("restoring verb state from {}", path.display()))?;
    Ok(world)
}

/// Format a human-friendly modified time relative to now.
pub fn format_modified(modified: SystemTime) -> String {
    match SystemTime::now().duration_since(modified) {
        Ok(age) => format_duration(age),
        Err(_) => "in the future".to_string(),
    }
}

/// Read and check one slot. Unreadable or unparsable files are reported, not skipped.
fn inspect_slot(slot: SaveSlot) -> SaveFileEntry {
    let parsed = fs::read_to_string(&slot.path)
        .map_err(|err| format!("cannot read: {}", clamp(&err)))
        .and_then(|raw| ron::from_str::<World>(&raw).map_err(|err| format!("cannot parse: {}", clamp(&err))));

    let (version, summary, status) = match parsed {
        Ok(world) => {
            let status = match world.validate_verbs() {
                Err(err) => SaveFileStatus::Corrupted { message: clamp(&err) },
                Ok(()) if world.version != TABLEAU_VERSION => SaveFileStatus::VersionMismatch {
                    save_version: world.version.clone(),
                    current_version: TABLEAU_VERSION.to_string(),
                },
                Ok(()) => SaveFileStatus::Ready,
            };
            (world.version.clone(), Some(summarize(&world)), status)
        },
        Err(message) => {
            warn!("save slot '{}' at {} is unusable: {message}", slot.slot, slot.path.display());
            (slot.version.clone(), None, SaveFileStatus::Corrupted { message })
        },
    };

    SaveFileEntry {
        slot: slot.slot,
        version,
        path: slot.path,
        file_name: slot.file_name,
        modified: slot.modified,
        summary,
        status,
    }
}

fn summarize(world: &World) -> SaveSummary {
    let waiting_verbs = world
        .verb_handles()
        .iter()
        .filter(|handle| world.verb(handle).is_some_and(crate::Verb::is_suspended))
        .count();
    SaveSummary {
        world_title: world.title.clone(),
        scene: world.current_scene.clone(),
        player: world.player.clone(),
        elapsed: world.elapsed,
        waiting_verbs,
    }
}

fn slot_from_entry(entry: &fs::DirEntry) -> std::io::Result<Option<SaveSlot>> {
    let path = entry.path();
    if !entry.file_type()?.is_file() || path.extension().is_none_or(|ext| ext != "ron") {
        return Ok(None);
    }
    let (Some(file_name), Some(stem)) = (
        path.file_name().and_then(|name| name.to_str()).map(str::to_string),
        path.file_stem().and_then(|stem| stem.to_str()),
    ) else {
        return Ok(None);
    };
    let Some((slot, version)) = stem.rsplit_once(FILE_MARKER).filter(|(slot, _)| !slot.is_empty()) else {
        return Ok(None);
    };
    Ok(Some(SaveSlot {
        slot: slot.to_string(),
        version: version.to_string(),
        modified: entry.metadata()?.modified().ok(),
        path,
        file_name,
    }))
}

fn format_duration(age: Duration) -> String {
    let secs = age.as_secs();
    match secs {
        0..30 => "just now".to_string(),
        30..60 => format!("{secs}s ago"),
        60..3_600 => format!("{}m ago", secs / 60),
        3_600..86_400 => format!("{}h ago", secs / 3_600),
        _ => format!("{}d ago", secs / 86_400),
    }
}

const MAX_MESSAGE: usize = 120;

fn clamp(err: &impl std::fmt::Display) -> String {
    let message = err.to_string();
    match message.char_indices().nth(MAX_MESSAGE - 3) {
        Some((cut, _)) if message.chars().count() > MAX_MESSAGE => format!("{}...", &message[..cut]),
        _ => message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verb::{Action, Verb, VerbOwner};
    use crate::{Actor, Scene};
    use anyhow::Result;
    use tempfile::tempdir;

    fn small_world() -> World {
        let mut world = World::new_empty();
        world.title = "The Lighthouse Keeper".into();
        let mut scene = Scene::new("dock");
        let mut keeper = Actor::new("keeper");
        keeper
            .verbs
            .add_verb(Verb::new("talkto").with_actions(vec![Action::wait(2.0), Action::wait(1.0)]));
        scene.add_actor(keeper);
        world.add_scene(scene);
        world.current_scene = Some("dock".into());
        world
    }

    #[test]
    fn world_slug_is_filesystem_safe() {
        assert_eq!(world_slug("The Lighthouse Keeper!"), "the-lighthouse-keeper");
        assert_eq!(world_slug("  ***  "), "world");
    }

    #[test]
    fn missing_save_folder_lists_nothing() -> Result<()> {
        let dir = tempdir()?;
        let slots = collect_save_slots(&dir.path().join("missing"))?;
        assert!(slots.is_empty());
        Ok(())
    }

    #[test]
    fn only_marked_ron_files_count_as_slots() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path();
        fs::write(path.join("alpha-tableau-0.1.0.ron"), "()")?;
        fs::write(path.join("alpha-tableau-0.1.0.txt"), "()")?;
        fs::write(path.join("stray.ron"), "()")?;
        fs::write(path.join("-tableau-0.1.0.ron"), "()")?;
        fs::create_dir_all(path.join("folder-tableau-0.1.0.ron"))?;

        let found: Vec<_> = collect_save_slots(path)?
            .into_iter()
            .map(|slot| (slot.slot, slot.version))
            .collect();
        assert_eq!(found, vec![("alpha".to_string(), "0.1.0".to_string())]);
        Ok(())
    }

    #[test]
    fn save_then_load_keeps_suspended_verb() -> Result<()> {
        let dir = tempdir()?;
        let mut world = small_world();
        let keeper = VerbOwner::actor("dock", "keeper");
        world.run_verb(&keeper, "talkto", None);

        let path = save_world(&world, dir.path(), "quick")?;
        assert_eq!(find_save_slot(dir.path(), "quick")?, Some(path.clone()));

        let loaded = load_save_file(&path)?;
        let verb = loaded
            .scene("dock")
            .and_then(|s| s.actor("keeper"))
            .and_then(|a| a.verbs.get_verb("talkto", None, None))
            .unwrap();
        assert_eq!(verb.ip(), Some(0));
        assert!(verb.is_suspended());
        Ok(())
    }

    #[test]
    fn listing_flags_stale_broken_and_inconsistent_saves() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path();
        let mut world = small_world();
        world.run_verb(&VerbOwner::actor("dock", "keeper"), "talkto", None);

        save_world(&world, path, "alpha")?;

        let mut stale = world.clone();
        stale.version = "0.0.1".into();
        fs::write(path.join("beta-tableau-0.0.1.ron"), ron::ser::to_string(&stale)?)?;

        fs::write(path.join("gamma-tableau-0.1.0.ron"), "this is not valid ron")?;

        let mut broken = world.clone();
        if let Some(verb) = broken
            .scene_mut("dock")
            .and_then(|s| s.actor_mut("keeper"))
            .and_then(|a| a.verbs.get_verb_mut("talkto", None, None))
        {
            verb.script.ip = Some(9);
        }
        save_world(&broken, path, "delta")?;

        let entries = build_save_entries(path)?;
        let find = |slot: &str| entries.iter().find(|entry| entry.slot == slot).unwrap();

        let alpha = find("alpha");
        assert_eq!(alpha.status, SaveFileStatus::Ready);
        let summary = alpha.summary.as_ref().unwrap();
        assert_eq!(summary.world_title, "The Lighthouse Keeper");
        assert_eq!(summary.waiting_verbs, 1);

        let beta = find("beta");
        assert!(matches!(beta.status, SaveFileStatus::VersionMismatch { .. }));
        assert_eq!(beta.version, "0.0.1");

        let garbage = find("gamma");
        assert!(garbage.summary.is_none());
        assert!(matches!(&garbage.status, SaveFileStatus::Corrupted { message } if message.starts_with("cannot parse")));

        assert!(matches!(find("delta").status, SaveFileStatus::Corrupted { .. }));
        assert!(load_save_file(&path.join(save_file_name("delta"))).is_err());
        Ok(())
    }

    #[test]
    fn ages_read_naturally() {
        assert_eq!(format_duration(Duration::from_secs(5)), "just now");
        assert_eq!(format_duration(Duration::from_secs(45)), "45s ago");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m ago");
        assert_eq!(format_duration(Duration::from_secs(3 * 86_400)), "3d ago");
        assert_eq!(clamp(&"x".repeat(200)).chars().count(), MAX_MESSAGE);
    }
}
