//! Loader utilities for building a `World` from serialized data.
//!
//! World content is authored as a RON `WorldDef`, validated as a whole and
//! then converted into runtime types.

pub mod worlddef;

pub use worlddef::{build_world_from_def, load_worlddef};

use crate::config::EngineConfig;
use crate::data_paths::data_path;
use crate::world::World;

use anyhow::{Context, Result, bail};
use log::info;
use tableau_data::WorldDef;

/// Load the `World` named by the config from the data directory.
///
/// # Errors
/// Errors bubble up from file IO, deserialization, validation or missing references.
pub fn load_world(config: &EngineConfig) -> Result<World> {
    let world_ron_path = data_path(&config.world_file);

    let worlddef = load_worlddef(&world_ron_path).context("while loading worlddef from file")?;
    validate_worlddef(&worlddef)?;
    let mut world = build_world_from_def(&worlddef).context("while building world from worlddef")?;
    world.settings = config.runtime.clone();

    info!("{} scenes added to World", world.scenes.len());
    info!(
        "{} actors added to World",
        world.scenes.values().map(|s| s.actors().count()).sum::<usize>()
    );
    info!("{} verbs in total", world.verb_handles().len());
    Ok(world)
}

/// Validate the WorldDef and return a single aggregated error.
///
/// # Errors
/// - listing every validation failure, one per line
pub fn validate_worlddef(def: &WorldDef) -> Result<()> {
    let errors = tableau_data::validate_world(def);
    if errors.is_empty() {
        return Ok(());
    }
    let details = errors
        .into_iter()
        .map(|err| format!("- {err}"))
        .collect::<Vec<_>>()
        .join("\n");
    bail!("worlddef validation failed:\n{details}");
}
