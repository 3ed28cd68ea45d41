#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

pub const TABLEAU_VERSION: &str = env!("CARGO_PKG_VERSION");

// Core modules
pub mod actor;
pub mod command;
pub mod config;
pub mod data_paths;
pub mod events;
pub mod geometry;
pub mod loader;
pub mod repl;
pub mod save_files;
pub mod scene;
pub mod style;
pub mod verb;
pub mod world;

// Re-exports for convenience
pub use actor::{Actor, Crossing};
pub use config::{EngineConfig, load_config};
pub use events::EngineEvent;
pub use geometry::{Polygon, Vec2};
pub use loader::{build_world_from_def, load_world};
pub use repl::run_repl;
pub use scene::{Scene, SceneLayer};
pub use verb::{Action, ActionContext, RunState, Script, StepOutcome, Verb, VerbError, VerbHandle, VerbKey, VerbManager, VerbOwner};
pub use world::World;
