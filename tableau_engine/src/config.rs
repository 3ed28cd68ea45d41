//! Engine configuration loaded from `tableau.toml`.
//!
//! Every field has a default, so a partial file only overrides what it names.
//! A missing file or one that fails to parse never stops the engine: the
//! defaults are used instead.

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "tableau.toml";

/// Timing and movement parameters consumed by time-driven actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Scene units per second for `Goto` actions without an explicit speed.
    pub walk_speed: f32,
    /// Minimum on-screen time of a line of speech.
    pub speech_base_seconds: f32,
    /// Extra time per character of speech.
    pub speech_seconds_per_char: f32,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            walk_speed: 120.0,
            speech_base_seconds: 1.0,
            speech_seconds_per_char: 0.06,
        }
    }
}

impl RuntimeSettings {
    /// How long a `Say` without an explicit duration keeps its verb waiting.
    pub fn speech_seconds(&self, text: &str) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let chars = text.chars().count() as f32;
        self.speech_base_seconds + chars * self.speech_seconds_per_char
    }
}

/// Settings for the interactive console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Seconds of game time advanced by one `tick`.
    pub frame_step: f32,
    /// Upper bound on frames simulated by a single `wait` command.
    pub max_wait_frames: u32,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            frame_step: 0.1,
            max_wait_frames: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// World definition file, relative to the data directory.
    pub world_file: String,
    /// Directory holding save files.
    pub save_dir: String,
    pub console: ConsoleConfig,
    pub runtime: RuntimeSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            world_file: "world.ron".to_string(),
            save_dir: "saved_games".to_string(),
            console: ConsoleConfig::default(),
            runtime: RuntimeSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Replace out-of-range numbers with their defaults, with a warning for each.
    ///
    /// Speeds and the frame step must be finite and positive; speech timings finite
    /// and not negative.
    pub fn sanitized(mut self) -> Self {
        let runtime = RuntimeSettings::default();
        let console = ConsoleConfig::default();
        let positive = |v: f32| v.is_finite() && v > 0.0;
        let non_negative = |v: f32| v.is_finite() && v >= 0.0;

        fix_value("runtime.walk_speed", &mut self.runtime.walk_speed, runtime.walk_speed, positive);
        fix_value(
            "runtime.speech_base_seconds",
            &mut self.runtime.speech_base_seconds,
            runtime.speech_base_seconds,
            non_negative,
        );
        fix_value(
            "runtime.speech_seconds_per_char",
            &mut self.runtime.speech_seconds_per_char,
            runtime.speech_seconds_per_char,
            non_negative,
        );
        fix_value("console.frame_step", &mut self.console.frame_step, console.frame_step, positive);
        self
    }
}

fn fix_value(key: &str, value: &mut f32, default: f32, valid: impl Fn(f32) -> bool) {
    if !valid(*value) {
        warn!("config value {key} = {value} is out of range; using {default}");
        *value = default;
    }
}

/// Load the engine configuration, falling back to defaults.
///
/// # Logging
/// - `info!` when the file is absent or loaded
/// - `warn!` if the file exists but cannot be read or parsed, and for each
///   out-of-range value (which falls back to its default)
pub fn load_config(toml_path: &Path) -> EngineConfig {
    if !toml_path.exists() {
        info!("no config at '{}', using defaults", toml_path.display());
        return EngineConfig::default();
    }
    match try_load_config(toml_path) {
        Ok(config) => {
            info!("engine config loaded from '{}'", toml_path.display());
            config.sanitized()
        },
        Err(e) => {
            warn!(
                "Could not load engine config from '{}': {e:#}. Using defaults.",
                toml_path.display()
            );
            EngineConfig::default()
        },
    }
}

fn try_load_config(toml_path: &Path) -> Result<EngineConfig> {
    let contents =
        fs::read_to_string(toml_path).with_context(|| format!("reading config from '{}'", toml_path.display()))?;
    toml::from_str(&contents).with_context(|| format!("parsing config from '{}'", toml_path.display()))
}
