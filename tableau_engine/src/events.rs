//! Requests the runtime makes of its collaborators.
//!
//! Rendering and audio live outside the engine. Actions push [`EngineEvent`]s into the
//! world's outbox and the front end drains it once per frame.

use crate::geometry::Vec2;

use serde::{Deserialize, Serialize};
use variantly::Variantly;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Variantly)]
pub enum EngineEvent {
    SceneChanged {
        scene: String,
    },
    Speech {
        actor: String,
        text: String,
    },
    Sound {
        actor: String,
        sound: String,
        file: String,
        looping: bool,
        volume: f32,
    },
    Animation {
        actor: String,
        animation: String,
    },
    Walk {
        actor: String,
        to: Vec2,
    },
    DialogOpened {
        actor: String,
        dialog: String,
        options: Vec<String>,
    },
    DialogClosed {
        actor: String,
        dialog: String,
    },
}
