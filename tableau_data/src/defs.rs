use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable identifier used across WorldDef references.
pub type Id = String;

/// Top-level authored world data loaded by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorldDef {
    pub game: GameDef,
    #[serde(default)]
    pub scenes: Vec<SceneDef>,
    /// Global verbs, used as a fallback when neither an actor nor its scene resolves a verb.
    #[serde(default)]
    pub verbs: Vec<VerbDef>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// Game-level metadata and startup configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GameDef {
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub version: String,
    pub initial_scene: Id,
    /// Actor (in the initial scene) controlled by the player.
    #[serde(default)]
    pub player: Option<Id>,
}

/// A scene: a container of layers and actors with its own verbs and state.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SceneDef {
    pub id: Id,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub layers: Vec<LayerDef>,
    #[serde(default)]
    pub actors: Vec<ActorDef>,
    #[serde(default)]
    pub verbs: Vec<VerbDef>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// A drawing/interaction layer. Layers are listed top-most first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerDef {
    pub name: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub dynamic: bool,
}

/// 2D point in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PointDef {
    pub x: f32,
    pub y: f32,
}

/// Actor definition used by the engine at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorDef {
    pub id: Id,
    #[serde(default)]
    pub desc: String,
    #[serde(default = "default_layer")]
    pub layer: String,
    #[serde(default)]
    pub pos: PointDef,
    /// Hit region vertices, relative to `pos`. Empty means the actor has no hit region.
    #[serde(default)]
    pub bbox: Vec<PointDef>,
    #[serde(default)]
    pub z_index: f32,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_true")]
    pub interaction: bool,
    #[serde(default)]
    pub verbs: Vec<VerbDef>,
    #[serde(default)]
    pub dialogs: Vec<DialogDef>,
    #[serde(default)]
    pub sounds: Vec<SoundDef>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Default for ActorDef {
    fn default() -> Self {
        Self {
            id: String::new(),
            desc: String::new(),
            layer: default_layer(),
            pos: PointDef::default(),
            bbox: Vec::new(),
            z_index: 0.0,
            state: None,
            visible: true,
            interaction: true,
            verbs: Vec::new(),
            dialogs: Vec::new(),
            sounds: Vec::new(),
            properties: BTreeMap::new(),
        }
    }
}

/// A branching conversation owned by an actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogDef {
    pub id: Id,
    #[serde(default)]
    pub options: Vec<DialogOptionDef>,
}

/// One selectable line in a dialog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogOptionDef {
    pub text: String,
    /// Verb run on the dialog's actor when this option is chosen.
    #[serde(default)]
    pub verb: Option<Id>,
    /// Hide the option after it has been chosen once.
    #[serde(default)]
    pub once: bool,
}

/// A named sound effect owned by an actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundDef {
    pub id: Id,
    pub file: String,
    #[serde(default)]
    pub looping: bool,
    #[serde(default = "default_volume")]
    pub volume: f32,
}

/// A verb: an ordered action script keyed by id, owner state and interaction target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerbDef {
    pub id: Id,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub target: Option<Id>,
    #[serde(default)]
    pub actions: Vec<ActionDef>,
}

/// Entity an action or condition addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TargetDef {
    /// Whatever owns the verb being executed.
    #[default]
    Owner,
    Actor(Id),
    Scene,
    World,
}

/// Authored action parameters, converted to runtime actions by the engine loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ActionDef {
    SetState {
        #[serde(default)]
        target: TargetDef,
        #[serde(default)]
        state: Option<String>,
    },
    SetProperty {
        #[serde(default)]
        target: TargetDef,
        name: String,
        #[serde(default)]
        value: Option<String>,
    },
    SetActorAttr {
        #[serde(default)]
        actor: Option<Id>,
        #[serde(default)]
        visible: Option<bool>,
        #[serde(default)]
        interaction: Option<bool>,
        #[serde(default)]
        layer: Option<String>,
    },
    Position {
        #[serde(default)]
        actor: Option<Id>,
        pos: PointDef,
    },
    Goto {
        #[serde(default)]
        actor: Option<Id>,
        pos: PointDef,
        #[serde(default)]
        speed: Option<f32>,
    },
    PlayAnimation {
        #[serde(default)]
        actor: Option<Id>,
        animation: String,
        #[serde(default)]
        duration: f32,
        #[serde(default)]
        wait: bool,
    },
    PlaySound {
        #[serde(default)]
        actor: Option<Id>,
        sound: Id,
    },
    Say {
        #[serde(default)]
        actor: Option<Id>,
        text: String,
        #[serde(default)]
        duration: Option<f32>,
        #[serde(default = "default_true")]
        wait: bool,
    },
    Wait {
        seconds: f32,
    },
    ShowDialog {
        #[serde(default)]
        actor: Option<Id>,
        dialog: Id,
    },
    Conditional {
        condition: ConditionDef,
        #[serde(default)]
        actions: Vec<ActionDef>,
    },
    RunVerb {
        #[serde(default)]
        owner: TargetDef,
        verb: Id,
        #[serde(default)]
        target: Option<Id>,
    },
    CancelVerb {
        #[serde(default)]
        owner: TargetDef,
        verb: Id,
        #[serde(default)]
        target: Option<Id>,
    },
    AddVerb {
        #[serde(default)]
        owner: TargetDef,
        verb: VerbDef,
    },
    ChangeScene {
        scene: Id,
    },
    SetPlayer {
        #[serde(default)]
        actor: Option<Id>,
    },
    RemoveActor {
        actor: Id,
    },
}

/// Predicates available to `ActionDef::Conditional`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConditionDef {
    StateIs {
        #[serde(default)]
        target: TargetDef,
        #[serde(default)]
        state: Option<String>,
    },
    PropertyIs {
        #[serde(default)]
        target: TargetDef,
        name: String,
        #[serde(default)]
        value: Option<String>,
    },
    Visible {
        #[serde(default)]
        actor: Option<Id>,
    },
    PlayerInside {
        #[serde(default)]
        actor: Option<Id>,
    },
    Not(Box<ConditionDef>),
    All(Vec<ConditionDef>),
    Any(Vec<ConditionDef>),
}

fn default_true() -> bool {
    true
}

fn default_layer() -> String {
    "main".to_string()
}

fn default_volume() -> f32 {
    1.0
}
