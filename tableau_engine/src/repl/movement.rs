//! `repl::movement` module
//!
//! Handlers that advance game time: walking the player and waiting.

use super::Session;
use crate::geometry::Vec2;
use crate::style::GameStyle;
use crate::world::World;

use log::info;

/// Walk the player's actor to `(x, y)` one frame at a time, so proximity verbs fire
/// along the way.
pub fn walk_handler(world: &mut World, session: &Session, x: f32, y: f32) {
    let target = Vec2::new(x, y);
    if world.player_actor().is_none() {
        println!("{}", "Nobody to walk with.".error_style());
        return;
    }
    let frames = walk_player(world, session, target);
    info!("player walked to ({x}, {y}) in {frames} frame(s)");
}

/// Returns the number of frames simulated. The walk ends early if a verb changes scene.
pub(crate) fn walk_player(world: &mut World, session: &Session, target: Vec2) -> u32 {
    let step = world.settings.walk_speed * session.console.frame_step;
    let scene = world.current_scene.clone();
    let mut frames = 0;
    while frames < session.console.max_wait_frames && world.current_scene == scene {
        // the player can be removed or swapped by a verb mid-walk
        let Some(player) = world.player_actor_mut() else {
            break;
        };
        let pos = player.position();
        if pos == target {
            break;
        }
        player.set_position(pos.step_toward(target, step));
        world.update(session.console.frame_step);
        frames += 1;
    }
    frames
}

/// Advance one frame of `secs` (default: one console frame).
pub fn tick_handler(world: &mut World, session: &Session, secs: Option<f32>) {
    world.update(secs.unwrap_or(session.console.frame_step).max(0.0));
}

/// Advance `secs` of game time in console frames.
pub fn wait_handler(world: &mut World, session: &Session, secs: f32) {
    let frames = wait_frames(world, session, secs);
    info!("waited {secs}s ({frames} frame(s))");
}

pub(crate) fn wait_frames(world: &mut World, session: &Session, secs: f32) -> u32 {
    let frame = session.console.frame_step;
    let mut left = secs;
    let mut frames = 0;
    while left > f32::EPSILON && frames < session.console.max_wait_frames {
        let delta = frame.min(left);
        world.update(delta);
        left -= delta;
        frames += 1;
    }
    frames
}
