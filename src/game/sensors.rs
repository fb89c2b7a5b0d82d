//! Per-agent feature vectors
//!
//! Layout of one observation (`OBS_DIM` values):
//! - 0..2: displacement to the opponent's center, in cells, divided by the
//!   larger maze dimension
//! - 2..10: wall distances along `NUM_RAYS` evenly spaced angles, as a
//!   fraction of the maximum cast distance (1.0 = nothing hit)
//! - 10..14: normalized distances to the most recent trail points, oldest
//!   first, zero-padded at the end
//! - 14: 1.0 when the agent's last action bumped into a wall

use std::f32::consts::TAU;

use super::{body::Body, maze::Maze, trail::Trail};

pub const NUM_RAYS: usize = 8;
pub const TRAIL_FEATURES: usize = 4;
pub const OBS_DIM: usize = 2 + NUM_RAYS + TRAIL_FEATURES + 1;

/// Ray march step as a fraction of the cell size
const RAY_STEP_FRACTION: f32 = 0.2;

/// Build the observation of `own` facing `other`
pub fn observe(maze: &Maze, own: &Body, other: &Body, trail: &Trail) -> Vec<f32> {
    let cell = maze.cell_size() as f32;
    let scale = maze.width().max(maze.height()) as f32;
    let (ox, oy) = own.center();
    let (tx, ty) = other.center();

    let mut obs = Vec::with_capacity(OBS_DIM);
    obs.push((tx - ox) / cell / scale);
    obs.push((ty - oy) / cell / scale);

    for i in 0..NUM_RAYS {
        obs.push(raycast(maze, (ox, oy), TAU * i as f32 / NUM_RAYS as f32));
    }

    let mut trail_features = [0.0; TRAIL_FEATURES];
    for (slot, point) in trail_features.iter_mut().zip(trail.recent(TRAIL_FEATURES)) {
        *slot = ((point.x - ox) / cell / scale).hypot((point.y - oy) / cell / scale);
    }
    obs.extend_from_slice(&trail_features);

    obs.push(if own.last_action_blocked() { 1.0 } else { 0.0 });
    obs
}

/// March from `origin` along `angle` until a wall cell is hit
///
/// Returns the travelled fraction of the maximum cast distance, or 1.0 if
/// nothing was hit. Steps are a fifth of a cell so one-cell walls are never
/// skipped.
pub fn raycast(maze: &Maze, origin: (f32, f32), angle: f32) -> f32 {
    let cell = maze.cell_size() as f32;
    let step = (cell * RAY_STEP_FRACTION).max(1.0);
    let max_dist = maze.width().max(maze.height()) as f32 * cell;
    let (dx, dy) = (angle.cos(), angle.sin());

    let mut total = 0.0;
    while total < max_dist {
        total += step;
        if maze.is_wall(origin.0 + dx * total, origin.1 + dy * total) {
            return (total / max_dist).min(1.0);
        }
    }
    1.0
}
