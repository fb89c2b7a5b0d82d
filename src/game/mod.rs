//! Core pursuit simulation
//!
//! This module contains the maze, agent bodies, rewards and episode logic
//! without any tensor or I/O dependencies. It is driven by both training
//! loops and by headless play.

pub mod action;
pub mod body;
pub mod config;
pub mod engine;
pub mod items;
pub mod maze;
pub mod rewards;
pub mod sensors;
pub mod state;
pub mod trail;

// Re-export commonly used types
pub use action::{Action, JointAction, NUM_ACTIONS};
pub use body::Body;
pub use config::{DistanceMetric, Movement, PursuitConfig, RewardConfig};
pub use engine::{JointObservation, PursuitEngine, StepInfo, StepResult, carve_maze};
pub use items::Item;
pub use maze::{Cell, Maze};
pub use rewards::{RewardInputs, compute_rewards};
pub use sensors::OBS_DIM;
pub use state::{JointState, Outcome, Position, Rect, Role};
pub use trail::{Trail, TrailPoint};
