//! Maze Pursuit - a hunter chasing a prey through procedurally generated mazes
//!
//! This library provides:
//! - The pursuit simulation: maze carving, agent bodies, rewards, observations (game module)
//! - Tabular Q-learning and centralized-critic actor-critic training (rl module)
//! - Rolling training statistics (metrics module)
//! - Train, tabular train and headless play entry points (modes module)

pub mod game;
pub mod metrics;
pub mod modes;
pub mod rl;
