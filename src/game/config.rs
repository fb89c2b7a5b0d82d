use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::state::Position;

/// How an agent body translates an action into displacement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Movement {
    /// One whole grid cell per action, rejected if the destination is a wall
    Discrete,
    /// `speed` pixels per action, collision-checked per axis
    Continuous { speed: f32 },
}

/// Metric used by distance-based reward shaping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    Manhattan,
    Euclidean,
}

impl DistanceMetric {
    pub fn distance(self, a: (f32, f32), b: (f32, f32)) -> f32 {
        let dx = a.0 - b.0;
        let dy = a.1 - b.1;
        match self {
            DistanceMetric::Manhattan => dx.abs() + dy.abs(),
            DistanceMetric::Euclidean => dx.hypot(dy),
        }
    }
}

/// Reward constants shared by the environment and the tabular loop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Flat reward to the hunter on capture (the prey gets the negation)
    pub capture_reward: f32,
    /// Multiplier on the per-step reduction in hunter/prey distance
    pub shaping_scale: f32,
    /// Added to a mover's own reward when its action hit a wall
    pub wall_penalty: f32,
    /// Flat bonus to the prey (penalty to the hunter) on timeout
    pub timeout_reward: f32,
    /// Distance measured in cell units
    pub distance_metric: DistanceMetric,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            capture_reward: 10.0,
            shaping_scale: 0.1,
            wall_penalty: -0.05,
            timeout_reward: 5.0,
            distance_metric: DistanceMetric::Manhattan,
        }
    }
}

impl RewardConfig {
    pub fn validate(&self) -> Result<(), String> {
        let values = [
            ("capture_reward", self.capture_reward),
            ("shaping_scale", self.shaping_scale),
            ("wall_penalty", self.wall_penalty),
            ("timeout_reward", self.timeout_reward),
        ];
        for (name, value) in values {
            if !value.is_finite() {
                return Err(format!("{} must be finite, got {}", name, value));
            }
        }
        if self.capture_reward < 0.0 {
            return Err(format!(
                "capture_reward must be non-negative, got {}",
                self.capture_reward
            ));
        }
        if self.wall_penalty > 0.0 {
            return Err(format!(
                "wall_penalty must not be positive, got {}",
                self.wall_penalty
            ));
        }
        Ok(())
    }
}

/// Configuration for the pursuit simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PursuitConfig {
    /// Maze width in cells
    pub width: usize,
    /// Maze height in cells
    pub height: usize,
    /// Pixel size of one cell
    pub cell_size: u32,
    /// Number of prey positions kept in the trail
    pub trail_capacity: usize,
    /// Episode step budget
    pub max_steps: u32,
    pub movement: Movement,
    /// Body side length as a fraction of the cell size
    pub body_fraction: f32,
    /// Item side length as a fraction of the cell size
    pub item_fraction: f32,
    /// Force every border cell free after carving
    pub open_borders: bool,
    /// Carve a new maze on every reset instead of only the first
    pub regenerate_maze: bool,
    /// Collectibles scattered for the prey on reset
    pub item_count: usize,
    /// Requested hunter spawn cell; defaults to `(width - 2, height - 2)`
    pub hunter_start: Option<Position>,
    /// Requested prey spawn cell; defaults to `(1, 1)`
    pub prey_start: Option<Position>,
    /// Seed for maze carving, item scattering and random actions
    pub seed: u64,
    pub rewards: RewardConfig,
}

impl Default for PursuitConfig {
    fn default() -> Self {
        Self {
            width: 21,
            height: 15,
            cell_size: 12,
            trail_capacity: 20,
            max_steps: 300,
            movement: Movement::Continuous { speed: 3.0 },
            body_fraction: 0.6,
            item_fraction: 0.6,
            open_borders: true,
            regenerate_maze: true,
            item_count: 0,
            hunter_start: None,
            prey_start: None,
            seed: 42,
            rewards: RewardConfig::default(),
        }
    }
}

impl PursuitConfig {
    /// Create a new configuration with custom grid size
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Small discrete-movement arena for tests and quick runs
    pub fn small() -> Self {
        Self {
            movement: Movement::Discrete,
            max_steps: 100,
            ..Self::new(9, 9)
        }
    }

    /// Load a configuration from a JSON file, filling missing fields with defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config
            .validate()
            .map_err(|e| anyhow!("Invalid config {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn hunter_start_cell(&self) -> Position {
        self.hunter_start.unwrap_or(Position::new(
            self.width as i32 - 2,
            self.height as i32 - 2,
        ))
    }

    pub fn prey_start_cell(&self) -> Position {
        self.prey_start.unwrap_or(Position::new(1, 1))
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.width < 3 || self.height < 3 {
            return Err(format!(
                "maze must be at least 3x3, got {}x{}",
                self.width, self.height
            ));
        }
        if self.cell_size == 0 {
            return Err("cell_size must be positive".to_string());
        }
        if self.max_steps == 0 {
            return Err("max_steps must be positive".to_string());
        }
        if !(self.body_fraction > 0.0 && self.body_fraction <= 1.0) {
            return Err(format!(
                "body_fraction must be in (0, 1], got {}",
                self.body_fraction
            ));
        }
        if !(self.item_fraction > 0.0 && self.item_fraction <= 1.0) {
            return Err(format!(
                "item_fraction must be in (0, 1], got {}",
                self.item_fraction
            ));
        }
        if let Movement::Continuous { speed } = self.movement {
            // Moving a full cell or more per tick can skip over a wall cell
            if !(speed > 0.0 && speed < self.cell_size as f32) {
                return Err(format!(
                    "continuous speed must be in (0, cell_size), got {}",
                    speed
                ));
            }
        }
        self.rewards.validate()
    }
}
