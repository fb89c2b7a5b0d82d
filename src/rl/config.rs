//! Learning hyperparameter configuration

use serde::{Deserialize, Serialize};

use crate::game::{DistanceMetric, RewardConfig};

/// Configuration for the centralized-critic actor-critic algorithm
///
/// Default values follow common PPO settings, with a rollout chunk short
/// enough to update several times per pursuit episode.
///
/// # Example
///
/// ```rust
/// use maze_pursuit::rl::MappoConfig;
///
/// let config = MappoConfig {
///     rollout_length: 128,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappoConfig {
    /// Learning rate shared by the three Adam optimizers
    ///
    /// Default: 3e-4
    pub learning_rate: f64,

    /// Discount factor for future rewards (gamma)
    ///
    /// Default: 0.99
    pub gamma: f32,

    /// Clipping parameter (epsilon) for the probability ratio
    ///
    /// Limits how much either actor can change in a single update.
    ///
    /// Default: 0.2
    pub clip_epsilon: f32,

    /// Coefficient for the entropy bonus in the actor losses
    ///
    /// Default: 0.0 (no bonus)
    pub entropy_coef: f32,

    /// Number of passes over each rollout chunk
    ///
    /// Default: 4
    pub n_epochs: usize,

    /// Number of joint steps collected before an update
    ///
    /// Also determines the buffer capacity.
    ///
    /// Default: 64
    pub rollout_length: usize,

    /// Hidden width of each actor
    ///
    /// Default: 128
    pub actor_hidden: usize,

    /// Hidden width of the centralized critic
    ///
    /// Default: 256
    pub critic_hidden: usize,

    /// Seed for stochastic action sampling
    pub seed: u64,
}

impl Default for MappoConfig {
    fn default() -> Self {
        Self {
            learning_rate: 3e-4,
            gamma: 0.99,
            clip_epsilon: 0.2,
            entropy_coef: 0.0,
            n_epochs: 4,
            rollout_length: 64,
            actor_hidden: 128,
            critic_hidden: 256,
            seed: 7,
        }
    }
}

impl MappoConfig {
    /// Validate configuration parameters
    ///
    /// # Returns
    ///
    /// `Ok(())` if all parameters are valid, `Err(String)` with an error message otherwise.
    pub fn validate(&self) -> Result<(), String> {
        if self.learning_rate <= 0.0 {
            return Err(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            ));
        }

        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(format!("gamma must be in [0, 1], got {}", self.gamma));
        }

        if self.clip_epsilon <= 0.0 || self.clip_epsilon > 1.0 {
            return Err(format!(
                "clip_epsilon must be in (0, 1], got {}",
                self.clip_epsilon
            ));
        }

        if self.entropy_coef < 0.0 {
            return Err(format!(
                "entropy_coef must be non-negative, got {}",
                self.entropy_coef
            ));
        }

        if self.n_epochs == 0 {
            return Err("n_epochs must be at least 1".to_string());
        }

        if self.rollout_length == 0 {
            return Err("rollout_length must be at least 1".to_string());
        }

        if self.actor_hidden == 0 || self.critic_hidden == 0 {
            return Err("hidden sizes must be at least 1".to_string());
        }

        Ok(())
    }
}

/// How a tabular learner discretizes its view of the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKeyMode {
    /// Own cell plus the per-axis sign of the offset to the opponent
    SignedWithPosition,
    /// Raw cell offset to the opponent
    RelativeOffset,
}

/// Configuration for zero-sum tabular Q-learning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabularConfig {
    pub episodes: usize,
    /// Step budget per episode
    pub max_steps: u32,
    /// Learning rate (alpha)
    pub alpha: f32,
    /// Discount factor (gamma)
    pub gamma: f32,
    /// Initial exploration rate
    pub epsilon: f32,
    /// Multiplicative epsilon decay applied after each episode
    pub epsilon_decay: f32,
    /// Epsilon never decays below this
    pub epsilon_min: f32,
    pub state_key: StateKeyMode,
    pub rewards: RewardConfig,
}

impl Default for TabularConfig {
    fn default() -> Self {
        Self {
            episodes: 1000,
            max_steps: 200,
            alpha: 0.1,
            gamma: 0.9,
            epsilon: 0.2,
            epsilon_decay: 1.0,
            epsilon_min: 0.01,
            state_key: StateKeyMode::SignedWithPosition,
            rewards: RewardConfig {
                shaping_scale: 0.5,
                distance_metric: DistanceMetric::Euclidean,
                ..RewardConfig::default()
            },
        }
    }
}

impl TabularConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.max_steps == 0 {
            return Err("max_steps must be at least 1".to_string());
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(format!("alpha must be in (0, 1], got {}", self.alpha));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(format!("gamma must be in [0, 1], got {}", self.gamma));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(format!("epsilon must be in [0, 1], got {}", self.epsilon));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(format!(
                "epsilon_decay must be in (0, 1], got {}",
                self.epsilon_decay
            ));
        }
        if !(0.0..=1.0).contains(&self.epsilon_min) {
            return Err(format!(
                "epsilon_min must be in [0, 1], got {}",
                self.epsilon_min
            ));
        }
        self.rewards.validate()
    }
}
