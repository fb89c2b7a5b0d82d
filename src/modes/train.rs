//! Actor-critic training mode
//!
//! Runs pursuit episodes in the environment, samples both roles' actions
//! from their actors, and updates the actors and the centralized critic every
//! time a rollout chunk fills. Snapshots are written periodically and at the
//! end of training.
//!
//! # Example
//!
//! ```rust,ignore
//! use maze_pursuit::modes::{TrainConfig, TrainMode};
//! use maze_pursuit::rl::{TrainingBackend, default_device};
//!
//! let config = TrainConfig::new(5000, "models/mappo".into());
//! let mut train_mode = TrainMode::<TrainingBackend>::new(config, default_device())?;
//! train_mode.run()?;
//! ```

use anyhow::{Context, Result};
use burn::tensor::backend::AutodiffBackend;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::game::{Outcome, PursuitConfig};
use crate::metrics::TrainingStats;
use crate::rl::{MappoAgent, MappoConfig, PursuitEnvironment, save_agent};

/// Per-episode totals returned by [`TrainMode::run_episode`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeResult {
    pub hunter_reward: f32,
    pub prey_reward: f32,
    pub steps: usize,
    pub outcome: Outcome,
}

/// Configuration for training mode
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Number of episodes to train
    pub num_episodes: usize,

    /// Directory receiving the final actors and critic
    pub save_dir: PathBuf,

    /// Save a checkpoint every N episodes
    pub checkpoint_frequency: usize,

    /// Log training progress every N episodes
    pub log_frequency: usize,

    /// Environment configuration
    pub pursuit_config: PursuitConfig,

    /// Actor-critic hyperparameters
    pub mappo_config: MappoConfig,
}

impl TrainConfig {
    /// Create a training configuration with default environment and hyperparameters
    ///
    /// ```rust
    /// use maze_pursuit::modes::TrainConfig;
    /// use std::path::PathBuf;
    ///
    /// let config = TrainConfig::new(1000, PathBuf::from("models/mappo"));
    /// assert_eq!(config.checkpoint_frequency, 500);
    /// ```
    pub fn new(num_episodes: usize, save_dir: PathBuf) -> Self {
        Self {
            num_episodes,
            save_dir,
            checkpoint_frequency: 500,
            log_frequency: 50,
            pursuit_config: PursuitConfig::default(),
            mappo_config: MappoConfig::default(),
        }
    }
}

/// Actor-critic training loop
pub struct TrainMode<B: AutodiffBackend> {
    agent: MappoAgent<B>,
    env: PursuitEnvironment<B::InnerBackend>,
    stats: TrainingStats,
    config: TrainConfig,
    current_episode: usize,
}

impl<B: AutodiffBackend> TrainMode<B> {
    pub fn new(config: TrainConfig, device: B::Device) -> Result<Self> {
        let agent = MappoAgent::new(config.mappo_config.clone(), device.clone())?;
        let env = PursuitEnvironment::new(config.pursuit_config.clone(), device)?;

        Ok(Self {
            agent,
            env,
            // 100-episode rolling window
            stats: TrainingStats::new(100),
            config,
            current_episode: 0,
        })
    }

    /// Train for the configured number of episodes and save the result
    pub fn run(&mut self) -> Result<()> {
        self.log_header();

        for episode in 0..self.config.num_episodes {
            self.current_episode = episode;

            let result = self.run_episode()?;
            self.stats.record_episode(
                result.hunter_reward,
                result.steps,
                result.outcome == Outcome::Caught,
            );
            self.agent.increment_episode();

            if self.config.log_frequency > 0 && (episode + 1) % self.config.log_frequency == 0 {
                info!(
                    "[Episode {}/{}] {}",
                    episode + 1,
                    self.config.num_episodes,
                    self.stats.format_summary()
                );
            }

            if self.config.checkpoint_frequency > 0
                && (episode + 1) % self.config.checkpoint_frequency == 0
            {
                self.save_checkpoint()?;
            }
        }

        save_agent(&self.agent, &self.config.save_dir).with_context(|| {
            format!("Failed to save final model to {:?}", self.config.save_dir)
        })?;

        info!(save_dir = ?self.config.save_dir, "Training complete");
        info!("Final statistics: {}", self.stats.format_summary());
        Ok(())
    }

    /// Run one episode, updating whenever the rollout chunk fills
    pub fn run_episode(&mut self) -> Result<EpisodeResult> {
        let mut obs = self.env.reset()?;
        let mut result = EpisodeResult {
            hunter_reward: 0.0,
            prey_reward: 0.0,
            steps: 0,
            outcome: Outcome::Running,
        };

        while !result.outcome.is_terminal() {
            let sample = self.agent.select_actions(&obs)?;
            let step = self.env.step(sample.hunter_action, sample.prey_action);

            self.agent
                .store_transition(&obs, &sample, step.rewards.0, step.done);

            result.hunter_reward += step.rewards.0;
            result.prey_reward += step.rewards.1;
            result.steps += 1;
            result.outcome = step.info.outcome;
            obs = step.observation;

            if self.agent.should_update() {
                // Masked by the buffer when the last stored step was terminal
                let last_value = self.agent.value(&obs);
                if let Some(stats) = self.agent.update(last_value) {
                    debug!(
                        step = self.agent.training_step(),
                        hunter_policy_loss = stats.hunter_policy_loss,
                        prey_policy_loss = stats.prey_policy_loss,
                        critic_loss = stats.critic_loss,
                        "Update"
                    );
                    self.stats.record_update(&stats);
                }
            }
        }

        Ok(result)
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    pub fn agent(&self) -> &MappoAgent<B> {
        &self.agent
    }

    fn save_checkpoint(&self) -> Result<()> {
        let checkpoint_dir = self
            .config
            .save_dir
            .join(format!("checkpoint_ep{}", self.current_episode + 1));

        save_agent(&self.agent, &checkpoint_dir)
            .with_context(|| format!("Failed to save checkpoint to {:?}", checkpoint_dir))?;

        info!(path = ?checkpoint_dir, "Checkpoint saved");
        Ok(())
    }

    fn log_header(&self) {
        let pursuit = &self.config.pursuit_config;
        let mappo = &self.config.mappo_config;
        info!(
            episodes = self.config.num_episodes,
            width = pursuit.width,
            height = pursuit.height,
            max_steps = pursuit.max_steps,
            movement = ?pursuit.movement,
            "Actor-critic training"
        );
        info!(
            learning_rate = mappo.learning_rate,
            gamma = mappo.gamma,
            clip_epsilon = mappo.clip_epsilon,
            rollout_length = mappo.rollout_length,
            n_epochs = mappo.n_epochs,
            checkpoint_frequency = self.config.checkpoint_frequency,
            save_dir = ?self.config.save_dir,
            "Hyperparameters"
        );
    }
}
