//! Tabular Q-learning mode
//!
//! Carves one maze from the pursuit configuration, trains both roles'
//! Q-tables against each other on it, and writes a single snapshot keyed by
//! role. Play mode rebuilds the same maze from the same seed.

use anyhow::{Context, Result, anyhow};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use tracing::info;

use crate::game::{Outcome, PursuitConfig, carve_maze};
use crate::metrics::TrainingStats;
use crate::rl::{TabularConfig, TabularPolicies, save_tabular, train_zero_sum};

#[derive(Debug, Clone)]
pub struct TabularTrainConfig {
    /// JSON file receiving both Q-tables
    pub save_path: PathBuf,

    /// Log training progress every N episodes
    pub log_frequency: usize,

    /// Maze dimensions, border opening and seed
    pub pursuit_config: PursuitConfig,

    pub tabular_config: TabularConfig,
}

impl TabularTrainConfig {
    pub fn new(save_path: PathBuf) -> Self {
        Self {
            save_path,
            log_frequency: 100,
            pursuit_config: PursuitConfig::default(),
            tabular_config: TabularConfig::default(),
        }
    }
}

pub struct TabularTrainMode {
    config: TabularTrainConfig,
    stats: TrainingStats,
}

impl TabularTrainMode {
    pub fn new(config: TabularTrainConfig) -> Self {
        Self {
            config,
            stats: TrainingStats::new(100),
        }
    }

    /// Train, save the snapshot and return it
    pub fn run(&mut self) -> Result<TabularPolicies> {
        let pursuit = &self.config.pursuit_config;
        pursuit
            .validate()
            .map_err(|e| anyhow!("Invalid pursuit config: {}", e))?;

        let mut rng = StdRng::seed_from_u64(pursuit.seed);
        let maze = carve_maze(pursuit, &mut rng)?;

        let tabular = &self.config.tabular_config;
        info!(
            episodes = tabular.episodes,
            max_steps = tabular.max_steps,
            alpha = tabular.alpha,
            gamma = tabular.gamma,
            epsilon = tabular.epsilon,
            width = maze.width(),
            height = maze.height(),
            "Tabular Q-learning"
        );

        let log_frequency = self.config.log_frequency;
        let stats = &mut self.stats;
        let policies = train_zero_sum(&maze, tabular, &mut rng, |summary| {
            stats.record_episode(
                summary.hunter_reward,
                summary.steps as usize,
                summary.outcome == Outcome::Caught,
            );
            if log_frequency > 0 && summary.episode % log_frequency == 0 {
                info!(
                    "[Episode {}/{}] epsilon {:.3} | {}",
                    summary.episode,
                    tabular.episodes,
                    summary.epsilon,
                    stats.format_summary()
                );
            }
        })?;

        save_tabular(&policies, &self.config.save_path).with_context(|| {
            format!("Failed to save Q-tables to {:?}", self.config.save_path)
        })?;

        info!(
            hunter_states = policies.hunter.len(),
            prey_states = policies.prey.len(),
            "Tabular training complete: {}",
            self.stats.format_summary()
        );
        Ok(policies)
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }
}
