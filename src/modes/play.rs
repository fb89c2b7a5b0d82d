//! Headless play with trained or baseline policies
//!
//! Loads either both actors (arg-max over logits) or both Q-tables (greedy,
//! no exploration) and runs inference-only episodes, logging each outcome and
//! a final summary. Without an artifact the run uses a uniformly random
//! baseline, chosen explicitly by the caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use maze_pursuit::modes::{PlayConfig, PlayMode, PolicySource};
//! use maze_pursuit::rl::{InferenceBackend, default_device};
//!
//! let config = PlayConfig::new(PolicySource::Parametric("models/mappo".into()), 10);
//! let mut play_mode = PlayMode::<InferenceBackend>::new(config, default_device())?;
//! let summary = play_mode.run()?;
//! ```

use anyhow::{Result, bail};
use burn::tensor::backend::Backend;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use tracing::info;

use crate::game::{Action, JointAction, Movement, Outcome, PursuitConfig, PursuitEngine, Role};
use crate::rl::{
    Actor, QTable, StateKey, StateKeyMode, actor_path, greedy_action, load_actor, load_tabular,
    observation_tensor, policy_exists,
};

/// Where the policies for a play run come from
#[derive(Debug, Clone, PartialEq)]
pub enum PolicySource {
    /// Directory holding `hunter.*` and `prey.*` actor snapshots
    Parametric(PathBuf),
    /// Tabular snapshot file
    Tabular(PathBuf),
    /// Uniformly random actions for both roles
    Random,
}

#[derive(Debug, Clone)]
pub struct PlayConfig {
    pub source: PolicySource,
    pub episodes: usize,
    pub pursuit_config: PursuitConfig,
}

impl PlayConfig {
    pub fn new(source: PolicySource, episodes: usize) -> Self {
        Self {
            source,
            episodes,
            pursuit_config: PursuitConfig::default(),
        }
    }
}

/// One role's decision rule
enum Controller<B: Backend> {
    Parametric(Actor<B>),
    Tabular { table: QTable, mode: StateKeyMode },
    Random,
}

/// Aggregate results of a play run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaySummary {
    pub episodes: usize,
    pub captures: usize,
    pub timeouts: usize,
    pub mean_steps: f32,
    pub mean_hunter_reward: f32,
}

pub struct PlayMode<B: Backend> {
    engine: PursuitEngine,
    hunter: Controller<B>,
    prey: Controller<B>,
    episodes: usize,
    rng: StdRng,
    device: B::Device,
}

impl<B: Backend> PlayMode<B> {
    /// Load the requested policies and build the environment
    ///
    /// Fails when a requested artifact is missing or malformed.
    pub fn new(config: PlayConfig, device: B::Device) -> Result<Self> {
        let mut pursuit = config.pursuit_config;

        let (hunter, prey) = match &config.source {
            PolicySource::Parametric(dir) => {
                let mut actors = Vec::with_capacity(2);
                for role in [Role::Hunter, Role::Prey] {
                    let path = actor_path(dir, role);
                    if !policy_exists(&path) {
                        bail!("No {} actor found at {:?}", role.name(), path);
                    }
                    let (actor, metadata) = load_actor::<B>(&path, &device)?;
                    info!(
                        role = role.name(),
                        path = ?path,
                        training_steps = metadata.training_steps,
                        episodes_trained = metadata.episodes_trained,
                        version = %metadata.version,
                        "Loaded actor"
                    );
                    actors.push(Controller::Parametric(actor));
                }
                let prey = actors.pop();
                let hunter = actors.pop();
                match (hunter, prey) {
                    (Some(hunter), Some(prey)) => (hunter, prey),
                    _ => bail!("Failed to load both actors from {:?}", dir),
                }
            }
            PolicySource::Tabular(path) => {
                if !policy_exists(path) {
                    bail!("No tabular snapshot found at {:?}", path);
                }
                let policies = load_tabular(path)?;
                info!(
                    path = ?path,
                    hunter_states = policies.hunter.len(),
                    prey_states = policies.prey.len(),
                    "Loaded Q-tables"
                );
                // Tables are keyed by cell on the maze they were trained on
                pursuit.movement = Movement::Discrete;
                pursuit.regenerate_maze = false;
                let mode = |table: &QTable| {
                    table
                        .key_mode()
                        .unwrap_or(StateKeyMode::SignedWithPosition)
                };
                (
                    Controller::Tabular {
                        mode: mode(&policies.hunter),
                        table: policies.hunter,
                    },
                    Controller::Tabular {
                        mode: mode(&policies.prey),
                        table: policies.prey,
                    },
                )
            }
            PolicySource::Random => {
                info!("Using random baseline for both roles");
                (Controller::Random, Controller::Random)
            }
        };

        let rng = StdRng::seed_from_u64(pursuit.seed.wrapping_add(1));
        Ok(Self {
            engine: PursuitEngine::new(pursuit)?,
            hunter,
            prey,
            episodes: config.episodes,
            rng,
            device,
        })
    }

    /// Play all episodes and log a summary
    pub fn run(&mut self) -> Result<PlaySummary> {
        let mut captures = 0;
        let mut timeouts = 0;
        let mut total_steps = 0;
        let mut total_reward = 0.0;

        for episode in 1..=self.episodes {
            let (outcome, steps, hunter_reward) = self.run_episode()?;
            match outcome {
                Outcome::Caught => captures += 1,
                Outcome::TimedOut => timeouts += 1,
                Outcome::Running => {}
            }
            total_steps += steps;
            total_reward += hunter_reward;
            info!(episode, outcome = ?outcome, steps, hunter_reward, "Episode finished");
        }

        let n = self.episodes.max(1) as f32;
        let summary = PlaySummary {
            episodes: self.episodes,
            captures,
            timeouts,
            mean_steps: total_steps as f32 / n,
            mean_hunter_reward: total_reward / n,
        };
        info!(
            episodes = summary.episodes,
            captures = summary.captures,
            timeouts = summary.timeouts,
            mean_steps = summary.mean_steps,
            mean_hunter_reward = summary.mean_hunter_reward,
            "Play summary"
        );
        Ok(summary)
    }

    /// Run one episode to termination
    pub fn run_episode(&mut self) -> Result<(Outcome, u32, f32)> {
        let mut obs = self.engine.reset()?;
        let mut hunter_reward = 0.0;

        while !self.engine.outcome().is_terminal() {
            let hunter_action = self.decide(Role::Hunter, &obs.hunter)?;
            let prey_action = self.decide(Role::Prey, &obs.prey)?;
            let result = self.engine.step(JointAction::new(hunter_action, prey_action));
            hunter_reward += result.rewards.0;
            obs = result.observations;
        }

        Ok((self.engine.outcome(), self.engine.steps(), hunter_reward))
    }

    fn decide(&mut self, role: Role, features: &[f32]) -> Result<Action> {
        let maze = self.engine.maze();
        let hunter_cell = self.engine.hunter().cell(maze);
        let prey_cell = self.engine.prey().cell(maze);
        let (controller, own, other) = match role {
            Role::Hunter => (&self.hunter, hunter_cell, prey_cell),
            Role::Prey => (&self.prey, prey_cell, hunter_cell),
        };

        match controller {
            Controller::Parametric(actor) => {
                let logits = actor.forward(observation_tensor(features, &self.device));
                Ok(Action::from_index(greedy_action(logits)?))
            }
            Controller::Tabular { table, mode } => {
                let key = StateKey::new(*mode, own, other);
                Ok(table.greedy_or_random(&key, &mut self.rng))
            }
            Controller::Random => Ok(self.engine.sample_action()),
        }
    }
}
