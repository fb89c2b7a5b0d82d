//! Learning for the pursuit game
//!
//! Provides:
//! - Burn tensor encoding of observations and a tensor-facing environment
//! - Per-role actors and a centralized critic trained with clipped-ratio updates
//! - Zero-sum tabular Q-learning over discretized states
//! - Policy persistence for both forms

pub mod backend;
pub mod buffer;
pub mod config;
pub mod environment;
pub mod mappo;
pub mod network;
pub mod observation;
pub mod persistence;
pub mod q_learning;
pub mod q_table;

pub use backend::{InferenceBackend, TrainingBackend, default_device};
pub use buffer::{JointTransition, RolloutBuffer};
pub use config::{MappoConfig, StateKeyMode, TabularConfig};
pub use environment::{EnvStep, PursuitEnvironment, TensorObservation};
pub use mappo::{ActionSample, MappoAgent, UpdateStats, greedy_action};
pub use network::{Actor, ActorConfig, CentralizedCritic, CriticConfig};
pub use observation::observation_tensor;
pub use persistence::{
    ActorMetadata, CriticMetadata, actor_path, critic_path, load_actor, load_critic,
    load_tabular, policy_exists, save_actor, save_agent, save_critic, save_tabular,
};
pub use q_learning::{EpisodeSummary, QLearner, TabularPolicies, default_starts, train_zero_sum};
pub use q_table::{QTable, StateKey};
