//! Saving and loading trained policies
//!
//! Parametric policies are stored per role so either actor can be loaded
//! without the other:
//! - `<path>.mpk` - network weights (Burn record format, full precision)
//! - `<path>.meta.json` - [`ActorMetadata`] as JSON
//!
//! Tabular policies are one JSON document keyed by role name.
//!
//! Missing or malformed artifacts are errors. Callers that want a fallback
//! must check [`policy_exists`] first and pick a baseline explicitly.

use anyhow::{Context, Result, bail};
use burn::{
    module::Module,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
    tensor::backend::{AutodiffBackend, Backend},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use super::mappo::MappoAgent;
use super::network::{Actor, ActorConfig, CentralizedCritic, CriticConfig};
use super::q_learning::TabularPolicies;
use crate::game::{NUM_ACTIONS, OBS_DIM, Role};

/// Metadata saved next to each actor's weights
///
/// Holds what is needed to rebuild the network before loading the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorMetadata {
    pub role: Role,
    pub obs_dim: usize,
    pub num_actions: usize,
    pub hidden_dim: usize,

    /// Completed updates when the snapshot was taken
    pub training_steps: usize,

    pub episodes_trained: usize,

    /// Version identifier for compatibility checking
    pub version: String,
}

impl ActorMetadata {
    pub fn new(
        role: Role,
        hidden_dim: usize,
        training_steps: usize,
        episodes_trained: usize,
    ) -> Self {
        Self {
            role,
            obs_dim: OBS_DIM,
            num_actions: NUM_ACTIONS,
            hidden_dim,
            training_steps,
            episodes_trained,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Metadata saved next to the critic's weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticMetadata {
    pub joint_obs_dim: usize,
    pub hidden_dim: usize,
    pub version: String,
}

fn meta_path(path: &Path) -> PathBuf {
    path.with_extension("meta.json")
}

fn weights_path(path: &Path) -> PathBuf {
    path.with_extension("mpk")
}

/// Base path of one role's actor inside a model directory
pub fn actor_path(dir: &Path, role: Role) -> PathBuf {
    dir.join(role.name())
}

/// Base path of the critic inside a model directory
pub fn critic_path(dir: &Path) -> PathBuf {
    dir.join("critic")
}

/// Whether a policy artifact is available at `path`
///
/// True for an existing tabular snapshot file, or when both the weights and
/// the metadata of an actor exist at that base path.
pub fn policy_exists(path: &Path) -> bool {
    path.is_file() || (weights_path(path).is_file() && meta_path(path).is_file())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
    }
    Ok(())
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize metadata")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let json =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse {:?}", path))
}

/// Save one actor's weights and metadata under the base `path`
pub fn save_actor<B: Backend>(actor: &Actor<B>, metadata: &ActorMetadata, path: &Path) -> Result<()> {
    ensure_parent(path)?;

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    recorder
        .record(actor.clone().into_record(), path.to_path_buf())
        .with_context(|| format!("Failed to save {} weights", metadata.role.name()))?;

    write_json(metadata, &meta_path(path))
}

/// Load one actor saved by [`save_actor`]
pub fn load_actor<B: Backend>(path: &Path, device: &B::Device) -> Result<(Actor<B>, ActorMetadata)> {
    let metadata: ActorMetadata = read_json(&meta_path(path))?;
    if metadata.obs_dim != OBS_DIM || metadata.num_actions != NUM_ACTIONS {
        bail!(
            "Actor at {:?} expects {} inputs and {} actions, this build uses {} and {}",
            path,
            metadata.obs_dim,
            metadata.num_actions,
            OBS_DIM,
            NUM_ACTIONS
        );
    }

    let actor = ActorConfig {
        obs_dim: metadata.obs_dim,
        num_actions: metadata.num_actions,
        hidden_dim: metadata.hidden_dim,
    }
    .init::<B>(device);

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    let record = recorder
        .load(path.to_path_buf(), device)
        .with_context(|| format!("Failed to load actor weights from {:?}", path))?;

    Ok((actor.load_record(record), metadata))
}

/// Save the critic's weights and metadata under the base `path`
pub fn save_critic<B: Backend>(
    critic: &CentralizedCritic<B>,
    hidden_dim: usize,
    path: &Path,
) -> Result<()> {
    ensure_parent(path)?;

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    recorder
        .record(critic.clone().into_record(), path.to_path_buf())
        .context("Failed to save critic weights")?;

    let metadata = CriticMetadata {
        joint_obs_dim: 2 * OBS_DIM,
        hidden_dim,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    write_json(&metadata, &meta_path(path))
}

/// Load a critic saved by [`save_critic`]
pub fn load_critic<B: Backend>(
    path: &Path,
    device: &B::Device,
) -> Result<(CentralizedCritic<B>, CriticMetadata)> {
    let metadata: CriticMetadata = read_json(&meta_path(path))?;
    if metadata.joint_obs_dim != 2 * OBS_DIM {
        bail!(
            "Critic at {:?} expects {} inputs, this build uses {}",
            path,
            metadata.joint_obs_dim,
            2 * OBS_DIM
        );
    }

    let critic = CriticConfig {
        joint_obs_dim: metadata.joint_obs_dim,
        hidden_dim: metadata.hidden_dim,
    }
    .init::<B>(device);

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    let record = recorder
        .load(path.to_path_buf(), device)
        .with_context(|| format!("Failed to load critic weights from {:?}", path))?;

    Ok((critic.load_record(record), metadata))
}

/// Save both actors and the critic into `dir`
///
/// Produces `hunter.*`, `prey.*` and `critic.*`; each snapshot is complete on
/// its own.
pub fn save_agent<B: AutodiffBackend>(agent: &MappoAgent<B>, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {:?}", dir))?;

    let config = agent.config();
    for (role, actor) in [
        (Role::Hunter, agent.hunter_actor()),
        (Role::Prey, agent.prey_actor()),
    ] {
        let metadata = ActorMetadata::new(
            role,
            config.actor_hidden,
            agent.training_step(),
            agent.episodes_trained(),
        );
        save_actor(actor, &metadata, &actor_path(dir, role))?;
    }
    save_critic(agent.critic(), config.critic_hidden, &critic_path(dir))?;

    info!(dir = ?dir, step = agent.training_step(), "Saved actor-critic snapshot");
    Ok(())
}

/// Write both roles' Q-tables as one JSON document
pub fn save_tabular(policies: &TabularPolicies, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string(policies).context("Failed to serialize Q-tables")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write Q-tables to {:?}", path))?;

    info!(
        path = ?path,
        hunter_states = policies.hunter.len(),
        prey_states = policies.prey.len(),
        "Saved tabular policies"
    );
    Ok(())
}

pub fn load_tabular(path: &Path) -> Result<TabularPolicies> {
    read_json(path)
}
