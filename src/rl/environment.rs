use anyhow::Result;
use burn::tensor::{Tensor, backend::Backend};

use super::observation::{joint_tensor, observation_tensor};
use crate::game::{JointAction, JointObservation, PursuitConfig, PursuitEngine, StepInfo};

/// One joint observation encoded for the actors and the critic
///
/// Actor inputs are `[1, OBS_DIM]`, the critic input is `[1, 2 * OBS_DIM]`.
/// The raw feature vectors ride along for the rollout buffer.
pub struct TensorObservation<B: Backend> {
    pub hunter: Tensor<B, 2>,
    pub prey: Tensor<B, 2>,
    pub joint: Tensor<B, 2>,
    pub raw: JointObservation,
}

impl<B: Backend> TensorObservation<B> {
    pub fn encode(raw: JointObservation, device: &B::Device) -> Self {
        Self {
            hunter: observation_tensor(&raw.hunter, device),
            prey: observation_tensor(&raw.prey, device),
            joint: joint_tensor(&raw, device),
            raw,
        }
    }
}

/// Outcome of one environment step in tensor form
pub struct EnvStep<B: Backend> {
    pub observation: TensorObservation<B>,
    pub rewards: (f32, f32),
    pub done: bool,
    pub info: StepInfo,
}

/// Pursuit environment for reinforcement learning
///
/// Wraps the simulation engine and provides a Burn-compatible interface:
/// - Per-role feature tensors of shape `[1, OBS_DIM]` plus the joint critic input
/// - Joint discrete action space (5 actions per role)
/// - Standard reset/step loop
pub struct PursuitEnvironment<B: Backend> {
    engine: PursuitEngine,
    device: B::Device,
}

impl<B: Backend> PursuitEnvironment<B> {
    /// Create a new environment; call [`Self::reset`] to start an episode
    pub fn new(config: PursuitConfig, device: B::Device) -> Result<Self> {
        Ok(Self {
            engine: PursuitEngine::new(config)?,
            device,
        })
    }

    /// Reset the environment and return the initial observation
    pub fn reset(&mut self) -> Result<TensorObservation<B>> {
        let raw = self.engine.reset()?;
        Ok(TensorObservation::encode(raw, &self.device))
    }

    /// Step the environment with one action index per role
    ///
    /// Indices outside the action set are treated as STAY.
    pub fn step(&mut self, hunter_action: usize, prey_action: usize) -> EnvStep<B> {
        let result = self
            .engine
            .step(JointAction::from_indices(hunter_action, prey_action));

        EnvStep {
            observation: TensorObservation::encode(result.observations, &self.device),
            rewards: result.rewards,
            done: result.done,
            info: result.info,
        }
    }

    /// Underlying simulation (for queries and tests)
    pub fn engine(&self) -> &PursuitEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PursuitEngine {
        &mut self.engine
    }
}
