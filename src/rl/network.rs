//! Actor and centralized critic networks
//!
//! Each role owns an [`Actor`] that sees only its own observation; a single
//! [`CentralizedCritic`] sees both observations and is used only while
//! training.
//!
//! # Architecture
//!
//! ```text
//! Actor:   [batch, OBS_DIM]     → Linear → ReLU → Linear → ReLU → Linear → [batch, 5] logits
//! Critic:  [batch, 2 * OBS_DIM] → Linear → ReLU → Linear → ReLU → Linear → [batch, 1] value
//! ```
//!
//! # Example
//!
//! ```rust
//! use maze_pursuit::rl::{ActorConfig, CriticConfig};
//! use burn::backend::NdArray;
//! use burn::backend::ndarray::NdArrayDevice;
//! use burn::tensor::Tensor;
//!
//! type Backend = NdArray<f32>;
//!
//! let device = NdArrayDevice::default();
//! let actor = ActorConfig::new(128).init::<Backend>(&device);
//! let critic = CriticConfig::new(256).init::<Backend>(&device);
//!
//! let logits = actor.forward(Tensor::zeros([4, maze_pursuit::game::OBS_DIM], &device));
//! assert_eq!(logits.dims(), [4, 5]);
//!
//! let value = critic.forward(Tensor::zeros([4, 2 * maze_pursuit::game::OBS_DIM], &device));
//! assert_eq!(value.dims(), [4, 1]);
//! ```

use burn::{
    module::Module,
    nn::{Linear, LinearConfig},
    tensor::{Tensor, activation::relu, backend::Backend},
};

use crate::game::{NUM_ACTIONS, OBS_DIM};

/// Configuration for a per-role actor
#[derive(Debug, Clone)]
pub struct ActorConfig {
    /// Length of one role's observation (default: `OBS_DIM`)
    pub obs_dim: usize,
    /// Number of actions the policy can output (default: 5)
    pub num_actions: usize,
    pub hidden_dim: usize,
}

impl ActorConfig {
    pub fn new(hidden_dim: usize) -> Self {
        Self {
            obs_dim: OBS_DIM,
            num_actions: NUM_ACTIONS,
            hidden_dim,
        }
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Actor<B> {
        Actor {
            fc1: LinearConfig::new(self.obs_dim, self.hidden_dim).init(device),
            fc2: LinearConfig::new(self.hidden_dim, self.hidden_dim).init(device),
            policy_head: LinearConfig::new(self.hidden_dim, self.num_actions).init(device),
        }
    }
}

/// Decentralized policy: own observation to action logits
#[derive(Module, Debug)]
pub struct Actor<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    policy_head: Linear<B>,
}

impl<B: Backend> Actor<B> {
    /// `[batch, obs_dim]` observations to `[batch, num_actions]` logits
    pub fn forward(&self, observation: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.fc1.forward(observation));
        let x = relu(self.fc2.forward(x));
        self.policy_head.forward(x)
    }
}

/// Configuration for the centralized critic
#[derive(Debug, Clone)]
pub struct CriticConfig {
    /// Length of the concatenated joint observation (default: `2 * OBS_DIM`)
    pub joint_obs_dim: usize,
    pub hidden_dim: usize,
}

impl CriticConfig {
    pub fn new(hidden_dim: usize) -> Self {
        Self {
            joint_obs_dim: 2 * OBS_DIM,
            hidden_dim,
        }
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> CentralizedCritic<B> {
        CentralizedCritic {
            fc1: LinearConfig::new(self.joint_obs_dim, self.hidden_dim).init(device),
            fc2: LinearConfig::new(self.hidden_dim, self.hidden_dim).init(device),
            value_head: LinearConfig::new(self.hidden_dim, 1).init(device),
        }
    }
}

/// Value estimate of the hunter's return from both roles' observations
#[derive(Module, Debug)]
pub struct CentralizedCritic<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    value_head: Linear<B>,
}

impl<B: Backend> CentralizedCritic<B> {
    /// `[batch, joint_obs_dim]` to `[batch, 1]`
    pub fn forward(&self, joint_observation: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.fc1.forward(joint_observation));
        let x = relu(self.fc2.forward(x));
        self.value_head.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::Autodiff;
    use burn::backend::ndarray::{NdArray, NdArrayDevice};
    use burn::tensor::{Distribution, TensorData};

    type TestBackend = NdArray<f32>;
    type TestAutodiffBackend = Autodiff<NdArray<f32>>;

    #[test]
    fn test_forward_pass_shapes() {
        let device = NdArrayDevice::default();
        let actor = ActorConfig::new(32).init::<TestBackend>(&device);
        let critic = CriticConfig::new(64).init::<TestBackend>(&device);

        for batch_size in [1, 4, 16] {
            let logits = actor.forward(Tensor::zeros([batch_size, OBS_DIM], &device));
            assert_eq!(logits.dims(), [batch_size, NUM_ACTIONS]);

            let value = critic.forward(Tensor::zeros([batch_size, 2 * OBS_DIM], &device));
            assert_eq!(value.dims(), [batch_size, 1]);
        }
    }

    #[test]
    fn test_gradient_flow() {
        let device = NdArrayDevice::default();
        let actor = ActorConfig::new(16).init::<TestAutodiffBackend>(&device);

        let observation = Tensor::ones([1, OBS_DIM], &device).require_grad();
        let loss = actor.forward(observation.clone()).sum();
        let gradients = loss.backward();

        assert!(
            observation.grad(&gradients).is_some(),
            "Gradients should flow back to input observation"
        );
    }

    #[test]
    fn test_output_finite() {
        let device = NdArrayDevice::default();
        let critic = CriticConfig::new(32).init::<TestBackend>(&device);

        let observation =
            Tensor::random([8, 2 * OBS_DIM], Distribution::Uniform(-1.0, 1.0), &device);
        let value_data: TensorData = critic.forward(observation).into_data();
        for &val in value_data.as_slice::<f32>().unwrap() {
            assert!(val.is_finite(), "Values should be finite, got: {}", val);
        }
    }

    #[test]
    fn test_batch_consistency() {
        let device = NdArrayDevice::default();
        let actor = ActorConfig::new(16).init::<TestBackend>(&device);

        let single = Tensor::ones([1, OBS_DIM], &device);
        let batch = Tensor::cat(vec![single.clone(), single.clone(), single.clone()], 0);

        let single_data: TensorData = actor.forward(single).into_data();
        let batch_data: TensorData = actor.forward(batch).into_data();
        let single_vals = single_data.as_slice::<f32>().unwrap();
        let batch_vals = batch_data.as_slice::<f32>().unwrap();

        for j in 0..NUM_ACTIONS {
            assert!((single_vals[j] - batch_vals[j]).abs() < 1e-5);
        }
    }
}
