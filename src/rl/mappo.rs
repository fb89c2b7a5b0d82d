//! Centralized-critic multi-agent PPO
//!
//! Two decentralized actors (hunter and prey) act from their own
//! observations; one critic sees the joint observation and estimates the
//! hunter's return. Both actors are trained with the clipped-ratio
//! objective from a shared rollout: the hunter on the critic's advantage, the
//! prey on its negation, since the game is zero-sum.

use anyhow::{Result, anyhow};
use burn::{
    module::AutodiffModule,
    optim::{Adam, AdamConfig, GradientsParams, Optimizer, adaptor::OptimizerAdaptor},
    tensor::{
        ElementConversion, Int, Tensor,
        activation::{log_softmax, softmax},
        backend::{AutodiffBackend, Backend},
    },
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::buffer::{JointTransition, RolloutBuffer};
use super::config::MappoConfig;
use super::environment::TensorObservation;
use super::network::{Actor, ActorConfig, CentralizedCritic, CriticConfig};
use super::observation::{batch_tensor, split_joint};
use crate::game::OBS_DIM;

/// Actions sampled for one joint step, with what the update needs later
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionSample {
    pub hunter_action: usize,
    pub prey_action: usize,
    pub hunter_log_prob: f32,
    pub prey_log_prob: f32,
    /// Critic value of the joint observation the actions were taken in
    pub value: f32,
}

/// Mean losses of one update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateStats {
    pub hunter_policy_loss: f32,
    pub prey_policy_loss: f32,
    pub critic_loss: f32,
}

type ActorOptimizer<B> = OptimizerAdaptor<Adam, Actor<B>, B>;
type CriticOptimizer<B> = OptimizerAdaptor<Adam, CentralizedCritic<B>, B>;

/// Hunter and prey actors plus the centralized critic, each with its own Adam
///
/// # Example
///
/// ```rust,ignore
/// use maze_pursuit::rl::{MappoAgent, MappoConfig, TrainingBackend, default_device};
///
/// let agent = MappoAgent::<TrainingBackend>::new(MappoConfig::default(), default_device())?;
/// ```
pub struct MappoAgent<B: AutodiffBackend> {
    hunter_actor: Actor<B>,
    prey_actor: Actor<B>,
    critic: CentralizedCritic<B>,

    hunter_optim: ActorOptimizer<B>,
    prey_optim: ActorOptimizer<B>,
    critic_optim: CriticOptimizer<B>,

    config: MappoConfig,
    buffer: RolloutBuffer,
    rng: StdRng,

    /// Number of completed updates
    training_step: usize,

    /// Episode counter
    episodes_trained: usize,

    device: B::Device,
}

impl<B: AutodiffBackend> MappoAgent<B> {
    /// Create an agent with freshly initialized networks
    pub fn new(config: MappoConfig, device: B::Device) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow!("Invalid MAPPO configuration: {}", e))?;

        let hunter_actor = ActorConfig::new(config.actor_hidden).init(&device);
        let prey_actor = ActorConfig::new(config.actor_hidden).init(&device);
        let critic = CriticConfig::new(config.critic_hidden).init(&device);

        Ok(Self {
            hunter_actor,
            prey_actor,
            critic,
            hunter_optim: AdamConfig::new().init(),
            prey_optim: AdamConfig::new().init(),
            critic_optim: AdamConfig::new().init(),
            buffer: RolloutBuffer::new(config.rollout_length),
            rng: StdRng::seed_from_u64(config.seed),
            config,
            training_step: 0,
            episodes_trained: 0,
            device,
        })
    }

    /// Sample both roles' actions from their current policies
    pub fn select_actions(
        &mut self,
        obs: &TensorObservation<B::InnerBackend>,
    ) -> Result<ActionSample> {
        let hunter_logits = self.hunter_actor.valid().forward(obs.hunter.clone());
        let prey_logits = self.prey_actor.valid().forward(obs.prey.clone());

        let (hunter_action, hunter_log_prob) = sample_action(hunter_logits, &mut self.rng)?;
        let (prey_action, prey_log_prob) = sample_action(prey_logits, &mut self.rng)?;

        Ok(ActionSample {
            hunter_action,
            prey_action,
            hunter_log_prob,
            prey_log_prob,
            value: self.value(obs),
        })
    }

    /// Arg-max actions for both roles (inference)
    pub fn greedy_actions(
        &self,
        obs: &TensorObservation<B::InnerBackend>,
    ) -> Result<(usize, usize)> {
        Ok((
            greedy_action(self.hunter_actor.valid().forward(obs.hunter.clone()))?,
            greedy_action(self.prey_actor.valid().forward(obs.prey.clone()))?,
        ))
    }

    /// Critic estimate of the hunter's return from a joint observation
    pub fn value(&self, obs: &TensorObservation<B::InnerBackend>) -> f32 {
        self.critic
            .valid()
            .forward(obs.joint.clone())
            .squeeze::<1>(1)
            .into_scalar()
            .elem::<f32>()
    }

    /// Store one joint step in the rollout buffer
    pub fn store_transition(
        &mut self,
        obs: &TensorObservation<B::InnerBackend>,
        sample: &ActionSample,
        hunter_reward: f32,
        done: bool,
    ) {
        self.buffer.push(JointTransition {
            joint_observation: obs.raw.concat(),
            hunter_action: sample.hunter_action,
            prey_action: sample.prey_action,
            hunter_log_prob: sample.hunter_log_prob,
            prey_log_prob: sample.prey_log_prob,
            hunter_reward,
            value: sample.value,
            done,
        });
    }

    /// Check if the buffer holds a full rollout chunk
    pub fn should_update(&self) -> bool {
        self.buffer.is_full()
    }

    /// Number of transitions waiting for the next update
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Update both actors and the critic from the stored rollout, then clear it
    ///
    /// `last_value` is the critic estimate of the state after the final stored
    /// step (ignored if that step was terminal). Returns `None` when the
    /// buffer is empty.
    pub fn update(&mut self, last_value: f32) -> Option<UpdateStats> {
        if self.buffer.is_empty() {
            return None;
        }
        self.buffer.compute_returns(self.config.gamma, last_value);

        let transitions = self.buffer.transitions();
        let n = transitions.len();
        let rows: Vec<Vec<f32>> = transitions
            .iter()
            .map(|t| t.joint_observation.clone())
            .collect();
        let joint_obs = batch_tensor::<B>(&rows, 2 * OBS_DIM, &self.device);
        let (hunter_obs, prey_obs) = split_joint(joint_obs.clone());

        let hunter_actions = int_tensor::<B>(transitions.iter().map(|t| t.hunter_action), n, &self.device);
        let prey_actions = int_tensor::<B>(transitions.iter().map(|t| t.prey_action), n, &self.device);
        let hunter_old = float_tensor::<B>(transitions.iter().map(|t| t.hunter_log_prob), &self.device);
        let prey_old = float_tensor::<B>(transitions.iter().map(|t| t.prey_log_prob), &self.device);

        let advantages = float_tensor::<B>(
            self.buffer.advantages().unwrap_or_default().iter().copied(),
            &self.device,
        );
        let returns = float_tensor::<B>(
            self.buffer.returns().unwrap_or_default().iter().copied(),
            &self.device,
        );

        let (hunter_actor, hunter_policy_loss) = update_actor(
            self.hunter_actor.clone(),
            &mut self.hunter_optim,
            hunter_obs,
            hunter_actions,
            hunter_old,
            advantages.clone(),
            &self.config,
        );
        self.hunter_actor = hunter_actor;

        // Zero-sum: whatever helps the hunter hurts the prey
        let (prey_actor, prey_policy_loss) = update_actor(
            self.prey_actor.clone(),
            &mut self.prey_optim,
            prey_obs,
            prey_actions,
            prey_old,
            advantages.neg(),
            &self.config,
        );
        self.prey_actor = prey_actor;

        let values = self.critic.forward(joint_obs).squeeze::<1>(1);
        let critic_loss = value_loss(values, returns);
        let grads = GradientsParams::from_grads(critic_loss.backward(), &self.critic);
        self.critic = self
            .critic_optim
            .step(self.config.learning_rate, self.critic.clone(), grads);

        self.buffer.clear();
        self.training_step += 1;

        Some(UpdateStats {
            hunter_policy_loss,
            prey_policy_loss,
            critic_loss: critic_loss.into_scalar().elem::<f32>(),
        })
    }

    /// Get the current training step
    pub fn training_step(&self) -> usize {
        self.training_step
    }

    pub fn episodes_trained(&self) -> usize {
        self.episodes_trained
    }

    /// Increment the episode counter
    pub fn increment_episode(&mut self) {
        self.episodes_trained += 1;
    }

    pub fn hunter_actor(&self) -> &Actor<B> {
        &self.hunter_actor
    }

    pub fn prey_actor(&self) -> &Actor<B> {
        &self.prey_actor
    }

    pub fn critic(&self) -> &CentralizedCritic<B> {
        &self.critic
    }

    pub fn config(&self) -> &MappoConfig {
        &self.config
    }
}

/// Run `n_epochs` clipped-ratio steps on one actor, returning it and its mean loss
fn update_actor<B: AutodiffBackend>(
    mut actor: Actor<B>,
    optim: &mut ActorOptimizer<B>,
    observations: Tensor<B, 2>,
    actions: Tensor<B, 1, Int>,
    old_log_probs: Tensor<B, 1>,
    advantages: Tensor<B, 1>,
    config: &MappoConfig,
) -> (Actor<B>, f32) {
    let mut total_loss = 0.0;

    for _epoch in 0..config.n_epochs {
        let logits = actor.forward(observations.clone());
        let (policy_loss, entropy) = compute_policy_loss(
            logits,
            actions.clone(),
            old_log_probs.clone(),
            advantages.clone(),
            config.clip_epsilon,
        );
        let loss = policy_loss.clone() - entropy * config.entropy_coef;

        let grads = GradientsParams::from_grads(loss.backward(), &actor);
        actor = optim.step(config.learning_rate, actor, grads);

        total_loss += policy_loss.into_scalar().elem::<f32>();
    }

    (actor, total_loss / config.n_epochs as f32)
}

/// Clipped surrogate objective and policy entropy
///
/// ```text
/// L = -E[min(r * A, clip(r, 1-ε, 1+ε) * A)],  r = exp(log π_new - log π_old)
/// ```
pub fn compute_policy_loss<B: Backend>(
    action_logits: Tensor<B, 2>,
    actions: Tensor<B, 1, Int>,
    old_log_probs: Tensor<B, 1>,
    advantages: Tensor<B, 1>,
    clip_epsilon: f32,
) -> (Tensor<B, 1>, Tensor<B, 1>) {
    let log_probs = log_softmax(action_logits.clone(), 1);
    let new_log_probs = log_probs
        .clone()
        .gather(1, actions.unsqueeze_dim(1))
        .squeeze::<1>(1);

    let ratio = (new_log_probs - old_log_probs).exp();
    let surr1 = ratio.clone() * advantages.clone();
    let surr2 = ratio.clamp(1.0 - clip_epsilon, 1.0 + clip_epsilon) * advantages;
    let policy_loss = surr1.min_pair(surr2).neg().mean();

    let probs = softmax(action_logits, 1);
    let entropy = (probs * log_probs).sum_dim(1).neg().mean();

    (policy_loss, entropy)
}

/// Mean squared error between value predictions and returns
pub fn value_loss<B: Backend>(values: Tensor<B, 1>, returns: Tensor<B, 1>) -> Tensor<B, 1> {
    let diff = values - returns;
    (diff.clone() * diff).mean()
}

/// Sample from the categorical distribution over `[1, num_actions]` logits
///
/// Returns the action index and its log-probability.
fn sample_action<B: Backend>(logits: Tensor<B, 2>, rng: &mut StdRng) -> Result<(usize, f32)> {
    let log_probs: Vec<f32> = log_softmax(logits, 1)
        .into_data()
        .to_vec()
        .map_err(|e| anyhow!("Failed to read action log-probabilities: {:?}", e))?;

    let draw: f32 = rng.gen_range(0.0..1.0);
    let mut cumsum = 0.0;
    for (idx, &log_prob) in log_probs.iter().enumerate() {
        cumsum += log_prob.exp();
        if draw < cumsum {
            return Ok((idx, log_prob));
        }
    }

    // Rounding left the cumulative sum just under the draw
    let last = log_probs.len().saturating_sub(1);
    Ok((last, log_probs.get(last).copied().unwrap_or(0.0)))
}

/// First index of the largest logit
pub fn greedy_action<B: Backend>(logits: Tensor<B, 2>) -> Result<usize> {
    let values: Vec<f32> = logits
        .into_data()
        .to_vec()
        .map_err(|e| anyhow!("Failed to read action logits: {:?}", e))?;
    Ok(first_argmax(&values))
}

pub(crate) fn first_argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (idx, &value) in values.iter().enumerate() {
        if value > values[best] {
            best = idx;
        }
    }
    best
}

fn int_tensor<B: Backend>(
    values: impl Iterator<Item = usize>,
    len: usize,
    device: &B::Device,
) -> Tensor<B, 1, Int> {
    let mut ints = Vec::with_capacity(len);
    ints.extend(values.map(|v| v as i32));
    Tensor::from_ints(ints.as_slice(), device)
}

fn float_tensor<B: Backend>(values: impl Iterator<Item = f32>, device: &B::Device) -> Tensor<B, 1> {
    let floats: Vec<f32> = values.collect();
    Tensor::from_floats(floats.as_slice(), device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{JointObservation, PursuitConfig};
    use crate::rl::PursuitEnvironment;
    use burn::backend::{
        Autodiff,
        ndarray::{NdArray, NdArrayDevice},
    };

    type TestBackend = Autodiff<NdArray<f32>>;
    type TestInferenceBackend = NdArray<f32>;

    fn small_config() -> MappoConfig {
        MappoConfig {
            rollout_length: 16,
            n_epochs: 2,
            actor_hidden: 16,
            critic_hidden: 32,
            ..Default::default()
        }
    }

    fn zero_obs() -> TensorObservation<TestInferenceBackend> {
        let raw = JointObservation {
            hunter: vec![0.0; OBS_DIM],
            prey: vec![0.0; OBS_DIM],
        };
        TensorObservation::encode(raw, &NdArrayDevice::default())
    }

    #[test]
    fn test_agent_creation() {
        let agent = MappoAgent::<TestBackend>::new(small_config(), NdArrayDevice::default()).unwrap();
        assert_eq!(agent.training_step(), 0);
        assert!(!agent.should_update());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MappoConfig {
            rollout_length: 0,
            ..Default::default()
        };
        assert!(MappoAgent::<TestBackend>::new(config, NdArrayDevice::default()).is_err());
    }

    #[test]
    fn test_select_actions() {
        let mut agent = MappoAgent::<TestBackend>::new(small_config(), NdArrayDevice::default()).unwrap();
        let sample = agent.select_actions(&zero_obs()).unwrap();

        assert!(sample.hunter_action < 5);
        assert!(sample.prey_action < 5);
        assert!(sample.hunter_log_prob < 0.0);
        assert!(sample.prey_log_prob < 0.0);
        assert!(sample.value.is_finite());
    }

    #[test]
    fn test_sampling_is_seeded() {
        let obs = zero_obs();
        let mut a = MappoAgent::<TestBackend>::new(small_config(), NdArrayDevice::default()).unwrap();
        let draws_a: Vec<f32> = (0..10).map(|_| a.rng.gen_range(0.0..1.0)).collect();
        let mut b = MappoAgent::<TestBackend>::new(small_config(), NdArrayDevice::default()).unwrap();
        let draws_b: Vec<f32> = (0..10).map(|_| b.rng.gen_range(0.0..1.0)).collect();
        assert_eq!(draws_a, draws_b);
        assert!(a.select_actions(&obs).is_ok());
    }

    #[test]
    fn test_greedy_actions_in_range() {
        let agent = MappoAgent::<TestBackend>::new(small_config(), NdArrayDevice::default()).unwrap();
        let (h, p) = agent.greedy_actions(&zero_obs()).unwrap();
        assert!(h < 5 && p < 5);
    }

    #[test]
    fn test_update_clears_buffer() {
        let mut agent = MappoAgent::<TestBackend>::new(small_config(), NdArrayDevice::default()).unwrap();
        let obs = zero_obs();

        for i in 0..16 {
            let sample = agent.select_actions(&obs).unwrap();
            agent.store_transition(&obs, &sample, i as f32 * 0.1, i == 15);
        }
        assert!(agent.should_update());

        let stats = agent.update(0.0).unwrap();
        assert!(stats.hunter_policy_loss.is_finite());
        assert!(stats.prey_policy_loss.is_finite());
        assert!(stats.critic_loss.is_finite());
        assert!(stats.critic_loss >= 0.0);

        assert!(!agent.should_update());
        assert_eq!(agent.pending(), 0);
        assert_eq!(agent.training_step(), 1);
        assert!(agent.update(0.0).is_none());
    }

    #[test]
    fn test_policy_loss_computation() {
        let device = NdArrayDevice::default();
        let action_logits =
            Tensor::<TestInferenceBackend, 2>::from_floats([[1.0, 2.0, 3.0, 4.0, 5.0]], &device);
        let actions = Tensor::from_ints([2], &device);
        let old_log_probs = Tensor::from_floats([-1.5], &device);
        let advantages = Tensor::from_floats([0.5], &device);

        let (policy_loss, entropy) =
            compute_policy_loss(action_logits, actions, old_log_probs, advantages, 0.2);

        assert_eq!(policy_loss.dims(), [1]);
        let entropy_val: f32 = entropy.into_scalar().elem();
        assert!(entropy_val > 0.0);
    }

    #[test]
    fn test_ratio_is_clipped() {
        let device = NdArrayDevice::default();
        // Uniform logits: log π = ln(1/5) ≈ -1.609; old log π much lower gives a large ratio
        let action_logits = Tensor::<TestInferenceBackend, 2>::zeros([1, 5], &device);
        let actions = Tensor::from_ints([0], &device);
        let old_log_probs = Tensor::from_floats([-5.0], &device);
        let advantages = Tensor::from_floats([1.0], &device);

        let (policy_loss, _) =
            compute_policy_loss(action_logits, actions, old_log_probs, advantages, 0.2);
        let loss: f32 = policy_loss.into_scalar().elem();
        assert!((loss + 1.2).abs() < 1e-5);
    }

    #[test]
    fn test_value_loss_computation() {
        let device = NdArrayDevice::default();
        let values = Tensor::<TestInferenceBackend, 1>::from_floats([0.5, 0.8, 0.3], &device);
        let returns = Tensor::from_floats([0.5, 0.6, 0.4], &device);

        let loss: f32 = value_loss(values, returns).into_scalar().elem();
        assert!((loss - (0.04 + 0.01) / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_first_argmax_breaks_ties_low() {
        assert_eq!(first_argmax(&[1.0, 3.0, 3.0, 0.0]), 1);
        assert_eq!(first_argmax(&[2.0, 2.0]), 0);
    }

    #[test]
    fn test_integration_with_environment() {
        let device = NdArrayDevice::default();
        let mut env =
            PursuitEnvironment::<TestInferenceBackend>::new(PursuitConfig::small(), device.clone()).unwrap();
        let mut agent = MappoAgent::<TestBackend>::new(small_config(), device).unwrap();

        let mut obs = env.reset().unwrap();
        for _ in 0..16 {
            let sample = agent.select_actions(&obs).unwrap();
            let step = env.step(sample.hunter_action, sample.prey_action);
            agent.store_transition(&obs, &sample, step.rewards.0, step.done);

            obs = if step.done {
                env.reset().unwrap()
            } else {
                step.observation
            };
        }

        assert!(agent.should_update());
        let last_value = agent.value(&obs);
        let stats = agent.update(last_value).unwrap();
        assert!(stats.critic_loss.is_finite());
    }
}
