//! Joint rollout storage for the centralized-critic update
//!
//! One entry per joint step: the concatenated observation, both roles'
//! actions and behaviour log-probabilities, the hunter's reward, the critic's
//! value estimate and the done flag. The prey's reward is never stored; its
//! actor learns from the negated hunter advantage.

/// One joint step of experience
#[derive(Debug, Clone, PartialEq)]
pub struct JointTransition {
    /// Hunter features followed by prey features
    pub joint_observation: Vec<f32>,
    pub hunter_action: usize,
    pub prey_action: usize,
    pub hunter_log_prob: f32,
    pub prey_log_prob: f32,
    pub hunter_reward: f32,
    /// Critic estimate V(joint_observation)
    pub value: f32,
    pub done: bool,
}

/// Bounded buffer cleared after every update
///
/// # Example
///
/// ```rust
/// use maze_pursuit::rl::{JointTransition, RolloutBuffer};
///
/// let mut buffer = RolloutBuffer::new(2);
/// let step = JointTransition {
///     joint_observation: vec![0.0; 4],
///     hunter_action: 1,
///     prey_action: 2,
///     hunter_log_prob: -1.6,
///     prey_log_prob: -1.6,
///     hunter_reward: 1.0,
///     value: 0.0,
///     done: false,
/// };
/// buffer.push(step.clone());
/// buffer.push(step);
/// assert!(buffer.is_full());
/// ```
#[derive(Debug, Clone)]
pub struct RolloutBuffer {
    transitions: Vec<JointTransition>,
    capacity: usize,
    /// Computed advantages (populated by `compute_returns`)
    advantages: Option<Vec<f32>>,
    /// Computed returns (populated by `compute_returns`)
    returns: Option<Vec<f32>>,
}

impl RolloutBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            transitions: Vec::with_capacity(capacity),
            capacity,
            advantages: None,
            returns: None,
        }
    }

    /// Add a transition; ignored once the buffer is full
    pub fn push(&mut self, transition: JointTransition) {
        if self.transitions.len() < self.capacity {
            self.transitions.push(transition);
        }
    }

    pub fn is_full(&self) -> bool {
        self.transitions.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn transitions(&self) -> &[JointTransition] {
        &self.transitions
    }

    /// Compute discounted returns and normalized advantages
    ///
    /// ```text
    /// R_t = r_t + γ * R_{t+1} * (1 - done_t),   R_T = last_value
    /// A_t = R_t - V(s_t)
    /// ```
    ///
    /// `last_value` bootstraps a chunk that ends mid-episode; it is masked
    /// out when the final stored step is terminal. Advantages are normalized
    /// to zero mean and unit variance, with a 1e-8 floor on the deviation.
    pub fn compute_returns(&mut self, gamma: f32, last_value: f32) {
        let n = self.len();
        if n == 0 {
            return;
        }

        let mut returns = vec![0.0; n];
        let mut running = last_value;
        for t in (0..n).rev() {
            let step = &self.transitions[t];
            let mask = if step.done { 0.0 } else { 1.0 };
            running = step.hunter_reward + gamma * running * mask;
            returns[t] = running;
        }

        let mut advantages: Vec<f32> = returns
            .iter()
            .zip(&self.transitions)
            .map(|(ret, step)| ret - step.value)
            .collect();

        let mean = advantages.iter().sum::<f32>() / n as f32;
        let variance = advantages.iter().map(|a| (a - mean).powi(2)).sum::<f32>() / n as f32;
        let std = variance.sqrt();
        for a in &mut advantages {
            *a = (*a - mean) / (std + 1e-8);
        }

        self.advantages = Some(advantages);
        self.returns = Some(returns);
    }

    /// Normalized hunter advantages, if computed
    pub fn advantages(&self) -> Option<&[f32]> {
        self.advantages.as_deref()
    }

    /// Discounted hunter returns, if computed
    pub fn returns(&self) -> Option<&[f32]> {
        self.returns.as_deref()
    }

    /// Clear all stored data
    pub fn clear(&mut self) {
        self.transitions.clear();
        self.advantages = None;
        self.returns = None;
    }
}
