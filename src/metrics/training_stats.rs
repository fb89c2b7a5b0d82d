//! Rolling training statistics for both learning loops
//!
//! Episode-level values (hunter reward, length, capture flag) and
//! update-level losses (hunter policy, prey policy, critic) are kept in
//! bounded windows for smoothed progress reporting.

use std::collections::VecDeque;

use crate::rl::UpdateStats;

/// Training statistics tracker with rolling averages
///
/// # Example
///
/// ```rust
/// use maze_pursuit::metrics::TrainingStats;
///
/// let mut stats = TrainingStats::new(100);
/// stats.record_episode(9.5, 42, true);
/// stats.record_losses(0.02, -0.01, 0.3);
///
/// assert_eq!(stats.capture_rate(), 1.0);
/// println!("{}", stats.format_summary());
/// ```
#[derive(Debug, Clone)]
pub struct TrainingStats {
    /// Hunter episode returns (the prey's is the negation up to wall penalties)
    hunter_rewards: VecDeque<f32>,

    /// Episode lengths in steps
    episode_lengths: VecDeque<usize>,

    /// Whether each episode ended in a capture
    captures: VecDeque<bool>,

    hunter_policy_losses: VecDeque<f32>,
    prey_policy_losses: VecDeque<f32>,
    critic_losses: VecDeque<f32>,

    total_episodes: usize,
    total_steps: usize,
    total_captures: usize,

    window_size: usize,
}

impl TrainingStats {
    /// Create a tracker keeping the last `window_size` values of each series
    pub fn new(window_size: usize) -> Self {
        Self {
            hunter_rewards: VecDeque::with_capacity(window_size),
            episode_lengths: VecDeque::with_capacity(window_size),
            captures: VecDeque::with_capacity(window_size),
            hunter_policy_losses: VecDeque::with_capacity(window_size),
            prey_policy_losses: VecDeque::with_capacity(window_size),
            critic_losses: VecDeque::with_capacity(window_size),
            total_episodes: 0,
            total_steps: 0,
            total_captures: 0,
            window_size,
        }
    }

    /// Record the completion of an episode
    ///
    /// # Example
    ///
    /// ```rust
    /// use maze_pursuit::metrics::TrainingStats;
    ///
    /// let mut stats = TrainingStats::new(100);
    /// stats.record_episode(-5.0, 300, false);
    ///
    /// assert_eq!(stats.total_episodes(), 1);
    /// assert_eq!(stats.total_steps(), 300);
    /// ```
    pub fn record_episode(&mut self, hunter_reward: f32, length: usize, caught: bool) {
        Self::push_deque(&mut self.hunter_rewards, hunter_reward, self.window_size);
        Self::push_deque(&mut self.episode_lengths, length, self.window_size);
        Self::push_deque(&mut self.captures, caught, self.window_size);
        self.total_episodes += 1;
        self.total_steps += length;
        if caught {
            self.total_captures += 1;
        }
    }

    pub fn record_losses(&mut self, hunter_policy_loss: f32, prey_policy_loss: f32, critic_loss: f32) {
        Self::push_deque(&mut self.hunter_policy_losses, hunter_policy_loss, self.window_size);
        Self::push_deque(&mut self.prey_policy_losses, prey_policy_loss, self.window_size);
        Self::push_deque(&mut self.critic_losses, critic_loss, self.window_size);
    }

    /// Record the losses of one actor-critic update
    pub fn record_update(&mut self, stats: &UpdateStats) {
        self.record_losses(
            stats.hunter_policy_loss,
            stats.prey_policy_loss,
            stats.critic_loss,
        );
    }

    /// Mean hunter episode reward over the window, 0.0 if empty
    pub fn mean_hunter_reward(&self) -> f32 {
        Self::mean(&self.hunter_rewards)
    }

    pub fn mean_episode_length(&self) -> f32 {
        if self.episode_lengths.is_empty() {
            0.0
        } else {
            self.episode_lengths.iter().sum::<usize>() as f32 / self.episode_lengths.len() as f32
        }
    }

    /// Fraction of windowed episodes that ended in a capture
    pub fn capture_rate(&self) -> f32 {
        if self.captures.is_empty() {
            0.0
        } else {
            self.captures.iter().filter(|&&c| c).count() as f32 / self.captures.len() as f32
        }
    }

    pub fn mean_hunter_policy_loss(&self) -> f32 {
        Self::mean(&self.hunter_policy_losses)
    }

    pub fn mean_prey_policy_loss(&self) -> f32 {
        Self::mean(&self.prey_policy_losses)
    }

    pub fn mean_critic_loss(&self) -> f32 {
        Self::mean(&self.critic_losses)
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Captures over the whole run, not just the window
    pub fn total_captures(&self) -> usize {
        self.total_captures
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// One-line progress summary
    ///
    /// ```text
    /// Episodes: 1 | Steps: 42 | H_Reward: 9.50 | Capture: 100.0% | Len: 42.0 | H_Loss: 0.0200 | P_Loss: -0.0100 | C_Loss: 0.3000
    /// ```
    pub fn format_summary(&self) -> String {
        format!(
            "Episodes: {} | Steps: {} | H_Reward: {:.2} | Capture: {:.1}% | Len: {:.1} | H_Loss: {:.4} | P_Loss: {:.4} | C_Loss: {:.4}",
            self.total_episodes,
            self.total_steps,
            self.mean_hunter_reward(),
            self.capture_rate() * 100.0,
            self.mean_episode_length(),
            self.mean_hunter_policy_loss(),
            self.mean_prey_policy_loss(),
            self.mean_critic_loss(),
        )
    }

    fn mean(deque: &VecDeque<f32>) -> f32 {
        if deque.is_empty() {
            0.0
        } else {
            deque.iter().sum::<f32>() / deque.len() as f32
        }
    }

    fn push_deque<T>(deque: &mut VecDeque<T>, value: T, window_size: usize) {
        if deque.len() >= window_size {
            deque.pop_front();
        }
        deque.push_back(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let stats = TrainingStats::new(100);
        assert_eq!(stats.window_size(), 100);
        assert_eq!(stats.total_episodes(), 0);
        assert_eq!(stats.total_steps(), 0);
    }

    #[test]
    fn test_record_episode() {
        let mut stats = TrainingStats::new(100);
        stats.record_episode(10.0, 50, true);

        assert_eq!(stats.total_episodes(), 1);
        assert_eq!(stats.total_steps(), 50);
        assert_eq!(stats.total_captures(), 1);
        assert!((stats.mean_hunter_reward() - 10.0).abs() < 1e-5);
        assert!((stats.mean_episode_length() - 50.0).abs() < 1e-5);
    }

    #[test]
    fn test_record_update() {
        let mut stats = TrainingStats::new(100);
        stats.record_update(&UpdateStats {
            hunter_policy_loss: 0.02,
            prey_policy_loss: -0.03,
            critic_loss: 0.5,
        });

        assert!((stats.mean_hunter_policy_loss() - 0.02).abs() < 1e-5);
        assert!((stats.mean_prey_policy_loss() + 0.03).abs() < 1e-5);
        assert!((stats.mean_critic_loss() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_capture_rate_window() {
        let mut stats = TrainingStats::new(4);
        for caught in [true, false, false, false] {
            stats.record_episode(0.0, 10, caught);
        }
        assert!((stats.capture_rate() - 0.25).abs() < 1e-6);

        // Evicts the only capture from the window
        stats.record_episode(0.0, 10, false);
        assert_eq!(stats.capture_rate(), 0.0);
        assert_eq!(stats.total_captures(), 1);
    }

    #[test]
    fn test_rolling_average() {
        let mut stats = TrainingStats::new(3);

        stats.record_episode(1.0, 10, false);
        stats.record_episode(2.0, 20, false);
        stats.record_episode(3.0, 30, false);
        assert!((stats.mean_hunter_reward() - 2.0).abs() < 1e-5);

        stats.record_episode(4.0, 40, false);
        assert_eq!(stats.total_episodes(), 4);
        assert_eq!(stats.total_steps(), 100);
        // (2 + 3 + 4) / 3
        assert!((stats.mean_hunter_reward() - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_format_summary() {
        let mut stats = TrainingStats::new(100);
        stats.record_episode(9.5, 42, true);
        stats.record_losses(0.02, -0.01, 0.3);

        let summary = stats.format_summary();
        assert!(summary.contains("Episodes: 1"));
        assert!(summary.contains("Steps: 42"));
        assert!(summary.contains("H_Reward: 9.50"));
        assert!(summary.contains("Capture: 100.0%"));
        assert!(summary.contains("Len: 42.0"));
        assert!(summary.contains("H_Loss: 0.0200"));
        assert!(summary.contains("P_Loss: -0.0100"));
        assert!(summary.contains("C_Loss: 0.3000"));
    }

    #[test]
    fn test_empty_stats() {
        let stats = TrainingStats::new(10);
        assert_eq!(stats.mean_hunter_reward(), 0.0);
        assert_eq!(stats.mean_episode_length(), 0.0);
        assert_eq!(stats.capture_rate(), 0.0);
        assert_eq!(stats.mean_critic_loss(), 0.0);
    }
}
