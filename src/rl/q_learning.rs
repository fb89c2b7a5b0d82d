//! Zero-sum tabular Q-learning
//!
//! Two independent learners share one simultaneous-move game: each sees its
//! own state key, picks its own action and learns from its own reward. The
//! loop moves both agents one cell per action directly on the maze grid,
//! without going through [`crate::game::PursuitEngine`].

use anyhow::{Result, anyhow};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::{StateKeyMode, TabularConfig};
use super::q_table::{QTable, StateKey};
use crate::game::{Action, Maze, NUM_ACTIONS, Outcome, Position, RewardInputs, compute_rewards};

/// One role's ε-greedy learner
#[derive(Debug, Clone)]
pub struct QLearner {
    table: QTable,
    alpha: f32,
    gamma: f32,
    epsilon: f32,
    epsilon_decay: f32,
    epsilon_min: f32,
    state_key: StateKeyMode,
}

impl QLearner {
    pub fn new(config: &TabularConfig) -> Self {
        Self {
            table: QTable::new(),
            alpha: config.alpha,
            gamma: config.gamma,
            epsilon: config.epsilon,
            epsilon_decay: config.epsilon_decay,
            epsilon_min: config.epsilon_min,
            state_key: config.state_key,
        }
    }

    pub fn state_key(&self, own: Position, other: Position) -> StateKey {
        StateKey::new(self.state_key, own, other)
    }

    /// ε-greedy selection; an unseen state is explored uniformly
    pub fn choose_action<R: Rng + ?Sized>(&self, key: &StateKey, rng: &mut R) -> Action {
        if self.epsilon > 0.0 && rng.gen_bool(f64::from(self.epsilon)) {
            return Action::from_index(rng.gen_range(0..NUM_ACTIONS));
        }
        self.table.greedy_or_random(key, rng)
    }

    /// One TD(0) backup
    ///
    /// ```text
    /// Q[s][a] ← Q[s][a] + α · (r + γ · max_a' Q[s'][a'] − Q[s][a])
    /// ```
    ///
    /// The bootstrap term is dropped when `terminal` is set; a timeout is a
    /// truncation and still bootstraps. Reading `s'` does not insert it into
    /// the table.
    pub fn update(
        &mut self,
        state: StateKey,
        action: Action,
        reward: f32,
        next_state: &StateKey,
        terminal: bool,
    ) {
        let next_max = if terminal {
            0.0
        } else {
            self.table.max_value(next_state)
        };
        let target = reward + self.gamma * next_max;
        let values = self.table.get_or_insert(state);
        let current = values[action.index()];
        values[action.index()] = current + self.alpha * (target - current);
    }

    /// Multiplicative per-episode decay, floored at `epsilon_min`
    ///
    /// Never raises ε: a rate already below the floor stays where it is.
    pub fn decay_epsilon(&mut self) {
        let floor = self.epsilon_min.min(self.epsilon);
        self.epsilon = (self.epsilon * self.epsilon_decay).max(floor);
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn into_table(self) -> QTable {
        self.table
    }
}

/// Snapshot of both roles' tables, persisted keyed by role name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabularPolicies {
    pub hunter: QTable,
    pub prey: QTable,
}

/// Per-episode result reported to the training callback
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    /// 1-based episode number
    pub episode: usize,
    pub steps: u32,
    pub outcome: Outcome,
    pub hunter_reward: f32,
    pub prey_reward: f32,
    /// Hunter exploration rate used during this episode
    pub epsilon: f32,
}

/// Default start cells: hunter near the far corner, prey near the origin
pub fn default_starts(maze: &Maze) -> (Position, Position) {
    let hunter = maze.nearest_free_cell(Position::new(
        maze.width() as i32 - 2,
        maze.height() as i32 - 2,
    ));
    let prey = maze.nearest_free_cell(Position::new(1, 1));
    (hunter, prey)
}

/// Move one cell unless the target is a wall; returns the new cell and
/// whether the move was blocked
fn move_on_grid(maze: &Maze, from: Position, action: Action) -> (Position, bool) {
    if action == Action::Stay {
        return (from, false);
    }
    let target = from.moved_by_action(action);
    if maze.is_wall_cell(target) {
        (from, true)
    } else {
        (target, false)
    }
}

fn cell_distance(config: &TabularConfig, a: Position, b: Position) -> f32 {
    config
        .rewards
        .distance_metric
        .distance((a.x as f32, a.y as f32), (b.x as f32, b.y as f32))
}

/// Train both roles against each other on a fixed maze
///
/// Each episode resets the agents to their start cells and runs until the
/// hunter shares the prey's cell or `max_steps` elapse. `on_episode` is
/// invoked after every episode.
pub fn train_zero_sum<R, F>(
    maze: &Maze,
    config: &TabularConfig,
    rng: &mut R,
    mut on_episode: F,
) -> Result<TabularPolicies>
where
    R: Rng + ?Sized,
    F: FnMut(&EpisodeSummary),
{
    config
        .validate()
        .map_err(|e| anyhow!("Invalid tabular config: {}", e))?;

    let (hunter_start, prey_start) = default_starts(maze);
    let mut hunter = QLearner::new(config);
    let mut prey = QLearner::new(config);

    for episode in 1..=config.episodes {
        let mut h = hunter_start;
        let mut p = prey_start;
        let mut outcome = Outcome::Running;
        let mut steps = 0;
        let mut totals = (0.0, 0.0);
        let epsilon = hunter.epsilon();

        while !outcome.is_terminal() {
            steps += 1;
            let h_key = hunter.state_key(h, p);
            let p_key = prey.state_key(p, h);
            let h_action = hunter.choose_action(&h_key, rng);
            let p_action = prey.choose_action(&p_key, rng);

            let prev_distance = cell_distance(config, h, p);
            let (next_h, hunter_blocked) = move_on_grid(maze, h, h_action);
            let (next_p, prey_blocked) = move_on_grid(maze, p, p_action);
            h = next_h;
            p = next_p;

            let caught = h == p;
            let timed_out = !caught && steps >= config.max_steps;
            outcome = if caught {
                Outcome::Caught
            } else if timed_out {
                Outcome::TimedOut
            } else {
                Outcome::Running
            };

            let (h_reward, p_reward) = compute_rewards(
                &config.rewards,
                RewardInputs {
                    prev_distance,
                    new_distance: cell_distance(config, h, p),
                    caught,
                    timed_out,
                    hunter_blocked,
                    prey_blocked,
                },
            );
            totals.0 += h_reward;
            totals.1 += p_reward;

            let terminal = outcome == Outcome::Caught;
            let h_next = hunter.state_key(h, p);
            let p_next = prey.state_key(p, h);
            hunter.update(h_key, h_action, h_reward, &h_next, terminal);
            prey.update(p_key, p_action, p_reward, &p_next, terminal);
        }

        hunter.decay_epsilon();
        prey.decay_epsilon();

        let summary = EpisodeSummary {
            episode,
            steps,
            outcome,
            hunter_reward: totals.0,
            prey_reward: totals.1,
            epsilon,
        };
        debug!(
            episode,
            steps,
            outcome = ?summary.outcome,
            hunter_reward = summary.hunter_reward,
            "Tabular episode finished"
        );
        on_episode(&summary);
    }

    Ok(TabularPolicies {
        hunter: hunter.into_table(),
        prey: prey.into_table(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::RewardConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn corridor() -> Maze {
        Maze::from_rows(&["#######", "#.....#", "#######"], 10).unwrap()
    }

    fn key(x: i32) -> StateKey {
        StateKey::RelativeOffset { dx: x, dy: 0 }
    }

    #[test]
    fn test_update_rule() {
        let config = TabularConfig {
            alpha: 0.5,
            gamma: 0.9,
            ..TabularConfig::default()
        };
        let mut learner = QLearner::new(&config);

        learner.update(key(2), Action::Right, 1.0, &key(1), false);
        assert_eq!(learner.table().get(&key(2)).unwrap()[Action::Right.index()], 0.5);
        // Next state was only read
        assert!(learner.table().get(&key(1)).is_none());

        *learner.table.get_or_insert(key(1)) = [0.0, 0.0, 0.0, 0.0, 2.0];
        learner.update(key(2), Action::Right, 1.0, &key(1), false);
        // 0.5 + 0.5 * (1 + 0.9 * 2 - 0.5)
        assert!((learner.table().get(&key(2)).unwrap()[4] - 1.65).abs() < 1e-6);
    }

    #[test]
    fn test_terminal_update_ignores_next_state() {
        let config = TabularConfig {
            alpha: 1.0,
            ..TabularConfig::default()
        };
        let mut learner = QLearner::new(&config);
        *learner.table.get_or_insert(key(0)) = [100.0; NUM_ACTIONS];

        learner.update(key(1), Action::Stay, 10.0, &key(0), true);
        assert_eq!(learner.table().get(&key(1)).unwrap()[0], 10.0);
    }

    #[test]
    fn test_epsilon_decay_floor() {
        let config = TabularConfig {
            epsilon: 0.5,
            epsilon_decay: 0.5,
            epsilon_min: 0.1,
            ..TabularConfig::default()
        };
        let mut learner = QLearner::new(&config);
        learner.decay_epsilon();
        assert_eq!(learner.epsilon(), 0.25);
        for _ in 0..10 {
            learner.decay_epsilon();
        }
        assert_eq!(learner.epsilon(), 0.1);
    }

    #[test]
    fn test_epsilon_below_floor_never_rises() {
        let config = TabularConfig {
            epsilon: 0.0,
            epsilon_decay: 1.0,
            epsilon_min: 0.01,
            ..TabularConfig::default()
        };
        let mut learner = QLearner::new(&config);
        for _ in 0..5 {
            learner.decay_epsilon();
            assert_eq!(learner.epsilon(), 0.0);
        }

        let config = TabularConfig {
            epsilon: 0.05,
            epsilon_decay: 0.5,
            epsilon_min: 0.1,
            ..TabularConfig::default()
        };
        let mut learner = QLearner::new(&config);
        learner.decay_epsilon();
        assert_eq!(learner.epsilon(), 0.05);
    }

    #[test]
    fn test_greedy_choice_without_exploration() {
        let config = TabularConfig {
            epsilon: 0.0,
            ..TabularConfig::default()
        };
        let mut learner = QLearner::new(&config);
        *learner.table.get_or_insert(key(3)) = [0.0, 0.0, 0.0, 1.0, 0.0];

        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..20 {
            assert_eq!(learner.choose_action(&key(3), &mut rng), Action::Left);
        }
    }

    #[test]
    fn test_move_on_grid_blocks_walls() {
        let maze = corridor();
        let start = Position::new(1, 1);
        assert_eq!(move_on_grid(&maze, start, Action::Up), (start, true));
        assert_eq!(
            move_on_grid(&maze, start, Action::Right),
            (Position::new(2, 1), false)
        );
        assert_eq!(move_on_grid(&maze, start, Action::Stay), (start, false));
    }

    #[test]
    fn test_training_coverage() {
        let maze = corridor();
        let config = TabularConfig {
            episodes: 50,
            max_steps: 30,
            ..TabularConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(11);
        let mut summaries = Vec::new();
        let policies =
            train_zero_sum(&maze, &config, &mut rng, |s| summaries.push(s.clone())).unwrap();

        assert_eq!(summaries.len(), 50);
        assert!(summaries.iter().all(|s| s.steps <= 30));
        assert!(summaries.iter().all(|s| s.outcome.is_terminal()));
        assert!(!policies.hunter.is_empty());
        assert!(!policies.prey.is_empty());

        for table in [&policies.hunter, &policies.prey] {
            for (state, values) in table.iter() {
                assert!(values.iter().all(|v| v.is_finite()), "{:?}", state);
                // Agents never stand inside a wall
                if let StateKey::SignedWithPosition { x, y, .. } = state {
                    assert!(!maze.is_wall_cell(Position::new(*x, *y)));
                }
            }
        }
    }

    #[test]
    fn test_episode_rewards_are_zero_sum() {
        let maze = corridor();
        let config = TabularConfig {
            episodes: 10,
            max_steps: 20,
            ..TabularConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(5);
        train_zero_sum(&maze, &config, &mut rng, |s| {
            let wall = s.hunter_reward + s.prey_reward;
            // Only wall penalties break symmetry
            assert!(wall <= 1e-4, "episode {} sums to {}", s.episode, wall);
        })
        .unwrap();
    }

    #[test]
    fn test_timeout_still_bootstraps() {
        // Two unconnected cells: nobody moves, every episode times out
        let maze = Maze::from_rows(&["#####", "#.#.#", "#####"], 10).unwrap();
        let config = TabularConfig {
            episodes: 10,
            max_steps: 1,
            alpha: 1.0,
            gamma: 0.5,
            state_key: StateKeyMode::RelativeOffset,
            rewards: RewardConfig {
                wall_penalty: 0.0,
                timeout_reward: 1.0,
                ..TabularConfig::default().rewards
            },
            ..TabularConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(2);
        let policies = train_zero_sum(&maze, &config, &mut rng, |s| {
            assert_eq!(s.outcome, Outcome::TimedOut);
        })
        .unwrap();

        // The prey earns 1.0 per step; only bootstrapping lifts a value above it
        let key = StateKey::RelativeOffset { dx: 2, dy: 0 };
        assert_eq!(policies.prey.len(), 1);
        assert!(policies.prey.max_value(&key) > 1.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = TabularConfig {
            alpha: 0.0,
            ..TabularConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert!(train_zero_sum(&corridor(), &config, &mut rng, |_| {}).is_err());
    }

    #[test]
    fn test_default_starts_are_free() {
        let maze = corridor();
        let (hunter, prey) = default_starts(&maze);
        assert_eq!(hunter, Position::new(5, 1));
        assert_eq!(prey, Position::new(1, 1));
    }
}
