use anyhow::{Result, anyhow};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{
    action::{Action, JointAction, NUM_ACTIONS},
    body::Body,
    config::PursuitConfig,
    items::{Item, collect_overlapping, scatter_items},
    maze::Maze,
    rewards::{RewardInputs, compute_rewards},
    sensors::observe,
    state::{JointState, Outcome},
    trail::Trail,
};

/// Observation vectors for both roles
#[derive(Debug, Clone, PartialEq)]
pub struct JointObservation {
    pub hunter: Vec<f32>,
    pub prey: Vec<f32>,
}

impl JointObservation {
    /// Hunter features followed by prey features, the critic's input
    pub fn concat(&self) -> Vec<f32> {
        let mut joint = Vec::with_capacity(self.hunter.len() + self.prey.len());
        joint.extend_from_slice(&self.hunter);
        joint.extend_from_slice(&self.prey);
        joint
    }
}

/// Information about a step
#[derive(Debug, Clone, PartialEq)]
pub struct StepInfo {
    /// Step counter after this step
    pub step: u32,
    pub outcome: Outcome,
    pub hunter_blocked: bool,
    pub prey_blocked: bool,
    /// Items the prey picked up this step
    pub items_collected: usize,
    pub items_remaining: usize,
}

/// Result of a simulation step
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub observations: JointObservation,
    /// `(hunter, prey)` rewards for this step
    pub rewards: (f32, f32),
    /// Whether the episode has terminated
    pub done: bool,
    pub info: StepInfo,
}

/// The pursuit simulation: one maze, a hunter, a prey and the prey's trail
pub struct PursuitEngine {
    config: PursuitConfig,
    maze: Maze,
    hunter: Body,
    prey: Body,
    trail: Trail,
    items: Vec<Item>,
    steps: u32,
    outcome: Outcome,
    rng: StdRng,
}

impl PursuitEngine {
    /// Create an engine and carve its first maze
    pub fn new(config: PursuitConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow!("Invalid pursuit config: {}", e))?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let maze = carve_maze(&config, &mut rng)?;
        Ok(Self::assemble(config, maze, rng))
    }

    /// Create an engine over a fixed maze that is kept across resets
    pub fn with_maze(mut config: PursuitConfig, maze: Maze) -> Result<Self> {
        config.width = maze.width();
        config.height = maze.height();
        config.cell_size = maze.cell_size();
        config.regenerate_maze = false;
        config
            .validate()
            .map_err(|e| anyhow!("Invalid pursuit config: {}", e))?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self::assemble(config, maze, rng))
    }

    fn assemble(config: PursuitConfig, maze: Maze, rng: StdRng) -> Self {
        let hunter = Body::spawn(
            &maze,
            config.hunter_start_cell(),
            config.body_fraction,
            config.movement,
        );
        let prey = Body::spawn(
            &maze,
            config.prey_start_cell(),
            config.body_fraction,
            config.movement,
        );
        let mut engine = Self {
            trail: Trail::new(config.trail_capacity),
            config,
            maze,
            hunter,
            prey,
            items: Vec::new(),
            steps: 0,
            outcome: Outcome::Running,
            rng,
        };
        engine.respawn();
        engine
    }

    /// Start a new episode, re-carving the maze if configured to
    pub fn reset(&mut self) -> Result<JointObservation> {
        if self.config.regenerate_maze {
            self.maze = carve_maze(&self.config, &mut self.rng)?;
        }
        self.respawn();
        Ok(self.observations())
    }

    fn respawn(&mut self) {
        self.hunter = Body::spawn(
            &self.maze,
            self.config.hunter_start_cell(),
            self.config.body_fraction,
            self.config.movement,
        );
        self.prey = Body::spawn(
            &self.maze,
            self.config.prey_start_cell(),
            self.config.body_fraction,
            self.config.movement,
        );
        self.trail.clear();
        self.items = scatter_items(
            &self.maze,
            self.config.item_count,
            self.config.item_fraction,
            &mut self.rng,
        );
        self.steps = 0;
        self.outcome = Outcome::Running;
    }

    /// Advance the simulation by one joint action
    pub fn step(&mut self, action: JointAction) -> StepResult {
        if self.outcome.is_terminal() {
            return StepResult {
                observations: self.observations(),
                rewards: (0.0, 0.0),
                done: true,
                info: self.info(0),
            };
        }

        self.steps += 1;
        let prev_distance = self.distance();

        self.hunter.apply_action(action.hunter, &self.maze);
        self.prey.apply_action(action.prey, &self.maze);

        let (px, py) = self.prey.center();
        self.trail.push(px, py, self.steps);
        let items_collected = collect_overlapping(&mut self.items, &self.prey.bounds());

        let caught = self.hunter.bounds().intersects(&self.prey.bounds());
        let timed_out = !caught && self.steps >= self.config.max_steps;
        self.outcome = if caught {
            Outcome::Caught
        } else if timed_out {
            Outcome::TimedOut
        } else {
            Outcome::Running
        };

        let rewards = compute_rewards(
            &self.config.rewards,
            RewardInputs {
                prev_distance,
                new_distance: self.distance(),
                caught,
                timed_out,
                hunter_blocked: self.hunter.last_action_blocked(),
                prey_blocked: self.prey.last_action_blocked(),
            },
        );

        StepResult {
            observations: self.observations(),
            rewards,
            done: self.outcome.is_terminal(),
            info: self.info(items_collected),
        }
    }

    /// Both roles' observations of the current state
    pub fn observations(&self) -> JointObservation {
        JointObservation {
            hunter: observe(&self.maze, &self.hunter, &self.prey, &self.trail),
            prey: observe(&self.maze, &self.prey, &self.hunter, &self.trail),
        }
    }

    /// Uniformly random action for non-learning baselines
    pub fn sample_action(&mut self) -> Action {
        Action::from_index(self.rng.gen_range(0..NUM_ACTIONS))
    }

    pub fn joint_state(&self) -> JointState {
        JointState {
            hunter_position: self.hunter.position(),
            prey_position: self.prey.position(),
            elapsed_steps: self.steps,
        }
    }

    pub fn config(&self) -> &PursuitConfig {
        &self.config
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn hunter(&self) -> &Body {
        &self.hunter
    }

    pub fn prey(&self) -> &Body {
        &self.prey
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Hunter/prey center distance in cell units
    fn distance(&self) -> f32 {
        let cell = self.maze.cell_size() as f32;
        let (hx, hy) = self.hunter.center();
        let (px, py) = self.prey.center();
        self.config
            .rewards
            .distance_metric
            .distance((hx / cell, hy / cell), (px / cell, py / cell))
    }

    fn info(&self, items_collected: usize) -> StepInfo {
        StepInfo {
            step: self.steps,
            outcome: self.outcome,
            hunter_blocked: self.hunter.last_action_blocked(),
            prey_blocked: self.prey.last_action_blocked(),
            items_collected,
            items_remaining: self.items.len(),
        }
    }
}

/// Carve a maze from the configured dimensions, opening the borders if requested
pub fn carve_maze<R: Rng + ?Sized>(config: &PursuitConfig, rng: &mut R) -> Result<Maze> {
    let mut maze = Maze::generate(config.width, config.height, config.cell_size, rng)?;
    if config.open_borders {
        maze.open_borders();
    }
    Ok(maze)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{config::Movement, sensors::OBS_DIM, state::Position};

    fn corridor_engine(hunter: (i32, i32), prey: (i32, i32), max_steps: u32) -> PursuitEngine {
        let maze = Maze::from_rows(&["#######", "#.....#", "#.#.#.#", "#######"], 10).unwrap();
        let config = PursuitConfig {
            movement: Movement::Discrete,
            body_fraction: 0.5,
            max_steps,
            hunter_start: Some(Position::new(hunter.0, hunter.1)),
            prey_start: Some(Position::new(prey.0, prey.1)),
            ..PursuitConfig::default()
        };
        PursuitEngine::with_maze(config, maze).unwrap()
    }

    fn stay() -> JointAction {
        JointAction::new(Action::Stay, Action::Stay)
    }

    #[test]
    fn test_reset() {
        let mut engine = PursuitEngine::new(PursuitConfig::default()).unwrap();
        let obs = engine.reset().unwrap();

        assert_eq!(obs.hunter.len(), OBS_DIM);
        assert_eq!(obs.prey.len(), OBS_DIM);
        assert_eq!(obs.concat().len(), 2 * OBS_DIM);
        assert_eq!(engine.steps(), 0);
        assert_eq!(engine.outcome(), Outcome::Running);
        assert!(engine.trail().is_empty());
        assert!(!engine.maze().is_wall_cell(engine.hunter().cell(engine.maze())));
        assert!(!engine.maze().is_wall_cell(engine.prey().cell(engine.maze())));
    }

    #[test]
    fn test_seeded_engines_agree() {
        let mut a = PursuitEngine::new(PursuitConfig::default()).unwrap();
        let mut b = PursuitEngine::new(PursuitConfig::default()).unwrap();
        a.reset().unwrap();
        b.reset().unwrap();
        assert_eq!(a.maze(), b.maze());
    }

    #[test]
    fn test_stay_scenario_in_small_maze() {
        let config = PursuitConfig {
            hunter_start: Some(Position::new(7, 7)),
            prey_start: Some(Position::new(1, 1)),
            ..PursuitConfig::small()
        };
        let mut engine = PursuitEngine::new(config).unwrap();
        engine.reset().unwrap();
        let before = engine.joint_state();

        for _ in 0..5 {
            let result = engine.step(stay());
            assert!(!result.done);
            assert_eq!(result.rewards, (0.0, 0.0));
        }

        let after = engine.joint_state();
        assert_eq!(after.hunter_position, before.hunter_position);
        assert_eq!(after.prey_position, before.prey_position);
        assert_eq!(after.elapsed_steps, 5);
    }

    #[test]
    fn test_capture() {
        let mut engine = corridor_engine((1, 1), (3, 1), 100);

        let first = engine.step(JointAction::new(Action::Right, Action::Stay));
        assert!(!first.done);
        assert!(first.rewards.0 > 0.0);
        assert!((first.rewards.0 + first.rewards.1).abs() < 1e-6);

        let second = engine.step(JointAction::new(Action::Right, Action::Stay));
        assert!(second.done);
        assert_eq!(second.rewards, (10.0, -10.0));
        assert_eq!(second.info.outcome, Outcome::Caught);
    }

    #[test]
    fn test_timeout_applied_once() {
        let mut engine = corridor_engine((1, 1), (5, 1), 5);

        for _ in 0..4 {
            let result = engine.step(stay());
            assert!(!result.done);
            assert_eq!(result.rewards, (0.0, 0.0));
        }
        let last = engine.step(stay());
        assert!(last.done);
        assert_eq!(last.rewards, (-5.0, 5.0));
        assert_eq!(last.info.outcome, Outcome::TimedOut);

        let after = engine.step(stay());
        assert!(after.done);
        assert_eq!(after.rewards, (0.0, 0.0));
        assert_eq!(engine.steps(), 5);
    }

    #[test]
    fn test_capture_beats_timeout_on_last_step() {
        let mut engine = corridor_engine((1, 1), (2, 1), 1);
        let result = engine.step(JointAction::new(Action::Right, Action::Stay));
        assert_eq!(result.info.outcome, Outcome::Caught);
        assert_eq!(result.rewards, (10.0, -10.0));
    }

    #[test]
    fn test_wall_penalty_only_for_mover() {
        let mut engine = corridor_engine((1, 1), (5, 1), 100);
        let result = engine.step(JointAction::new(Action::Up, Action::Stay));

        assert!(result.info.hunter_blocked);
        assert!(!result.info.prey_blocked);
        assert_eq!(result.rewards.0, -0.05);
        assert_eq!(result.rewards.1, 0.0);
    }

    #[test]
    fn test_trail_records_prey() {
        let mut engine = corridor_engine((1, 1), (5, 1), 100);
        engine.step(JointAction::new(Action::Stay, Action::Left));
        engine.step(JointAction::new(Action::Stay, Action::Left));

        let points: Vec<_> = engine.trail().iter().collect();
        assert_eq!(points.len(), 2);
        assert_eq!((points[0].x, points[0].y, points[0].step), (45.0, 15.0, 1));
        assert_eq!((points[1].x, points[1].y, points[1].step), (35.0, 15.0, 2));
    }

    #[test]
    fn test_reset_after_termination() {
        let mut engine = corridor_engine((1, 1), (2, 1), 100);
        engine.step(JointAction::new(Action::Right, Action::Stay));
        assert!(engine.outcome().is_terminal());

        engine.reset().unwrap();
        assert_eq!(engine.outcome(), Outcome::Running);
        assert_eq!(engine.steps(), 0);
        assert!(engine.trail().is_empty());
        assert_eq!(engine.hunter().cell(engine.maze()), Position::new(1, 1));
    }

    #[test]
    fn test_items_collected_by_prey() {
        let maze = Maze::from_rows(&["#####", "#...#", "#####"], 10).unwrap();
        let config = PursuitConfig {
            movement: Movement::Discrete,
            item_count: 3,
            hunter_start: Some(Position::new(1, 1)),
            prey_start: Some(Position::new(3, 1)),
            ..PursuitConfig::default()
        };
        let mut engine = PursuitEngine::with_maze(config, maze).unwrap();
        assert_eq!(engine.items().len(), 3);

        let result = engine.step(stay());
        assert_eq!(result.info.items_collected, 1);
        assert_eq!(result.info.items_remaining, 2);
        assert_eq!(result.rewards, (0.0, 0.0));
    }

    #[test]
    fn test_sample_action_covers_action_set() {
        let mut engine = corridor_engine((1, 1), (5, 1), 100);
        let mut seen = [false; NUM_ACTIONS];
        for _ in 0..200 {
            seen[engine.sample_action().index()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
