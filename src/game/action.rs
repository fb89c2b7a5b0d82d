use serde::{Deserialize, Serialize};

/// Number of discrete actions available to each agent
pub const NUM_ACTIONS: usize = 5;

/// Action that can be taken by either agent
///
/// The discriminant order is also the enumeration order used when breaking
/// ties between equally valued actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Stay,
    Up,
    Down,
    Left,
    Right,
}

impl Action {
    /// All actions in index order
    pub const ALL: [Action; NUM_ACTIONS] = [
        Action::Stay,
        Action::Up,
        Action::Down,
        Action::Left,
        Action::Right,
    ];

    /// Convert a discrete action index to an action
    ///
    /// - 0 → Stay
    /// - 1 → Up
    /// - 2 → Down
    /// - 3 → Left
    /// - 4 → Right
    /// - other → Stay
    pub fn from_index(idx: usize) -> Self {
        Self::ALL.get(idx).copied().unwrap_or(Action::Stay)
    }

    /// Index of this action in [`Action::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the unit delta (dx, dy) for this action; y grows downward
    pub fn delta(self) -> (i32, i32) {
        match self {
            Action::Stay => (0, 0),
            Action::Up => (0, -1),
            Action::Down => (0, 1),
            Action::Left => (-1, 0),
            Action::Right => (1, 0),
        }
    }
}

/// One action per role, applied in the same step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointAction {
    pub hunter: Action,
    pub prey: Action,
}

impl JointAction {
    pub fn new(hunter: Action, prey: Action) -> Self {
        Self { hunter, prey }
    }

    /// Build a joint action from two raw indices (out-of-range maps to Stay)
    pub fn from_indices(hunter: usize, prey: usize) -> Self {
        Self::new(Action::from_index(hunter), Action::from_index(prey))
    }
}
