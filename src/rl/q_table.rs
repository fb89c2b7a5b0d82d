//! Tabular action values keyed by a discretized state
//!
//! Keys are inserted only by [`QTable::get_or_insert`]; every read path
//! leaves the table untouched, so a persisted table contains exactly the
//! states that were updated during training.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::config::StateKeyMode;
use crate::game::{Action, NUM_ACTIONS, Position};

/// Discretized view of the world from one agent's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateKey {
    /// Own cell and the sign (-1, 0, 1) of the offset to the opponent per axis
    SignedWithPosition { x: i32, y: i32, sx: i32, sy: i32 },
    /// Raw cell offset to the opponent
    RelativeOffset { dx: i32, dy: i32 },
}

impl StateKey {
    pub fn new(mode: StateKeyMode, own: Position, other: Position) -> Self {
        let dx = other.x - own.x;
        let dy = other.y - own.y;
        match mode {
            StateKeyMode::SignedWithPosition => StateKey::SignedWithPosition {
                x: own.x,
                y: own.y,
                sx: dx.signum(),
                sy: dy.signum(),
            },
            StateKeyMode::RelativeOffset => StateKey::RelativeOffset { dx, dy },
        }
    }

    /// The discretization this key was built with
    pub fn mode(&self) -> StateKeyMode {
        match self {
            StateKey::SignedWithPosition { .. } => StateKeyMode::SignedWithPosition,
            StateKey::RelativeOffset { .. } => StateKeyMode::RelativeOffset,
        }
    }
}

/// One persisted row: values are in [`Action::ALL`] order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct QEntry {
    state: StateKey,
    values: [f32; NUM_ACTIONS],
}

/// Append-only mapping from state key to per-action value estimates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<QEntry>", into = "Vec<QEntry>")]
pub struct QTable {
    values: HashMap<StateKey, [f32; NUM_ACTIONS]>,
}

impl QTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &StateKey) -> Option<&[f32; NUM_ACTIONS]> {
        self.values.get(key)
    }

    /// Values for `key`, inserting zeros for every action on first use
    pub fn get_or_insert(&mut self, key: StateKey) -> &mut [f32; NUM_ACTIONS] {
        self.values.entry(key).or_insert([0.0; NUM_ACTIONS])
    }

    /// Best known action, or `None` for an unseen state
    ///
    /// Ties go to the action with the lowest index in [`Action::ALL`].
    pub fn greedy_action(&self, key: &StateKey) -> Option<Action> {
        self.get(key).map(|values| {
            let mut best = 0;
            for (idx, &value) in values.iter().enumerate() {
                if value > values[best] {
                    best = idx;
                }
            }
            Action::from_index(best)
        })
    }

    /// Greedy action, falling back to a uniformly random one for unseen states
    pub fn greedy_or_random<R: Rng + ?Sized>(&self, key: &StateKey, rng: &mut R) -> Action {
        self.greedy_action(key)
            .unwrap_or_else(|| Action::from_index(rng.gen_range(0..NUM_ACTIONS)))
    }

    /// Largest stored value for `key`; zero for an unseen state
    pub fn max_value(&self, key: &StateKey) -> f32 {
        self.get(key)
            .map(|values| values.iter().copied().fold(f32::NEG_INFINITY, f32::max))
            .unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &[f32; NUM_ACTIONS])> {
        self.values.iter()
    }

    /// Discretization used by the stored keys, `None` for an empty table
    pub fn key_mode(&self) -> Option<StateKeyMode> {
        self.values.keys().next().map(StateKey::mode)
    }
}

impl From<Vec<QEntry>> for QTable {
    fn from(entries: Vec<QEntry>) -> Self {
        Self {
            values: entries.into_iter().map(|e| (e.state, e.values)).collect(),
        }
    }
}

impl From<QTable> for Vec<QEntry> {
    fn from(table: QTable) -> Self {
        let mut entries: Vec<QEntry> = table
            .values
            .into_iter()
            .map(|(state, values)| QEntry { state, values })
            .collect();
        // Stable output for diffs between snapshots
        entries.sort_by_key(|e| e.state);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn key(x: i32) -> StateKey {
        StateKey::SignedWithPosition {
            x,
            y: 1,
            sx: 1,
            sy: 0,
        }
    }

    #[test]
    fn test_state_key_modes() {
        let own = Position::new(3, 4);
        let other = Position::new(1, 9);
        assert_eq!(
            StateKey::new(StateKeyMode::SignedWithPosition, own, other),
            StateKey::SignedWithPosition {
                x: 3,
                y: 4,
                sx: -1,
                sy: 1
            }
        );
        assert_eq!(
            StateKey::new(StateKeyMode::RelativeOffset, own, other),
            StateKey::RelativeOffset { dx: -2, dy: 5 }
        );
        assert_eq!(
            StateKey::new(StateKeyMode::SignedWithPosition, own, own),
            StateKey::SignedWithPosition {
                x: 3,
                y: 4,
                sx: 0,
                sy: 0
            }
        );
    }

    #[test]
    fn test_key_mode_inferred_from_entries() {
        let mut table = QTable::new();
        assert_eq!(table.key_mode(), None);
        table.get_or_insert(StateKey::RelativeOffset { dx: 1, dy: 0 });
        assert_eq!(table.key_mode(), Some(StateKeyMode::RelativeOffset));
    }

    #[test]
    fn test_reads_never_insert() {
        let table = QTable::new();
        assert!(table.get(&key(1)).is_none());
        assert!(table.greedy_action(&key(1)).is_none());
        assert_eq!(table.max_value(&key(1)), 0.0);
        assert!(table.is_empty());
    }

    #[test]
    fn test_get_or_insert_zero_initializes() {
        let mut table = QTable::new();
        assert_eq!(*table.get_or_insert(key(1)), [0.0; NUM_ACTIONS]);
        table.get_or_insert(key(1))[2] = 3.0;
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&key(1)).unwrap()[2], 3.0);
    }

    #[test]
    fn test_greedy_first_max_wins() {
        let mut table = QTable::new();
        *table.get_or_insert(key(1)) = [0.0, 2.0, 2.0, -1.0, 1.0];
        assert_eq!(table.greedy_action(&key(1)), Some(Action::Up));

        // All zero: STAY is first
        table.get_or_insert(key(2));
        assert_eq!(table.greedy_action(&key(2)), Some(Action::Stay));
    }

    #[test]
    fn test_max_value_with_negative_entries() {
        let mut table = QTable::new();
        *table.get_or_insert(key(1)) = [-3.0, -1.0, -2.0, -5.0, -4.0];
        assert_eq!(table.max_value(&key(1)), -1.0);
    }

    #[test]
    fn test_unseen_state_random_fallback() {
        let table = QTable::new();
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = [false; NUM_ACTIONS];
        for _ in 0..200 {
            seen[table.greedy_or_random(&key(9), &mut rng).index()] = true;
        }
        assert!(seen.iter().all(|&s| s));
        assert!(table.is_empty());
    }

    #[test]
    fn test_json_round_trip_preserves_values() {
        let mut table = QTable::new();
        *table.get_or_insert(key(1)) = [0.1, -0.25, 1e-7, 3.5, 0.0];
        *table.get_or_insert(StateKey::RelativeOffset { dx: -2, dy: 3 }) = [1.0; NUM_ACTIONS];

        let json = serde_json::to_string(&table).unwrap();
        let restored: QTable = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, table);
    }
}
