use serde::{Deserialize, Serialize};

use super::action::Action;

/// A cell on the maze grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move position by delta
    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Move position by one cell in the direction of an action
    pub fn moved_by_action(&self, action: Action) -> Self {
        let (dx, dy) = action.delta();
        self.moved_by(dx, dy)
    }

    /// The four cardinal neighbours (up, down, left, right)
    pub fn neighbors(&self) -> [Position; 4] {
        [
            self.moved_by(0, -1),
            self.moved_by(0, 1),
            self.moved_by(-1, 0),
            self.moved_by(1, 0),
        ]
    }
}

/// Axis-aligned rectangle in pixel space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// True when the interiors overlap; rectangles that only share an edge do not
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// The four corner pixels covered by the rectangle
    ///
    /// The right/bottom corners are the last covered pixel, not the exclusive
    /// edge, so a box flush against a wall does not probe into it.
    pub fn corners(&self) -> [(f32, f32); 4] {
        let right = last_covered(self.x, self.width);
        let bottom = last_covered(self.y, self.height);
        [
            (self.x, self.y),
            (right, self.y),
            (self.x, bottom),
            (right, bottom),
        ]
    }
}

fn last_covered(start: f32, len: f32) -> f32 {
    (start + len - 1e-3).floor().max(start)
}

/// Which side of the pursuit an agent plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Hunter,
    Prey,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::Hunter => "hunter",
            Role::Prey => "prey",
        }
    }
}

/// Lifecycle of one episode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Running,
    Caught,
    TimedOut,
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Running)
    }
}

/// Sole source of truth for termination and reward
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointState {
    /// Hunter bounding-box top-left in pixels
    pub hunter_position: (f32, f32),
    /// Prey bounding-box top-left in pixels
    pub prey_position: (f32, f32),
    pub elapsed_steps: u32,
}
