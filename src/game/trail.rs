use std::collections::VecDeque;

/// One recorded prey position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    /// Prey center in pixels
    pub x: f32,
    pub y: f32,
    /// Step counter value when the point was recorded
    pub step: u32,
}

/// Bounded history of prey positions, oldest evicted first
#[derive(Debug, Clone)]
pub struct Trail {
    points: VecDeque<TrailPoint>,
    capacity: usize,
}

impl Trail {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, x: f32, y: f32, step: u32) {
        if self.capacity == 0 {
            return;
        }
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(TrailPoint { x, y, step });
    }

    /// The last `n` points, oldest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter().skip(self.points.len().saturating_sub(n))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}
