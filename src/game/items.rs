use rand::Rng;
use rand::seq::SliceRandom;

use super::{
    maze::Maze,
    state::{Position, Rect},
};

/// A collectible sitting in the center of a free cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Item {
    pub cell: Position,
    /// Center in pixels
    pub center: (f32, f32),
    pub radius: f32,
}

impl Item {
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.center.0 - self.radius,
            self.center.1 - self.radius,
            self.radius * 2.0,
            self.radius * 2.0,
        )
    }
}

/// Scatter up to `count` items on distinct random free cells
///
/// `item_fraction` is the item diameter as a fraction of the cell size.
pub fn scatter_items<R: Rng + ?Sized>(
    maze: &Maze,
    count: usize,
    item_fraction: f32,
    rng: &mut R,
) -> Vec<Item> {
    if count == 0 {
        return Vec::new();
    }

    let cell_size = maze.cell_size() as f32;
    let radius = cell_size * item_fraction / 2.0;

    let mut cells: Vec<Position> = maze.free_cells().collect();
    cells.shuffle(rng);
    cells
        .into_iter()
        .take(count)
        .map(|cell| Item {
            cell,
            center: (
                (cell.x as f32 + 0.5) * cell_size,
                (cell.y as f32 + 0.5) * cell_size,
            ),
            radius,
        })
        .collect()
}

/// Remove every item overlapping `collector`, returning how many were taken
pub fn collect_overlapping(items: &mut Vec<Item>, collector: &Rect) -> usize {
    let before = items.len();
    items.retain(|item| !item.bounds().intersects(collector));
    before - items.len()
}
