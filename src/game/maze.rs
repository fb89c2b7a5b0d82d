//! Procedural maze generation and wall queries
//!
//! Mazes are carved with an iterative randomized depth-first search on the
//! "odd lattice": every cell whose coordinates are both odd is a room, and the
//! cell between two rooms is knocked out when the search moves between them.
//! Odd dimensions make the lattice line up with the outer wall; even
//! dimensions leave the last row/column of rooms unreachable, which is
//! accepted rather than corrected.

use anyhow::{Result, bail};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::{HashSet, VecDeque};

use super::state::Position;

/// Occupancy of one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Wall,
    Free,
}

/// Carving steps: two cells at a time so walls stay between rooms
const CARVE_DIRECTIONS: [(i32, i32); 4] = [(0, -2), (0, 2), (-2, 0), (2, 0)];

/// A rectangular wall/free grid plus the pixel size of one cell
#[derive(Debug, Clone, PartialEq)]
pub struct Maze {
    width: usize,
    height: usize,
    cell_size: u32,
    cells: Vec<Cell>,
}

impl Maze {
    /// Generate a maze by randomized depth-first carving from cell (1, 1)
    ///
    /// Deterministic for a seeded `rng`.
    pub fn generate<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        cell_size: u32,
        rng: &mut R,
    ) -> Result<Self> {
        if width < 3 || height < 3 {
            bail!("maze must be at least 3x3 to carve, got {}x{}", width, height);
        }
        if cell_size == 0 {
            bail!("cell_size must be positive");
        }

        let mut maze = Self {
            width,
            height,
            cell_size,
            cells: vec![Cell::Wall; width * height],
        };

        let origin = Position::new(1, 1);
        maze.set(origin, Cell::Free);
        let mut stack = vec![origin];
        let mut directions = CARVE_DIRECTIONS;

        while let Some(&current) = stack.last() {
            directions.shuffle(rng);

            let next = directions.iter().find_map(|&(dx, dy)| {
                let target = current.moved_by(dx, dy);
                (maze.in_carve_range(target) && maze.cell(target) == Some(Cell::Wall))
                    .then_some((target, current.moved_by(dx / 2, dy / 2)))
            });

            match next {
                Some((target, between)) => {
                    maze.set(between, Cell::Free);
                    maze.set(target, Cell::Free);
                    stack.push(target);
                }
                None => {
                    stack.pop();
                }
            }
        }

        Ok(maze)
    }

    /// Build a maze from explicit rows; `'#'` is a wall, anything else is free
    pub fn from_rows(rows: &[&str], cell_size: u32) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        if width == 0 || height == 0 {
            bail!("maze layout must not be empty");
        }
        if cell_size == 0 {
            bail!("cell_size must be positive");
        }

        let mut cells = Vec::with_capacity(width * height);
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                bail!("row {} has length {}, expected {}", y, row.chars().count(), width);
            }
            cells.extend(
                row.chars()
                    .map(|c| if c == '#' { Cell::Wall } else { Cell::Free }),
            );
        }

        Ok(Self {
            width,
            height,
            cell_size,
            cells,
        })
    }

    /// Force every border cell to free
    ///
    /// This gives agents a ring corridor around the maze and intentionally
    /// breaks the wall enclosure.
    pub fn open_borders(&mut self) {
        for x in 0..self.width as i32 {
            self.set(Position::new(x, 0), Cell::Free);
            self.set(Position::new(x, self.height as i32 - 1), Cell::Free);
        }
        for y in 0..self.height as i32 {
            self.set(Position::new(0, y), Cell::Free);
            self.set(Position::new(self.width as i32 - 1, y), Cell::Free);
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    pub fn pixel_width(&self) -> f32 {
        self.width as f32 * self.cell_size as f32
    }

    pub fn pixel_height(&self) -> f32 {
        self.height as f32 * self.cell_size as f32
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    /// Cell contents, or `None` outside the grid
    pub fn cell(&self, pos: Position) -> Option<Cell> {
        self.in_bounds(pos)
            .then(|| self.cells[pos.y as usize * self.width + pos.x as usize])
    }

    /// Wall lookup by cell; anything outside the grid is a wall
    pub fn is_wall_cell(&self, pos: Position) -> bool {
        !matches!(self.cell(pos), Some(Cell::Free))
    }

    /// Wall lookup by pixel coordinate; anything outside the grid is a wall
    pub fn is_wall(&self, px: f32, py: f32) -> bool {
        if !px.is_finite() || !py.is_finite() {
            return true;
        }
        self.is_wall_cell(self.pixel_to_cell(px, py))
    }

    /// Grid cell containing a pixel coordinate
    pub fn pixel_to_cell(&self, px: f32, py: f32) -> Position {
        let size = self.cell_size as f32;
        Position::new((px / size).floor() as i32, (py / size).floor() as i32)
    }

    /// Lazily enumerate every free cell in row-major order
    pub fn free_cells(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells.iter().enumerate().filter_map(move |(i, cell)| {
            (*cell == Cell::Free)
                .then(|| Position::new((i % self.width) as i32, (i / self.width) as i32))
        })
    }

    /// Nearest free cell to `requested` by breadth-first search over the grid
    ///
    /// Walls are traversed while searching, so the result is the closest free
    /// cell in grid steps, not the closest reachable one. Falls back to the
    /// (clamped) request when the grid has no free cell at all.
    pub fn nearest_free_cell(&self, requested: Position) -> Position {
        let start = Position::new(
            requested.x.clamp(0, self.width as i32 - 1),
            requested.y.clamp(0, self.height as i32 - 1),
        );

        let mut queue = VecDeque::from([start]);
        let mut seen = HashSet::from([start]);

        while let Some(pos) = queue.pop_front() {
            if !self.is_wall_cell(pos) {
                return pos;
            }
            for next in pos.neighbors() {
                if self.in_bounds(next) && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        start
    }

    fn in_carve_range(&self, pos: Position) -> bool {
        pos.x >= 1
            && pos.y >= 1
            && (pos.x as usize) < self.width - 1
            && (pos.y as usize) < self.height - 1
    }

    fn set(&mut self, pos: Position, cell: Cell) {
        if self.in_bounds(pos) {
            self.cells[pos.y as usize * self.width + pos.x as usize] = cell;
        }
    }
}
