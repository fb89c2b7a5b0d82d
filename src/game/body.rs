use super::{
    action::Action,
    config::Movement,
    maze::Maze,
    state::{Position, Rect},
};

/// A movable square body living inside a maze
///
/// Position is the pixel top-left of the bounding box. Discrete bodies are
/// always centered in a cell; continuous bodies may sit anywhere that keeps
/// all four corners off wall cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    x: f32,
    y: f32,
    size: f32,
    movement: Movement,
    last_action_blocked: bool,
}

impl Body {
    /// Spawn centered in the free cell nearest to `requested`
    pub fn spawn(maze: &Maze, requested: Position, body_fraction: f32, movement: Movement) -> Self {
        let size = maze.cell_size() as f32 * body_fraction;
        let cell = maze.nearest_free_cell(requested);
        let (x, y) = centered_in(maze, cell, size);
        Self {
            x,
            y,
            size,
            movement,
            last_action_blocked: false,
        }
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn movement(&self) -> Movement {
        self.movement
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.size, self.size)
    }

    pub fn center(&self) -> (f32, f32) {
        self.bounds().center()
    }

    /// Grid cell containing the body's center
    pub fn cell(&self, maze: &Maze) -> Position {
        let (cx, cy) = self.center();
        maze.pixel_to_cell(cx, cy)
    }

    /// Whether the most recent `apply_action` was stopped by a wall
    pub fn last_action_blocked(&self) -> bool {
        self.last_action_blocked
    }

    /// Move by one action, recomputing `last_action_blocked`
    pub fn apply_action(&mut self, action: Action, maze: &Maze) {
        self.last_action_blocked = match self.movement {
            Movement::Discrete => self.step_discrete(action, maze),
            Movement::Continuous { speed } => self.step_continuous(action, speed, maze),
        };
    }

    fn step_discrete(&mut self, action: Action, maze: &Maze) -> bool {
        if action == Action::Stay {
            return false;
        }
        let target = self.cell(maze).moved_by_action(action);
        if maze.is_wall_cell(target) {
            return true;
        }
        let (x, y) = centered_in(maze, target, self.size);
        self.x = x;
        self.y = y;
        false
    }

    fn step_continuous(&mut self, action: Action, speed: f32, maze: &Maze) -> bool {
        let (dx, dy) = action.delta();
        let mut blocked = false;

        // X first, then Y, each rejected on its own so a body can slide along walls
        for (mx, my) in [(dx as f32 * speed, 0.0), (0.0, dy as f32 * speed)] {
            if mx == 0.0 && my == 0.0 {
                continue;
            }
            let candidate = self.bounds().translated(mx, my);
            if candidate.corners().iter().any(|&(px, py)| maze.is_wall(px, py)) {
                blocked = true;
            } else {
                self.x = candidate.x;
                self.y = candidate.y;
            }
        }

        blocked
    }
}

fn centered_in(maze: &Maze, cell: Position, size: f32) -> (f32, f32) {
    let cell_size = maze.cell_size() as f32;
    let offset = (cell_size - size) / 2.0;
    (
        cell.x as f32 * cell_size + offset,
        cell.y as f32 * cell_size + offset,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> Maze {
        Maze::from_rows(&["#####", "#...#", "#.###", "#####"], 10).unwrap()
    }

    #[test]
    fn test_spawn_centered() {
        let maze = corridor();
        let body = Body::spawn(&maze, Position::new(1, 1), 0.5, Movement::Discrete);
        assert_eq!(body.size(), 5.0);
        assert_eq!(body.position(), (12.5, 12.5));
        assert_eq!(body.center(), (15.0, 15.0));
        assert_eq!(body.cell(&maze), Position::new(1, 1));
    }

    #[test]
    fn test_spawn_in_wall_moves_to_nearest_free() {
        let maze = corridor();
        let body = Body::spawn(&maze, Position::new(0, 0), 0.5, Movement::Discrete);
        assert_eq!(body.cell(&maze), Position::new(1, 1));
    }

    #[test]
    fn test_discrete_move_and_block() {
        let maze = corridor();
        let mut body = Body::spawn(&maze, Position::new(1, 1), 0.5, Movement::Discrete);

        body.apply_action(Action::Right, &maze);
        assert_eq!(body.cell(&maze), Position::new(2, 1));
        assert!(!body.last_action_blocked());

        body.apply_action(Action::Down, &maze);
        assert_eq!(body.cell(&maze), Position::new(2, 1));
        assert!(body.last_action_blocked());

        body.apply_action(Action::Stay, &maze);
        assert!(!body.last_action_blocked());
    }

    #[test]
    fn test_continuous_move_stops_before_wall() {
        let maze = corridor();
        let movement = Movement::Continuous { speed: 3.0 };
        let mut body = Body::spawn(&maze, Position::new(1, 1), 0.5, movement);

        body.apply_action(Action::Up, &maze);
        assert!(body.last_action_blocked());
        assert_eq!(body.position(), (12.5, 12.5));

        body.apply_action(Action::Right, &maze);
        assert!(!body.last_action_blocked());
        assert_eq!(body.position(), (15.5, 12.5));

        // Slide right until the corridor end blocks the box
        for _ in 0..20 {
            body.apply_action(Action::Right, &maze);
        }
        assert!(body.last_action_blocked());
        assert!(body.bounds().right() <= 40.0);
        assert_eq!(body.cell(&maze), Position::new(3, 1));
    }

    #[test]
    fn test_continuous_can_turn_when_aligned() {
        let maze = corridor();
        let movement = Movement::Continuous { speed: 3.0 };
        let mut body = Body::spawn(&maze, Position::new(1, 1), 0.5, movement);

        body.apply_action(Action::Down, &maze);
        assert!(!body.last_action_blocked());
        assert_eq!(body.position(), (12.5, 15.5));
    }
}
