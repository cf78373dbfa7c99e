/// Entities: positions on the toroidal field and the four input directions.

/// Movement direction (one step per fresh press).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Left,
    Up,
    Right,
    Down,
}

impl Direction {
    /// Order in which pending directions are resolved within one frame.
    /// Later entries can cancel earlier ones on the same axis.
    pub const RESOLVE_ORDER: [Direction; 4] = [
        Direction::Down,
        Direction::Up,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit offset (dx, dy). Screen coordinates: +y is down.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Left  => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up    => (0, -1),
            Direction::Down  => (0, 1),
        }
    }
}

/// Cell coordinate. Always kept inside the grid by construction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }

    /// One step in `dir`, wrapping to the opposite edge of a `width`×`height` grid.
    pub fn wrapped_step(self, dir: Direction, width: usize, height: usize) -> Self {
        let (dx, dy) = dir.delta();
        Position {
            x: wrap(self.x, dx, width),
            y: wrap(self.y, dy, height),
        }
    }
}

#[inline]
fn wrap(v: usize, d: i32, n: usize) -> usize {
    match d {
        1 => if v + 1 >= n { 0 } else { v + 1 },
        -1 => if v == 0 { n - 1 } else { v - 1 },
        _ => v,
    }
}
