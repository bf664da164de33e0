/// Player-side value types: image-space points, move directions, player state.

/// A pixel coordinate in image space.
///
/// Signed so that candidate positions and stencil points that fall off the
/// canvas can still be represented (and then rejected as walls).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }

    /// Is this point inside a `size`×`size` canvas?
    pub fn in_bounds(self, size: u32) -> bool {
        let s = size as i64;
        (0..s).contains(&(self.x as i64)) && (0..s).contains(&(self.y as i64))
    }

    /// Step `amount` pixels in `dir` along one axis.
    pub fn offset(self, dir: MoveDir, amount: i32) -> Point {
        let (dx, dy) = dir.delta();
        Point::new(self.x + dx * amount, self.y + dy * amount)
    }
}

/// Movement direction for a single input command.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Left,
    Right,
    Up,
    Down,
}

impl MoveDir {
    /// Unit delta in image space (y grows downward).
    pub fn delta(self) -> (i32, i32) {
        match self {
            MoveDir::Left => (-1, 0),
            MoveDir::Right => (1, 0),
            MoveDir::Up => (0, -1),
            MoveDir::Down => (0, 1),
        }
    }
}

/// Current player marker: where it is and how large it is drawn.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PlayerState {
    pub position: Point,
    pub marker_radius: u32,
}

impl PlayerState {
    pub fn new(position: Point, marker_radius: u32) -> Self {
        PlayerState { position, marker_radius }
    }
}
