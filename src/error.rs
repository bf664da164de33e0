/// Error taxonomy for maze loading, sampling and progression.
///
/// None of these are fatal: the session and world recover from each one
/// at their boundary (see `sim::session` and `sim::world`).

use thiserror::Error;

use crate::sim::progress::MazeIndex;

#[derive(Debug, Error)]
pub enum MazeError {
    /// Fetch or decode of `maze<N>` failed.
    #[error("failed to load maze asset {name}: {source}")]
    AssetLoad {
        name: String,
        #[source]
        source: image::ImageError,
    },

    /// Decoded image is not square and cannot be mapped onto the canvas.
    #[error("maze image must be square, got {width}x{height}")]
    NotSquare { width: u32, height: u32 },

    /// Full scan found no red start marker.
    #[error("no start marker found in maze image")]
    MarkerNotFound,

    #[error("maze {requested} is locked (highest unlocked: {highest_unlocked})")]
    LockedMaze {
        requested: MazeIndex,
        highest_unlocked: MazeIndex,
    },

    #[error("maze {requested} does not exist (mazes are 1..={max})")]
    NoSuchMaze { requested: MazeIndex, max: MazeIndex },

    #[error("pixel ({x}, {y}) is outside the canvas")]
    OutOfBounds { x: i32, y: i32 },
}
