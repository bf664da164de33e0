/// Maze progression bookkeeping. Pure state, no rendering.
///
/// Invariants held by every operation:
///   - `1 <= current <= highest_unlocked <= max_index`
///   - `highest_unlocked` never decreases

use crate::error::MazeError;

/// 1-based maze number.
pub type MazeIndex = u32;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ProgressState {
    pub current: MazeIndex,
    pub highest_unlocked: MazeIndex,
}

/// Result of finishing the current maze.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Advance {
    /// Move on to `state.current`. `unlocked` is true when this opened a new maze.
    Next { state: ProgressState, unlocked: bool },
    /// The last maze was finished; state is unchanged.
    AllComplete,
}

/// How a maze shows up in the progress list.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MazeStatus {
    Locked,
    Current,
    Completed,
    Unlocked,
}

/// Next progress after completing `state.current`.
pub fn advance(state: ProgressState, max_index: MazeIndex) -> Advance {
    if state.current >= max_index {
        return Advance::AllComplete;
    }
    if state.current == state.highest_unlocked {
        Advance::Next {
            state: ProgressState {
                current: state.current + 1,
                highest_unlocked: state.highest_unlocked + 1,
            },
            unlocked: true,
        }
    } else {
        // Re-traversing an already unlocked maze
        Advance::Next {
            state: ProgressState {
                current: state.current + 1,
                highest_unlocked: state.highest_unlocked,
            },
            unlocked: false,
        }
    }
}

pub struct ProgressTracker {
    state: ProgressState,
    max_index: MazeIndex,
}

impl ProgressTracker {
    pub fn new(max_index: MazeIndex, unlock_all: bool) -> Self {
        let max_index = max_index.max(1);
        ProgressTracker {
            state: ProgressState {
                current: 1,
                highest_unlocked: if unlock_all { max_index } else { 1 },
            },
            max_index,
        }
    }

    pub fn state(&self) -> ProgressState {
        self.state
    }

    pub fn max_index(&self) -> MazeIndex {
        self.max_index
    }

    /// Apply `advance` to the tracked state.
    pub fn advance(&mut self) -> Advance {
        let result = advance(self.state, self.max_index);
        if let Advance::Next { state, .. } = result {
            self.state = state;
        }
        result
    }

    /// Make `index` current. Locked or unknown mazes are rejected and the
    /// state is left untouched.
    pub fn select(&mut self, index: MazeIndex) -> Result<ProgressState, MazeError> {
        if index == 0 || index > self.max_index {
            return Err(MazeError::NoSuchMaze { requested: index, max: self.max_index });
        }
        if index > self.state.highest_unlocked {
            return Err(MazeError::LockedMaze {
                requested: index,
                highest_unlocked: self.state.highest_unlocked,
            });
        }
        self.state.current = index;
        Ok(self.state)
    }

    pub fn status(&self, index: MazeIndex) -> MazeStatus {
        if index > self.state.highest_unlocked {
            MazeStatus::Locked
        } else if index == self.state.current {
            MazeStatus::Current
        } else if index < self.state.current {
            MazeStatus::Completed
        } else {
            MazeStatus::Unlocked
        }
    }

    /// Status of every maze, in order.
    pub fn statuses(&self) -> Vec<(MazeIndex, MazeStatus)> {
        (1..=self.max_index).map(|i| (i, self.status(i))).collect()
    }
}
