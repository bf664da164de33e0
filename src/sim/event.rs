/// Events emitted by the session and world.
/// The front-end consumes these for loader requests, HUD messages and screens.

use crate::domain::entity::Point;
use crate::sim::loader::LoadTicket;
use crate::sim::progress::MazeIndex;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// Asset `maze<index>` should be fetched; the result must carry `ticket`.
    LoadRequested { ticket: LoadTicket, index: MazeIndex },
    LoadFailed { index: MazeIndex, reason: String },
    MazeLoaded { index: MazeIndex, start: Point, radius: u32 },
    /// Marker scan failed; the default start was used.
    MarkerFallback { index: MazeIndex },
    Moved { to: Point },
    Blocked { at: Point },
    ExitReached { index: MazeIndex },
    MazeUnlocked { index: MazeIndex },
    LockedMaze { requested: MazeIndex },
    Reset,
    /// Terminal event: every maze is done. Carries the reward token.
    AllComplete { token: String },
}
