/// MazeSession: one maze being played.
///
/// ## State machine
///
/// ```text
///   Idle ──begin_load──▶ Loading ──finish_load(ok)──▶ Ready ◀──▶ (move) ──exit──▶ Completed
///                          │                           ▲                            │
///                          └──finish_load(err)─▶ previous state        reset ◀──────┘
/// ```
///
/// A move is handled to completion inside `move_player` (the transient
/// "moving" step): the candidate is one `step` along one axis, it is
/// committed only if the collision stencil is clear, and every committed
/// move is checked against the exit.
///
/// ## Ownership
///
/// The session exclusively owns the raster image, the player state and the
/// path history for the lifetime of one load. All three are replaced
/// together when a load commits; `reset` restores player and path from the
/// marker found at load time.
///
/// ## Load ordering
///
/// `begin_load` hands out a fresh ticket. `finish_load` ignores any result
/// that does not carry the active ticket, so only the newest request can
/// commit.

use crate::domain::collision;
use crate::domain::entity::{MoveDir, PlayerState, Point};
use crate::domain::exit;
use crate::domain::marker::{self, Marker};
use crate::domain::raster::RasterImage;
use crate::sim::event::GameEvent;
use crate::sim::loader::{asset_name, LoadResult, LoadTicket};
use crate::sim::progress::MazeIndex;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionState {
    Idle,
    Loading,
    Ready,
    Completed,
}

/// Movement tuning.
#[derive(Clone, Copy, Debug)]
pub struct SessionConfig {
    /// Pixels per move command.
    pub step: i32,
    /// Marker diameter constant the collision stencil is derived from.
    pub probe_offset: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig { step: 5, probe_offset: 2 }
    }
}

pub struct MazeSession {
    config: SessionConfig,
    state: SessionState,
    /// State to fall back to if the pending load fails.
    resume: SessionState,
    image: Option<RasterImage>,
    maze: Option<MazeIndex>,
    pending: Option<(LoadTicket, MazeIndex)>,
    last_ticket: LoadTicket,
    start: Marker,
    player: PlayerState,
    path: Vec<Point>,
}

impl MazeSession {
    pub fn new(config: SessionConfig) -> Self {
        let start = Marker::fallback();
        MazeSession {
            config,
            state: SessionState::Idle,
            resume: SessionState::Idle,
            image: None,
            maze: None,
            pending: None,
            last_ticket: 0,
            start,
            player: PlayerState::new(start.center, start.radius),
            path: Vec::new(),
        }
    }

    // ── Accessors (render sink) ──

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn image(&self) -> Option<&RasterImage> {
        self.image.as_ref()
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn path(&self) -> &[Point] {
        &self.path
    }

    /// Maze whose image is currently held.
    pub fn maze(&self) -> Option<MazeIndex> {
        self.maze
    }

    /// Maze being loaded, if any.
    pub fn pending_maze(&self) -> Option<MazeIndex> {
        self.pending.map(|(_, index)| index)
    }

    // ── Loading ──

    /// Start loading `index`. Supersedes any load already in flight.
    pub fn begin_load(&mut self, index: MazeIndex) -> LoadTicket {
        self.last_ticket += 1;
        if self.state != SessionState::Loading {
            self.resume = self.state;
        }
        self.pending = Some((self.last_ticket, index));
        self.state = SessionState::Loading;
        self.last_ticket
    }

    /// Commit a decode result if it belongs to the active load.
    pub fn finish_load(&mut self, loaded: LoadResult) -> Vec<GameEvent> {
        match self.pending {
            Some((ticket, _)) if ticket == loaded.ticket => {}
            _ => {
                log::debug!(
                    "dropping stale load of {} (ticket {})",
                    asset_name(loaded.index),
                    loaded.ticket
                );
                return vec![];
            }
        }
        self.pending = None;
        let index = loaded.index;

        let image = match loaded.result {
            Ok(image) => image,
            Err(e) => {
                log::warn!("{e}");
                self.state = self.resume;
                return vec![GameEvent::LoadFailed { index, reason: e.to_string() }];
            }
        };

        let mut events = Vec::new();
        let found = match marker::locate_marker(&image) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("{}: {e}; using default start", asset_name(index));
                events.push(GameEvent::MarkerFallback { index });
                Marker::fallback()
            }
        };
        log::info!(
            "loaded {} (start {},{} radius {})",
            asset_name(index),
            found.center.x,
            found.center.y,
            found.radius
        );

        self.image = Some(image);
        self.maze = Some(index);
        self.start = found;
        self.restart();
        events.push(GameEvent::MazeLoaded { index, start: found.center, radius: found.radius });
        events
    }

    // ── Commands ──

    /// One movement command. Rejected unless Ready.
    pub fn move_player(&mut self, dir: MoveDir) -> Vec<GameEvent> {
        if self.state != SessionState::Ready {
            log::debug!("move {:?} ignored in {:?}", dir, self.state);
            return vec![];
        }
        let Some(image) = self.image.as_ref() else {
            return vec![];
        };

        let candidate = self.player.position.offset(dir, self.config.step);
        if collision::is_blocked(image, candidate, self.config.probe_offset) {
            return vec![GameEvent::Blocked { at: candidate }];
        }

        self.player.position = candidate;
        self.path.push(candidate);
        let mut events = vec![GameEvent::Moved { to: candidate }];

        if exit::reached_exit(image, &self.player) {
            self.state = SessionState::Completed;
            if let Some(index) = self.maze {
                log::info!("{} finished in {} moves", asset_name(index), self.path.len());
                events.push(GameEvent::ExitReached { index });
            }
        }
        events
    }

    /// Put the player back on the start marker and clear the path.
    pub fn reset(&mut self) -> Vec<GameEvent> {
        match self.state {
            SessionState::Ready | SessionState::Completed => {
                self.restart();
                vec![GameEvent::Reset]
            }
            SessionState::Idle | SessionState::Loading => {
                log::debug!("reset ignored in {:?}", self.state);
                vec![]
            }
        }
    }

    fn restart(&mut self) {
        self.player = PlayerState::new(self.start.center, self.start.radius);
        self.path.clear();
        self.state = SessionState::Ready;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::raster::test_support::*;
    use crate::domain::raster::Rgb;
    use crate::error::MazeError;

    const RED: Rgb = Rgb::new(220, 10, 10);

    fn star(img: &mut image::RgbaImage, c: Point, r: u32) {
        paint(img, c.x as u32, c.y as u32, RED);
        for radius in 1..=r {
            for p in marker::ring_points(c, radius) {
                paint(img, p.x as u32, p.y as u32, RED);
            }
        }
    }

    /// White maze, marker at `start`, black wall column at x = 130.
    fn maze_image(start: Point) -> RasterImage {
        let mut img = canvas(800, WHITE);
        fill_rect(&mut img, 130, 0, 4, 800, Rgb::BLACK);
        star(&mut img, start, 5);
        raster(img)
    }

    fn ok(ticket: LoadTicket, index: MazeIndex, image: RasterImage) -> LoadResult {
        LoadResult { ticket, index, result: Ok(image) }
    }

    fn loaded_session(start: Point) -> MazeSession {
        let mut s = MazeSession::new(SessionConfig::default());
        let t = s.begin_load(1);
        s.finish_load(ok(t, 1, maze_image(start)));
        s
    }

    #[test]
    fn new_session_is_idle() {
        let mut s = MazeSession::new(SessionConfig::default());
        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.move_player(MoveDir::Right).is_empty());
        assert!(s.reset().is_empty());
    }

    #[test]
    fn load_locates_marker() {
        let mut s = MazeSession::new(SessionConfig::default());
        let t = s.begin_load(1);
        assert_eq!(s.state(), SessionState::Loading);
        let events = s.finish_load(ok(t, 1, maze_image(Point::new(100, 100))));
        assert_eq!(
            events,
            vec![GameEvent::MazeLoaded { index: 1, start: Point::new(100, 100), radius: 5 }]
        );
        assert_eq!(s.state(), SessionState::Ready);
        assert_eq!(s.player().position, Point::new(100, 100));
        assert_eq!(s.player().marker_radius, 5);
        assert!(s.path().is_empty());
    }

    #[test]
    fn missing_marker_uses_default_start() {
        let mut s = MazeSession::new(SessionConfig::default());
        let t = s.begin_load(3);
        let events = s.finish_load(ok(t, 3, raster(canvas(800, WHITE))));
        assert_eq!(events[0], GameEvent::MarkerFallback { index: 3 });
        assert_eq!(s.player().position, Point::new(30, 30));
        assert_eq!(s.player().marker_radius, 5);
        assert_eq!(s.state(), SessionState::Ready);
    }

    #[test]
    fn clear_moves_commit_and_record_path() {
        let mut s = loaded_session(Point::new(100, 100));
        let events = s.move_player(MoveDir::Down);
        assert_eq!(events, vec![GameEvent::Moved { to: Point::new(100, 105) }]);
        s.move_player(MoveDir::Left);
        assert_eq!(s.player().position, Point::new(95, 105));
        assert_eq!(s.path(), &[Point::new(100, 105), Point::new(95, 105)]);
    }

    #[test]
    fn wall_rejects_move_without_change() {
        let mut s = loaded_session(Point::new(100, 100));
        for _ in 0..5 {
            s.move_player(MoveDir::Right);
        }
        assert_eq!(s.player().position, Point::new(125, 100));
        let events = s.move_player(MoveDir::Right);
        assert_eq!(events, vec![GameEvent::Blocked { at: Point::new(130, 100) }]);
        assert_eq!(s.player().position, Point::new(125, 100));
        assert_eq!(s.path().len(), 5);
        assert_eq!(s.state(), SessionState::Ready);
    }

    #[test]
    fn canvas_edge_blocks() {
        let mut s = loaded_session(Point::new(10, 100));
        s.move_player(MoveDir::Left);
        assert_eq!(s.player().position, Point::new(5, 100));
        // (0, 100): the left stencil column is off-canvas
        let events = s.move_player(MoveDir::Left);
        assert_eq!(events, vec![GameEvent::Blocked { at: Point::new(0, 100) }]);
        assert_eq!(s.player().position, Point::new(5, 100));
    }

    #[test]
    fn reaching_exit_completes() {
        let mut s = loaded_session(Point::new(745, 745));
        s.move_player(MoveDir::Right); // (750, 745)
        s.move_player(MoveDir::Down); // (750, 750)
        let e = s.move_player(MoveDir::Right); // (755, 750): y not past edge
        assert_eq!(e.len(), 1);
        let e = s.move_player(MoveDir::Down); // (755, 755)
        assert_eq!(
            e,
            vec![
                GameEvent::Moved { to: Point::new(755, 755) },
                GameEvent::ExitReached { index: 1 },
            ]
        );
        assert_eq!(s.state(), SessionState::Completed);
        assert!(s.move_player(MoveDir::Down).is_empty());
    }

    #[test]
    fn reset_is_idempotent() {
        let mut s = loaded_session(Point::new(100, 100));
        s.move_player(MoveDir::Down);
        s.move_player(MoveDir::Down);
        s.reset();
        let once = (*s.player(), s.path().to_vec());
        s.reset();
        let twice = (*s.player(), s.path().to_vec());
        assert_eq!(once, twice);
        assert_eq!(once.0.position, Point::new(100, 100));
        assert!(once.1.is_empty());
    }

    #[test]
    fn reset_after_completion_replays_maze() {
        let mut s = loaded_session(Point::new(755, 750));
        s.move_player(MoveDir::Down);
        assert_eq!(s.state(), SessionState::Completed);
        assert_eq!(s.reset(), vec![GameEvent::Reset]);
        assert_eq!(s.state(), SessionState::Ready);
        assert_eq!(s.player().position, Point::new(755, 750));
    }

    #[test]
    fn commands_rejected_while_loading() {
        let mut s = loaded_session(Point::new(100, 100));
        s.begin_load(2);
        assert!(s.move_player(MoveDir::Down).is_empty());
        assert!(s.reset().is_empty());
        assert_eq!(s.player().position, Point::new(100, 100));
    }

    #[test]
    fn stale_load_is_dropped() {
        let mut s = MazeSession::new(SessionConfig::default());
        let first = s.begin_load(1);
        let second = s.begin_load(2);
        assert!(s.finish_load(ok(first, 1, maze_image(Point::new(100, 100)))).is_empty());
        assert_eq!(s.state(), SessionState::Loading);
        assert_eq!(s.pending_maze(), Some(2));

        s.finish_load(ok(second, 2, maze_image(Point::new(200, 200))));
        assert_eq!(s.maze(), Some(2));
        assert_eq!(s.player().position, Point::new(200, 200));
    }

    #[test]
    fn failed_load_keeps_previous_maze() {
        let mut s = loaded_session(Point::new(100, 100));
        s.move_player(MoveDir::Down);
        let t = s.begin_load(2);
        let events = s.finish_load(LoadResult {
            ticket: t,
            index: 2,
            result: Err(MazeError::NotSquare { width: 0, height: 0 }),
        });
        assert!(matches!(events[..], [GameEvent::LoadFailed { index: 2, .. }]));
        assert_eq!(s.state(), SessionState::Ready);
        assert_eq!(s.maze(), Some(1));
        assert_eq!(s.player().position, Point::new(100, 105));
        assert_eq!(s.path().len(), 1);
    }

    #[test]
    fn failed_first_load_returns_to_idle() {
        let mut s = MazeSession::new(SessionConfig::default());
        let t = s.begin_load(1);
        s.finish_load(LoadResult {
            ticket: t,
            index: 1,
            result: Err(MazeError::NotSquare { width: 0, height: 0 }),
        });
        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.image().is_none());
    }
}
