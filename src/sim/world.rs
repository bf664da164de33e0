/// World: the session plus everything that outlives a single maze.
///
/// Commands (move, reset, select) are processed one at a time to
/// completion. The world owns the `MazeSession` and the `ProgressTracker`
/// and translates session outcomes into progression:
///
///   - exit reached   → `advance`, then request the next maze
///   - last maze done → emit `AllComplete` with the reward token (once)
///   - load failed    → `current` rolls back to the maze still on screen
///
/// Loads are never performed here. The world emits `LoadRequested` and the
/// front-end feeds the decoded result back through `finish_load`.

use crate::config::MazeConfig;
use crate::domain::entity::MoveDir;
use crate::error::MazeError;
use crate::sim::event::GameEvent;
use crate::sim::loader::{asset_name, LoadResult};
use crate::sim::progress::{Advance, MazeIndex, ProgressTracker};
use crate::sim::session::MazeSession;

/// HUD message lifetime, in frames.
const MESSAGE_TICKS: u32 = 120;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Move(MoveDir),
    Reset,
    Select(MazeIndex),
    DismissReveal,
}

pub struct World {
    pub session: MazeSession,
    pub progress: ProgressTracker,
    reward_token: String,
    reward_sent: bool,
    /// Reward screen is up.
    pub reveal: bool,
    pub message: String,
    pub message_timer: u32,
    pub anim_tick: u32,
}

impl World {
    pub fn new(config: &MazeConfig) -> Self {
        World {
            session: MazeSession::new(config.session()),
            progress: ProgressTracker::new(config.maze_count, config.unlock_all),
            reward_token: config.reward_token.clone(),
            reward_sent: false,
            reveal: false,
            message: String::new(),
            message_timer: 0,
            anim_tick: 0,
        }
    }

    /// Request the current maze. Call once at startup.
    pub fn start(&mut self) -> Vec<GameEvent> {
        let current = self.progress.state().current;
        vec![self.request_load(current)]
    }

    pub fn handle(&mut self, cmd: Command) -> Vec<GameEvent> {
        match cmd {
            Command::Move(dir) => {
                if self.reveal {
                    return vec![];
                }
                let mut events = self.session.move_player(dir);
                if events.iter().any(|e| matches!(e, GameEvent::ExitReached { .. })) {
                    self.on_maze_finished(&mut events);
                }
                events
            }
            Command::Reset => {
                let events = self.session.reset();
                if !events.is_empty() {
                    self.clear_message();
                }
                events
            }
            Command::Select(index) => self.select(index),
            Command::DismissReveal => {
                self.reveal = false;
                vec![]
            }
        }
    }

    /// Feed a decode result back in.
    pub fn finish_load(&mut self, loaded: LoadResult) -> Vec<GameEvent> {
        let events = self.session.finish_load(loaded);
        for event in &events {
            match event {
                GameEvent::LoadFailed { index, .. } => {
                    // Keep `current` pointing at whatever is actually on screen.
                    if let Some(shown) = self.session.maze() {
                        if let Err(e) = self.progress.select(shown) {
                            log::debug!("could not restore maze {shown}: {e}");
                        }
                    }
                    self.set_message(&format!("Could not load {}", asset_name(*index)), MESSAGE_TICKS);
                }
                GameEvent::MarkerFallback { .. } => {
                    self.set_message("Start marker not found, using default start", MESSAGE_TICKS);
                }
                GameEvent::MazeLoaded { index, .. } => {
                    if self.message_timer == 0 || self.message.starts_with("Loading") {
                        self.set_message(&format!("Maze {index}"), MESSAGE_TICKS / 2);
                    }
                }
                _ => {}
            }
        }
        events
    }

    pub fn set_message(&mut self, msg: &str, ticks: u32) {
        self.message = msg.to_string();
        self.message_timer = ticks;
    }

    fn clear_message(&mut self) {
        self.message.clear();
        self.message_timer = 0;
    }

    /// Advance per-frame timers.
    pub fn tick(&mut self) {
        self.anim_tick = self.anim_tick.wrapping_add(1);
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message.clear();
            }
        }
    }

    pub fn reward_token(&self) -> &str {
        &self.reward_token
    }

    // ── Internal ──

    fn request_load(&mut self, index: MazeIndex) -> GameEvent {
        let ticket = self.session.begin_load(index);
        log::info!("requesting {} (ticket {ticket})", asset_name(index));
        self.set_message(&format!("Loading maze {index}..."), MESSAGE_TICKS);
        GameEvent::LoadRequested { ticket, index }
    }

    fn select(&mut self, index: MazeIndex) -> Vec<GameEvent> {
        match self.progress.select(index) {
            Ok(_) => vec![self.request_load(index)],
            Err(MazeError::LockedMaze { requested, .. }) => {
                log::info!("maze {requested} is locked");
                self.set_message(
                    &format!("Maze {requested} is locked! Complete the previous maze first."),
                    MESSAGE_TICKS,
                );
                vec![GameEvent::LockedMaze { requested }]
            }
            Err(e) => {
                log::debug!("{e}");
                vec![]
            }
        }
    }

    fn on_maze_finished(&mut self, events: &mut Vec<GameEvent>) {
        match self.progress.advance() {
            Advance::Next { state, unlocked } => {
                if unlocked {
                    log::info!("unlocked maze {}", state.current);
                    events.push(GameEvent::MazeUnlocked { index: state.current });
                }
                events.push(self.request_load(state.current));
            }
            Advance::AllComplete => {
                self.set_message("All mazes complete!", MESSAGE_TICKS);
                if !self.reward_sent {
                    log::info!("all {} mazes complete", self.progress.max_index());
                    self.reward_sent = true;
                    self.reveal = true;
                    events.push(GameEvent::AllComplete { token: self.reward_token.clone() });
                }
            }
        }
    }
}
