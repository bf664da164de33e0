/// Keyboard input.
///
/// Movement is discrete: every Press or auto-repeat event of a movement
/// key becomes exactly one move command, in arrival order. Holding a key
/// therefore moves at the terminal's key-repeat rate. Release events are
/// ignored.
///
/// Key map:
///   W A S D / arrows  →  Move
///   R                 →  Reset to start marker
///   1 - 9             →  Select maze
///   Enter / Space     →  Dismiss reward screen
///   Esc / Q / Ctrl+C  →  Quit

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::MoveDir;
use crate::sim::world::Command;

/// What a key asks the game to do.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    Command(Command),
    Quit,
}

pub struct InputState {
    /// Raw key events collected during drain (Press and Repeat only).
    pub raw_events: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            raw_events: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events without blocking.
    /// Call this once per frame.
    pub fn drain_events(&mut self) {
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                    self.raw_events.push(key);
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!("terminal read failed: {e}");
                    break;
                }
            }
        }
    }

    /// Actions for this frame's keys, in arrival order.
    pub fn actions(&self) -> impl Iterator<Item = Action> + '_ {
        self.raw_events.iter().filter_map(action_for_key)
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(is_ctrl_c)
    }
}

fn is_ctrl_c(k: &KeyEvent) -> bool {
    k.modifiers.contains(KeyModifiers::CONTROL)
        && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
}

pub fn action_for_key(key: &KeyEvent) -> Option<Action> {
    if is_ctrl_c(key) {
        return Some(Action::Quit);
    }
    let cmd = match key.code {
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Command::Move(MoveDir::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Command::Move(MoveDir::Right),
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Command::Move(MoveDir::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Command::Move(MoveDir::Down),
        KeyCode::Char('r') | KeyCode::Char('R') => Command::Reset,
        KeyCode::Char(c @ '1'..='9') => Command::Select(c as u32 - '0' as u32),
        KeyCode::Enter | KeyCode::Char(' ') => Command::DismissReveal,
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => return Some(Action::Quit),
        _ => return None,
    };
    Some(Action::Command(cmd))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn wasd_and_arrows_move() {
        assert_eq!(action_for_key(&key(KeyCode::Char('w'))), Some(Action::Command(Command::Move(MoveDir::Up))));
        assert_eq!(action_for_key(&key(KeyCode::Char('A'))), Some(Action::Command(Command::Move(MoveDir::Left))));
        assert_eq!(action_for_key(&key(KeyCode::Down)), Some(Action::Command(Command::Move(MoveDir::Down))));
        assert_eq!(action_for_key(&key(KeyCode::Right)), Some(Action::Command(Command::Move(MoveDir::Right))));
    }

    #[test]
    fn digits_select_mazes() {
        assert_eq!(action_for_key(&key(KeyCode::Char('1'))), Some(Action::Command(Command::Select(1))));
        assert_eq!(action_for_key(&key(KeyCode::Char('6'))), Some(Action::Command(Command::Select(6))));
        assert_eq!(action_for_key(&key(KeyCode::Char('0'))), None);
    }

    #[test]
    fn quit_keys() {
        assert_eq!(action_for_key(&key(KeyCode::Esc)), Some(Action::Quit));
        assert_eq!(action_for_key(&key(KeyCode::Char('q'))), Some(Action::Quit));
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(action_for_key(&ctrl_c), Some(Action::Quit));
    }

    #[test]
    fn unmapped_keys_do_nothing() {
        assert_eq!(action_for_key(&key(KeyCode::Tab)), None);
        assert_eq!(action_for_key(&key(KeyCode::Char('x'))), None);
    }

    #[test]
    fn actions_keep_arrival_order() {
        let mut input = InputState::new();
        input.raw_events = vec![key(KeyCode::Char('d')), key(KeyCode::Char('x')), key(KeyCode::Char('r'))];
        let got: Vec<_> = input.actions().collect();
        assert_eq!(
            got,
            vec![Action::Command(Command::Move(MoveDir::Right)), Action::Command(Command::Reset)]
        );
        assert!(!input.ctrl_c_pressed());
    }
}
