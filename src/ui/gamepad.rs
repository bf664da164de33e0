/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Move (repeats while held)
///   Start                 →  Reset to start marker
///   A                     →  Dismiss reward screen
///   Select                →  Quit

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use std::time::{Duration, Instant};

use crate::config::GamepadConfig;
use crate::domain::entity::MoveDir;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    Start,
    Select,
}

const BTN_COUNT: usize = 8;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

/// Action-to-button mapping (loaded from config).
#[derive(Debug, PartialEq)]
struct ActionMap {
    reset: Vec<Btn>,
    quit: Vec<Btn>,
    confirm: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            reset:   vec![Btn::Start],
            quit:    vec![Btn::Select],
            confirm: vec![Btn::A],
        }
    }
}

/// Indexed by `MoveDir as usize` order: Left, Right, Up, Down.
const DIRS: [MoveDir; 4] = [MoveDir::Left, MoveDir::Right, MoveDir::Up, MoveDir::Down];

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; BTN_COUNT],
    dpad: [BtnState; 4],
    stick: [BtnState; 4],
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_x: f32,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_y: f32,

    action_map: ActionMap,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

fn dir_index(dir: MoveDir) -> usize {
    match dir {
        MoveDir::Left => 0,
        MoveDir::Right => 1,
        MoveDir::Up => 2,
        MoveDir::Down => 3,
    }
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let gilrs_opt = match Gilrs::new() {
            Ok(g) => {
                if let Some((_, pad)) = g.gamepads().next() {
                    log::info!("gamepad found: {}", pad.name());
                }
                Some(g)
            }
            Err(e) => {
                log::info!("gamepad support unavailable: {e}");
                None
            }
        };

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); BTN_COUNT],
            dpad: [BtnState::default(); 4],
            stick: [BtnState::default(); 4],
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
        }
    }

    /// Load button mapping from config.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| {
                let btn = Btn::from_name(s);
                if btn.is_none() {
                    log::warn!("config.toml: unknown gamepad button {s:?}");
                }
                btn
            }).collect()
        }
        let map = &mut self.action_map;
        let rs = parse_list(&cfg.reset);
        if !rs.is_empty() { map.reset = rs; }
        let qt = parse_list(&cfg.quit);
        if !qt.is_empty() { map.quit = qt; }
        let cf = parse_list(&cfg.confirm);
        if !cf.is_empty() { map.confirm = cf; }
    }

    pub fn update(&mut self) {
        self.clear_just_pressed();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => {
                    log::info!("gamepad connected");
                }
                EventType::Disconnected => {
                    log::info!("gamepad disconnected");
                    self.release_all();
                }
                _ => {}
            }
        }

        // Derive stick digital states (stick Y is positive up)
        let held = [
            self.stick_x < -STICK_DEADZONE,
            self.stick_x > STICK_DEADZONE,
            self.stick_y > STICK_DEADZONE,
            self.stick_y < -STICK_DEADZONE,
        ];
        for (state, now_held) in self.stick.iter_mut().zip(held) {
            if now_held && !state.held { state.just_pressed = true; }
            state.held = now_held;
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        // D-pad handled separately (not in Btn enum)
        let dpad = match gilrs_btn {
            Button::DPadLeft  => Some(MoveDir::Left),
            Button::DPadRight => Some(MoveDir::Right),
            Button::DPadUp    => Some(MoveDir::Up),
            Button::DPadDown  => Some(MoveDir::Down),
            _ => None,
        };
        let state = match (dpad, Btn::from_gilrs(gilrs_btn)) {
            (Some(dir), _) => &mut self.dpad[dir_index(dir)],
            (None, Some(btn)) => &mut self.buttons[btn_index(btn)],
            (None, None) => return,
        };
        state.held = held;
        if held {
            state.just_pressed = true;
        }
    }

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].just_pressed)
    }

    pub fn reset_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.reset)
    }
    pub fn quit_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.quit)
    }
    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }

    /// Direction pressed this frame (D-pad first, then stick).
    pub fn dir_just_pressed(&self) -> Option<MoveDir> {
        DIRS.into_iter().find(|&d| {
            let i = dir_index(d);
            self.dpad[i].just_pressed || self.stick[i].just_pressed
        })
    }

    /// Direction currently held, if any.
    pub fn dir_held(&self) -> Option<MoveDir> {
        DIRS.into_iter().find(|&d| {
            let i = dir_index(d);
            self.dpad[i].held || self.stick[i].held
        })
    }

    // ── Internal ──

    fn clear_just_pressed(&mut self) {
        for b in self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick) {
            b.just_pressed = false;
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        for b in self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick) {
            *b = BtnState::default();
        }
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}

/// Turns a held direction into discrete moves: one on the initial press,
/// then one every `interval` while it stays held.
pub struct MoveRepeater {
    interval: Duration,
    last: Option<(MoveDir, Instant)>,
}

impl MoveRepeater {
    pub fn new(interval: Duration) -> Self {
        MoveRepeater { interval, last: None }
    }

    pub fn next(&mut self, fresh: Option<MoveDir>, held: Option<MoveDir>, now: Instant) -> Option<MoveDir> {
        if let Some(dir) = fresh {
            self.last = Some((dir, now));
            return Some(dir);
        }
        match (held, self.last) {
            (Some(dir), Some((prev, at))) if dir == prev => {
                if now.duration_since(at) >= self.interval {
                    self.last = Some((dir, now));
                    Some(dir)
                } else {
                    None
                }
            }
            (Some(dir), _) => {
                self.last = Some((dir, now));
                Some(dir)
            }
            (None, _) => {
                self.last = None;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_names_parse() {
        assert_eq!(Btn::from_name("start"), Some(Btn::Start));
        assert_eq!(Btn::from_name("South"), Some(Btn::A));
        assert_eq!(Btn::from_name("back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("turbo"), None);
    }

    #[test]
    fn config_overrides_mapping() {
        let mut gp = GamepadState::new();
        gp.load_button_config(&GamepadConfig {
            reset: vec!["Y".into()],
            quit: vec!["nope".into()],
            confirm: vec!["B".into(), "A".into()],
        });
        assert_eq!(gp.action_map.reset, vec![Btn::Y]);
        assert_eq!(gp.action_map.quit, vec![Btn::Select]);
        assert_eq!(gp.action_map.confirm, vec![Btn::B, Btn::A]);
    }

    #[test]
    fn idle_pad_reports_nothing() {
        let mut gp = GamepadState::new();
        gp.dpad = [BtnState::default(); 4];
        gp.stick = [BtnState::default(); 4];
        assert_eq!(gp.dir_held(), None);
        assert_eq!(gp.dir_just_pressed(), None);
        assert!(!gp.reset_pressed());
    }

    #[test]
    fn disconnect_releases_everything() {
        let mut gp = GamepadState::new();
        gp.dpad[dir_index(MoveDir::Left)] = BtnState { held: true, just_pressed: true };
        gp.buttons[btn_index(Btn::Start)] = BtnState { held: true, just_pressed: true };
        gp.stick_x = -1.0;
        gp.release_all();
        assert_eq!(gp.dir_held(), None);
        assert!(!gp.reset_pressed());
        assert_eq!(gp.stick_x, 0.0);
    }

    #[test]
    fn dpad_state_maps_to_direction() {
        let mut gp = GamepadState::new();
        gp.dpad[dir_index(MoveDir::Up)] = BtnState { held: true, just_pressed: true };
        assert_eq!(gp.dir_held(), Some(MoveDir::Up));
        assert_eq!(gp.dir_just_pressed(), Some(MoveDir::Up));
        gp.clear_just_pressed();
        assert_eq!(gp.dir_just_pressed(), None);
        assert_eq!(gp.dir_held(), Some(MoveDir::Up));
    }

    #[test]
    fn repeater_fires_on_press_then_per_interval() {
        let mut rep = MoveRepeater::new(Duration::from_millis(60));
        let t0 = Instant::now();
        assert_eq!(rep.next(Some(MoveDir::Left), Some(MoveDir::Left), t0), Some(MoveDir::Left));
        assert_eq!(rep.next(None, Some(MoveDir::Left), t0 + Duration::from_millis(30)), None);
        assert_eq!(
            rep.next(None, Some(MoveDir::Left), t0 + Duration::from_millis(60)),
            Some(MoveDir::Left)
        );
        assert_eq!(rep.next(None, None, t0 + Duration::from_millis(200)), None);
    }

    #[test]
    fn repeater_switches_direction_immediately() {
        let mut rep = MoveRepeater::new(Duration::from_millis(60));
        let t0 = Instant::now();
        rep.next(Some(MoveDir::Left), Some(MoveDir::Left), t0);
        assert_eq!(
            rep.next(None, Some(MoveDir::Down), t0 + Duration::from_millis(10)),
            Some(MoveDir::Down)
        );
    }
}
