/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// Pixel classification thresholds are not configurable;
/// only geometry, pacing and front-end bindings are.

use serde::Deserialize;
use std::path::PathBuf;

use crate::sim::progress::MazeIndex;
use crate::sim::session::SessionConfig;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub maze: MazeConfig,
    pub timing: TimingConfig,
    pub gamepad: GamepadConfig,
    pub mazes_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct MazeConfig {
    pub canvas_size: u32,
    pub maze_count: MazeIndex,
    pub step: i32,
    pub probe_offset: u32,
    pub unlock_all: bool,
    pub reward_token: String,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub frame_ms: u64,
    pub pad_repeat_ms: u64,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub reset: Vec<String>,
    pub quit: Vec<String>,
    pub confirm: Vec<String>,
}

impl MazeConfig {
    pub fn session(&self) -> SessionConfig {
        SessionConfig { step: self.step, probe_offset: self.probe_offset }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    maze: TomlMaze,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlMaze {
    #[serde(default = "default_canvas_size")]
    canvas_size: u32,
    #[serde(default = "default_maze_count")]
    maze_count: MazeIndex,
    #[serde(default = "default_step")]
    step: i32,
    #[serde(default = "default_probe_offset")]
    probe_offset: u32,
    #[serde(default)]
    unlock_all: bool,
    #[serde(default = "default_reward_token")]
    reward_token: String,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_pad_repeat")]
    pad_repeat_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_reset")]
    reset: Vec<String>,
    #[serde(default = "default_quit")]
    quit: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_mazes_dir")]
    mazes_dir: String,
}

// ── Defaults ──

fn default_canvas_size() -> u32 { 800 }
fn default_maze_count() -> MazeIndex { 6 }
fn default_step() -> i32 { 5 }
fn default_probe_offset() -> u32 { 2 }
fn default_reward_token() -> String { "I<3u4ever".into() }
fn default_frame_ms() -> u64 { 16 }
fn default_pad_repeat() -> u64 { 60 }

fn default_reset() -> Vec<String> { vec!["Start".into()] }
fn default_quit() -> Vec<String> { vec!["Select".into()] }
fn default_confirm() -> Vec<String> { vec!["A".into()] }
fn default_mazes_dir() -> String { "mazes".into() }

impl Default for TomlMaze {
    fn default() -> Self {
        TomlMaze {
            canvas_size: default_canvas_size(),
            maze_count: default_maze_count(),
            step: default_step(),
            probe_offset: default_probe_offset(),
            unlock_all: false,
            reward_token: default_reward_token(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            frame_ms: default_frame_ms(),
            pad_repeat_ms: default_pad_repeat(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            reset: default_reset(),
            quit: default_quit(),
            confirm: default_confirm(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            mazes_dir: default_mazes_dir(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::from_toml(toml_cfg, &search_dirs)
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Resolve mazes directory
        let mazes_dir_str = &toml_cfg.general.mazes_dir;
        let mazes_dir = if PathBuf::from(mazes_dir_str).is_absolute() {
            PathBuf::from(mazes_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(mazes_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(mazes_dir_str))
        };

        let m = toml_cfg.maze;
        let canvas_size = m.canvas_size.max(100);
        let max_step = i32::try_from(canvas_size).unwrap_or(i32::MAX);
        if m.canvas_size < 100 || m.maze_count == 0 || m.step <= 0 || m.step > max_step {
            log::warn!(
                "config.toml: canvas_size={} maze_count={} step={} out of range, clamping",
                m.canvas_size, m.maze_count, m.step
            );
        }

        GameConfig {
            maze: MazeConfig {
                canvas_size,
                maze_count: m.maze_count.max(1),
                step: m.step.clamp(1, max_step),
                probe_offset: m.probe_offset,
                unlock_all: m.unlock_all,
                reward_token: m.reward_token,
            },
            timing: TimingConfig {
                frame_ms: toml_cfg.timing.frame_ms.max(1),
                pad_repeat_ms: toml_cfg.timing.pad_repeat_ms,
            },
            gamepad: GamepadConfig {
                reset: toml_cfg.gamepad.reset,
                quit: toml_cfg.gamepad.quit,
                confirm: toml_cfg.gamepad.confirm,
            },
            mazes_dir,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + user data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/pixelmaze)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/pixelmaze");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => return parse_toml(&text),
                Err(e) => {
                    log::warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

fn parse_toml(text: &str) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            log::warn!("config.toml parse error, using defaults: {e}");
            TomlConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_text(text: &str) -> GameConfig {
        GameConfig::from_toml(parse_toml(text), &[])
    }

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = from_text("");
        assert_eq!(cfg.maze.canvas_size, 800);
        assert_eq!(cfg.maze.maze_count, 6);
        assert_eq!(cfg.maze.step, 5);
        assert_eq!(cfg.maze.probe_offset, 2);
        assert!(!cfg.maze.unlock_all);
        assert_eq!(cfg.maze.reward_token, "I<3u4ever");
        assert_eq!(cfg.mazes_dir, PathBuf::from("mazes"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = from_text("[maze]\nstep = 3\nunlock_all = true\n[gamepad]\nreset = [\"Y\"]\n");
        assert_eq!(cfg.maze.step, 3);
        assert!(cfg.maze.unlock_all);
        assert_eq!(cfg.maze.maze_count, 6);
        assert_eq!(cfg.gamepad.reset, vec!["Y".to_string()]);
        assert_eq!(cfg.gamepad.quit, vec!["Select".to_string()]);
    }

    #[test]
    fn malformed_file_falls_back() {
        let cfg = from_text("[maze\nstep = ");
        assert_eq!(cfg.maze.step, 5);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let cfg = from_text("[maze]\nstep = 0\nmaze_count = 0\n");
        assert_eq!(cfg.maze.step, 1);
        assert_eq!(cfg.maze.maze_count, 1);
    }

    #[test]
    fn huge_step_is_clamped_to_canvas() {
        let cfg = from_text("[maze]\ncanvas_size = 800\nstep = 2147483647\n");
        assert_eq!(cfg.maze.step, 800);
        let cfg = from_text("[maze]\ncanvas_size = 10\nstep = 500\n");
        assert_eq!(cfg.maze.canvas_size, 100);
        assert_eq!(cfg.maze.step, 100);
    }

    #[test]
    fn session_config_follows_maze_section() {
        let cfg = from_text("[maze]\nstep = 7\nprobe_offset = 9\n");
        let s = cfg.maze.session();
        assert_eq!(s.step, 7);
        assert_eq!(s.probe_offset, 9);
    }
}
