/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::File;
use std::time::{Duration, Instant};

use config::GameConfig;
use sim::event::GameEvent;
use sim::loader::{AssetLoader, DirSource};
use sim::world::{Command, World};
use ui::gamepad::{GamepadState, MoveRepeater};
use ui::input::{Action, InputState};
use ui::renderer::Renderer;

/// Log filter, e.g. `PIXELMAZE_LOG=debug`.
const LOG_ENV: &str = "PIXELMAZE_LOG";
/// Log destination; the terminal belongs to the renderer.
const LOG_FILE_ENV: &str = "PIXELMAZE_LOG_FILE";

fn main() {
    init_logging();

    let config = GameConfig::load();
    log::info!("mazes from {}", config.mazes_dir.display());

    let source = DirSource::new(&config.mazes_dir, config.maze.canvas_size);
    let mut loader = match AssetLoader::spawn(source) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Could not start maze loader: {e}");
            return;
        }
    };

    let mut world = World::new(&config.maze);
    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut world, &mut renderer, &mut loader, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("game loop failed: {e}");
        eprintln!("Game error: {e}");
    }

    let progress = world.progress.state();
    println!();
    println!("Thanks for playing Pixel Maze!");
    println!("Mazes unlocked: {}/{}", progress.highest_unlocked, world.progress.max_index());
}

/// File-backed logger. Silently disabled if the file cannot be created.
fn init_logging() {
    let path = std::env::var(LOG_FILE_ENV).unwrap_or_else(|_| "pixelmaze.log".to_string());
    let env = env_logger::Env::default().filter_or(LOG_ENV, "info");
    let mut builder = env_logger::Builder::from_env(env);
    match File::create(&path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(_) => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    let _ = builder.try_init();
}

fn game_loop(
    world: &mut World,
    renderer: &mut Renderer,
    loader: &mut AssetLoader,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut pad_repeat = MoveRepeater::new(Duration::from_millis(config.timing.pad_repeat_ms));
    let frame_sleep = Duration::from_millis(config.timing.frame_ms);

    let events = world.start();
    dispatch(loader, &events);

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || gp.quit_pressed() {
            break;
        }

        // Keyboard first (arrival order), then the pad.
        let mut commands = Vec::new();
        for action in kb.actions() {
            match action {
                Action::Quit => return Ok(()),
                Action::Command(cmd) => commands.push(cmd),
            }
        }
        if gp.reset_pressed() {
            commands.push(Command::Reset);
        }
        if gp.confirm_pressed() {
            commands.push(Command::DismissReveal);
        }
        if let Some(dir) = pad_repeat.next(gp.dir_just_pressed(), gp.dir_held(), Instant::now()) {
            commands.push(Command::Move(dir));
        }

        for cmd in commands {
            let events = world.handle(cmd);
            dispatch(loader, &events);
        }

        for loaded in loader.poll() {
            let events = world.finish_load(loaded);
            dispatch(loader, &events);
        }

        world.tick();
        renderer.render(world)?;
        std::thread::sleep(frame_sleep);
    }

    Ok(())
}

/// Forward load requests to the worker and keep an event trail in the log.
fn dispatch(loader: &mut AssetLoader, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::LoadRequested { ticket, index } => loader.request(*ticket, *index),
            GameEvent::LoadFailed { index, reason } => log::warn!("maze {index} unavailable: {reason}"),
            GameEvent::MazeLoaded { index, start, radius } => {
                log::debug!("maze {index} ready, start {},{} radius {radius}", start.x, start.y);
            }
            GameEvent::MarkerFallback { index } => log::debug!("maze {index} uses the default start"),
            GameEvent::Moved { to } => log::trace!("moved to {},{}", to.x, to.y),
            GameEvent::Blocked { at } => log::trace!("blocked at {},{}", at.x, at.y),
            GameEvent::ExitReached { index } => log::debug!("exit reached in maze {index}"),
            GameEvent::MazeUnlocked { index } => log::debug!("maze {index} now playable"),
            GameEvent::LockedMaze { requested } => log::debug!("rejected locked maze {requested}"),
            GameEvent::Reset => log::debug!("player reset"),
            GameEvent::AllComplete { token } => log::info!("reward revealed ({} chars)", token.len()),
        }
    }
}
