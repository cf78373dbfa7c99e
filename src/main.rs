/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::time::Instant;

use config::GameConfig;
use sim::world::{GameState, Phase};
use ui::frame::{FrameAction, FrameGate, FrameTicker};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::{self, SoundEngine};
use ui::viewport::ViewportSizer;

fn main() {
    let config = GameConfig::load();
    init_logging(&config);

    let mut renderer = Renderer::new();
    let enhanced_keys = match renderer.init() {
        Ok(enhanced) => enhanced,
        Err(e) => {
            let _ = renderer.cleanup();
            eprintln!("Terminal init failed: {e}");
            return;
        }
    };

    let mut sizer = ViewportSizer::new(config.grid.clone());
    let (tw, th) = renderer.size();
    let (w, h) = sizer.initial(tw, th);
    let mut world = GameState::new(w, h).with_enemy_move_delay(config.timing.enemy_move_delay);

    let sound = if config.sound { SoundEngine::new() } else { None };

    let result = game_loop(&mut world, &mut renderer, &mut sizer, sound.as_ref(), &config, enhanced_keys);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("game loop aborted: {e}");
        eprintln!("Game error: {e}");
    }

    let outcome = match world.phase() {
        Phase::Won => "You won!",
        Phase::Lost => "Caught by the fox.",
        Phase::Running => "Left mid-game.",
    };
    println!();
    println!("Thanks for playing Mower! {outcome}");
    println!(
        "Total: {}% ({}/{})",
        world.percent_mowed(), world.mowed_count(), world.total_cells(),
    );
}

/// File logging only: the terminal is in raw mode on the alternate screen.
/// `RUST_LOG` overrides the configured level.
fn init_logging(config: &GameConfig) {
    let path = match &config.log_file {
        Some(p) => p,
        None => return,
    };
    let file = match File::create(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: could not open log file {}: {e}", path.display());
            return;
        }
    };
    let env = env_logger::Env::default().default_filter_or(config.log_level.as_str());
    if let Err(e) = env_logger::Builder::from_env(env)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
    {
        eprintln!("Warning: logger init failed: {e}");
    }
}

fn game_loop(
    world: &mut GameState,
    renderer: &mut Renderer,
    sizer: &mut ViewportSizer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    enhanced_keys: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new(config.timing.key_hold);
    kb.honor_release = enhanced_keys;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    log::info!(
        "starting {}x{} field, key releases {}, gamepad {}",
        world.width(), world.height(),
        if enhanced_keys { "reported" } else { "timed out" },
        if gp.connected { "connected" } else { "not detected" },
    );

    let mut ticker = FrameTicker::new(config.timing.frame, Instant::now());
    let mut gate = FrameGate::new();

    loop {
        let now = ticker.wait();

        kb.drain_events(world);
        gp.update(world);

        if kb.quit_pressed() || gp.quit_pressed() {
            break;
        }

        if let Some((tw, th)) = kb.resized {
            renderer.resize(tw, th);
            sizer.apply(tw, th, world);
            gate.invalidate();
        }

        if kb.restart_pressed() || gp.restart_pressed() {
            world.start_new_game();
        }

        match gate.next(world.is_running()) {
            FrameAction::Advance => {
                let events = world.advance(now);
                sound::process_events(sound, &events, world.mowed_count(), world.total_cells());
                renderer.render(world)?;
            }
            FrameAction::Paint => renderer.render(world)?,
            FrameAction::Idle => {}
        }
    }

    Ok(())
}
