//! Cave Runner entry point
//!
//! Headless: plays the built-in levels with a simple autopilot and logs what
//! happens. Pass a tuning JSON file as the first argument to override the
//! stock values. Run with `RUST_LOG=info` (or `debug`) to see the log.

use cave_runner::consts::{MAX_SUBSTEPS, SIM_DT};
use cave_runner::sim::{GameEvent, Level, TickInput};
use cave_runner::{HighScores, Session, Tuning};

const LEVELS: [&str; 3] = [
    include_str!("../levels/0.txt"),
    include_str!("../levels/1.txt"),
    include_str!("../levels/2.txt"),
];

/// Simulated display frame (50 Hz, deliberately off the sim rate)
const FRAME_DT: f32 = 1.0 / 50.0;
/// Give up on a level after this many frames
const MAX_FRAMES: u32 = 50 * 150;
/// Continue presses before the demo ends
const ROUNDS: u32 = 8;

fn main() {
    env_logger::init();
    log::info!("Cave Runner (headless) starting...");

    let tuning = match std::env::args().nth(1) {
        Some(path) => load_tuning(&path),
        None => Tuning::default(),
    };

    let levels = LEVELS.iter().map(|s| s.to_string()).collect();
    let mut session = match Session::new(levels, tuning, HighScores::new()) {
        Ok(session) => session,
        Err(e) => {
            log::error!("Failed to load the first level: {e}");
            std::process::exit(1);
        }
    };

    for round in 0..ROUNDS {
        let finished = play(&mut session);
        let state = &session.level().state;
        println!(
            "round {round}: level {} {} with score {}",
            session.level_index(),
            outcome(finished, &session),
            state.score
        );
        let result = if finished {
            session.continue_game()
        } else {
            session.reload_current_level()
        };
        if let Err(e) = result {
            log::error!("Failed to load a level: {e}");
            std::process::exit(1);
        }
    }

    match session.high_scores().to_json() {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Could not serialise high scores: {e}"),
    }
}

fn load_tuning(path: &str) -> Tuning {
    let loaded = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()));
    match loaded {
        Ok(tuning) => tuning,
        Err(e) => {
            log::warn!("Ignoring tuning file {path}: {e}");
            Tuning::default()
        }
    }
}

fn outcome(finished: bool, session: &Session) -> &'static str {
    let state = &session.level().state;
    if !finished {
        "abandoned"
    } else if state.reached_exit {
        "cleared"
    } else if !state.player.alive {
        "died"
    } else {
        "timed out"
    }
}

/// Fixed-step loop over simulated frames until the level is over
fn play(session: &mut Session) -> bool {
    let mut accumulator = 0.0;
    for _ in 0..MAX_FRAMES {
        accumulator += FRAME_DT.min(0.1);

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = autopilot(session.level());
            for event in session.tick(&input, SIM_DT) {
                log_event(event);
            }
            accumulator -= SIM_DT;
            substeps += 1;
        }

        if session.level().is_finished() {
            return true;
        }
    }
    false
}

/// Head for the exit, hop when stuck, shoot anything level with us
fn autopilot(level: &Level) -> TickInput {
    let state = &level.state;
    let player = &state.player;
    let toward_exit = state.exit.anchor.x - player.position.x;
    let facing = player.facing.signf();

    let enemy_ahead = state.enemies.iter().any(|e| {
        let dx = e.position.x - player.position.x;
        (e.position.y - player.position.y).abs() < 20.0 && dx * facing > 0.0 && dx.abs() < 200.0
    });

    TickInput {
        move_left: toward_exit < 0.0,
        move_right: toward_exit > 0.0,
        jump: player.is_on_ground() && player.velocity.x.abs() < 1.0,
        shoot: enemy_ahead && state.ammo > 0,
    }
}

fn log_event(event: GameEvent) {
    match event {
        GameEvent::PlayerJumped | GameEvent::ShotFired => log::trace!("{event:?}"),
        _ => log::debug!("{event:?}"),
    }
}
