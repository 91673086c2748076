//! Tank Battle headless driver
//!
//! Runs a seeded game with a scripted player and logs every event.
//!
//! Usage: `tank-battle [--seed N] [--ticks N] [--tuning path.json]`

use std::process::ExitCode;

use tank_battle::Tuning;
use tank_battle::consts::SIM_DT_MS;
use tank_battle::sim::{GameEvent, GamePhase, GameState, Key, tick};

struct Args {
    seed: u64,
    ticks: u64,
    tuning: Option<String>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            seed: 12345,
            ticks: 60 * 60 * 3,
            tuning: None,
        }
    }
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(flag) = iter.next() {
        let mut value = || iter.next().ok_or_else(|| format!("missing value for {flag}"));
        match flag.as_str() {
            "--seed" => args.seed = value()?.parse().map_err(|e| format!("bad --seed: {e}"))?,
            "--ticks" => args.ticks = value()?.parse().map_err(|e| format!("bad --ticks: {e}"))?,
            "--tuning" => args.tuning = Some(value()?),
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(args)
}

/// Patrol pattern: drive, turn, sweep the turret, keep firing
fn scripted_input(tick: u64) -> impl Fn(Key) -> bool {
    let phase = tick % 120;
    let sweep = (tick / 60) % 2 == 0;
    move |key| match key {
        Key::Forward => phase < 90,
        Key::RotateLeft => phase >= 90,
        Key::TurretLeft => sweep,
        Key::TurretRight => !sweep,
        Key::Fire => true,
        Key::Backward | Key::RotateRight => false,
    }
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::TankUpdated { .. } | GameEvent::BulletFired { .. } | GameEvent::BulletImpact { .. } => {
            log::trace!("{:?}", event)
        }
        GameEvent::Message { text, .. } => log::info!("Message: {}", text),
        GameEvent::GameOver { won } => log::info!("Game over, won: {}", won),
        _ => log::debug!("{:?}", event),
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("usage: tank-battle [--seed N] [--ticks N] [--tuning path.json]");
            return ExitCode::FAILURE;
        }
    };

    let tuning = match &args.tuning {
        Some(path) => match Tuning::load(path) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Invalid tuning file {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => Tuning::default(),
    };

    log::info!("Tank Battle (headless) starting with seed {}", args.seed);
    let mut state = GameState::new(args.seed, tuning);
    let mut sink = |event: &GameEvent| log_event(event);
    state.drain_events(&mut sink);

    for n in 0..args.ticks {
        tick(&mut state, &scripted_input(n), SIM_DT_MS);
        state.drain_events(&mut sink);
        if state.phase.is_over() {
            break;
        }
    }

    let outcome = match state.phase {
        GamePhase::Won => "won",
        GamePhase::Lost => "lost",
        GamePhase::Running => "unfinished",
    };
    println!(
        "seed {} | {} ticks | score {} | lives {} | enemies remaining {} | {}",
        state.seed, state.time_ticks, state.score, state.lives, state.remaining_enemies, outcome
    );
    ExitCode::SUCCESS
}
