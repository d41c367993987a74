//! Bounce Puzzle headless runner
//!
//! Loads a level, optionally validates its layout, and plays shots through
//! the simulation without a renderer.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use bounce_puzzle::consts::*;
use bounce_puzzle::level::{EditableLevel, Overlap, load_level};
use bounce_puzzle::sim::{FixedStepper, SimInput, SimState, Simulation, SimulationEvent};
use bounce_puzzle::{ScoreBook, SimulationConfig};

/// Longest a single shot may run before the runner gives up on it (seconds)
const MAX_SHOT_SECONDS: f32 = 120.0;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Level file (XML)
    level: PathBuf,
    /// Simulation tuning (JSON)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Only check the layout for overlapping placements
    #[arg(long)]
    check: bool,
    /// Shot as ANGLE:MAGNITUDE (degrees, m/s); repeat for several balls
    #[arg(short, long = "shot", value_name = "DEG:SPEED")]
    shots: Vec<ShotArg>,
    /// Fill remaining balls with random shots
    #[arg(long)]
    random: bool,
    /// Seed for random shots
    #[arg(long, default_value_t = 12345)]
    seed: u64,
    /// Record a completed run in this score file (JSON)
    #[arg(long, value_name = "PATH")]
    scores: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy)]
struct ShotArg {
    /// Radians
    angle: f32,
    magnitude: f32,
}

impl FromStr for ShotArg {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (angle, magnitude) = value
            .split_once(':')
            .ok_or_else(|| "expected format DEG:SPEED".to_string())?;
        let angle = angle
            .trim()
            .parse::<f32>()
            .map_err(|error| format!("invalid angle: {error}"))?;
        let magnitude = magnitude
            .trim()
            .parse::<f32>()
            .map_err(|error| format!("invalid speed: {error}"))?;
        Ok(Self {
            angle: angle.to_radians(),
            magnitude,
        })
    }
}

fn describe(overlap: Overlap) -> String {
    match overlap {
        Overlap::Platforms { first, second } => {
            format!("platforms {first} and {second} overlap")
        }
        Overlap::LauncherZone { platform } => {
            format!("platform {platform} is inside the launcher zone")
        }
        Overlap::DeathTrap { trap, platform } => {
            format!("death trap {trap} overlaps platform {platform}")
        }
    }
}

/// Turn the launcher to `shot` and fire
fn fire(sim: &mut Simulation, shot: ShotArg) -> Result<()> {
    let launcher = sim.launcher();
    let input = SimInput {
        angle_delta: shot.angle - launcher.angle(),
        magnitude_delta: shot.magnitude - launcher.magnitude(),
        confirm: true,
        restart: false,
    };
    sim.apply_input(&input)?;
    log::info!(
        "Fired at {:.1} deg, {:.1} m/s",
        sim.launcher().angle().to_degrees(),
        sim.launcher().magnitude()
    );
    Ok(())
}

/// Step until the ball comes to rest or the level ends
fn run_shot(sim: &mut Simulation, stepper: &mut FixedStepper) -> Result<()> {
    let mut elapsed = 0.0;
    while sim.ball_in_flight() && sim.state() == SimState::Active {
        stepper.advance(sim, SIM_DT)?;
        elapsed += SIM_DT;
        if elapsed > MAX_SHOT_SECONDS {
            log::warn!("Ball still moving after {MAX_SHOT_SECONDS}s, ending the attempt");
            sim.handle_confirm()?;
        }
    }
    for event in sim.drain_events() {
        match event {
            SimulationEvent::TreasureCollected { index } => {
                println!("  treasure {index} collected")
            }
            SimulationEvent::AttemptEnded { attempts_left } => {
                println!("  attempt ended, {attempts_left} balls left")
            }
            other => log::debug!("{other:?}"),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = CliArgs::parse();

    let config = match &args.config {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    let loaded = load_level(&args.level)
        .with_context(|| format!("loading level {}", args.level.display()))?;
    for warning in &loaded.warnings {
        println!("warning: {warning}");
    }
    let level = loaded.level;

    let editable = EditableLevel::new(level.clone(), DEFAULT_ADDITIONS);
    if let Some(overlap) = editable.first_collision() {
        if args.check {
            bail!("layout is invalid: {}", describe(overlap));
        }
        println!("warning: {}", describe(overlap));
    }
    if args.check {
        println!("'{}' is valid", level.name);
        return Ok(());
    }

    let mut sim: Simulation = Simulation::new(&level, config);
    sim.init_world()?;
    let mut stepper = FixedStepper::new();
    let mut rng = Pcg32::seed_from_u64(args.seed);
    let mut shots = args.shots.iter().copied();

    println!("Playing '{}' with {} balls", level.name, sim.attempts_left());
    while sim.state() == SimState::Active {
        let shot = match shots.next() {
            Some(shot) => shot,
            None if args.random => ShotArg {
                angle: rng.random_range(LAUNCHER_MIN_ANGLE..LAUNCHER_MAX_ANGLE),
                magnitude: rng.random_range(LAUNCHER_MIN_MAGNITUDE..LAUNCHER_MAX_MAGNITUDE),
            },
            None => break,
        };
        fire(&mut sim, shot)?;
        run_shot(&mut sim, &mut stepper)?;
    }

    match sim.state() {
        SimState::Completed => {
            let Some(score) = sim.score().cloned() else {
                bail!("level completed without a score");
            };
            println!(
                "Completed in {}s (par {}): {}/{} treasures, {} balls left, score {}",
                score.time_spent,
                score.par_time,
                score.treasures_collected,
                score.treasures_in_level,
                score.balls_left,
                score.score
            );
            if let Some(path) = &args.scores {
                let mut book = ScoreBook::load(path);
                if book.record(&level.name, &score) {
                    println!("New best!");
                    book.save(path)?;
                }
            }
        }
        SimState::Failed => println!("Failed: out of balls"),
        SimState::Active => println!(
            "Stopped with {} balls left ({:.1}s played)",
            sim.attempts_left(),
            sim.elapsed_time()
        ),
    }
    Ok(())
}
