//! Bounce Puzzle - simulation core for a 2D launcher/bounce puzzle game
//!
//! Core modules:
//! - `sim`: Physics-backed simulation (bodies, launcher, step loop, win/loss state)
//! - `level`: Level templates, editor validation and the XML level format
//! - `config`: Data-driven simulation tuning
//! - `scores`: Best results per level

pub mod config;
pub mod error;
pub mod level;
pub mod scores;
pub mod sim;
pub mod units;

pub use config::SimulationConfig;
pub use error::{ConfigError, LevelError, ScoreError, SimError};
pub use level::{EditableLevel, Level};
pub use scores::ScoreBook;
pub use sim::{LevelScoreData, SimInput, SimState, Simulation, SimulationEvent};
pub use units::UnitConverter;

/// Game configuration constants
pub mod consts {
    use glam::Vec2;

    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Display units per simulation meter
    pub const PIXELS_PER_METER: f32 = 100.0;

    /// Playfield dimensions (pixels)
    pub const FIELD_WIDTH: f32 = 1280.0;
    pub const FIELD_HEIGHT: f32 = 720.0;
    pub const WALL_THICKNESS: f32 = 20.0;
    /// Downward gravity (m/s², y grows downward on screen)
    pub const GRAVITY: f32 = 9.81;

    /// Anything placed further than this from the origin is rejected (pixels)
    pub const WORLD_LIMIT: f32 = 100_000.0;

    /// Ball defaults
    pub const BALL_DIAMETER: f32 = 30.0;

    /// Sensor footprints (pixels)
    pub const GOAL_SIZE: Vec2 = Vec2::new(64.0, 64.0);
    pub const TREASURE_SIZE: Vec2 = Vec2::new(32.0, 32.0);
    pub const DEATH_TRAP_SIZE: Vec2 = Vec2::new(64.0, 32.0);

    /// Launcher limits
    pub const LAUNCHER_MIN_ANGLE: f32 = 0.0;
    pub const LAUNCHER_MAX_ANGLE: f32 = std::f32::consts::PI;
    pub const LAUNCHER_MIN_MAGNITUDE: f32 = 5.0;
    pub const LAUNCHER_MAX_MAGNITUDE: f32 = 15.0;
    pub const LAUNCHER_DEFAULT_ANGLE: f32 = std::f32::consts::FRAC_PI_4;
    pub const LAUNCHER_DEFAULT_MAGNITUDE: f32 = 10.0;
    /// Distance from the launcher pivot to where the ball sits (pixels)
    pub const LAUNCHER_BARREL_LENGTH: f32 = 40.0;

    /// Editor no-build zone around the launcher
    pub const LAUNCHER_ZONE_OFFSET: Vec2 = Vec2::new(100.0, 100.0);
    pub const LAUNCHER_ZONE_SIZE: Vec2 = Vec2::new(200.0, 100.0);

    /// Level defaults when the level file does not say
    pub const DEFAULT_ATTEMPTS: u32 = 3;
    pub const DEFAULT_PAR_TIME: u32 = 60;
    pub const DEFAULT_ADDITIONS: usize = 3;

    /// Scoring
    pub const TREASURE_POINTS: u32 = 500;
    pub const BALL_POINTS: u32 = 150;
    pub const PAR_BONUS: u32 = 100;
    pub const COMPLETION_BONUS: u32 = 42;
}

/// Direction for a launcher angle (0 = right, π/2 = up on screen, π = left)
#[inline]
pub fn aim_direction(angle: f32) -> glam::Vec2 {
    glam::Vec2::new((-angle).cos(), (-angle).sin())
}
