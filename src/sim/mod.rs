//! Simulation module
//!
//! All gameplay logic lives here:
//! - Fixed timestep only (see [`FixedStepper`])
//! - Physics behind the [`PhysicsWorld`] port
//! - Contacts routed after each world step, never from inside it
//! - No rendering or platform dependencies

pub mod ball;
pub mod launcher;
pub mod physics;
pub mod platform;
pub mod sensor;
pub mod simulation;
pub mod state;

pub use ball::{Ball, BodyLink};
pub use launcher::{Launcher, LauncherState};
pub use physics::{
    BodyDesc, BodyHandle, BodyKind, Contact, Material, PhysicsWorld, RapierWorld, Shape,
};
pub use platform::Platform;
pub use sensor::{DeathTrap, Goal, SensorRegion, Treasure};
pub use simulation::{FixedStepper, SimInput, Simulation};
pub use state::{LevelScoreData, SimState, SimulationEvent};
