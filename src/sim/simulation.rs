//! The play session: physics world, entities, step loop and win/loss rules
//!
//! The simulation is the only owner of its world. Contacts are buffered by
//! the world during a step and routed here afterwards, never from inside the
//! physics pipeline.

use std::collections::HashMap;

use glam::Vec2;

use super::ball::Ball;
use super::launcher::Launcher;
use super::physics::{BodyDesc, BodyHandle, Contact, Material, PhysicsWorld, RapierWorld, Shape};
use super::platform::Platform;
use super::sensor::{DeathTrap, Goal, Treasure};
use super::state::{LevelScoreData, SimState, SimulationEvent};
use crate::config::SimulationConfig;
use crate::consts::*;
use crate::error::{SimError, SimResult};
use crate::level::{EditableLevel, Level};
use crate::units::UnitConverter;

/// Input commands for a single frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimInput {
    /// Launcher rotation (radians)
    pub angle_delta: f32,
    /// Launcher power change (m/s)
    pub magnitude_delta: f32,
    /// Fire the ball, or give up on the ball in flight
    pub confirm: bool,
    /// Restart the level
    pub restart: bool,
}

/// What a body in the world stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyTag {
    Ball,
    Wall,
    Platform(usize),
    Goal,
    Treasure(usize),
    DeathTrap(usize),
}

pub struct Simulation<W: PhysicsWorld = RapierWorld> {
    config: SimulationConfig,
    units: UnitConverter,
    world: Option<W>,

    ball: Ball,
    launcher: Launcher,
    /// Fixed platforms first, then player-placed ones
    platforms: Vec<Platform>,
    goal: Goal,
    treasures: Vec<Treasure>,
    death_traps: Vec<DeathTrap>,
    tags: HashMap<BodyHandle, BodyTag>,

    starting_attempts: u32,
    par_time: u32,
    attempts_left: u32,
    collected_treasures: u32,
    bounces: u32,
    /// Seconds spent while Active
    elapsed_time: f32,
    state: SimState,
    score: Option<LevelScoreData>,
    /// How long the ball has been below the settle speed
    settled_for: f32,
    /// Bumped whenever an attempt ends, the level completes or restarts
    attempt: u32,

    contacts: Vec<Contact>,
    events: Vec<SimulationEvent>,
}

impl<W: PhysicsWorld> Simulation<W> {
    /// Set up a session from a level template. Bodies are created by
    /// [`Simulation::init_world`].
    pub fn new(level: &Level, config: SimulationConfig) -> Self {
        Self::from_parts(level, level.platforms.clone(), config)
    }

    /// Play an edited level: fixed platforms plus the player's placements
    pub fn from_editable(editable: &EditableLevel, config: SimulationConfig) -> Self {
        Self::from_parts(
            editable.level(),
            editable.all_platforms().cloned().collect(),
            config,
        )
    }

    fn from_parts(level: &Level, platforms: Vec<Platform>, config: SimulationConfig) -> Self {
        let launcher = level.launcher.clone();
        let ball = Ball::new(launcher.tip());
        Self {
            units: config.units(),
            config,
            world: None,
            ball,
            launcher,
            platforms,
            goal: level.goal.clone(),
            treasures: level.treasures.clone(),
            death_traps: level.death_traps.clone(),
            tags: HashMap::new(),
            starting_attempts: level.attempts,
            par_time: level.par_time,
            attempts_left: level.attempts,
            collected_treasures: 0,
            bounces: 0,
            elapsed_time: 0.0,
            state: SimState::Active,
            score: None,
            settled_for: 0.0,
            attempt: 0,
            contacts: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Boundary walls just outside the field (meters)
    fn wall_descs(&self) -> [BodyDesc; 4] {
        let size = self.config.field_size();
        let t = self.config.wall_thickness;
        let units = self.units;
        let material: Material = self.config.wall_material.into();
        let wall = |center: Vec2, half: Vec2| {
            let half = units.vec_to_meters(half);
            BodyDesc::fixed(
                Shape::Rect {
                    half_width: half.x,
                    half_height: half.y,
                },
                units.vec_to_meters(center),
            )
            .with_material(material)
        };
        let vertical = Vec2::new(t / 2.0, size.y / 2.0 + t);
        let horizontal = Vec2::new(size.x / 2.0 + t, t / 2.0);
        [
            wall(Vec2::new(-t / 2.0, size.y / 2.0), vertical),
            wall(Vec2::new(size.x + t / 2.0, size.y / 2.0), vertical),
            wall(Vec2::new(size.x / 2.0, -t / 2.0), horizontal),
            wall(Vec2::new(size.x / 2.0, size.y + t / 2.0), horizontal),
        ]
    }

    /// Build the physics world and every body, then load the ball
    pub fn init_world(&mut self) -> SimResult<()> {
        if self.world.is_some() {
            return Err(SimError::WorldAlreadyInitialized);
        }
        let mut world = W::with_gravity(self.config.gravity);
        let units = self.units;
        self.tags.clear();

        for desc in self.wall_descs() {
            let handle = world.create_body(&desc);
            self.tags.insert(handle, BodyTag::Wall);
        }

        let handle = self
            .ball
            .init_body(&mut world, units, self.config.ball_material.into())?;
        self.tags.insert(handle, BodyTag::Ball);

        let platform_material: Material = self.config.platform_material.into();
        for (i, platform) in self.platforms.iter_mut().enumerate() {
            let handle = platform.init_body(&mut world, units, platform_material)?;
            self.tags.insert(handle, BodyTag::Platform(i));
        }

        let handle = self.goal.init_body(&mut world, units)?;
        self.tags.insert(handle, BodyTag::Goal);

        for (i, treasure) in self.treasures.iter_mut().enumerate() {
            let handle = treasure.init_body(&mut world, units)?;
            self.tags.insert(handle, BodyTag::Treasure(i));
        }
        for (i, trap) in self.death_traps.iter_mut().enumerate() {
            let handle = trap.init_body(&mut world, units)?;
            self.tags.insert(handle, BodyTag::DeathTrap(i));
        }

        self.launcher.load_ball(&self.ball)?;
        self.launcher.update(&mut self.ball, &mut world);

        log::info!(
            "World ready: {} bodies, {} platforms, {} treasures, {} death traps",
            world.body_count(),
            self.platforms.len(),
            self.treasures.len(),
            self.death_traps.len()
        );
        self.world = Some(world);
        Ok(())
    }

    /// Advance the session by `dt` seconds
    pub fn step(&mut self, dt: f32) -> SimResult<()> {
        let world = self.world.as_mut().ok_or(SimError::WorldNotInitialized)?;
        if !dt.is_finite() || dt <= 0.0 {
            return Ok(());
        }

        if self.state == SimState::Active {
            self.launcher.update(&mut self.ball, world);
        }

        world.step(dt, &mut self.contacts);

        if self.state == SimState::Active {
            self.elapsed_time += dt;
        }

        // Contacts buffered before an attempt ends belong to the old ball
        let attempt = self.attempt;
        let mut contacts = std::mem::take(&mut self.contacts);
        for contact in &contacts {
            self.handle_contact(contact)?;
            if self.attempt != attempt {
                break;
            }
        }
        contacts.clear();
        self.contacts = contacts;

        self.check_settled(dt)
    }

    fn handle_contact(&mut self, contact: &Contact) -> SimResult<()> {
        let Some(ball) = self.ball.handle() else {
            return Ok(());
        };
        let Some(tag) = contact.other(ball).and_then(|other| self.tags.get(&other).copied())
        else {
            return Ok(());
        };

        if !contact.started {
            match tag {
                BodyTag::Goal => self.goal.end_contact(),
                BodyTag::Treasure(i) => {
                    if let Some(treasure) = self.treasures.get_mut(i) {
                        treasure.end_contact();
                    }
                }
                BodyTag::DeathTrap(i) => {
                    if let Some(trap) = self.death_traps.get_mut(i) {
                        trap.end_contact();
                    }
                }
                _ => {}
            }
            return Ok(());
        }

        if self.state != SimState::Active || self.launcher.is_aiming() {
            return Ok(());
        }

        match tag {
            BodyTag::Wall => {
                self.bounces += 1;
                self.events.push(SimulationEvent::WallBounced);
            }
            BodyTag::Platform(index) => {
                if let Some(platform) = self.platforms.get_mut(index) {
                    platform.on_ball_contact();
                }
                self.bounces += 1;
                self.events.push(SimulationEvent::PlatformBounced { index });
            }
            BodyTag::Goal => {
                if self.goal.begin_contact() {
                    self.complete()?;
                }
            }
            BodyTag::Treasure(index) => {
                if self.treasures.get_mut(index).is_some_and(|t| t.begin_contact()) {
                    self.collected_treasures += 1;
                    log::debug!("Treasure {index} collected");
                    self.events.push(SimulationEvent::TreasureCollected { index });
                }
            }
            BodyTag::DeathTrap(i) => {
                if self.death_traps.get_mut(i).is_some_and(|t| t.begin_contact()) {
                    log::debug!("Ball hit death trap {i}");
                    self.end_attempt()?;
                }
            }
            BodyTag::Ball => {}
        }
        Ok(())
    }

    /// End the attempt once the ball has come to rest
    fn check_settled(&mut self, dt: f32) -> SimResult<()> {
        let Some(world) = self.world.as_ref() else {
            return Ok(());
        };
        if self.state != SimState::Active
            || self.launcher.is_aiming()
            || !self.ball.in_flight(world)
        {
            self.settled_for = 0.0;
            return Ok(());
        }

        let sleeping = self.ball.handle().is_some_and(|h| world.is_sleeping(h));
        if self.ball.velocity(world).length() <= self.config.settle_speed {
            self.settled_for += dt;
        } else {
            self.settled_for = 0.0;
        }

        if sleeping || self.settled_for >= self.config.settle_time {
            log::debug!("Ball settled after {:.2}s below threshold", self.settled_for);
            self.end_attempt()?;
        }
        Ok(())
    }

    /// Fire when aiming; give up on the ball when it is in flight
    pub fn handle_confirm(&mut self) -> SimResult<()> {
        if self.state != SimState::Active {
            return Ok(());
        }
        let world = self.world.as_mut().ok_or(SimError::WorldNotInitialized)?;

        if self.launcher.is_aiming() {
            // Fire from the current aim even if no step ran since the last adjustment
            self.launcher.update(&mut self.ball, world);
            if let Some(velocity) = self.launcher.launch_ball(&mut self.ball, world)? {
                self.attempts_left = self.attempts_left.saturating_sub(1);
                self.settled_for = 0.0;
                log::debug!(
                    "Ball launched at ({:.2}, {:.2}) m/s, {} left",
                    velocity.x,
                    velocity.y,
                    self.attempts_left
                );
                self.events.push(SimulationEvent::BallLaunched {
                    attempts_left: self.attempts_left,
                });
            }
        } else if self.ball.in_flight(&*world) {
            self.end_attempt()?;
        }
        Ok(())
    }

    fn end_attempt(&mut self) -> SimResult<()> {
        let world = self.world.as_mut().ok_or(SimError::WorldNotInitialized)?;
        self.ball.stop(world)?;
        self.settled_for = 0.0;
        self.attempt = self.attempt.wrapping_add(1);

        if self.attempts_left > 0 {
            self.launcher.load_ball(&self.ball)?;
            self.launcher.update(&mut self.ball, world);
        }

        self.goal.reset();
        for treasure in &mut self.treasures {
            treasure.end_contact();
        }
        for trap in &mut self.death_traps {
            trap.reset();
        }

        self.events.push(SimulationEvent::AttemptEnded {
            attempts_left: self.attempts_left,
        });
        if self.attempts_left > 0 {
            log::info!("Attempt ended, {} balls left", self.attempts_left);
        } else {
            self.state = SimState::Failed;
            log::info!("Level failed after {:.1}s", self.elapsed_time);
            self.events.push(SimulationEvent::Failed);
        }
        Ok(())
    }

    fn complete(&mut self) -> SimResult<()> {
        if self.state != SimState::Active {
            return Ok(());
        }
        let world = self.world.as_mut().ok_or(SimError::WorldNotInitialized)?;
        self.ball.stop(world)?;
        self.state = SimState::Completed;
        self.attempt = self.attempt.wrapping_add(1);

        let score = LevelScoreData::new(
            self.collected_treasures,
            self.treasures.len() as u32,
            self.attempts_left,
            self.elapsed_time,
            self.par_time,
        );
        log::info!(
            "Level completed in {}s with {}/{} treasures, score {}",
            score.time_spent,
            score.treasures_collected,
            score.treasures_in_level,
            score.score
        );
        self.score = Some(score.clone());
        self.events.push(SimulationEvent::Completed(score));
        Ok(())
    }

    /// Back to a fresh Active session with the ball on the launcher
    pub fn restart(&mut self) -> SimResult<()> {
        self.attempts_left = self.starting_attempts;
        self.collected_treasures = 0;
        self.bounces = 0;
        self.elapsed_time = 0.0;
        self.settled_for = 0.0;
        self.state = SimState::Active;
        self.score = None;
        self.attempt = self.attempt.wrapping_add(1);

        for platform in &mut self.platforms {
            platform.reset();
        }
        for treasure in &mut self.treasures {
            treasure.reset();
        }
        for trap in &mut self.death_traps {
            trap.reset();
        }
        self.goal.reset();

        if let Some(world) = self.world.as_mut() {
            if self.launcher.loaded_ball().is_none() {
                self.ball.stop(world)?;
                self.launcher.load_ball(&self.ball)?;
            }
            self.launcher.update(&mut self.ball, world);
        }

        log::info!("Level restarted with {} balls", self.attempts_left);
        self.events.push(SimulationEvent::Restarted);
        Ok(())
    }

    /// Apply one frame of input. A restart request skips everything else.
    pub fn apply_input(&mut self, input: &SimInput) -> SimResult<()> {
        if input.restart {
            return self.restart();
        }
        if self.state == SimState::Active {
            self.launcher.adjust_angle(input.angle_delta);
            self.launcher.adjust_magnitude(input.magnitude_delta);
        }
        if input.confirm {
            self.handle_confirm()?;
        }
        Ok(())
    }

    pub fn adjust_angle(&mut self, delta: f32) {
        self.launcher.adjust_angle(delta);
    }

    pub fn adjust_magnitude(&mut self, delta: f32) {
        self.launcher.adjust_magnitude(delta);
    }

    /// Take all events emitted since the last call
    pub fn drain_events(&mut self) -> Vec<SimulationEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    pub fn attempts_left(&self) -> u32 {
        self.attempts_left
    }

    pub fn starting_attempts(&self) -> u32 {
        self.starting_attempts
    }

    pub fn collected_treasures(&self) -> u32 {
        self.collected_treasures
    }

    /// Wall and platform contacts since the last restart
    pub fn bounces(&self) -> u32 {
        self.bounces
    }

    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    pub fn par_time(&self) -> u32 {
        self.par_time
    }

    /// Result of the completed level, if any
    pub fn score(&self) -> Option<&LevelScoreData> {
        self.score.as_ref()
    }

    /// Ball center (pixels)
    pub fn ball_position(&self) -> Vec2 {
        match &self.world {
            Some(world) => self.ball.position(world),
            None => self.launcher.tip(),
        }
    }

    pub fn ball_in_flight(&self) -> bool {
        self.world
            .as_ref()
            .is_some_and(|world| self.ball.in_flight(world))
    }

    pub fn launcher(&self) -> &Launcher {
        &self.launcher
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn goal(&self) -> &Goal {
        &self.goal
    }

    pub fn treasures(&self) -> &[Treasure] {
        &self.treasures
    }

    pub fn death_traps(&self) -> &[DeathTrap] {
        &self.death_traps
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn units(&self) -> UnitConverter {
        self.units
    }

    pub fn world(&self) -> Option<&W> {
        self.world.as_ref()
    }

    pub fn world_mut(&mut self) -> Option<&mut W> {
        self.world.as_mut()
    }
}

/// Runs whole `SIM_DT` steps for variable-length frames
#[derive(Debug, Clone, Default)]
pub struct FixedStepper {
    accumulator: f32,
}

impl FixedStepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate `frame_dt` seconds (capped at 0.1) and step the simulation
    /// at most `MAX_SUBSTEPS` times. Returns the number of steps taken.
    pub fn advance<W: PhysicsWorld>(
        &mut self,
        sim: &mut Simulation<W>,
        frame_dt: f32,
    ) -> SimResult<u32> {
        let dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, 0.1)
        } else {
            0.0
        };
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            sim.step(SIM_DT)?;
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        Ok(substeps)
    }

    /// Leftover fraction of a step, for render interpolation
    pub fn alpha(&self) -> f32 {
        self.accumulator / SIM_DT
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
