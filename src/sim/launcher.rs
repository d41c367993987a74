//! The launcher: aim, charge and release the ball
//!
//! The launcher never owns the ball. While a ball is loaded it remembers the
//! ball's body handle and keeps the ball sitting on its tip.

use glam::Vec2;

use super::ball::Ball;
use super::physics::{BodyHandle, PhysicsWorld};
use super::platform::validate_position;
use crate::aim_direction;
use crate::consts::*;
use crate::error::{SimError, SimResult};

/// Launcher state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LauncherState {
    /// No ball loaded yet
    Idle,
    /// Ball loaded, angle and magnitude adjustable
    Aiming,
    /// Ball released; waits for the next ball
    Fired,
}

#[derive(Debug, Clone)]
pub struct Launcher {
    /// Pivot point (pixels)
    position: Vec2,
    /// Radians, 0 = right, π = left
    angle: f32,
    /// Launch speed (m/s)
    magnitude: f32,
    state: LauncherState,
    loaded: Option<BodyHandle>,
}

impl Launcher {
    pub fn new(position: Vec2) -> SimResult<Self> {
        validate_position("launcher", position)?;
        Ok(Self {
            position,
            angle: LAUNCHER_DEFAULT_ANGLE,
            magnitude: LAUNCHER_DEFAULT_MAGNITUDE,
            state: LauncherState::Idle,
            loaded: None,
        })
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn magnitude(&self) -> f32 {
        self.magnitude
    }

    pub fn state(&self) -> LauncherState {
        self.state
    }

    #[inline]
    pub fn is_aiming(&self) -> bool {
        self.state == LauncherState::Aiming
    }

    /// Where a loaded ball sits (pixels)
    pub fn tip(&self) -> Vec2 {
        self.position + aim_direction(self.angle) * LAUNCHER_BARREL_LENGTH
    }

    /// Launch velocity for the current aim (m/s)
    pub fn launch_velocity(&self) -> Vec2 {
        aim_direction(self.angle) * self.magnitude
    }

    /// Rotate while aiming, clamped to [0, π]
    pub fn adjust_angle(&mut self, delta: f32) {
        if !self.is_aiming() || !delta.is_finite() {
            return;
        }
        self.angle = (self.angle + delta).clamp(LAUNCHER_MIN_ANGLE, LAUNCHER_MAX_ANGLE);
    }

    /// Change power while aiming, clamped to [5, 15]
    pub fn adjust_magnitude(&mut self, delta: f32) {
        if !self.is_aiming() || !delta.is_finite() {
            return;
        }
        self.magnitude =
            (self.magnitude + delta).clamp(LAUNCHER_MIN_MAGNITUDE, LAUNCHER_MAX_MAGNITUDE);
    }

    /// Take hold of `ball` and start aiming
    pub fn load_ball(&mut self, ball: &Ball) -> SimResult<()> {
        if self.loaded.is_some() {
            return Err(SimError::BallAlreadyLoaded);
        }
        let handle = ball.handle().ok_or(SimError::BodyNotInitialized("ball"))?;
        self.loaded = Some(handle);
        self.state = LauncherState::Aiming;
        Ok(())
    }

    pub fn loaded_ball(&self) -> Option<BodyHandle> {
        self.loaded
    }

    /// Release the loaded ball. Returns the launch velocity, or `None` if not aiming.
    pub fn launch_ball<W: PhysicsWorld>(
        &mut self,
        ball: &mut Ball,
        world: &mut W,
    ) -> SimResult<Option<Vec2>> {
        if !self.is_aiming() {
            return Ok(None);
        }
        let velocity = self.launch_velocity();
        ball.launch(world, velocity)?;
        self.loaded = None;
        self.state = LauncherState::Fired;
        Ok(Some(velocity))
    }

    /// Per-frame: keep a loaded ball on the tip
    pub fn update<W: PhysicsWorld>(&self, ball: &mut Ball, world: &mut W) {
        if self.is_aiming() && self.loaded.is_some() && self.loaded == ball.handle() {
            ball.set_position(world, self.tip());
        }
    }
}
