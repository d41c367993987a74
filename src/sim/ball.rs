//! The ball
//!
//! Constructed as plain data, then given a kinematic body by `init_body`. The
//! launcher repositions it while kinematic; `launch` hands it to the solver.

use glam::Vec2;

use super::physics::{BodyDesc, BodyHandle, BodyKind, Material, PhysicsWorld, Shape};
use crate::consts::BALL_DIAMETER;
use crate::error::{SimError, SimResult};
use crate::units::UnitConverter;

/// Link between an entity and its body in the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyLink {
    pub handle: BodyHandle,
    pub units: UnitConverter,
}

#[derive(Debug, Clone)]
pub struct Ball {
    /// Center position (pixels) used until the body exists
    spawn: Vec2,
    pub diameter: f32,
    body: Option<BodyLink>,
}

impl Default for Ball {
    fn default() -> Self {
        Self::new(Vec2::ZERO)
    }
}

impl Ball {
    pub fn new(center: Vec2) -> Self {
        Self {
            spawn: center,
            diameter: BALL_DIAMETER,
            body: None,
        }
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.diameter / 2.0
    }

    pub fn handle(&self) -> Option<BodyHandle> {
        self.body.map(|b| b.handle)
    }

    fn link(&self) -> SimResult<BodyLink> {
        self.body.ok_or(SimError::BodyNotInitialized("ball"))
    }

    /// Create the (kinematic) body
    pub fn init_body<W: PhysicsWorld>(
        &mut self,
        world: &mut W,
        units: UnitConverter,
        material: Material,
    ) -> SimResult<BodyHandle> {
        if self.body.is_some() {
            return Err(SimError::BodyAlreadyInitialized("ball"));
        }
        let desc = BodyDesc::kinematic(
            Shape::Circle {
                radius: units.to_meters(self.radius()),
            },
            units.vec_to_meters(self.spawn),
        )
        .with_material(material)
        .with_ccd(true);
        let handle = world.create_body(&desc);
        self.body = Some(BodyLink { handle, units });
        Ok(handle)
    }

    /// Center position (pixels)
    pub fn position<W: PhysicsWorld>(&self, world: &W) -> Vec2 {
        match self.body {
            Some(link) => link.units.vec_to_pixels(world.position(link.handle)),
            None => self.spawn,
        }
    }

    /// Move the ball (pixels). Before `init_body` this only moves the spawn point.
    pub fn set_position<W: PhysicsWorld>(&mut self, world: &mut W, center: Vec2) {
        self.spawn = center;
        if let Some(link) = self.body {
            world.set_position(link.handle, link.units.vec_to_meters(center));
        }
    }

    /// Linear velocity (m/s)
    pub fn velocity<W: PhysicsWorld>(&self, world: &W) -> Vec2 {
        self.body
            .map(|link| world.velocity(link.handle))
            .unwrap_or(Vec2::ZERO)
    }

    /// Whether the solver is moving the ball
    pub fn in_flight<W: PhysicsWorld>(&self, world: &W) -> bool {
        self.body
            .and_then(|link| world.kind(link.handle))
            .is_some_and(|kind| kind == BodyKind::Dynamic)
    }

    /// Release the ball with `velocity` (m/s). The ball must be stationary.
    pub fn launch<W: PhysicsWorld>(&mut self, world: &mut W, velocity: Vec2) -> SimResult<()> {
        let link = self.link()?;
        if world.kind(link.handle) != Some(BodyKind::Kinematic) {
            return Err(SimError::BallInFlight);
        }
        world.set_kind(link.handle, BodyKind::Dynamic);
        world.set_velocity(link.handle, velocity);
        Ok(())
    }

    /// Freeze the ball in place
    pub fn stop<W: PhysicsWorld>(&mut self, world: &mut W) -> SimResult<()> {
        let link = self.link()?;
        // Body type changes on an enabled, contacting body upset the solver
        world.set_enabled(link.handle, false);
        // Kinematic bodies ignore velocity writes, so zero it first
        world.set_velocity(link.handle, Vec2::ZERO);
        world.set_kind(link.handle, BodyKind::Kinematic);
        world.set_enabled(link.handle, true);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::RapierWorld;

    fn world() -> RapierWorld {
        RapierWorld::with_gravity(Vec2::new(0.0, 9.81))
    }

    #[test]
    fn test_radius_from_diameter() {
        let ball = Ball::default();
        assert_eq!(ball.radius(), BALL_DIAMETER / 2.0);
    }

    #[test]
    fn test_launch_requires_body() {
        let mut world = world();
        let mut ball = Ball::new(Vec2::new(100.0, 100.0));
        assert_eq!(
            ball.launch(&mut world, Vec2::X),
            Err(SimError::BodyNotInitialized("ball"))
        );
        assert_eq!(ball.stop(&mut world), Err(SimError::BodyNotInitialized("ball")));
    }

    #[test]
    fn test_double_init_fails() {
        let mut world = world();
        let mut ball = Ball::new(Vec2::new(100.0, 100.0));
        ball.init_body(&mut world, UnitConverter::default(), Material::default())
            .unwrap();
        assert_eq!(
            ball.init_body(&mut world, UnitConverter::default(), Material::default()),
            Err(SimError::BodyAlreadyInitialized("ball"))
        );
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn test_launch_and_stop() {
        let mut world = world();
        let mut ball = Ball::new(Vec2::new(100.0, 100.0));
        ball.init_body(&mut world, UnitConverter::default(), Material::default())
            .unwrap();
        assert!(!ball.in_flight(&world));
        assert_eq!(ball.position(&world), Vec2::new(100.0, 100.0));

        ball.launch(&mut world, Vec2::new(3.0, -2.0)).unwrap();
        assert!(ball.in_flight(&world));
        assert_eq!(ball.velocity(&world), Vec2::new(3.0, -2.0));
        assert_eq!(
            ball.launch(&mut world, Vec2::X),
            Err(SimError::BallInFlight)
        );

        ball.stop(&mut world).unwrap();
        assert!(!ball.in_flight(&world));
        assert_eq!(ball.velocity(&world), Vec2::ZERO);
        // Relaunch is allowed once stopped
        assert!(ball.launch(&mut world, Vec2::X).is_ok());
    }

    #[test]
    fn test_set_position_converts_units() {
        let mut world = world();
        let mut ball = Ball::default();
        ball.init_body(&mut world, UnitConverter::new(50.0), Material::default())
            .unwrap();
        ball.set_position(&mut world, Vec2::new(200.0, 300.0));
        let handle = ball.handle().unwrap();
        assert_eq!(world.position(handle), Vec2::new(4.0, 6.0));
        assert_eq!(ball.position(&world), Vec2::new(200.0, 300.0));
    }
}
