//! Static sensor regions: goal, treasures and death traps
//!
//! Sensors never push the ball. Each one tracks whether the ball is currently
//! inside so a contact only counts on the outside -> inside edge.

use glam::Vec2;

use super::ball::BodyLink;
use super::physics::{BodyDesc, BodyHandle, PhysicsWorld, Shape};
use super::platform::validate_rect;
use crate::consts::{DEATH_TRAP_SIZE, GOAL_SIZE, TREASURE_SIZE};
use crate::error::{SimError, SimResult};
use crate::units::UnitConverter;

/// Rectangular overlap region shared by all sensor entities
#[derive(Debug, Clone)]
pub struct SensorRegion {
    name: &'static str,
    origin: Vec2,
    size: Vec2,
    touching: bool,
    body: Option<BodyLink>,
}

impl SensorRegion {
    fn new(name: &'static str, origin: Vec2, size: Vec2) -> SimResult<Self> {
        validate_rect(name, origin, size)?;
        Ok(Self {
            name,
            origin,
            size,
            touching: false,
            body: None,
        })
    }

    /// Top-left corner (pixels)
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn center(&self) -> Vec2 {
        self.origin + self.size / 2.0
    }

    pub fn handle(&self) -> Option<BodyHandle> {
        self.body.map(|b| b.handle)
    }

    pub fn is_touching(&self) -> bool {
        self.touching
    }

    fn init_body<W: PhysicsWorld>(
        &mut self,
        world: &mut W,
        units: UnitConverter,
    ) -> SimResult<BodyHandle> {
        if self.body.is_some() {
            return Err(SimError::BodyAlreadyInitialized(self.name));
        }
        let half = units.vec_to_meters(self.size / 2.0);
        let desc = BodyDesc::sensor(
            Shape::Rect {
                half_width: half.x,
                half_height: half.y,
            },
            units.vec_to_meters(self.center()),
        );
        let handle = world.create_body(&desc);
        self.body = Some(BodyLink { handle, units });
        Ok(handle)
    }

    /// Returns true only on the not-touching -> touching edge
    fn begin_contact(&mut self) -> bool {
        let fresh = !self.touching;
        self.touching = true;
        fresh
    }

    fn end_contact(&mut self) {
        self.touching = false;
    }
}

macro_rules! sensor_entity {
    (
        $(#[$meta:meta])* $ty:ident, $name:literal, $size:expr
        $(, $field:ident: $fty:ty = $init:expr)*
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $ty {
            region: SensorRegion,
            $($field: $fty,)*
        }

        impl $ty {
            /// Default footprint at `origin` (top-left, pixels)
            pub fn new(origin: Vec2) -> SimResult<Self> {
                Self::with_size(origin, $size)
            }

            pub fn with_size(origin: Vec2, size: Vec2) -> SimResult<Self> {
                Ok(Self {
                    region: SensorRegion::new($name, origin, size)?,
                    $($field: $init,)*
                })
            }

            pub fn region(&self) -> &SensorRegion {
                &self.region
            }

            pub fn origin(&self) -> Vec2 {
                self.region.origin()
            }

            pub fn handle(&self) -> Option<BodyHandle> {
                self.region.handle()
            }

            pub fn init_body<W: PhysicsWorld>(
                &mut self,
                world: &mut W,
                units: UnitConverter,
            ) -> SimResult<BodyHandle> {
                self.region.init_body(world, units)
            }

            /// Ball left the region
            pub fn end_contact(&mut self) {
                self.region.end_contact();
            }
        }
    };
}

sensor_entity!(
    /// Reaching the goal completes the level
    Goal,
    "goal",
    GOAL_SIZE
);

sensor_entity!(
    /// Optional pickup worth bonus points
    Treasure,
    "treasure",
    TREASURE_SIZE,
    collected: bool = false
);

sensor_entity!(
    /// Touching a death trap ends the current attempt
    DeathTrap,
    "death trap",
    DEATH_TRAP_SIZE
);

impl Goal {
    /// Ball touched the goal. True if this should complete the level.
    pub fn begin_contact(&mut self) -> bool {
        self.region.begin_contact()
    }

    /// Forget contact state (attempt reset)
    pub fn reset(&mut self) {
        self.region.end_contact();
    }
}

impl DeathTrap {
    /// Ball touched the trap. True if this should end the attempt.
    pub fn begin_contact(&mut self) -> bool {
        self.region.begin_contact()
    }

    pub fn reset(&mut self) {
        self.region.end_contact();
    }
}

impl Treasure {
    /// Ball touched the treasure. True if it was collected just now.
    pub fn begin_contact(&mut self) -> bool {
        self.region.begin_contact() && !std::mem::replace(&mut self.collected, true)
    }

    pub fn is_collected(&self) -> bool {
        self.collected
    }

    /// Back to uncollected
    pub fn reset(&mut self) {
        self.collected = false;
        self.region.end_contact();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::RapierWorld;

    #[test]
    fn test_default_sizes() {
        let goal = Goal::new(Vec2::new(10.0, 20.0)).unwrap();
        assert_eq!(goal.region().size(), GOAL_SIZE);
        assert_eq!(goal.region().center(), Vec2::new(10.0, 20.0) + GOAL_SIZE / 2.0);
        assert_eq!(Treasure::new(Vec2::ZERO).unwrap().region().size(), TREASURE_SIZE);
        assert_eq!(DeathTrap::new(Vec2::ZERO).unwrap().region().size(), DEATH_TRAP_SIZE);
    }

    #[test]
    fn test_rejects_bad_position() {
        assert!(Goal::new(Vec2::new(f32::NAN, 0.0)).is_err());
        assert!(DeathTrap::new(Vec2::new(1e7, 0.0)).is_err());
    }

    #[test]
    fn test_contact_edge_only() {
        let mut trap = DeathTrap::new(Vec2::ZERO).unwrap();
        assert!(trap.begin_contact());
        assert!(!trap.begin_contact());
        trap.end_contact();
        assert!(trap.begin_contact());
    }

    #[test]
    fn test_treasure_collected_once() {
        let mut treasure = Treasure::new(Vec2::ZERO).unwrap();
        assert!(treasure.begin_contact());
        assert!(treasure.is_collected());
        treasure.end_contact();
        // Re-entering does not collect again
        assert!(!treasure.begin_contact());
        treasure.reset();
        assert!(!treasure.is_collected());
        assert!(treasure.begin_contact());
    }

    #[test]
    fn test_double_init_fails() {
        let mut world = RapierWorld::with_gravity(Vec2::ZERO);
        let mut goal = Goal::new(Vec2::new(100.0, 100.0)).unwrap();
        goal.init_body(&mut world, UnitConverter::default()).unwrap();
        assert_eq!(
            goal.init_body(&mut world, UnitConverter::default()),
            Err(SimError::BodyAlreadyInitialized("goal"))
        );
    }
}
