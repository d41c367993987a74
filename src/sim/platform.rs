//! Rectangular platforms the ball bounces off

use glam::Vec2;

use super::ball::BodyLink;
use super::physics::{BodyDesc, BodyHandle, Material, PhysicsWorld, Shape};
use crate::consts::WORLD_LIMIT;
use crate::error::{SimError, SimResult};
use crate::units::UnitConverter;

/// Validate an axis-aligned rectangle given as top-left + size (pixels)
pub(crate) fn validate_rect(entity: &'static str, origin: Vec2, size: Vec2) -> SimResult<()> {
    validate_position(entity, origin)?;
    if !size.is_finite() || size.x <= 0.0 || size.y <= 0.0 {
        return Err(SimError::geometry(
            entity,
            format!("size must be positive, got ({}, {})", size.x, size.y),
        ));
    }
    if size.x > WORLD_LIMIT || size.y > WORLD_LIMIT {
        return Err(SimError::geometry(
            entity,
            format!("size ({}, {}) exceeds world limit", size.x, size.y),
        ));
    }
    Ok(())
}

pub(crate) fn validate_position(entity: &'static str, position: Vec2) -> SimResult<()> {
    if !position.is_finite() {
        return Err(SimError::geometry(entity, "position is not finite"));
    }
    if position.abs().max_element() > WORLD_LIMIT {
        return Err(SimError::geometry(
            entity,
            format!("position ({}, {}) is out of bounds", position.x, position.y),
        ));
    }
    Ok(())
}

/// A platform (fixed by the level, or placed in the editor)
#[derive(Debug, Clone)]
pub struct Platform {
    origin: Vec2,
    size: Vec2,
    /// Authored by the level (not moveable in the editor)
    pub fixed: bool,
    /// Reserved: no rule breaks platforms yet
    pub breakable: bool,
    /// Inert: nothing sets it, `reset` clears it
    broken: bool,
    /// Ball contacts since the last reset
    hits: u32,
    body: Option<BodyLink>,
}

impl Platform {
    /// Create a platform from its top-left corner and size (pixels)
    pub fn new(origin: Vec2, size: Vec2, breakable: bool) -> SimResult<Self> {
        validate_rect("platform", origin, size)?;
        Ok(Self {
            origin,
            size,
            fixed: true,
            breakable,
            broken: false,
            hits: 0,
            body: None,
        })
    }

    /// A player-placed platform
    pub fn moveable(origin: Vec2, size: Vec2) -> SimResult<Self> {
        let mut platform = Self::new(origin, size, false)?;
        platform.fixed = false;
        Ok(platform)
    }

    /// Top-left corner (pixels)
    #[inline]
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Center (pixels); this is where the body sits
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.origin + self.size / 2.0
    }

    /// Whether `point` is inside the platform (pixels)
    pub fn contains(&self, point: Vec2) -> bool {
        let max = self.origin + self.size;
        point.x >= self.origin.x && point.x < max.x && point.y >= self.origin.y && point.y < max.y
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    pub fn handle(&self) -> Option<BodyHandle> {
        self.body.map(|b| b.handle)
    }

    /// Move the top-left corner. Only allowed before the body exists.
    pub fn move_to(&mut self, origin: Vec2) -> SimResult<()> {
        if self.body.is_some() {
            return Err(SimError::BodyAlreadyInitialized("platform"));
        }
        validate_rect("platform", origin, self.size)?;
        self.origin = origin;
        Ok(())
    }

    /// Move so the center lands on `center`
    pub fn move_center_to(&mut self, center: Vec2) -> SimResult<()> {
        self.move_to(center - self.size / 2.0)
    }

    /// Change the size keeping the top-left corner. Only allowed before the body exists.
    pub fn resize(&mut self, size: Vec2) -> SimResult<()> {
        if self.body.is_some() {
            return Err(SimError::BodyAlreadyInitialized("platform"));
        }
        validate_rect("platform", self.origin, size)?;
        self.size = size;
        Ok(())
    }

    pub fn init_body<W: PhysicsWorld>(
        &mut self,
        world: &mut W,
        units: UnitConverter,
        material: Material,
    ) -> SimResult<BodyHandle> {
        if self.body.is_some() {
            return Err(SimError::BodyAlreadyInitialized("platform"));
        }
        let half = units.vec_to_meters(self.size / 2.0);
        let desc = BodyDesc::fixed(
            Shape::Rect {
                half_width: half.x,
                half_height: half.y,
            },
            units.vec_to_meters(self.center()),
        )
        .with_material(material);
        let handle = world.create_body(&desc);
        self.body = Some(BodyLink { handle, units });
        Ok(handle)
    }

    /// Record a ball contact
    pub fn on_ball_contact(&mut self) {
        self.hits += 1;
    }

    /// Restore the unbroken, untouched state
    pub fn reset(&mut self) {
        self.broken = false;
        self.hits = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::RapierWorld;
    use proptest::prelude::*;

    #[test]
    fn test_center() {
        let platform =
            Platform::new(Vec2::new(100.0, 200.0), Vec2::new(80.0, 20.0), false).unwrap();
        assert_eq!(platform.center(), Vec2::new(140.0, 210.0));
        assert_eq!(platform.origin(), Vec2::new(100.0, 200.0));
    }

    #[test]
    fn test_center_after_resize() {
        let mut platform =
            Platform::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0), false).unwrap();
        platform.resize(Vec2::new(50.0, 30.0)).unwrap();
        assert_eq!(platform.center(), Vec2::new(25.0, 15.0));
        platform.move_center_to(Vec2::new(300.0, 300.0)).unwrap();
        assert_eq!(platform.origin(), Vec2::new(275.0, 285.0));
        assert_eq!(platform.center(), Vec2::new(300.0, 300.0));
    }

    #[test]
    fn test_invalid_position() {
        assert!(
            Platform::new(Vec2::new(-1_491_471.0, -2_523_953.0), Vec2::new(50.0, 10.0), false)
                .is_err()
        );
        assert!(Platform::new(Vec2::new(200.0, 300.0), Vec2::new(50.0, 10.0), false).is_ok());
        assert!(Platform::new(Vec2::new(f32::NAN, 0.0), Vec2::new(50.0, 10.0), false).is_err());
    }

    #[test]
    fn test_invalid_size() {
        assert!(Platform::new(Vec2::ZERO, Vec2::new(0.0, 10.0), false).is_err());
        assert!(Platform::new(Vec2::ZERO, Vec2::new(10.0, -1.0), false).is_err());
        assert!(Platform::new(Vec2::ZERO, Vec2::new(f32::INFINITY, 1.0), false).is_err());
    }

    #[test]
    fn test_failed_move_keeps_position() {
        let mut platform =
            Platform::moveable(Vec2::new(10.0, 10.0), Vec2::new(10.0, 10.0)).unwrap();
        assert!(platform.move_to(Vec2::new(1e9, 0.0)).is_err());
        assert_eq!(platform.origin(), Vec2::new(10.0, 10.0));
        assert!(!platform.fixed);
    }

    #[test]
    fn test_body_at_center() {
        let mut world = RapierWorld::with_gravity(Vec2::ZERO);
        let mut platform =
            Platform::new(Vec2::new(100.0, 200.0), Vec2::new(80.0, 20.0), true).unwrap();
        let handle = platform
            .init_body(&mut world, UnitConverter::default(), Material::default())
            .unwrap();
        assert_eq!(world.position(handle), Vec2::new(1.4, 2.1));
        assert!(
            platform
                .init_body(&mut world, UnitConverter::default(), Material::default())
                .is_err()
        );
        assert!(platform.move_to(Vec2::ZERO).is_err());
        assert!(platform.resize(Vec2::ONE).is_err());
    }

    #[test]
    fn test_reset_clears_hits() {
        let mut platform = Platform::new(Vec2::ZERO, Vec2::new(10.0, 10.0), true).unwrap();
        platform.on_ball_contact();
        platform.on_ball_contact();
        assert_eq!(platform.hits(), 2);
        platform.reset();
        assert_eq!(platform.hits(), 0);
        assert!(!platform.is_broken());
    }

    #[test]
    fn test_contains() {
        let platform = Platform::new(Vec2::new(10.0, 10.0), Vec2::new(20.0, 10.0), false).unwrap();
        assert!(platform.contains(Vec2::new(10.0, 10.0)));
        assert!(platform.contains(Vec2::new(29.0, 19.0)));
        assert!(!platform.contains(Vec2::new(30.0, 15.0)));
    }

    proptest! {
        #[test]
        fn center_is_origin_plus_half_size(
            x in -5000.0f32..5000.0,
            y in -5000.0f32..5000.0,
            w in 1.0f32..1000.0,
            h in 1.0f32..1000.0,
            dx in -500.0f32..500.0,
            dy in -500.0f32..500.0,
        ) {
            let mut platform = Platform::new(Vec2::new(x, y), Vec2::new(w, h), false).unwrap();
            prop_assert_eq!(platform.center(), Vec2::new(x, y) + Vec2::new(w, h) / 2.0);

            platform.move_to(Vec2::new(x + dx, y + dy)).unwrap();
            prop_assert_eq!(platform.center(), platform.origin() + platform.size() / 2.0);

            platform.resize(Vec2::new(h, w)).unwrap();
            prop_assert_eq!(platform.center(), platform.origin() + Vec2::new(h, w) / 2.0);
        }
    }
}
