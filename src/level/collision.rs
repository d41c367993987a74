//! Editor overlap checks on axis-aligned boxes
//!
//! Pure geometry, no physics world needed. Boxes that only share an edge do
//! not overlap.

use glam::Vec2;

use crate::consts::{LAUNCHER_ZONE_OFFSET, LAUNCHER_ZONE_SIZE};

/// Axis-aligned box (pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self {
            min: origin,
            max: origin + size,
        }
    }

    /// Area around the launcher where nothing may be built
    pub fn launcher_zone(launcher: Vec2) -> Self {
        Self::from_origin_size(launcher - LAUNCHER_ZONE_OFFSET, LAUNCHER_ZONE_SIZE)
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Strict overlap: positive area in common
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }
}

/// Which placement rule a layout breaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlap {
    /// Two platforms overlap (indices into fixed-then-moveable order)
    Platforms { first: usize, second: usize },
    /// A platform intrudes on the launcher zone
    LauncherZone { platform: usize },
    /// A death trap overlaps a platform
    DeathTrap { trap: usize, platform: usize },
}

/// First overlap found, or `None` if the layout is valid. Quadratic in the
/// number of platforms, which stays in the tens.
pub fn first_overlap(platforms: &[Rect], launcher_zone: Rect, traps: &[Rect]) -> Option<Overlap> {
    for (i, a) in platforms.iter().enumerate() {
        for (j, b) in platforms.iter().enumerate().skip(i + 1) {
            if a.intersects(b) {
                return Some(Overlap::Platforms { first: i, second: j });
            }
        }
        if a.intersects(&launcher_zone) {
            return Some(Overlap::LauncherZone { platform: i });
        }
    }

    for (t, trap) in traps.iter().enumerate() {
        if let Some(p) = platforms.iter().position(|p| p.intersects(trap)) {
            return Some(Overlap::DeathTrap { trap: t, platform: p });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::from_origin_size(Vec2::new(x, y), Vec2::new(w, h))
    }

    #[test]
    fn test_intersects() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&rect(9.0, 9.0, 10.0, 10.0)));
        assert!(a.intersects(&rect(2.0, 2.0, 2.0, 2.0)));
        assert!(!a.intersects(&rect(10.0, 0.0, 10.0, 10.0)));
        assert!(!a.intersects(&rect(0.0, 10.0, 10.0, 10.0)));
        assert!(!a.intersects(&rect(10.0, 10.0, 5.0, 5.0)));
    }

    #[test]
    fn test_launcher_zone_geometry() {
        let zone = Rect::launcher_zone(Vec2::new(200.0, 600.0));
        assert_eq!(zone.min, Vec2::new(100.0, 500.0));
        assert_eq!(zone.size(), Vec2::new(200.0, 100.0));
    }

    #[test]
    fn test_first_overlap_order() {
        let zone = rect(1000.0, 1000.0, 10.0, 10.0);
        let platforms = [
            rect(0.0, 0.0, 10.0, 10.0),
            rect(50.0, 0.0, 10.0, 10.0),
            rect(55.0, 5.0, 10.0, 10.0),
        ];
        assert_eq!(
            first_overlap(&platforms, zone, &[]),
            Some(Overlap::Platforms { first: 1, second: 2 })
        );
        assert_eq!(first_overlap(&platforms[..2], zone, &[]), None);
        assert_eq!(
            first_overlap(&platforms[..2], zone, &[rect(5.0, 5.0, 1.0, 1.0)]),
            Some(Overlap::DeathTrap { trap: 0, platform: 0 })
        );
    }
}
