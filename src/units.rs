//! Pixel <-> meter conversion
//!
//! Entities are authored and drawn in pixels; the physics world runs in meters.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::PIXELS_PER_METER;

/// Scalar ratio between display pixels and simulation meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitConverter {
    pixels_per_meter: f32,
}

impl Default for UnitConverter {
    fn default() -> Self {
        Self {
            pixels_per_meter: PIXELS_PER_METER,
        }
    }
}

impl UnitConverter {
    /// Non-positive or non-finite ratios fall back to the default
    pub fn new(pixels_per_meter: f32) -> Self {
        if pixels_per_meter.is_finite() && pixels_per_meter > 0.0 {
            Self { pixels_per_meter }
        } else {
            Self::default()
        }
    }

    #[inline]
    pub fn pixels_per_meter(&self) -> f32 {
        self.pixels_per_meter
    }

    #[inline]
    pub fn to_meters(&self, pixels: f32) -> f32 {
        pixels / self.pixels_per_meter
    }

    #[inline]
    pub fn to_pixels(&self, meters: f32) -> f32 {
        meters * self.pixels_per_meter
    }

    #[inline]
    pub fn vec_to_meters(&self, pixels: Vec2) -> Vec2 {
        pixels / self.pixels_per_meter
    }

    #[inline]
    pub fn vec_to_pixels(&self, meters: Vec2) -> Vec2 {
        meters * self.pixels_per_meter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_default_ratio() {
        let units = UnitConverter::default();
        assert_eq!(units.to_meters(250.0), 2.5);
        assert_eq!(units.to_pixels(2.5), 250.0);
    }

    #[test]
    fn test_invalid_ratio_falls_back() {
        assert_eq!(UnitConverter::new(0.0), UnitConverter::default());
        assert_eq!(UnitConverter::new(f32::NAN), UnitConverter::default());
        assert_eq!(UnitConverter::new(64.0).pixels_per_meter(), 64.0);
    }

    #[test]
    fn test_vector_conversion() {
        let units = UnitConverter::new(50.0);
        let m = units.vec_to_meters(Vec2::new(100.0, -25.0));
        assert_relative_eq!(m.x, 2.0);
        assert_relative_eq!(m.y, -0.5);
        assert_eq!(units.vec_to_pixels(m), Vec2::new(100.0, -25.0));
    }

    proptest! {
        #[test]
        fn round_trip_pixels(x in 0.0f32..1000.0) {
            let units = UnitConverter::default();
            prop_assert!((units.to_pixels(units.to_meters(x)) - x).abs() <= 1e-3);
            prop_assert!((units.to_meters(units.to_pixels(x)) - x).abs() <= 1e-3);
        }
    }
}
