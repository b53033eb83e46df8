//! Perception ranges for walkers driven by an AI controller.

use bevy::prelude::*;

/// Squared sight and hearing distances.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct SensorRanges {
    pub sight_distance_sq: f32,
    pub hearing_distance_sq: f32,
}

impl Default for SensorRanges {
    fn default() -> Self {
        Self {
            sight_distance_sq: 1000.0 * 1000.0,
            hearing_distance_sq: 1100.0 * 1100.0,
        }
    }
}

impl SensorRanges {
    /// Create ranges from plain (non-squared) distances.
    pub fn new(sight: f32, hearing: f32) -> Self {
        Self {
            sight_distance_sq: sight * sight,
            hearing_distance_sq: hearing * hearing,
        }
    }

    /// Whether `target` is within sight range of `origin`.
    #[inline]
    pub fn can_see(&self, origin: Vec3, target: Vec3) -> bool {
        origin.distance_squared(target) <= self.sight_distance_sq
    }

    /// Whether `target` is within hearing range of `origin`.
    #[inline]
    pub fn can_hear(&self, origin: Vec3, target: Vec3) -> bool {
        origin.distance_squared(target) <= self.hearing_distance_sq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ranges() {
        let ranges = SensorRanges::default();
        assert_eq!(ranges.sight_distance_sq, 1_000_000.0);
        assert_eq!(ranges.hearing_distance_sq, 1_210_000.0);
    }

    #[test]
    fn hearing_reaches_past_sight() {
        let ranges = SensorRanges::default();
        let target = Vec3::new(1050.0, 0.0, 0.0);
        assert!(!ranges.can_see(Vec3::ZERO, target));
        assert!(ranges.can_hear(Vec3::ZERO, target));
    }

    #[test]
    fn range_boundary_is_inclusive() {
        let ranges = SensorRanges::new(10.0, 5.0);
        assert!(ranges.can_see(Vec3::ZERO, Vec3::new(0.0, 10.0, 0.0)));
        assert!(ranges.can_hear(Vec3::ZERO, Vec3::new(0.0, 0.0, -5.0)));
        assert!(!ranges.can_hear(Vec3::ZERO, Vec3::new(0.0, 0.0, -5.1)));
    }
}
