//! Probe results and distance classification.
//!
//! A probe produces a [`SensorCast`]. The cast is then compared against a
//! session-constant reference distance to produce a [`ClassifiedCast`], which
//! is what the surface classifier consumes.

use bevy::prelude::*;

use crate::collision::CollisionData;

/// Result of a single probe ray.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorCast {
    /// Whether the ray hit something.
    pub hit: bool,
    /// Actual start point of the ray.
    pub origin: Vec3,
    /// End point of the ray at its maximum length.
    pub end: Vec3,
    /// World position of the impact point (if hit).
    pub point: Vec3,
    /// Normal of the surface at the impact point (if hit).
    pub normal: Vec3,
    /// Distance from `origin` to the impact point (if hit).
    pub distance: f32,
    /// Entity that was hit (if any).
    pub entity: Option<Entity>,
}

impl SensorCast {
    /// Create an empty (no hit) result.
    pub fn miss(origin: Vec3, end: Vec3) -> Self {
        Self {
            origin,
            end,
            ..default()
        }
    }

    /// Create a hit result.
    pub fn hit(origin: Vec3, end: Vec3, data: CollisionData) -> Self {
        Self {
            hit: true,
            origin,
            end,
            point: data.point,
            normal: data.normal,
            distance: data.distance,
            entity: data.entity,
        }
    }

    /// Build a cast from an optional backend hit.
    pub fn from_collision(origin: Vec3, end: Vec3, data: Option<CollisionData>) -> Self {
        match data {
            Some(data) => Self::hit(origin, end, data),
            None => Self::miss(origin, end),
        }
    }

    /// Impact normal if the cast hit, `None` otherwise.
    pub fn hit_normal(&self) -> Option<Vec3> {
        self.hit.then_some(self.normal)
    }

    /// Squared distance between the ray start and the impact point.
    #[inline]
    pub fn impact_distance_sq(&self) -> f32 {
        self.origin.distance_squared(self.point)
    }
}

/// How a measured impact distance compares to the reference distance.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DistanceRelation {
    /// Within tolerance of the reference.
    Equal,
    /// Farther than the reference, or no surface at all.
    #[default]
    GreaterThan,
    /// Nearer than the reference.
    LessThan,
}

/// Compare a cast's squared impact distance against a squared reference.
///
/// Misses and non-finite measurements classify as [`DistanceRelation::GreaterThan`].
pub fn classify_distance(
    cast: &SensorCast,
    reference_distance_sq: f32,
    tolerance_sq: f32,
) -> DistanceRelation {
    if !cast.hit {
        return DistanceRelation::GreaterThan;
    }

    let measured = cast.impact_distance_sq();
    if !measured.is_finite() || !reference_distance_sq.is_finite() {
        return DistanceRelation::GreaterThan;
    }

    if (measured - reference_distance_sq).abs() <= tolerance_sq {
        DistanceRelation::Equal
    } else if measured < reference_distance_sq {
        DistanceRelation::LessThan
    } else {
        DistanceRelation::GreaterThan
    }
}

/// A probe result together with its distance classification.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClassifiedCast {
    /// The raw probe result.
    pub cast: SensorCast,
    /// Whether the impact distance matched the reference within tolerance.
    pub acceptable: bool,
    /// Relation of the impact distance to the reference.
    pub relation: DistanceRelation,
}

impl ClassifiedCast {
    /// Classify `cast` against the reference distance.
    pub fn classify(cast: SensorCast, reference_distance_sq: f32, tolerance_sq: f32) -> Self {
        let relation = classify_distance(&cast, reference_distance_sq, tolerance_sq);
        Self {
            cast,
            acceptable: relation == DistanceRelation::Equal,
            relation,
        }
    }

    #[inline]
    pub fn hit(&self) -> bool {
        self.cast.hit
    }

    #[inline]
    pub fn hit_normal(&self) -> Option<Vec3> {
        self.cast.hit_normal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cast_at_distance_sq(distance_sq: f32) -> SensorCast {
        let distance = distance_sq.sqrt();
        SensorCast::hit(
            Vec3::ZERO,
            Vec3::NEG_Y * 1000.0,
            CollisionData::new(distance, Vec3::Y, Vec3::NEG_Y * distance, None),
        )
    }

    // ==================== SensorCast Tests ====================

    #[test]
    fn sensor_cast_miss() {
        let cast = SensorCast::miss(Vec3::ZERO, Vec3::NEG_Y);
        assert!(!cast.hit);
        assert_eq!(cast.distance, 0.0);
        assert!(cast.entity.is_none());
        assert_eq!(cast.hit_normal(), None);
    }

    #[test]
    fn sensor_cast_from_collision() {
        let data = CollisionData::new(5.0, Vec3::Y, Vec3::new(0.0, -5.0, 0.0), None);
        let cast = SensorCast::from_collision(Vec3::ZERO, Vec3::NEG_Y * 10.0, Some(data));
        assert!(cast.hit);
        assert_eq!(cast.hit_normal(), Some(Vec3::Y));
        assert_eq!(cast.impact_distance_sq(), 25.0);
    }

    #[test]
    fn impact_distance_uses_ray_start() {
        // Ray starts away from the world origin; distance is measured from the start.
        let origin = Vec3::new(3.0, 10.0, -2.0);
        let data = CollisionData::new(4.0, Vec3::Y, origin + Vec3::NEG_Y * 4.0, None);
        let cast = SensorCast::hit(origin, origin + Vec3::NEG_Y * 100.0, data);
        assert!((cast.impact_distance_sq() - 16.0).abs() < 1e-4);
    }

    // ==================== Distance Classification Tests ====================

    #[test]
    fn miss_is_greater_than() {
        let cast = SensorCast::miss(Vec3::ZERO, Vec3::NEG_Y);
        assert_eq!(classify_distance(&cast, 100.0, 9.0), DistanceRelation::GreaterThan);

        let classified = ClassifiedCast::classify(cast, 100.0, 9.0);
        assert!(!classified.acceptable);
    }

    fn cast_to_point(point: Vec3) -> SensorCast {
        SensorCast::hit(
            Vec3::ZERO,
            point * 10.0,
            CollisionData::new(point.length(), Vec3::Y, point, None),
        )
    }

    #[test]
    fn within_tolerance_band_is_equal() {
        for measured in [995.0, 1000.0, 1004.0] {
            let cast = cast_at_distance_sq(measured);
            assert_eq!(classify_distance(&cast, 1000.0, 9.0), DistanceRelation::Equal, "measured={measured}");
        }
    }

    #[test]
    fn tolerance_band_edges_are_inclusive() {
        // Integer impact points keep the squared distances exact
        let upper_edge = cast_to_point(Vec3::new(28.0, 15.0, 0.0)); // 1009
        let past_upper = cast_to_point(Vec3::new(31.0, 7.0, 0.0)); // 1010
        assert_eq!(upper_edge.impact_distance_sq(), 1009.0);
        assert_eq!(classify_distance(&upper_edge, 1000.0, 9.0), DistanceRelation::Equal);
        assert_eq!(classify_distance(&past_upper, 1000.0, 9.0), DistanceRelation::GreaterThan);

        let lower_edge = cast_to_point(Vec3::new(30.0, 9.0, 0.0)); // 981
        let past_lower = cast_to_point(Vec3::new(28.0, 14.0, 0.0)); // 980
        assert_eq!(lower_edge.impact_distance_sq(), 981.0);
        assert_eq!(classify_distance(&lower_edge, 990.0, 9.0), DistanceRelation::Equal);
        assert_eq!(classify_distance(&past_lower, 990.0, 9.0), DistanceRelation::LessThan);
    }

    #[test]
    fn nearer_is_less_than() {
        let cast = cast_at_distance_sq(500.0);
        assert_eq!(classify_distance(&cast, 1000.0, 9.0), DistanceRelation::LessThan);
    }

    #[test]
    fn farther_is_greater_than() {
        let cast = cast_at_distance_sq(1500.0);
        assert_eq!(classify_distance(&cast, 1000.0, 9.0), DistanceRelation::GreaterThan);
    }

    #[test]
    fn swapping_beyond_tolerance_never_equal() {
        let a = 400.0;
        let b = 900.0;
        let forward = classify_distance(&cast_at_distance_sq(a), b, 9.0);
        let swapped = classify_distance(&cast_at_distance_sq(b), a, 9.0);
        assert_ne!(forward, DistanceRelation::Equal);
        assert_ne!(swapped, DistanceRelation::Equal);
        assert_eq!(forward, DistanceRelation::LessThan);
        assert_eq!(swapped, DistanceRelation::GreaterThan);
    }

    #[test]
    fn degenerate_measurement_is_greater_than() {
        let mut cast = cast_at_distance_sq(100.0);
        cast.point = Vec3::new(f32::NAN, 0.0, 0.0);
        assert_eq!(classify_distance(&cast, 100.0, 9.0), DistanceRelation::GreaterThan);

        let cast = cast_at_distance_sq(100.0);
        assert_eq!(
            classify_distance(&cast, f32::INFINITY, 9.0),
            DistanceRelation::GreaterThan
        );
    }

    #[test]
    fn classified_cast_acceptable_matches_equal() {
        let classified = ClassifiedCast::classify(cast_at_distance_sq(100.0), 100.0, 9.0);
        assert!(classified.acceptable);
        assert_eq!(classified.relation, DistanceRelation::Equal);
        assert!(classified.hit());
    }
}
