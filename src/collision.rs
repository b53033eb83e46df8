//! Raw collision data returned by backend raycasts.

use bevy::prelude::*;

/// Information about a raycast collision.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionData {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    /// Normal of the surface at hit point.
    pub normal: Vec3,
    /// World position of the hit point.
    pub point: Vec3,
    /// Entity that was hit (if any).
    pub entity: Option<Entity>,
}

impl CollisionData {
    /// Create a collision result.
    pub fn new(distance: f32, normal: Vec3, point: Vec3, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }
}
