//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends must implement
//! to host a surface walker. The locomotion loop only talks to the world
//! through this trait, which keeps it testable against a fake world and
//! lets physics engines be swapped (Rapier3D, Avian, custom, etc.).

use bevy::prelude::*;

use crate::collision::CollisionData;
use crate::config::ProbeFilter;
use crate::state::{LocomotionState, MovementMode};

/// Trait for physics backend implementations.
///
/// Required functions cover what only a physics engine can answer: raycasts
/// and velocity. Pose access and the movement-mode switches have default
/// implementations over [`Transform`] and [`LocomotionState`] which backends
/// may override to mirror the change into their own components.
///
/// # Example
///
/// For an example implementation, see the `rapier` module's `Rapier3dBackend`
/// which implements this trait for Bevy Rapier3D.
pub trait SurfaceWalkerBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Cast a single ray against static world geometry.
    ///
    /// Returns `None` when nothing is hit within `request.max_distance`.
    /// A miss is normal input, not an error.
    fn raycast(world: &mut World, request: &RaycastRequest) -> Option<CollisionData>;

    /// Get the current linear velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec3;

    /// Half the vertical collision extent of an entity (origin to feet).
    fn get_feet_offset(world: &World, entity: Entity) -> f32;

    /// Get the fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.delta_secs())
            .filter(|&d| d > 0.0)
            .unwrap_or(1.0 / 60.0)
    }

    /// Get the current pose of an entity.
    fn get_transform(world: &World, entity: Entity) -> Transform {
        world.get::<Transform>(entity).copied().unwrap_or_default()
    }

    /// Teleport an entity to a new pose (no sweep, no physics interaction).
    fn set_transform(world: &mut World, entity: Entity, transform: Transform) {
        if let Some(mut current) = world.get_mut::<Transform>(entity) {
            *current = transform;
        }
    }

    /// Switch between walking and surface-flying.
    fn set_movement_mode(world: &mut World, entity: Entity, mode: MovementMode, orient_to_movement: bool) {
        if let Some(mut state) = world.get_mut::<LocomotionState>(entity) {
            state.mode = mode;
            state.orient_to_movement = orient_to_movement;
        }
    }

    /// Enable or disable gravity on an entity.
    fn set_gravity_enabled(world: &mut World, entity: Entity, enabled: bool) {
        if let Some(mut state) = world.get_mut::<LocomotionState>(entity) {
            state.gravity_enabled = enabled;
        }
    }

    /// Assign the turn rate (degrees per second around the given axis).
    fn set_rotation_rate(world: &mut World, entity: Entity, rate: Vec3) {
        if let Some(mut state) = world.get_mut::<LocomotionState>(entity) {
            state.rotation_rate = rate;
        }
    }
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}

/// A single probe ray.
#[derive(Debug, Clone, PartialEq)]
pub struct RaycastRequest {
    /// Origin point of the ray.
    pub origin: Vec3,
    /// Direction of the ray (normalized, or zero when degenerate).
    pub direction: Vec3,
    /// Maximum distance to cast.
    pub max_distance: f32,
    /// Entity to exclude from results (usually the caster).
    pub exclude: Option<Entity>,
    /// Additional filtering.
    pub filter: ProbeFilter,
}

impl RaycastRequest {
    /// Create a new raycast request.
    pub fn new(origin: Vec3, direction: Vec3, max_distance: f32) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            max_distance,
            exclude: None,
            filter: ProbeFilter::default(),
        }
    }

    /// Exclude an entity from the raycast.
    pub fn excluding(mut self, entity: Entity) -> Self {
        self.exclude = Some(entity);
        self
    }

    /// Apply a probe filter.
    pub fn with_filter(mut self, filter: ProbeFilter) -> Self {
        self.filter = filter;
        self
    }

    /// End point of the ray at its maximum length.
    #[inline]
    pub fn end(&self) -> Vec3 {
        self.origin + self.direction * self.max_distance
    }

    /// Whether the ray can hit anything at all.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.direction == Vec3::ZERO || !(self.max_distance > 0.0) || !self.origin.is_finite()
    }

    /// Whether `entity` must be skipped by this ray.
    pub fn skips(&self, entity: Entity) -> bool {
        self.exclude == Some(entity) || self.filter.ignores(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_normalizes_direction() {
        let request = RaycastRequest::new(Vec3::ZERO, Vec3::new(0.0, -10.0, 0.0), 5.0);
        assert_eq!(request.direction, Vec3::NEG_Y);
        assert_eq!(request.end(), Vec3::new(0.0, -5.0, 0.0));
    }

    #[test]
    fn zero_direction_is_degenerate() {
        let request = RaycastRequest::new(Vec3::ZERO, Vec3::ZERO, 5.0);
        assert!(request.is_degenerate());

        let request = RaycastRequest::new(Vec3::ZERO, Vec3::Y, 0.0);
        assert!(request.is_degenerate());

        let request = RaycastRequest::new(Vec3::ZERO, Vec3::Y, f32::NAN);
        assert!(request.is_degenerate());
    }

    #[test]
    fn request_skips_excluded_and_ignored() {
        let caster = Entity::from_raw(1);
        let ignored = Entity::from_raw(2);
        let other = Entity::from_raw(3);
        let request = RaycastRequest::new(Vec3::ZERO, Vec3::Y, 1.0)
            .excluding(caster)
            .with_filter(ProbeFilter::default().ignoring(ignored));

        assert!(request.skips(caster));
        assert!(request.skips(ignored));
        assert!(!request.skips(other));
    }
}
