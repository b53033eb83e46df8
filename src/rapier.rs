//! Rapier3D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier3D.
//! Enable with the `rapier3d` feature.

use bevy::ecs::system::SystemState;
use bevy::prelude::*;
use bevy_rapier3d::geometry::Group;
use bevy_rapier3d::prelude::*;

use crate::backend::{RaycastRequest, SurfaceWalkerBackend};
use crate::collision::CollisionData;
use crate::config::SurfaceWalker;
use crate::state::LocomotionState;
use crate::SurfaceWalkerSet;

/// Rapier3D physics backend for surface walkers.
///
/// Probes are cast against the default Rapier context. Gravity toggles are
/// mirrored into [`GravityScale`]. `trace_complex` has no effect: Rapier
/// always casts against the collider shapes themselves.
pub struct Rapier3dBackend;

impl SurfaceWalkerBackend for Rapier3dBackend {
    fn plugin() -> impl Plugin {
        Rapier3dBackendPlugin
    }

    fn raycast(world: &mut World, request: &RaycastRequest) -> Option<CollisionData> {
        if !world.contains_resource::<RapierProbeState>() {
            let state = SystemState::new(world);
            world.insert_resource(RapierProbeState(state));
        }

        world.resource_scope(|world, mut probe: Mut<RapierProbeState>| {
            let context = probe.0.get(world);
            let context = context.single().ok()?;
            rapier_raycast(&context, request)
        })
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec3::ZERO)
    }

    fn get_feet_offset(world: &World, entity: Entity) -> f32 {
        world
            .get::<Collider>(entity)
            .map(get_collider_bottom_offset)
            .unwrap_or(0.0)
    }

    fn set_gravity_enabled(world: &mut World, entity: Entity, enabled: bool) {
        if let Some(mut state) = world.get_mut::<LocomotionState>(entity) {
            state.gravity_enabled = enabled;
        }
        if let Some(mut scale) = world.get_mut::<GravityScale>(entity) {
            scale.0 = if enabled { 1.0 } else { 0.0 };
        }
    }
}

/// Cached system state for reading the Rapier context from exclusive systems.
#[derive(Resource)]
struct RapierProbeState(SystemState<ReadRapierContext<'static, 'static>>);

/// Plugin that sets up Rapier3D-specific systems for surface walkers.
pub struct Rapier3dBackendPlugin;

impl Plugin for Rapier3dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            insert_physics_components.in_set(SurfaceWalkerSet::Preparation),
        );
    }
}

/// Give new walkers the Rapier components the backend reads and writes.
fn insert_physics_components(
    mut commands: Commands,
    q_walkers: Query<(Entity, Has<GravityScale>, Has<Velocity>), Added<SurfaceWalker>>,
) {
    for (entity, has_gravity_scale, has_velocity) in &q_walkers {
        if !has_gravity_scale {
            commands.entity(entity).insert(GravityScale(1.0));
        }
        if !has_velocity {
            commands.entity(entity).insert(Velocity::default());
        }
    }
}

/// Get the distance from collider center to bottom for a given collider.
/// For capsules, this is half_height + radius.
pub fn get_collider_bottom_offset(collider: &Collider) -> f32 {
    if let Some(capsule) = collider.as_capsule() {
        let segment = capsule.segment();
        let half_height = (segment.a().y - segment.b().y).abs() / 2.0;
        half_height + capsule.radius()
    } else if let Some(ball) = collider.as_ball() {
        ball.radius()
    } else if let Some(cuboid) = collider.as_cuboid() {
        cuboid.half_extents().y
    } else {
        0.0
    }
}

/// Perform a raycast using RapierContext.
fn rapier_raycast(context: &RapierContext, request: &RaycastRequest) -> Option<CollisionData> {
    let keep = |entity: Entity| !request.skips(entity);
    let mut filter = QueryFilter::default().exclude_sensors().predicate(&keep);

    if let Some(exclude) = request.exclude {
        filter = filter.exclude_rigid_body(exclude).exclude_collider(exclude);
    }

    if let Some((memberships, filters)) = request.filter.collision_groups {
        filter = filter.groups(CollisionGroups::new(
            Group::from_bits_truncate(memberships),
            Group::from_bits_truncate(filters),
        ));
    }

    context
        .cast_ray_and_get_normal(request.origin, request.direction, request.max_distance, true, filter)
        .map(|(hit_entity, hit)| CollisionData::new(hit.time_of_impact, hit.normal, hit.point, Some(hit_entity)))
}

/// Physics components for a Rapier-backed surface walker.
///
/// Rotation is locked: the walker's orientation is driven by the locomotion
/// loop, not by contacts.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use surface_walker::prelude::*;
/// use surface_walker::rapier::Rapier3dWalkerBundle;
///
/// fn spawn_spider(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 40.0, 0.0),
///         SurfaceWalker::new(),
///         SurfaceWalkerConfig::default(),
///         Rapier3dWalkerBundle::new(),
///         Collider::capsule_y(5.0, 5.0),
///     ));
/// }
/// ```
#[derive(Bundle)]
pub struct Rapier3dWalkerBundle {
    pub rigid_body: RigidBody,
    pub velocity: Velocity,
    pub gravity_scale: GravityScale,
    pub locked_axes: LockedAxes,
    pub damping: Damping,
}

impl Default for Rapier3dWalkerBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Rapier3dWalkerBundle {
    /// Dynamic body with rotation locked.
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            gravity_scale: GravityScale(1.0),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            damping: Damping {
                linear_damping: 0.5,
                angular_damping: 1.0,
            },
        }
    }

    /// Builder: set the rigid body type.
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }

    /// Builder: set linear and angular damping.
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.damping = Damping {
            linear_damping: linear,
            angular_damping: angular,
        };
        self
    }
}
