//! Locomotion systems.
//!
//! The per-frame loop traces the environment, classifies the surface under
//! the walker and reacts by snapping, sticking or turning the character.
//! Every system is generic over the physics backend so the loop can run
//! against any engine, or against a fake world in tests.

use bevy::prelude::*;

use crate::backend::SurfaceWalkerBackend;
use crate::config::{SurfaceWalker, SurfaceWalkerConfig};
use crate::events::{CrossSurfaceBegin, CrossSurfaceEnd, CustomRotationUpdate, SurfaceChanged};
use crate::orientation::{
    interpolated_normal, is_aligned, nearly_equal, rotate_toward_movement, rotation_rate, snap_transform,
    stick_location,
};
use crate::probe::{cast_probe, classify_probe, reference_distances, ProbeFrame, ProbeKind};
use crate::state::{markers_for, Airborne, CrossingEdge, MovementMode, OnSurface};
use crate::surface::{detect_surface, is_plane_confirmed, SurfaceState, TraceResult};

/// Compute reference distances for new walkers and optionally drop them onto
/// the surface below.
///
/// Runs until every walker is initialized; initialized walkers are skipped.
pub fn initialize_walkers<B: SurfaceWalkerBackend>(world: &mut World) {
    let pending: Vec<(Entity, SurfaceWalkerConfig)> = world
        .query::<(Entity, &SurfaceWalker, &SurfaceWalkerConfig)>()
        .iter(world)
        .filter(|(_, walker, _)| !walker.initialized)
        .map(|(e, _, config)| (e, config.clone()))
        .collect();

    for (entity, config) in pending {
        initialize_walker::<B>(world, entity, &config);
    }
}

/// Initialize a single walker.
pub fn initialize_walker<B: SurfaceWalkerBackend>(world: &mut World, entity: Entity, config: &SurfaceWalkerConfig) {
    let feet_offset = B::get_feet_offset(world, entity);
    let frame = ProbeFrame::from_transform(&B::get_transform(world, entity));
    let reference = reference_distances(&frame, config, feet_offset);

    if reference.surface_sq == 0.0 {
        warn!(
            "Forward probe of {:?} does not reach its feet plane (surface distance {}), hits farther than the tolerance classify as GreaterThan and the walker will read as OnAir",
            entity, config.surface_distance
        );
    }

    let Some(mut walker) = world.get_mut::<SurfaceWalker>(entity) else {
        return;
    };
    walker.feet_offset = feet_offset;
    walker.reference = reference;
    walker.surface_normal = frame.up;
    walker.initialized = true;

    info!(
        "Surface walker {:?} initialized: feet offset {:.2}, surface reference {:.2}",
        entity,
        feet_offset,
        reference.surface_sq.sqrt()
    );

    if !config.force_stick_at_start {
        return;
    }

    let cast = cast_probe::<B>(
        world,
        entity,
        ProbeKind::Initial,
        frame.ray(ProbeKind::Initial, config),
        config.debug_probes,
    );

    if cast.hit {
        transition_to_surface::<B>(world, entity, stick_location(cast.point, cast.normal, feet_offset), cast.normal);
    } else {
        debug!("No surface below {:?} at start", entity);
    }
}

/// Run the locomotion loop for every initialized walker.
///
/// With `probe_only_when_moving` set, walkers with zero velocity are skipped
/// for the frame.
pub fn update_surface_walkers<B: SurfaceWalkerBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);

    let walkers: Vec<(Entity, SurfaceWalkerConfig)> = world
        .query::<(Entity, &SurfaceWalker, &SurfaceWalkerConfig)>()
        .iter(world)
        .filter(|(_, walker, _)| walker.initialized)
        .map(|(e, _, config)| (e, config.clone()))
        .collect();

    for (entity, config) in walkers {
        if config.probe_only_when_moving && B::get_velocity(world, entity).length_squared() <= 0.0 {
            continue;
        }
        trace_and_handle::<B>(world, entity, &config, dt);
    }
}

/// One iteration of the locomotion loop for a single walker.
pub fn trace_and_handle<B: SurfaceWalkerBackend>(
    world: &mut World,
    entity: Entity,
    config: &SurfaceWalkerConfig,
    dt: f32,
) {
    let Some(mut walker) = world.get::<SurfaceWalker>(entity).cloned() else {
        return;
    };

    let frame = ProbeFrame::from_transform(&B::get_transform(world, entity));
    walker.reset_frame(frame.up);

    let mut trace = probe_environment::<B>(world, entity, &frame, config, &walker);
    let surface = detect_surface(&trace.forward, &trace.backward, &trace.bottom);
    trace.surface = surface;

    react_to_surface::<B>(world, entity, config, dt, &trace, &mut walker);

    let previous = walker.last_surface;
    if surface != previous {
        debug!("{:?} surface {:?} -> {:?}", entity, previous, surface);
        world.send_event(SurfaceChanged {
            entity,
            previous,
            current: surface,
            normal: walker.surface_normal,
        });
        if previous == SurfaceState::Convex {
            world.send_event(CrossSurfaceEnd { entity });
        }
    }

    update_movement_mode::<B>(world, entity, walker.surface_normal);

    if walker.needs_stick {
        stick_to_surface::<B>(world, entity, config, walker.feet_offset, walker.surface_normal, dt);
    }

    update_rotation_rate::<B>(world, entity, config);

    if config.orient_to_movement && surface == SurfaceState::Plane {
        orient_to_movement::<B>(world, entity, config, dt);
    }

    walker.last_surface = surface;
    walker.last_trace = Some(trace);
    if let Some(mut stored) = world.get_mut::<SurfaceWalker>(entity) {
        *stored = walker;
    }
}

/// Cast the forward, backward and bottom probes from the walker's current pose.
fn probe_environment<B: SurfaceWalkerBackend>(
    world: &mut World,
    entity: Entity,
    frame: &ProbeFrame,
    config: &SurfaceWalkerConfig,
    walker: &SurfaceWalker,
) -> TraceResult {
    let reference = walker.reference;
    let forward = classify_probe::<B>(world, entity, ProbeKind::Forward, frame, config, &reference);
    let backward = classify_probe::<B>(world, entity, ProbeKind::Backward, frame, config, &reference);
    let bottom = classify_probe::<B>(world, entity, ProbeKind::Bottom, frame, config, &reference);
    TraceResult::new(forward, backward, bottom)
}

/// Trace the environment without reacting to it.
///
/// Uses the three-way classifier, so a frame with no hits reports Convex
/// (the bottom probe misses). Returns `None` for entities that are not
/// initialized walkers.
pub fn trace_environment<B: SurfaceWalkerBackend>(world: &mut World, entity: Entity) -> Option<TraceResult> {
    let config = world.get::<SurfaceWalkerConfig>(entity)?.clone();
    let walker = world.get::<SurfaceWalker>(entity)?.clone();
    if !walker.initialized {
        return None;
    }

    let frame = ProbeFrame::from_transform(&B::get_transform(world, entity));
    Some(probe_environment::<B>(world, entity, &frame, &config, &walker))
}

fn react_to_surface<B: SurfaceWalkerBackend>(
    world: &mut World,
    entity: Entity,
    config: &SurfaceWalkerConfig,
    dt: f32,
    trace: &TraceResult,
    walker: &mut SurfaceWalker,
) {
    match trace.surface {
        SurfaceState::OnAir => {
            if config.stick_when_airborne {
                let normal = trace
                    .bottom
                    .hit_normal()
                    .or_else(|| trace.forward.hit_normal())
                    .unwrap_or(Vec3::Y);
                stick_to_surface::<B>(world, entity, config, walker.feet_offset, normal, dt);
            }
        }
        SurfaceState::Plane => {
            walker.surface_normal = trace.bottom.hit_normal().unwrap_or(Vec3::Y);
            walker.needs_stick = true;

            let frame = ProbeFrame::from_transform(&B::get_transform(world, entity));
            let assistor =
                classify_probe::<B>(world, entity, ProbeKind::BottomAssistor, &frame, config, &walker.reference);
            walker.plane_confirmed = is_plane_confirmed(&trace.bottom, &assistor);
        }
        SurfaceState::Convex => {
            world.send_event(CrossSurfaceBegin { entity });

            let mut transform = B::get_transform(world, entity);
            if config.offset_on_convex_cross {
                let forward = *transform.forward();
                transform.translation -= forward * config.bottom_assistor_offset;
            }
            transform.rotate_local_y(config.transition_rate.to_radians() * dt);
            B::set_transform(world, entity, transform);
        }
        SurfaceState::Concave => {
            if let Some(normal) = trace.forward.hit_normal() {
                let position = B::get_transform(world, entity).translation;
                transition_to_surface::<B>(world, entity, position, normal);
            }
        }
    }
}

/// Instantly place the walker at `position` with its up axis along `normal`.
pub fn transition_to_surface<B: SurfaceWalkerBackend>(world: &mut World, entity: Entity, position: Vec3, normal: Vec3) {
    let current = B::get_transform(world, entity);
    B::set_transform(world, entity, snap_transform(&current, position, normal));
}

/// Move the walker toward `target_normal` on the surface below.
///
/// Casts the center probe. Does nothing on a miss or when the walker already
/// stands aligned on the hit point; otherwise the up axis is interpolated one
/// step toward the target and the walker snaps onto the hit point. Returns
/// whether the walker moved.
pub fn stick_to_surface<B: SurfaceWalkerBackend>(
    world: &mut World,
    entity: Entity,
    config: &SurfaceWalkerConfig,
    feet_offset: f32,
    target_normal: Vec3,
    dt: f32,
) -> bool {
    let frame = ProbeFrame::from_transform(&B::get_transform(world, entity));
    let cast = cast_probe::<B>(
        world,
        entity,
        ProbeKind::Center,
        frame.ray(ProbeKind::Center, config),
        config.debug_probes,
    );

    if !cast.hit || is_aligned(frame.up, frame.position, cast.point, target_normal, feet_offset) {
        return false;
    }

    let normal = interpolated_normal(frame.up, target_normal, dt, config.stick_speed);
    transition_to_surface::<B>(world, entity, stick_location(cast.point, normal, feet_offset), normal);
    true
}

/// Walk under gravity on upright ground, fly against anything else.
pub fn update_movement_mode<B: SurfaceWalkerBackend>(world: &mut World, entity: Entity, surface_normal: Vec3) {
    if nearly_equal(surface_normal, Vec3::Y) {
        B::set_gravity_enabled(world, entity, true);
        B::set_movement_mode(world, entity, MovementMode::Walking, true);
    } else {
        B::set_gravity_enabled(world, entity, false);
        B::set_movement_mode(world, entity, MovementMode::Flying, false);
    }
}

/// Assign the turn rate around the current up axis, or hand it to the host.
pub fn update_rotation_rate<B: SurfaceWalkerBackend>(world: &mut World, entity: Entity, config: &SurfaceWalkerConfig) {
    if config.use_custom_rotation_rate {
        world.send_event(CustomRotationUpdate { entity });
        return;
    }

    let up = *B::get_transform(world, entity).up();
    B::set_rotation_rate(world, entity, rotation_rate(up, config.rotation_rate));
}

fn orient_to_movement<B: SurfaceWalkerBackend>(world: &mut World, entity: Entity, config: &SurfaceWalkerConfig, dt: f32) {
    let velocity = B::get_velocity(world, entity);
    let mut transform = B::get_transform(world, entity);
    if let Some(rotation) = rotate_toward_movement(transform.rotation, velocity, dt, config.rotation_rate) {
        transform.rotation = rotation;
        B::set_transform(world, entity, transform);
    }
}

/// Sync state marker components with the walker's surface state.
pub fn sync_state_markers(
    mut commands: Commands,
    q_walkers: Query<(Entity, &SurfaceWalker, Has<OnSurface>, Has<Airborne>, Has<CrossingEdge>)>,
) {
    for (entity, walker, has_surface, has_airborne, has_crossing) in &q_walkers {
        // No state to mirror until the first traced frame
        if walker.last_trace.is_none() {
            continue;
        }

        let (on_surface, airborne, crossing) = markers_for(walker.last_surface);
        let mut entity_commands = commands.entity(entity);

        if on_surface && !has_surface {
            entity_commands.insert(OnSurface);
        } else if !on_surface && has_surface {
            entity_commands.remove::<OnSurface>();
        }

        if airborne && !has_airborne {
            entity_commands.insert(Airborne);
        } else if !airborne && has_airborne {
            entity_commands.remove::<Airborne>();
        }

        if crossing && !has_crossing {
            entity_commands.insert(CrossingEdge);
        } else if !crossing && has_crossing {
            entity_commands.remove::<CrossingEdge>();
        }
    }
}
