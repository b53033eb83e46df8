//! Walker configuration and runtime components.
//!
//! [`SurfaceWalkerConfig`] holds the tracing parameters, set once and read-only
//! while the locomotion loop runs. [`SurfaceWalker`] is the per-character
//! runtime state the loop mutates every frame.

use bevy::prelude::*;

use crate::state::LocomotionState;
use crate::surface::{SurfaceState, TraceResult};

/// Filter applied to every probe ray.
#[derive(Reflect, Debug, Clone, Default, PartialEq)]
pub struct ProbeFilter {
    /// Entities the probes never hit (the walker itself is always excluded).
    pub ignore: Vec<Entity>,
    /// Collision groups (memberships, filters). None = hit everything.
    pub collision_groups: Option<(u32, u32)>,
    /// Trace against per-triangle geometry instead of simple hulls, where the backend distinguishes them.
    /// Declared for hosts with such a distinction; neither the Rapier backend nor the loop reads it.
    pub trace_complex: bool,
}

impl ProbeFilter {
    /// Builder: add an entity to the ignore list.
    pub fn ignoring(mut self, entity: Entity) -> Self {
        self.ignore.push(entity);
        self
    }

    /// Check if an entity is filtered out.
    pub fn ignores(&self, entity: Entity) -> bool {
        self.ignore.contains(&entity)
    }
}

/// Tracing configuration for a surface walker.
///
/// Offsets and distances are in world units, angles in degrees and rates in
/// degrees per second.
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
pub struct SurfaceWalkerConfig {
    // === Tracing Offsets ===
    /// Eye position above the character origin (eye = position + up * eye_offset).
    /// Usually half the character height with a little extra.
    pub eye_offset: f32,

    /// Forward offset of the bottom probe from the character origin.
    pub bottom_offset: f32,

    /// Extra forward offset of the bottom-assistor probe, relative to `bottom_offset`.
    /// Also the nudge distance when crossing a convex edge.
    pub bottom_assistor_offset: f32,

    /// Angle between the down vector and the forward/backward probes.
    pub forward_backward_angle: f32,

    /// Angle between the down vector and the left/right probes (reserved).
    pub left_right_angle: f32,

    // === Tracing Distances ===
    /// Length of the center probe used to stick to the surface.
    pub stick_distance: f32,

    /// Length of the classification probes.
    pub surface_distance: f32,

    /// Tolerance (squared) when comparing probe distances against the reference.
    pub distance_tolerance_sq: f32,

    // === Abilities ===
    /// Interpolation speed of the up axis when sticking to a surface.
    pub stick_speed: f32,

    /// Turn rate around the up axis.
    pub rotation_rate: f32,

    /// Yaw rate while crossing a convex edge.
    pub transition_rate: f32,

    /// Stick to the nearest surface when no classification probe finds one.
    pub stick_when_airborne: bool,

    /// Nudge along the forward axis when crossing a convex edge.
    pub offset_on_convex_cross: bool,

    /// Only run the locomotion loop while the character is moving.
    pub probe_only_when_moving: bool,

    /// Snap onto the surface below when the walker is first initialized.
    pub force_stick_at_start: bool,

    /// Turn toward the movement direction while on a plane.
    pub orient_to_movement: bool,

    /// Declared for hosts that pause movement while transitioning.
    /// The locomotion loop does not read it.
    pub disable_movement_during_transition: bool,

    /// Emit [`crate::events::CustomRotationUpdate`] instead of assigning the default turn rate.
    pub use_custom_rotation_rate: bool,

    // === Filtering & Debug ===
    /// Filter applied to every probe.
    pub filter: ProbeFilter,

    /// Emit [`crate::events::ProbeTraced`] for every cast.
    pub debug_probes: bool,
}

impl Default for SurfaceWalkerConfig {
    fn default() -> Self {
        Self {
            // Tracing offsets
            eye_offset: 15.0,
            bottom_offset: -5.0,
            bottom_assistor_offset: -3.0,
            forward_backward_angle: 45.0,
            left_right_angle: 45.0,

            // Tracing distances
            stick_distance: 50.0,
            surface_distance: 100.0,
            distance_tolerance_sq: 9.0, // 3 * 3

            // Abilities
            stick_speed: 50.0,
            rotation_rate: 540.0,
            transition_rate: 540.0,
            stick_when_airborne: true,
            offset_on_convex_cross: true,
            probe_only_when_moving: true,
            force_stick_at_start: true,
            orient_to_movement: true,
            disable_movement_during_transition: true,
            use_custom_rotation_rate: false,

            // Filtering & debug
            filter: ProbeFilter::default(),
            debug_probes: false,
        }
    }
}

impl SurfaceWalkerConfig {
    /// Small crawler that probes every frame, even when standing still.
    pub fn crawler() -> Self {
        Self {
            eye_offset: 8.0,
            stick_distance: 25.0,
            surface_distance: 50.0,
            probe_only_when_moving: false,
            ..default()
        }
    }

    /// Walker that never lets go of its surface and never auto-turns.
    pub fn wall_hugger() -> Self {
        Self {
            stick_speed: 80.0,
            orient_to_movement: false,
            offset_on_convex_cross: false,
            ..default()
        }
    }

    /// Builder: set the eye offset.
    pub fn with_eye_offset(mut self, offset: f32) -> Self {
        self.eye_offset = offset;
        self
    }

    /// Builder: set bottom and bottom-assistor offsets.
    pub fn with_bottom_offsets(mut self, bottom: f32, assistor: f32) -> Self {
        self.bottom_offset = bottom;
        self.bottom_assistor_offset = assistor;
        self
    }

    /// Builder: set the forward/backward probe angle (degrees).
    pub fn with_probe_angle(mut self, degrees: f32) -> Self {
        self.forward_backward_angle = degrees;
        self
    }

    /// Builder: set stick and surface probe lengths.
    pub fn with_distances(mut self, stick: f32, surface: f32) -> Self {
        self.stick_distance = stick;
        self.surface_distance = surface;
        self
    }

    /// Builder: set the squared distance tolerance.
    pub fn with_tolerance_sq(mut self, tolerance_sq: f32) -> Self {
        self.distance_tolerance_sq = tolerance_sq;
        self
    }

    /// Builder: set the stick interpolation speed.
    pub fn with_stick_speed(mut self, speed: f32) -> Self {
        self.stick_speed = speed;
        self
    }

    /// Builder: set turn and transition rates (degrees per second).
    pub fn with_rates(mut self, rotation: f32, transition: f32) -> Self {
        self.rotation_rate = rotation;
        self.transition_rate = transition;
        self
    }

    /// Builder: enable or disable sticking while airborne.
    pub fn with_stick_when_airborne(mut self, enabled: bool) -> Self {
        self.stick_when_airborne = enabled;
        self
    }

    /// Builder: enable or disable the convex-edge nudge.
    pub fn with_offset_on_convex_cross(mut self, enabled: bool) -> Self {
        self.offset_on_convex_cross = enabled;
        self
    }

    /// Builder: only probe while moving.
    pub fn with_probe_only_when_moving(mut self, enabled: bool) -> Self {
        self.probe_only_when_moving = enabled;
        self
    }

    /// Builder: snap to the surface below at start.
    pub fn with_force_stick_at_start(mut self, enabled: bool) -> Self {
        self.force_stick_at_start = enabled;
        self
    }

    /// Builder: turn toward movement on planes.
    pub fn with_orient_to_movement(mut self, enabled: bool) -> Self {
        self.orient_to_movement = enabled;
        self
    }

    /// Builder: use the custom rotation notification.
    pub fn with_custom_rotation_rate(mut self, enabled: bool) -> Self {
        self.use_custom_rotation_rate = enabled;
        self
    }

    /// Builder: set the probe filter.
    pub fn with_filter(mut self, filter: ProbeFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Builder: emit debug probe events.
    pub fn with_debug_probes(mut self, enabled: bool) -> Self {
        self.debug_probes = enabled;
        self
    }

    /// Forward/backward probe angle in radians.
    #[inline]
    pub fn forward_backward_radians(&self) -> f32 {
        self.forward_backward_angle.to_radians()
    }

    /// Left/right probe angle in radians.
    #[inline]
    pub fn left_right_radians(&self) -> f32 {
        self.left_right_angle.to_radians()
    }
}

/// Baseline distances computed once when the walker is initialized.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub struct ReferenceDistances {
    /// Squared distance from the eye to the feet plane along the forward probe.
    pub surface_sq: f32,
    /// Squared distance between the feet and the character origin.
    pub transition_sq: f32,
}

/// Runtime state of a surface walker.
///
/// Owned exclusively by its entity; mutated only by the locomotion loop.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
#[require(SurfaceWalkerConfig, LocomotionState, Transform)]
pub struct SurfaceWalker {
    /// Surface state computed on the most recent frame.
    pub(crate) last_surface: SurfaceState,

    /// Surface normal the walker wants to align with this frame.
    pub(crate) surface_normal: Vec3,

    /// Whether the current frame deferred a stick to the surface normal.
    pub(crate) needs_stick: bool,

    /// Whether bottom and assistor probes agreed on a plane (Plane frames only).
    pub(crate) plane_confirmed: bool,

    /// Session-constant classifier baselines.
    pub(crate) reference: ReferenceDistances,

    /// Half the vertical collision extent (origin to feet).
    pub(crate) feet_offset: f32,

    /// Set once reference distances are computed.
    pub(crate) initialized: bool,

    /// Probes of the most recent frame.
    #[reflect(ignore)]
    pub(crate) last_trace: Option<TraceResult>,
}

impl Default for SurfaceWalker {
    fn default() -> Self {
        Self {
            last_surface: SurfaceState::OnAir,
            surface_normal: Vec3::Y,
            needs_stick: false,
            plane_confirmed: false,
            reference: ReferenceDistances::default(),
            feet_offset: 0.0,
            initialized: false,
            last_trace: None,
        }
    }
}

impl SurfaceWalker {
    /// Create a new, uninitialized walker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently computed surface state.
    #[inline]
    pub fn surface(&self) -> SurfaceState {
        self.last_surface
    }

    /// Surface normal resolved on the most recent frame.
    #[inline]
    pub fn surface_normal(&self) -> Vec3 {
        self.surface_normal
    }

    /// Whether the most recent frame requested a stick to the surface.
    #[inline]
    pub fn needs_stick(&self) -> bool {
        self.needs_stick
    }

    /// Whether the most recent Plane frame was confirmed by the assistor probe.
    #[inline]
    pub fn is_plane_confirmed(&self) -> bool {
        self.plane_confirmed
    }

    /// Session reference distances.
    #[inline]
    pub fn reference(&self) -> ReferenceDistances {
        self.reference
    }

    /// Distance from the origin to the feet.
    #[inline]
    pub fn feet_offset(&self) -> f32 {
        self.feet_offset
    }

    /// Whether reference distances have been computed.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Probes of the most recent frame, if any.
    pub fn last_trace(&self) -> Option<&TraceResult> {
        self.last_trace.as_ref()
    }

    /// Reset per-frame scratch state (called at the start of each loop iteration).
    pub(crate) fn reset_frame(&mut self, up: Vec3) {
        self.surface_normal = up;
        self.needs_stick = false;
        self.plane_confirmed = false;
    }
}
