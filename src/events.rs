//! Notifications sent by the locomotion loop.

use bevy::prelude::*;

use crate::probe::ProbeKind;
use crate::surface::SurfaceState;

/// The classified surface changed between two consecutive frames.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct SurfaceChanged {
    pub entity: Entity,
    pub previous: SurfaceState,
    pub current: SurfaceState,
    /// Surface normal resolved on the frame of the change.
    pub normal: Vec3,
}

/// The walker started crossing a convex edge (sent every Convex frame).
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossSurfaceBegin {
    pub entity: Entity,
}

/// The walker left a convex edge.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossSurfaceEnd {
    pub entity: Entity,
}

/// Sent instead of the default turn-rate update when
/// [`crate::config::SurfaceWalkerConfig::use_custom_rotation_rate`] is set.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomRotationUpdate {
    pub entity: Entity,
}

/// Debug record of a single probe ray.
///
/// Only sent when [`crate::config::SurfaceWalkerConfig::debug_probes`] is set.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ProbeTraced {
    pub entity: Entity,
    pub kind: ProbeKind,
    pub origin: Vec3,
    pub end: Vec3,
    /// Impact point and normal, if the probe hit.
    pub impact: Option<(Vec3, Vec3)>,
}
