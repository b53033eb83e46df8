//! Surface topology classification.
//!
//! Combines the forward, backward and bottom probe classifications into a
//! single [`SurfaceState`].

use bevy::prelude::*;

use crate::detection::{ClassifiedCast, DistanceRelation};

/// Per-component tolerance when comparing the bottom and assistor normals.
pub const PLANE_NORMAL_TOLERANCE: f32 = 0.01;

/// Shape of the terrain under and in front of the character.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SurfaceState {
    /// No surface in reach of any classification probe.
    OnAir,
    /// Flat surface.
    #[default]
    Plane,
    /// Ground drops away beneath the character (an outer edge).
    Convex,
    /// A surface rises in front of the character (an inner corner).
    Concave,
}

impl SurfaceState {
    /// Three-way classification in strict priority order: Concave, Convex, Plane.
    ///
    /// This never returns [`SurfaceState::OnAir`]; see [`detect_surface`].
    pub fn classify(
        forward: &ClassifiedCast,
        backward: &ClassifiedCast,
        bottom: &ClassifiedCast,
    ) -> Self {
        if is_concave(forward, backward, bottom) {
            return SurfaceState::Concave;
        }

        if is_convex(forward, backward, bottom) {
            return SurfaceState::Convex;
        }

        SurfaceState::Plane
    }

    /// Whether the character is touching any surface in this state.
    pub fn is_on_surface(&self) -> bool {
        !matches!(self, SurfaceState::OnAir)
    }
}

/// Forward probe hit closer than the reference: a wall rises ahead.
pub fn is_concave(forward: &ClassifiedCast, _backward: &ClassifiedCast, _bottom: &ClassifiedCast) -> bool {
    forward.relation == DistanceRelation::LessThan
}

/// Bottom probe found the ground farther than the reference, or not at all.
pub fn is_convex(_forward: &ClassifiedCast, _backward: &ClassifiedCast, bottom: &ClassifiedCast) -> bool {
    bottom.relation == DistanceRelation::GreaterThan
}

/// All three classification probes report far or absent surfaces.
pub fn is_on_air(forward: &ClassifiedCast, backward: &ClassifiedCast, bottom: &ClassifiedCast) -> bool {
    forward.relation == DistanceRelation::GreaterThan
        && backward.relation == DistanceRelation::GreaterThan
        && bottom.relation == DistanceRelation::GreaterThan
}

/// Bottom and assistor probes both hit and agree on the surface normal.
///
/// Gates plane-specific reactions; does not change the classified state.
pub fn is_plane_confirmed(bottom: &ClassifiedCast, assistor: &ClassifiedCast) -> bool {
    bottom.hit()
        && assistor.hit()
        && assistor
            .cast
            .normal
            .abs_diff_eq(bottom.cast.normal, PLANE_NORMAL_TOLERANCE)
}

/// Classification used by the locomotion loop.
///
/// A frame where forward, backward and bottom all report `GreaterThan` is
/// OnAir. Otherwise [`SurfaceState::classify`] decides, so a forward
/// `LessThan` is always Concave.
pub fn detect_surface(
    forward: &ClassifiedCast,
    backward: &ClassifiedCast,
    bottom: &ClassifiedCast,
) -> SurfaceState {
    if is_on_air(forward, backward, bottom) {
        return SurfaceState::OnAir;
    }
    SurfaceState::classify(forward, backward, bottom)
}

/// Snapshot of one environment trace: the three classified probes and the state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TraceResult {
    pub forward: ClassifiedCast,
    pub backward: ClassifiedCast,
    pub bottom: ClassifiedCast,
    pub surface: SurfaceState,
}

impl TraceResult {
    /// Build a trace result from three classified casts using the three-way classifier.
    pub fn new(forward: ClassifiedCast, backward: ClassifiedCast, bottom: ClassifiedCast) -> Self {
        let surface = SurfaceState::classify(&forward, &backward, &bottom);
        Self {
            forward,
            backward,
            bottom,
            surface,
        }
    }
}
