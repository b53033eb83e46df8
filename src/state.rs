//! Movement state and state marker components.
//!
//! [`LocomotionState`] is the host-facing movement mode the loop switches
//! between walking and surface-flying. The marker components mirror the
//! current [`SurfaceState`] so gameplay code can filter queries on them.

use bevy::prelude::*;

use crate::surface::SurfaceState;

/// How the host should move the character.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MovementMode {
    /// Regular ground walking under gravity (upright surfaces).
    #[default]
    Walking,
    /// Gravity-free movement used while walking on walls and ceilings.
    Flying,
}

/// Movement settings written by the locomotion loop through the backend.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct LocomotionState {
    /// Current movement mode.
    pub mode: MovementMode,
    /// Whether gravity applies to the character.
    pub gravity_enabled: bool,
    /// Whether the host should orient the character toward its movement.
    pub orient_to_movement: bool,
    /// Turn rate vector: degrees per second around its direction.
    pub rotation_rate: Vec3,
}

impl Default for LocomotionState {
    fn default() -> Self {
        Self {
            mode: MovementMode::Walking,
            gravity_enabled: true,
            orient_to_movement: true,
            rotation_rate: Vec3::ZERO,
        }
    }
}

impl LocomotionState {
    /// Check if walking under gravity.
    pub fn is_walking(&self) -> bool {
        self.mode == MovementMode::Walking
    }

    /// Check if flying against a surface.
    pub fn is_flying(&self) -> bool {
        self.mode == MovementMode::Flying
    }
}

/// Marker component indicating the walker is on a surface (Plane, Convex or Concave).
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct OnSurface;

/// Marker component indicating no classification probe found a surface.
///
/// Mutually exclusive with [`OnSurface`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Marker component present while the walker crosses a convex edge.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct CrossingEdge;

/// Which markers a surface state maps to: (on surface, airborne, crossing edge).
pub fn markers_for(surface: SurfaceState) -> (bool, bool, bool) {
    match surface {
        SurfaceState::OnAir => (false, true, false),
        SurfaceState::Plane | SurfaceState::Concave => (true, false, false),
        SurfaceState::Convex => (true, false, true),
    }
}
