//! # `surface_walker`
//!
//! Surface-adhering locomotion for Bevy characters, with physics backend abstraction.
//!
//! A surface walker can walk on floors, climb walls and cross onto ceilings:
//! - Probes the geometry around the character with a fan of rays
//! - Compares probe distances against baselines taken at initialization
//! - Classifies the surface as plane, concave corner, convex edge or airborne
//! - Snaps, sticks or turns the character so its up axis follows the surface
//! - Switches between walking under gravity and surface flying
//! - Abstracts the physics backend for easy swapping (Rapier3D included)
//!
//! ## Architecture
//!
//! Each fixed step, for every walker:
//! 1. Forward, backward and bottom probes are cast from the current pose
//! 2. Each hit is classified against the reference distance (closer, equal, farther)
//! 3. The three classifications decide the surface state
//! 4. The state's reaction reorients the character through the backend
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use surface_walker::prelude::*;
//!
//! // Create walker components for a small crawler
//! let walker = SurfaceWalker::new();
//! let config = SurfaceWalkerConfig::crawler().with_stick_speed(60.0);
//!
//! // These can be spawned together with physics components
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod collision;
pub mod config;
pub mod controller;
pub mod debug;
pub mod detection;
pub mod events;
pub mod orientation;
pub mod probe;
pub mod senses;
pub mod state;
pub mod surface;
pub mod systems;

#[cfg(feature = "rapier3d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::{RaycastRequest, SurfaceWalkerBackend};
    pub use crate::collision::CollisionData;
    pub use crate::config::{ProbeFilter, ReferenceDistances, SurfaceWalker, SurfaceWalkerConfig};
    pub use crate::controller::{PossessError, WalkerController};
    pub use crate::debug::SurfaceWalkerDebugPlugin;
    pub use crate::detection::{ClassifiedCast, DistanceRelation, SensorCast};
    pub use crate::events::{CrossSurfaceBegin, CrossSurfaceEnd, CustomRotationUpdate, ProbeTraced, SurfaceChanged};
    pub use crate::probe::ProbeKind;
    pub use crate::senses::SensorRanges;
    pub use crate::state::{Airborne, CrossingEdge, LocomotionState, MovementMode, OnSurface};
    pub use crate::surface::{SurfaceState, TraceResult};
    pub use crate::{SurfaceWalkerPlugin, SurfaceWalkerSet};

    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::Rapier3dBackend;
}

/// System sets of the locomotion schedule, run in order in `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceWalkerSet {
    /// Reference distances and the initial stick of new walkers.
    Preparation,
    /// The per-frame trace and reaction.
    Locomotion,
    /// Marker components.
    Finalize,
}

/// Main plugin for surface walkers.
///
/// This plugin is generic over a physics backend `B` which provides the actual
/// physics operations (raycasting, pose and movement mode).
///
/// # Type Parameters
/// - `B`: The physics backend implementation (e.g., `Rapier3dBackend`)
///
/// # Examples
///
/// With Rapier3D backend:
/// ```rust,ignore
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use surface_walker::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(SurfaceWalkerPlugin::<Rapier3dBackend>::default())
///     .run();
/// ```
pub struct SurfaceWalkerPlugin<B: backend::SurfaceWalkerBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::SurfaceWalkerBackend> Default for SurfaceWalkerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::SurfaceWalkerBackend> Plugin for SurfaceWalkerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<config::SurfaceWalker>();
        app.register_type::<config::SurfaceWalkerConfig>();
        app.register_type::<config::ProbeFilter>();
        app.register_type::<config::ReferenceDistances>();
        app.register_type::<controller::WalkerController>();
        app.register_type::<senses::SensorRanges>();
        app.register_type::<state::LocomotionState>();
        app.register_type::<state::MovementMode>();
        app.register_type::<state::OnSurface>();
        app.register_type::<state::Airborne>();
        app.register_type::<state::CrossingEdge>();
        app.register_type::<surface::SurfaceState>();
        app.register_type::<detection::DistanceRelation>();
        app.register_type::<probe::ProbeKind>();

        app.add_event::<events::SurfaceChanged>();
        app.add_event::<events::CrossSurfaceBegin>();
        app.add_event::<events::CrossSurfaceEnd>();
        app.add_event::<events::CustomRotationUpdate>();
        app.add_event::<events::ProbeTraced>();

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.configure_sets(
            FixedUpdate,
            (
                SurfaceWalkerSet::Preparation,
                SurfaceWalkerSet::Locomotion,
                SurfaceWalkerSet::Finalize,
            )
                .chain(),
        );

        app.add_systems(
            FixedUpdate,
            (
                systems::initialize_walkers::<B>.in_set(SurfaceWalkerSet::Preparation),
                systems::update_surface_walkers::<B>.in_set(SurfaceWalkerSet::Locomotion),
                systems::sync_state_markers.in_set(SurfaceWalkerSet::Finalize),
            ),
        );
    }
}
