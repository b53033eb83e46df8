//! Binding of controller entities (AI or player) to surface walker pawns.

use bevy::prelude::*;

use crate::config::SurfaceWalker;

/// Errors raised when binding a controller to a pawn.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PossessError {
    #[error("entity {0:?} is not a surface walker")]
    NotASurfaceWalker(Entity),
    #[error("controller entity {0:?} does not exist")]
    MissingController(Entity),
}

/// Controller side of a possession: which pawn this entity drives.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[reflect(Component)]
pub struct WalkerController {
    pawn: Option<Entity>,
}

impl WalkerController {
    /// The possessed pawn, if any.
    pub fn pawn(&self) -> Option<Entity> {
        self.pawn
    }

    /// Check if the controller currently drives a pawn.
    pub fn is_possessing(&self) -> bool {
        self.pawn.is_some()
    }
}

/// Bind `controller` to `pawn`.
///
/// Only surface walkers can be possessed. A rejected pawn is a configuration
/// error and is logged as such; the controller is left unchanged.
pub fn possess(world: &mut World, controller: Entity, pawn: Entity) -> Result<(), PossessError> {
    if world.get::<SurfaceWalker>(pawn).is_none() {
        error!("Controller {:?} cannot possess {:?}: not a surface walker", controller, pawn);
        return Err(PossessError::NotASurfaceWalker(pawn));
    }

    let Ok(mut entity) = world.get_entity_mut(controller) else {
        error!("Controller {:?} does not exist", controller);
        return Err(PossessError::MissingController(controller));
    };

    entity.insert(WalkerController { pawn: Some(pawn) });
    info!("Controller {:?} possessed {:?}", controller, pawn);
    Ok(())
}

/// Release the pawn driven by `controller`, returning it.
pub fn unpossess(world: &mut World, controller: Entity) -> Option<Entity> {
    let mut binding = world.get_mut::<WalkerController>(controller)?;
    let pawn = binding.pawn.take();
    if let Some(pawn) = pawn {
        debug!("Controller {:?} released {:?}", controller, pawn);
    }
    pawn
}
