use thiserror::Error;

use super::EntityHandle;

/// Errors that can occur during entity slot operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// Every index below the invalid-handle sentinel is in use
    #[error("All {capacity} entity slots are in use")]
    SlotsExhausted { capacity: usize },

    /// The handle's slot is free or has been reused since the handle was taken
    #[error("Entity {handle} does not exist (stale or never allocated)")]
    StaleHandle { handle: EntityHandle },
}
