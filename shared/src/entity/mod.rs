mod error;
mod handle;
mod slots;

pub use error::EntityError;
pub use handle::EntityHandle;
pub use slots::{EntitySlots, SerialLookup};
