mod accessor;
mod descriptor;
mod error;
mod flatten;
mod table;

pub use accessor::{AccessError, Accessor, Lens};
pub use descriptor::{PropertyDescriptor, PropertyFlags, PropertyKind};
pub use error::SchemaError;
pub use flatten::{flatten, FlatProperty, FlattenedSchema};
pub use table::{PropertyTable, TableSet};
