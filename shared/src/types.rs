/// Server simulation tick, wrapping at `u16::MAX`
pub type Tick = u16;
/// Compact id assigned to each registered class, in registration order
pub type ClassId = u16;
/// Slot index of an entity in the server's slot table
pub type EntityIndex = u16;
/// Generation counter of an entity slot, `SERIAL_BITS` wide on the wire
pub type Serial = u16;
/// Position of a property in a class's flattened schema
pub type PropertyIndex = u16;
