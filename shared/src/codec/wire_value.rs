use crate::entity::EntityHandle;

/// The quantized form of a property value: exactly what goes on the wire.
/// Two values are "the same on the wire" iff their wire values are equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum WireValue {
    /// Bools, unsigned ints, and float/angle buckets
    Unsigned(u64),
    /// Ints declared with a negative lower bound
    Signed(i64),
    /// One bucket per axis
    Vector([u64; 3]),
    Text(String),
    /// Unresolved `(index, serial)`; `None` is the sentinel
    Handle(Option<EntityHandle>),
}
