use thiserror::Error;

use crate::value::ValueKind;

use super::PropertyKind;

/// Errors that can occur while building class schemas. All of them are
/// fatal: a protocol that fails to build must not be used.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// Two flattened properties of one class share a name
    #[error("Class `{class}` flattens two properties named `{name}`. Exclude one of them or rename it")]
    DuplicateProperty { class: String, name: String },

    /// A table nests or extends itself, directly or through other tables
    #[error("Table cycle: {chain}")]
    Cycle { chain: String },

    /// An exclusion names a property the table doesn't inherit
    #[error("Table `{table}` excludes `{excluded_table}.{property}`, which it does not inherit")]
    DanglingExclusion {
        table: String,
        excluded_table: String,
        property: String,
    },

    /// A parent, nested table or class table was never added to the protocol
    #[error("Table `{table}` referenced by `{referenced_by}` was never added")]
    UnknownTable { table: String, referenced_by: String },

    /// Two tables registered under one name
    #[error("Table `{table}` was added more than once")]
    DuplicateTable { table: String },

    /// A class type or class name registered twice
    #[error("Class `{class}` was added more than once")]
    DuplicateClass { class: String },

    /// The declared width can't carry the declared range
    #[error("Property `{property}` needs more than {bits} bits for the range {low}..={high}")]
    InsufficientBits {
        property: String,
        bits: u8,
        low: f64,
        high: f64,
    },

    /// The declared width is outside what this kind supports
    #[error("Property `{property}` of kind {kind:?} can't be encoded in {bits} bits")]
    UnsupportedWidth {
        property: String,
        kind: PropertyKind,
        bits: u8,
    },

    /// Empty, inverted or non-finite quantization range
    #[error("Property `{property}` has an invalid range {low}..{high}")]
    InvalidRange {
        property: String,
        low: f64,
        high: f64,
    },

    #[error("Property `{property}` has no accessor")]
    MissingAccessor { property: String },

    /// The accessor produces values of another kind than the property encodes
    #[error("Property `{property}` of kind {kind:?} is bound to an accessor of kind {value_kind:?}")]
    AccessorKindMismatch {
        property: String,
        kind: PropertyKind,
        value_kind: ValueKind,
    },

    /// A lens or accessor is declared over a different type than the one it
    /// is reached from
    #[error("Class `{class}` reaches property `{property}` through `{found}`, but it is declared over `{expected}`")]
    TypeMismatch {
        class: String,
        property: String,
        expected: &'static str,
        found: &'static str,
    },

    /// An entity handle property can't address every slot of the protocol
    #[error("Entity handle property `{property}` has {bits} index bits, the protocol uses {required}")]
    HandleIndexBits {
        property: String,
        bits: u8,
        required: u8,
    },

    /// Ids are `u16` on the wire
    #[error("`{name}` has {count} entries, more than a u16 id can address")]
    TooMany { name: String, count: usize },
}
