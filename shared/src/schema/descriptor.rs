use std::{any::Any, fmt, ops::BitOr};

use crate::{
    constants::{DEFAULT_ENTITY_INDEX_BITS, MAX_ENTITY_INDEX_BITS},
    value::{PropertyType, ValueKind},
};

use super::{Accessor, Lens, SchemaError};

/// Semantic kind of a declared property; selects the wire codec
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Int,
    Bool,
    Float,
    Vector,
    Angle,
    String,
    EntityHandle,
    NestedTable,
}

impl PropertyKind {
    /// Value kind an accessor for this property must produce
    pub fn value_kind(&self) -> Option<ValueKind> {
        match self {
            PropertyKind::Int => Some(ValueKind::Int),
            PropertyKind::Bool => Some(ValueKind::Bool),
            PropertyKind::Float | PropertyKind::Angle => Some(ValueKind::Float),
            PropertyKind::Vector => Some(ValueKind::Vector),
            PropertyKind::String => Some(ValueKind::String),
            PropertyKind::EntityHandle => Some(ValueKind::Entity),
            PropertyKind::NestedTable => None,
        }
    }

    pub(crate) fn tag(&self) -> u8 {
        match self {
            PropertyKind::Int => 0,
            PropertyKind::Bool => 1,
            PropertyKind::Float => 2,
            PropertyKind::Vector => 3,
            PropertyKind::Angle => 4,
            PropertyKind::String => 5,
            PropertyKind::EntityHandle => 6,
            PropertyKind::NestedTable => 7,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PropertyFlags(u8);

impl PropertyFlags {
    pub const NONE: Self = Self(0);
    /// Never deferred by the update budget
    pub const CHANGES_OFTEN: Self = Self(1);
    /// Declared but left out of the flattened schema
    pub const EXCLUDE: Self = Self(1 << 1);

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn bits(&self) -> u8 {
        self.0
    }
}

impl BitOr for PropertyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Bounds {
    Unbounded,
    Int { low: i64, high: i64 },
    Float { low: f32, high: f32 },
}

#[derive(Clone, Debug)]
struct NestedLink {
    table: String,
    lens: Lens,
}

/// One networked field of a property table.
#[derive(Clone)]
pub struct PropertyDescriptor {
    name: String,
    kind: PropertyKind,
    bit_count: u8,
    bounds: Bounds,
    flags: PropertyFlags,
    accessor: Option<Accessor>,
    nested: Option<NestedLink>,
}

impl PropertyDescriptor {
    fn new(name: &str, kind: PropertyKind, bit_count: u8, bounds: Bounds) -> Self {
        Self {
            name: name.to_string(),
            kind,
            bit_count,
            bounds,
            flags: PropertyFlags::NONE,
            accessor: None,
            nested: None,
        }
    }

    /// Unsigned integer covering the full `0..2^bits` range. Narrow or
    /// signed ranges are declared with `with_range`.
    pub fn int(name: &str, bits: u8) -> Self {
        let high = if bits >= 63 {
            i64::MAX
        } else {
            (1i64 << bits) - 1
        };
        Self::new(name, PropertyKind::Int, bits, Bounds::Int { low: 0, high })
    }

    pub fn bool(name: &str) -> Self {
        Self::new(name, PropertyKind::Bool, 1, Bounds::Int { low: 0, high: 1 })
    }

    pub fn float(name: &str, bits: u8, low: f32, high: f32) -> Self {
        Self::new(name, PropertyKind::Float, bits, Bounds::Float { low, high })
    }

    /// Three axes, each quantized like a `float` over the same range
    pub fn vector(name: &str, bits: u8, low: f32, high: f32) -> Self {
        Self::new(name, PropertyKind::Vector, bits, Bounds::Float { low, high })
    }

    /// Degrees, wrapped into `[0, 360)`
    pub fn angle(name: &str, bits: u8) -> Self {
        Self::new(
            name,
            PropertyKind::Angle,
            bits,
            Bounds::Float {
                low: 0.0,
                high: 360.0,
            },
        )
    }

    /// `length_bits` bounds the byte length: strings hold fewer than
    /// `2^length_bits` bytes on the wire.
    pub fn string(name: &str, length_bits: u8) -> Self {
        Self::new(name, PropertyKind::String, length_bits, Bounds::Unbounded)
    }

    pub fn entity_handle(name: &str) -> Self {
        Self::new(
            name,
            PropertyKind::EntityHandle,
            DEFAULT_ENTITY_INDEX_BITS,
            Bounds::Unbounded,
        )
    }

    /// Inlines every property of `table`, reached through `lens`, under
    /// `name.` in the flattened schema.
    pub fn nested(name: &str, table: &str, lens: Lens) -> Self {
        let mut descriptor = Self::new(name, PropertyKind::NestedTable, 0, Bounds::Unbounded);
        descriptor.nested = Some(NestedLink {
            table: table.to_string(),
            lens,
        });
        descriptor
    }

    /// Integer range; a negative `low` adds a sign bit on the wire.
    pub fn with_range(mut self, low: i64, high: i64) -> Self {
        self.bounds = Bounds::Int { low, high };
        self
    }

    pub fn with_bits(mut self, bits: u8) -> Self {
        self.bit_count = bits;
        self
    }

    pub fn with_flags(mut self, flags: PropertyFlags) -> Self {
        self.flags.insert(flags);
        self
    }

    pub fn changes_often(self) -> Self {
        self.with_flags(PropertyFlags::CHANGES_OFTEN)
    }

    pub fn excluded(self) -> Self {
        self.with_flags(PropertyFlags::EXCLUDE)
    }

    pub fn with_accessor(mut self, accessor: Accessor) -> Self {
        self.accessor = Some(accessor);
        self
    }

    /// Binds the getter/setter pair over the struct that declares the field.
    pub fn bind<T: Any, V: PropertyType>(self, get: fn(&T) -> V, set: fn(&mut T, V)) -> Self {
        self.with_accessor(Accessor::new(get, set))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    pub fn bit_count(&self) -> u8 {
        self.bit_count
    }

    pub fn flags(&self) -> PropertyFlags {
        self.flags
    }

    pub fn changes_often_flag(&self) -> bool {
        self.flags.contains(PropertyFlags::CHANGES_OFTEN)
    }

    pub fn is_excluded(&self) -> bool {
        self.flags.contains(PropertyFlags::EXCLUDE)
    }

    pub fn low_value(&self) -> f64 {
        match self.bounds {
            Bounds::Unbounded => 0.0,
            Bounds::Int { low, .. } => low as f64,
            Bounds::Float { low, .. } => f64::from(low),
        }
    }

    pub fn high_value(&self) -> f64 {
        match self.bounds {
            Bounds::Unbounded => 0.0,
            Bounds::Int { high, .. } => high as f64,
            Bounds::Float { high, .. } => f64::from(high),
        }
    }

    pub fn int_range(&self) -> Option<(i64, i64)> {
        match self.bounds {
            Bounds::Int { low, high } => Some((low, high)),
            _ => None,
        }
    }

    pub fn float_range(&self) -> Option<(f32, f32)> {
        match self.bounds {
            Bounds::Float { low, high } => Some((low, high)),
            _ => None,
        }
    }

    /// Whether integer values carry a sign bit
    pub fn is_signed(&self) -> bool {
        matches!(self.bounds, Bounds::Int { low, .. } if low < 0)
    }

    pub fn accessor(&self) -> Option<&Accessor> {
        self.accessor.as_ref()
    }

    pub fn nested_table(&self) -> Option<&str> {
        self.nested.as_ref().map(|link| link.table.as_str())
    }

    pub fn nested_lens(&self) -> Option<&Lens> {
        self.nested.as_ref().map(|link| &link.lens)
    }

    /// Checks that the declared width can carry the declared range and that
    /// a leaf has an accessor producing the right value kind.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let unsupported = || SchemaError::UnsupportedWidth {
            property: self.name.clone(),
            kind: self.kind,
            bits: self.bit_count,
        };

        match self.kind {
            PropertyKind::NestedTable => return Ok(()),
            PropertyKind::Int => {
                if !(1..=63).contains(&self.bit_count) {
                    return Err(unsupported());
                }
                let (low, high) = self.int_range().ok_or_else(unsupported)?;
                if low > high {
                    return Err(SchemaError::InvalidRange {
                        property: self.name.clone(),
                        low: low as f64,
                        high: high as f64,
                    });
                }
                let limit = 1u64 << self.bit_count;
                let fits = if low >= 0 {
                    (high as u64) < limit
                } else {
                    low.unsigned_abs().max(high.unsigned_abs()) < limit
                };
                if !fits {
                    return Err(SchemaError::InsufficientBits {
                        property: self.name.clone(),
                        bits: self.bit_count,
                        low: low as f64,
                        high: high as f64,
                    });
                }
            }
            PropertyKind::Bool => {
                if self.bit_count != 1 {
                    return Err(unsupported());
                }
            }
            PropertyKind::Float | PropertyKind::Vector => {
                if !(1..=32).contains(&self.bit_count) {
                    return Err(unsupported());
                }
                let (low, high) = self.float_range().ok_or_else(unsupported)?;
                if !low.is_finite() || !high.is_finite() || low >= high {
                    return Err(SchemaError::InvalidRange {
                        property: self.name.clone(),
                        low: f64::from(low),
                        high: f64::from(high),
                    });
                }
            }
            PropertyKind::Angle => {
                if !(1..=32).contains(&self.bit_count) {
                    return Err(unsupported());
                }
            }
            PropertyKind::String => {
                if !(1..=16).contains(&self.bit_count) {
                    return Err(unsupported());
                }
            }
            PropertyKind::EntityHandle => {
                if !(1..=MAX_ENTITY_INDEX_BITS).contains(&self.bit_count) {
                    return Err(unsupported());
                }
            }
        }

        let accessor = self.accessor.as_ref().ok_or_else(|| SchemaError::MissingAccessor {
            property: self.name.clone(),
        })?;
        if self.kind.value_kind() != Some(accessor.value_kind()) {
            return Err(SchemaError::AccessorKindMismatch {
                property: self.name.clone(),
                kind: self.kind,
                value_kind: accessor.value_kind(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("PropertyDescriptor");
        debug
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("bit_count", &self.bit_count)
            .field("low", &self.low_value())
            .field("high", &self.high_value())
            .field("flags", &self.flags);
        if let Some(table) = self.nested_table() {
            debug.field("nested", &table);
        }
        debug.finish()
    }
}
