use std::fmt;

use crate::entity::EntityHandle;

/// Shape of a runtime property value, independent of how it is encoded
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Bool,
    Float,
    Vector,
    String,
    Entity,
}

/// A property's value as read from (or written to) an entity through its
/// accessor. Angles are carried as `Float`; the descriptor picks the codec.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Int(i64),
    Bool(bool),
    Float(f32),
    Vector([f32; 3]),
    String(String),
    Entity(Option<EntityHandle>),
}

impl PropertyValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            PropertyValue::Int(_) => ValueKind::Int,
            PropertyValue::Bool(_) => ValueKind::Bool,
            PropertyValue::Float(_) => ValueKind::Float,
            PropertyValue::Vector(_) => ValueKind::Vector,
            PropertyValue::String(_) => ValueKind::String,
            PropertyValue::Entity(_) => ValueKind::Entity,
        }
    }

    /// The zero value a freshly constructed mirror starts from
    pub fn default_for(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Int => PropertyValue::Int(0),
            ValueKind::Bool => PropertyValue::Bool(false),
            ValueKind::Float => PropertyValue::Float(0.0),
            ValueKind::Vector => PropertyValue::Vector([0.0; 3]),
            ValueKind::String => PropertyValue::String(String::new()),
            ValueKind::Entity => PropertyValue::Entity(None),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            PropertyValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<[f32; 3]> {
        match self {
            PropertyValue::Vector(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<Option<EntityHandle>> {
        match self {
            PropertyValue::Entity(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Int(value) => write!(f, "{}", value),
            PropertyValue::Bool(value) => write!(f, "{}", value),
            PropertyValue::Float(value) => write!(f, "{}", value),
            PropertyValue::Vector([x, y, z]) => write!(f, "({}, {}, {})", x, y, z),
            PropertyValue::String(value) => write!(f, "{:?}", value),
            PropertyValue::Entity(Some(handle)) => write!(f, "{}", handle),
            PropertyValue::Entity(None) => write!(f, "<none>"),
        }
    }
}

/// A Rust type a typed accessor can get and set.
pub trait PropertyType: Sized + 'static {
    const KIND: ValueKind;

    fn into_value(self) -> PropertyValue;
    /// Returns `None` if the value has another kind or doesn't fit `Self`
    fn from_value(value: PropertyValue) -> Option<Self>;
}

macro_rules! impl_property_type_for_integer {
    ($type:ty) => {
        impl PropertyType for $type {
            const KIND: ValueKind = ValueKind::Int;

            fn into_value(self) -> PropertyValue {
                PropertyValue::Int(i64::from(self))
            }

            fn from_value(value: PropertyValue) -> Option<Self> {
                value.as_int().and_then(|int| <$type>::try_from(int).ok())
            }
        }
    };
}

impl_property_type_for_integer!(i64);
impl_property_type_for_integer!(i32);
impl_property_type_for_integer!(i16);
impl_property_type_for_integer!(i8);
impl_property_type_for_integer!(u32);
impl_property_type_for_integer!(u16);
impl_property_type_for_integer!(u8);

impl PropertyType for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn into_value(self) -> PropertyValue {
        PropertyValue::Bool(self)
    }

    fn from_value(value: PropertyValue) -> Option<Self> {
        value.as_bool()
    }
}

impl PropertyType for f32 {
    const KIND: ValueKind = ValueKind::Float;

    fn into_value(self) -> PropertyValue {
        PropertyValue::Float(self)
    }

    fn from_value(value: PropertyValue) -> Option<Self> {
        value.as_float()
    }
}

impl PropertyType for [f32; 3] {
    const KIND: ValueKind = ValueKind::Vector;

    fn into_value(self) -> PropertyValue {
        PropertyValue::Vector(self)
    }

    fn from_value(value: PropertyValue) -> Option<Self> {
        value.as_vector()
    }
}

impl PropertyType for String {
    const KIND: ValueKind = ValueKind::String;

    fn into_value(self) -> PropertyValue {
        PropertyValue::String(self)
    }

    fn from_value(value: PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::String(value) => Some(value),
            _ => None,
        }
    }
}

impl PropertyType for Option<EntityHandle> {
    const KIND: ValueKind = ValueKind::Entity;

    fn into_value(self) -> PropertyValue {
        PropertyValue::Entity(self)
    }

    fn from_value(value: PropertyValue) -> Option<Self> {
        value.as_entity()
    }
}
