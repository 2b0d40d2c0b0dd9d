use std::{
    any::{type_name, Any, TypeId},
    fmt,
    sync::Arc,
};

use thiserror::Error;

use crate::value::{PropertyType, PropertyValue, ValueKind};

/// Errors that can occur while reading or writing a property through its
/// accessor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The instance handed to an accessor or lens is not the type it was declared over
    #[error("Expected an instance of `{expected}`")]
    InstanceTypeMismatch { expected: &'static str },

    /// The value handed to a setter has another kind, or doesn't fit its field type
    #[error("Setter over `{field}` can't accept a value of kind {actual:?}")]
    ValueMismatch {
        field: &'static str,
        actual: ValueKind,
    },

    /// The flattened schema has no property at this index
    #[error("No property at index {index} (schema has {len})")]
    IndexOutOfBounds { index: usize, len: usize },
}

trait ErasedAccessor: Send + Sync {
    fn get(&self, instance: &dyn Any) -> Result<PropertyValue, AccessError>;
    fn set(&self, instance: &mut dyn Any, value: PropertyValue) -> Result<(), AccessError>;
}

struct TypedAccessor<T, V> {
    get: fn(&T) -> V,
    set: fn(&mut T, V),
}

impl<T: Any, V: PropertyType> ErasedAccessor for TypedAccessor<T, V> {
    fn get(&self, instance: &dyn Any) -> Result<PropertyValue, AccessError> {
        let instance = instance
            .downcast_ref::<T>()
            .ok_or(AccessError::InstanceTypeMismatch {
                expected: type_name::<T>(),
            })?;
        Ok((self.get)(instance).into_value())
    }

    fn set(&self, instance: &mut dyn Any, value: PropertyValue) -> Result<(), AccessError> {
        let instance = instance
            .downcast_mut::<T>()
            .ok_or(AccessError::InstanceTypeMismatch {
                expected: type_name::<T>(),
            })?;
        let actual = value.kind();
        let value = V::from_value(value).ok_or(AccessError::ValueMismatch {
            field: type_name::<V>(),
            actual,
        })?;
        (self.set)(instance, value);
        Ok(())
    }
}

/// A typed getter/setter pair, erased so that descriptors of different
/// owner types can live in one table.
#[derive(Clone)]
pub struct Accessor {
    inner: Arc<dyn ErasedAccessor>,
    owner: TypeId,
    owner_name: &'static str,
    value_kind: ValueKind,
}

impl Accessor {
    pub fn new<T: Any, V: PropertyType>(get: fn(&T) -> V, set: fn(&mut T, V)) -> Self {
        Self {
            inner: Arc::new(TypedAccessor { get, set }),
            owner: TypeId::of::<T>(),
            owner_name: type_name::<T>(),
            value_kind: V::KIND,
        }
    }

    pub fn owner(&self) -> TypeId {
        self.owner
    }

    pub fn owner_name(&self) -> &'static str {
        self.owner_name
    }

    pub fn value_kind(&self) -> ValueKind {
        self.value_kind
    }

    pub fn get(&self, instance: &dyn Any) -> Result<PropertyValue, AccessError> {
        self.inner.get(instance)
    }

    pub fn set(&self, instance: &mut dyn Any, value: PropertyValue) -> Result<(), AccessError> {
        self.inner.set(instance, value)
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("owner", &self.owner_name)
            .field("value_kind", &self.value_kind)
            .finish()
    }
}

trait ErasedLens: Send + Sync {
    fn project<'a>(&self, parent: &'a dyn Any) -> Result<&'a dyn Any, AccessError>;
    fn project_mut<'a>(&self, parent: &'a mut dyn Any) -> Result<&'a mut dyn Any, AccessError>;
}

struct TypedLens<P, C> {
    get: fn(&P) -> &C,
    get_mut: fn(&mut P) -> &mut C,
}

impl<P: Any, C: Any> ErasedLens for TypedLens<P, C> {
    fn project<'a>(&self, parent: &'a dyn Any) -> Result<&'a dyn Any, AccessError> {
        let parent = parent
            .downcast_ref::<P>()
            .ok_or(AccessError::InstanceTypeMismatch {
                expected: type_name::<P>(),
            })?;
        let child: &'a dyn Any = (self.get)(parent);
        Ok(child)
    }

    fn project_mut<'a>(&self, parent: &'a mut dyn Any) -> Result<&'a mut dyn Any, AccessError> {
        let parent = parent
            .downcast_mut::<P>()
            .ok_or(AccessError::InstanceTypeMismatch {
                expected: type_name::<P>(),
            })?;
        let child: &'a mut dyn Any = (self.get_mut)(parent);
        Ok(child)
    }
}

/// Projection from a struct to one it embeds: how a derived class reaches
/// the fields of its parent table, or a table reaches a nested one.
#[derive(Clone)]
pub struct Lens {
    inner: Arc<dyn ErasedLens>,
    source: TypeId,
    source_name: &'static str,
    target: TypeId,
    target_name: &'static str,
}

impl Lens {
    pub fn new<P: Any, C: Any>(get: fn(&P) -> &C, get_mut: fn(&mut P) -> &mut C) -> Self {
        Self {
            inner: Arc::new(TypedLens { get, get_mut }),
            source: TypeId::of::<P>(),
            source_name: type_name::<P>(),
            target: TypeId::of::<C>(),
            target_name: type_name::<C>(),
        }
    }

    pub fn source(&self) -> TypeId {
        self.source
    }

    pub fn source_name(&self) -> &'static str {
        self.source_name
    }

    pub fn target(&self) -> TypeId {
        self.target
    }

    pub fn target_name(&self) -> &'static str {
        self.target_name
    }

    pub fn project<'a>(&self, parent: &'a dyn Any) -> Result<&'a dyn Any, AccessError> {
        self.inner.project(parent)
    }

    pub fn project_mut<'a>(&self, parent: &'a mut dyn Any) -> Result<&'a mut dyn Any, AccessError> {
        self.inner.project_mut(parent)
    }
}

impl fmt::Debug for Lens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lens({} -> {})", self.source_name, self.target_name)
    }
}
