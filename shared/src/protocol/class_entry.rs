use std::{
    any::{type_name, Any, TypeId},
    fmt,
    sync::Arc,
};

use crate::{schema::FlattenedSchema, types::ClassId};

/// A live replicated object, owned by the server world or the client mirror
pub type Instance = Box<dyn Any + Send + Sync>;

/// Ties a class to the Rust type that implements it, so the receiving side
/// can construct a fresh instance before applying its first full update.
#[derive(Clone, Copy)]
pub struct ClassBinding {
    type_id: TypeId,
    type_name: &'static str,
    constructor: fn() -> Instance,
}

fn construct<T: Default + Any + Send + Sync>() -> Instance {
    Box::new(T::default())
}

impl ClassBinding {
    pub fn of<T: Default + Any + Send + Sync>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            constructor: construct::<T>,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn construct(&self) -> Instance {
        (self.constructor)()
    }
}

impl fmt::Debug for ClassBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassBinding({})", self.type_name)
    }
}

/// A registered class: its id, its flattened schema and its Rust binding
#[derive(Clone, Debug)]
pub struct ClassEntry {
    id: ClassId,
    name: String,
    schema: Arc<FlattenedSchema>,
    binding: ClassBinding,
}

impl ClassEntry {
    pub(crate) fn new(id: ClassId, name: &str, schema: FlattenedSchema, binding: ClassBinding) -> Self {
        Self {
            id,
            name: name.to_string(),
            schema: Arc::new(schema),
            binding,
        }
    }

    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Arc<FlattenedSchema> {
        &self.schema
    }

    pub fn binding(&self) -> &ClassBinding {
        &self.binding
    }

    pub fn construct(&self) -> Instance {
        self.binding.construct()
    }
}
