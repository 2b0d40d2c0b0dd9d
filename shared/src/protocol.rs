use std::{
    any::{Any, TypeId},
    collections::HashMap,
    hash::{Hash, Hasher},
};

use log::info;
use seahash::SeaHasher;

use crate::{
    codec::sentinel_index,
    constants::{DEFAULT_ENTITY_INDEX_BITS, MAX_ENTITY_INDEX_BITS},
    schema::{flatten, FlatProperty, FlattenedSchema, PropertyKind, PropertyTable, SchemaError, TableSet},
    types::{ClassId, EntityIndex},
};

pub mod class_entry;
pub mod error;

pub use class_entry::{ClassBinding, ClassEntry, Instance};
pub use error::ProtocolError;

// Protocol Plugin
pub trait ProtocolPlugin {
    fn build(&self, protocol: &mut Protocol);
}

struct PendingClass {
    table: String,
    binding: ClassBinding,
}

/// The class registry: every property table, every replicated class with
/// its flattened schema, and the wire parameters both ends must agree on.
/// Built once at startup, then locked and shared.
#[derive(Default)]
pub struct Protocol {
    pending_tables: Vec<PropertyTable>,
    pending_classes: Vec<PendingClass>,
    classes: Vec<ClassEntry>,
    class_types: HashMap<TypeId, ClassId>,
    class_names: HashMap<String, ClassId>,
    entity_index_bits: Option<u8>,
    fingerprint: u64,
    locked: bool,
}

impl Protocol {
    pub fn builder() -> Self {
        Self::default()
    }

    pub fn add_plugin<P: ProtocolPlugin>(&mut self, plugin: P) -> &mut Self {
        self.check_lock();
        plugin.build(self);
        self
    }

    /// Adds a table that classes extend or nest, but that isn't itself a class
    pub fn add_table(&mut self, table: PropertyTable) -> &mut Self {
        self.check_lock();
        self.pending_tables.push(table);
        self
    }

    /// Adds `table` and registers a class named after it, implemented by `T`.
    /// Class ids follow registration order.
    pub fn add_class<T: Default + Any + Send + Sync>(&mut self, table: PropertyTable) -> &mut Self {
        self.check_lock();
        self.pending_classes.push(PendingClass {
            table: table.name().to_string(),
            binding: ClassBinding::of::<T>(),
        });
        self.pending_tables.push(table);
        self
    }

    /// Width of entity slot indices; handle properties must be at least
    /// this wide.
    pub fn set_entity_index_bits(&mut self, bits: u8) -> &mut Self {
        self.check_lock();
        self.entity_index_bits = Some(bits);
        self
    }

    // Non-panicking builder methods

    pub fn try_add_plugin<P: ProtocolPlugin>(&mut self, plugin: P) -> Result<&mut Self, ProtocolError> {
        self.try_check_lock()?;
        plugin.build(self);
        Ok(self)
    }

    pub fn try_add_table(&mut self, table: PropertyTable) -> Result<&mut Self, ProtocolError> {
        self.try_check_lock()?;
        self.pending_tables.push(table);
        Ok(self)
    }

    pub fn try_add_class<T: Default + Any + Send + Sync>(
        &mut self,
        table: PropertyTable,
    ) -> Result<&mut Self, ProtocolError> {
        self.try_check_lock()?;
        Ok(self.add_class::<T>(table))
    }

    pub fn try_entity_index_bits(&mut self, bits: u8) -> Result<&mut Self, ProtocolError> {
        self.try_check_lock()?;
        self.entity_index_bits = Some(bits);
        Ok(self)
    }

    /// Checks if protocol is locked without panicking
    /// Returns Err if protocol is locked
    pub fn try_check_lock(&self) -> Result<(), ProtocolError> {
        if self.locked {
            Err(ProtocolError::AlreadyLocked)
        } else {
            Ok(())
        }
    }

    /// Checks if protocol is locked, panics if it is
    pub fn check_lock(&self) {
        if self.locked {
            panic!("Protocol already locked!");
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Returns Err if `build()` hasn't produced this protocol
    pub fn try_check_built(&self) -> Result<(), ProtocolError> {
        if self.locked {
            Ok(())
        } else {
            Err(ProtocolError::NotBuilt)
        }
    }

    /// Flattens every class, assigns class ids and locks the result.
    ///
    /// # Panics
    ///
    /// Panics if called on an already built protocol.
    pub fn build(&mut self) -> Result<Self, SchemaError> {
        self.check_lock();
        let mut protocol = std::mem::take(self);
        protocol.register_classes()?;
        protocol.fingerprint = protocol.compute_fingerprint();
        protocol.locked = true;
        Ok(protocol)
    }

    fn register_classes(&mut self) -> Result<(), SchemaError> {
        let index_bits = self.entity_index_bits();
        if !(1..=MAX_ENTITY_INDEX_BITS).contains(&index_bits) {
            return Err(SchemaError::UnsupportedWidth {
                property: "entity_index_bits".to_string(),
                kind: PropertyKind::EntityHandle,
                bits: index_bits,
            });
        }

        let mut tables = TableSet::new();
        for table in self.pending_tables.drain(..) {
            tables.insert(table)?;
        }

        let pending_classes = std::mem::take(&mut self.pending_classes);
        if pending_classes.len() > usize::from(ClassId::MAX) {
            return Err(SchemaError::TooMany {
                name: "classes".to_string(),
                count: pending_classes.len(),
            });
        }

        for (position, pending) in pending_classes.into_iter().enumerate() {
            let class_id = position as ClassId;
            if self.class_types.contains_key(&pending.binding.type_id())
                || self.class_names.contains_key(&pending.table)
            {
                return Err(SchemaError::DuplicateClass {
                    class: pending.table,
                });
            }

            let properties = flatten(&tables, &pending.table)?;
            for property in &properties {
                check_reachable(&pending, property)?;
                check_handle_width(property, index_bits)?;
            }

            let schema = FlattenedSchema::new(class_id, &pending.table, properties);
            info!(
                "registered class `{}` ({}) as id {} with {} properties",
                pending.table,
                pending.binding.type_name(),
                class_id,
                schema.len()
            );
            self.class_types.insert(pending.binding.type_id(), class_id);
            self.class_names.insert(pending.table.clone(), class_id);
            self.classes
                .push(ClassEntry::new(class_id, &pending.table, schema, pending.binding));
        }

        Ok(())
    }

    fn compute_fingerprint(&self) -> u64 {
        let mut hasher = SeaHasher::new();
        self.entity_index_bits().hash(&mut hasher);
        for class in &self.classes {
            class.id().hash(&mut hasher);
            class.name().hash(&mut hasher);
            for property in class.schema().iter() {
                let descriptor = property.descriptor();
                property.index().hash(&mut hasher);
                property.name().hash(&mut hasher);
                descriptor.kind().tag().hash(&mut hasher);
                descriptor.bit_count().hash(&mut hasher);
                descriptor.low_value().to_bits().hash(&mut hasher);
                descriptor.high_value().to_bits().hash(&mut hasher);
                descriptor.flags().bits().hash(&mut hasher);
            }
        }
        hasher.finish()
    }

    // Queries

    pub fn class(&self, id: ClassId) -> Option<&ClassEntry> {
        self.classes.get(usize::from(id))
    }

    pub fn class_of<T: Any>(&self) -> Option<&ClassEntry> {
        self.class_of_type(TypeId::of::<T>())
    }

    pub fn class_of_type(&self, type_id: TypeId) -> Option<&ClassEntry> {
        self.class_types
            .get(&type_id)
            .and_then(|id| self.class(*id))
    }

    pub fn class_by_name(&self, name: &str) -> Option<&ClassEntry> {
        self.class_names.get(name).and_then(|id| self.class(*id))
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassEntry> {
        self.classes.iter()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn entity_index_bits(&self) -> u8 {
        self.entity_index_bits.unwrap_or(DEFAULT_ENTITY_INDEX_BITS)
    }

    /// Highest slot index an entity can occupy; the next one is the sentinel
    pub fn max_entity_index(&self) -> EntityIndex {
        sentinel_index(self.entity_index_bits()) - 1
    }

    /// Hash of every class layout; equal on both ends iff the wire layouts
    /// agree
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

fn check_reachable(pending: &PendingClass, property: &FlatProperty) -> Result<(), SchemaError> {
    let mismatch = |expected: &'static str, found: &'static str| SchemaError::TypeMismatch {
        class: pending.table.clone(),
        property: property.name().to_string(),
        expected,
        found,
    };

    let mut current = pending.binding.type_id();
    let mut current_name = pending.binding.type_name();
    for lens in property.lenses() {
        if lens.source() != current {
            return Err(mismatch(lens.source_name(), current_name));
        }
        current = lens.target();
        current_name = lens.target_name();
    }

    let accessor = property.accessor();
    if accessor.owner() != current {
        return Err(mismatch(accessor.owner_name(), current_name));
    }
    Ok(())
}

fn check_handle_width(property: &FlatProperty, index_bits: u8) -> Result<(), SchemaError> {
    let descriptor = property.descriptor();
    if descriptor.kind() == PropertyKind::EntityHandle && descriptor.bit_count() < index_bits {
        return Err(SchemaError::HandleIndexBits {
            property: property.name().to_string(),
            bits: descriptor.bit_count(),
            required: index_bits,
        });
    }
    Ok(())
}
