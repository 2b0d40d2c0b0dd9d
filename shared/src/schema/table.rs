use std::collections::HashMap;

use super::{Lens, PropertyDescriptor, SchemaError};

#[derive(Clone, Debug)]
pub(crate) struct ParentLink {
    pub(crate) table: String,
    pub(crate) lens: Option<Lens>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Exclusion {
    pub(crate) table: String,
    pub(crate) property: String,
}

/// Ordered property declarations for one class or embedded struct, plus
/// how it composes with other tables: an optional parent it extends and
/// exclusions over what it inherits.
#[derive(Clone, Debug)]
pub struct PropertyTable {
    name: String,
    parent: Option<ParentLink>,
    descriptors: Vec<PropertyDescriptor>,
    exclusions: Vec<Exclusion>,
}

impl PropertyTable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            descriptors: Vec::new(),
            exclusions: Vec::new(),
        }
    }

    /// Inherits `parent`'s properties, whose accessors are declared over
    /// the same type as this table's.
    pub fn extends(mut self, parent: &str) -> Self {
        self.parent = Some(ParentLink {
            table: parent.to_string(),
            lens: None,
        });
        self
    }

    /// Inherits `parent`'s properties, reached through `lens` from this
    /// table's type to the parent's.
    pub fn extends_via(mut self, parent: &str, lens: Lens) -> Self {
        self.parent = Some(ParentLink {
            table: parent.to_string(),
            lens: Some(lens),
        });
        self
    }

    /// Drops the inherited property `property` declared in `table`.
    pub fn exclude(mut self, table: &str, property: &str) -> Self {
        self.exclusions.push(Exclusion {
            table: table.to_string(),
            property: property.to_string(),
        });
        self
    }

    pub fn add(mut self, descriptor: PropertyDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_ref().map(|link| link.table.as_str())
    }

    pub fn descriptors(&self) -> &[PropertyDescriptor] {
        &self.descriptors
    }

    /// Nested-table descriptors, in declaration order
    pub fn nested_tables(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.descriptors
            .iter()
            .filter(|descriptor| descriptor.nested_table().is_some())
    }

    pub(crate) fn parent_link(&self) -> Option<&ParentLink> {
        self.parent.as_ref()
    }

    pub(crate) fn exclusions(&self) -> &[Exclusion] {
        &self.exclusions
    }
}

/// Every table known to a protocol, by name
#[derive(Clone, Debug, Default)]
pub struct TableSet {
    tables: HashMap<String, PropertyTable>,
}

impl TableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: PropertyTable) -> Result<(), SchemaError> {
        if self.tables.contains_key(table.name()) {
            return Err(SchemaError::DuplicateTable {
                table: table.name().to_string(),
            });
        }
        self.tables.insert(table.name().to_string(), table);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PropertyTable> {
        self.tables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
