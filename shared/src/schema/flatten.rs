use std::{
    any::Any,
    collections::{HashMap, HashSet},
};

use crate::{
    types::{ClassId, PropertyIndex},
    value::PropertyValue,
};

use super::{
    AccessError, Accessor, Lens, PropertyDescriptor, PropertyKind, SchemaError, TableSet,
};

/// A leaf property of a class, at its stable position in the flattened
/// schema. Index `i` means the same property on sender and receiver.
#[derive(Clone, Debug)]
pub struct FlatProperty {
    index: PropertyIndex,
    name: String,
    path: Vec<String>,
    declared_in: String,
    descriptor: PropertyDescriptor,
    accessor: Accessor,
    lenses: Vec<Lens>,
}

impl FlatProperty {
    pub fn index(&self) -> PropertyIndex {
        self.index
    }

    /// Class-relative dotted name, e.g. `weapon.ammo`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tables and nested fields walked from the class table to the leaf
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Name of the table that declares the leaf descriptor
    pub fn declared_in(&self) -> &str {
        &self.declared_in
    }

    pub fn descriptor(&self) -> &PropertyDescriptor {
        &self.descriptor
    }

    pub fn accessor(&self) -> &Accessor {
        &self.accessor
    }

    /// Projections applied from the class instance down to the declaring struct
    pub fn lenses(&self) -> &[Lens] {
        &self.lenses
    }

    pub fn read(&self, instance: &dyn Any) -> Result<PropertyValue, AccessError> {
        let mut target = instance;
        for lens in &self.lenses {
            target = lens.project(target)?;
        }
        self.accessor.get(target)
    }

    pub fn write(&self, instance: &mut dyn Any, value: PropertyValue) -> Result<(), AccessError> {
        let mut target = instance;
        for lens in &self.lenses {
            target = lens.project_mut(target)?;
        }
        self.accessor.set(target, value)
    }
}

/// Flattens the table `root` with its parents and nested tables into one
/// ordered list of leaf properties: inherited properties first (base to
/// derived, exclusions removed), then the table's own declarations in
/// order, nested tables inlined depth-first where they are declared.
pub fn flatten(tables: &TableSet, root: &str) -> Result<Vec<FlatProperty>, SchemaError> {
    let mut stack = Vec::new();
    let mut properties = flatten_table(tables, root, root, &mut stack)?;

    let mut seen = HashSet::new();
    for (index, property) in properties.iter_mut().enumerate() {
        if !seen.insert(property.name.clone()) {
            return Err(SchemaError::DuplicateProperty {
                class: root.to_string(),
                name: property.name.clone(),
            });
        }
        property.index = PropertyIndex::try_from(index).map_err(|_| SchemaError::TooMany {
            name: root.to_string(),
            count: index + 1,
        })?;
    }

    Ok(properties)
}

fn flatten_table(
    tables: &TableSet,
    name: &str,
    referenced_by: &str,
    stack: &mut Vec<String>,
) -> Result<Vec<FlatProperty>, SchemaError> {
    if stack.iter().any(|entry| entry == name) {
        let mut chain = stack.clone();
        chain.push(name.to_string());
        return Err(SchemaError::Cycle {
            chain: chain.join(" -> "),
        });
    }
    let table = tables.get(name).ok_or_else(|| SchemaError::UnknownTable {
        table: name.to_string(),
        referenced_by: referenced_by.to_string(),
    })?;
    stack.push(name.to_string());

    let mut properties = Vec::new();

    match table.parent_link() {
        Some(parent) => {
            let mut inherited = flatten_table(tables, &parent.table, name, stack)?;
            for property in inherited.iter_mut() {
                if let Some(lens) = &parent.lens {
                    property.lenses.insert(0, lens.clone());
                }
                property.path.insert(0, name.to_string());
            }

            for exclusion in table.exclusions() {
                let before = inherited.len();
                inherited.retain(|property| {
                    !(property.declared_in == exclusion.table
                        && (property.descriptor.name() == exclusion.property
                            || property.name == exclusion.property))
                });
                if inherited.len() == before {
                    return Err(SchemaError::DanglingExclusion {
                        table: name.to_string(),
                        excluded_table: exclusion.table.clone(),
                        property: exclusion.property.clone(),
                    });
                }
            }

            properties.extend(inherited);
        }
        None => {
            if let Some(exclusion) = table.exclusions().first() {
                return Err(SchemaError::DanglingExclusion {
                    table: name.to_string(),
                    excluded_table: exclusion.table.clone(),
                    property: exclusion.property.clone(),
                });
            }
        }
    }

    for descriptor in table.descriptors() {
        if descriptor.is_excluded() {
            continue;
        }

        if descriptor.kind() == PropertyKind::NestedTable {
            let (Some(nested_table), Some(lens)) =
                (descriptor.nested_table(), descriptor.nested_lens())
            else {
                continue;
            };
            for mut property in flatten_table(tables, nested_table, name, stack)? {
                property.name = format!("{}.{}", descriptor.name(), property.name);
                property.lenses.insert(0, lens.clone());
                property.path.insert(0, descriptor.name().to_string());
                property.path.insert(0, name.to_string());
                properties.push(property);
            }
            continue;
        }

        descriptor.validate()?;
        let accessor = descriptor
            .accessor()
            .cloned()
            .ok_or_else(|| SchemaError::MissingAccessor {
                property: descriptor.name().to_string(),
            })?;
        properties.push(FlatProperty {
            index: 0,
            name: descriptor.name().to_string(),
            path: vec![name.to_string(), descriptor.name().to_string()],
            declared_in: name.to_string(),
            descriptor: descriptor.clone(),
            accessor,
            lenses: Vec::new(),
        });
    }

    stack.pop();
    Ok(properties)
}

/// The flattened, indexed property list of one registered class.
#[derive(Clone, Debug)]
pub struct FlattenedSchema {
    class_id: ClassId,
    class_name: String,
    properties: Vec<FlatProperty>,
    by_name: HashMap<String, PropertyIndex>,
    handle_indices: Vec<PropertyIndex>,
}

impl FlattenedSchema {
    pub fn new(class_id: ClassId, class_name: &str, properties: Vec<FlatProperty>) -> Self {
        let by_name = properties
            .iter()
            .map(|property| (property.name.clone(), property.index))
            .collect();
        let handle_indices = properties
            .iter()
            .filter(|property| property.descriptor.kind() == PropertyKind::EntityHandle)
            .map(|property| property.index)
            .collect();
        Self {
            class_id,
            class_name: class_name.to_string(),
            properties,
            by_name,
            handle_indices,
        }
    }

    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn property(&self, index: PropertyIndex) -> Option<&FlatProperty> {
        self.properties.get(usize::from(index))
    }

    pub fn properties(&self) -> &[FlatProperty] {
        &self.properties
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlatProperty> {
        self.properties.iter()
    }

    pub fn index_of(&self, name: &str) -> Option<PropertyIndex> {
        self.by_name.get(name).copied()
    }

    /// Indices of entity handle properties
    pub fn handle_indices(&self) -> &[PropertyIndex] {
        &self.handle_indices
    }

    fn try_property(&self, index: PropertyIndex) -> Result<&FlatProperty, AccessError> {
        self.property(index).ok_or(AccessError::IndexOutOfBounds {
            index: usize::from(index),
            len: self.properties.len(),
        })
    }

    pub fn read(&self, instance: &dyn Any, index: PropertyIndex) -> Result<PropertyValue, AccessError> {
        self.try_property(index)?.read(instance)
    }

    /// The whole value vector, in index order
    pub fn read_all(&self, instance: &dyn Any) -> Result<Vec<PropertyValue>, AccessError> {
        self.properties
            .iter()
            .map(|property| property.read(instance))
            .collect()
    }

    pub fn write(
        &self,
        instance: &mut dyn Any,
        index: PropertyIndex,
        value: PropertyValue,
    ) -> Result<(), AccessError> {
        self.try_property(index)?.write(instance, value)
    }
}
