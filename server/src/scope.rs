use propnet_shared::EntityHandle;

use crate::connection::Connection;

pub struct ScopeRef<'s> {
    connection: &'s Connection,
}

impl<'s> ScopeRef<'s> {
    pub(crate) fn new(connection: &'s Connection) -> Self {
        Self { connection }
    }

    /// Returns true if the Connection's scope contains the Entity
    pub fn has(&self, handle: EntityHandle) -> bool {
        self.connection.has(handle)
    }

    pub fn entities(&self) -> impl Iterator<Item = EntityHandle> + 's {
        self.connection.scope()
    }
}

pub struct ScopeMut<'s> {
    connection: &'s mut Connection,
}

impl<'s> ScopeMut<'s> {
    pub(crate) fn new(connection: &'s mut Connection) -> Self {
        Self { connection }
    }

    /// Returns true if the Connection's scope contains the Entity
    pub fn has(&self, handle: EntityHandle) -> bool {
        self.connection.has(handle)
    }

    /// Adds an Entity to the Connection's scope
    pub fn include(&mut self, handle: EntityHandle) -> &mut Self {
        self.connection.include(handle);

        self
    }

    /// Removes an Entity from the Connection's scope
    pub fn exclude(&mut self, handle: EntityHandle) -> &mut Self {
        self.connection.exclude(handle);

        self
    }

    /// Removes all Entities from the Connection's scope
    pub fn clear(&mut self) -> &mut Self {
        self.connection.clear_scope();

        self
    }
}
