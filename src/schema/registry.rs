//! Metadata registry
//!
//! The registry is filled once at startup and then shared read-only (usually
//! behind an `Arc` inside [`DataSource`](crate::DataSource)). Lookups never
//! mutate, so concurrent readers need no synchronization.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{OrmError, Result};
use crate::model::Entity;

use super::entity::{EntityDescriptor, EntitySchema};

#[derive(Debug, Default, Clone)]
pub struct Registry {
    entities: HashMap<String, Arc<EntityDescriptor>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity schema and return its descriptor
    ///
    /// Extensions must be registered after their base.
    pub fn register(&mut self, schema: EntitySchema) -> Result<Arc<EntityDescriptor>> {
        if self.entities.contains_key(&schema.name) {
            return Err(OrmError::InvalidSchema(format!(
                "entity {} registered twice",
                schema.name
            )));
        }

        let descriptor = match schema.extends.clone() {
            Some(base) => {
                let base = self.resolve(&base)?;
                EntityDescriptor::overlay(&base, schema)?
            }
            None => EntityDescriptor::from_schema(schema)?,
        };

        log::debug!(
            "Registered entity {} on table {} ({} columns)",
            descriptor.name(),
            descriptor.table(),
            descriptor.columns().len()
        );

        let descriptor = Arc::new(descriptor);
        self.entities
            .insert(descriptor.name().to_string(), Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Register the schema of a typed entity
    pub fn register_entity<E: Entity>(&mut self) -> Result<Arc<EntityDescriptor>> {
        self.register(E::schema())
    }

    /// Look up a registered entity by name
    pub fn resolve(&self, name: &str) -> Result<Arc<EntityDescriptor>> {
        self.entities
            .get(name)
            .cloned()
            .ok_or_else(|| OrmError::UnknownEntity(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
