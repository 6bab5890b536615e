use crate::ecs::{Component, TypeKey};
use std::any::Any;

/// Builder for the initial components of a new entity.
///
/// The builder accepts any component values; whether they are declared and
/// distinct is checked by [`World::add_entity`](crate::ecs::World::add_entity)
/// against the world's registry.
#[derive(Default)]
pub struct EntityBuilder {
    components: Vec<(TypeKey, Box<dyn Any + Send>)>,
}

impl EntityBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Add a component by value.
    pub fn with<T: Component>(mut self, value: T) -> Self {
        self.components.push((T::key(), Box::new(value)));
        self
    }

    /// Types added so far, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.components.iter().map(|(key, _)| *key)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub(crate) fn into_components(self) -> Vec<(TypeKey, Box<dyn Any + Send>)> {
        self.components
    }
}
