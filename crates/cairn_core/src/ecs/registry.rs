//! # Component Registry
//!
//! Collects one erased store per component type, in dense id order, before a
//! world is built. The type set is closed once the world exists.

use std::any::{type_name, TypeId};

use crate::config::WorldConfig;
use crate::error::{RegistryError, RegistryResult};

use super::component::Component;
use super::entity::Entity;
use super::signature::ComponentId;
use super::store::{ComponentStore, ErasedStore};

/// The set of component types a world will support.
///
/// Id `0` ([`Entity`]) is always registered. Further types must be added
/// in the order of their [`Component::ID`], starting at `1`.
///
/// # Example
///
/// ```rust
/// use cairn_core::{Component, ComponentId, ComponentRegistry, World};
///
/// #[derive(Default)]
/// struct Health(u32);
///
/// impl Component for Health {
///     const ID: ComponentId = 1;
/// }
///
/// let mut registry = ComponentRegistry::new();
/// registry.register::<Health>()?;
/// let world = World::new(registry);
/// assert_eq!(world.component_type_count(), 2);
/// # Ok::<(), cairn_core::RegistryError>(())
/// ```
pub struct ComponentRegistry {
    /// Store per id, `stores[id]`.
    stores: Vec<Box<dyn ErasedStore>>,
    /// Concrete type per id, for duplicate detection.
    types: Vec<TypeId>,
    /// Registration limit and store settings, handed on to the world.
    config: WorldConfig,
}

impl ComponentRegistry {
    /// Creates a registry holding only the entity pseudo-type, with default
    /// configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&WorldConfig::default())
    }

    /// Creates a registry holding only the entity pseudo-type.
    #[must_use]
    pub fn with_config(config: &WorldConfig) -> Self {
        let mut registry = Self {
            stores: Vec::new(),
            types: Vec::new(),
            config: config.clone(),
        };
        registry.push::<Entity>();
        registry
    }

    /// Registers component type `T` and returns its id.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Duplicate`] if `T` is already registered
    /// - [`RegistryError::NonSequentialId`] if `T::ID` is not the next dense id
    /// - [`RegistryError::TooManyTypes`] if the configured limit is reached
    pub fn register<T: Component>(&mut self) -> RegistryResult<ComponentId> {
        if self.types.contains(&TypeId::of::<T>()) {
            return Err(RegistryError::Duplicate(type_name::<T>()));
        }
        if T::ID != self.stores.len() {
            return Err(RegistryError::NonSequentialId {
                name: type_name::<T>(),
                expected: self.stores.len(),
                found: T::ID,
            });
        }
        let limit = self.config.max_component_types.max(1);
        if self.stores.len() >= limit {
            return Err(RegistryError::TooManyTypes { limit });
        }

        self.push::<T>();
        Ok(T::ID)
    }

    fn push<T: Component>(&mut self) {
        self.stores
            .push(Box::new(ComponentStore::<T>::with_query_cache(self.config.query_cache)));
        self.types.push(TypeId::of::<T>());
    }

    /// Number of registered types, entity pseudo-type included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// Always `false`: the entity pseudo-type is registered from the start.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Checks whether component type `T` is registered.
    #[must_use]
    pub fn contains<T: Component>(&self) -> bool {
        self.types.get(T::ID) == Some(&TypeId::of::<T>())
    }

    /// Type name registered under `id`.
    #[must_use]
    pub fn name(&self, id: ComponentId) -> Option<&'static str> {
        self.stores.get(id).map(|store| store.component_name())
    }

    /// Configuration this registry was created with.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub(crate) fn into_stores(self) -> Box<[Box<dyn ErasedStore>]> {
        self.stores.into_boxed_slice()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
