//! # ECS World
//!
//! The central container: one entity directory plus one component store per
//! registered type, and the archetype migration protocol tying them
//! together.
//!
//! ## Migration
//!
//! ```text
//! add Velocity to e, e = {Entity, Position} at slot 3
//!
//!   Entity store:   {E,P}[3]  --relocate-->  {E,P,V}[k]
//!   Position store: {E,P}[3]  --relocate-->  {E,P,V}[k]
//!   Velocity store:              add      -> {E,P,V}[k]
//!
//!   record(e) = {signature: {E,P,V}, slot: k}
//! ```
//!
//! ## Shared slot index
//!
//! An entity tracks ONE slot for all its values. That is sound because every
//! store holding a pool for archetype `A` sees exactly the same sequence of
//! inserts and erases on that pool: an entity enters `A` by inserting into
//! every store of `A` and leaves it by erasing from every store of `A`, at
//! the same slot. [`Pool`](crate::memory::Pool) is deterministic, so the
//! pools of `A` stay in lockstep and hand out identical slots. Debug builds
//! assert this on every migration.

use std::any::{type_name, Any};

use tracing::{debug, trace};

use crate::config::WorldConfig;
use crate::error::{WorldError, WorldResult};

use super::component::Component;
use super::directory::EntityDirectory;
use super::entity::Entity;
use super::query::QueryResult;
use super::registry::ComponentRegistry;
use super::signature::{ArchetypeSignature, ComponentId};
use super::store::{ComponentStore, ErasedStore};

/// A system: plain function run against the world by [`World::update`].
pub type System = fn(&mut World);

/// The ECS World - container for all entities and components.
///
/// # Example
///
/// ```rust
/// use cairn_core::{Component, ComponentId, ComponentRegistry, World};
///
/// #[derive(Clone, Copy, Debug, Default, PartialEq)]
/// struct Position { x: f32, y: f32 }
/// impl Component for Position { const ID: ComponentId = 1; }
///
/// #[derive(Clone, Copy, Debug, Default, PartialEq)]
/// struct Velocity { x: f32, y: f32 }
/// impl Component for Velocity { const ID: ComponentId = 2; }
///
/// let mut registry = ComponentRegistry::new();
/// registry.register::<Position>().unwrap();
/// registry.register::<Velocity>().unwrap();
/// let mut world = World::new(registry);
///
/// let turtle = world.spawn();
/// world.insert(turtle, Position { x: 0.0, y: 0.0 });
/// world.insert(turtle, Velocity { x: 1.0, y: 1.0 });
///
/// let query = world.query(&[Position::ID, Velocity::ID]);
/// for (pos, vel) in query.values::<Position>().zip(query.values::<Velocity>()) {
///     assert_eq!(pos.x + vel.x, 1.0);
/// }
/// ```
pub struct World {
    /// Entity records and handle issuing.
    entities: EntityDirectory,
    /// One store per registered component id. Fixed after construction.
    stores: Box<[Box<dyn ErasedStore>]>,
    /// Systems run by `update`, in registration order.
    systems: Vec<System>,
}

impl World {
    /// Creates a world supporting exactly the registered component types,
    /// configured like the registry.
    #[must_use]
    pub fn new(registry: ComponentRegistry) -> Self {
        let config = registry.config().clone();
        Self::with_config(registry, &config)
    }

    /// Creates a world configured by `config`, which takes precedence over
    /// the registry's own configuration.
    ///
    /// # Panics
    ///
    /// Panics if the registry holds more types than `config.max_component_types`.
    #[must_use]
    pub fn with_config(registry: ComponentRegistry, config: &WorldConfig) -> Self {
        let mut stores = registry.into_stores();
        assert!(
            stores.len() <= config.max_component_types,
            "{} component types registered, config allows {}",
            stores.len(),
            config.max_component_types
        );
        for store in stores.iter_mut() {
            store.set_query_cache(config.query_cache);
        }
        debug!(
            component_types = stores.len(),
            entity_capacity_hint = config.entity_capacity_hint,
            query_cache = config.query_cache,
            "world created"
        );

        Self {
            entities: EntityDirectory::with_capacity(stores.len(), config.entity_capacity_hint),
            stores,
            systems: Vec::new(),
        }
    }

    /// Number of registered component types, entity pseudo-type included.
    #[inline]
    #[must_use]
    pub fn component_type_count(&self) -> usize {
        self.stores.len()
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of distinct archetypes entities have had so far.
    #[must_use]
    pub fn archetype_count(&self) -> usize {
        self.stores[Entity::ID].archetype_count()
    }

    /// Iterates all live entities.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter()
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Creates a new entity carrying only the entity pseudo-component.
    pub fn spawn(&mut self) -> Entity {
        let entity = self.entities.add();
        self.entities.link(entity, Entity::ID);

        let signature = ArchetypeSignature::from_ids(self.stores.len(), [Entity::ID]);
        let slot = self.stores[Entity::ID].add(&signature);
        if let Some(value) = self.store_mut::<Entity>().get_mut(&signature, slot) {
            *value = entity;
        }
        if let Some(record) = self.entities.record_mut(entity) {
            record.set_slot(slot);
        }

        trace!(entity = %entity, slot, "entity spawned");
        entity
    }

    /// Destroys `entity` and all of its components.
    ///
    /// No-op for a dead or stale handle.
    pub fn despawn(&mut self, entity: Entity) {
        let Some(record) = self.entities.record(entity) else {
            return;
        };
        let slot = record.slot();
        let signature = record.signature();

        for id in signature.ones() {
            self.stores[id].remove(signature, slot);
        }
        self.entities.remove(entity);

        trace!(entity = %entity, "entity despawned");
    }

    /// Checks if `entity` is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Current archetype of a live entity.
    #[must_use]
    pub fn signature(&self, entity: Entity) -> Option<&ArchetypeSignature> {
        self.entities.record(entity).map(|record| record.signature())
    }

    // =========================================================================
    // Components by id
    // =========================================================================

    /// Attaches a default-initialized component `id` to `entity`.
    ///
    /// Every value the entity already carries is relocated to the pools of
    /// the new archetype. No-op if the entity is dead or already has `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not registered.
    pub fn add_component(&mut self, entity: Entity, id: ComponentId) {
        self.check_id(id);
        let Some(record) = self.entities.record(entity) else {
            return;
        };
        if record.signature().test(id) {
            return;
        }

        let old = record.signature().clone();
        let slot = record.slot();
        let new = old.with(id);

        let mut relocated = None;
        for existing in old.ones() {
            let new_slot = self.stores[existing].relocate(&old, slot, &new);
            debug_assert!(
                !matches!(relocated, Some(previous) if previous != new_slot),
                "stores of archetype {new} fell out of lockstep"
            );
            relocated = Some(new_slot);
        }
        let new_slot = self.stores[id].add(&new);
        debug_assert!(
            !matches!(relocated, Some(previous) if previous != new_slot),
            "stores of archetype {new} fell out of lockstep"
        );

        self.entities.link(entity, id);
        if let Some(record) = self.entities.record_mut(entity) {
            record.set_slot(new_slot);
        }

        trace!(entity = %entity, component = id, from = %old, to = %new, "component added");
    }

    /// Detaches component `id` from `entity`.
    ///
    /// The departing value is dropped and every remaining value is relocated
    /// to the pools of the smaller archetype. No-op if the entity is dead or
    /// does not have `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not registered or is the entity pseudo-component.
    pub fn remove_component(&mut self, entity: Entity, id: ComponentId) {
        self.check_id(id);
        assert_ne!(id, Entity::ID, "the entity pseudo-component cannot be removed");
        let Some(record) = self.entities.record(entity) else {
            return;
        };
        if !record.signature().test(id) {
            return;
        }

        let old = record.signature().clone();
        let slot = record.slot();
        let new = old.without(id);

        self.stores[id].remove(&old, slot);

        let mut relocated = slot;
        for (n, remaining) in new.ones().enumerate() {
            let new_slot = self.stores[remaining].relocate(&old, slot, &new);
            debug_assert!(
                n == 0 || relocated == new_slot,
                "stores of archetype {new} fell out of lockstep"
            );
            relocated = new_slot;
        }

        self.entities.unlink(entity, id);
        if let Some(record) = self.entities.record_mut(entity) {
            record.set_slot(relocated);
        }

        trace!(entity = %entity, component = id, from = %old, to = %new, "component removed");
    }

    /// Checks whether `entity` carries component `id`. Dead entities carry
    /// nothing.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not registered.
    #[must_use]
    pub fn has_component(&self, entity: Entity, id: ComponentId) -> bool {
        self.check_id(id);
        self.entities.has(entity, id)
    }

    /// Erased value of component `id` on `entity`.
    ///
    /// Returns `None` if the entity is dead or lacks the component.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not registered.
    #[must_use]
    pub fn component(&self, entity: Entity, id: ComponentId) -> Option<&dyn Any> {
        self.check_id(id);
        let record = self.entities.record(entity)?;
        self.stores[id].get_any(record.signature(), record.slot())
    }

    /// Mutable counterpart of [`component`](Self::component).
    ///
    /// # Panics
    ///
    /// Panics if `id` is not registered or is the entity pseudo-component.
    pub fn component_mut(&mut self, entity: Entity, id: ComponentId) -> Option<&mut dyn Any> {
        self.check_id(id);
        Self::check_writable(id);
        let record = self.entities.record(entity)?;
        self.stores[id].get_any_mut(record.signature(), record.slot())
    }

    // =========================================================================
    // Typed helpers
    // =========================================================================

    /// Attaches a default `T` to `entity`. See [`add_component`](Self::add_component).
    pub fn add<T: Component>(&mut self, entity: Entity) {
        self.add_component(entity, T::ID);
    }

    /// Attaches `T` to `entity` (if missing) and sets its value.
    ///
    /// Returns `false` if the entity is dead.
    ///
    /// # Panics
    ///
    /// Panics if `T` is [`Entity`].
    pub fn insert<T: Component>(&mut self, entity: Entity, value: T) -> bool {
        Self::check_writable(T::ID);
        self.add_component(entity, T::ID);
        match self.get_mut::<T>(entity) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Detaches `T` from `entity`. See [`remove_component`](Self::remove_component).
    pub fn remove<T: Component>(&mut self, entity: Entity) {
        self.remove_component(entity, T::ID);
    }

    /// Checks whether `entity` carries `T`.
    #[must_use]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.has_component(entity, T::ID)
    }

    /// Returns `entity`'s `T`, or `None` if dead or missing.
    #[must_use]
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        let record = self.entities.record(entity)?;
        self.store::<T>().get(record.signature(), record.slot())
    }

    /// Returns `entity`'s `T` mutably, or `None` if dead or missing.
    ///
    /// # Panics
    ///
    /// Panics if `T` is [`Entity`]: handles are owned by the world.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let id = Self::typed_id::<T>(self.stores.len());
        Self::check_writable(id);
        let record = self.entities.record(entity)?;
        downcast_store_mut::<T>(self.stores[id].as_mut()).get_mut(record.signature(), record.slot())
    }

    /// Like [`get`](Self::get), but says why the lookup failed.
    ///
    /// # Errors
    ///
    /// - [`WorldError::StaleEntity`] if `entity` is not alive
    /// - [`WorldError::MissingComponent`] if it does not carry `T`
    pub fn try_get<T: Component>(&self, entity: Entity) -> WorldResult<&T> {
        if !self.is_alive(entity) {
            return Err(WorldError::StaleEntity(entity));
        }
        self.get::<T>(entity).ok_or(WorldError::MissingComponent {
            entity,
            component: type_name::<T>(),
        })
    }

    /// Like [`get_mut`](Self::get_mut), but says why the lookup failed.
    ///
    /// # Errors
    ///
    /// - [`WorldError::StaleEntity`] if `entity` is not alive
    /// - [`WorldError::MissingComponent`] if it does not carry `T`
    ///
    /// # Panics
    ///
    /// Panics if `T` is [`Entity`].
    pub fn try_get_mut<T: Component>(&mut self, entity: Entity) -> WorldResult<&mut T> {
        Self::check_writable(T::ID);
        if !self.is_alive(entity) {
            return Err(WorldError::StaleEntity(entity));
        }
        self.get_mut::<T>(entity).ok_or(WorldError::MissingComponent {
            entity,
            component: type_name::<T>(),
        })
    }

    /// Typed store of `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not the type registered under `T::ID`.
    #[must_use]
    pub fn store<T: Component>(&self) -> &ComponentStore<T> {
        let store = &self.stores[Self::typed_id::<T>(self.stores.len())];
        match store.as_any().downcast_ref::<ComponentStore<T>>() {
            Some(store) => store,
            None => panic!(
                "component id {} is registered to {}, not {}",
                T::ID,
                store.component_name(),
                type_name::<T>()
            ),
        }
    }

    fn store_mut<T: Component>(&mut self) -> &mut ComponentStore<T> {
        let id = Self::typed_id::<T>(self.stores.len());
        downcast_store_mut::<T>(self.stores[id].as_mut())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Collects the values of every entity carrying all of `ids`.
    ///
    /// The result has one column per requested id, index-aligned across
    /// columns. Include [`Entity::ID`] to get the owning handles.
    ///
    /// # Panics
    ///
    /// Panics if any id is not registered.
    #[must_use]
    pub fn query(&self, ids: &[ComponentId]) -> QueryResult<'_> {
        let mut signature = ArchetypeSignature::new(self.stores.len());
        for &id in ids {
            self.check_id(id);
            signature.set(id);
        }

        let columns = ids
            .iter()
            .map(|&id| (id, self.stores[id].query_any(&signature)))
            .collect();
        QueryResult::new(columns)
    }

    // =========================================================================
    // Systems
    // =========================================================================

    /// Registers a system to run on every [`update`](Self::update).
    pub fn add_system(&mut self, system: System) {
        self.systems.push(system);
    }

    /// Number of registered systems.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Runs every registered system once, in registration order.
    ///
    /// Systems added while updating first run on the next update.
    pub fn update(&mut self) {
        let systems = self.systems.clone();
        for (index, system) in systems.into_iter().enumerate() {
            trace!(system = index, "running system");
            system(self);
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    #[inline]
    fn check_id(&self, id: ComponentId) {
        assert!(
            id < self.stores.len(),
            "component id {id} is not registered ({} types)",
            self.stores.len()
        );
    }

    #[inline]
    fn check_writable(id: ComponentId) {
        assert_ne!(id, Entity::ID, "the entity pseudo-component is read-only");
    }

    #[inline]
    fn typed_id<T: Component>(registered: usize) -> ComponentId {
        assert!(
            T::ID < registered,
            "component {} (id {}) is not registered ({registered} types)",
            type_name::<T>(),
            T::ID
        );
        T::ID
    }
}

fn downcast_store_mut<T: Component>(store: &mut dyn ErasedStore) -> &mut ComponentStore<T> {
    let name = store.component_name();
    match store.as_any_mut().downcast_mut::<ComponentStore<T>>() {
        Some(store) => store,
        None => panic!(
            "component id {} is registered to {name}, not {}",
            T::ID,
            type_name::<T>()
        ),
    }
}
