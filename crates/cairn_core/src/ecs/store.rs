//! # Component Storage
//!
//! One store per component type. Values are grouped by the exact archetype
//! of their owning entity:
//!
//! ```text
//! ComponentStore<Position>
//!   {Entity, Position}            -> Pool [P0, P1, _, P3]
//!   {Entity, Position, Velocity}  -> Pool [P2, P4]
//! ```
//!
//! Entities with different compositions never share a pool, so a scan over
//! one archetype touches only that archetype's values.

use std::any::{type_name, Any};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::memory::Pool;

use super::component::Component;
use super::signature::ArchetypeSignature;

/// Archetype scans computed at one store revision.
#[derive(Default)]
struct QueryCache {
    /// Store revision every entry was computed at.
    revision: u64,
    /// Requested signature -> matching keys, sorted.
    entries: HashMap<ArchetypeSignature, Arc<[ArchetypeSignature]>>,
}

/// Per-type storage keyed by archetype signature.
///
/// Every mutating call (`add`, `remove`, `relocate`) bumps a revision
/// counter. Query scans are cached per requested signature. The first
/// lookup after a revision change drops the whole cache, so it only ever
/// holds scans of the current revision.
pub struct ComponentStore<T> {
    /// Exact archetype -> values of entities with that archetype.
    archetypes: HashMap<ArchetypeSignature, Pool<T>>,
    /// Bumped by every structural mutation.
    revision: u64,
    /// Requested signature -> matching archetypes.
    query_cache: RefCell<QueryCache>,
    /// Whether `query_cache` is consulted at all.
    cache_enabled: bool,
}

impl<T: Component> ComponentStore<T> {
    /// Creates an empty store with query caching enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::with_query_cache(true)
    }

    /// Creates an empty store, choosing whether query scans are cached.
    #[must_use]
    pub fn with_query_cache(cache_enabled: bool) -> Self {
        Self {
            archetypes: HashMap::new(),
            revision: 0,
            query_cache: RefCell::new(QueryCache::default()),
            cache_enabled,
        }
    }

    /// Allocates a default value for an entity of archetype `signature`.
    ///
    /// Returns the value's slot inside that archetype's pool.
    pub fn add(&mut self, signature: &ArchetypeSignature) -> usize {
        self.revision += 1;
        self.pool_mut(signature).insert(T::default())
    }

    /// Erases the value at `index` of archetype `signature`.
    ///
    /// No-op if the archetype has no pool here or the slot is empty.
    pub fn remove(&mut self, signature: &ArchetypeSignature, index: usize) {
        let Some(pool) = self.archetypes.get_mut(signature) else {
            return;
        };
        pool.erase(index);
        self.revision += 1;
    }

    /// Moves the value at `index` of archetype `old` into archetype `new`.
    ///
    /// Returns the value's slot in the new pool.
    ///
    /// # Panics
    ///
    /// Panics if there is no value at `index` under `old`: the caller's
    /// bookkeeping is out of sync with this store.
    pub fn relocate(
        &mut self,
        old: &ArchetypeSignature,
        index: usize,
        new: &ArchetypeSignature,
    ) -> usize {
        let value = self
            .archetypes
            .get_mut(old)
            .and_then(|pool| pool.remove(index));
        let Some(value) = value else {
            panic!(
                "no {} value at slot {index} of archetype {old}",
                type_name::<T>()
            );
        };

        self.revision += 1;
        self.pool_mut(new).insert(value)
    }

    fn pool_mut(&mut self, signature: &ArchetypeSignature) -> &mut Pool<T> {
        if !self.archetypes.contains_key(signature) {
            debug!(
                component = type_name::<T>(),
                archetype = %signature,
                "archetype pool created"
            );
        }
        self.archetypes.entry(signature.clone()).or_default()
    }
}

impl<T: Component> Default for ComponentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ComponentStore<T> {
    /// Returns the value at `index` of archetype `signature`.
    ///
    /// The signature must be the owning entity's *current* one. A stale
    /// signature or index yields `None` (or another entity's value, if the
    /// stale slot was reused).
    #[inline]
    #[must_use]
    pub fn get(&self, signature: &ArchetypeSignature, index: usize) -> Option<&T> {
        self.archetypes.get(signature)?.get(index)
    }

    /// Mutable counterpart of [`get`](Self::get).
    #[inline]
    pub fn get_mut(&mut self, signature: &ArchetypeSignature, index: usize) -> Option<&mut T> {
        self.archetypes.get_mut(signature)?.get_mut(index)
    }

    /// Checks whether archetype `signature` holds a value at `index`.
    #[inline]
    #[must_use]
    pub fn contains(&self, signature: &ArchetypeSignature, index: usize) -> bool {
        self.archetypes
            .get(signature)
            .is_some_and(|pool| pool.contains(index))
    }

    /// Collects every value owned by an archetype that is a superset of
    /// `signature`.
    ///
    /// Values come out ordered by archetype (signature order), then by
    /// slot. Two stores queried with the same signature therefore list the
    /// values of one entity at the same position.
    #[must_use]
    pub fn query(&self, signature: &ArchetypeSignature) -> Vec<&T> {
        self.matching_archetypes(signature)
            .iter()
            .filter_map(|key| self.archetypes.get(key))
            .flat_map(Pool::values)
            .collect()
    }

    /// Archetype keys that are supersets of `signature`, sorted.
    #[must_use]
    pub fn matching_archetypes(&self, signature: &ArchetypeSignature) -> Arc<[ArchetypeSignature]> {
        if !self.cache_enabled {
            return self.scan(signature);
        }

        let mut cache = self.query_cache.borrow_mut();
        if cache.revision != self.revision {
            cache.entries.clear();
            cache.revision = self.revision;
        }
        if let Some(archetypes) = cache.entries.get(signature) {
            return Arc::clone(archetypes);
        }

        let archetypes = self.scan(signature);
        cache.entries.insert(signature.clone(), Arc::clone(&archetypes));
        archetypes
    }

    fn scan(&self, signature: &ArchetypeSignature) -> Arc<[ArchetypeSignature]> {
        let mut keys: Vec<ArchetypeSignature> = self
            .archetypes
            .keys()
            .filter(|key| signature.is_subset_of(key))
            .cloned()
            .collect();
        keys.sort_unstable();
        keys.into()
    }

    /// Turns the query cache on or off, dropping anything cached so far.
    pub fn set_query_cache(&mut self, enabled: bool) {
        self.cache_enabled = enabled;
        self.query_cache.get_mut().entries.clear();
    }

    /// Number of requested signatures with a cached scan.
    #[must_use]
    pub fn cached_query_count(&self) -> usize {
        self.query_cache.borrow().entries.len()
    }

    /// Whether query scans are cached.
    #[inline]
    #[must_use]
    pub const fn query_cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    /// Current revision. Changes on every structural mutation.
    #[inline]
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Total number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.archetypes.values().map(Pool::len).sum()
    }

    /// Returns `true` if no value is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archetypes.values().all(Pool::is_empty)
    }

    /// Number of archetypes that ever stored a value here.
    #[inline]
    #[must_use]
    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }
}

/// Type-erased view of a [`ComponentStore`].
///
/// The world keeps one boxed store per registered type in an array indexed
/// by component id, and drives migrations through this interface without
/// knowing the concrete value types.
pub trait ErasedStore: Any + Send {
    /// Name of the stored component type.
    fn component_name(&self) -> &'static str;

    /// See [`ComponentStore::add`].
    fn add(&mut self, signature: &ArchetypeSignature) -> usize;

    /// See [`ComponentStore::remove`].
    fn remove(&mut self, signature: &ArchetypeSignature, index: usize);

    /// See [`ComponentStore::relocate`].
    fn relocate(
        &mut self,
        old: &ArchetypeSignature,
        index: usize,
        new: &ArchetypeSignature,
    ) -> usize;

    /// See [`ComponentStore::contains`].
    fn contains(&self, signature: &ArchetypeSignature, index: usize) -> bool;

    /// See [`ComponentStore::get`].
    fn get_any(&self, signature: &ArchetypeSignature, index: usize) -> Option<&dyn Any>;

    /// See [`ComponentStore::get_mut`].
    fn get_any_mut(&mut self, signature: &ArchetypeSignature, index: usize) -> Option<&mut dyn Any>;

    /// See [`ComponentStore::query`].
    fn query_any(&self, signature: &ArchetypeSignature) -> Vec<&dyn Any>;

    /// See [`ComponentStore::len`].
    fn len(&self) -> usize;

    /// See [`ComponentStore::is_empty`].
    fn is_empty(&self) -> bool;

    /// See [`ComponentStore::archetype_count`].
    fn archetype_count(&self) -> usize;

    /// Upcast for downcasting to the concrete store.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete store.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// See [`ComponentStore::set_query_cache`].
    fn set_query_cache(&mut self, enabled: bool);
}

impl<T: Component> ErasedStore for ComponentStore<T> {
    fn component_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn add(&mut self, signature: &ArchetypeSignature) -> usize {
        ComponentStore::add(self, signature)
    }

    fn remove(&mut self, signature: &ArchetypeSignature, index: usize) {
        ComponentStore::remove(self, signature, index);
    }

    fn relocate(
        &mut self,
        old: &ArchetypeSignature,
        index: usize,
        new: &ArchetypeSignature,
    ) -> usize {
        ComponentStore::relocate(self, old, index, new)
    }

    fn contains(&self, signature: &ArchetypeSignature, index: usize) -> bool {
        ComponentStore::contains(self, signature, index)
    }

    fn get_any(&self, signature: &ArchetypeSignature, index: usize) -> Option<&dyn Any> {
        ComponentStore::get(self, signature, index).map(|value| value as &dyn Any)
    }

    fn get_any_mut(&mut self, signature: &ArchetypeSignature, index: usize) -> Option<&mut dyn Any> {
        ComponentStore::get_mut(self, signature, index).map(|value| value as &mut dyn Any)
    }

    fn query_any(&self, signature: &ArchetypeSignature) -> Vec<&dyn Any> {
        ComponentStore::query(self, signature)
            .into_iter()
            .map(|value| value as &dyn Any)
            .collect()
    }

    fn len(&self) -> usize {
        ComponentStore::len(self)
    }

    fn is_empty(&self) -> bool {
        ComponentStore::is_empty(self)
    }

    fn archetype_count(&self) -> usize {
        ComponentStore::archetype_count(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn set_query_cache(&mut self, enabled: bool) {
        ComponentStore::set_query_cache(self, enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::signature::ComponentId;

    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    struct Int {
        val: i32,
    }

    impl Component for Int {
        const ID: ComponentId = 1;
    }

    fn sig(ids: &[ComponentId]) -> ArchetypeSignature {
        ArchetypeSignature::from_ids(3, ids.iter().copied())
    }

    #[test]
    fn test_add_and_get() {
        let mut store: ComponentStore<Int> = ComponentStore::new();
        let archetype = sig(&[0, 1]);

        let index = store.add(&archetype);
        assert_eq!(store.get(&archetype, index), Some(&Int::default()));

        store.get_mut(&archetype, index).unwrap().val = 5;
        assert_eq!(store.get(&archetype, index).unwrap().val, 5);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_with_wrong_signature_is_none() {
        let mut store: ComponentStore<Int> = ComponentStore::new();
        let index = store.add(&sig(&[0, 1]));
        assert!(store.get(&sig(&[0, 1, 2]), index).is_none());
    }

    #[test]
    fn test_remove_unknown_archetype_is_noop() {
        let mut store: ComponentStore<Int> = ComponentStore::new();
        let revision = store.revision();
        store.remove(&sig(&[0, 1]), 0);
        assert_eq!(store.revision(), revision);
        assert!(store.is_empty());
    }

    #[test]
    fn test_relocate_moves_value() {
        let mut store: ComponentStore<Int> = ComponentStore::new();
        let old = sig(&[0, 1]);
        let new = sig(&[0, 1, 2]);

        let index = store.add(&old);
        store.get_mut(&old, index).unwrap().val = 42;

        let moved = store.relocate(&old, index, &new);
        assert!(!store.contains(&old, index));
        assert_eq!(store.get(&new, moved).unwrap().val, 42);
        assert_eq!(store.len(), 1);
        assert_eq!(store.archetype_count(), 2);
    }

    #[test]
    #[should_panic(expected = "no ")]
    fn test_relocate_missing_value_panics() {
        let mut store: ComponentStore<Int> = ComponentStore::new();
        store.relocate(&sig(&[0, 1]), 3, &sig(&[0, 1, 2]));
    }

    #[test]
    fn test_query_matches_supersets_only() {
        let mut store: ComponentStore<Int> = ComponentStore::new();
        let narrow = sig(&[0, 1]);
        let wide = sig(&[0, 1, 2]);

        let a = store.add(&narrow);
        store.get_mut(&narrow, a).unwrap().val = 1;
        let b = store.add(&wide);
        store.get_mut(&wide, b).unwrap().val = 2;

        let mut all: Vec<i32> = store.query(&sig(&[1])).iter().map(|v| v.val).collect();
        all.sort_unstable();
        assert_eq!(all, vec![1, 2]);

        let only_wide: Vec<i32> = store.query(&sig(&[1, 2])).iter().map(|v| v.val).collect();
        assert_eq!(only_wide, vec![2]);
    }

    #[test]
    fn test_query_cache_invalidated_by_mutation() {
        let mut store: ComponentStore<Int> = ComponentStore::new();
        let archetype = sig(&[0, 1]);
        let request = sig(&[1]);

        store.add(&archetype);
        assert_eq!(store.query(&request).len(), 1);

        // New archetype after the cached scan must show up
        let wide = sig(&[0, 1, 2]);
        store.add(&wide);
        assert_eq!(store.matching_archetypes(&request).len(), 2);
        assert_eq!(store.query(&request).len(), 2);

        store.remove(&archetype, 0);
        assert_eq!(store.query(&request).len(), 1);
    }

    #[test]
    fn test_query_cache_dropped_after_mutation() {
        let mut store: ComponentStore<Int> = ComponentStore::new();
        let archetype = sig(&[0, 1]);
        store.add(&archetype);

        let _ = store.matching_archetypes(&sig(&[0]));
        let _ = store.matching_archetypes(&sig(&[1]));
        let _ = store.matching_archetypes(&sig(&[0, 1]));
        assert_eq!(store.cached_query_count(), 3);

        // Scans of the old revision go away on the next lookup
        store.add(&archetype);
        let _ = store.matching_archetypes(&sig(&[1]));
        assert_eq!(store.cached_query_count(), 1);
    }

    #[test]
    fn test_query_without_cache() {
        let mut store: ComponentStore<Int> = ComponentStore::with_query_cache(false);
        let archetype = sig(&[0, 1]);
        store.add(&archetype);
        store.add(&archetype);
        assert_eq!(store.query(&sig(&[1])).len(), 2);
        assert_eq!(store.cached_query_count(), 0);

        store.set_query_cache(true);
        assert!(store.query_cache_enabled());
        assert_eq!(store.query(&sig(&[1])).len(), 2);
        assert_eq!(store.cached_query_count(), 1);
    }

    #[test]
    fn test_erased_view_downcasts() {
        let mut boxed: Box<dyn ErasedStore> = Box::new(ComponentStore::<Int>::new());
        let archetype = sig(&[0, 1]);
        let index = boxed.add(&archetype);

        let value = boxed.get_any_mut(&archetype, index).unwrap();
        value.downcast_mut::<Int>().unwrap().val = 9;

        let store = boxed.as_any().downcast_ref::<ComponentStore<Int>>().unwrap();
        assert_eq!(store.get(&archetype, index).unwrap().val, 9);
        assert!(boxed.component_name().ends_with("Int"));
    }
}
