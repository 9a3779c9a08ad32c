//! # Entity Directory
//!
//! Slot-allocated entity records plus the generation counter that makes
//! handles unique.

use crate::memory::{Pool, BUCKET_CAPACITY};

use super::entity::Entity;
use super::signature::{ArchetypeSignature, ComponentId};

/// Per-entity bookkeeping.
#[derive(Clone, Debug, Default)]
pub struct EntityRecord {
    /// Component types currently attached, entity bit included.
    signature: ArchetypeSignature,
    /// Generation of the handle that owns this slot.
    generation: u64,
    /// Slot of this entity's values inside the pools keyed by `signature`.
    slot: usize,
}

impl EntityRecord {
    /// Component types currently attached.
    #[inline]
    #[must_use]
    pub fn signature(&self) -> &ArchetypeSignature {
        &self.signature
    }

    /// Generation of the owning handle.
    #[inline]
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Slot index shared by every store holding this entity's values.
    ///
    /// Only meaningful against the current [`signature`](Self::signature).
    #[inline]
    #[must_use]
    pub const fn slot(&self) -> usize {
        self.slot
    }

    #[inline]
    pub(crate) fn set_slot(&mut self, slot: usize) {
        self.slot = slot;
    }
}

/// Issues entity handles and tracks their signatures.
///
/// Liveness is a double check: the slot must be occupied AND hold the
/// handle's generation. A recycled slot therefore never revives an old
/// handle.
pub struct EntityDirectory {
    /// Entity records, indexed by `Entity::index`.
    records: Pool<EntityRecord>,
    /// Next generation to hand out. Owned by this directory alone.
    next_generation: u64,
    /// Signature width (number of registered component types).
    width: usize,
}

impl EntityDirectory {
    /// Creates an empty directory whose signatures hold `width` ids.
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self::with_capacity(width, 0)
    }

    /// Creates an empty directory with room reserved for `entities` records.
    #[must_use]
    pub fn with_capacity(width: usize, entities: usize) -> Self {
        Self {
            records: Pool::with_bucket_capacity(entities.div_ceil(BUCKET_CAPACITY)),
            next_generation: 0,
            width,
        }
    }

    /// Signature width of this directory.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no entity is alive.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Allocates a new entity with an empty signature.
    ///
    /// # Panics
    ///
    /// Panics if the slot index no longer fits in `u32`.
    pub fn add(&mut self) -> Entity {
        let generation = self.next_generation;
        self.next_generation += 1;

        let slot = self.records.insert(EntityRecord {
            signature: ArchetypeSignature::new(self.width),
            generation,
            slot: 0,
        });
        let Ok(index) = u32::try_from(slot) else {
            panic!("entity directory exhausted: slot {slot} exceeds u32 index space");
        };

        Entity::new(generation, index)
    }

    /// Erases the record in `entity`'s slot.
    ///
    /// No generation check is done here: callers confirm liveness first.
    /// Erasing an empty slot is a no-op.
    pub fn remove(&mut self, entity: Entity) {
        self.records.erase(entity.index() as usize);
    }

    /// Checks if `entity` is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.record(entity).is_some()
    }

    /// Adds `id` to a live entity's signature. No-op for a dead handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    pub fn link(&mut self, entity: Entity, id: ComponentId) {
        if let Some(record) = self.record_mut(entity) {
            record.signature.set(id);
        }
    }

    /// Removes `id` from a live entity's signature. No-op for a dead handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    pub fn unlink(&mut self, entity: Entity, id: ComponentId) {
        if let Some(record) = self.record_mut(entity) {
            record.signature.unset(id);
        }
    }

    /// Checks whether a live entity carries `id`. Dead handles carry nothing.
    #[must_use]
    pub fn has(&self, entity: Entity, id: ComponentId) -> bool {
        self.record(entity)
            .is_some_and(|record| record.signature.test(id))
    }

    /// Returns the record of a live entity.
    #[inline]
    #[must_use]
    pub fn record(&self, entity: Entity) -> Option<&EntityRecord> {
        self.records
            .get(entity.index() as usize)
            .filter(|record| record.generation == entity.generation())
    }

    #[inline]
    pub(crate) fn record_mut(&mut self, entity: Entity) -> Option<&mut EntityRecord> {
        self.records
            .get_mut(entity.index() as usize)
            .filter(|record| record.generation == entity.generation())
    }

    /// Iterates all live entities in slot order.
    // Every occupied slot was produced by `add`, which checked the range.
    #[allow(clippy::cast_possible_truncation)]
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.records
            .iter()
            .map(|(slot, record)| Entity::new(record.generation, slot as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add() {
        let mut directory = EntityDirectory::new(1);
        let entity1 = directory.add();
        assert!(directory.is_alive(entity1));
        let entity2 = directory.add();
        assert!(directory.is_alive(entity1));
        assert!(directory.is_alive(entity2));
        assert_eq!(directory.len(), 2);
    }

    #[test]
    fn test_remove() {
        let mut directory = EntityDirectory::new(1);
        let entity1 = directory.add();
        let entity2 = directory.add();

        directory.remove(entity1);
        assert!(!directory.is_alive(entity1));
        assert!(directory.is_alive(entity2));

        directory.remove(entity2);
        assert!(!directory.is_alive(entity2));
        assert!(directory.is_empty());
    }

    #[test]
    fn test_recycled_slot_does_not_revive_old_handle() {
        let mut directory = EntityDirectory::new(1);
        let old = directory.add();
        directory.remove(old);

        let new = directory.add();
        assert_eq!(new.index(), old.index());
        assert_ne!(new.generation(), old.generation());
        assert!(directory.is_alive(new));
        assert!(!directory.is_alive(old));
    }

    #[test]
    fn test_generations_never_repeat() {
        let mut directory = EntityDirectory::new(1);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let entity = directory.add();
            assert!(seen.insert(entity.generation()));
            directory.remove(entity);
        }
    }

    #[test]
    fn test_link() {
        let mut directory = EntityDirectory::new(2);
        let mut entity = directory.add();
        directory.link(entity, 0);
        assert!(directory.has(entity, 0));
        directory.link(entity, 0);
        assert!(directory.has(entity, 0));
        directory.link(entity, 1);
        assert!(directory.has(entity, 0));
        assert!(directory.has(entity, 1));

        directory.remove(entity);
        entity = directory.add();
        assert!(!directory.has(entity, 0));
        assert!(!directory.has(entity, 1));
    }

    #[test]
    fn test_unlink() {
        let mut directory = EntityDirectory::new(2);
        let entity = directory.add();
        directory.link(entity, 0);
        directory.link(entity, 1);
        directory.unlink(entity, 0);
        assert!(!directory.has(entity, 0));
        assert!(directory.has(entity, 1));
        directory.unlink(entity, 1);
        assert!(!directory.has(entity, 1));
    }

    #[test]
    fn test_link_on_stale_handle_is_noop() {
        let mut directory = EntityDirectory::new(2);
        let stale = directory.add();
        directory.remove(stale);
        let fresh = directory.add();

        directory.link(stale, 1);
        assert!(!directory.has(fresh, 1));
        assert!(!directory.has(stale, 1));
    }

    #[test]
    fn test_iter_yields_live_entities() {
        let mut directory = EntityDirectory::with_capacity(1, 128);
        let a = directory.add();
        let b = directory.add();
        let c = directory.add();
        directory.remove(b);

        let live: Vec<Entity> = directory.iter().collect();
        assert_eq!(live, vec![a, c]);
    }
}
