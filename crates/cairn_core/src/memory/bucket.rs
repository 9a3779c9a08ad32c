//! # Bucket
//!
//! Fixed-capacity slot block. Free slots are tracked by a single `u64` mask.

use std::mem;

/// Number of slots in one bucket (width of the free mask).
pub const BUCKET_CAPACITY: usize = u64::BITS as usize;

/// Mask with only `offset` set.
#[inline]
const fn bit(offset: usize) -> u64 {
    1u64 << offset
}

/// A fixed block of [`BUCKET_CAPACITY`] slots.
///
/// Bit `n` of the free mask is `1` while slot `n` is free. Insertion always
/// takes the lowest free slot, so a bucket fills front to back and the same
/// sequence of inserts/erases always produces the same offsets.
///
/// Slots are never compacted. An erased slot keeps its storage and is
/// overwritten by the next insert that lands on it.
pub struct Bucket<T> {
    /// Backing storage, always fully initialized.
    slots: Box<[T]>,
    /// 1 = free, 0 = occupied.
    free_mask: u64,
}

impl<T: Default> Bucket<T> {
    /// Creates an empty bucket with every slot default-initialized.
    #[must_use]
    pub fn new() -> Self {
        let slots = std::iter::repeat_with(T::default)
            .take(BUCKET_CAPACITY)
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            slots,
            free_mask: u64::MAX,
        }
    }

    /// Stores `value` in the lowest free slot and returns its offset.
    ///
    /// # Panics
    ///
    /// Panics if the bucket is full.
    pub fn insert(&mut self, value: T) -> usize {
        assert!(!self.is_full(), "insert into a full bucket");

        let offset = self.free_mask.trailing_zeros() as usize;
        self.slots[offset] = value;
        self.free_mask &= !bit(offset);
        offset
    }

    /// Frees the slot at `offset` and hands back its value.
    ///
    /// The slot is reset to `T::default()`. Returns `None` if the slot was
    /// already free.
    ///
    /// # Panics
    ///
    /// Panics if `offset >= BUCKET_CAPACITY`.
    pub fn remove(&mut self, offset: usize) -> Option<T> {
        if !self.contains(offset) {
            return None;
        }
        self.free_mask |= bit(offset);
        Some(mem::take(&mut self.slots[offset]))
    }
}

impl<T: Default> Default for Bucket<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Bucket<T> {
    /// Checks whether the slot at `offset` is occupied.
    ///
    /// # Panics
    ///
    /// Panics if `offset >= BUCKET_CAPACITY`.
    #[inline]
    #[must_use]
    pub fn contains(&self, offset: usize) -> bool {
        assert!(offset < BUCKET_CAPACITY, "bucket offset {offset} out of bounds");
        self.free_mask & bit(offset) == 0
    }

    /// Returns `true` when no slot is free.
    #[inline]
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.free_mask == 0
    }

    /// Returns `true` when every slot is free.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.free_mask == u64::MAX
    }

    /// Number of occupied slots.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        BUCKET_CAPACITY - self.free_mask.count_ones() as usize
    }

    /// Returns the value at `offset` if the slot is occupied.
    #[inline]
    #[must_use]
    pub fn get(&self, offset: usize) -> Option<&T> {
        if offset < BUCKET_CAPACITY && self.contains(offset) {
            Some(&self.slots[offset])
        } else {
            None
        }
    }

    /// Returns the value at `offset` mutably if the slot is occupied.
    #[inline]
    pub fn get_mut(&mut self, offset: usize) -> Option<&mut T> {
        if offset < BUCKET_CAPACITY && self.contains(offset) {
            Some(&mut self.slots[offset])
        } else {
            None
        }
    }

    /// Iterates occupied slots as `(offset, &value)` in offset order.
    pub fn iter(&self) -> BucketIter<'_, T> {
        BucketIter {
            slots: &self.slots,
            occupied: !self.free_mask,
        }
    }

    /// Iterates occupied slots as `(offset, &mut value)` in offset order.
    pub fn iter_mut(&mut self) -> BucketIterMut<'_, T> {
        BucketIterMut {
            rest: &mut self.slots,
            base: 0,
            occupied: !self.free_mask,
        }
    }
}

/// Iterator over the occupied slots of a [`Bucket`].
///
/// Each step jumps over a whole run of free slots with `trailing_zeros`.
pub struct BucketIter<'a, T> {
    slots: &'a [T],
    occupied: u64,
}

impl<'a, T> Iterator for BucketIter<'a, T> {
    type Item = (usize, &'a T);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.occupied == 0 {
            return None;
        }
        let offset = self.occupied.trailing_zeros() as usize;
        // Clear the lowest set bit.
        self.occupied &= self.occupied - 1;
        Some((offset, &self.slots[offset]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.occupied.count_ones() as usize;
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for BucketIter<'_, T> {}

/// Mutable iterator over the occupied slots of a [`Bucket`].
///
/// Walks the storage by splitting off the skipped run plus the yielded slot,
/// so every returned reference is disjoint.
pub struct BucketIterMut<'a, T> {
    rest: &'a mut [T],
    /// Offset of `rest[0]` within the bucket.
    base: usize,
    /// Occupancy bits, shifted so bit 0 corresponds to `rest[0]`.
    occupied: u64,
}

impl<'a, T> Iterator for BucketIterMut<'a, T> {
    type Item = (usize, &'a mut T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.occupied == 0 {
            return None;
        }
        let skip = self.occupied.trailing_zeros() as usize;
        let rest = mem::take(&mut self.rest);
        let (value, tail) = rest[skip..].split_first_mut()?;

        let offset = self.base + skip;
        self.rest = tail;
        self.base = offset + 1;
        self.occupied = self.occupied.checked_shr((skip + 1) as u32).unwrap_or(0);
        Some((offset, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.occupied.count_ones() as usize;
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for BucketIterMut<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_takes_lowest_free_slot() {
        let mut bucket: Bucket<u32> = Bucket::new();
        assert_eq!(bucket.insert(10), 0);
        assert_eq!(bucket.insert(11), 1);
        assert_eq!(bucket.insert(12), 2);

        assert_eq!(bucket.remove(1), Some(11));
        assert_eq!(bucket.insert(13), 1);
        assert_eq!(bucket.get(1), Some(&13));
    }

    #[test]
    fn test_remove_twice_is_noop() {
        let mut bucket: Bucket<u32> = Bucket::new();
        let offset = bucket.insert(7);
        assert_eq!(bucket.remove(offset), Some(7));
        assert_eq!(bucket.remove(offset), None);
        assert!(bucket.is_empty());
    }

    #[test]
    fn test_full_bucket() {
        let mut bucket: Bucket<usize> = Bucket::new();
        for i in 0..BUCKET_CAPACITY {
            assert_eq!(bucket.insert(i), i);
        }
        assert!(bucket.is_full());
        assert_eq!(bucket.len(), BUCKET_CAPACITY);
    }

    #[test]
    #[should_panic(expected = "full bucket")]
    fn test_insert_into_full_bucket_panics() {
        let mut bucket: Bucket<u8> = Bucket::new();
        for _ in 0..=BUCKET_CAPACITY {
            bucket.insert(1);
        }
    }

    #[test]
    fn test_iter_skips_free_runs() {
        let mut bucket: Bucket<usize> = Bucket::new();
        for i in 0..BUCKET_CAPACITY {
            bucket.insert(i * 10);
        }
        for offset in (0..BUCKET_CAPACITY).filter(|o| !matches!(o, 0 | 5 | 6 | 63)) {
            bucket.remove(offset);
        }

        let seen: Vec<_> = bucket.iter().collect();
        assert_eq!(seen, vec![(0, &0), (5, &50), (6, &60), (63, &630)]);
        assert_eq!(bucket.iter().len(), 4);
    }

    #[test]
    fn test_iter_mut_reaches_last_slot() {
        let mut bucket: Bucket<usize> = Bucket::new();
        for i in 0..BUCKET_CAPACITY {
            bucket.insert(i);
        }
        for offset in 1..BUCKET_CAPACITY - 1 {
            bucket.remove(offset);
        }

        for (_, value) in bucket.iter_mut() {
            *value += 1000;
        }
        assert_eq!(bucket.get(0), Some(&1000));
        assert_eq!(bucket.get(63), Some(&1063));
        assert_eq!(bucket.iter_mut().count(), 2);
    }

    #[test]
    fn test_empty_bucket_iterates_nothing() {
        let mut bucket: Bucket<u64> = Bucket::new();
        assert_eq!(bucket.iter().count(), 0);
        assert_eq!(bucket.iter_mut().count(), 0);
    }
}
