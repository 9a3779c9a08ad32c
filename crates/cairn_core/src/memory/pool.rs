//! # Pool
//!
//! Growable slot allocator built from [`Bucket`]s.

use std::ops::{Index, IndexMut};

use super::bucket::{Bucket, BUCKET_CAPACITY};

/// Splits a global pool index into `(bucket, offset)`.
#[inline]
const fn split(index: usize) -> (usize, usize) {
    (index / BUCKET_CAPACITY, index % BUCKET_CAPACITY)
}

/// A growable pool of fixed-size buckets with stable indices.
///
/// Inserting, erasing and looking up an element are all O(1) (amortized for
/// insert, which may allocate one new bucket). Indices are
/// `bucket * BUCKET_CAPACITY + offset`, and buckets never move their slots,
/// so an index keeps naming the same element until that index is erased,
/// whatever else happens to the pool in between.
///
/// The pool is deterministic: replaying the same insert/erase sequence on
/// two pools yields identical indices. The world relies on this to keep the
/// stores of one archetype in lockstep.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. Use one pool per thread or wrap in a mutex.
///
/// # Example
///
/// ```rust
/// use cairn_core::memory::Pool;
///
/// let mut pool: Pool<u32> = Pool::new();
/// let a = pool.insert(1);
/// let b = pool.insert(2);
/// pool.erase(a);
/// assert_eq!(pool[b], 2);
/// assert!(!pool.contains(a));
/// ```
pub struct Pool<T> {
    /// All buckets ever allocated. Never shrinks.
    buckets: Vec<Bucket<T>>,
    /// Stack of bucket indices that have at least one free slot.
    available: Vec<usize>,
    /// Number of occupied slots across all buckets.
    len: usize,
}

impl<T: Default> Pool<T> {
    /// Creates an empty pool. No bucket is allocated until the first insert.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: Vec::new(),
            available: Vec::new(),
            len: 0,
        }
    }

    /// Creates an empty pool with room reserved for `buckets` buckets.
    #[must_use]
    pub fn with_bucket_capacity(buckets: usize) -> Self {
        Self {
            buckets: Vec::with_capacity(buckets),
            available: Vec::with_capacity(buckets),
            len: 0,
        }
    }

    /// Stores `value` and returns its index.
    ///
    /// Reuses a bucket with free space if there is one, otherwise allocates
    /// a new bucket.
    pub fn insert(&mut self, value: T) -> usize {
        let bucket_index = match self.available.pop() {
            Some(bucket_index) => bucket_index,
            None => {
                self.buckets.push(Bucket::new());
                self.buckets.len() - 1
            }
        };

        let bucket = &mut self.buckets[bucket_index];
        let offset = bucket.insert(value);
        if !bucket.is_full() {
            self.available.push(bucket_index);
        }

        self.len += 1;
        bucket_index * BUCKET_CAPACITY + offset
    }

    /// Erases the element at `index` and hands back its value.
    ///
    /// Returns `None` (and leaves the pool untouched) if `index` is not
    /// currently occupied.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        let (bucket_index, offset) = split(index);
        let bucket = self.buckets.get_mut(bucket_index)?;
        if !bucket.contains(offset) {
            return None;
        }

        let was_full = bucket.is_full();
        let value = bucket.remove(offset)?;
        if was_full {
            self.available.push(bucket_index);
        }

        self.len -= 1;
        Some(value)
    }

    /// Erases the element at `index`, dropping its value.
    ///
    /// Erasing an index that is not occupied is a no-op.
    pub fn erase(&mut self, index: usize) {
        drop(self.remove(index));
    }
}

impl<T: Default> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Pool<T> {
    /// Checks whether `index` is currently occupied.
    #[inline]
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        let (bucket_index, offset) = split(index);
        self.buckets
            .get(bucket_index)
            .is_some_and(|bucket| bucket.contains(offset))
    }

    /// Returns the element at `index`, or `None` if it is not occupied.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        let (bucket_index, offset) = split(index);
        self.buckets.get(bucket_index)?.get(offset)
    }

    /// Returns the element at `index` mutably, or `None` if it is not occupied.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let (bucket_index, offset) = split(index);
        self.buckets.get_mut(bucket_index)?.get_mut(offset)
    }

    /// Number of occupied slots.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no slot is occupied.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of allocated buckets.
    #[inline]
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total slots across all allocated buckets.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buckets.len() * BUCKET_CAPACITY
    }

    /// Iterates occupied slots as `(index, &value)` in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.buckets
            .iter()
            .enumerate()
            .filter(|(_, bucket)| !bucket.is_empty())
            .flat_map(|(bucket_index, bucket)| {
                bucket
                    .iter()
                    .map(move |(offset, value)| (bucket_index * BUCKET_CAPACITY + offset, value))
            })
    }

    /// Iterates occupied slots as `(index, &mut value)` in index order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> + '_ {
        self.buckets
            .iter_mut()
            .enumerate()
            .filter(|(_, bucket)| !bucket.is_empty())
            .flat_map(|(bucket_index, bucket)| {
                bucket
                    .iter_mut()
                    .map(move |(offset, value)| (bucket_index * BUCKET_CAPACITY + offset, value))
            })
    }

    /// Iterates the occupied values in index order.
    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.iter().map(|(_, value)| value)
    }
}

impl<T> Index<usize> for Pool<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if `index` is not occupied.
    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(value) => value,
            None => panic!("pool index {index} is not occupied"),
        }
    }
}

impl<T> IndexMut<usize> for Pool<T> {
    /// # Panics
    ///
    /// Panics if `index` is not occupied.
    fn index_mut(&mut self, index: usize) -> &mut T {
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("pool index {index} is not occupied"),
        }
    }
}
