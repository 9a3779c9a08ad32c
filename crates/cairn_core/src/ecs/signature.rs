//! # Archetype Signatures
//!
//! A signature is the set of component types an entity carries, stored as a
//! bit-vector with one bit per registered component id.
//!
//! ```text
//! id:     0      1         2         3
//!       Entity Position Velocity  Health
//! bits:   1      1         0         1      => archetype {Entity, Position, Health}
//! ```
//!
//! Every world sizes its signatures once, from the number of registered
//! component types, and never changes that width afterwards. That is what
//! makes the cheap XOR hash below sound: two signatures of one world always
//! have the same number of words.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Dense component type id. `0` is reserved for the entity pseudo-type.
pub type ComponentId = usize;

const WORD_BITS: usize = u64::BITS as usize;

/// Fixed-width bit-vector identifying an archetype.
///
/// Equality is word-wise and independent of the order in which bits were
/// set. The ordering is an arbitrary but total order used to visit
/// archetypes deterministically.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ArchetypeSignature {
    /// Number of addressable bits.
    width: usize,
    /// Underlying words, `ceil(width / 64)` of them.
    words: Box<[u64]>,
}

impl ArchetypeSignature {
    /// Creates an empty signature able to hold `width` component ids.
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            width,
            words: vec![0u64; width.div_ceil(WORD_BITS)].into_boxed_slice(),
        }
    }

    /// Creates a signature of `width` bits with every id in `ids` set.
    ///
    /// # Panics
    ///
    /// Panics if any id is `>= width`.
    #[must_use]
    pub fn from_ids(width: usize, ids: impl IntoIterator<Item = ComponentId>) -> Self {
        let mut signature = Self::new(width);
        for id in ids {
            signature.set(id);
        }
        signature
    }

    /// Number of addressable bits.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Checks whether `id` is part of this signature.
    ///
    /// # Panics
    ///
    /// Panics if `id >= width`.
    #[inline]
    #[must_use]
    pub fn test(&self, id: ComponentId) -> bool {
        self.check(id);
        self.words[id / WORD_BITS] & (1u64 << (id % WORD_BITS)) != 0
    }

    /// Adds `id` to this signature.
    ///
    /// # Panics
    ///
    /// Panics if `id >= width`.
    #[inline]
    pub fn set(&mut self, id: ComponentId) {
        self.check(id);
        self.words[id / WORD_BITS] |= 1u64 << (id % WORD_BITS);
    }

    /// Removes `id` from this signature.
    ///
    /// # Panics
    ///
    /// Panics if `id >= width`.
    #[inline]
    pub fn unset(&mut self, id: ComponentId) {
        self.check(id);
        self.words[id / WORD_BITS] &= !(1u64 << (id % WORD_BITS));
    }

    /// Returns a copy with `id` added.
    #[must_use]
    pub fn with(&self, id: ComponentId) -> Self {
        let mut signature = self.clone();
        signature.set(id);
        signature
    }

    /// Returns a copy with `id` removed.
    #[must_use]
    pub fn without(&self, id: ComponentId) -> Self {
        let mut signature = self.clone();
        signature.unset(id);
        signature
    }

    /// Checks whether every bit set here is also set in `other`.
    ///
    /// Queries use this to find archetypes that carry at least the
    /// requested component set.
    #[inline]
    #[must_use]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        debug_assert_eq!(self.words.len(), other.words.len(), "signature width mismatch");
        self.words
            .iter()
            .zip(other.words.iter())
            .all(|(&word, &other_word)| word & other_word == word)
    }

    /// Number of set bits.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Returns `true` if no bit is set.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&word| word == 0)
    }

    /// Iterates the set component ids in ascending order.
    pub fn ones(&self) -> Ones<'_> {
        Ones {
            words: &self.words,
            word_idx: 0,
            current_word: self.words.first().copied().unwrap_or(0),
        }
    }

    /// Returns the underlying words.
    #[inline]
    #[must_use]
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    #[inline]
    fn check(&self, id: ComponentId) {
        assert!(
            id < self.width,
            "component id {id} out of range for signature width {}",
            self.width
        );
    }
}

impl Hash for ArchetypeSignature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let folded = self.words.iter().fold(0u64, |acc, &word| acc ^ word);
        state.write_u64(folded);
    }
}

impl fmt::Display for ArchetypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.ones()).finish()
    }
}

/// Iterator over the set bits of an [`ArchetypeSignature`].
pub struct Ones<'a> {
    words: &'a [u64],
    word_idx: usize,
    current_word: u64,
}

impl Iterator for Ones<'_> {
    type Item = ComponentId;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_word != 0 {
                let bit = self.current_word.trailing_zeros() as usize;
                self.current_word &= self.current_word - 1;
                return Some(self.word_idx * WORD_BITS + bit);
            }

            self.word_idx += 1;
            if self.word_idx >= self.words.len() {
                return None;
            }
            self.current_word = self.words[self.word_idx];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(signature: &ArchetypeSignature) -> u64 {
        let mut hasher = DefaultHasher::new();
        signature.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_set_unset_test() {
        let mut signature = ArchetypeSignature::new(3);
        assert!(!signature.test(1));
        signature.set(1);
        assert!(signature.test(1));
        signature.unset(1);
        assert!(!signature.test(1));
        assert!(signature.is_empty());
    }

    #[test]
    fn test_order_independent_equality_and_hash() {
        let mut a = ArchetypeSignature::new(2);
        a.set(0);
        a.set(1);
        let mut b = ArchetypeSignature::new(2);
        b.set(1);
        b.set(0);

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_subset_law() {
        let only_entity = ArchetypeSignature::from_ids(2, [0]);
        let both = ArchetypeSignature::from_ids(2, [0, 1]);

        assert!(only_entity.is_subset_of(&both));
        assert!(!both.is_subset_of(&only_entity));
        assert!(both.is_subset_of(&both));
    }

    #[test]
    fn test_wide_signature_spans_words() {
        let signature = ArchetypeSignature::from_ids(130, [0, 63, 64, 129]);
        assert_eq!(signature.words().len(), 3);
        assert_eq!(signature.count(), 4);
        assert_eq!(signature.ones().collect::<Vec<_>>(), vec![0, 63, 64, 129]);

        let subset = ArchetypeSignature::from_ids(130, [64, 129]);
        assert!(subset.is_subset_of(&signature));
        assert!(!signature.is_subset_of(&subset));
    }

    #[test]
    fn test_with_without_leave_receiver_untouched() {
        let base = ArchetypeSignature::from_ids(4, [0]);
        let grown = base.with(2);
        assert!(grown.test(2));
        assert!(!base.test(2));
        assert_eq!(grown.without(2), base);
    }

    #[test]
    fn test_display_lists_ids() {
        let signature = ArchetypeSignature::from_ids(4, [0, 3]);
        assert_eq!(signature.to_string(), "{0, 3}");
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_bit_panics() {
        let mut signature = ArchetypeSignature::new(2);
        signature.set(2);
    }
}
