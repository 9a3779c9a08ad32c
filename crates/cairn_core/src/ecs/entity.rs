//! # Entity Handles
//!
//! Entities are lightweight identifiers consisting of:
//! - A slot index into the entity directory (reused after despawn)
//! - A generation, unique per directory and never reused

use std::fmt;

use super::component::Component;
use super::signature::ComponentId;

/// Generational entity handle.
///
/// The generation is drawn from a counter owned by the directory that
/// issued the handle, so it doubles as the entity's unique id. Once the
/// slot is recycled, the stored generation no longer matches and the old
/// handle reads as dead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity {
    generation: u64,
    index: u32,
}

impl Entity {
    /// Null/invalid entity handle. Never alive in any world.
    pub const NULL: Self = Self {
        generation: u64::MAX,
        index: u32::MAX,
    };

    /// Creates a handle from its parts.
    #[inline]
    #[must_use]
    pub const fn new(generation: u64, index: u32) -> Self {
        Self { generation, index }
    }

    /// Returns the unique generation of this handle.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.generation
    }

    /// Returns the directory slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Checks if this is the null handle.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.generation == u64::MAX && self.index == u32::MAX
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("null")
        } else {
            write!(f, "{}v{}", self.index, self.generation)
        }
    }
}

/// Every entity implicitly carries itself as component `0`, which lets
/// queries hand back the owning handle alongside the other values.
impl Component for Entity {
    const ID: ComponentId = 0;
}
