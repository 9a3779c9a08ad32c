//! # Cairn Core
//!
//! Archetype-based Entity Component System (ECS):
//! - Entities are generational handles, components are plain Rust types
//! - Each component type has its own store, split into pools per archetype
//! - Pools hand out stable slot indices from 64-slot buckets
//!
//! ## Architecture Rules
//!
//! 1. **Closed type set** - Component types are registered before the world exists
//! 2. **Stable slots** - A value never moves unless its entity changes archetype
//! 3. **Aligned queries** - Every column of a query result lists entities in the same order
//!
//! ## Example
//!
//! ```rust
//! use cairn_core::{Component, ComponentId, ComponentRegistry, Entity, World};
//!
//! #[derive(Clone, Copy, Debug, Default, PartialEq)]
//! struct Health(u32);
//! impl Component for Health { const ID: ComponentId = 1; }
//!
//! let mut registry = ComponentRegistry::new();
//! registry.register::<Health>()?;
//! let mut world = World::new(registry);
//!
//! let hero = world.spawn();
//! world.insert(hero, Health(100));
//!
//! let query = world.query(&[Entity::ID, Health::ID]);
//! let rows: Vec<_> = query.values::<Entity>().zip(query.values::<Health>()).collect();
//! assert_eq!(rows, vec![(&hero, &Health(100))]);
//! # Ok::<(), cairn_core::RegistryError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod memory;
pub mod sync;

pub use config::WorldConfig;
pub use ecs::{
    ArchetypeSignature, Component, ComponentId, ComponentRegistry, ComponentStore, Entity,
    EntityDirectory, EntityRecord, ErasedStore, QueryResult, System, World,
};
pub use error::{
    ConfigError, ConfigResult, RegistryError, RegistryResult, WorldError, WorldResult,
};
pub use memory::{Bucket, Pool, BUCKET_CAPACITY};
pub use sync::SharedWorld;
