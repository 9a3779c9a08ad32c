//! # Entity Component System
//!
//! An archetype ECS over bucketed pools.
//!
//! ## Design Philosophy
//!
//! - An entity's archetype is the exact set of component types it carries
//! - Each component type owns one store, partitioned into a pool per archetype
//! - Entity handles are slot indices with generation counters
//! - Adding or removing a component migrates the entity between archetypes

mod component;
mod directory;
mod entity;
mod query;
mod registry;
mod signature;
mod store;
mod world;

pub use component::Component;
pub use directory::{EntityDirectory, EntityRecord};
pub use entity::Entity;
pub use query::QueryResult;
pub use registry::ComponentRegistry;
pub use signature::{ArchetypeSignature, ComponentId, Ones};
pub use store::{ComponentStore, ErasedStore};
pub use world::{System, World};
