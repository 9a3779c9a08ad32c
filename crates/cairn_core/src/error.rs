//! # Error Types
//!
//! Recoverable failures of the engine. Precondition violations (absent
//! slots, unregistered component ids) are not represented here: they panic.

use std::path::PathBuf;

use thiserror::Error;

use crate::ecs::{ComponentId, Entity};

/// Errors raised while registering component types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Component ids must be registered densely, in ascending order.
    #[error("component {name} has id {found}, expected the next dense id {expected}")]
    NonSequentialId {
        /// Type name of the offending component.
        name: &'static str,
        /// Id the registry expected next.
        expected: ComponentId,
        /// Id the component declares.
        found: ComponentId,
    },

    /// The same component type was registered twice.
    #[error("component {0} is already registered")]
    Duplicate(&'static str),

    /// The configured component type limit was reached.
    #[error("component type limit reached: at most {limit} types per world")]
    TooManyTypes {
        /// Configured maximum, entity pseudo-type included.
        limit: usize,
    },
}

/// Errors raised while loading a [`WorldConfig`](crate::WorldConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config is not valid TOML or has unexpected fields.
    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of its allowed range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised by checked world lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// The handle's slot was freed or reused.
    #[error("entity {0} is not alive")]
    StaleEntity(Entity),

    /// The entity is alive but does not carry the component.
    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        /// The entity that was looked up.
        entity: Entity,
        /// Type name of the missing component.
        component: &'static str,
    },
}

/// Result type for component registration.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for checked world lookups.
pub type WorldResult<T> = Result<T, WorldError>;
