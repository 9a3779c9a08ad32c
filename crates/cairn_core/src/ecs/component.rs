//! # Component System
//!
//! Components are plain data attached to entities. Each component type
//! carries a dense, compile-time id that indexes the world's store array and
//! its bit in every archetype signature.

use super::signature::ComponentId;

/// Marker trait for ECS components.
///
/// Components must be:
/// - `Default`: stores pre-fill slots and reset erased ones
/// - `Send + Sync`: a world may be moved behind a lock
/// - `'static`: stores are type-erased and downcast by `TypeId`
///
/// Ids must be dense: the n-th registered type carries `ID == n`, starting
/// at `1` because `0` is the entity pseudo-component.
///
/// # Example
///
/// ```rust
/// use cairn_core::{Component, ComponentId};
///
/// #[derive(Clone, Copy, Debug, Default, PartialEq)]
/// struct Position {
///     x: f32,
///     y: f32,
/// }
///
/// impl Component for Position {
///     const ID: ComponentId = 1;
/// }
/// ```
pub trait Component: Default + Send + Sync + 'static {
    /// Dense identifier for this component type.
    const ID: ComponentId;
}
