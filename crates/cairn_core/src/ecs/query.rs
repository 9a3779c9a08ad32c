//! # Query Results
//!
//! A query returns one column per requested component id. Columns are
//! index-aligned: row `n` of every column belongs to the same entity, so
//! columns can be zipped into per-entity tuples.

use std::any::{type_name, Any};

use super::component::Component;
use super::signature::ComponentId;

/// Read-only, index-aligned columns of component values.
///
/// Borrows the world, so no structural mutation can happen while a result
/// is alive.
pub struct QueryResult<'w> {
    columns: Vec<(ComponentId, Vec<&'w dyn Any>)>,
}

impl<'w> QueryResult<'w> {
    pub(crate) fn new(columns: Vec<(ComponentId, Vec<&'w dyn Any>)>) -> Self {
        debug_assert!(
            columns.windows(2).all(|pair| pair[0].1.len() == pair[1].1.len()),
            "query columns must be index-aligned"
        );
        Self { columns }
    }

    /// Number of matched entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, |(_, column)| column.len())
    }

    /// Returns `true` if no entity matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Requested component ids, in request order.
    pub fn ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.columns.iter().map(|(id, _)| *id)
    }

    /// Erased column for `id`, if it was requested.
    #[must_use]
    pub fn column(&self, id: ComponentId) -> Option<&[&'w dyn Any]> {
        self.columns
            .iter()
            .find(|(column_id, _)| *column_id == id)
            .map(|(_, column)| column.as_slice())
    }

    /// Typed values of component `T`, in row order.
    ///
    /// # Panics
    ///
    /// Panics if `T::ID` was not part of the query or is registered to a
    /// different type.
    pub fn values<T: Component>(&self) -> impl Iterator<Item = &'w T> + '_ {
        let Some(column) = self.column(T::ID) else {
            panic!("component {} (id {}) was not queried", type_name::<T>(), T::ID);
        };
        column.iter().map(|&value| match value.downcast_ref::<T>() {
            Some(value) => value,
            None => panic!("component id {} does not hold {}", T::ID, type_name::<T>()),
        })
    }
}
