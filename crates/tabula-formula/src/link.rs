//! Cross-table link resolution
//!
//! A formula may reference cells of other tables (`Sales:B2`). Those values
//! come from outside the grid; all references of one formula are handed to
//! the resolver in a single batch.

use std::collections::{BTreeSet, HashMap};
use tabula_core::{CellId, TableRef};

/// Source of values for cross-table references
pub trait LinkResolver {
    /// Resolve a batch of references
    ///
    /// References missing from the returned map are lookup failures. A value
    /// equal to the `#####` sentinel is a failure as well.
    fn resolve(&self, refs: &BTreeSet<TableRef>) -> HashMap<TableRef, String>;
}

impl<T: LinkResolver + ?Sized> LinkResolver for &T {
    fn resolve(&self, refs: &BTreeSet<TableRef>) -> HashMap<TableRef, String> {
        (**self).resolve(refs)
    }
}

impl<T: LinkResolver + ?Sized> LinkResolver for Box<T> {
    fn resolve(&self, refs: &BTreeSet<TableRef>) -> HashMap<TableRef, String> {
        (**self).resolve(refs)
    }
}

/// Resolver for standalone grids: every lookup fails
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLinks;

impl LinkResolver for NoLinks {
    fn resolve(&self, _refs: &BTreeSet<TableRef>) -> HashMap<TableRef, String> {
        HashMap::new()
    }
}

/// Resolver backed by a fixed map of values
#[derive(Debug, Clone, Default)]
pub struct StaticLinks {
    values: HashMap<TableRef, String>,
}

impl StaticLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the value of `table:cell`
    pub fn insert(&mut self, table: impl Into<String>, cell: CellId, value: impl Into<String>) {
        self.values
            .insert(TableRef::new(table, cell), value.into());
    }

    /// Builder form of [`StaticLinks::insert`]
    pub fn with(mut self, table: impl Into<String>, cell: CellId, value: impl Into<String>) -> Self {
        self.insert(table, cell, value);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(TableRef, String)> for StaticLinks {
    fn from_iter<I: IntoIterator<Item = (TableRef, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl LinkResolver for StaticLinks {
    fn resolve(&self, refs: &BTreeSet<TableRef>) -> HashMap<TableRef, String> {
        refs.iter()
            .filter_map(|r| self.values.get(r).map(|v| (r.clone(), v.clone())))
            .collect()
    }
}
