//! Cached recalculation
//!
//! Formula cell values are memoized between edits. Each evaluated formula
//! cell records the local cells it read in a [`DependencyGraph`]; editing a
//! cell drops its cached value and those of everything depending on it.
//! Values that depend on cross-table lookups, or were computed inside a
//! reference cycle, are never cached.

use ahash::AHashMap;
use std::cell::{Cell, RefCell};
use tabula_core::CellId;
use tabula_formula::{DependencyGraph, Value, ValueCache};
use tracing::debug;

/// Counters describing cache effectiveness
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalculationStats {
    /// Formula cells evaluated (cache misses)
    pub evaluations: usize,
    /// Formula cells served from the cache
    pub cache_hits: usize,
    /// Values currently cached
    pub cached_cells: usize,
    /// Cells dropped from the cache by edits
    pub invalidations: usize,
}

/// Dirty-bit value cache backed by a dependency graph
///
/// A cell is dirty exactly when it has no cached value.
#[derive(Debug, Default)]
pub struct CalculationCache {
    values: RefCell<AHashMap<CellId, Value>>,
    graph: RefCell<DependencyGraph>,
    evaluations: Cell<usize>,
    cache_hits: Cell<usize>,
    invalidations: Cell<usize>,
}

impl CalculationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the cached values of `cell` and of every cell depending on it
    ///
    /// The edges from `cell` to what it read are removed as well; they are
    /// recorded again the next time it is evaluated.
    pub fn invalidate(&mut self, cell: CellId) -> usize {
        let stale = self.graph.get_mut().invalidation_set(cell);
        let values = self.values.get_mut();
        let dropped = stale
            .iter()
            .filter(|id| values.remove(*id).is_some())
            .count();
        self.graph.get_mut().clear_precedents(cell);
        self.invalidations.set(self.invalidations.get() + dropped);

        debug!(cell = %cell, dropped, "invalidated");
        dropped
    }

    /// Whether `cell` holds a cached value
    pub fn is_cached(&self, cell: CellId) -> bool {
        self.values.borrow().contains_key(&cell)
    }

    /// Cells that read `cell`, as recorded by the last evaluations
    pub fn dependents(&self, cell: CellId) -> Vec<CellId> {
        let mut dependents: Vec<_> = self.graph.borrow().dependents(cell).collect();
        dependents.sort();
        dependents
    }

    pub fn stats(&self) -> CalculationStats {
        CalculationStats {
            evaluations: self.evaluations.get(),
            cache_hits: self.cache_hits.get(),
            cached_cells: self.values.borrow().len(),
            invalidations: self.invalidations.get(),
        }
    }

    /// Forget every value and edge
    pub fn clear(&mut self) {
        self.values.get_mut().clear();
        self.graph.get_mut().clear();
    }
}

impl ValueCache for CalculationCache {
    fn lookup(&self, cell: CellId) -> Option<Value> {
        let value = self.values.borrow().get(&cell).cloned();
        if value.is_some() {
            self.cache_hits.set(self.cache_hits.get() + 1);
        }
        value
    }

    fn store(&self, cell: CellId, value: &Value, reads: &[CellId], volatile: bool) {
        self.evaluations.set(self.evaluations.get() + 1);
        self.graph
            .borrow_mut()
            .set_precedents(cell, reads.iter().copied());
        if volatile {
            self.values.borrow_mut().remove(&cell);
        } else {
            self.values.borrow_mut().insert(cell, value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> CellId {
        CellId::parse(s).unwrap()
    }

    #[test]
    fn test_store_and_lookup() {
        let cache = CalculationCache::new();
        cache.store(id("B1"), &Value::Number(3.0), &[id("A1")], false);

        assert_eq!(cache.lookup(id("B1")), Some(Value::Number(3.0)));
        assert_eq!(cache.lookup(id("B2")), None);
        assert_eq!(cache.dependents(id("A1")), vec![id("B1")]);
        assert_eq!(
            cache.stats(),
            CalculationStats {
                evaluations: 1,
                cache_hits: 1,
                cached_cells: 1,
                invalidations: 0,
            }
        );
    }

    #[test]
    fn test_volatile_values_are_not_kept() {
        let cache = CalculationCache::new();
        cache.store(id("B1"), &Value::Number(3.0), &[id("A1")], true);
        assert!(!cache.is_cached(id("B1")));
        // Edges are still recorded
        assert_eq!(cache.dependents(id("A1")), vec![id("B1")]);
    }

    #[test]
    fn test_invalidate_transitive() {
        let mut cache = CalculationCache::new();
        cache.store(id("B1"), &Value::Number(1.0), &[id("A1")], false);
        cache.store(id("C1"), &Value::Number(2.0), &[id("B1")], false);
        cache.store(id("D1"), &Value::Number(3.0), &[id("A2")], false);

        assert_eq!(cache.invalidate(id("A1")), 2);
        assert!(!cache.is_cached(id("B1")));
        assert!(!cache.is_cached(id("C1")));
        assert!(cache.is_cached(id("D1")));
        assert_eq!(cache.stats().invalidations, 2);
    }

    #[test]
    fn test_invalidate_formula_cell_clears_its_reads() {
        let mut cache = CalculationCache::new();
        cache.store(id("B1"), &Value::Number(1.0), &[id("A1")], false);

        cache.invalidate(id("B1"));
        assert!(cache.dependents(id("A1")).is_empty());
    }
}
