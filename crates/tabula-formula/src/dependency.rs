//! Dependency tracking for cached evaluation
//!
//! Edges are recorded as formula cells are evaluated: a cell's precedents are
//! the local cells it read. Editing a cell invalidates the cell and everything
//! that transitively depends on it.

use ahash::{AHashMap, AHashSet};
use tabula_core::CellId;

/// Dependency graph for formula cells
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// Cell → cells that read it
    dependents: AHashMap<CellId, AHashSet<CellId>>,
    /// Cell → cells it reads
    precedents: AHashMap<CellId, AHashSet<CellId>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `dependent` reads `precedent`
    pub fn add_dependency(&mut self, precedent: CellId, dependent: CellId) {
        self.dependents
            .entry(precedent)
            .or_default()
            .insert(dependent);
        self.precedents
            .entry(dependent)
            .or_default()
            .insert(precedent);
    }

    /// Replace everything `cell` reads
    ///
    /// Cells that read `cell` keep their edges.
    pub fn set_precedents<I>(&mut self, cell: CellId, precedents: I)
    where
        I: IntoIterator<Item = CellId>,
    {
        self.clear_precedents(cell);
        for precedent in precedents {
            self.add_dependency(precedent, cell);
        }
    }

    /// Drop the edges from `cell` to the cells it reads
    pub fn clear_precedents(&mut self, cell: CellId) {
        if let Some(precedents) = self.precedents.remove(&cell) {
            for precedent in precedents {
                if let Some(deps) = self.dependents.get_mut(&precedent) {
                    deps.remove(&cell);
                    if deps.is_empty() {
                        self.dependents.remove(&precedent);
                    }
                }
            }
        }
    }

    /// Cells that read `cell`
    pub fn dependents(&self, cell: CellId) -> impl Iterator<Item = CellId> + '_ {
        self.dependents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Cells that `cell` reads
    pub fn precedents(&self, cell: CellId) -> impl Iterator<Item = CellId> + '_ {
        self.precedents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// `changed` plus every cell that transitively depends on it
    ///
    /// Terminates on cyclic graphs. Order is breadth first from `changed`.
    pub fn invalidation_set(&self, changed: CellId) -> Vec<CellId> {
        let mut result = vec![changed];
        let mut seen = AHashSet::new();
        seen.insert(changed);

        let mut next = 0;
        while next < result.len() {
            let cell = result[next];
            next += 1;
            for dependent in self.dependents(cell) {
                if seen.insert(dependent) {
                    result.push(dependent);
                }
            }
        }
        result
    }

    pub fn clear(&mut self) {
        self.dependents.clear();
        self.precedents.clear();
    }
}
