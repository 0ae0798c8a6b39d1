//! Dependency tracking for formula cells

use crate::ast::FormulaExpr;
use crate::parser::parse_formula;
use ahash::{AHashMap, AHashSet};
use feasgrid_core::{CellAddress, CellContent, CellRange, Grid};
use std::collections::VecDeque;
use tracing::debug;

/// Dependency graph for formula cells
///
/// Tracks which cells each formula reads, so that an edit can be mapped to
/// the formula cells whose display must be refreshed. Single-cell references
/// are stored per cell. Ranges are stored as ranges and matched on lookup,
/// so a formula over a whole column costs one entry.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Cell → formula cells that reference it directly
    dependents: AHashMap<CellAddress, AHashSet<CellAddress>>,
    /// Formula cell → cells it references directly
    precedents: AHashMap<CellAddress, AHashSet<CellAddress>>,
    /// Formula cell → ranges it reads
    ranges: AHashMap<CellAddress, Vec<CellRange>>,
    /// Non-empty cells, as of the last build or edit
    occupied: AHashSet<CellAddress>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for every formula in a grid
    ///
    /// Formulas that fail to parse have no precedents.
    pub fn from_grid(grid: &Grid) -> Self {
        let mut graph = Self::new();
        for (addr, content) in grid.iter() {
            graph.update_cell(addr, Some(content));
        }
        graph
    }

    /// Bring the graph up to date after `cell` was edited
    ///
    /// `content` is what the cell now holds, `None` once it is cleared.
    pub fn update_cell(&mut self, cell: CellAddress, content: Option<&CellContent>) {
        self.clear_dependencies(cell);

        match content {
            None => {
                self.occupied.remove(&cell);
            }
            Some(CellContent::Formula(formula)) => match parse_formula(formula) {
                Ok(expr) => self.add_formula(cell, &expr),
                Err(e) => {
                    debug!(cell = %cell, error = %e, "skipping unparsable formula");
                    self.occupied.insert(cell);
                }
            },
            Some(_) => {
                self.occupied.insert(cell);
            }
        }
    }

    /// Record the references of the formula stored at `cell`
    ///
    /// Replaces whatever was recorded for `cell` before.
    pub fn add_formula(&mut self, cell: CellAddress, expr: &FormulaExpr) {
        self.clear_dependencies(cell);
        self.occupied.insert(cell);
        self.collect(cell, expr);
    }

    fn collect(&mut self, cell: CellAddress, expr: &FormulaExpr) {
        match expr {
            FormulaExpr::Number(_) => {}
            FormulaExpr::CellRef(addr) => self.add_dependency(*addr, cell),
            FormulaExpr::RangeRef(range) => self.ranges.entry(cell).or_default().push(*range),
            FormulaExpr::BinaryOp { left, right, .. } => {
                self.collect(cell, left);
                self.collect(cell, right);
            }
            FormulaExpr::UnaryOp { operand, .. } => self.collect(cell, operand),
            FormulaExpr::Function { args, .. } => {
                for arg in args {
                    self.collect(cell, arg);
                }
            }
        }
    }

    /// Add a dependency: dependent depends on precedent
    pub fn add_dependency(&mut self, precedent: CellAddress, dependent: CellAddress) {
        self.dependents
            .entry(precedent)
            .or_default()
            .insert(dependent);
        self.precedents
            .entry(dependent)
            .or_default()
            .insert(precedent);
    }

    /// Remove all dependencies recorded for a formula cell
    pub fn clear_dependencies(&mut self, cell: CellAddress) {
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
        self.ranges.remove(&cell);
    }

    /// Cells read by the formula at `cell`, in raster order
    ///
    /// Ranges contribute the non-empty cells they cover.
    pub fn precedents(&self, cell: CellAddress) -> Vec<CellAddress> {
        let mut result: AHashSet<CellAddress> = self
            .precedents
            .get(&cell)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();

        if let Some(ranges) = self.ranges.get(&cell) {
            result.extend(
                self.occupied
                    .iter()
                    .copied()
                    .filter(|addr| ranges.iter().any(|r| r.contains(addr))),
            );
        }

        sorted(result)
    }

    /// Formula cells that read `cell` directly, in raster order
    pub fn dependents(&self, cell: CellAddress) -> Vec<CellAddress> {
        let mut result: AHashSet<CellAddress> = self
            .dependents
            .get(&cell)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();

        result.extend(
            self.ranges
                .iter()
                .filter(|(_, ranges)| ranges.iter().any(|r| r.contains(&cell)))
                .map(|(formula, _)| *formula),
        );

        sorted(result)
    }

    /// Every formula cell that transitively reads any of the changed cells
    ///
    /// Each cell appears once, nearest dependents first. A changed cell is
    /// only included when it depends on itself through a cycle.
    pub fn affected_by(&self, changed: &[CellAddress]) -> Vec<CellAddress> {
        let mut result = Vec::new();
        let mut seen = AHashSet::new();
        let mut queue: VecDeque<CellAddress> = changed.iter().copied().collect();

        while let Some(cell) = queue.pop_front() {
            for dependent in self.dependents(cell) {
                if seen.insert(dependent) {
                    result.push(dependent);
                    queue.push_back(dependent);
                }
            }
        }

        result
    }

    /// Detect circular references involving a cell
    pub fn has_circular_reference(&self, cell: CellAddress) -> bool {
        self.affected_by(&[cell]).contains(&cell)
    }

    /// Number of formula cells with recorded references
    pub fn formula_count(&self) -> usize {
        let mut formulas: AHashSet<&CellAddress> = self.precedents.keys().collect();
        formulas.extend(self.ranges.keys());
        formulas.len()
    }

    /// Clear the entire graph
    pub fn clear(&mut self) {
        self.dependents.clear();
        self.precedents.clear();
        self.ranges.clear();
        self.occupied.clear();
    }
}

fn sorted(set: AHashSet<CellAddress>) -> Vec<CellAddress> {
    let mut cells: Vec<_> = set.into_iter().collect();
    cells.sort_unstable();
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn addr(a1: &str) -> CellAddress {
        CellAddress::parse(a1).unwrap()
    }

    fn addrs(list: &[&str]) -> Vec<CellAddress> {
        list.iter().map(|a| addr(a)).collect()
    }

    fn grid(cells: &[(&str, &str)]) -> Grid {
        let mut grid = Grid::new();
        for (a1, input) in cells {
            grid.set_a1(a1, *input).unwrap();
        }
        grid
    }

    #[test]
    fn test_add_dependency() {
        let mut graph = DependencyGraph::new();

        let a1 = addr("A1");
        let b1 = addr("B1");

        graph.add_dependency(a1, b1);

        assert_eq!(graph.dependents(a1), vec![b1]);
        assert_eq!(graph.precedents(b1), vec![a1]);
    }

    #[test]
    fn test_from_grid() {
        let g = grid(&[
            ("A1", "100"),
            ("A2", "250"),
            ("A4", "Notes"),
            ("B1", "=A1*2"),
            ("B2", "=SUM(A1:A5) + B1"),
            ("C1", "=FOO(A1)"),
        ]);
        let graph = DependencyGraph::from_grid(&g);

        assert_eq!(graph.formula_count(), 2);
        assert_eq!(graph.precedents(addr("B2")), addrs(&["A1", "B1", "A2", "A4"]));
        assert_eq!(graph.dependents(addr("A1")), addrs(&["B1", "B2"]));
        // Empty cells inside a range still have the range's formula as dependent
        assert_eq!(graph.dependents(addr("A5")), addrs(&["B2"]));
        assert!(graph.precedents(addr("C1")).is_empty());
    }

    #[test]
    fn test_affected_by() {
        let g = grid(&[
            ("A1", "1"),
            ("B1", "=A1+1"),
            ("C1", "=B1*2"),
            ("D1", "=SUM(B1:C1)"),
            ("E1", "=7"),
        ]);
        let graph = DependencyGraph::from_grid(&g);

        assert_eq!(graph.affected_by(&[addr("A1")]), addrs(&["B1", "C1", "D1"]));
        assert_eq!(graph.affected_by(&[addr("C1")]), addrs(&["D1"]));
        assert!(graph.affected_by(&[addr("E1")]).is_empty());
    }

    #[test]
    fn test_replace_formula() {
        let g = grid(&[("A1", "1"), ("B1", "=A1")]);
        let mut graph = DependencyGraph::from_grid(&g);

        graph.add_formula(addr("B1"), &parse_formula("=C1").unwrap());
        assert!(graph.dependents(addr("A1")).is_empty());
        assert_eq!(graph.dependents(addr("C1")), addrs(&["B1"]));

        graph.clear_dependencies(addr("B1"));
        assert!(graph.dependents(addr("C1")).is_empty());
    }

    #[test]
    fn test_update_cell() {
        let mut g = grid(&[("A1", "100"), ("B1", "=SUM(A1:A3)"), ("C1", "=A1*2")]);
        let mut graph = DependencyGraph::from_grid(&g);
        assert_eq!(graph.precedents(addr("B1")), addrs(&["A1"]));

        g.set_a1("A2", 50.0).unwrap();
        graph.update_cell(addr("A2"), g.get(addr("A2")));
        assert_eq!(graph.precedents(addr("B1")), addrs(&["A1", "A2"]));

        g.remove(addr("A1"));
        graph.update_cell(addr("A1"), None);
        assert_eq!(graph.precedents(addr("B1")), addrs(&["A2"]));
        assert_eq!(graph.dependents(addr("A1")), addrs(&["B1", "C1"]));

        // A formula replaced by a value no longer reads anything
        g.set_a1("C1", "7").unwrap();
        graph.update_cell(addr("C1"), g.get(addr("C1")));
        assert!(graph.precedents(addr("C1")).is_empty());
        assert_eq!(graph.dependents(addr("A1")), addrs(&["B1"]));
        assert_eq!(graph.formula_count(), 1);
    }

    #[test]
    fn test_circular_reference() {
        let g = grid(&[("A1", "=C1"), ("B1", "=A1"), ("C1", "=SUM(B1)"), ("D1", "=A1")]);
        let graph = DependencyGraph::from_grid(&g);

        // A1 -> B1 -> C1 -> A1 (circular)
        assert!(graph.has_circular_reference(addr("A1")));
        assert!(graph.has_circular_reference(addr("B1")));
        assert!(graph.has_circular_reference(addr("C1")));
        assert!(!graph.has_circular_reference(addr("D1")));

        let affected = graph.affected_by(&[addr("A1")]);
        assert_eq!(affected.len(), 4);
    }
}
