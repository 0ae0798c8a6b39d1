//! Sparse grid of cells
//!
//! The grid is owned by the surrounding application. The formula engine only
//! borrows it for the duration of one evaluation and never mutates it.

#[cfg(feature = "serde")]
mod persist;

use crate::cell::{CellAddress, CellContent, CellRange};
use crate::error::Result;
use ahash::AHashMap;

/// A sparse two-dimensional store of cell contents
///
/// Absent coordinates are empty cells. Insertion order is irrelevant; all
/// lookups are by [`CellAddress`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    cells: AHashMap<CellAddress, CellContent>,
}

impl Grid {
    /// Create an empty grid
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the content at an address, `None` if the cell is empty
    pub fn get(&self, addr: CellAddress) -> Option<&CellContent> {
        self.cells.get(&addr)
    }

    /// Get the content at an A1-style address
    pub fn get_a1(&self, address: &str) -> Result<Option<&CellContent>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get(addr))
    }

    /// Store content at an address, returning the previous content
    pub fn set<C: Into<CellContent>>(&mut self, addr: CellAddress, content: C) -> Option<CellContent> {
        self.cells.insert(addr, content.into())
    }

    /// Store content at an A1-style address
    ///
    /// # Example
    /// ```
    /// use feasgrid_core::{CellContent, Grid};
    ///
    /// let mut grid = Grid::new();
    /// grid.set_a1("B2", 250.0).unwrap();
    /// grid.set_a1("B3", "=B2*4").unwrap();
    /// assert_eq!(grid.get_a1("B3").unwrap(), Some(&CellContent::formula("=B2*4")));
    /// ```
    pub fn set_a1<C: Into<CellContent>>(
        &mut self,
        address: &str,
        content: C,
    ) -> Result<Option<CellContent>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.set(addr, content))
    }

    /// Clear a cell, returning its previous content
    pub fn remove(&mut self, addr: CellAddress) -> Option<CellContent> {
        self.cells.remove(&addr)
    }

    /// Number of non-empty cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the grid has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over all non-empty cells in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (CellAddress, &CellContent)> + '_ {
        self.cells.iter().map(|(addr, content)| (*addr, content))
    }

    /// Iterate over formula cells as `(address, formula text)`
    pub fn formula_cells(&self) -> impl Iterator<Item = (CellAddress, &str)> + '_ {
        self.cells
            .iter()
            .filter_map(|(addr, content)| content.as_formula().map(|f| (*addr, f)))
    }

    /// The smallest range covering every non-empty cell
    pub fn used_range(&self) -> Option<CellRange> {
        let mut addrs = self.cells.keys();
        let first = *addrs.next()?;

        let (mut min_row, mut min_col, mut max_row, mut max_col) =
            (first.row, first.col, first.row, first.col);
        for addr in addrs {
            min_row = min_row.min(addr.row);
            min_col = min_col.min(addr.col);
            max_row = max_row.max(addr.row);
            max_col = max_col.max(addr.col);
        }

        Some(CellRange::from_indices(min_row, min_col, max_row, max_col))
    }
}

impl FromIterator<(CellAddress, CellContent)> for Grid {
    fn from_iter<I: IntoIterator<Item = (CellAddress, CellContent)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_and_get() {
        let mut grid = Grid::new();
        assert!(grid.is_empty());

        grid.set_a1("A1", 10.0).unwrap();
        grid.set_a1("a2", "=A1*2").unwrap();
        grid.set_a1("A3", "Contingency").unwrap();

        assert_eq!(grid.len(), 3);
        assert_eq!(grid.get(CellAddress::new(0, 0)), Some(&CellContent::Number(10.0)));
        assert_eq!(grid.get_a1("A2").unwrap(), Some(&CellContent::formula("=A1*2")));
        assert_eq!(grid.get_a1("A3").unwrap(), Some(&CellContent::text("Contingency")));
        assert_eq!(grid.get_a1("Z99").unwrap(), None);
    }

    #[test]
    fn test_set_replaces_and_remove_clears() {
        let mut grid = Grid::new();
        let addr = CellAddress::new(4, 2);

        assert_eq!(grid.set(addr, 1.0), None);
        assert_eq!(grid.set(addr, 2.0), Some(CellContent::Number(1.0)));
        assert_eq!(grid.remove(addr), Some(CellContent::Number(2.0)));
        assert!(grid.get(addr).is_none());
    }

    #[test]
    fn test_invalid_address() {
        let mut grid = Grid::new();
        assert!(matches!(grid.set_a1("1A", 1.0), Err(Error::InvalidAddress(_))));
        assert!(matches!(grid.get_a1(""), Err(Error::InvalidAddress(_))));
    }

    #[test]
    fn test_formula_cells() {
        let mut grid = Grid::new();
        grid.set_a1("A1", 1.0).unwrap();
        grid.set_a1("B1", "=A1").unwrap();
        grid.set_a1("C1", "=B1").unwrap();

        let mut formulas: Vec<_> = grid
            .formula_cells()
            .map(|(addr, f)| (addr.to_string(), f.to_string()))
            .collect();
        formulas.sort();

        assert_eq!(
            formulas,
            vec![
                ("B1".to_string(), "=A1".to_string()),
                ("C1".to_string(), "=B1".to_string()),
            ]
        );
    }

    #[test]
    fn test_used_range() {
        let mut grid = Grid::new();
        assert_eq!(grid.used_range(), None);

        grid.set_a1("C2", 1.0).unwrap();
        grid.set_a1("A5", 1.0).unwrap();
        grid.set_a1("B9", 1.0).unwrap();

        assert_eq!(grid.used_range(), Some(CellRange::parse("A2:C9").unwrap()));
    }
}
