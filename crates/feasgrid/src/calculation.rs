//! Grid calculation
//!
//! Evaluates every formula cell of a grid and collects the values a grid
//! view shows, with statistics about the run.
//!
//! # Example
//!
//! ```rust
//! use feasgrid::prelude::*;
//!
//! let mut grid = Grid::new();
//! grid.set_a1("A1", 10.0).unwrap();
//! grid.set_a1("A2", 20.0).unwrap();
//! grid.set_a1("A3", "=A1+A2").unwrap();
//! grid.set_a1("A4", "=A3/0").unwrap();
//!
//! let calc = grid.calculate();
//! assert_eq!(calc.stats.cells_calculated, 2);
//! assert_eq!(calc.stats.errors, 1);
//! assert_eq!(calc.display(CellAddress::parse("A3").unwrap()), "30");
//! ```

use crate::{
    cell_display_value, CellAddress, DependencyGraph, ErrorKind, EvaluationContext,
    FormulaValue, Grid, MAX_REFERENCE_DEPTH,
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Options for grid calculation
#[derive(Debug, Clone)]
pub struct CalculationOptions {
    /// Longest reference chain followed from one formula (default: [`MAX_REFERENCE_DEPTH`])
    pub max_depth: usize,
}

impl Default for CalculationOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_REFERENCE_DEPTH,
        }
    }
}

/// Statistics from a calculation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculationStats {
    /// Total number of formula cells
    pub formula_count: usize,
    /// Number of formula cells calculated
    pub cells_calculated: usize,
    /// Number of formula cells whose result is an error
    pub errors: usize,
    /// Number of formula cells whose result is a circular reference
    pub circular_references: usize,
}

/// Values computed for a grid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Calculation {
    /// Value of every calculated cell, in raster order
    pub values: BTreeMap<CellAddress, FormulaValue>,
    /// Run statistics
    pub stats: CalculationStats,
}

impl Calculation {
    /// Computed value of a cell, if it was part of the run
    pub fn get(&self, addr: CellAddress) -> Option<&FormulaValue> {
        self.values.get(&addr)
    }

    /// The string a grid shows for a cell; empty for cells not in the run
    pub fn display(&self, addr: CellAddress) -> String {
        self.values
            .get(&addr)
            .map(FormulaValue::display)
            .unwrap_or_default()
    }

    /// Cells whose value is an error, in raster order
    pub fn errors(&self) -> impl Iterator<Item = (CellAddress, ErrorKind)> + '_ {
        self.values
            .iter()
            .filter_map(|(addr, value)| value.error_kind().map(|kind| (*addr, kind)))
    }
}

/// Extension trait for Grid to add calculation methods
pub trait GridCalculationExt {
    /// Calculate every non-empty cell with default options
    fn calculate(&self) -> Calculation;

    /// Calculate every non-empty cell with custom options
    fn calculate_with_options(&self, options: &CalculationOptions) -> Calculation;

    /// Recalculate only the formula cells affected by editing `changed`
    fn recalculate(&self, changed: &[CellAddress]) -> Calculation;
}

impl GridCalculationExt for Grid {
    fn calculate(&self) -> Calculation {
        self.calculate_with_options(&CalculationOptions::default())
    }

    fn calculate_with_options(&self, options: &CalculationOptions) -> Calculation {
        let mut calc = Calculation::default();

        for (addr, content) in self.iter() {
            if content.is_formula() {
                calc.stats.formula_count += 1;
                let value = calculate_cell(self, addr, options, &mut calc.stats);
                calc.values.insert(addr, value);
            } else {
                calc.values.insert(addr, cell_display_value(addr, self));
            }
        }

        debug!(
            formulas = calc.stats.formula_count,
            errors = calc.stats.errors,
            "grid calculated"
        );
        calc
    }

    fn recalculate(&self, changed: &[CellAddress]) -> Calculation {
        let options = CalculationOptions::default();
        let graph = DependencyGraph::from_grid(self);
        let mut calc = Calculation::default();

        let mut targets = graph.affected_by(changed);
        targets.extend(changed.iter().filter(|addr| {
            self.get(**addr).map_or(false, |content| content.is_formula())
        }));

        for addr in targets {
            if calc.values.contains_key(&addr) {
                continue;
            }
            calc.stats.formula_count += 1;
            let value = calculate_cell(self, addr, &options, &mut calc.stats);
            calc.values.insert(addr, value);
        }

        calc
    }
}

/// Evaluate one formula cell with a fresh context
fn calculate_cell(
    grid: &Grid,
    addr: CellAddress,
    options: &CalculationOptions,
    stats: &mut CalculationStats,
) -> FormulaValue {
    let mut ctx = EvaluationContext::new(grid).with_max_depth(options.max_depth);

    let value: FormulaValue = ctx.cell_number(addr).into();
    stats.cells_calculated += 1;

    match value.error_kind() {
        Some(ErrorKind::CircularReference) => {
            warn!(cell = %addr, "circular reference");
            stats.errors += 1;
            stats.circular_references += 1;
        }
        Some(kind) => {
            debug!(cell = %addr, error = %kind, "formula evaluated to an error");
            stats.errors += 1;
        }
        None => {}
    }

    value
}
