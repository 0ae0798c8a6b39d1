//! # feasgrid
//!
//! Formula engine for property feasibility grids.
//!
//! A [`Grid`] holds numbers, text and formulas keyed by A1-style addresses.
//! Formulas support `+ - * /`, parentheses, cell and range references, and the
//! aggregates `SUM`, `AVERAGE`, `MIN` and `MAX`. References into other
//! formula cells are followed transitively, with circular references reported
//! as errors rather than looping.
//!
//! ## Features
//!
//! - Formula parsing and evaluation
//! - Whole-grid calculation with per-cell error isolation
//! - Dependency tracking to find the cells an edit affects
//! - Loading and saving grids as JSON (`json` feature, on by default)
//!
//! ## Example
//!
//! ```rust
//! use feasgrid::prelude::*;
//!
//! let mut grid = Grid::new();
//! grid.set_a1("A1", "Land").unwrap();
//! grid.set_a1("B1", 1_200_000.0).unwrap();
//! grid.set_a1("A2", "Build").unwrap();
//! grid.set_a1("B2", 3_450_000.0).unwrap();
//! grid.set_a1("B3", "=SUM(B1:B2)").unwrap();
//!
//! let calc = grid.calculate();
//! assert_eq!(calc.display(CellAddress::parse("B3").unwrap()), "4,650,000");
//! ```

pub mod calculation;
mod error;
#[cfg(feature = "json")]
pub mod file;
pub mod prelude;

pub use calculation::{Calculation, CalculationOptions, CalculationStats, GridCalculationExt};
pub use error::{Error, Result};
#[cfg(feature = "json")]
pub use file::GridFileExt;

// Re-export core types
pub use feasgrid_core::{
    parse_address, parse_range, CellAddress, CellContent, CellRange, Grid, MAX_COLS, MAX_ROWS,
};

// Re-export formula types
pub use feasgrid_formula::{
    cell_display_value, evaluate, evaluate_formula, format_number, get_cell_value, is_formula,
    parse_formula, DependencyGraph, ErrorKind, EvaluationContext, FormulaError, FormulaExpr,
    FormulaResult, FormulaValue, FunctionDef, FunctionRegistry, ERROR_DISPLAY,
    MAX_NESTING_DEPTH, MAX_REFERENCE_DEPTH,
};
