//! # feasgrid-formula
//!
//! Formula parser and evaluator for feasgrid.
//!
//! This crate provides:
//! - Formula parsing (text → AST)
//! - Formula evaluation (AST → number), with transitive cell references and
//!   circular reference detection
//! - The aggregate functions SUM, AVERAGE, MIN and MAX
//! - Dependency tracking between formula cells
//! - Display helpers used by the grid UI
//!
//! ## Example
//!
//! ```rust
//! use feasgrid_core::Grid;
//! use feasgrid_formula::{evaluate_formula, FormulaValue};
//!
//! let mut grid = Grid::new();
//! grid.set_a1("A1", 1.0).unwrap();
//! grid.set_a1("A2", 2.0).unwrap();
//! grid.set_a1("A3", "=A1+A2").unwrap();
//!
//! assert_eq!(evaluate_formula("=SUM(A1:A3)", &grid), FormulaValue::Number(6.0));
//! ```

pub mod ast;
pub mod dependency;
pub mod display;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;

pub use ast::{BinaryOperator, FormulaExpr, UnaryOperator};
pub use dependency::DependencyGraph;
pub use display::{format_number, is_formula, ERROR_DISPLAY};
pub use error::{ErrorKind, FormulaError, FormulaResult};
pub use evaluator::{
    cell_display_value, evaluate, evaluate_formula, get_cell_value, EvaluationContext,
    FormulaValue, MAX_REFERENCE_DEPTH,
};
pub use functions::{FunctionDef, FunctionRegistry};
pub use parser::{parse_formula, parse_formula_with, MAX_NESTING_DEPTH};
