//! # feasgrid-core
//!
//! Core data structures for the feasgrid formula engine.
//!
//! This crate provides the types the evaluator reads from:
//! - [`CellAddress`] and [`CellRange`] - A1-style addressing and rectangular ranges
//! - [`CellContent`] - What a cell stores (number, text or formula)
//! - [`Grid`] - The sparse two-dimensional cell store
//!
//! ## Example
//!
//! ```rust
//! use feasgrid_core::{CellContent, Grid};
//!
//! let mut grid = Grid::new();
//! grid.set_a1("A1", CellContent::Number(1200.0)).unwrap();
//! grid.set_a1("A2", CellContent::from_input("=A1*1.1")).unwrap();
//!
//! assert_eq!(grid.len(), 2);
//! assert!(grid.get_a1("B7").unwrap().is_none());
//! ```

pub mod cell;
pub mod error;
pub mod grid;

pub use cell::{parse_address, parse_range, CellAddress, CellContent, CellRange, CellRangeIterator};
pub use error::{Error, Result};
pub use grid::Grid;

/// Maximum number of rows in a grid
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a grid (column `XFD`)
pub const MAX_COLS: u16 = 16_384;
