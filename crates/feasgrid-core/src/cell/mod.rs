//! Cell-related types
//!
//! This module contains:
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellRange`] - A rectangular block of cells (e.g., "A1:B10")
//! - [`CellContent`] - The content stored in a cell

mod address;
mod content;

pub use address::{parse_address, parse_range, CellAddress, CellRange, CellRangeIterator};
pub use content::CellContent;
