//! Prelude module - common imports for feasgrid users
//!
//! ```rust
//! use feasgrid::prelude::*;
//! ```

pub use crate::{
    // Calculation types
    Calculation,
    CalculationOptions,
    CalculationStats,
    // Cell types
    CellAddress,
    CellContent,
    CellRange,
    // Error types
    Error,
    ErrorKind,
    FormulaValue,
    // Main types
    Grid,
    // Extension traits
    GridCalculationExt,
    Result,
};

#[cfg(feature = "json")]
pub use crate::GridFileExt;
