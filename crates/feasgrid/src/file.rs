//! Grid files
//!
//! Grids are stored as JSON in the persistence layer's shape, keyed by
//! 0-based row index and then column letters:
//!
//! ```json
//! { "0": { "A": { "value": "Land" }, "B": { "value": 1200000 } },
//!   "1": { "B": { "value": "", "formula": "=B1*0.05" } } }
//! ```

use crate::{Grid, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Extension trait for Grid to add file I/O
pub trait GridFileExt: Sized {
    /// Open a grid from a JSON file
    fn open<P: AsRef<Path>>(path: P) -> Result<Self>;

    /// Save the grid to a JSON file
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()>;

    /// Parse a grid from JSON text
    fn from_json(json: &str) -> Result<Self>;

    /// Serialize the grid as pretty-printed JSON text
    fn to_json(&self) -> Result<String>;
}

impl GridFileExt for Grid {
    fn open<P: AsRef<Path>>(path: P) -> Result<Grid> {
        let path = path.as_ref();
        let grid = Self::from_json(&fs::read_to_string(path)?)?;
        debug!(path = %path.display(), cells = grid.len(), "grid loaded");
        Ok(grid)
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    fn from_json(json: &str) -> Result<Grid> {
        Ok(serde_json::from_str(json)?)
    }

    fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
