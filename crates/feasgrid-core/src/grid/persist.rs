//! Serde support for [`Grid`] in the persistence layer's shape
//!
//! Grids are stored as nested maps keyed by 0-based row index, then by
//! column letters:
//!
//! ```json
//! { "0": { "A": { "value": 1200 }, "B": { "value": "", "formula": "=A1*1.1" } } }
//! ```
//!
//! A non-empty `formula` wins over `value`. Cells with an empty text value
//! and no formula are treated as empty and dropped.

use super::Grid;
use crate::cell::{CellAddress, CellContent};
use crate::MAX_ROWS;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredValue {
    Number(f64),
    Text(String),
}

impl Default for StoredValue {
    fn default() -> Self {
        StoredValue::Text(String::new())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredCell {
    #[serde(default)]
    value: StoredValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    formula: Option<String>,
}

impl StoredCell {
    fn into_content(self) -> Option<CellContent> {
        match (self.formula, self.value) {
            (Some(formula), _) if !formula.is_empty() => Some(CellContent::Formula(formula)),
            (_, StoredValue::Number(n)) => Some(CellContent::Number(n)),
            (_, StoredValue::Text(t)) if t.is_empty() => None,
            (_, StoredValue::Text(t)) => Some(CellContent::Text(t)),
        }
    }

    fn from_content(content: &CellContent) -> Self {
        match content {
            CellContent::Number(n) => StoredCell {
                value: StoredValue::Number(*n),
                formula: None,
            },
            CellContent::Text(t) => StoredCell {
                value: StoredValue::Text(t.clone()),
                formula: None,
            },
            CellContent::Formula(f) => StoredCell {
                value: StoredValue::default(),
                formula: Some(f.clone()),
            },
        }
    }
}

type StoredGrid = BTreeMap<u32, BTreeMap<String, StoredCell>>;

impl Serialize for Grid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut rows: StoredGrid = BTreeMap::new();
        for (addr, content) in self.iter() {
            rows.entry(addr.row).or_default().insert(
                CellAddress::column_to_letters(addr.col),
                StoredCell::from_content(content),
            );
        }
        rows.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Grid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let rows = StoredGrid::deserialize(deserializer)?;
        let mut grid = Grid::new();

        for (row, columns) in rows {
            if row >= MAX_ROWS {
                return Err(D::Error::custom(format!(
                    "row index {} exceeds the last row index {}",
                    row,
                    MAX_ROWS - 1
                )));
            }
            for (letters, cell) in columns {
                let col = CellAddress::letters_to_column(&letters).map_err(D::Error::custom)?;
                if let Some(content) = cell.into_content() {
                    grid.set(CellAddress::new(row, col), content);
                }
            }
        }

        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_stored_shape() {
        let json = r#"{
            "0": { "A": { "value": 1200 }, "B": { "value": "Land" } },
            "1": { "A": { "value": 0, "formula": "=A1*1.1" }, "c": { "value": "" } },
            "2": { "A": { "value": "15", "formula": "" } }
        }"#;

        let grid: Grid = serde_json::from_str(json).unwrap();

        assert_eq!(grid.len(), 4);
        assert_eq!(grid.get_a1("A1").unwrap(), Some(&CellContent::Number(1200.0)));
        assert_eq!(grid.get_a1("B1").unwrap(), Some(&CellContent::text("Land")));
        assert_eq!(grid.get_a1("A2").unwrap(), Some(&CellContent::formula("=A1*1.1")));
        assert_eq!(grid.get_a1("C2").unwrap(), None);
        assert_eq!(grid.get_a1("A3").unwrap(), Some(&CellContent::text("15")));
    }

    #[test]
    fn test_serialize_round_trip() {
        let mut grid = Grid::new();
        grid.set_a1("A1", 5.0).unwrap();
        grid.set_a1("AA10", "Fees").unwrap();
        grid.set_a1("B1", "=A1+1").unwrap();

        let json = serde_json::to_value(&grid).unwrap();
        assert_eq!(json["0"]["A"]["value"], serde_json::json!(5.0));
        assert_eq!(json["0"]["B"]["formula"], serde_json::json!("=A1+1"));
        assert_eq!(json["9"]["AA"]["value"], serde_json::json!("Fees"));

        let back: Grid = serde_json::from_value(json).unwrap();
        assert_eq!(back, grid);
    }

    #[test]
    fn test_rejects_bad_keys() {
        assert!(serde_json::from_str::<Grid>(r#"{ "0": { "A1": { "value": 1 } } }"#).is_err());
        assert!(serde_json::from_str::<Grid>(r#"{ "x": { "A": { "value": 1 } } }"#).is_err());
        assert!(serde_json::from_str::<Grid>(r#"{ "1048576": { "A": { "value": 1 } } }"#).is_err());
    }
}
