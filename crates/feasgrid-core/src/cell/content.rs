//! Cell content types

use std::fmt;

/// The content stored in a single grid cell
///
/// A formula is authoritative: there is no cached result stored next to it,
/// its value is re-derived from the grid on every read. Empty cells are not
/// represented; they are simply absent from the [`Grid`](crate::Grid).
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    /// Numeric literal
    Number(f64),
    /// Text literal
    Text(String),
    /// Formula source text (e.g., "=SUM(A1:A10)")
    Formula(String),
}

impl CellContent {
    /// Create a text cell
    pub fn text<S: Into<String>>(s: S) -> Self {
        CellContent::Text(s.into())
    }

    /// Create a formula cell
    pub fn formula<S: Into<String>>(text: S) -> Self {
        CellContent::Formula(text.into())
    }

    /// Classify raw user input the way the grid editor stores it
    ///
    /// Input starting with `=` is a formula, input that parses entirely as a
    /// number is a number, anything else is kept as text.
    ///
    /// # Examples
    /// ```
    /// use feasgrid_core::CellContent;
    ///
    /// assert_eq!(CellContent::from_input("=A1+1"), CellContent::formula("=A1+1"));
    /// assert_eq!(CellContent::from_input(" 42.5 "), CellContent::Number(42.5));
    /// assert_eq!(CellContent::from_input("Land cost"), CellContent::text("Land cost"));
    /// ```
    pub fn from_input(input: &str) -> Self {
        if input.starts_with('=') {
            return CellContent::Formula(input.to_string());
        }

        match parse_number(input) {
            Some(n) => CellContent::Number(n),
            None => CellContent::Text(input.to_string()),
        }
    }

    /// Check if the cell contains a formula
    pub fn is_formula(&self) -> bool {
        matches!(self, CellContent::Formula(_))
    }

    /// Get the formula text, if this is a formula cell
    pub fn as_formula(&self) -> Option<&str> {
        match self {
            CellContent::Formula(f) => Some(f),
            _ => None,
        }
    }

    /// Numeric value of a literal cell
    ///
    /// Numbers are returned as-is and text is returned if it parses entirely
    /// as a number. Formulas and non-numeric text give `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellContent::Number(n) => Some(*n),
            CellContent::Text(t) => parse_number(t),
            CellContent::Formula(_) => None,
        }
    }

    /// Value of a literal cell used as an arithmetic operand
    ///
    /// Text contributes its leading number, so `"12abc"` is 12 and
    /// `"1,200"` is 1. Text without a leading number is 0, as are formulas,
    /// which the evaluator resolves itself.
    ///
    /// # Examples
    /// ```
    /// use feasgrid_core::CellContent;
    ///
    /// assert_eq!(CellContent::text("12abc").arithmetic_value(), 12.0);
    /// assert_eq!(CellContent::text("Land").arithmetic_value(), 0.0);
    /// ```
    pub fn arithmetic_value(&self) -> f64 {
        match self {
            CellContent::Number(n) => *n,
            CellContent::Text(t) => leading_number(t).unwrap_or(0.0),
            CellContent::Formula(_) => 0.0,
        }
    }
}

/// Parse trimmed text as a finite number.
///
/// Only the whole string counts; `"12abc"` is not numeric.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse the longest numeric prefix of text, after leading whitespace.
///
/// Accepts an optional sign, digits with an optional fraction, and an
/// exponent only when digits follow it.
pub(crate) fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_digits = digits_from(end);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits_from(end + 1);
        end += 1 + frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_digits = digits_from((end + 1 + sign).min(bytes.len()));
        if exp_digits > 0 {
            end += 1 + sign + exp_digits;
        }
    }

    text[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

impl From<f64> for CellContent {
    fn from(n: f64) -> Self {
        CellContent::Number(n)
    }
}

impl From<&str> for CellContent {
    fn from(s: &str) -> Self {
        CellContent::from_input(s)
    }
}

impl From<String> for CellContent {
    fn from(s: String) -> Self {
        CellContent::from_input(&s)
    }
}

impl fmt::Display for CellContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellContent::Number(n) => write!(f, "{}", n),
            CellContent::Text(t) => f.write_str(t),
            CellContent::Formula(formula) => f.write_str(formula),
        }
    }
}
