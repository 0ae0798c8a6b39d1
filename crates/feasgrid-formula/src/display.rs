//! Rendering values the way the grid shows them

/// Token shown in place of any error result
pub const ERROR_DISPLAY: &str = "ERROR";

/// Format a number en-US style
///
/// Thousands are grouped with `,` and at most two fraction digits are kept,
/// without trailing zeros. NaN and infinities render as [`ERROR_DISPLAY`].
///
/// ```rust
/// use feasgrid_formula::format_number;
///
/// assert_eq!(format_number(1234.5), "1,234.5");
/// assert_eq!(format_number(-1234567.891), "-1,234,567.89");
/// assert_eq!(format_number(42.0), "42");
/// ```
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return ERROR_DISPLAY.to_string();
    }

    let rounded = format!("{:.2}", value.abs());
    let (int_part, frac_part) = rounded
        .split_once('.')
        .unwrap_or((rounded.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    // -0.001 rounds to zero and is shown without a sign
    let negative = value < 0.0 && (int_part != "0" || !frac_part.is_empty());

    let mut out = String::with_capacity(rounded.len() + rounded.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// Check whether raw cell input is a formula
pub fn is_formula(text: &str) -> bool {
    text.starts_with('=')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(7.0), "7");
        assert_eq!(format_number(999.0), "999");
        assert_eq!(format_number(1000.0), "1,000");
        assert_eq!(format_number(1234.5), "1,234.5");
        assert_eq!(format_number(1234.567), "1,234.57");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(1_250_000.0), "1,250,000");
        assert_eq!(format_number(-42.126), "-42.13");
    }

    #[test]
    fn test_format_tiny_negative() {
        assert_eq!(format_number(-0.001), "0");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(-0.01), "-0.01");
    }

    #[test]
    fn test_format_non_finite() {
        assert_eq!(format_number(f64::NAN), "ERROR");
        assert_eq!(format_number(f64::INFINITY), "ERROR");
        assert_eq!(format_number(f64::NEG_INFINITY), "ERROR");
    }

    #[test]
    fn test_is_formula() {
        assert!(is_formula("=SUM(A1:A3)"));
        assert!(is_formula("="));
        assert!(!is_formula(" =A1"));
        assert!(!is_formula("42"));
        assert!(!is_formula(""));
    }
}
