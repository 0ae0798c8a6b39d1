//! Formula evaluator
//!
//! Evaluates formula ASTs against a borrowed [`Grid`], following references
//! into other formula cells.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::display::{format_number, ERROR_DISPLAY};
use crate::error::{ErrorKind, FormulaError, FormulaResult};
use crate::functions::FunctionRegistry;
use crate::parser::parse_formula_with;
use ahash::AHashMap;
use feasgrid_core::{CellAddress, CellContent, CellRange, Grid};
use tracing::{debug, trace};

/// Longest chain of formula cells one evaluation may follow
pub const MAX_REFERENCE_DEPTH: usize = 256;

/// Result of evaluating a formula or reading a cell for display
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    /// A non-formula text cell, passed through for display
    Text(String),
    Error(ErrorKind),
}

impl FormulaValue {
    /// Convert to number, if this is one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self, FormulaValue::Error(_))
    }

    /// Get the error kind if this is one
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            FormulaValue::Error(kind) => Some(*kind),
            _ => None,
        }
    }

    /// The string a grid shows for this value
    ///
    /// ```rust
    /// use feasgrid_formula::{ErrorKind, FormulaValue};
    ///
    /// assert_eq!(FormulaValue::Number(1234.5).display(), "1,234.5");
    /// assert_eq!(FormulaValue::Error(ErrorKind::DivisionByZero).display(), "ERROR");
    /// ```
    pub fn display(&self) -> String {
        match self {
            FormulaValue::Number(n) => format_number(*n),
            FormulaValue::Text(s) => s.clone(),
            FormulaValue::Error(_) => ERROR_DISPLAY.to_string(),
        }
    }
}

impl From<FormulaResult<f64>> for FormulaValue {
    fn from(result: FormulaResult<f64>) -> Self {
        match result {
            Ok(n) => FormulaValue::Number(n),
            Err(e) => FormulaValue::Error(e.kind()),
        }
    }
}

/// Context for one formula evaluation
///
/// Tracks the formula cells currently being evaluated (the cycle guard) and
/// the results of cells already resolved during this evaluation. A context
/// is meant to be used for a single top-level evaluation and dropped.
pub struct EvaluationContext<'a> {
    grid: &'a Grid,
    registry: &'a FunctionRegistry,
    max_depth: usize,
    in_progress: Vec<CellAddress>,
    resolved: AHashMap<CellAddress, FormulaResult<f64>>,
}

impl<'a> EvaluationContext<'a> {
    /// Create a context using the built-in functions
    pub fn new(grid: &'a Grid) -> Self {
        Self {
            grid,
            registry: FunctionRegistry::global(),
            max_depth: MAX_REFERENCE_DEPTH,
            in_progress: Vec::new(),
            resolved: AHashMap::new(),
        }
    }

    /// Resolve function names against a custom registry
    pub fn with_registry(mut self, registry: &'a FunctionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Override the reference chain limit
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The grid being evaluated against
    pub fn grid(&self) -> &'a Grid {
        self.grid
    }

    /// Numeric value of a cell in arithmetic position
    ///
    /// Empty cells are 0, text is its leading number or 0, formulas are
    /// evaluated.
    pub fn cell_number(&mut self, addr: CellAddress) -> FormulaResult<f64> {
        trace!(cell = %addr, "dereferencing cell");
        let grid = self.grid;
        match grid.get(addr) {
            None => Ok(0.0),
            Some(CellContent::Formula(formula)) => self.formula_cell(addr, formula),
            Some(content) => Ok(content.arithmetic_value()),
        }
    }

    /// Values a range contributes to a function call, in raster order
    ///
    /// Empty and non-numeric text cells are skipped.
    pub fn range_numbers(&mut self, range: &CellRange) -> FormulaResult<Vec<f64>> {
        let grid = self.grid;
        let mut values = Vec::new();

        // A range larger than the grid is walked through the stored cells
        if range.cell_count() > grid.len() as u64 {
            let mut cells: Vec<_> = grid
                .iter()
                .map(|(addr, _)| addr)
                .filter(|addr| range.contains(addr))
                .collect();
            cells.sort_unstable();
            for addr in cells {
                self.push_range_value(addr, &mut values)?;
            }
        } else {
            for addr in range.cells() {
                self.push_range_value(addr, &mut values)?;
            }
        }

        Ok(values)
    }

    fn push_range_value(&mut self, addr: CellAddress, values: &mut Vec<f64>) -> FormulaResult<()> {
        let grid = self.grid;
        match grid.get(addr) {
            None => {}
            Some(CellContent::Formula(formula)) => values.push(self.formula_cell(addr, formula)?),
            Some(content) => values.extend(content.as_number()),
        }
        Ok(())
    }

    fn formula_cell(&mut self, addr: CellAddress, formula: &str) -> FormulaResult<f64> {
        if let Some(result) = self.resolved.get(&addr) {
            return result.clone();
        }

        if self.in_progress.contains(&addr) {
            debug!(cell = %addr, depth = self.in_progress.len(), "circular reference");
            return Err(FormulaError::CircularReference(addr));
        }
        if self.in_progress.len() >= self.max_depth {
            debug!(cell = %addr, limit = self.max_depth, "reference chain too deep");
            return Err(FormulaError::DepthLimit(self.max_depth));
        }

        self.in_progress.push(addr);
        let result =
            parse_formula_with(formula, self.registry).and_then(|expr| evaluate(&expr, self));
        self.in_progress.pop();

        // A depth failure depends on where the cell sat in the chain
        if !matches!(result, Err(FormulaError::DepthLimit(_))) {
            self.resolved.insert(addr, result.clone());
        }
        result
    }
}

/// Evaluate an expression to a number
pub fn evaluate(expr: &FormulaExpr, ctx: &mut EvaluationContext<'_>) -> FormulaResult<f64> {
    match expr {
        FormulaExpr::Number(n) => Ok(*n),

        FormulaExpr::CellRef(addr) => ctx.cell_number(*addr),

        FormulaExpr::RangeRef(range) => {
            if range.cell_count() == 1 {
                ctx.cell_number(range.start())
            } else {
                Err(FormulaError::InvalidRange(format!(
                    "{} used where a single value is expected",
                    range
                )))
            }
        }

        FormulaExpr::BinaryOp { op, left, right } => {
            let l = evaluate(left, ctx)?;
            let r = evaluate(right, ctx)?;
            evaluate_binary_op(*op, l, r)
        }

        FormulaExpr::UnaryOp { op, operand } => {
            let v = evaluate(operand, ctx)?;
            match op {
                UnaryOperator::Negate => Ok(-v),
            }
        }

        FormulaExpr::Function { name, args } => evaluate_function(name, args, ctx),
    }
}

fn evaluate_binary_op(op: BinaryOperator, l: f64, r: f64) -> FormulaResult<f64> {
    match op {
        BinaryOperator::Add => Ok(l + r),
        BinaryOperator::Subtract => Ok(l - r),
        BinaryOperator::Multiply => Ok(l * r),
        BinaryOperator::Divide => {
            if r == 0.0 {
                Err(FormulaError::DivisionByZero)
            } else {
                Ok(l / r)
            }
        }
    }
}

fn evaluate_function(
    name: &str,
    args: &[FormulaExpr],
    ctx: &mut EvaluationContext<'_>,
) -> FormulaResult<f64> {
    let registry = ctx.registry;
    let func = registry
        .get(name)
        .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            FormulaExpr::RangeRef(range) => values.extend(ctx.range_numbers(range)?),
            _ => values.push(evaluate(arg, ctx)?),
        }
    }

    (func.implementation)(&values)
}

/// Parse and evaluate a formula against a grid
///
/// Every failure is folded into [`FormulaValue::Error`].
///
/// ```rust
/// use feasgrid_core::Grid;
/// use feasgrid_formula::{evaluate_formula, ErrorKind, FormulaValue};
///
/// let mut grid = Grid::new();
/// grid.set_a1("A1", 10.0).unwrap();
///
/// assert_eq!(evaluate_formula("=A1*2", &grid), FormulaValue::Number(20.0));
/// assert_eq!(
///     evaluate_formula("=A1/0", &grid),
///     FormulaValue::Error(ErrorKind::DivisionByZero)
/// );
/// ```
pub fn evaluate_formula(formula: &str, grid: &Grid) -> FormulaValue {
    let result = parse_formula_with(formula, FunctionRegistry::global())
        .and_then(|expr| evaluate(&expr, &mut EvaluationContext::new(grid)));
    if let Err(e) = &result {
        debug!(formula, error = %e, "formula evaluation failed");
    }
    result.into()
}

/// Numeric value of the cell at an A1 address
///
/// Follows the same rules as a reference inside a formula: empty cells are
/// 0, text is its leading number or 0, formula cells are evaluated.
pub fn get_cell_value(address: &str, grid: &Grid) -> FormulaResult<f64> {
    let addr = CellAddress::parse(address)?;
    EvaluationContext::new(grid).cell_number(addr)
}

/// The value a grid shows for a cell
///
/// Empty cells are empty text and text cells are passed through unchanged.
pub fn cell_display_value(addr: CellAddress, grid: &Grid) -> FormulaValue {
    match grid.get(addr) {
        None => FormulaValue::Text(String::new()),
        Some(CellContent::Number(n)) => FormulaValue::Number(*n),
        Some(CellContent::Text(t)) => FormulaValue::Text(t.clone()),
        Some(CellContent::Formula(_)) => EvaluationContext::new(grid).cell_number(addr).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::FunctionDef;
    use pretty_assertions::assert_eq;

    fn grid(cells: &[(&str, &str)]) -> Grid {
        let mut grid = Grid::new();
        for (addr, input) in cells {
            grid.set_a1(addr, *input).unwrap();
        }
        grid
    }

    fn eval(formula: &str, grid: &Grid) -> FormulaValue {
        evaluate_formula(formula, grid)
    }

    fn error(kind: ErrorKind) -> FormulaValue {
        FormulaValue::Error(kind)
    }

    #[test]
    fn test_arithmetic() {
        let g = Grid::new();
        assert_eq!(eval("=1+2*3", &g), FormulaValue::Number(7.0));
        assert_eq!(eval("=(1+2)*3", &g), FormulaValue::Number(9.0));
        assert_eq!(eval("=10-4-3", &g), FormulaValue::Number(3.0));
        assert_eq!(eval("=-2*-3", &g), FormulaValue::Number(6.0));
        assert_eq!(eval("=7/2", &g), FormulaValue::Number(3.5));
        assert_eq!(eval("42", &g), FormulaValue::Number(42.0));
    }

    #[test]
    fn test_division_by_zero() {
        let g = grid(&[("B1", "0")]);
        assert_eq!(eval("=1/0", &g), error(ErrorKind::DivisionByZero));
        assert_eq!(eval("=5/B1", &g), error(ErrorKind::DivisionByZero));
        assert_eq!(eval("=5/C9", &g), error(ErrorKind::DivisionByZero));
        assert_eq!(eval("=0/5", &g), FormulaValue::Number(0.0));
    }

    #[test]
    fn test_cell_references() {
        let g = grid(&[("A1", "10"), ("A2", "=A1*2"), ("A3", "=A2+A1")]);
        assert_eq!(eval("=A3", &g), FormulaValue::Number(30.0));
        assert_eq!(eval("=a3 + 1", &g), FormulaValue::Number(31.0));
    }

    #[test]
    fn test_empty_and_text_cells_are_zero() {
        let g = grid(&[("A1", "Land cost"), ("A2", "12abc"), ("A3", " 7 "), ("A4", "1,200")]);
        assert_eq!(eval("=Z99+1", &g), FormulaValue::Number(1.0));
        assert_eq!(eval("=A1+5", &g), FormulaValue::Number(5.0));
        // Text with a leading number contributes that number
        assert_eq!(eval("=A2*3", &g), FormulaValue::Number(36.0));
        assert_eq!(eval("=A4", &g), FormulaValue::Number(1.0));
        // Ranges only take text that is a number as a whole
        assert_eq!(eval("=SUM(A2:A4)", &g), FormulaValue::Number(7.0));

        let mut g = g;
        g.set_a1("A3", CellContent::text(" 7 ")).unwrap();
        assert_eq!(eval("=A3*2", &g), FormulaValue::Number(14.0));
    }

    #[test]
    fn test_sum_over_range_with_formula() {
        let g = grid(&[("A1", "1"), ("A2", "2"), ("A3", "=A1+A2")]);
        assert_eq!(eval("=SUM(A1:A3)", &g), FormulaValue::Number(6.0));
    }

    #[test]
    fn test_aggregates() {
        let g = grid(&[("A1", "4"), ("A2", "-2"), ("A3", "10"), ("B1", "3")]);
        assert_eq!(eval("=SUM(A1:A3, B1, 1)", &g), FormulaValue::Number(16.0));
        assert_eq!(eval("=AVERAGE(A1:A3)", &g), FormulaValue::Number(4.0));
        assert_eq!(eval("=MIN(A1:A3)", &g), FormulaValue::Number(-2.0));
        assert_eq!(eval("=MAX(A1:A3, 20)", &g), FormulaValue::Number(20.0));
        assert_eq!(eval("=max(A1:B1)", &g), FormulaValue::Number(4.0));
    }

    #[test]
    fn test_range_skips_empty_and_text() {
        let g = grid(&[("A1", "4"), ("A2", "Fees"), ("A4", "8")]);
        // A2 is text and A3 is empty, neither counts
        assert_eq!(eval("=AVERAGE(A1:A4)", &g), FormulaValue::Number(6.0));
        // A scalar reference to an empty cell still contributes 0
        assert_eq!(eval("=AVERAGE(A1, A3)", &g), FormulaValue::Number(2.0));
    }

    #[test]
    fn test_empty_aggregates() {
        let g = grid(&[("A1", "note")]);
        assert_eq!(eval("=AVERAGE()", &g), FormulaValue::Number(0.0));
        assert_eq!(eval("=SUM()", &g), FormulaValue::Number(0.0));
        assert_eq!(eval("=SUM(B1:B10)", &g), FormulaValue::Number(0.0));
        assert_eq!(eval("=AVERAGE(A1:A5)", &g), FormulaValue::Number(0.0));
        assert_eq!(eval("=MIN(B1:B10)", &g), error(ErrorKind::EmptyRange));
        assert_eq!(eval("=MAX()", &g), error(ErrorKind::EmptyRange));
    }

    #[test]
    fn test_huge_range() {
        let g = grid(&[("B2", "5"), ("C1000", "=B2*2"), ("XFD1048576", "1")]);
        assert_eq!(eval("=SUM(A1:XFD1048576)", &g), FormulaValue::Number(16.0));
        assert_eq!(eval("=MIN(A1:XFD1048576)", &g), FormulaValue::Number(1.0));
    }

    #[test]
    fn test_range_in_arithmetic() {
        let g = grid(&[("A1", "3")]);
        assert_eq!(eval("=A1:A1*2", &g), FormulaValue::Number(6.0));
        assert_eq!(eval("=A1:A2+1", &g), error(ErrorKind::InvalidRange));
    }

    #[test]
    fn test_circular_reference() {
        let g = grid(&[("A1", "=B1"), ("B1", "=A1")]);
        assert_eq!(eval("=A1", &g), error(ErrorKind::CircularReference));
        assert_eq!(
            cell_display_value(CellAddress::parse("B1").unwrap(), &g),
            error(ErrorKind::CircularReference)
        );
        assert!(matches!(
            get_cell_value("A1", &g),
            Err(FormulaError::CircularReference(_))
        ));
    }

    #[test]
    fn test_self_reference() {
        let g = grid(&[("A1", "=A1+1"), ("A2", "=SUM(A1:A3)")]);
        assert_eq!(eval("=A1", &g), error(ErrorKind::CircularReference));
        // A2 includes itself through its own range
        assert_eq!(eval("=A2", &g), error(ErrorKind::CircularReference));
    }

    #[test]
    fn test_cycle_does_not_poison_unrelated_cells() {
        let g = grid(&[("A1", "=B1"), ("B1", "=A1"), ("C1", "5"), ("D1", "=C1*2")]);
        assert_eq!(eval("=D1", &g), FormulaValue::Number(10.0));
        assert_eq!(eval("=A1+D1", &g), error(ErrorKind::CircularReference));
    }

    #[test]
    fn test_diamond_references() {
        // D1 reaches A1 through both B1 and C1
        let g = grid(&[
            ("A1", "2"),
            ("B1", "=A1*3"),
            ("C1", "=A1+4"),
            ("D1", "=B1+C1"),
        ]);
        assert_eq!(eval("=D1", &g), FormulaValue::Number(12.0));
        assert_eq!(eval("=SUM(B1:D1)", &g), FormulaValue::Number(24.0));
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let g = grid(&[("A1", "1.5"), ("A2", "=A1*4"), ("A3", "=SUM(A1:A2)/0")]);
        for formula in ["=A2", "=A3", "=AVERAGE(A1:A2)"] {
            assert_eq!(eval(formula, &g), eval(formula, &g));
        }
    }

    fn chain(len: u32) -> Grid {
        let mut g = Grid::new();
        for row in 0..len - 1 {
            g.set(
                CellAddress::new(row, 0),
                CellContent::formula(format!("=A{}+1", row + 2)),
            );
        }
        g.set(CellAddress::new(len - 1, 0), CellContent::formula("=1"));
        g
    }

    #[test]
    fn test_long_chain_evaluates() {
        let g = chain(200);
        assert_eq!(eval("=A1", &g), FormulaValue::Number(200.0));
    }

    #[test]
    fn test_chain_over_depth_limit() {
        let g = chain(300);
        assert_eq!(eval("=A1", &g), error(ErrorKind::DepthLimit));

        let g = chain(20);
        let mut ctx = EvaluationContext::new(&g).with_max_depth(10);
        assert_eq!(
            ctx.cell_number(CellAddress::new(0, 0)),
            Err(FormulaError::DepthLimit(10))
        );
        // The deeper half of the chain is still reachable directly
        let mut ctx = EvaluationContext::new(&g).with_max_depth(10);
        assert_eq!(ctx.cell_number(CellAddress::new(15, 0)), Ok(5.0));
    }

    #[test]
    fn test_error_propagates_through_references() {
        let g = grid(&[("A1", "=1/0"), ("A2", "=A1+1"), ("A3", "=SUM(A1:A2)"), ("B1", "=FOO(1)")]);
        assert_eq!(eval("=A2", &g), error(ErrorKind::DivisionByZero));
        assert_eq!(eval("=A3", &g), error(ErrorKind::DivisionByZero));
        assert_eq!(eval("=B1*2", &g), error(ErrorKind::ParseError));
    }

    #[test]
    fn test_long_operator_chain_is_an_error() {
        let g = grid(&[("A1", "2")]);
        let sum = format!("={}1", "1+".repeat(20_000));
        assert_eq!(eval(&sum, &g), error(ErrorKind::ParseError));

        let mut g = g;
        g.set_a1("B1", CellContent::formula(format!("={}A1", "A1*".repeat(20_000))))
            .unwrap();
        assert_eq!(eval("=B1+1", &g), error(ErrorKind::ParseError));
        assert_eq!(eval("=A1*3", &g), FormulaValue::Number(6.0));
    }

    #[test]
    fn test_parse_errors() {
        let g = Grid::new();
        assert_eq!(eval("=SUM(1,,2)", &g), error(ErrorKind::ParseError));
        assert_eq!(eval("=1+", &g), error(ErrorKind::ParseError));
        assert_eq!(eval("=A0", &g), error(ErrorKind::InvalidAddress));
    }

    #[test]
    fn test_get_cell_value() {
        let g = grid(&[("A1", "10"), ("A2", "=A1/4"), ("A3", "Total")]);
        assert_eq!(get_cell_value("A2", &g), Ok(2.5));
        assert_eq!(get_cell_value("a3", &g), Ok(0.0));
        assert_eq!(get_cell_value("Q7", &g), Ok(0.0));
        assert!(matches!(
            get_cell_value("7Q", &g),
            Err(FormulaError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_cell_display_value() {
        let g = grid(&[("A1", "1234.567"), ("A2", "Revenue"), ("A3", "=A1*2")]);
        let display = |a1: &str| cell_display_value(CellAddress::parse(a1).unwrap(), &g).display();
        assert_eq!(display("A1"), "1,234.57");
        assert_eq!(display("A2"), "Revenue");
        assert_eq!(display("A3"), "2,469.13");
        assert_eq!(display("A4"), "");
    }

    #[test]
    fn test_custom_registry() {
        fn fn_count(values: &[f64]) -> FormulaResult<f64> {
            Ok(values.len() as f64)
        }

        let mut registry = FunctionRegistry::new();
        registry.register(FunctionDef {
            name: "COUNT",
            min_args: 1,
            max_args: None,
            implementation: fn_count,
        });

        let g = grid(&[("A1", "1"), ("A2", "x"), ("A3", "3"), ("B1", "=COUNT(A1:A3)")]);
        let expr = parse_formula_with("=COUNT(A1:A3) + B1", &registry).unwrap();
        let mut ctx = EvaluationContext::new(&g).with_registry(&registry);
        assert_eq!(evaluate(&expr, &mut ctx), Ok(4.0));
    }
}
