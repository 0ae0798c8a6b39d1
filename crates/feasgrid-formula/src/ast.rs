//! Formula Abstract Syntax Tree types

use feasgrid_core::{CellAddress, CellRange};

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    /// Numeric literal
    Number(f64),

    /// Single cell reference
    CellRef(CellAddress),
    /// Rectangular range reference
    RangeRef(CellRange),

    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },

    /// Function call; `name` is uppercase
    Function { name: String, args: Vec<FormulaExpr> },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
}

impl FormulaExpr {
    /// Every cell this expression reads, ranges expanded in raster order
    ///
    /// Duplicates are kept; callers that need a set should collect into one.
    pub fn references(&self) -> Vec<CellAddress> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references(&self, refs: &mut Vec<CellAddress>) {
        match self {
            FormulaExpr::CellRef(addr) => refs.push(*addr),
            FormulaExpr::RangeRef(range) => refs.extend(range.cells()),
            FormulaExpr::BinaryOp { left, right, .. } => {
                left.collect_references(refs);
                right.collect_references(refs);
            }
            FormulaExpr::UnaryOp { operand, .. } => operand.collect_references(refs),
            FormulaExpr::Function { args, .. } => {
                for arg in args {
                    arg.collect_references(refs);
                }
            }
            FormulaExpr::Number(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_references() {
        // SUM(A1:B2) - -C3
        let expr = FormulaExpr::BinaryOp {
            op: BinaryOperator::Subtract,
            left: Box::new(FormulaExpr::Function {
                name: "SUM".into(),
                args: vec![FormulaExpr::RangeRef(CellRange::parse("A1:B2").unwrap())],
            }),
            right: Box::new(FormulaExpr::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(FormulaExpr::CellRef(CellAddress::parse("C3").unwrap())),
            }),
        };

        let refs: Vec<_> = expr.references().iter().map(|a| a.to_string()).collect();
        assert_eq!(refs, vec!["A1", "B1", "A2", "B2", "C3"]);
        assert!(FormulaExpr::Number(1.0).references().is_empty());
    }
}
