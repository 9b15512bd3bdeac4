//! Formula Abstract Syntax Tree types

use gridcalc_core::CellAddress;
use std::collections::BTreeSet;
use std::fmt;

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    /// Numeric literal (sign included)
    Number(f64),

    /// Single cell reference
    CellRef(CellAddress),

    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
}

impl FormulaExpr {
    /// Build a binary operation node
    pub fn binary(op: BinaryOperator, left: FormulaExpr, right: FormulaExpr) -> Self {
        FormulaExpr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Every address referenced by the expression, duplicates coalesced
    pub fn references(&self) -> BTreeSet<CellAddress> {
        let mut refs = BTreeSet::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references(&self, refs: &mut BTreeSet<CellAddress>) {
        match self {
            FormulaExpr::Number(_) => {}
            FormulaExpr::CellRef(addr) => {
                refs.insert(*addr);
            }
            FormulaExpr::BinaryOp { left, right, .. } => {
                left.collect_references(refs);
                right.collect_references(refs);
            }
        }
    }
}

/// Renders the expression in normalized form, without the leading `=`.
///
/// Trees built by the parser re-parse to themselves: operators are
/// left-associative, so a right operand always binds tighter than its parent.
impl fmt::Display for FormulaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaExpr::Number(n) => write!(f, "{}", n),
            FormulaExpr::CellRef(addr) => write!(f, "{}", addr),
            FormulaExpr::BinaryOp { op, left, right } => {
                write!(f, "{} {} {}", left, op, right)
            }
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOperator {
    /// The operator as written in a formula
    pub fn symbol(&self) -> char {
        match self {
            BinaryOperator::Add => '+',
            BinaryOperator::Subtract => '-',
            BinaryOperator::Multiply => '*',
            BinaryOperator::Divide => '/',
        }
    }

    /// Binding strength; higher binds tighter
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Add | BinaryOperator::Subtract => 1,
            BinaryOperator::Multiply | BinaryOperator::Divide => 2,
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(col: u32, row: u32) -> FormulaExpr {
        FormulaExpr::CellRef(CellAddress::new(col, row).unwrap())
    }

    #[test]
    fn test_references_are_coalesced() {
        // A1 + B2 * A1
        let expr = FormulaExpr::binary(
            BinaryOperator::Add,
            cell(1, 1),
            FormulaExpr::binary(BinaryOperator::Multiply, cell(2, 2), cell(1, 1)),
        );

        let refs: Vec<_> = expr.references().into_iter().collect();
        assert_eq!(
            refs,
            vec![
                CellAddress::new(1, 1).unwrap(),
                CellAddress::new(2, 2).unwrap()
            ]
        );
    }

    #[test]
    fn test_display() {
        let expr = FormulaExpr::binary(
            BinaryOperator::Subtract,
            FormulaExpr::binary(BinaryOperator::Add, FormulaExpr::Number(2.5), cell(3, 4)),
            FormulaExpr::binary(BinaryOperator::Divide, FormulaExpr::Number(-1.0), cell(27, 1)),
        );
        assert_eq!(expr.to_string(), "2.5 + C4 - -1 / AA1");
    }

    #[test]
    fn test_precedence() {
        assert!(BinaryOperator::Multiply.precedence() > BinaryOperator::Add.precedence());
        assert_eq!(
            BinaryOperator::Divide.precedence(),
            BinaryOperator::Multiply.precedence()
        );
    }
}
