//! Formula evaluator
//!
//! Evaluates formula ASTs bottom-up against already-computed cell values.

use crate::ast::{BinaryOperator, FormulaExpr};
use gridcalc_core::{CellAddress, CellError, CellValue};
use std::collections::{BTreeMap, HashMap};

/// Read access to stored cell values during evaluation
///
/// Addresses that hold nothing read as numeric zero.
pub trait EvaluationContext {
    /// The currently stored value at `address`
    fn cell_value(&self, address: CellAddress) -> CellValue;
}

impl EvaluationContext for BTreeMap<CellAddress, CellValue> {
    fn cell_value(&self, address: CellAddress) -> CellValue {
        self.get(&address).copied().unwrap_or(CellValue::ZERO)
    }
}

impl EvaluationContext for HashMap<CellAddress, CellValue> {
    fn cell_value(&self, address: CellAddress) -> CellValue {
        self.get(&address).copied().unwrap_or(CellValue::ZERO)
    }
}

/// Evaluate a formula expression
///
/// The first error met in left-to-right order becomes the result; nothing to
/// its right is evaluated.
///
/// # Example
/// ```rust
/// use std::collections::BTreeMap;
/// use gridcalc_core::{CellAddress, CellValue};
/// use gridcalc_formula::{evaluate, parse_formula};
///
/// let ast = parse_formula("=2+3*4").unwrap();
/// let values: BTreeMap<CellAddress, CellValue> = BTreeMap::new();
/// assert_eq!(evaluate(&ast, &values), CellValue::Number(14.0));
/// ```
pub fn evaluate(expr: &FormulaExpr, ctx: &impl EvaluationContext) -> CellValue {
    evaluate_expr(expr, ctx).into()
}

fn evaluate_expr(expr: &FormulaExpr, ctx: &impl EvaluationContext) -> Result<f64, CellError> {
    match expr {
        FormulaExpr::Number(n) => Ok(*n),

        FormulaExpr::CellRef(address) => match ctx.cell_value(*address) {
            CellValue::Number(n) => Ok(n),
            CellValue::Error(e) => Err(e),
        },

        FormulaExpr::BinaryOp { op, left, right } => {
            let left = evaluate_expr(left, ctx)?;
            let right = evaluate_expr(right, ctx)?;
            apply_binary_op(*op, left, right)
        }
    }
}

/// Apply an arithmetic operator with IEEE-754 semantics
///
/// Division by exactly zero is the only operation that produces an error:
/// `0 / 0` is [`CellError::NaN`], anything else over zero is
/// [`CellError::DivByZero`]. Overflow and non-finite operands pass through.
pub fn apply_binary_op(op: BinaryOperator, left: f64, right: f64) -> Result<f64, CellError> {
    match op {
        BinaryOperator::Add => Ok(left + right),
        BinaryOperator::Subtract => Ok(left - right),
        BinaryOperator::Multiply => Ok(left * right),
        BinaryOperator::Divide => {
            if right == 0.0 {
                if left == 0.0 {
                    Err(CellError::NaN)
                } else {
                    Err(CellError::DivByZero)
                }
            } else {
                Ok(left / right)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_formula;

    fn a(a1: &str) -> CellAddress {
        CellAddress::parse(a1).unwrap()
    }

    fn eval(formula: &str, values: &BTreeMap<CellAddress, CellValue>) -> CellValue {
        evaluate(&parse_formula(formula).unwrap(), values)
    }

    #[test]
    fn test_evaluate_arithmetic() {
        let values = BTreeMap::new();
        assert_eq!(eval("=2+3*4", &values), CellValue::Number(14.0));
        assert_eq!(eval("=10-4-3", &values), CellValue::Number(3.0));
        assert_eq!(eval("=8/4/2", &values), CellValue::Number(1.0));
        assert_eq!(eval("=1.5*-2", &values), CellValue::Number(-3.0));
    }

    #[test]
    fn test_evaluate_with_cell_references() {
        let mut values = BTreeMap::new();
        values.insert(a("A1"), CellValue::Number(10.0));
        values.insert(a("B1"), CellValue::Number(5.0));

        assert_eq!(eval("=A1+B1", &values), CellValue::Number(15.0));
        assert_eq!(eval("=A1/B1*2", &values), CellValue::Number(4.0));
        // Missing cells read as zero
        assert_eq!(eval("=A1+Z99", &values), CellValue::Number(10.0));
    }

    #[test]
    fn test_division_by_zero() {
        let values = BTreeMap::new();
        assert_eq!(eval("=10/0", &values), CellValue::Error(CellError::DivByZero));
        assert_eq!(eval("=-1/0", &values), CellValue::Error(CellError::DivByZero));
        assert_eq!(eval("=0/0", &values), CellValue::Error(CellError::NaN));
        assert_eq!(eval("=0/-0", &values), CellValue::Error(CellError::NaN));
        // Empty cell divisor
        assert_eq!(eval("=1/A1", &values), CellValue::Error(CellError::DivByZero));
    }

    #[test]
    fn test_error_propagation() {
        let mut values = BTreeMap::new();
        values.insert(a("A1"), CellValue::Error(CellError::Parse));
        values.insert(a("B1"), CellValue::Error(CellError::Cycle));

        assert_eq!(eval("=A1+1", &values), CellValue::Error(CellError::Parse));
        // Leftmost error wins
        assert_eq!(eval("=A1+B1", &values), CellValue::Error(CellError::Parse));
        assert_eq!(eval("=B1+A1", &values), CellValue::Error(CellError::Cycle));
        // Errors from operations count in evaluation order too
        assert_eq!(eval("=1/0+A1", &values), CellValue::Error(CellError::DivByZero));
        assert_eq!(eval("=A1+1/0", &values), CellValue::Error(CellError::Parse));
    }

    #[test]
    fn test_non_finite_values_pass_through() {
        let mut values = BTreeMap::new();
        values.insert(a("A1"), CellValue::Number(1e308));

        let inf = eval("=A1*10", &values);
        assert_eq!(inf, CellValue::Number(f64::INFINITY));

        values.insert(a("B1"), inf);
        let nan = eval("=B1-B1", &values).as_number().unwrap();
        assert!(nan.is_nan());

        // Underflow is kept as-is
        values.insert(a("C1"), CellValue::Number(1e-300));
        assert_eq!(eval("=C1*C1", &values), CellValue::Number(0.0));
    }
}
