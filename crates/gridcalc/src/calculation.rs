//! Incremental recalculation
//!
//! After an edit, only the edited cell and its transitive dependents are
//! recomputed. Cells on a cycle are tagged `#CYCLE` first; the rest run in
//! the order produced by [`DependencyGraph::recalc_plan`], so every cell
//! reads already-final values.
//!
//! [`DependencyGraph::recalc_plan`]: gridcalc_formula::DependencyGraph::recalc_plan

use crate::sheet::Sheet;
use gridcalc_core::{CellAddress, CellError, CellValue};
use gridcalc_formula::{evaluate, ParsedInput};

/// Statistics from a recalculation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecalcStats {
    /// Number of cells recomputed (the edited cell included)
    pub cells_calculated: usize,
    /// Number of recomputed cells lying on a cycle
    pub circular_references: usize,
    /// Number of recomputed cells left holding an error tag
    pub errors: usize,
}

impl Sheet {
    /// Recompute `changed` and its transitive dependents
    pub(crate) fn recalculate(&mut self, changed: CellAddress) -> RecalcStats {
        let plan = self.graph.recalc_plan(changed);

        for address in &plan.closure {
            if let Some(cell) = self.cells.get_mut(address) {
                cell.dirty = true;
            }
        }

        for address in &plan.cycles {
            if let Some(cell) = self.cells.get_mut(address) {
                cell.value = CellValue::Error(CellError::Cycle);
                cell.in_cycle = true;
                cell.dirty = false;
            }
        }

        for &address in &plan.order {
            let value = self.compute(address);
            tracing::trace!(cell = %address, value = %value, "evaluated");
            if let Some(cell) = self.cells.get_mut(&address) {
                cell.value = value;
                cell.in_cycle = false;
                cell.dirty = false;
            }
        }

        debug_assert!(
            plan.closure
                .iter()
                .all(|a| self.cells.get(a).map_or(true, |cell| !cell.dirty)),
            "recalculation left dirty cells"
        );

        let errors = plan
            .closure
            .iter()
            .filter(|&&a| self.value(a).is_error())
            .count();

        if !plan.cycles.is_empty() {
            tracing::debug!(
                cell = %changed,
                cycle_cells = plan.cycles.len(),
                "dependency cycle detected"
            );
        }
        tracing::debug!(
            cell = %changed,
            closure = plan.closure.len(),
            errors,
            "recalculated"
        );

        RecalcStats {
            cells_calculated: plan.closure.len(),
            circular_references: plan.cycles.len(),
            errors,
        }
    }

    /// Evaluate one cell from its parsed form and the current stored values
    fn compute(&self, address: CellAddress) -> CellValue {
        let Some(cell) = self.cells.get(&address) else {
            return CellValue::ZERO;
        };

        match &cell.parsed {
            None => CellValue::Error(CellError::Parse),
            Some(ParsedInput::Empty) => CellValue::ZERO,
            Some(ParsedInput::Literal(n)) => CellValue::Number(*n),
            Some(ParsedInput::Formula(expr)) => evaluate(expr, self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stats_describe_the_closure() {
        let mut sheet = Sheet::new();
        sheet.set_cell("A1", "1").unwrap();
        sheet.set_cell("A2", "=A1/0").unwrap();
        sheet.set_cell("A3", "=A2").unwrap();
        sheet.set_cell("B1", "=A1").unwrap();

        let stats = sheet.set_cell("A1", "3").unwrap();
        assert_eq!(
            stats,
            RecalcStats {
                cells_calculated: 4,
                circular_references: 0,
                errors: 2,
            }
        );
    }

    #[test]
    fn test_stats_count_cycles() {
        let mut sheet = Sheet::new();
        sheet.set_cell("A1", "=B1").unwrap();
        let stats = sheet.set_cell("B1", "=A1+C1").unwrap();
        assert_eq!(stats.circular_references, 2);
        assert_eq!(stats.errors, 2);
        assert_eq!(stats.cells_calculated, 2);
    }

    #[test]
    fn test_unrelated_cells_are_not_recomputed() {
        let mut sheet = Sheet::new();
        sheet.set_cell("A1", "1").unwrap();
        sheet.set_cell("B1", "=A1").unwrap();
        sheet.set_cell("C1", "5").unwrap();

        let stats = sheet.set_cell("C1", "6").unwrap();
        assert_eq!(stats.cells_calculated, 1);
    }
}
