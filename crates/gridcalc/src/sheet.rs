//! The sheet data model
//!
//! A [`Sheet`] owns every materialized cell and the dependency graph between
//! them. It is the only entry point collaborators use: edits go through
//! [`Sheet::set`] / [`Sheet::delete`], reads through [`Sheet::get`],
//! [`Sheet::values`] and [`Sheet::dependencies`]. Reads never evaluate.

use crate::calculation::RecalcStats;
use gridcalc_core::{CellAddress, CellValue};
use gridcalc_formula::{
    parse_input, DependencyGraph, EvaluationContext, FormulaError, FormulaExpr, FormulaResult,
    ParsedInput,
};
use std::collections::{BTreeMap, BTreeSet};

/// What kind of input a cell holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Empty,
    Literal,
    Formula,
}

impl CellKind {
    /// Lowercase name for display
    pub fn as_str(&self) -> &'static str {
        match self {
            CellKind::Empty => "empty",
            CellKind::Literal => "literal",
            CellKind::Formula => "formula",
        }
    }
}

/// A single cell: raw input, parsed form and last computed value
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub(crate) raw: String,
    pub(crate) kind: CellKind,
    /// `None` when the raw input failed to parse
    pub(crate) parsed: Option<ParsedInput>,
    pub(crate) value: CellValue,
    pub(crate) dirty: bool,
    pub(crate) in_cycle: bool,
}

impl Cell {
    pub(crate) fn empty() -> Self {
        Self {
            raw: String::new(),
            kind: CellKind::Empty,
            parsed: Some(ParsedInput::Empty),
            value: CellValue::ZERO,
            dirty: false,
            in_cycle: false,
        }
    }

    /// The exact string last set on this cell
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    /// The parsed form, or `None` if the raw input did not parse
    pub fn parsed(&self) -> Option<&ParsedInput> {
        self.parsed.as_ref()
    }

    /// The expression tree of a formula cell
    pub fn formula(&self) -> Option<&FormulaExpr> {
        match &self.parsed {
            Some(ParsedInput::Formula(expr)) => Some(expr),
            _ => None,
        }
    }

    /// The value produced by the most recent evaluation
    pub fn value(&self) -> CellValue {
        self.value
    }

    /// Whether the stored value may be stale. Always false between edits.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether this cell itself lies on a dependency cycle
    pub fn in_cycle(&self) -> bool {
        self.in_cycle
    }

    pub fn is_empty(&self) -> bool {
        self.kind == CellKind::Empty
    }
}

/// A spreadsheet: cells keyed by address plus their dependency graph
///
/// # Example
///
/// ```rust
/// use gridcalc::prelude::*;
///
/// let mut sheet = Sheet::new();
/// sheet.set_cell("A1", "10").unwrap();
/// sheet.set_cell("A2", "=A1+5").unwrap();
/// assert_eq!(sheet.value_at("A2").unwrap(), CellValue::Number(15.0));
///
/// sheet.set_cell("A1", "2").unwrap();
/// assert_eq!(sheet.value_at("A2").unwrap(), CellValue::Number(7.0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub(crate) cells: BTreeMap<CellAddress, Cell>,
    pub(crate) graph: DependencyGraph,
}

impl Sheet {
    /// Create an empty sheet
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell's raw input and recompute everything that depends on it
    ///
    /// Input that fails to parse is still stored: the cell holds `#PARSE`,
    /// reads nothing, and its dependents are recomputed against that error
    /// before the parse error is returned.
    pub fn set(&mut self, address: CellAddress, raw: &str) -> FormulaResult<RecalcStats> {
        let (stats, error) = self.apply_edit(address, raw);
        match error {
            Some(err) => Err(err),
            None => Ok(stats),
        }
    }

    /// [`Sheet::set`] with an A1-style address
    pub fn set_cell(&mut self, address: &str, raw: &str) -> FormulaResult<RecalcStats> {
        let address = CellAddress::parse(address)?;
        self.set(address, raw)
    }

    /// Clear a cell's content; equivalent to setting it to `""`
    pub fn delete(&mut self, address: CellAddress) -> RecalcStats {
        self.apply_edit(address, "").0
    }

    /// The cell at `address`, if it is materialized
    pub fn get(&self, address: CellAddress) -> Option<&Cell> {
        self.cells.get(&address)
    }

    /// [`Sheet::get`] with an A1-style address
    pub fn get_cell(&self, address: &str) -> FormulaResult<Option<&Cell>> {
        let address = CellAddress::parse(address)?;
        Ok(self.get(address))
    }

    /// The stored value at `address`; unmaterialized cells read as zero
    pub fn value(&self, address: CellAddress) -> CellValue {
        self.cells
            .get(&address)
            .map_or(CellValue::ZERO, |cell| cell.value)
    }

    /// [`Sheet::value`] with an A1-style address
    pub fn value_at(&self, address: &str) -> FormulaResult<CellValue> {
        let address = CellAddress::parse(address)?;
        Ok(self.value(address))
    }

    /// Every materialized cell's value, in address order
    pub fn values(&self) -> impl Iterator<Item = (CellAddress, CellValue)> + '_ {
        self.cells.iter().map(|(&address, cell)| (address, cell.value))
    }

    /// Every materialized cell, in address order
    pub fn cells(&self) -> impl Iterator<Item = (CellAddress, &Cell)> + '_ {
        self.cells.iter().map(|(&address, cell)| (address, cell))
    }

    /// The cells `address` reads
    pub fn dependencies(&self, address: CellAddress) -> BTreeSet<CellAddress> {
        self.graph.dependencies(address).collect()
    }

    /// The cells that read `address`
    pub fn dependents(&self, address: CellAddress) -> BTreeSet<CellAddress> {
        self.graph.dependents(address).collect()
    }

    /// Whether `address` lies on a dependency cycle
    pub fn in_cycle(&self, address: CellAddress) -> bool {
        self.cells.get(&address).map_or(false, |cell| cell.in_cycle)
    }

    /// Whether `address` is materialized
    pub fn contains(&self, address: CellAddress) -> bool {
        self.cells.contains_key(&address)
    }

    /// Number of materialized cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The dependency graph, for inspection
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    fn apply_edit(&mut self, address: CellAddress, raw: &str) -> (RecalcStats, Option<FormulaError>) {
        let (kind, parsed, error) = match parse_input(raw) {
            Ok(parsed) => (kind_of(&parsed), Some(parsed), None),
            Err(err) => {
                tracing::debug!(cell = %address, error = %err, "cell input failed to parse");
                let kind = if raw.starts_with('=') {
                    CellKind::Formula
                } else {
                    CellKind::Literal
                };
                (kind, None, Some(err))
            }
        };

        let deps = parsed
            .as_ref()
            .map(ParsedInput::references)
            .unwrap_or_default();

        let cell = self.cells.entry(address).or_insert_with(Cell::empty);
        cell.raw = raw.to_string();
        cell.kind = kind;
        cell.parsed = parsed;

        let change = self.graph.set_dependencies(address, deps);
        for precedent in change.added {
            self.cells.entry(precedent).or_insert_with(Cell::empty);
        }

        let stats = self.recalculate(address);

        for precedent in change.removed {
            self.collect_if_unused(precedent);
        }
        self.collect_if_unused(address);

        (stats, error)
    }

    /// Drop an empty cell that nothing reads
    fn collect_if_unused(&mut self, address: CellAddress) {
        let unused = self
            .cells
            .get(&address)
            .map_or(false, |cell| cell.is_empty() && !self.graph.has_dependents(address));
        if unused {
            self.cells.remove(&address);
        }
    }
}

impl EvaluationContext for Sheet {
    fn cell_value(&self, address: CellAddress) -> CellValue {
        self.value(address)
    }
}

fn kind_of(parsed: &ParsedInput) -> CellKind {
    match parsed {
        ParsedInput::Empty => CellKind::Empty,
        ParsedInput::Literal(_) => CellKind::Literal,
        ParsedInput::Formula(_) => CellKind::Formula,
    }
}
