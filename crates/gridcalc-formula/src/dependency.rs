//! Dependency tracking for formula calculation
//!
//! The graph keeps two address-keyed indices that mirror each other: for
//! every edge, `precedent ∈ dependencies(dependent)` and
//! `dependent ∈ dependents(precedent)`. Cells are identified by address only,
//! so cycles in the data never become ownership cycles in memory.

use gridcalc_core::CellAddress;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Outcome of replacing a cell's dependency set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyChange {
    /// Precedents that gained the cell as a dependent
    pub added: Vec<CellAddress>,
    /// Precedents that lost the cell as a dependent
    pub removed: Vec<CellAddress>,
}

/// What to recompute after an edit, and in which order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecalcPlan {
    /// The edited cell and everything reachable along `dependents` edges
    pub closure: BTreeSet<CellAddress>,
    /// Members of the closure that lie on a directed cycle
    pub cycles: BTreeSet<CellAddress>,
    /// The remaining members in evaluation order
    pub order: Vec<CellAddress>,
}

/// Dependency graph for formula cells
///
/// Tracks which cells depend on which other cells,
/// enabling incremental recalculation.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// Cell → Cells that depend on it (dependents)
    dependents: BTreeMap<CellAddress, BTreeSet<CellAddress>>,
    /// Cell → Cells it depends on (precedents)
    precedents: BTreeMap<CellAddress, BTreeSet<CellAddress>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set of cells that `cell` reads
    pub fn set_dependencies(
        &mut self,
        cell: CellAddress,
        new_deps: BTreeSet<CellAddress>,
    ) -> DependencyChange {
        let old_deps = self.precedents.remove(&cell).unwrap_or_default();
        let mut change = DependencyChange::default();

        for &precedent in old_deps.difference(&new_deps) {
            if let Some(deps) = self.dependents.get_mut(&precedent) {
                deps.remove(&cell);
                if deps.is_empty() {
                    self.dependents.remove(&precedent);
                }
            }
            change.removed.push(precedent);
        }

        for &precedent in new_deps.difference(&old_deps) {
            self.dependents.entry(precedent).or_default().insert(cell);
            change.added.push(precedent);
        }

        if !new_deps.is_empty() {
            self.precedents.insert(cell, new_deps);
        }

        change
    }

    /// Remove every dependency of `cell`
    pub fn clear_dependencies(&mut self, cell: CellAddress) -> DependencyChange {
        self.set_dependencies(cell, BTreeSet::new())
    }

    /// Get cells that depend on the given cell, in address order
    pub fn dependents(&self, cell: CellAddress) -> impl Iterator<Item = CellAddress> + '_ {
        self.dependents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Get cells that the given cell depends on, in address order
    pub fn dependencies(&self, cell: CellAddress) -> impl Iterator<Item = CellAddress> + '_ {
        self.precedents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Whether any cell reads `cell`
    pub fn has_dependents(&self, cell: CellAddress) -> bool {
        self.dependents.contains_key(&cell)
    }

    /// The reflexive-transitive closure of `cell` along `dependents` edges
    pub fn dependent_closure(&self, cell: CellAddress) -> BTreeSet<CellAddress> {
        let mut closure = BTreeSet::new();
        let mut stack = vec![cell];

        while let Some(current) = stack.pop() {
            if closure.insert(current) {
                stack.extend(self.dependents(current).filter(|d| !closure.contains(d)));
            }
        }

        closure
    }

    /// Cells of `scope` that lie on a directed cycle
    ///
    /// Uses Tarjan's strongly connected components: a cell is on a cycle iff
    /// its component has more than one member or it reads itself. `scope`
    /// must be closed under `dependents` (as a closure is).
    pub fn cells_on_cycles(&self, scope: &BTreeSet<CellAddress>) -> BTreeSet<CellAddress> {
        let mut tarjan = Tarjan::default();

        for &root in scope {
            if !tarjan.indices.contains_key(&root) {
                tarjan.run(self, scope, root);
            }
        }

        tarjan.cyclic
    }

    /// Compute what to recompute after `changed` was edited
    ///
    /// Acyclic members are ordered in layers of equal depth (longest path
    /// from an unconstrained member), each layer in ascending address order.
    pub fn recalc_plan(&self, changed: CellAddress) -> RecalcPlan {
        let closure = self.dependent_closure(changed);
        let cycles = self.cells_on_cycles(&closure);

        let mut in_degree: BTreeMap<CellAddress, usize> = closure
            .iter()
            .filter(|c| !cycles.contains(*c))
            .map(|&c| (c, 0))
            .collect();

        let acyclic: Vec<CellAddress> = in_degree.keys().copied().collect();
        for &cell in &acyclic {
            for dependent in self.dependents(cell) {
                if let Some(degree) = in_degree.get_mut(&dependent) {
                    *degree += 1;
                }
            }
        }

        let mut layer: BTreeSet<CellAddress> = in_degree
            .iter()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(&cell, _)| cell)
            .collect();
        let mut order = Vec::with_capacity(acyclic.len());

        while !layer.is_empty() {
            let mut next = BTreeSet::new();
            for &cell in &layer {
                order.push(cell);
                for dependent in self.dependents(cell) {
                    if let Some(degree) = in_degree.get_mut(&dependent) {
                        *degree -= 1;
                        if *degree == 0 {
                            next.insert(dependent);
                        }
                    }
                }
            }
            layer = next;
        }

        debug_assert_eq!(order.len(), acyclic.len(), "acyclic subgraph must fully order");
        tracing::trace!(
            cell = %changed,
            closure = closure.len(),
            cycles = cycles.len(),
            "recalculation planned"
        );

        RecalcPlan {
            closure,
            cycles,
            order,
        }
    }

    /// Check that the two indices mirror each other
    pub fn is_consistent(&self) -> bool {
        let forward = self.precedents.iter().all(|(cell, deps)| {
            !deps.is_empty()
                && deps.iter().all(|p| {
                    self.dependents
                        .get(p)
                        .map_or(false, |set| set.contains(cell))
                })
        });
        let backward = self.dependents.iter().all(|(cell, deps)| {
            !deps.is_empty()
                && deps.iter().all(|d| {
                    self.precedents
                        .get(d)
                        .map_or(false, |set| set.contains(cell))
                })
        });
        forward && backward
    }

    /// Clear the entire graph
    pub fn clear(&mut self) {
        self.dependents.clear();
        self.precedents.clear();
    }
}

/// Iterative Tarjan state; recursion would overflow on long chains
#[derive(Default)]
struct Tarjan {
    next_index: usize,
    indices: HashMap<CellAddress, usize>,
    lowlinks: HashMap<CellAddress, usize>,
    stack: Vec<CellAddress>,
    on_stack: HashSet<CellAddress>,
    cyclic: BTreeSet<CellAddress>,
}

struct Frame {
    cell: CellAddress,
    successors: Vec<CellAddress>,
    next: usize,
}

impl Tarjan {
    fn enter(
        &mut self,
        graph: &DependencyGraph,
        scope: &BTreeSet<CellAddress>,
        cell: CellAddress,
    ) -> Frame {
        self.indices.insert(cell, self.next_index);
        self.lowlinks.insert(cell, self.next_index);
        self.next_index += 1;
        self.stack.push(cell);
        self.on_stack.insert(cell);

        Frame {
            cell,
            successors: graph.dependents(cell).filter(|d| scope.contains(d)).collect(),
            next: 0,
        }
    }

    fn lower(&mut self, cell: CellAddress, candidate: usize) {
        if let Some(low) = self.lowlinks.get_mut(&cell) {
            *low = (*low).min(candidate);
        }
    }

    fn run(&mut self, graph: &DependencyGraph, scope: &BTreeSet<CellAddress>, root: CellAddress) {
        let mut frames = vec![self.enter(graph, scope, root)];

        while let Some(frame) = frames.last_mut() {
            let cell = frame.cell;

            if let Some(&successor) = frame.successors.get(frame.next) {
                frame.next += 1;
                match self.indices.get(&successor) {
                    None => {
                        let child = self.enter(graph, scope, successor);
                        frames.push(child);
                    }
                    Some(&index) if self.on_stack.contains(&successor) => {
                        self.lower(cell, index);
                    }
                    Some(_) => {}
                }
                continue;
            }

            frames.pop();
            let low = self.lowlinks.get(&cell).copied().unwrap_or_default();
            if let Some(parent) = frames.last() {
                self.lower(parent.cell, low);
            }

            if Some(&low) == self.indices.get(&cell) {
                let mut component = Vec::new();
                while let Some(member) = self.stack.pop() {
                    self.on_stack.remove(&member);
                    component.push(member);
                    if member == cell {
                        break;
                    }
                }

                let reads_itself = graph.dependents(cell).any(|d| d == cell);
                if component.len() > 1 || reads_itself {
                    self.cyclic.extend(component);
                }
            }
        }
    }
}
