#![forbid(unsafe_code)]

//! Condensation of the dependency graph into scheduling units.
//!
//! Strongly connected components are computed with an iterative Tarjan
//! pass over the dense fragment indices. Each component becomes one unit:
//! a set of fragments that must be admitted together because broadcast
//! edges forced them into a cycle. The condensed graph is acyclic.
//!
//! Determinism: vertices are visited in declaration order and successors
//! in edge-insertion order; unit membership and unit ordering are then
//! normalized against declaration order, so the decomposition never
//! depends on hash iteration.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::schedule::graph::DependencyGraph;

const UNVISITED: usize = usize::MAX;

/// The condensed, acyclic graph of scheduling units.
#[derive(Debug)]
pub(crate) struct CondensedGraph {
    /// Fragment indices per unit, each sorted by declaration order; units
    /// ordered by their smallest member.
    units: Vec<Vec<usize>>,
    /// Successors per unit, in first-insertion order of the underlying
    /// fragment edges.
    out: Vec<SmallVec<[usize; 4]>>,
    /// Unit index for every fragment index.
    unit_of: Vec<usize>,
}

impl CondensedGraph {
    /// Collapses the strongly connected components of `graph` into units
    /// and derives the inter-unit edges.
    pub(crate) fn from_dependency_graph(graph: &DependencyGraph) -> CondensedGraph {
        let mut units = strongly_connected(graph);
        // Members come out sorted, so the first entry is the earliest
        // declared fragment of the unit.
        units.sort_unstable_by_key(|members| members[0]);

        let mut unit_of = vec![0; graph.len()];
        for (unit, members) in units.iter().enumerate() {
            for &fragment in members {
                unit_of[fragment] = unit;
            }
        }

        let mut out = vec![SmallVec::new(); units.len()];
        let mut seen = FxHashSet::default();
        for &(from, to) in graph.edges() {
            let (from_unit, to_unit) = (unit_of[from], unit_of[to]);
            if from_unit != to_unit && seen.insert((from_unit, to_unit)) {
                out[from_unit].push(to_unit);
            }
        }

        CondensedGraph { units, out, unit_of }
    }

    /// Number of units.
    pub(crate) fn len(&self) -> usize {
        self.units.len()
    }

    /// Fragment indices belonging to `unit`, in declaration order.
    pub(crate) fn members(&self, unit: usize) -> &[usize] {
        &self.units[unit]
    }

    /// Successor units of `unit` in edge-insertion order.
    pub(crate) fn out(&self, unit: usize) -> &[usize] {
        &self.out[unit]
    }

    /// Unit containing the fragment with dense index `fragment`.
    pub(crate) fn unit_of(&self, fragment: usize) -> usize {
        self.unit_of[fragment]
    }
}

/// Iterative Tarjan SCC. Returns components with members sorted by
/// declaration index; component order is normalized by the caller.
fn strongly_connected(graph: &DependencyGraph) -> Vec<Vec<usize>> {
    let n = graph.len();
    let mut index = vec![UNVISITED; n];
    let mut low = vec![0; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut next_index = 0;
    let mut components = Vec::new();

    // Explicit frames of (vertex, next successor position) replace the
    // usual recursion; plan graphs are small but chains can be long.
    let mut frames: Vec<(usize, usize)> = Vec::new();
    for root in 0..n {
        if index[root] != UNVISITED {
            continue;
        }
        frames.push((root, 0));
        while let Some(frame) = frames.last_mut() {
            let vertex = frame.0;
            let child = frame.1;
            frame.1 += 1;

            if child == 0 {
                index[vertex] = next_index;
                low[vertex] = next_index;
                next_index += 1;
                stack.push(vertex);
                on_stack[vertex] = true;
            }

            match graph.out(vertex).get(child) {
                Some(&succ) => {
                    if index[succ] == UNVISITED {
                        frames.push((succ, 0));
                    } else if on_stack[succ] {
                        low[vertex] = low[vertex].min(index[succ]);
                    }
                }
                None => {
                    frames.pop();
                    if let Some(parent) = frames.last() {
                        low[parent.0] = low[parent.0].min(low[vertex]);
                    }
                    if low[vertex] == index[vertex] {
                        let mut members = Vec::new();
                        while let Some(member) = stack.pop() {
                            on_stack[member] = false;
                            members.push(member);
                            if member == vertex {
                                break;
                            }
                        }
                        members.sort_unstable();
                        components.push(members);
                    }
                }
            }
        }
    }
    components
}
