#![forbid(unsafe_code)]

//! Phase extraction for distributed query plans.
//!
//! Fragments flow one way through three passes: dependency graph
//! construction ([`graph`]), condensation of co-scheduling cycles into
//! atomic units ([`condense`]), and deterministic sequencing of those
//! units ([`sequence`]). [`extract_phases`] drives the pipeline and
//! enforces the output invariants.

/// Structured scheduling errors.
pub mod errors;

pub(crate) mod condense;
pub(crate) mod graph;
pub(crate) mod sequence;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::plan::{FragmentId, PlanFragment};
use crate::schedule::condense::CondensedGraph;
use crate::schedule::errors::{ScheduleError, ScheduleResult};
use crate::schedule::graph::DependencyGraph;

/// One scheduling unit: fragments that must be started together.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    /// Member fragments, in plan declaration order. Never empty.
    pub fragments: Vec<FragmentId>,
}

impl Phase {
    /// Returns true if the phase contains `id`.
    pub fn contains(&self, id: FragmentId) -> bool {
        self.fragments.contains(&id)
    }
}

/// Computes the start-order schedule for one query's plan fragments.
///
/// The returned phases partition the input fragment set exactly: every
/// fragment appears in exactly one phase, and for every dependency edge
/// crossing two phases the consumer's phase comes first. Output is
/// deterministic for a given input, including declaration order.
///
/// # Errors
///
/// Returns a [`ScheduleError`] if the input is empty, contains duplicate
/// fragment identifiers, or references a fragment that was not supplied.
pub fn extract_phases(fragments: &[PlanFragment]) -> ScheduleResult<Vec<Phase>> {
    if fragments.is_empty() {
        return Err(ScheduleError::EmptyPlan);
    }

    let graph = DependencyGraph::build(fragments)?;
    let condensed = CondensedGraph::from_dependency_graph(&graph);
    let order = sequence::sequence(&condensed);

    let phases: Vec<Phase> = order
        .iter()
        .map(|&unit| Phase {
            fragments: condensed
                .members(unit)
                .iter()
                .map(|&fragment| graph.id(fragment))
                .collect(),
        })
        .collect();

    verify_invariants(&graph, &condensed, &order, &phases);

    debug!(
        fragments = graph.len(),
        edges = graph.edges().len(),
        phases = phases.len(),
        "extracted phase schedule"
    );
    Ok(phases)
}

/// Output invariants from the scheduling contract. A violation is a bug
/// in graph construction or condensation, not a caller error, so it fails
/// loudly instead of degrading ordering correctness.
fn verify_invariants(
    graph: &DependencyGraph,
    condensed: &CondensedGraph,
    order: &[usize],
    phases: &[Phase],
) {
    let mut distinct = FxHashSet::default();
    let mut total = 0;
    for phase in phases {
        assert!(!phase.fragments.is_empty(), "phases must be non-empty");
        total += phase.fragments.len();
        distinct.extend(phase.fragments.iter().copied());
    }
    assert!(
        total == graph.len() && distinct.len() == graph.len(),
        "phases must partition the fragment set exactly"
    );

    let mut position = vec![0; order.len()];
    for (pos, &unit) in order.iter().enumerate() {
        position[unit] = pos;
    }
    for &(from, to) in graph.edges() {
        assert!(
            position[condensed.unit_of(from)] <= position[condensed.unit_of(to)],
            "phase order must respect every dependency edge"
        );
    }
}
