#![forbid(unsafe_code)]

//! Fragment dependency graph construction.
//!
//! Walks each fragment's operator tree exactly once and records directed
//! edges between fragment identifiers. An edge `(u, v)` means "u must be
//! admitted for scheduling no later than v". Broadcast transfers add the
//! reverse edge as well, deliberately forming a cycle that the condenser
//! later collapses into a single scheduling unit.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::plan::{
    FragmentId, JoinDistribution, JoinVariant, PlanFragment, PlanOperator, TransferMode,
};
use crate::schedule::errors::{ScheduleError, ScheduleResult};

/// Dependency graph over the fragments of one scheduling request.
///
/// Fragments are mapped to dense indices in declaration order; adjacency
/// lists and the global edge list both preserve first-insertion order so
/// that every downstream tie-break is independent of hash iteration.
#[derive(Debug)]
pub(crate) struct DependencyGraph {
    ids: Vec<FragmentId>,
    out: Vec<SmallVec<[usize; 4]>>,
    edges: Vec<(usize, usize)>,
}

impl DependencyGraph {
    /// Builds the graph for the supplied fragments, visiting each
    /// fragment's operator tree once in declaration order.
    pub(crate) fn build(fragments: &[PlanFragment]) -> ScheduleResult<DependencyGraph> {
        let mut builder = Builder::new(fragments)?;
        for fragment in fragments {
            let owner = builder.index[&fragment.id];
            builder.visit(owner, &fragment.root)?;
        }
        Ok(DependencyGraph {
            ids: builder.ids,
            out: builder.out,
            edges: builder.edges,
        })
    }

    /// Number of fragments (vertices).
    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    /// Fragment identifier for a dense index.
    pub(crate) fn id(&self, vertex: usize) -> FragmentId {
        self.ids[vertex]
    }

    /// Successors of `vertex` in edge-insertion order.
    pub(crate) fn out(&self, vertex: usize) -> &[usize] {
        &self.out[vertex]
    }

    /// All edges in first-insertion order.
    pub(crate) fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }
}

struct Builder {
    ids: Vec<FragmentId>,
    index: FxHashMap<FragmentId, usize>,
    out: Vec<SmallVec<[usize; 4]>>,
    edges: Vec<(usize, usize)>,
    seen: FxHashSet<(usize, usize)>,
}

impl Builder {
    fn new(fragments: &[PlanFragment]) -> ScheduleResult<Builder> {
        let mut ids = Vec::with_capacity(fragments.len());
        let mut index = FxHashMap::default();
        for fragment in fragments {
            if index.insert(fragment.id, ids.len()).is_some() {
                return Err(ScheduleError::DuplicateFragment { id: fragment.id });
            }
            ids.push(fragment.id);
        }
        let out = vec![SmallVec::new(); fragments.len()];
        Ok(Builder {
            ids,
            index,
            out,
            edges: Vec::new(),
            seen: FxHashSet::default(),
        })
    }

    fn resolve(&self, referrer: usize, id: FragmentId) -> ScheduleResult<usize> {
        self.index
            .get(&id)
            .copied()
            .ok_or(ScheduleError::UnknownFragment {
                referrer: self.ids[referrer],
                referenced: id,
            })
    }

    fn add_edge(&mut self, from: usize, to: usize) {
        if self.seen.insert((from, to)) {
            self.out[from].push(to);
            self.edges.push((from, to));
        }
    }

    /// Applies the edge rules to the subtree rooted at `op` and returns the
    /// remote source fragments it reaches, in declared order.
    fn visit(&mut self, owner: usize, op: &PlanOperator) -> ScheduleResult<Vec<usize>> {
        match op {
            PlanOperator::RemoteSource { sources, mode } => {
                let mut reached = Vec::with_capacity(sources.len());
                for &id in sources {
                    let source = self.resolve(owner, id)?;
                    // Consumer before producer: the consumer's input channel
                    // must exist before the producer is told where to send.
                    self.add_edge(owner, source);
                    if *mode == TransferMode::Broadcast {
                        self.add_edge(source, owner);
                    }
                    reached.push(source);
                }
                Ok(reached)
            }
            PlanOperator::HashJoin {
                variant,
                distribution,
                left,
                right,
            } => {
                let (build, probe) = match variant {
                    JoinVariant::Inner | JoinVariant::Left => (right, left),
                    JoinVariant::Right | JoinVariant::Full => (left, right),
                };
                // Build side first: edge insertion order drives the
                // sequencer's traversal order.
                let build_sources = self.visit(owner, build)?;
                let probe_sources = self.visit(owner, probe)?;
                if *distribution == JoinDistribution::BroadcastBuild {
                    for &source in &build_sources {
                        self.add_edge(source, owner);
                    }
                }
                for &build_source in &build_sources {
                    for &probe_source in &probe_sources {
                        // The probe must not start consuming a lookup
                        // structure that has not started building.
                        self.add_edge(build_source, probe_source);
                    }
                }
                let mut reached = build_sources;
                reached.extend(probe_sources);
                Ok(reached)
            }
            PlanOperator::FanIn { inputs } | PlanOperator::Passthrough { inputs } => {
                let mut reached = Vec::new();
                for input in inputs {
                    reached.extend(self.visit(owner, input)?);
                }
                Ok(reached)
            }
        }
    }
}
