#![forbid(unsafe_code)]

//! Plan-fragment representation consumed by the phase scheduler.
//!
//! These types describe the scheduling-relevant shape of a distributed
//! query plan: which fragments exist, which remote fragments each one
//! reads from, and how joins pair their build and probe inputs. They are
//! produced by the planner and treated as immutable here.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a plan fragment, unique within one scheduling request.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FragmentId(pub u32);

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a producer's output reaches the consuming fragment's instances.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum TransferMode {
    /// Output rows are partitioned among consumer instances.
    Partitioned,
    /// Output is replicated in full to every consumer instance.
    Broadcast,
}

/// Join variant, as declared in the plan.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum JoinVariant {
    /// Inner join; build side is the right input.
    Inner,
    /// Left-outer join; build side is the right input.
    Left,
    /// Right-outer join; the outer side must be probed, so the build side
    /// is the left input.
    Right,
    /// Full-outer join; follows the right-outer convention.
    Full,
}

/// Distribution of the join's build side across the joining instances.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum JoinDistribution {
    /// Build rows are partitioned; build and probe stay in separate phases.
    Partitioned,
    /// Build rows are replicated to every instance; the join and its build
    /// source must start together.
    BroadcastBuild,
}

/// One unit of distributed execution: a fragment identifier plus the root
/// of its operator tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlanFragment {
    /// Unique identifier of this fragment.
    pub id: FragmentId,
    /// Root operator of the fragment's plan subtree.
    pub root: PlanOperator,
}

impl PlanFragment {
    /// Creates a fragment with the supplied root operator.
    pub fn new(id: FragmentId, root: PlanOperator) -> Self {
        Self { id, root }
    }

    /// Creates a leaf fragment (e.g. a table scan) with no remote inputs.
    pub fn leaf(id: FragmentId) -> Self {
        Self {
            id,
            root: PlanOperator::leaf(),
        }
    }
}

/// Operator node within a fragment's plan tree.
///
/// Only the kinds that influence scheduling are distinguished; everything
/// else collapses into [`PlanOperator::Passthrough`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum PlanOperator {
    /// Exchange reading the output of one or more remote fragments, in
    /// declared order.
    RemoteSource {
        /// Fragments whose output this exchange consumes.
        sources: Vec<FragmentId>,
        /// Transfer mode between producer and consumer.
        mode: TransferMode,
    },
    /// Hash join pairing a build input with a probe input.
    HashJoin {
        /// Declared join variant; selects which input is built.
        variant: JoinVariant,
        /// Distribution of the build side.
        distribution: JoinDistribution,
        /// First (left) input.
        left: Box<PlanOperator>,
        /// Second (right) input.
        right: Box<PlanOperator>,
    },
    /// Order-preserving merge of several inputs (e.g. UNION ALL).
    FanIn {
        /// Inputs in declared left-to-right order.
        inputs: Vec<PlanOperator>,
    },
    /// Any operator with no scheduling significance (scans, filters,
    /// projections, aggregations). A leaf has no inputs.
    Passthrough {
        /// Child operators, if any.
        inputs: Vec<PlanOperator>,
    },
}

impl PlanOperator {
    /// Creates a leaf operator with no inputs.
    pub fn leaf() -> Self {
        PlanOperator::Passthrough { inputs: Vec::new() }
    }

    /// Creates a passthrough operator wrapping a single input.
    pub fn unary(input: PlanOperator) -> Self {
        PlanOperator::Passthrough {
            inputs: vec![input],
        }
    }

    /// Creates a remote source reading a single fragment.
    pub fn remote(source: FragmentId, mode: TransferMode) -> Self {
        PlanOperator::RemoteSource {
            sources: vec![source],
            mode,
        }
    }
}
