//! Phased start-order scheduling for distributed query plans.
//!
//! A compiled query arrives as a set of plan fragments connected by
//! exchange (producer/consumer) and join build/probe relationships. This
//! crate computes the order in which those fragments must be admitted for
//! scheduling: it builds a dependency graph over fragment identifiers,
//! collapses forced co-scheduling cycles into atomic units, and emits a
//! deterministic phase sequence. It performs no execution and keeps no
//! state across calls.

#![warn(missing_docs)]

pub mod plan;
pub mod schedule;

pub use plan::{
    FragmentId, JoinDistribution, JoinVariant, PlanFragment, PlanOperator, TransferMode,
};
pub use schedule::errors::{ScheduleError, ScheduleResult};
pub use schedule::{extract_phases, Phase};
