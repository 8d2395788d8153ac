#![forbid(unsafe_code)]

//! Structured errors emitted while extracting a phase schedule.

use thiserror::Error;

use crate::plan::FragmentId;

/// Convenience alias for scheduling results.
pub type ScheduleResult<T> = std::result::Result<T, ScheduleError>;

/// Input-validation failures raised by [`extract_phases`].
///
/// All variants indicate a structurally invalid plan handed in by the
/// caller; none are retryable.
///
/// [`extract_phases`]: crate::schedule::extract_phases
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// The fragment set was empty.
    #[error("cannot schedule an empty fragment set")]
    EmptyPlan,
    /// Two fragments in the input shared an identifier.
    #[error("duplicate fragment id {id}")]
    DuplicateFragment {
        /// The identifier that appeared more than once.
        id: FragmentId,
    },
    /// An operator referenced a fragment absent from the input set.
    #[error("fragment {referrer} reads from fragment {referenced}, which is not part of the plan")]
    UnknownFragment {
        /// Fragment whose operator tree holds the dangling reference.
        referrer: FragmentId,
        /// The missing fragment identifier.
        referenced: FragmentId,
    },
}

impl ScheduleError {
    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            ScheduleError::EmptyPlan => "EmptyPlan",
            ScheduleError::DuplicateFragment { .. } => "DuplicateFragment",
            ScheduleError::UnknownFragment { .. } => "UnknownFragment",
        }
    }
}
