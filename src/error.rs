use thiserror::Error;

use crate::session::SearchState;

/// A [`crate::state::State`] implementation returned something the engine
/// can't work with.
#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
pub enum ContractViolation {
    #[error("negative transition cost")]
    NegativeCost,
    #[error("transition cost is not a finite cost")]
    InvalidCost,
    #[error("negative goal estimate")]
    NegativeEstimate,
    #[error("goal estimate is not a finite cost")]
    InvalidEstimate,
    #[error("path cost overflowed the cost type")]
    CostOverflow,
}

/// The node arena can't hand out more nodes.
#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
pub enum ArenaError {
    #[error("Node arena exhausted after {limit} live nodes")]
    Exhausted { limit: usize },
}

/// Errors from driving a [`crate::session::SearchSession`].
///
/// Search outcomes like an exhausted frontier are not errors, they are
/// reported through [`SearchState`]. These are either API misuse or a broken
/// problem.
#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("No start and goal were set")]
    NotInitialized,
    #[error("Search already terminated as {0}, reset it first")]
    AlreadyTerminated(SearchState),
    #[error("No solution available while {0}")]
    NoSolution(SearchState),
    #[error("Solution was already released")]
    SolutionReleased,
    #[error("Problem broke the state contract: {0}")]
    ContractViolation(#[from] ContractViolation),
}
