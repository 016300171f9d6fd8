//! The contract between a problem and the search engine.
//!
//! A problem only has to describe its states. The engine owns every node,
//! the frontier, the visited set and deduplication, so a [`State`] is expected
//! to be a small value type that can be cloned and hashed cheaply.

use std::fmt::Debug;
use std::hash::Hash;

use smallvec::SmallVec;

use crate::cost::Cost;
use crate::error::ContractViolation;

/// Inline capacity for generated successors.
///
/// Grid-like problems rarely have more than 8 neighbours, larger fan-outs
/// spill to the heap.
pub const INLINE_SUCCESSORS: usize = 8;

pub type Successors<S> = SmallVec<[S; INLINE_SUCCESSORS]>;

/// A problem state the engine can search over.
///
/// Equality and hashing come from `Eq` and `Hash` and must agree: equal states
/// must hash equally. Every method must be a pure function of the states
/// involved.
pub trait State: Clone + Debug + Eq + Hash {
    type Cost: Cost;

    /// Admissible estimate of the cost left to reach `goal`.
    ///
    /// Must not be negative and should be zero for the goal itself.
    fn estimate_to_goal(&self, goal: &Self) -> Self::Cost;

    /// Goal test.
    fn is_goal(&self, goal: &Self) -> bool {
        self == goal
    }

    /// States reachable from this one.
    ///
    /// `parent` is the state this one was reached from, if any. Skipping it is
    /// allowed but not needed, as the engine deduplicates states on its own.
    fn successors(&self, parent: Option<&Self>) -> Successors<Self>;

    /// Non-negative cost of moving from this state to `successor`.
    fn transition_cost(&self, successor: &Self) -> Self::Cost;
}

/// [`State::transition_cost`] with the contract checked.
#[inline(always)]
pub(crate) fn checked_transition_cost<S: State>(
    from: &S,
    to: &S,
) -> Result<S::Cost, ContractViolation> {
    let c = from.transition_cost(to);
    if c.is_negative() {
        return Err(ContractViolation::NegativeCost);
    }
    if !c.valid() {
        return Err(ContractViolation::InvalidCost);
    }
    Ok(c)
}

/// [`State::estimate_to_goal`] with the contract checked.
#[inline(always)]
pub(crate) fn checked_estimate<S: State>(s: &S, goal: &S) -> Result<S::Cost, ContractViolation> {
    let h = s.estimate_to_goal(goal);
    if h.is_negative() {
        return Err(ContractViolation::NegativeEstimate);
    }
    if !h.valid() {
        return Err(ContractViolation::InvalidEstimate);
    }
    Ok(h)
}
