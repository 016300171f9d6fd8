//! Incremental A* over any state space.
//!
//! Implement [`State`] for your node type, then drive a [`SearchSession`]
//! one expansion at a time with [`SearchSession::step`] or all the way with
//! [`SearchSession::run`]. A session owns its nodes and reuses their storage
//! across searches.

// Internals
// ---------
pub mod arena;
pub mod frontier;
pub mod visited;

// Costs and states
// ----------------
pub mod cost;
pub mod error;
pub mod float_cost;
pub mod state;

// Search
// ------
pub mod session;

// Problems
// --------
pub mod problems;

pub use cost::Cost;
pub use error::ContractViolation;
pub use error::SearchError;
pub use float_cost::FloatCost;
pub use session::SearchConfig;
pub use session::SearchSession;
pub use session::SearchState;
pub use state::State;
pub use state::Successors;
