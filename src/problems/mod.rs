//! Problems to search over.
//!
//! Each one is a thin data provider implementing [`crate::state::State`].

pub mod grid;
pub mod romania;
