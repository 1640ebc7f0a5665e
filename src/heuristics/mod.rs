//! Heuristics module for the k-center problem.
//!
//! This module exports the genetic search and its operators, plus the
//! farthest-first construction heuristic.

pub mod construction;
pub mod fitness;
pub mod genetic;
pub mod operators;

pub use construction::*;
pub use fitness::*;
pub use genetic::*;
pub use operators::*;
