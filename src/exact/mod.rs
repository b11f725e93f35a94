//! Exact solvers module.
//!
//! Brute-force enumeration of every visiting order, for small instances and
//! as ground truth for the heuristics.

mod brute_force;

pub use brute_force::*;
