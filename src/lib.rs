//! Die Route Planner Library
//!
//! Plans a time-efficient visiting order over the dies of a wafer for a
//! platform made of an X/Y stage and a rotating camera. Each move costs the
//! slower of its translation and rotation, both following trapezoidal
//! velocity profiles.
//!
//! # Features
//!
//! - Trapezoidal motion cost model with constant-velocity fallback
//! - Nearest neighbor construction
//! - 2-opt local search (first or best improvement, optional delta
//!   evaluation and parallel scoring)
//! - Brute-force exact solver for small instances
//! - Benchmarking, synthetic wafers and SVG visualization
//!
//! # Example
//!
//! ```no_run
//! use die_route_planner::instance::PlanningInstance;
//! use die_route_planner::RoutePlanner;
//!
//! // Load a job file
//! let instance = PlanningInstance::from_file("Input_Wafer.json").unwrap();
//!
//! // Nearest neighbor, then 2-opt
//! let solution = RoutePlanner::default().plan(&instance);
//!
//! println!("Total time: {:.3}s", solution.total_time);
//! solution.report(&instance).save("Output_Wafer.json").unwrap();
//! ```

pub mod benchmark;
pub mod config;
pub mod cost;
pub mod error;
pub mod exact;
pub mod heuristics;
pub mod instance;
pub mod planner;
pub mod solution;
pub mod visualization;

pub use config::PlannerConfig;
pub use cost::CostModel;
pub use error::{PlannerError, Result};
pub use instance::PlanningInstance;
pub use planner::RoutePlanner;
pub use solution::Solution;
