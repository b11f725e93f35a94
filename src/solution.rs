//! Solution representation and manipulation for die routes.
//!
//! This module provides data structures and methods for representing,
//! manipulating, and evaluating visiting orders, plus the report record
//! handed to the persistence layer.

use crate::cost::CostModel;
use crate::error::Result;
use crate::instance::{PlanningInstance, Position};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Represents a visiting order over all targets of an instance
#[derive(Debug, Clone)]
pub struct Solution {
    /// Target indices in visiting order; the start pose precedes position 0
    pub tour: Vec<usize>,
    /// Total motion time in seconds under `cost_model`
    pub total_time: f64,
    /// Metric `total_time` was measured with
    pub cost_model: CostModel,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of improvement passes (if applicable)
    pub iterations: Option<usize>,
}

impl Solution {
    /// Create a solution from a tour, timed with the trapezoidal model
    pub fn from_tour(instance: &PlanningInstance, tour: Vec<usize>, algorithm: &str) -> Self {
        Self::from_tour_with_model(instance, tour, algorithm, CostModel::Trapezoidal)
    }

    pub fn from_tour_with_model(
        instance: &PlanningInstance,
        tour: Vec<usize>,
        algorithm: &str,
        cost_model: CostModel,
    ) -> Self {
        let total_time = instance.route_cost(&tour, cost_model);
        Solution {
            tour,
            total_time,
            cost_model,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    /// Recompute the total time from scratch
    pub fn validate(&mut self, instance: &PlanningInstance) {
        self.total_time = instance.route_cost(&self.tour, self.cost_model);
    }

    /// Check that every target is visited exactly once
    pub fn is_complete(&self, instance: &PlanningInstance) -> bool {
        is_permutation(&self.tour, instance.dimension())
    }

    /// Materialized path: start position followed by each visited target
    pub fn path(&self, instance: &PlanningInstance) -> Vec<Position> {
        instance.path(&self.tour)
    }

    /// Change in total time from reversing `tour[i..j]`.
    ///
    /// Only the edge entering position `i` and the edge leaving position
    /// `j - 1` change; the reversed interior costs the same because segment
    /// costs are symmetric. Requires `1 <= i < j <= n`.
    pub fn two_opt_delta(&self, instance: &PlanningInstance, i: usize, j: usize) -> f64 {
        two_opt_delta(instance, &self.tour, i, j, self.cost_model)
    }

    /// Reverse `tour[i..j]`
    pub fn apply_two_opt(&mut self, i: usize, j: usize) {
        self.tour[i..j].reverse();
    }

    /// Output record for this solution
    pub fn report(&self, instance: &PlanningInstance) -> RouteReport {
        RouteReport::new(self.total_time, self.path(instance))
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Total time: {:.3}s ({})", self.total_time, self.cost_model)?;
        writeln!(f, "  Compute time: {:.4}s", self.computation_time)?;
        if let Some(iter) = self.iterations {
            writeln!(f, "  Passes: {}", iter)?;
        }
        writeln!(f, "  Tour: {:?}", self.tour)
    }
}

/// `true` if `tour` holds each of `0..n` exactly once.
pub fn is_permutation(tour: &[usize], n: usize) -> bool {
    if tour.len() != n {
        return false;
    }
    let mut seen = vec![false; n];
    for &idx in tour {
        if idx >= n || seen[idx] {
            return false;
        }
        seen[idx] = true;
    }
    true
}

pub(crate) fn two_opt_delta(
    instance: &PlanningInstance,
    tour: &[usize],
    i: usize,
    j: usize,
    model: CostModel,
) -> f64 {
    let n = tour.len();
    if i == 0 || i >= j || j > n {
        return 0.0;
    }

    let cost = |a: usize, b: usize| model.segment_time(&instance.pose(a), &instance.pose(b), &instance.limits);

    let before = tour[i - 1];
    let first = tour[i];
    let last = tour[j - 1];

    let mut delta = cost(before, last) - cost(before, first);
    if j < n {
        let after = tour[j];
        delta += cost(first, after) - cost(last, after);
    }
    delta
}

/// Result record written for the persistence layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteReport {
    /// Total time in seconds, rounded to 3 decimals
    #[serde(rename = "TotalTime")]
    pub total_time: f64,
    /// Initial position followed by each visited target
    #[serde(rename = "Path")]
    pub path: Vec<Position>,
}

impl RouteReport {
    pub fn new(total_time: f64, path: Vec<Position>) -> Self {
        RouteReport {
            total_time: (total_time * 1000.0).round() / 1000.0,
            path,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
