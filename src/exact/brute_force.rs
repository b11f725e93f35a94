//! Brute-force solver.
//!
//! Enumerates all n! visiting orders in lexicographic order and keeps the
//! first one with the strictly smallest objective. O(n!·n): only usable for
//! a handful of targets, hence the `max_targets` guard.
//!
//! The objective depends on [`ExactConfig::cost_model`]:
//! - `ConstantVelocity` scores the straight-line path length and reports
//!   `length / stage_velocity` as the total time;
//! - `Trapezoidal` scores the same motion time the heuristics minimize;
//! - `MonotoneTrapezoidal` scores that time on the monotone profile.

use crate::cost::{constant_velocity_time, CostModel};
use crate::error::{PlannerError, Result};
use crate::instance::PlanningInstance;
use crate::solution::Solution;
use serde::{Deserialize, Serialize};

/// Brute-force solver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExactConfig {
    /// Metric the permutations are ranked by
    pub cost_model: CostModel,
    /// Refuse instances with more targets than this
    pub max_targets: usize,
}

impl Default for ExactConfig {
    fn default() -> Self {
        ExactConfig {
            cost_model: CostModel::ConstantVelocity,
            max_targets: 10,
        }
    }
}

/// Result of exact solving
#[derive(Debug, Clone)]
pub struct ExactResult {
    /// Optimal solution under the configured metric
    pub solution: Solution,
    /// Optimal objective: path length for `ConstantVelocity`, seconds otherwise
    pub objective: f64,
    /// Number of visiting orders scored
    pub permutations_evaluated: u64,
}

pub struct BruteForceSolver {
    pub config: ExactConfig,
}

impl BruteForceSolver {
    pub fn new(config: ExactConfig) -> Self {
        BruteForceSolver { config }
    }

    fn objective(&self, instance: &PlanningInstance, order: &[usize]) -> f64 {
        match self.config.cost_model {
            CostModel::ConstantVelocity => instance.path_length(order),
            model => instance.route_cost(order, model),
        }
    }

    pub fn solve(&self, instance: &PlanningInstance) -> Result<ExactResult> {
        let n = instance.dimension();
        if n > self.config.max_targets {
            return Err(PlannerError::TooManyTargets {
                targets: n,
                max: self.config.max_targets,
            });
        }

        let start = std::time::Instant::now();
        log::info!(
            "Enumerating {}! orders of {} ({} metric)",
            n,
            instance.name,
            self.config.cost_model
        );

        let mut order: Vec<usize> = (0..n).collect();
        let mut best_order = order.clone();
        let mut best = f64::INFINITY;
        let mut evaluated = 0u64;

        loop {
            let value = self.objective(instance, &order);
            evaluated += 1;
            if value < best {
                best = value;
                best_order.copy_from_slice(&order);
            }
            if !next_permutation(&mut order) {
                break;
            }
        }

        let total_time = match self.config.cost_model {
            CostModel::ConstantVelocity => constant_velocity_time(best, instance.limits.stage_velocity),
            CostModel::Trapezoidal | CostModel::MonotoneTrapezoidal => best,
        };

        let mut solution = Solution::from_tour_with_model(
            instance,
            best_order,
            "BruteForce",
            self.config.cost_model,
        );
        solution.total_time = total_time;
        solution.computation_time = start.elapsed().as_secs_f64();

        log::info!(
            "BruteForce: {} orders in {:.3}s, best {:.3}s",
            evaluated,
            solution.computation_time,
            total_time
        );

        Ok(ExactResult {
            solution,
            objective: best,
            permutations_evaluated: evaluated,
        })
    }
}

impl Default for BruteForceSolver {
    fn default() -> Self {
        Self::new(ExactConfig::default())
    }
}

/// Advance `items` to the next lexicographic permutation.
/// Returns `false` (leaving `items` sorted descending) after the last one.
pub fn next_permutation(items: &mut [usize]) -> bool {
    let n = items.len();
    if n < 2 {
        return false;
    }

    let mut i = n - 1;
    while i > 0 && items[i - 1] >= items[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }

    let mut j = n - 1;
    while items[j] <= items[i - 1] {
        j -= 1;
    }
    items.swap(i - 1, j);
    items[i..].reverse();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{KinematicLimits, Pose, Position, Target};

    fn create_test_instance() -> PlanningInstance {
        PlanningInstance::new(
            "test",
            Pose::new(Position::new(0.0, 0.0), 0.0),
            KinematicLimits::new(50.0, 0.0, 0.0, 0.0),
            vec![
                Target::new(Position::new(10.0, 0.0), 0.0),
                Target::new(Position::new(-4.0, 0.0), 0.0),
                Target::new(Position::new(11.0, 2.0), 0.0),
            ],
        )
    }

    #[test]
    fn test_next_permutation_order() {
        let mut p = vec![0, 1, 2];
        let mut seen = vec![p.clone()];
        while next_permutation(&mut p) {
            seen.push(p.clone());
        }
        assert_eq!(
            seen,
            vec![
                vec![0, 1, 2],
                vec![0, 2, 1],
                vec![1, 0, 2],
                vec![1, 2, 0],
                vec![2, 0, 1],
                vec![2, 1, 0],
            ]
        );
    }

    #[test]
    fn test_matches_manual_enumeration() {
        let instance = create_test_instance();
        let orders: [[usize; 3]; 6] = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        let manual = orders
            .iter()
            .map(|o| instance.path_length(o))
            .fold(f64::INFINITY, f64::min);

        let result = BruteForceSolver::default().solve(&instance).unwrap();
        assert_eq!(result.permutations_evaluated, 6);
        assert_eq!(result.objective, manual);
        assert!((result.solution.total_time - manual / 50.0).abs() < 1e-12);
        // short hop back first, then out past the first die
        assert_eq!(result.solution.tour, vec![1, 0, 2]);
    }

    #[test]
    fn test_trapezoidal_metric() {
        let mut instance = create_test_instance();
        instance.limits = KinematicLimits::new(10.0, 100.0, 90.0, 1000.0);
        let solver = BruteForceSolver::new(ExactConfig {
            cost_model: CostModel::Trapezoidal,
            ..Default::default()
        });
        let result = solver.solve(&instance).unwrap();
        assert_eq!(result.solution.cost_model, CostModel::Trapezoidal);
        assert!((result.solution.total_time - instance.tour_time(&result.solution.tour)).abs() < 1e-12);
    }

    #[test]
    fn test_ties_keep_first_order() {
        // mirror image: [1, 2, 0] and [2, 1, 0] cost exactly the same
        let mut instance = create_test_instance();
        instance.targets = vec![
            Target::new(Position::new(0.0, 5.0), 0.0),
            Target::new(Position::new(1.0, 0.0), 0.0),
            Target::new(Position::new(-1.0, 0.0), 0.0),
        ];
        assert_eq!(instance.path_length(&[1, 2, 0]), instance.path_length(&[2, 1, 0]));

        let result = BruteForceSolver::default().solve(&instance).unwrap();
        assert_eq!(result.solution.tour, vec![1, 2, 0]);

        instance.limits = KinematicLimits::new(10.0, 100.0, 90.0, 1000.0);
        for cost_model in [CostModel::Trapezoidal, CostModel::MonotoneTrapezoidal] {
            let solver = BruteForceSolver::new(ExactConfig {
                cost_model,
                ..Default::default()
            });
            let result = solver.solve(&instance).unwrap();
            assert_eq!(result.solution.tour, vec![1, 2, 0]);
            assert_eq!(result.solution.total_time, instance.route_cost(&[2, 1, 0], cost_model));
        }
    }

    #[test]
    fn test_empty_instance() {
        let mut instance = create_test_instance();
        instance.targets.clear();
        let result = BruteForceSolver::default().solve(&instance).unwrap();
        assert!(result.solution.tour.is_empty());
        assert_eq!(result.solution.total_time, 0.0);
        assert_eq!(result.permutations_evaluated, 1);
    }

    #[test]
    fn test_refuses_large_instances() {
        let instance = create_test_instance();
        let solver = BruteForceSolver::new(ExactConfig {
            max_targets: 2,
            ..Default::default()
        });
        assert!(matches!(
            solver.solve(&instance),
            Err(PlannerError::TooManyTargets { targets: 3, max: 2 })
        ));
    }
}
