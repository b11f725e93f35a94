//! Route planning pipeline: nearest neighbor followed by 2-opt, or brute force.

use crate::config::PlannerConfig;
use crate::error::Result;
use crate::exact::{BruteForceSolver, ExactResult};
use crate::heuristics::construction::{ConstructionHeuristic, NearestNeighborHeuristic};
use crate::heuristics::local_search::{LocalSearch, TwoOptSearch};
use crate::instance::PlanningInstance;
use crate::solution::Solution;

pub struct RoutePlanner {
    config: PlannerConfig,
}

impl RoutePlanner {
    pub fn new(config: PlannerConfig) -> Result<Self> {
        config.validate()?;
        Ok(RoutePlanner { config })
    }

    /// Greedy construction refined by 2-opt.
    pub fn plan(&self, instance: &PlanningInstance) -> Solution {
        let start = std::time::Instant::now();

        let mut solution = NearestNeighborHeuristic::new().construct(instance);
        let initial_time = solution.total_time;

        let two_opt = TwoOptSearch::with_config(self.config.two_opt.clone());
        two_opt.improve(instance, &mut solution);

        solution.algorithm = format!("NearestNeighbor+{}", two_opt.name());
        solution.computation_time = start.elapsed().as_secs_f64();

        log::info!(
            "{}: {} targets, {:.3}s -> {:.3}s ({} passes, {:.4}s)",
            instance.name,
            instance.dimension(),
            initial_time,
            solution.total_time,
            solution.iterations.unwrap_or(0),
            solution.computation_time
        );
        debug_assert!(solution.is_complete(instance));

        solution
    }

    /// Exhaustive search under the configured exact metric.
    pub fn plan_exact(&self, instance: &PlanningInstance) -> Result<ExactResult> {
        BruteForceSolver::new(self.config.exact.clone()).solve(instance)
    }
}

impl Default for RoutePlanner {
    fn default() -> Self {
        RoutePlanner {
            config: PlannerConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::local_search::{improve, TwoOptConfig};

    #[test]
    fn test_rejects_invalid_config() {
        let config = PlannerConfig {
            two_opt: TwoOptConfig {
                epsilon: -1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(RoutePlanner::new(config).is_err());
    }

    #[test]
    fn test_empty_instance() {
        let instance = PlanningInstance::from_json_str(
            "empty",
            r#"{ "InitialPosition": [0, 0], "StageVelocity": 10, "Dies": [] }"#,
        )
        .unwrap();
        let solution = RoutePlanner::default().plan(&instance);
        assert!(solution.tour.is_empty());
        assert_eq!(solution.total_time, 0.0);
        assert_eq!(solution.report(&instance).path.len(), 1);
    }

    #[test]
    fn test_single_die_keeps_its_move_time() {
        let instance = PlanningInstance::from_json_str(
            "single",
            r#"{
                "InitialPosition": [0, 0],
                "InitialAngle": 0,
                "StageVelocity": 10,
                "StageAcceleration": 100,
                "CameraVelocity": 90,
                "CameraAcceleration": 1000,
                "Dies": [{ "Corners": [[29, -1], [31, -1], [31, 1], [29, 1]] }]
            }"#,
        )
        .unwrap();
        let start_to_die = instance.route_cost(&[0], crate::cost::CostModel::Trapezoidal);
        assert!(start_to_die > 0.0);

        let solution = RoutePlanner::default().plan(&instance);
        assert_eq!(solution.tour, vec![0]);
        assert_eq!(solution.total_time, start_to_die);

        // the free function reports no improvable time for a single target
        assert_eq!(improve(&instance, &[0]), (vec![0], 0.0));
    }
}
