//! Local search improvement heuristics for die routes.
//!
//! 2-opt over an open path: the start pose is fixed, and a move reverses a
//! contiguous run of the visiting order. Because segment costs are
//! symmetric, a reversal only changes the two edges at its ends.
//!
//! Two scan strategies are available:
//! - first improvement: every improving reversal is applied as soon as it
//!   is found and the scan carries on over the updated tour; scans repeat
//!   until one finds nothing;
//! - best improvement: a scan scores every reversal against the same tour
//!   and applies only the best one. Scoring can be spread over the rayon
//!   pool; the reduction is deterministic.
//!
//! Cost: O(n³) per scan with full recomputation, O(n²) with delta
//! evaluation.

use crate::cost::CostModel;
use crate::error::{PlannerError, Result};
use crate::instance::PlanningInstance;
use crate::solution::{two_opt_delta, Solution};
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Minimum gain (seconds) for a move to count as an improvement.
pub const TWO_OPT_EPSILON: f64 = 1e-8;

/// What a scan needs besides the tour itself.
#[derive(Clone, Copy)]
struct ScanContext<'a> {
    instance: &'a PlanningInstance,
    model: CostModel,
}

/// Trait for local search improvement methods
pub trait LocalSearch {
    fn improve(&self, instance: &PlanningInstance, solution: &mut Solution) -> bool;
    fn name(&self) -> &str;
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImprovementStrategy {
    #[default]
    FirstImprovement,
    BestImprovement,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MoveEvaluation {
    /// Re-time the whole candidate tour
    #[default]
    FullRecompute,
    /// Re-time only the two edges a reversal changes
    Delta,
}

/// 2-opt parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwoOptConfig {
    pub strategy: ImprovementStrategy,
    pub evaluation: MoveEvaluation,
    /// Must be strictly positive
    pub epsilon: f64,
    /// Score best-improvement candidates on the rayon pool
    pub parallel: bool,
    /// Stop after this many scans even if still improving
    pub max_passes: Option<usize>,
}

impl Default for TwoOptConfig {
    fn default() -> Self {
        TwoOptConfig {
            strategy: ImprovementStrategy::FirstImprovement,
            evaluation: MoveEvaluation::FullRecompute,
            epsilon: TWO_OPT_EPSILON,
            parallel: false,
            max_passes: None,
        }
    }
}

impl TwoOptConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.epsilon > 0.0 && self.epsilon.is_finite()) {
            return Err(PlannerError::invalid_config(format!(
                "2-opt epsilon must be strictly positive, got {}",
                self.epsilon
            )));
        }
        if self.max_passes == Some(0) {
            return Err(PlannerError::invalid_config("2-opt max_passes must be at least 1"));
        }
        Ok(())
    }
}

/// 2-Opt Local Search
///
/// Reverses runs of the visiting order to reduce total motion time.
pub struct TwoOptSearch {
    pub config: TwoOptConfig,
}

impl TwoOptSearch {
    pub fn new() -> Self {
        TwoOptSearch {
            config: TwoOptConfig::default(),
        }
    }

    pub fn with_config(config: TwoOptConfig) -> Self {
        TwoOptSearch { config }
    }

    pub fn best_improvement() -> Self {
        TwoOptSearch {
            config: TwoOptConfig {
                strategy: ImprovementStrategy::BestImprovement,
                ..Default::default()
            },
        }
    }

    /// Time of `tour` with `tour[i..j]` reversed.
    fn candidate_time(
        &self,
        ctx: ScanContext,
        tour: &[usize],
        current_time: f64,
        (i, j): (usize, usize),
        scratch: &mut Vec<usize>,
    ) -> f64 {
        match self.config.evaluation {
            MoveEvaluation::FullRecompute => {
                scratch.clear();
                scratch.extend_from_slice(tour);
                scratch[i..j].reverse();
                ctx.instance.route_cost(scratch, ctx.model)
            }
            MoveEvaluation::Delta => {
                current_time + two_opt_delta(ctx.instance, tour, i, j, ctx.model)
            }
        }
    }

    /// One scan applying every improving reversal on the spot.
    fn first_improvement_pass(&self, ctx: ScanContext, tour: &mut [usize], best_time: &mut f64) -> bool {
        let n = tour.len();
        let mut improved = false;
        let mut scratch = Vec::with_capacity(n);

        for i in 1..n - 1 {
            for j in i + 2..=n {
                let new_time = self.candidate_time(ctx, tour, *best_time, (i, j), &mut scratch);
                if new_time < *best_time - self.config.epsilon {
                    tour[i..j].reverse();
                    *best_time = new_time;
                    improved = true;
                }
            }
        }

        improved
    }

    /// Best improving reversal of `tour` as `(time, i, j)`; ties go to the
    /// smallest `(i, j)`.
    fn best_move(&self, ctx: ScanContext, tour: &[usize], best_time: f64) -> Option<(f64, usize, usize)> {
        let n = tour.len();
        let threshold = best_time - self.config.epsilon;
        let key = |&(t, i, j): &(f64, usize, usize)| (OrderedFloat(t), i, j);

        if self.config.parallel {
            (1..n - 1)
                .into_par_iter()
                .flat_map_iter(|i| (i + 2..=n).map(move |j| (i, j)))
                .map_init(
                    || Vec::with_capacity(n),
                    |scratch, (i, j)| {
                        (self.candidate_time(ctx, tour, best_time, (i, j), scratch), i, j)
                    },
                )
                .filter(|&(t, _, _)| t < threshold)
                .min_by_key(key)
        } else {
            let mut scratch = Vec::with_capacity(n);
            (1..n - 1)
                .flat_map(|i| (i + 2..=n).map(move |j| (i, j)))
                .map(|(i, j)| {
                    (self.candidate_time(ctx, tour, best_time, (i, j), &mut scratch), i, j)
                })
                .filter(|&(t, _, _)| t < threshold)
                .min_by_key(key)
        }
    }

    fn best_improvement_pass(&self, ctx: ScanContext, tour: &mut [usize], best_time: &mut f64) -> bool {
        match self.best_move(ctx, tour, *best_time) {
            Some((new_time, i, j)) => {
                tour[i..j].reverse();
                *best_time = new_time;
                true
            }
            None => false,
        }
    }
}

impl Default for TwoOptSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSearch for TwoOptSearch {
    fn improve(&self, instance: &PlanningInstance, solution: &mut Solution) -> bool {
        let n = solution.tour.len();
        if n < 2 {
            return false;
        }

        let start = std::time::Instant::now();
        let ctx = ScanContext {
            instance,
            model: solution.cost_model,
        };
        let initial_time = instance.route_cost(&solution.tour, ctx.model);
        let mut best_time = initial_time;
        let mut passes = 0;

        loop {
            if self.config.max_passes.is_some_and(|max| passes >= max) {
                log::debug!("{}: pass limit reached", self.name());
                break;
            }
            passes += 1;

            let improved = match self.config.strategy {
                ImprovementStrategy::FirstImprovement => {
                    self.first_improvement_pass(ctx, &mut solution.tour, &mut best_time)
                }
                ImprovementStrategy::BestImprovement => {
                    self.best_improvement_pass(ctx, &mut solution.tour, &mut best_time)
                }
            };
            log::debug!("{} pass {}: {:.6}s", self.name(), passes, best_time);

            if !improved {
                break;
            }
        }

        solution.validate(instance);
        solution.iterations = Some(passes);
        solution.computation_time += start.elapsed().as_secs_f64();

        solution.total_time < initial_time - self.config.epsilon
    }

    fn name(&self) -> &str {
        match self.config.strategy {
            ImprovementStrategy::FirstImprovement => "2-Opt-FI",
            ImprovementStrategy::BestImprovement => "2-Opt-BI",
        }
    }
}

/// Refine `tour` with the default first-improvement 2-opt and return the
/// locally optimal tour with its total time.
///
/// Tours with fewer than two targets are returned unchanged with time 0.
pub fn improve(instance: &PlanningInstance, tour: &[usize]) -> (Vec<usize>, f64) {
    if tour.len() < 2 {
        return (tour.to_vec(), 0.0);
    }
    let mut solution = Solution::from_tour(instance, tour.to_vec(), "2-Opt");
    TwoOptSearch::new().improve(instance, &mut solution);
    (solution.tour, solution.total_time)
}
