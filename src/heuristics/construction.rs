use crate::cost;
use crate::instance::PlanningInstance;
use crate::solution::Solution;
use ordered_float::OrderedFloat;

pub trait ConstructionHeuristic {
    fn construct(&self, instance: &PlanningInstance) -> Solution;
    fn name(&self) -> &str;
}

/// Nearest Neighbor Heuristic
///
/// Builds a tour by repeatedly moving to the unvisited target that is
/// cheapest to reach from the current pose, measured in motion time.
/// Ties go to the lowest target index. O(n²).
pub struct NearestNeighborHeuristic;

impl NearestNeighborHeuristic {
    pub fn new() -> Self {
        NearestNeighborHeuristic
    }
}

impl Default for NearestNeighborHeuristic {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for NearestNeighborHeuristic {
    fn construct(&self, instance: &PlanningInstance) -> Solution {
        let start = std::time::Instant::now();

        let tour = build_greedy_tour(instance);

        let mut solution = Solution::from_tour(instance, tour, self.name());
        solution.computation_time = start.elapsed().as_secs_f64();
        log::debug!(
            "{}: {} targets, {:.3}s",
            self.name(),
            instance.dimension(),
            solution.total_time
        );
        solution
    }

    fn name(&self) -> &str {
        "NearestNeighbor"
    }
}

/// Greedy nearest-neighbor order starting from the instance's start pose.
pub fn build_greedy_tour(instance: &PlanningInstance) -> Vec<usize> {
    // Kept in ascending index order so the first minimum is the lowest index.
    let mut unvisited: Vec<usize> = (0..instance.dimension()).collect();
    let mut tour = Vec::with_capacity(unvisited.len());
    let mut current = instance.start;

    while let Some((slot, next)) = unvisited
        .iter()
        .enumerate()
        .min_by_key(|&(_, &idx)| {
            OrderedFloat(cost::segment_time(&current, &instance.pose(idx), &instance.limits))
        })
        .map(|(slot, &idx)| (slot, idx))
    {
        tour.push(next);
        current = instance.pose(next);
        unvisited.remove(slot);
    }

    tour
}
