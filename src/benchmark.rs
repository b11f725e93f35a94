//! Benchmarking and experimentation module for die routes.
//!
//! Runs the heuristic line-up (and brute force on small instances) over a
//! set of job files, collects per-run results and aggregates statistics.

use crate::cost::CostModel;
use crate::error::Result;
use crate::exact::{BruteForceSolver, ExactConfig, ExactResult};
use crate::heuristics::construction::{ConstructionHeuristic, NearestNeighborHeuristic};
use crate::heuristics::local_search::{
    ImprovementStrategy, LocalSearch, MoveEvaluation, TwoOptConfig, TwoOptSearch,
};
use crate::instance::PlanningInstance;
use crate::solution::Solution;

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;

/// Result of running a single algorithm on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    /// Algorithm name
    pub algorithm: String,
    /// Instance name
    pub instance: String,
    /// Number of targets
    pub targets: usize,
    /// Route motion time in seconds
    pub total_time: f64,
    /// Computation time in seconds
    pub time: f64,
    /// Number of improvement passes (if applicable)
    pub iterations: Option<usize>,
    /// Gap to best known in percent (if available)
    pub gap_to_best: Option<f64>,
}

/// Aggregated statistics for an algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    /// Algorithm name
    pub algorithm: String,
    /// Number of instances solved
    pub num_instances: usize,
    /// Average route time
    pub avg_total_time: f64,
    /// Best route time
    pub best_total_time: f64,
    /// Worst route time
    pub worst_total_time: f64,
    /// Standard deviation of route time
    pub std_total_time: f64,
    /// Average computation time
    pub avg_time: f64,
    /// Summed computation time
    pub sum_time: f64,
    /// Average gap to best known
    pub avg_gap: Option<f64>,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Run brute force on instances with at most this many targets
    pub max_exact: usize,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
    /// Output directory
    pub output_dir: String,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            max_exact: 8,
            show_progress: true,
            output_dir: "results".to_string(),
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<AlgorithmResult>,
    best_known: HashMap<String, f64>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
            best_known: HashMap::new(),
        }
    }

    /// Set best known route time for an instance
    pub fn set_best_known(&mut self, instance_name: &str, total_time: f64) {
        self.best_known.insert(instance_name.to_string(), total_time);
    }

    /// Load best known route times from a JSON object of
    /// `{ "<instance name>": <seconds> }`. Returns how many were loaded.
    pub fn load_best_known<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let file = File::open(path)?;
        let known: BTreeMap<String, f64> = serde_json::from_reader(std::io::BufReader::new(file))?;
        for (name, total_time) in &known {
            self.set_best_known(name, *total_time);
        }
        Ok(known.len())
    }

    /// Run nearest neighbor and every 2-opt variant on top of it
    pub fn run_heuristics(&mut self, instance: &PlanningInstance) {
        let construction = NearestNeighborHeuristic::new();
        let start = std::time::Instant::now();
        let mut initial = construction.construct(instance);
        initial.computation_time = start.elapsed().as_secs_f64();
        self.record_result(instance, &initial);

        let searches: Vec<(&str, TwoOptSearch)> = vec![
            ("2-Opt-FI", TwoOptSearch::new()),
            (
                "2-Opt-BI-par",
                TwoOptSearch::with_config(TwoOptConfig {
                    strategy: ImprovementStrategy::BestImprovement,
                    parallel: true,
                    ..Default::default()
                }),
            ),
            (
                "2-Opt-FI-delta",
                TwoOptSearch::with_config(TwoOptConfig {
                    evaluation: MoveEvaluation::Delta,
                    ..Default::default()
                }),
            ),
        ];

        for (name, search) in searches {
            // improve() adds its own run time on top of the construction time
            let mut solution = initial.clone();
            search.improve(instance, &mut solution);
            solution.algorithm = format!("{}+{}", initial.algorithm, name);
            self.record_result(instance, &solution);
        }
    }

    /// Run brute force on an instance small enough for it
    pub fn run_exact(&mut self, instance: &PlanningInstance) -> Option<ExactResult> {
        if instance.dimension() > self.config.max_exact {
            log::debug!(
                "Skipping brute force on {} ({} targets > {})",
                instance.name,
                instance.dimension(),
                self.config.max_exact
            );
            return None;
        }

        let solver = BruteForceSolver::new(ExactConfig {
            cost_model: CostModel::Trapezoidal,
            max_targets: self.config.max_exact,
        });

        match solver.solve(instance) {
            Ok(result) => {
                self.best_known
                    .insert(instance.name.clone(), result.solution.total_time);
                self.record_result(instance, &result.solution);
                Some(result)
            }
            Err(e) => {
                log::error!("Brute force failed on {}: {}", instance.name, e);
                None
            }
        }
    }

    /// Run full benchmark on an instance
    pub fn run_full_benchmark(&mut self, instance: &PlanningInstance) {
        log::info!("Running benchmark on instance: {}", instance.name);

        // exact first so heuristic gaps are measured against it
        self.run_exact(instance);
        self.run_heuristics(instance);
    }

    /// Run benchmark on multiple instances
    pub fn run_on_instances(&mut self, instances: &[PlanningInstance]) {
        let progress = if self.config.show_progress {
            ProgressBar::new(instances.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}") {
            progress.set_style(style);
        }

        for instance in instances {
            progress.set_message(instance.name.clone());
            self.run_full_benchmark(instance);
            progress.inc(1);
        }
        progress.finish_with_message("done");

        self.fill_missing_gaps();
    }

    /// Instances without an exact result are compared to their best heuristic
    fn fill_missing_gaps(&mut self) {
        let mut best: HashMap<String, f64> = HashMap::new();
        for result in &self.results {
            if self.best_known.contains_key(&result.instance) {
                continue;
            }
            let entry = best.entry(result.instance.clone()).or_insert(f64::INFINITY);
            *entry = entry.min(result.total_time);
        }

        for result in &mut self.results {
            if result.gap_to_best.is_none() {
                if let Some(&reference) = best.get(&result.instance) {
                    result.gap_to_best = gap(result.total_time, reference);
                }
            }
        }
    }

    /// Record a result
    fn record_result(&mut self, instance: &PlanningInstance, solution: &Solution) {
        let gap_to_best = self
            .best_known
            .get(&instance.name)
            .and_then(|&best| gap(solution.total_time, best));

        self.results.push(AlgorithmResult {
            algorithm: solution.algorithm.clone(),
            instance: instance.name.clone(),
            targets: instance.dimension(),
            total_time: solution.total_time,
            time: solution.computation_time,
            iterations: solution.iterations,
            gap_to_best,
        });
    }

    /// Compute statistics for each algorithm
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut stats_map: BTreeMap<String, Vec<&AlgorithmResult>> = BTreeMap::new();

        for result in &self.results {
            stats_map
                .entry(result.algorithm.clone())
                .or_default()
                .push(result);
        }

        let mut statistics = Vec::new();

        for (algo, results) in stats_map {
            let totals: Vec<f64> = results.iter().map(|r| r.total_time).collect();
            let times: Vec<f64> = results.iter().map(|r| r.time).collect();
            let gaps: Vec<f64> = results.iter().filter_map(|r| r.gap_to_best).collect();

            let std_total_time = if totals.len() > 1 {
                totals.iter().std_dev()
            } else {
                0.0
            };

            statistics.push(AlgorithmStatistics {
                algorithm: algo,
                num_instances: results.len(),
                avg_total_time: totals.iter().mean(),
                best_total_time: totals.iter().fold(f64::INFINITY, |a, &b| a.min(b)),
                worst_total_time: totals.iter().fold(0.0, |a: f64, &b| a.max(b)),
                std_total_time,
                avg_time: times.iter().mean(),
                sum_time: times.iter().sum(),
                avg_gap: if gaps.is_empty() {
                    None
                } else {
                    Some(gaps.iter().mean())
                },
            });
        }

        statistics.sort_by(|a, b| a.avg_total_time.total_cmp(&b.avg_total_time));

        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Write results.csv, statistics.csv and report.txt into the output directory
    pub fn save_all(&self) -> Result<()> {
        let dir = Path::new(&self.config.output_dir);
        std::fs::create_dir_all(dir)?;
        self.export_to_csv(dir.join("results.csv"))?;
        self.export_statistics_csv(dir.join("statistics.csv"))?;
        std::fs::write(dir.join("report.txt"), self.generate_report())?;
        log::info!("Benchmark results written to {}", dir.display());
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("       Die Route Benchmark Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!(
            "Generated: {}\n\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));

        let stats = self.compute_statistics();

        report.push_str("Algorithm Performance Summary:\n");
        report.push_str("-".repeat(86).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<32} {:>9} {:>12} {:>12} {:>10} {:>8}\n",
            "Algorithm", "Instances", "Avg Time(s)", "Best Time(s)", "Avg Gap%", "CPU(s)"
        ));
        report.push_str("-".repeat(86).as_str());
        report.push('\n');

        for stat in &stats {
            let gap_str = stat
                .avg_gap
                .map(|g| format!("{:.2}%", g))
                .unwrap_or_else(|| "-".to_string());

            report.push_str(&format!(
                "{:<32} {:>9} {:>12.3} {:>12.3} {:>10} {:>8.4}\n",
                stat.algorithm,
                stat.num_instances,
                stat.avg_total_time,
                stat.best_total_time,
                gap_str,
                stat.avg_time
            ));
        }

        report.push_str("-".repeat(86).as_str());
        report.push('\n');

        report.push_str("\nBest Routes per Instance:\n");

        let mut instance_best: BTreeMap<&str, &AlgorithmResult> = BTreeMap::new();
        for result in &self.results {
            let entry = instance_best.entry(result.instance.as_str()).or_insert(result);
            if result.total_time < entry.total_time {
                *entry = result;
            }
        }

        for (instance, best) in &instance_best {
            report.push_str(&format!(
                "  {}: {:.3}s ({})\n",
                instance, best.total_time, best.algorithm
            ));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[AlgorithmResult] {
        &self.results
    }

    /// Get best known values
    pub fn best_known(&self) -> &HashMap<String, f64> {
        &self.best_known
    }
}

/// Relative gap in percent, undefined against a zero reference
fn gap(value: f64, reference: f64) -> Option<f64> {
    if reference > 0.0 {
        Some((value - reference) / reference * 100.0)
    } else {
        None
    }
}

/// Helper function to load job files from a directory
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Vec<PlanningInstance> {
    let mut instances = Vec::new();

    match std::fs::read_dir(dir.as_ref()) {
        Ok(entries) => {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().map(|e| e == "json").unwrap_or(false) {
                    match PlanningInstance::from_file(&path) {
                        Ok(instance) => instances.push(instance),
                        Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
                    }
                }
            }
        }
        Err(e) => log::warn!("Cannot read {}: {}", dir.as_ref().display(), e),
    }

    // Sort by size, then name for a stable order
    instances.sort_by(|a, b| {
        a.dimension()
            .cmp(&b.dimension())
            .then_with(|| a.name.cmp(&b.name))
    });

    instances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::SyntheticWafer;

    fn quiet_config() -> BenchmarkConfig {
        BenchmarkConfig {
            show_progress: false,
            ..Default::default()
        }
    }

    fn small_wafer(seed: u64) -> PlanningInstance {
        SyntheticWafer {
            rows: 2,
            cols: 3,
            circular: false,
            seed,
            ..Default::default()
        }
        .instance(&format!("wafer-{}", seed))
        .unwrap()
    }

    #[test]
    fn test_benchmark_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.max_exact, 8);
    }

    #[test]
    fn test_exact_bounds_heuristics() {
        let mut bench = Benchmark::new(quiet_config());
        bench.run_on_instances(&[small_wafer(1), small_wafer(2)]);

        // brute force plus nearest neighbor plus three 2-opt variants
        assert_eq!(bench.results().len(), 10);
        for result in bench.results() {
            let gap = result.gap_to_best.unwrap();
            assert!(gap >= -1e-9, "{} beat the optimum: {}", result.algorithm, gap);
        }

        let stats = bench.compute_statistics();
        assert_eq!(stats.len(), 5);
        assert!(stats.iter().all(|s| s.num_instances == 2));
        assert!(bench.generate_report().contains("Die Route Benchmark Report"));
    }

    #[test]
    fn test_gaps_without_exact() {
        let mut bench = Benchmark::new(BenchmarkConfig {
            max_exact: 0,
            ..quiet_config()
        });
        bench.run_on_instances(&[small_wafer(3)]);

        assert_eq!(bench.results().len(), 4);
        assert!(bench.best_known().is_empty());
        let best_gap = bench
            .results()
            .iter()
            .filter_map(|r| r.gap_to_best)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(best_gap, 0.0);
    }

    #[test]
    fn test_preset_best_known() {
        let instance = small_wafer(4);
        let path = std::env::temp_dir().join(format!("best_known_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "wafer-4": 1.0, "other": 2.5 }"#).unwrap();

        let mut bench = Benchmark::new(BenchmarkConfig {
            max_exact: 0,
            ..quiet_config()
        });
        assert_eq!(bench.load_best_known(&path).unwrap(), 2);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(bench.best_known().get("other"), Some(&2.5));

        bench.run_on_instances(&[instance]);
        for result in bench.results() {
            assert_eq!(result.gap_to_best, gap(result.total_time, 1.0));
        }
    }

    #[test]
    fn test_gap_zero_reference() {
        assert_eq!(gap(1.0, 0.0), None);
        assert_eq!(gap(1.5, 1.0), Some(50.0));
    }
}
