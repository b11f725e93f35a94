//! Die Route Planner - Command Line Interface
//!
//! Plans the visiting order of dies for a stage + rotating camera platform.

use clap::{Parser, Subcommand, ValueEnum};
use die_route_planner::benchmark::{load_instances_from_dir, Benchmark, BenchmarkConfig};
use die_route_planner::cost::CostModel;
use die_route_planner::exact::{BruteForceSolver, ExactConfig};
use die_route_planner::heuristics::local_search::{ImprovementStrategy, MoveEvaluation};
use die_route_planner::instance::{PlanningInstance, SyntheticWafer};
use die_route_planner::visualization::{generate_comparison_data, Visualizer};
use die_route_planner::{PlannerConfig, Result, RoutePlanner};

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "die-route-planner")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "Time-optimal die visiting order for a stage + rotating camera")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Nearest neighbor + 2-opt on a job file
    Solve {
        /// Path to the job file
        #[arg(short, long)]
        input: PathBuf,

        /// Output report file (default derived from the input name)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Planner configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// 2-opt scan strategy
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,

        /// 2-opt move evaluation
        #[arg(long, value_enum)]
        evaluation: Option<Evaluation>,

        /// Score best-improvement moves in parallel
        #[arg(long)]
        parallel: bool,

        /// Write an SVG drawing of the route
        #[arg(long)]
        svg: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Brute-force optimum over every visiting order
    Exact {
        /// Path to the job file
        input: PathBuf,

        /// Output report file (default derived from the input name)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Metric the orders are ranked by
        #[arg(long, value_enum, default_value = "constant-velocity")]
        cost_model: CostModelArg,

        /// Refuse instances with more targets
        #[arg(long, default_value = "10")]
        max_targets: usize,
    },

    /// Compare the heuristic against the trapezoidal optimum
    Compare {
        /// Path to the job file
        #[arg(short, long)]
        input: PathBuf,

        /// Refuse brute force above this many targets
        #[arg(long, default_value = "10")]
        max_targets: usize,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the job file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Run benchmarks on a directory of job files
    Benchmark {
        /// Directory containing job files
        #[arg(short, long)]
        dir: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Run brute force up to this many targets
        #[arg(long, default_value = "8")]
        max_exact: usize,

        /// JSON object of best known route times per instance name
        #[arg(long)]
        best_known: Option<PathBuf>,
    },

    /// Write a synthetic wafer job file
    Generate {
        #[arg(long)]
        rows: usize,

        #[arg(long)]
        cols: usize,

        /// Die pitch
        #[arg(long, default_value = "10")]
        pitch: f64,

        /// Maximum die rotation in degrees
        #[arg(long, default_value = "5")]
        jitter: f64,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output job file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Strategy {
    /// Apply each improving move as soon as it is found
    First,
    /// Apply only the best move of each scan
    Best,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Evaluation {
    /// Re-time the whole candidate route
    Full,
    /// Re-time only the two changed edges
    Delta,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum CostModelArg {
    /// Straight-line length at stage velocity
    ConstantVelocity,
    /// Trapezoidal translation and rotation profiles
    Trapezoidal,
    /// Trapezoidal, never faster past the ramp distance
    MonotoneTrapezoidal,
}

impl From<CostModelArg> for CostModel {
    fn from(arg: CostModelArg) -> Self {
        match arg {
            CostModelArg::ConstantVelocity => CostModel::ConstantVelocity,
            CostModelArg::Trapezoidal => CostModel::Trapezoidal,
            CostModelArg::MonotoneTrapezoidal => CostModel::MonotoneTrapezoidal,
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    let verbose = matches!(cli.command, Commands::Solve { verbose: true, .. });
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if verbose { "debug" } else { "info" }),
    )
    .init();

    if let Err(e) = run(cli.command) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Solve {
            input,
            output,
            config,
            strategy,
            evaluation,
            parallel,
            svg,
            verbose,
        } => {
            let mut planner_config = match config {
                Some(path) => PlannerConfig::from_file(path)?,
                None => PlannerConfig::default(),
            };
            if let Some(strategy) = strategy {
                planner_config.two_opt.strategy = match strategy {
                    Strategy::First => ImprovementStrategy::FirstImprovement,
                    Strategy::Best => ImprovementStrategy::BestImprovement,
                };
            }
            if let Some(evaluation) = evaluation {
                planner_config.two_opt.evaluation = match evaluation {
                    Evaluation::Full => MoveEvaluation::FullRecompute,
                    Evaluation::Delta => MoveEvaluation::Delta,
                };
            }
            planner_config.two_opt.parallel |= parallel;

            solve_instance(&input, output, planner_config, svg, verbose)
        }

        Commands::Exact {
            input,
            output,
            cost_model,
            max_targets,
        } => solve_exact(
            &input,
            output,
            ExactConfig {
                cost_model: cost_model.into(),
                max_targets,
            },
        ),

        Commands::Compare { input, max_targets } => compare_algorithms(&input, max_targets),

        Commands::Analyze { input } => analyze_instance(&input),

        Commands::Benchmark {
            dir,
            output,
            max_exact,
            best_known,
        } => run_benchmark(&dir, &output, max_exact, best_known.as_deref()),

        Commands::Generate {
            rows,
            cols,
            pitch,
            jitter,
            seed,
            output,
        } => generate_instance(rows, cols, pitch, jitter, seed, &output),
    }
}

/// `Input_x.json` becomes `Output_x.json`; any other name gets an `_output` suffix.
fn default_output_path(input: &Path) -> PathBuf {
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if file_name.contains("Input_") {
        input.with_file_name(file_name.replace("Input_", "Output_"))
    } else {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "route".to_string());
        input.with_file_name(format!("{}_output.json", stem))
    }
}

fn solve_instance(
    path: &Path,
    output: Option<PathBuf>,
    config: PlannerConfig,
    svg: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let instance = PlanningInstance::from_file(path)?;
    if verbose {
        eprintln!("{}", instance.statistics());
    }

    let planner = RoutePlanner::new(config)?;
    let solution = planner.plan(&instance);

    if verbose {
        eprintln!("{}", solution);
    }

    let report = solution.report(&instance);
    println!("{}", report.to_json()?);

    let out_path = output.unwrap_or_else(|| default_output_path(path));
    report.save(&out_path)?;
    log::info!("Route saved to {:?}", out_path);

    if let Some(svg_path) = svg {
        let viz = Visualizer::new();
        viz.save_svg(&viz.generate_svg(&instance, &solution), &svg_path)?;
        log::info!("Visualization saved to {:?}", svg_path);
    }

    Ok(())
}

fn solve_exact(path: &Path, output: Option<PathBuf>, config: ExactConfig) -> Result<()> {
    let instance = PlanningInstance::from_file(path)?;
    let result = BruteForceSolver::new(config).solve(&instance)?;

    let report = result.solution.report(&instance);
    println!("{}", report.to_json()?);

    let out_path = output.unwrap_or_else(|| default_output_path(path));
    report.save(&out_path)?;
    log::info!(
        "Best order {:?} after {} permutations, saved to {:?}",
        result.solution.tour,
        result.permutations_evaluated,
        out_path
    );

    Ok(())
}

fn compare_algorithms(path: &Path, max_targets: usize) -> Result<()> {
    let instance = PlanningInstance::from_file(path)?;

    println!(
        "Comparing algorithms on {} (n={})...\n",
        instance.name,
        instance.dimension()
    );

    let heuristic = RoutePlanner::default().plan(&instance);
    let exact = BruteForceSolver::new(ExactConfig {
        cost_model: CostModel::Trapezoidal,
        max_targets,
    })
    .solve(&instance)?;

    println!("{:<32} {:>12} {:>12}", "Algorithm", "Time (s)", "CPU (s)");
    println!("{}", "-".repeat(58));
    for sol in [&heuristic, &exact.solution] {
        println!(
            "{:<32} {:>12.3} {:>12.4}",
            sol.algorithm, sol.total_time, sol.computation_time
        );
    }

    let optimum = exact.solution.total_time;
    if optimum > 0.0 {
        println!(
            "\nHeuristic gap: {:.2}%",
            (heuristic.total_time - optimum) / optimum * 100.0
        );
    } else {
        println!("\nHeuristic gap: -");
    }

    println!(
        "\n{}",
        generate_comparison_data(&[heuristic, exact.solution])
    );

    Ok(())
}

fn analyze_instance(path: &Path) -> Result<()> {
    let instance = PlanningInstance::from_file(path)?;

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    let solution = RoutePlanner::default().plan(&instance);
    println!("Quick Route Estimate:");
    println!(
        "  {}: {:.3}s ({} passes)",
        solution.algorithm,
        solution.total_time,
        solution.iterations.unwrap_or(0)
    );

    Ok(())
}

fn run_benchmark(
    dir: &Path,
    output: &Path,
    max_exact: usize,
    best_known: Option<&Path>,
) -> Result<()> {
    log::info!("Loading instances from {:?}...", dir);

    let instances = load_instances_from_dir(dir);
    if instances.is_empty() {
        log::warn!("No instances found!");
        return Ok(());
    }
    log::info!("Found {} instances", instances.len());

    let mut benchmark = Benchmark::new(BenchmarkConfig {
        max_exact,
        output_dir: output.to_string_lossy().to_string(),
        ..Default::default()
    });
    if let Some(path) = best_known {
        let count = benchmark.load_best_known(path)?;
        log::info!("Loaded {} best known times from {:?}", count, path);
    }
    benchmark.run_on_instances(&instances);
    benchmark.save_all()?;

    println!("\n{}", benchmark.generate_report());
    Ok(())
}

fn generate_instance(
    rows: usize,
    cols: usize,
    pitch: f64,
    jitter: f64,
    seed: u64,
    output: &Path,
) -> Result<()> {
    let wafer = SyntheticWafer {
        rows,
        cols,
        pitch,
        die_size: pitch * 0.8,
        angle_jitter: jitter,
        seed,
        ..Default::default()
    };
    let file = wafer.generate();
    std::fs::write(output, serde_json::to_string_pretty(&file)?)?;
    log::info!("Wrote {} dies to {:?}", file.dies.len(), output);
    Ok(())
}
