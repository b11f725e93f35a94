use die_route_planner::cost::CostModel;
use die_route_planner::exact::{BruteForceSolver, ExactConfig};
use die_route_planner::heuristics::construction::build_greedy_tour;
use die_route_planner::heuristics::local_search::improve;
use die_route_planner::instance::{PlanningInstance, Position, SyntheticWafer};
use die_route_planner::solution::{is_permutation, RouteReport};
use die_route_planner::{PlannerError, RoutePlanner};
use proptest::prelude::*;

const TWO_DIES: &str = r#"{
    "InitialPosition": [0.0, 0.0],
    "InitialAngle": 0.0,
    "StageVelocity": 10.0,
    "StageAcceleration": 100.0,
    "CameraVelocity": 90.0,
    "CameraAcceleration": 1000.0,
    "Dies": [
        { "Corners": [[9, -1], [11, -1], [11, 1], [9, 1]] },
        { "Corners": [[9, 9], [11, 9], [11, 11], [9, 11]] }
    ]
}"#;

#[test]
fn two_dies_scenario() {
    let instance = PlanningInstance::from_json_str("two-dies", TWO_DIES).unwrap();

    assert_eq!(instance.segment_time(0, 1), 1.0);
    assert_eq!(build_greedy_tour(&instance), vec![0, 1]);

    let solution = RoutePlanner::default().plan(&instance);
    assert_eq!(solution.tour, vec![0, 1]);
    assert_eq!(solution.total_time, 2.0);

    let report = solution.report(&instance);
    assert_eq!(report.total_time, 2.0);
    assert_eq!(
        report.path,
        vec![
            Position::new(0.0, 0.0),
            Position::new(10.0, 0.0),
            Position::new(10.0, 10.0)
        ]
    );
}

#[test]
fn report_file_layout() {
    let instance = PlanningInstance::from_json_str("two-dies", TWO_DIES).unwrap();
    let report = RoutePlanner::default().plan(&instance).report(&instance);

    let path = std::env::temp_dir().join(format!("Output_two_dies_{}.json", std::process::id()));
    report.save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["TotalTime"], serde_json::json!(2.0));
    assert_eq!(
        value["Path"],
        serde_json::json!([[0.0, 0.0], [10.0, 0.0], [10.0, 10.0]])
    );

    let back: RouteReport = serde_json::from_str(&text).unwrap();
    assert_eq!(back, report);
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn exact_defaults_to_path_length() {
    let instance = PlanningInstance::from_json_str("two-dies", TWO_DIES).unwrap();
    let result = BruteForceSolver::default().solve(&instance).unwrap();

    assert_eq!(result.solution.tour, vec![0, 1]);
    assert_eq!(result.objective, 20.0);
    assert_eq!(result.solution.total_time, 2.0);
    assert_eq!(result.solution.cost_model, CostModel::ConstantVelocity);
}

#[test]
fn improve_leaves_short_tours_alone() {
    let instance = PlanningInstance::from_json_str("two-dies", TWO_DIES).unwrap();
    assert_eq!(improve(&instance, &[]), (vec![], 0.0));
    assert_eq!(improve(&instance, &[1]), (vec![1], 0.0));
}

#[test]
fn schema_errors_fail_fast() {
    let missing_dies = r#"{ "InitialPosition": [0, 0], "StageVelocity": 10 }"#;
    assert!(matches!(
        PlanningInstance::from_json_str("bad", missing_dies),
        Err(PlannerError::Schema(_))
    ));

    let short_die = TWO_DIES.replace("[[9, -1], [11, -1], [11, 1], [9, 1]]", "[[9, -1]]");
    assert!(matches!(
        PlanningInstance::from_json_str("bad", &short_die),
        Err(PlannerError::Schema(_))
    ));
}

fn wafer(rows: usize, cols: usize, seed: u64) -> PlanningInstance {
    SyntheticWafer {
        rows,
        cols,
        circular: false,
        seed,
        ..Default::default()
    }
    .instance("wafer")
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn planned_route_is_complete(rows in 1usize..5, cols in 1usize..5, seed in any::<u64>()) {
        let instance = wafer(rows, cols, seed);
        let n = instance.dimension();

        let greedy_time = instance.tour_time(&build_greedy_tour(&instance));
        let solution = RoutePlanner::default().plan(&instance);

        prop_assert!(is_permutation(&solution.tour, n));
        prop_assert_eq!(solution.report(&instance).path.len(), n + 1);
        prop_assert!(solution.total_time <= greedy_time + 1e-9);
    }

    #[test]
    fn trapezoidal_optimum_bounds_heuristic(rows in 1usize..3, cols in 1usize..4, seed in any::<u64>()) {
        let instance = wafer(rows, cols, seed);

        let heuristic = RoutePlanner::default().plan(&instance);
        let exact = BruteForceSolver::new(ExactConfig {
            cost_model: CostModel::Trapezoidal,
            ..Default::default()
        })
        .solve(&instance)
        .unwrap();

        prop_assert!(exact.solution.total_time <= heuristic.total_time + 1e-9);
    }
}
