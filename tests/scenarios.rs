use std::path::PathBuf;

use logistic_sim::{
    runner::{RunSettings, Runner},
    scenario::{Scenario, ScenarioLoader},
};

fn scenario_loader() -> ScenarioLoader {
    ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
}

fn load(name: &str) -> Scenario {
    scenario_loader()
        .load(PathBuf::from("scenarios").join(format!("{name}.yaml")))
        .expect("scenario parses")
}

fn headless(scenario: &Scenario) -> Runner {
    let settings = RunSettings {
        scenario_name: scenario.name.clone(),
        ticks: scenario.ticks(None),
        cadence: None,
        snapshot_interval_ticks: 0,
        snapshot_dir: PathBuf::from("snapshots_scenario_tests"),
    };
    Runner::from_scenario(scenario, settings)
}

#[test]
fn scenario_loader_reads_fixture() {
    let scenario = load("reference");
    assert_eq!(scenario.name, "reference");
    assert_eq!(scenario.params.starting_population, 100);
    assert_eq!(scenario.ticks(None), 200);
    assert_eq!(scenario.snapshot_interval_ticks, 50);
}

#[test]
fn missing_scenario_reports_path() {
    let err = scenario_loader()
        .load("scenarios/does_not_exist.yaml")
        .expect_err("missing file fails");
    assert!(err.to_string().contains("does_not_exist.yaml"));
}

#[test]
fn reference_run_settles_near_carrying_capacity() {
    let scenario = load("reference");
    let mut runner = headless(&scenario);
    let summary = runner.run().expect("run succeeds");

    assert_eq!(summary.carrying_capacity, 50.0);
    assert_eq!(summary.ticks_run, 200);
    assert!(!summary.extinct);
    assert!(
        summary.final_population.abs_diff(50) <= 10,
        "population {} should settle near 50",
        summary.final_population
    );

    let history = &runner.engine().state().history;
    for pair in history.windows(2) {
        assert!(
            pair[1].population <= pair[0].population,
            "population above capacity should never grow ({} -> {})",
            pair[0].population,
            pair[1].population
        );
    }
}

#[test]
fn decline_scenario_shrinks_without_capacity() {
    let scenario = load("decline");
    let mut runner = headless(&scenario);
    let summary = runner.run().expect("run succeeds");

    assert_eq!(summary.carrying_capacity, 0.0);
    assert_eq!(summary.peak_population, 50);
    assert!(summary.final_population < 10);

    let history = &runner.engine().state().history;
    assert!(history
        .windows(2)
        .all(|pair| pair[1].population <= pair[0].population));
    assert!(history.iter().all(|point| point.delta <= 0.0));
}

#[test]
fn collapse_scenario_goes_extinct_after_shock() {
    let scenario = load("collapse");
    let mut runner = headless(&scenario);
    let summary = runner.run().expect("run succeeds");

    assert!(summary.extinct);
    assert!(summary.peak_population >= 290);
    assert!(summary.ticks_run > 30 && summary.ticks_run < 60);
    assert_eq!(summary.final_population, 0);

    let engine = runner.engine();
    assert!(!engine.is_active());
    assert_eq!(engine.params().death_chance, 0.5);
    assert_eq!(engine.state().tick, summary.ticks_run);
}
