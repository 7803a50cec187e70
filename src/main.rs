use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use logistic_sim::{
    params::ParameterUpdate,
    runner::{RunSettings, Runner},
    scenario::{Scenario, ScenarioLoader},
    telemetry,
    web::{self, WebServerConfig},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Logistic population growth simulator")]
struct Cli {
    /// Default log level for this crate (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a scenario headlessly and print a summary
    Run(RunArgs),
    /// Serve the interactive web front end
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
struct ScenarioArgs {
    /// Path to a scenario YAML file; built-in defaults when omitted
    #[arg(long)]
    scenario: Option<PathBuf>,

    #[arg(long)]
    starting_population: Option<u64>,

    #[arg(long)]
    replication_chance: Option<f64>,

    #[arg(long)]
    death_chance: Option<f64>,

    #[arg(long)]
    crowding_coefficient: Option<f64>,

    /// Override the milliseconds between ticks
    #[arg(long)]
    cadence_ms: Option<u64>,
}

impl ScenarioArgs {
    fn load(&self) -> Result<Scenario> {
        let mut scenario = match &self.scenario {
            Some(path) => ScenarioLoader::new(".").load(path)?,
            None => Scenario::default(),
        };
        let overrides = ParameterUpdate {
            starting_population: self.starting_population,
            replication_chance: self.replication_chance,
            death_chance: self.death_chance,
            crowding_coefficient: self.crowding_coefficient,
        };
        scenario.params = overrides.apply_to(&scenario.params);
        if let Some(cadence_ms) = self.cadence_ms {
            scenario.cadence_ms = cadence_ms;
        }
        Ok(scenario)
    }
}

#[derive(Debug, Args)]
struct RunArgs {
    #[command(flatten)]
    scenario: ScenarioArgs,

    /// Override tick count (uses scenario default when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Sleep for the scenario cadence between ticks instead of running flat out
    #[arg(long)]
    paced: bool,

    /// Override snapshot interval in ticks (0 disables)
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Print every history point after the run
    #[arg(long)]
    print_history: bool,
}

#[derive(Debug, Args)]
struct ServeArgs {
    #[command(flatten)]
    scenario: ScenarioArgs,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 8080)]
    port: u16,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(&cli.log_level)?;
    match cli.command {
        Command::Run(args) => run(args),
        Command::Serve(args) => serve(args),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let scenario = args.scenario.load()?;
    let settings = RunSettings {
        scenario_name: scenario.name.clone(),
        ticks: scenario.ticks(args.ticks),
        cadence: args.paced.then(|| scenario.cadence()),
        snapshot_interval_ticks: args
            .snapshot_interval
            .unwrap_or(scenario.snapshot_interval_ticks),
        snapshot_dir: args
            .snapshot_dir
            .unwrap_or_else(|| PathBuf::from("snapshots")),
    };

    let mut runner = Runner::from_scenario(&scenario, settings);
    let summary = runner.run()?;

    if args.print_history {
        println!("tick,population,delta");
        for point in &runner.engine().state().history {
            println!("{},{},{}", point.tick, point.population, point.delta);
        }
    }
    println!(
        "Scenario '{}' ran {} ticks. Final population: {} (peak {}, min {}), carrying capacity: {}{}",
        scenario.name,
        summary.ticks_run,
        summary.final_population,
        summary.peak_population,
        summary.min_population,
        summary.carrying_capacity,
        if summary.extinct { ", extinct" } else { "" }
    );
    Ok(())
}

fn serve(args: ServeArgs) -> Result<()> {
    let scenario = args.scenario.load()?;
    let config = WebServerConfig {
        engine: scenario.build_engine(),
        cadence: Duration::from_millis(scenario.cadence_ms.max(1)),
        host: args.host,
        port: args.port,
    };
    tokio::runtime::Runtime::new()?.block_on(web::run(config))
}
