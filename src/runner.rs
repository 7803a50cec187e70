use std::{path::PathBuf, thread, time::Duration};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::{
    engine::Engine,
    scenario::{Scenario, ScheduledUpdate},
    snapshot::SnapshotWriter,
};

pub struct RunSettings {
    pub scenario_name: String,
    pub ticks: u64,
    /// Sleep between ticks; `None` runs as fast as possible.
    pub cadence: Option<Duration>,
    pub snapshot_interval_ticks: u64,
    pub snapshot_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunSummary {
    pub ticks_run: u64,
    pub final_population: u64,
    pub peak_population: u64,
    pub min_population: u64,
    pub extinct: bool,
    pub carrying_capacity: f64,
}

/// Headless driver: owns an engine and paces it through a fixed number of ticks.
pub struct Runner {
    engine: Engine,
    schedule: Vec<ScheduledUpdate>,
    next_update: usize,
    snapshots: SnapshotWriter,
    settings: RunSettings,
}

impl Runner {
    pub fn new(engine: Engine, mut schedule: Vec<ScheduledUpdate>, settings: RunSettings) -> Self {
        schedule.sort_by_key(|entry| entry.at_tick);
        Self {
            engine,
            schedule,
            next_update: 0,
            snapshots: SnapshotWriter::new(
                &settings.snapshot_dir,
                settings.snapshot_interval_ticks,
            ),
            settings,
        }
    }

    pub fn from_scenario(scenario: &Scenario, settings: RunSettings) -> Self {
        Self::new(scenario.build_engine(), scenario.schedule.clone(), settings)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn run(&mut self) -> Result<RunSummary> {
        self.run_with_hook(|_| {})
    }

    /// Activates the engine and advances until `ticks` have elapsed or the population dies
    /// out. `hook` sees the engine after every tick. The engine is left paused, also when
    /// the run fails.
    pub fn run_with_hook<F>(&mut self, hook: F) -> Result<RunSummary>
    where
        F: FnMut(&Engine),
    {
        info!(
            scenario = %self.settings.scenario_name,
            ticks = self.settings.ticks,
            "run started"
        );
        self.engine.set_active(true);
        let result = self.drive(hook);
        self.engine.set_active(false);
        let ticks_run = result?;

        let history = self.engine.state().summary();
        let summary = RunSummary {
            ticks_run,
            final_population: history.final_population,
            peak_population: history.peak_population,
            min_population: history.min_population,
            extinct: history.extinct,
            carrying_capacity: self.engine.carrying_capacity(),
        };
        info!(?summary, "run finished");
        Ok(summary)
    }

    fn drive<F>(&mut self, mut hook: F) -> Result<u64>
    where
        F: FnMut(&Engine),
    {
        let mut ticks_run = 0;
        while ticks_run < self.settings.ticks {
            self.apply_due_updates()?;
            if self.engine.advance_tick().is_none() {
                break;
            }
            ticks_run += 1;
            hook(&self.engine);
            self.snapshots
                .maybe_write(&self.engine, &self.settings.scenario_name)?;
            if !self.engine.is_active() {
                break;
            }
            if let Some(cadence) = self.settings.cadence {
                thread::sleep(cadence);
            }
        }
        Ok(ticks_run)
    }

    fn apply_due_updates(&mut self) -> Result<()> {
        let tick = self.engine.state().tick;
        while let Some(entry) = self.schedule.get(self.next_update) {
            if entry.at_tick > tick {
                break;
            }
            self.engine
                .configure(entry.update)
                .with_context(|| format!("scheduled update at tick {} failed", entry.at_tick))?;
            info!(tick, update = ?entry.update, "scheduled parameters applied");
            self.next_update += 1;
        }
        Ok(())
    }
}
