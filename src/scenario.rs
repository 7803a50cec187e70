use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{
    engine::Engine,
    params::{ParameterUpdate, SimulationParameters},
};

fn default_cadence_ms() -> u64 {
    500
}

fn default_snapshot_interval_ticks() -> u64 {
    0
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub params: SimulationParameters,
    #[serde(default)]
    pub ticks: Option<u64>,
    #[serde(default = "default_cadence_ms")]
    pub cadence_ms: u64,
    #[serde(default = "default_snapshot_interval_ticks")]
    pub snapshot_interval_ticks: u64,
    #[serde(default)]
    pub schedule: Vec<ScheduledUpdate>,
}

/// Parameter change applied just before the engine advances past `at_tick`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduledUpdate {
    pub at_tick: u64,
    pub update: ParameterUpdate,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let mut scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario.schedule.sort_by_key(|entry| entry.at_tick);
        Ok(scenario)
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: "default".into(),
            description: None,
            params: SimulationParameters::default(),
            ticks: None,
            cadence_ms: default_cadence_ms(),
            snapshot_interval_ticks: default_snapshot_interval_ticks(),
            schedule: Vec::new(),
        }
    }
}

impl Scenario {
    pub fn build_engine(&self) -> Engine {
        Engine::new(self.params)
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.or(self.ticks).unwrap_or(200)
    }

    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms)
    }
}
