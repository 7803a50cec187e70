use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::engine::{Engine, EngineSnapshot};

#[derive(Serialize)]
struct SnapshotFile<'a> {
    scenario: &'a str,
    written_at: DateTime<Utc>,
    #[serde(flatten)]
    snapshot: EngineSnapshot,
}

/// Periodic JSON dumps of the engine. Output only; nothing reads them back.
pub struct SnapshotWriter {
    dir: PathBuf,
    interval: u64,
}

impl SnapshotWriter {
    pub fn new(dir: impl AsRef<Path>, interval: u64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            interval,
        }
    }

    pub fn maybe_write(&self, engine: &Engine, scenario_name: &str) -> Result<Option<PathBuf>> {
        let tick = engine.state().tick;
        if self.interval == 0 || tick % self.interval != 0 {
            return Ok(None);
        }
        self.write(engine, scenario_name).map(Some)
    }

    pub fn write(&self, engine: &Engine, scenario_name: &str) -> Result<PathBuf> {
        let tick = engine.state().tick;
        let dir = self.dir.join(scenario_name);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create snapshot dir {}", dir.display()))?;
        let path = dir.join(format!("tick_{tick:06}.json"));
        let file = SnapshotFile {
            scenario: scenario_name,
            written_at: Utc::now(),
            snapshot: engine.snapshot(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        debug!(tick, path = %path.display(), "snapshot written");
        Ok(path)
    }
}
