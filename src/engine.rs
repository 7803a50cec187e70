use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cohort::{PopulationByAge, DEFAULT_MAX_AGE};
use crate::params::{ParameterUpdate, SimulationParameters};
use crate::state::{HistoryPoint, SimulationState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("reset rejected while the simulation is running; pause it first")]
    ResetWhileRunningRejected,
    #[error("starting population can only change while the simulation is paused")]
    StartingPopulationLocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Inactive,
    Active,
}

/// Logistic growth engine.
///
/// Owns its parameters and state; every mutation goes through the methods below. The engine
/// has no clock: whoever drives it decides when `advance_tick` is called.
#[derive(Debug, Clone)]
pub struct Engine {
    params: SimulationParameters,
    state: SimulationState,
    active: bool,
    cohorts: PopulationByAge,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(SimulationParameters::default())
    }
}

impl Engine {
    pub fn new(params: SimulationParameters) -> Self {
        Self {
            state: SimulationState::seeded(params.starting_population),
            cohorts: seed_cohorts(&params),
            params,
            active: false,
        }
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn cohorts(&self) -> &PopulationByAge {
        &self.cohorts
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn phase(&self) -> Phase {
        if self.active {
            Phase::Active
        } else {
            Phase::Inactive
        }
    }

    /// Applies a partial parameter update.
    ///
    /// Rate changes take effect on the next tick, running or not. A new starting population
    /// is only accepted while paused and reseeds the whole state; while running the update
    /// is refused as a whole.
    pub fn configure(&mut self, update: ParameterUpdate) -> Result<(), EngineError> {
        let new_start = update.changes_starting_population(&self.params);
        if new_start.is_some() && self.active {
            warn!(
                tick = self.state.tick,
                "starting population change refused while running"
            );
            return Err(EngineError::StartingPopulationLocked);
        }

        self.params = update.apply_to(&self.params);
        debug!(params = ?self.params, "parameters updated");

        if new_start.is_some() {
            self.reset()?;
        }
        Ok(())
    }

    pub fn reset(&mut self) -> Result<(), EngineError> {
        if self.active {
            warn!(tick = self.state.tick, "reset refused while running");
            return Err(EngineError::ResetWhileRunningRejected);
        }
        self.state = SimulationState::seeded(self.params.starting_population);
        self.cohorts = seed_cohorts(&self.params);
        info!(
            starting_population = self.params.starting_population,
            "simulation reset"
        );
        Ok(())
    }

    pub fn set_active(&mut self, active: bool) {
        if self.active != active {
            info!(tick = self.state.tick, active, "simulation toggled");
        }
        self.active = active;
    }

    /// Runs one step of the recurrence. Returns the recorded point, or `None` when paused.
    pub fn advance_tick(&mut self) -> Option<HistoryPoint> {
        if !self.active {
            return None;
        }

        let SimulationParameters {
            replication_chance,
            death_chance,
            crowding_coefficient,
            ..
        } = self.params;
        let population = self.state.population;

        let growth_rate = replication_chance - death_chance - crowding_coefficient * population;
        let population_change = growth_rate * population;
        let next = (population + population_change).round().max(0.0);
        let delta = next - population;

        self.state.record(next, delta);
        let point = *self.state.latest();
        debug!(
            tick = point.tick,
            population = point.population,
            delta,
            growth_rate,
            "tick advanced"
        );

        if next == 0.0 {
            self.active = false;
            info!(tick = point.tick, "population extinct; simulation paused");
        }
        Some(point)
    }

    /// Equilibrium population where the growth rate is zero.
    ///
    /// Zero when deaths match or exceed births. A zero crowding coefficient gives an
    /// infinite result, which is passed through.
    pub fn carrying_capacity(&self) -> f64 {
        let net = self.params.net_rate();
        if net <= 0.0 {
            return 0.0;
        }
        (net / self.params.crowding_coefficient).round()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            params: self.params,
            phase: self.phase(),
            tick: self.state.tick,
            population: self.state.rounded_population(),
            carrying_capacity: finite_or_none(self.carrying_capacity()),
            history: self.state.history.clone(),
        }
    }
}

fn seed_cohorts(params: &SimulationParameters) -> PopulationByAge {
    PopulationByAge::even(params.starting_population, DEFAULT_MAX_AGE)
        .with_flat_rates(params.replication_chance, params.death_chance)
}

fn finite_or_none(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Read-only view handed to drivers. JSON has no infinity, so a degenerate carrying
/// capacity is reported as `null`.
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub params: SimulationParameters,
    pub phase: Phase,
    pub tick: u64,
    pub population: u64,
    pub carrying_capacity: Option<f64>,
    pub history: Vec<HistoryPoint>,
}
