use serde::{Deserialize, Serialize};

fn default_starting_population() -> u64 {
    100
}

fn default_replication_chance() -> f64 {
    0.1
}

fn default_death_chance() -> f64 {
    0.05
}

fn default_crowding_coefficient() -> f64 {
    0.001
}

/// Inputs to the logistic recurrence.
///
/// The engine accepts any value here. The UI ranges are `replication_chance` and
/// `death_chance` in `[0, 0.5]` and `crowding_coefficient` in `[0, 0.01]`, but clamping
/// them is the driver's job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    #[serde(default = "default_starting_population")]
    pub starting_population: u64,
    #[serde(default = "default_replication_chance")]
    pub replication_chance: f64,
    #[serde(default = "default_death_chance")]
    pub death_chance: f64,
    #[serde(default = "default_crowding_coefficient")]
    pub crowding_coefficient: f64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            starting_population: default_starting_population(),
            replication_chance: default_replication_chance(),
            death_chance: default_death_chance(),
            crowding_coefficient: default_crowding_coefficient(),
        }
    }
}

impl SimulationParameters {
    /// Net per-capita growth with crowding ignored.
    pub fn net_rate(&self) -> f64 {
        self.replication_chance - self.death_chance
    }
}

/// Partial form of [`SimulationParameters`]; `None` fields are left as they are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_population: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_chance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_chance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crowding_coefficient: Option<f64>,
}

impl ParameterUpdate {
    pub fn starting_population(mut self, value: u64) -> Self {
        self.starting_population = Some(value);
        self
    }

    pub fn replication_chance(mut self, value: f64) -> Self {
        self.replication_chance = Some(value);
        self
    }

    pub fn death_chance(mut self, value: f64) -> Self {
        self.death_chance = Some(value);
        self
    }

    pub fn crowding_coefficient(mut self, value: f64) -> Self {
        self.crowding_coefficient = Some(value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.starting_population.is_none()
            && self.replication_chance.is_none()
            && self.death_chance.is_none()
            && self.crowding_coefficient.is_none()
    }

    /// Returns the new starting population if this update would actually change it.
    pub fn changes_starting_population(&self, current: &SimulationParameters) -> Option<u64> {
        self.starting_population
            .filter(|value| *value != current.starting_population)
    }

    /// Overwrites every field that is set. Returns the merged parameters.
    pub fn apply_to(&self, params: &SimulationParameters) -> SimulationParameters {
        SimulationParameters {
            starting_population: self
                .starting_population
                .unwrap_or(params.starting_population),
            replication_chance: self
                .replication_chance
                .unwrap_or(params.replication_chance),
            death_chance: self.death_chance.unwrap_or(params.death_chance),
            crowding_coefficient: self
                .crowding_coefficient
                .unwrap_or(params.crowding_coefficient),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let params = SimulationParameters::default();
        assert_eq!(params.starting_population, 100);
        assert_eq!(params.replication_chance, 0.1);
        assert_eq!(params.death_chance, 0.05);
        assert_eq!(params.crowding_coefficient, 0.001);
    }

    #[test]
    fn partial_update_keeps_unset_fields() {
        let params = SimulationParameters::default();
        let merged = ParameterUpdate::default().death_chance(0.2).apply_to(&params);
        assert_eq!(merged.death_chance, 0.2);
        assert_eq!(merged.replication_chance, params.replication_chance);
        assert_eq!(merged.starting_population, params.starting_population);
    }

    #[test]
    fn same_starting_population_is_not_a_change() {
        let params = SimulationParameters::default();
        let update = ParameterUpdate::default().starting_population(100);
        assert_eq!(update.changes_starting_population(&params), None);
        let update = ParameterUpdate::default().starting_population(250);
        assert_eq!(update.changes_starting_population(&params), Some(250));
    }

    #[test]
    fn yaml_fills_missing_fields_with_defaults() {
        let params: SimulationParameters =
            serde_yaml::from_str("death_chance: 0.3\n").expect("parameters parse");
        assert_eq!(params.death_chance, 0.3);
        assert_eq!(params.starting_population, 100);
    }
}
