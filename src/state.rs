use serde::{Deserialize, Serialize};

/// One sample of the population time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub tick: u64,
    pub population: u64,
    pub delta: f64,
}

/// Population, elapsed ticks and the recorded series.
///
/// `history` always holds the tick-0 seed point and `history[i].tick == i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub population: f64,
    pub tick: u64,
    pub history: Vec<HistoryPoint>,
}

impl SimulationState {
    pub fn seeded(starting_population: u64) -> Self {
        Self {
            population: starting_population as f64,
            tick: 0,
            history: vec![HistoryPoint {
                tick: 0,
                population: starting_population,
                delta: 0.0,
            }],
        }
    }

    /// Population as it is displayed.
    pub fn rounded_population(&self) -> u64 {
        self.population.round().max(0.0) as u64
    }

    pub(crate) fn record(&mut self, population: f64, delta: f64) {
        self.tick += 1;
        self.history.push(HistoryPoint {
            tick: self.tick,
            population: population as u64,
            delta,
        });
        self.population = population;
    }

    pub fn latest(&self) -> &HistoryPoint {
        // seeded() guarantees at least one point
        &self.history[self.history.len() - 1]
    }

    pub fn summary(&self) -> HistorySummary {
        let mut peak = 0;
        let mut min = u64::MAX;
        for point in &self.history {
            peak = peak.max(point.population);
            min = min.min(point.population);
        }
        HistorySummary {
            ticks: self.tick,
            final_population: self.latest().population,
            peak_population: peak,
            min_population: min,
            extinct: self.latest().population == 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub ticks: u64,
    pub final_population: u64,
    pub peak_population: u64,
    pub min_population: u64,
    pub extinct: bool,
}
