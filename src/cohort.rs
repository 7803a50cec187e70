//! Age-structured population model.
//!
//! The engine keeps a [`PopulationByAge`] alongside its scalar state and reseeds it on every
//! reset, but the logistic recurrence never reads it. [`PopulationByAge::step`] is a
//! standalone aging step for callers that want to experiment with cohorts.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_AGE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgeGroup {
    pub age: u32,
    pub count: u64,
    /// Offspring per individual per step.
    pub fertility: f64,
    /// Fraction of the group lost per step.
    pub mortality: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationByAge {
    groups: Vec<AgeGroup>,
}

impl PopulationByAge {
    /// Spreads `total` evenly over ages `0..=max_age`. The remainder of the integer split
    /// goes to the youngest ages, one each, so the total is preserved.
    pub fn even(total: u64, max_age: u32) -> Self {
        let slots = max_age as u64 + 1;
        let base = total / slots;
        let remainder = total % slots;
        let groups = (0..=max_age)
            .map(|age| AgeGroup {
                age,
                count: base + u64::from((age as u64) < remainder),
                fertility: 0.0,
                mortality: 0.0,
            })
            .collect();
        Self { groups }
    }

    /// Applies the same fertility and mortality to every age.
    pub fn with_flat_rates(mut self, fertility: f64, mortality: f64) -> Self {
        for group in &mut self.groups {
            group.fertility = fertility;
            group.mortality = mortality;
        }
        self
    }

    /// Sets per-age rates from a schedule function of age.
    pub fn with_schedule(mut self, schedule: impl Fn(u32) -> (f64, f64)) -> Self {
        for group in &mut self.groups {
            let (fertility, mortality) = schedule(group.age);
            group.fertility = fertility;
            group.mortality = mortality;
        }
        self
    }

    pub fn groups(&self) -> &[AgeGroup] {
        &self.groups
    }

    pub fn max_age(&self) -> u32 {
        self.groups.last().map(|group| group.age).unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.groups
            .iter()
            .map(|group| group.count)
            .fold(0u64, u64::saturating_add)
    }

    /// Advances every cohort by one age step.
    ///
    /// Births from all groups enter age 0, survivors of age `a` move to `a + 1`, and
    /// survivors of the oldest group leave the model. Rates stay attached to the age slot.
    pub fn step(&self) -> Self {
        let births = self
            .groups
            .iter()
            .map(|group| scaled(group.count, group.fertility))
            .fold(0u64, u64::saturating_add);

        let mut next = self.clone();
        for group in &mut next.groups {
            group.count = 0;
        }
        if let Some(youngest) = next.groups.first_mut() {
            youngest.count = births;
        }
        for (index, group) in self.groups.iter().enumerate() {
            let deaths = scaled(group.count, group.mortality).min(group.count);
            if let Some(older) = next.groups.get_mut(index + 1) {
                older.count = group.count - deaths;
            }
        }
        next
    }
}

fn scaled(count: u64, rate: f64) -> u64 {
    (count as f64 * rate).round().max(0.0) as u64
}
