pub mod cohort;
pub mod engine;
pub mod params;
pub mod runner;
pub mod scenario;
pub mod snapshot;
pub mod state;
pub mod telemetry;
pub mod web;

pub use engine::{Engine, EngineError, EngineSnapshot, Phase};
pub use params::{ParameterUpdate, SimulationParameters};
pub use state::{HistoryPoint, SimulationState};
