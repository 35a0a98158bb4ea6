mod state_machine;

pub use state_machine::{AnalysisSettings, AnalysisState, Orchestrator};
