//! JSON exporter for finished runs.

use roundnet_core::{Participant, RoundRecord};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// Complete record of one scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Every round record produced, across resets, in play order
    pub rounds: Vec<RoundRecord>,

    /// Lobby at the end of the run, most senior first
    pub lobby: Vec<Participant>,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl RunExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            rounds: Vec::new(),
            lobby: Vec::new(),
            passed: false,
            failure_reason: None,
        }
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
