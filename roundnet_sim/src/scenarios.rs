//! Simulation scenarios.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// SIM-001: play every round with a full lobby, then hit the limit
    FullRun,

    /// SIM-002: oversubscribed lobby, shuffled arrival order
    Seniority,

    /// SIM-003: seated participants leave between rounds
    Backfill,

    /// SIM-004: random arrivals and departures over repeated runs
    Churn,

    /// SIM-005: reset after a finished run and play again
    Reset,

    /// SIM-006: one participant short of capacity
    Undersubscribed,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::FullRun,
            ScenarioId::Seniority,
            ScenarioId::Backfill,
            ScenarioId::Churn,
            ScenarioId::Reset,
            ScenarioId::Undersubscribed,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::FullRun => "full_run",
            ScenarioId::Seniority => "seniority",
            ScenarioId::Backfill => "backfill",
            ScenarioId::Churn => "churn",
            ScenarioId::Reset => "reset",
            ScenarioId::Undersubscribed => "undersubscribed",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::FullRun => {
                "Full lobby plays every round; partners are distinct; limit enforced"
            }
            ScenarioId::Seniority => "Twice as many participants as positions; oldest are seated",
            ScenarioId::Backfill => "Seated participants leave; next oldest take their positions",
            ScenarioId::Churn => "Random joins and leaves between rounds across five runs",
            ScenarioId::Reset => "Reset keeps the lobby and allows a fresh run",
            ScenarioId::Undersubscribed => "Capacity error until the lobby fills; no state change",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full_run" | "fullrun" | "sim-001" => Ok(ScenarioId::FullRun),
            "seniority" | "sim-002" => Ok(ScenarioId::Seniority),
            "backfill" | "sim-003" => Ok(ScenarioId::Backfill),
            "churn" | "sim-004" => Ok(ScenarioId::Churn),
            "reset" | "sim-005" => Ok(ScenarioId::Reset),
            "undersubscribed" | "sim-006" => Ok(ScenarioId::Undersubscribed),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
