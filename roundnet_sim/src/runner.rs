//! Scenario runner - drives an engine through a scenario and checks it.

use crate::arrivals::ArrivalGenerator;
use crate::context::SimContext;
use crate::exporter::RunExport;
use crate::invariants::{self, Violation};
use crate::scenarios::ScenarioId;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use roundnet_core::{
    ConfigError, ExperimentConfig, NetworkExperiment, RoundEngine, RoundRecord, Topology,
};
use roundnet_env::{ExperimentContext, ParticipantId};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all checks
    pub passed: bool,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Counters collected during the run
    pub metrics: ScenarioMetrics,

    /// Full run record for export
    pub export: RunExport,
}

/// Counters collected during scenario execution.
#[derive(Debug, Clone, Default)]
pub struct ScenarioMetrics {
    pub rounds_played: u64,
    pub rounds_rejected: u64,
    pub arrivals: u64,
    pub departures: u64,
    pub resets: u64,
}

/// Runs scenarios against a fresh engine per run.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Lobby size for scenarios that start full
    participants: usize,

    topology: Arc<Topology>,
    max_rounds: u32,
}

impl ScenarioRunner {
    /// Creates a runner over the six-node dyadic topology.
    pub fn new(seed: u64, participants: usize) -> Self {
        let topology = Arc::new(Topology::six_node_dyadic());
        let max_rounds = topology.max_round();
        Self {
            seed,
            participants,
            topology,
            max_rounds,
        }
    }

    /// Creates a runner for the topology and round limit of `config`.
    pub fn from_config(
        seed: u64,
        participants: usize,
        config: &ExperimentConfig,
    ) -> Result<Self, ConfigError> {
        let (topology, max_rounds) = config.resolve()?;
        Ok(Self {
            seed,
            participants,
            topology,
            max_rounds,
        })
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        let mut sim = Sim::new(self.seed, Arc::clone(&self.topology), self.max_rounds);
        let outcome = match scenario {
            ScenarioId::FullRun => self.run_full_run(&mut sim),
            ScenarioId::Seniority => self.run_seniority(&mut sim),
            ScenarioId::Backfill => self.run_backfill(&mut sim),
            ScenarioId::Churn => self.run_churn(&mut sim),
            ScenarioId::Reset => self.run_reset(&mut sim),
            ScenarioId::Undersubscribed => self.run_undersubscribed(&mut sim),
        };

        let failure_reason = outcome.err().map(|v| v.to_string());
        let passed = failure_reason.is_none();

        let mut export = RunExport::new(scenario.name(), self.seed);
        export.rounds = sim.rounds;
        export.lobby = sim
            .engine
            .lobby()
            .by_seniority(|_| true)
            .into_iter()
            .cloned()
            .collect();
        export.passed = passed;
        export.failure_reason = failure_reason.clone();

        ScenarioResult {
            scenario,
            seed: self.seed,
            passed,
            failure_reason,
            metrics: sim.metrics,
            export,
        }
    }

    fn full_lobby(&self) -> usize {
        self.participants.max(self.topology.position_count())
    }

    /// SIM-001: every round succeeds, partners are distinct, then the limit holds.
    fn run_full_run(&self, sim: &mut Sim) -> Result<(), Violation> {
        sim.join(self.full_lobby());
        sim.play_all()?;
        invariants::check_partners(&sim.engine)?;
        sim.expect_rejection("round-limit-reached")?;
        sim.expect_rejection("round-limit-reached")
    }

    /// SIM-002: with a shuffled, oversubscribed lobby the oldest are seated.
    fn run_seniority(&self, sim: &mut Sim) -> Result<(), Violation> {
        let count = self.full_lobby().max(2 * self.topology.position_count());
        let mut batch = sim.arrivals.arrive_batch(&sim.ctx, count);
        let mut shuffler = ChaCha8Rng::seed_from_u64(self.seed ^ 0x5eed);
        batch.shuffle(&mut shuffler);
        for participant in batch {
            sim.add(participant);
        }

        let expected: HashSet<ParticipantId> = sim
            .engine
            .lobby()
            .by_seniority(|_| true)
            .into_iter()
            .take(self.topology.position_count())
            .map(|p| p.id.clone())
            .collect();

        sim.play_checked()?;

        let seated: HashSet<ParticipantId> =
            sim.engine.assignments().map(|(id, _)| id.clone()).collect();
        if let Some(id) = expected.difference(&seated).next() {
            return Err(Violation::SeniorityBypassed(id.clone()));
        }
        Ok(())
    }

    /// SIM-003: departures between rounds are backfilled by seniority.
    fn run_backfill(&self, sim: &mut Sim) -> Result<(), Violation> {
        sim.join(self.full_lobby() + 3);
        sim.play_checked()?;

        while sim.engine.round() < self.max_rounds {
            if sim.engine.waiting().is_empty() {
                break;
            }
            let Some((leaving, freed)) = sim.leave_random_seated() else {
                break;
            };
            if !sim.engine.free_positions().contains(&freed) {
                return Err(Violation::SeatMismatch(leaving));
            }
            let next_in_line = sim.engine.waiting().first().map(|p| p.id.clone());

            sim.play_checked()?;

            if let Some(next) = next_in_line {
                if sim.engine.occupant(freed) != Some(&next) {
                    return Err(Violation::SeniorityBypassed(next));
                }
            }
        }
        Ok(())
    }

    /// SIM-004: random joins and leaves between rounds, five runs in a row.
    fn run_churn(&self, sim: &mut Sim) -> Result<(), Violation> {
        let positions = self.topology.position_count();
        sim.join(self.full_lobby());

        for run in 0..5 {
            debug!("Churn run {}", run);
            while sim.engine.round() < self.max_rounds {
                for _ in 0..sim.ctx.pick_index(4) {
                    match sim.ctx.pick_index(3) {
                        0 => sim.join(1),
                        1 => {
                            sim.leave_random_seated();
                        }
                        _ => {
                            sim.leave_random_waiting();
                        }
                    }
                    invariants::check_consistency(&sim.engine)?;
                }

                let lobby = sim.engine.lobby().len();
                if lobby < positions {
                    sim.expect_rejection("insufficient-participants")?;
                    sim.join(positions - lobby);
                }
                sim.play_checked()?;
            }
            sim.expect_rejection("round-limit-reached")?;
            sim.reset()?;
        }
        Ok(())
    }

    /// SIM-005: reset keeps the lobby and a second run behaves like the first.
    fn run_reset(&self, sim: &mut Sim) -> Result<(), Violation> {
        sim.join(self.full_lobby());
        sim.play_all()?;

        let before: HashSet<ParticipantId> =
            sim.engine.lobby().iter().map(|p| p.id.clone()).collect();
        sim.reset()?;
        let after: HashSet<ParticipantId> =
            sim.engine.lobby().iter().map(|p| p.id.clone()).collect();
        if before != after {
            return Err(Violation::Unexpected("reset changed lobby membership".to_string()));
        }

        sim.play_all()?;
        invariants::check_partners(&sim.engine)?;
        sim.expect_rejection("round-limit-reached")
    }

    /// SIM-006: one short of capacity is rejected without side effects.
    fn run_undersubscribed(&self, sim: &mut Sim) -> Result<(), Violation> {
        let positions = self.topology.position_count();
        sim.join(positions - 1);
        sim.expect_rejection("insufficient-participants")?;
        sim.expect_rejection("insufficient-participants")?;

        sim.join(1);
        sim.play_checked().map(|_| ())
    }
}

/// One engine plus the harness state around it.
struct Sim {
    ctx: Arc<SimContext>,
    engine: RoundEngine<SimContext>,
    arrivals: ArrivalGenerator,
    metrics: ScenarioMetrics,

    /// Every record produced, across resets
    rounds: Vec<RoundRecord>,
}

impl Sim {
    fn new(seed: u64, topology: Arc<Topology>, max_rounds: u32) -> Self {
        let ctx = SimContext::shared(seed);
        let engine = RoundEngine::with_max_rounds(Arc::clone(&ctx), topology, max_rounds);
        Self {
            ctx,
            engine,
            arrivals: ArrivalGenerator::new(seed),
            metrics: ScenarioMetrics::default(),
            rounds: Vec::new(),
        }
    }

    fn add(&mut self, participant: roundnet_core::Participant) {
        self.engine.add_participant(participant);
        self.metrics.arrivals += 1;
    }

    fn join(&mut self, n: usize) {
        for participant in self.arrivals.arrive_batch(&self.ctx, n) {
            self.add(participant);
        }
    }

    /// Removes a seated participant chosen by the context RNG.
    fn leave_random_seated(&mut self) -> Option<(ParticipantId, roundnet_core::PositionId)> {
        let mut seated: Vec<(ParticipantId, roundnet_core::PositionId)> = self
            .engine
            .assignments()
            .map(|(id, position)| (id.clone(), position))
            .collect();
        if seated.is_empty() {
            return None;
        }
        // HashMap order is not reproducible
        seated.sort();
        let (id, position) = seated.swap_remove(self.ctx.pick_index(seated.len()));
        self.engine.remove_participant(&id);
        self.metrics.departures += 1;
        Some((id, position))
    }

    /// Removes a waiting participant chosen by the context RNG.
    fn leave_random_waiting(&mut self) -> Option<ParticipantId> {
        let waiting: Vec<ParticipantId> =
            self.engine.waiting().into_iter().map(|p| p.id.clone()).collect();
        if waiting.is_empty() {
            return None;
        }
        let id = waiting[self.ctx.pick_index(waiting.len())].clone();
        self.engine.remove_participant(&id);
        self.metrics.departures += 1;
        Some(id)
    }

    /// Plays a round and runs every per-round check on it.
    fn play_checked(&mut self) -> Result<RoundRecord, Violation> {
        let waiting_before: Vec<ParticipantId> =
            self.engine.waiting().into_iter().map(|p| p.id.clone()).collect();
        let free_before = self.engine.free_positions().len();
        let round_before = self.engine.round();

        let record = self
            .engine
            .play_round()
            .map_err(|e| Violation::Unexpected(e.to_string()))?;

        if record.round != round_before + 1 || self.engine.round() != record.round {
            return Err(Violation::RoundCounter {
                expected: round_before + 1,
                actual: self.engine.round(),
            });
        }
        invariants::check_record(&record, self.engine.topology())?;
        invariants::check_consistency(&self.engine)?;
        invariants::check_seniority(&self.engine, &waiting_before, free_before)?;

        self.metrics.rounds_played += 1;
        self.rounds.push(record.clone());
        Ok(record)
    }

    /// Plays until the round limit.
    fn play_all(&mut self) -> Result<(), Violation> {
        while self.engine.round() < self.engine.max_rounds() {
            self.play_checked()?;
        }
        Ok(())
    }

    /// Expects `play_round` to fail with `code` and leave everything untouched.
    fn expect_rejection(&mut self, code: &str) -> Result<(), Violation> {
        let round = self.engine.round();
        let history = self.engine.history().len();
        let free = self.engine.free_positions().to_vec();
        let mut seated: Vec<_> = self
            .engine
            .assignments()
            .map(|(id, position)| (id.clone(), position))
            .collect();
        seated.sort();

        match self.engine.play_round() {
            Ok(record) => {
                return Err(Violation::Unexpected(format!(
                    "round {} played, expected {}",
                    record.round, code
                )))
            }
            Err(e) if e.code() != code => {
                return Err(Violation::Unexpected(format!("got {}, expected {}", e.code(), code)))
            }
            Err(_) => self.metrics.rounds_rejected += 1,
        }

        let mut seated_after: Vec<_> = self
            .engine
            .assignments()
            .map(|(id, position)| (id.clone(), position))
            .collect();
        seated_after.sort();

        if self.engine.round() != round {
            return Err(Violation::RoundCounter {
                expected: round,
                actual: self.engine.round(),
            });
        }
        if self.engine.history().len() != history
            || self.engine.free_positions() != free.as_slice()
            || seated_after != seated
        {
            return Err(Violation::Unexpected(format!(
                "rejected round ({}) mutated engine state",
                code
            )));
        }
        Ok(())
    }

    fn reset(&mut self) -> Result<(), Violation> {
        let lobby = self.engine.lobby().len();
        self.engine.reset();
        self.metrics.resets += 1;

        if self.engine.round() != 0 {
            return Err(Violation::RoundCounter {
                expected: 0,
                actual: self.engine.round(),
            });
        }
        if !self.engine.history().is_empty()
            || self.engine.assignments().count() != 0
            || self.engine.free_positions().len() != self.engine.topology().position_count()
            || self.engine.lobby().len() != lobby
        {
            return Err(Violation::Unexpected("reset left state behind".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_scenario_passes_on_reference_topology() {
        let runner = ScenarioRunner::new(42, 6);
        for scenario in ScenarioId::all() {
            let result = runner.run(scenario);
            assert!(
                result.passed,
                "{} failed: {:?}",
                scenario,
                result.failure_reason
            );
        }
    }

    #[test]
    fn test_full_run_metrics() {
        let result = ScenarioRunner::new(7, 6).run(ScenarioId::FullRun);
        assert!(result.passed);
        assert_eq!(result.metrics.rounds_played, 2);
        assert_eq!(result.metrics.rounds_rejected, 2);
        assert_eq!(result.metrics.arrivals, 6);
        assert_eq!(result.export.rounds.len(), 2);
        assert_eq!(result.export.lobby.len(), 6);
    }

    #[test]
    fn test_runner_is_deterministic() {
        let a = ScenarioRunner::new(99, 8).run(ScenarioId::Churn);
        let b = ScenarioRunner::new(99, 8).run(ScenarioId::Churn);
        assert_eq!(a.export.rounds, b.export.rounds);
        assert_eq!(a.metrics.departures, b.metrics.departures);
    }

    #[test]
    fn test_runner_from_config_with_single_round() {
        let config = ExperimentConfig {
            max_rounds: Some(1),
            ..Default::default()
        };
        let runner = ScenarioRunner::from_config(3, 6, &config).unwrap();
        let result = runner.run(ScenarioId::FullRun);
        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.metrics.rounds_played, 1);
    }
}
