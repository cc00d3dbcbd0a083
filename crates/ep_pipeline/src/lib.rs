//! ep_pipeline — deterministic pipeline surface
//! (load → validate → blend → runoff check → seat detail → result build).
//!
//! This crate stays renderer-free: it consumes plain data (`ep_core`
//! types, `ep_io` loaders) and produces plain data (`PredictionResult`).
//! The GUI/report layers are pure consumers — no mutable state is shared
//! with any caller, and every run recomputes from scratch.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use ep_algo::{
    blend::{blend, BlendError},
    majority_party,
    runoff::{self, RunoffError},
    TableRegionalWeights,
};
use ep_core::parties::PartyId;
use ep_core::rng::JitterRng;
use ep_core::shares::{HistoricalRecord, PollSet, ShareMap};
use ep_core::variables::Params;

pub mod load;
pub mod seat_detail;

pub use load::{load_inputs, LoadedInputs};
pub use seat_detail::{compose, ParityDetail, SeatDetail};

// Downstream renderers consume parity splits; save them the extra dependency.
pub use ep_algo::SeatAllocation;

/// Engine identifiers (baked by the build system in real deployments).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EngineMeta {
    pub name: String,
    pub version: String,
}

impl Default for EngineMeta {
    fn default() -> Self {
        Self {
            name: "ep-engine".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Single error surface for the pipeline orchestration.
#[derive(Debug)]
pub enum EngineError {
    /// Parameter domain violations caught before any stage runs.
    Config(String),
    /// Blend failures (`NoHistoricalData`, `InvalidWeights`, `ZeroPrediction`).
    Blend(BlendError),
    /// Runoff simulation failures (`InsufficientCandidates`).
    Runoff(RunoffError),
    /// Import/artifact failures from `ep_io`.
    Io(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Config(m) => write!(f, "config: {m}"),
            EngineError::Blend(e) => write!(f, "blend: {e}"),
            EngineError::Runoff(e) => write!(f, "runoff: {e}"),
            EngineError::Io(m) => write!(f, "io: {m}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<BlendError> for EngineError {
    fn from(e: BlendError) -> Self {
        EngineError::Blend(e)
    }
}

impl From<RunoffError> for EngineError {
    fn from(e: RunoffError) -> Self {
        EngineError::Runoff(e)
    }
}

impl From<ep_io::IoError> for EngineError {
    fn from(e: ep_io::IoError) -> Self {
        EngineError::Io(e.to_string())
    }
}

// ---------------------------- Result documents ----------------------------
// Typed mirrors of the engine's output contract; field order is the
// artifact's field order. Extend in-place without renaming fields.

/// First-round gate outcome carried in the result document.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RunoffBlock {
    pub required: bool,
    /// Exactly two entries when `required`, empty otherwise.
    pub candidates: Vec<PartyId>,
    /// Simulated second round; present once `run_runoff` has been applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_round: Option<ShareMap>,
}

/// The orchestrator's output bundle for one prediction run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PredictionResult {
    pub engine: EngineMeta,
    /// Normalized vote shares (sum 100).
    pub shares: ShareMap,
    pub runoff: RunoffBlock,
    pub seats: SeatDetail,
    /// Party holding the most total deputies, if any were assigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub majority_party: Option<PartyId>,
    /// Seed of the jitter stream that produced this run.
    pub jitter_seed: u64,
}

/// Aggregate of a Monte-Carlo scenario sweep.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScenarioSummary {
    pub runs: u32,
    /// Runs whose first round triggered a runoff.
    pub runoff_runs: u32,
    /// Per-party mean share across all runs.
    pub mean_shares: ShareMap,
    pub base_seed: u64,
}

// ---------------------------- Electoral model ----------------------------

/// The model is a value: inputs and configuration in, results out.
#[derive(Debug, Clone)]
pub struct ElectoralModel {
    historical: HistoricalRecord,
    polls: PollSet,
    params: Params,
    regional: TableRegionalWeights,
}

impl ElectoralModel {
    /// Build a model; parameters are validated once, here.
    pub fn new(
        historical: HistoricalRecord,
        polls: PollSet,
        params: Params,
    ) -> Result<Self, EngineError> {
        params
            .validate()
            .map_err(|e| EngineError::Config(e.to_string()))?;
        Ok(Self {
            historical,
            polls,
            params,
            regional: TableRegionalWeights::bolivia_2025(),
        })
    }

    /// Replace the regional weighting heuristic (defaults to the built-in
    /// department multiplier table).
    pub fn with_regional_weights(mut self, regional: TableRegionalWeights) -> Self {
        self.regional = regional;
        self
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// One full prediction run: blend → runoff gate → seat detail.
    ///
    /// The seed is explicit so callers (tests, scenario sweeps, a GUI's
    /// "recalculate" button) control reproducibility; the same model and
    /// seed always produce the identical result.
    pub fn run_prediction(&self, seed: u64) -> Result<PredictionResult, EngineError> {
        let mut rng = JitterRng::from_seed_u64(seed);
        let shares = blend(&self.historical, &self.polls, &self.params, &mut rng)?;

        let decision = runoff::evaluate(&shares);
        let seats = compose(&shares, &self.params, &self.regional);
        let majority = majority_party(&seats.total_deputies);

        Ok(PredictionResult {
            engine: EngineMeta::default(),
            shares,
            runoff: RunoffBlock {
                required: decision.required,
                candidates: decision.candidates,
                second_round: None,
            },
            seats,
            majority_party: majority,
            jitter_seed: seed,
        })
    }

    /// Simulate the second round for a prior result's candidates.
    ///
    /// Fails with `InsufficientCandidates` when the result does not carry
    /// two candidates (i.e. the first round was decisive).
    pub fn run_runoff(&self, result: &PredictionResult) -> Result<ShareMap, EngineError> {
        let second = runoff::simulate(
            &result.shares,
            &result.runoff.candidates,
            self.params.runoff_split,
        )?;
        Ok(second)
    }

    /// Monte-Carlo sweep: `runs` independent predictions, seeded
    /// `base_seed, base_seed+1, …` so each run draws from its own stream
    /// (uncorrelated jitter; safe to parallelize externally).
    pub fn simulate_scenarios(
        &self,
        runs: u32,
        base_seed: u64,
    ) -> Result<ScenarioSummary, EngineError> {
        if runs == 0 {
            return Err(EngineError::Config("scenario sweep needs at least one run".into()));
        }

        let mut runoff_runs = 0u32;
        let mut share_sums: BTreeMap<PartyId, f64> = BTreeMap::new();
        for i in 0..runs {
            let result = self.run_prediction(base_seed.wrapping_add(i as u64))?;
            if result.runoff.required {
                runoff_runs += 1;
            }
            for (p, &v) in &result.shares {
                *share_sums.entry(p.clone()).or_insert(0.0) += v;
            }
        }

        let mean_shares: ShareMap = share_sums
            .into_iter()
            .map(|(p, sum)| (p, sum / runs as f64))
            .collect();

        Ok(ScenarioSummary { runs, runoff_runs, mean_shares, base_seed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ep_core::variables::{default_historical, default_polls};

    #[test]
    fn invalid_params_rejected_at_construction() {
        let params = Params { min_threshold: 7.0, ..Params::default() };
        assert!(matches!(
            ElectoralModel::new(default_historical(), default_polls(), params),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn same_seed_same_result() {
        let model =
            ElectoralModel::new(default_historical(), default_polls(), Params::default()).unwrap();
        let a = model.run_prediction(99).unwrap();
        let b = model.run_prediction(99).unwrap();
        assert_eq!(a, b);
        let c = model.run_prediction(100).unwrap();
        assert_ne!(a.shares, c.shares);
    }

    #[test]
    fn run_runoff_requires_two_candidates() {
        let model =
            ElectoralModel::new(default_historical(), default_polls(), Params::default()).unwrap();
        let mut result = model.run_prediction(1).unwrap();
        result.runoff.candidates.clear();
        assert!(matches!(
            model.run_runoff(&result),
            Err(EngineError::Runoff(RunoffError::InsufficientCandidates))
        ));
    }

    #[test]
    fn scenario_sweep_aggregates() {
        let model =
            ElectoralModel::new(default_historical(), default_polls(), Params::default()).unwrap();
        let summary = model.simulate_scenarios(16, 7).unwrap();
        assert_eq!(summary.runs, 16);
        assert!(summary.runoff_runs <= 16);
        let total: f64 = summary.mean_shares.values().sum();
        assert!((total - 100.0).abs() < 1e-6);
    }

    #[test]
    fn regional_table_is_replaceable() {
        let weighted =
            ElectoralModel::new(default_historical(), default_polls(), Params::default())
                .unwrap()
                .run_prediction(5)
                .unwrap();
        let neutral =
            ElectoralModel::new(default_historical(), default_polls(), Params::default())
                .unwrap()
                .with_regional_weights(TableRegionalWeights::new())
                .run_prediction(5)
                .unwrap();

        // The heuristic only touches the uninominal pools.
        assert_eq!(neutral.shares, weighted.shares);
        assert_eq!(neutral.seats.senate, weighted.seats.senate);
        assert_ne!(
            neutral.seats.uninominal_by_department,
            weighted.seats.uninominal_by_department
        );
    }

    #[test]
    fn zero_run_sweep_is_a_config_error() {
        let model =
            ElectoralModel::new(default_historical(), default_polls(), Params::default()).unwrap();
        assert!(matches!(model.simulate_scenarios(0, 7), Err(EngineError::Config(_))));
    }
}
