//! variables.rs — Model parameter types, enums, and `Params` with safe defaults.
//!
//! `Params` is immutable per run: the orchestrator takes a snapshot and the
//! engine never mutates it. Wire tokens for enums are explicit so config
//! files stay stable across refactors.

use std::collections::BTreeMap;

use crate::errors::CoreError;
use crate::parties::{DepartmentId, PartyId};
use crate::shares::{HistoricalRecord, PollSet, ShareMap};

/// Define an enum with explicit wire tokens (serde derives feature-gated).
macro_rules! serde_enum {
    ($name:ident => { $($variant:ident = $token:expr),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum $name {
            $(
                #[cfg_attr(feature = "serde", serde(rename = $token))]
                $variant,
            )+
        }

        impl $name {
            /// Stable wire token for this variant.
            pub fn as_token(&self) -> &'static str {
                match self {
                    $( $name::$variant => $token, )+
                }
            }
        }
    };
}

serde_enum!(TrendAdjustment => {
    Conserve   = "conserve",
    Smooth     = "smooth",
    Accentuate = "accentuate",
});

impl core::str::FromStr for TrendAdjustment {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conserve" => Ok(TrendAdjustment::Conserve),
            "smooth" => Ok(TrendAdjustment::Smooth),
            "accentuate" => Ok(TrendAdjustment::Accentuate),
            _ => Err(CoreError::DomainOutOfRange("trend_adjustment")),
        }
    }
}

/// Model configuration, immutable per run.
///
/// Weights need not pre-sum to 1; the blender renormalizes them and fails
/// the run when both are 0. Fractional fields (`error_margin`,
/// `min_threshold`, `runoff_split`) live in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Params {
    /// Weight of the most recent historical result in the blend.
    pub weight_historical: f64,
    /// Weight of the averaged polls in the blend.
    pub weight_polls: f64,
    /// Jitter bound as a fraction (0.03 = ±3%).
    pub error_margin: f64,
    /// How poll trend interacts with the historical baseline.
    pub trend_adjustment: TrendAdjustment,
    /// Fractional vote share required for seat eligibility.
    pub min_threshold: f64,
    /// First-place share of redistributed third-party votes in a runoff.
    pub runoff_split: f64,
    /// Whether seat maps are additionally split into women/men counts.
    pub gender_parity: bool,
    /// National-list senate pool.
    pub senate_seats: u32,
    /// National-list plurinominal deputy pool.
    pub plurinominal_seats: u32,
    /// Per-department uninominal deputy pools.
    pub uninominal_seats: BTreeMap<DepartmentId, u32>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            weight_historical: 0.4,
            weight_polls: 0.6,
            error_margin: 0.03,
            trend_adjustment: TrendAdjustment::Conserve,
            min_threshold: 0.03,
            runoff_split: 0.70,
            gender_parity: false,
            senate_seats: 36,
            plurinominal_seats: 60,
            uninominal_seats: default_uninominal_seats(),
        }
    }
}

impl Params {
    /// Domain validation. Weight *renormalization* failures are a run-time
    /// blend error, not a config error: a zero weight sum is rejected by
    /// the blender so the failure surfaces on the run that depends on it.
    pub fn validate(&self) -> Result<(), CoreError> {
        fn frac(v: f64, k: &'static str) -> Result<(), CoreError> {
            if v.is_finite() && (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(CoreError::DomainOutOfRange(k))
            }
        }
        if !(self.weight_historical.is_finite() && self.weight_historical >= 0.0) {
            return Err(CoreError::DomainOutOfRange("weight_historical"));
        }
        if !(self.weight_polls.is_finite() && self.weight_polls >= 0.0) {
            return Err(CoreError::DomainOutOfRange("weight_polls"));
        }
        frac(self.error_margin, "error_margin")?;
        frac(self.min_threshold, "min_threshold")?;
        frac(self.runoff_split, "runoff_split")?;
        let uninominal_total: u32 = self.uninominal_seats.values().sum();
        if self.senate_seats == 0 && self.plurinominal_seats == 0 && uninominal_total == 0 {
            return Err(CoreError::DomainOutOfRange("seat totals"));
        }
        Ok(())
    }

    /// Total deputy seats across both pools.
    pub fn deputy_seats(&self) -> u32 {
        self.plurinominal_seats + self.uninominal_seats.values().sum::<u32>()
    }
}

/// The nine departments with their uninominal seat counts (sum 70).
pub fn default_uninominal_seats() -> BTreeMap<DepartmentId, u32> {
    [
        ("La Paz", 15u32),
        ("Santa Cruz", 15),
        ("Cochabamba", 10),
        ("Potosí", 8),
        ("Chuquisaca", 6),
        ("Oruro", 5),
        ("Tarija", 5),
        ("Beni", 4),
        ("Pando", 2),
    ]
    .into_iter()
    .map(|(d, n)| (DepartmentId::from_static(d), n))
    .collect()
}

fn shares(pairs: &[(&'static str, f64)]) -> ShareMap {
    pairs
        .iter()
        .map(|&(p, v)| (PartyId::from_static(p), v))
        .collect()
}

/// Built-in historical results (general elections 2005–2020), used when no
/// historical file is supplied.
pub fn default_historical() -> HistoricalRecord {
    [
        (2005u16, shares(&[("MAS", 53.7), ("PODEMOS", 28.6), ("UN", 7.8), ("MNR", 6.5), ("Otros", 3.4)])),
        (2009, shares(&[("MAS", 64.2), ("PPB-CN", 26.5), ("UN", 5.7), ("Otros", 3.6)])),
        (2014, shares(&[("MAS", 61.4), ("UD", 24.2), ("PDC", 9.0), ("Otros", 5.4)])),
        (2019, shares(&[("MAS", 47.1), ("CC", 36.5), ("FPV", 8.9), ("Otros", 7.5)])),
        (2020, shares(&[("MAS", 55.1), ("CC", 28.8), ("Creemos", 14.0), ("FPV", 1.6), ("Otros", 0.5)])),
    ]
    .into_iter()
    .collect()
}

/// Built-in 2025 polling set, used when no poll file is supplied.
pub fn default_polls() -> PollSet {
    [
        ("Encuesta1".to_string(), shares(&[("MAS", 48.0), ("CC", 32.0), ("Creemos", 15.0), ("FPV", 3.0), ("Nuevo", 2.0)])),
        ("Encuesta2".to_string(), shares(&[("MAS", 45.0), ("CC", 35.0), ("Creemos", 12.0), ("FPV", 5.0), ("Nuevo", 3.0)])),
        ("Encuesta3".to_string(), shares(&[("MAS", 50.0), ("CC", 30.0), ("Creemos", 13.0), ("FPV", 4.0), ("Nuevo", 3.0)])),
    ]
    .into_iter()
    .collect()
}
