//! Prediction blender: historical baseline × averaged polls → normalized shares.
//!
//! Pipeline (per party, over the union of baseline and poll parties):
//!   base   = hist·Wh + poll_avg·Wp          (weights renormalized to sum 1)
//!   trend  = conserve | accentuate ±5% | smooth (unweighted average —
//!            smooth *replaces* the weighted blend, it is not layered on top)
//!   jitter = base·(1 + u),  u ~ U[-margin, +margin), clamped at 0
//!   out    = normalize to sum 100
//!
//! A party absent from a given poll contributes an explicit 0 to that
//! poll's term of the mean. The jitter RNG is an explicit parameter; the
//! engine owns no ambient randomness.

use core::fmt;

use ep_core::parties::PartyId;
use ep_core::rng::JitterRng;
use ep_core::shares::{HistoricalRecord, PollSet, ShareMap};
use ep_core::variables::{Params, TrendAdjustment};
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlendError {
    /// Historical input empty; no baseline year to select.
    NoHistoricalData,
    /// `weight_historical + weight_polls == 0`; nothing to renormalize.
    InvalidWeights,
    /// Normalized prediction sums to 0 across all parties.
    ZeroPrediction,
}

impl fmt::Display for BlendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlendError::NoHistoricalData => write!(f, "no historical data to select a baseline"),
            BlendError::InvalidWeights => write!(f, "historical and poll weights sum to zero"),
            BlendError::ZeroPrediction => write!(f, "prediction collapsed to zero for all parties"),
        }
    }
}

impl std::error::Error for BlendError {}

/// Blend the most recent historical result with the poll average into a
/// vote-share prediction normalized to sum 100.
pub fn blend(
    historical: &HistoricalRecord,
    polls: &PollSet,
    params: &Params,
    rng: &mut JitterRng,
) -> Result<ShareMap, BlendError> {
    // 1) Baseline = the numerically greatest year.
    let (_, baseline) = historical
        .last_key_value()
        .ok_or(BlendError::NoHistoricalData)?;

    // 2) Union of parties across baseline and every poll.
    let mut all_parties: BTreeSet<&PartyId> = baseline.keys().collect();
    for poll in polls.values() {
        all_parties.extend(poll.keys());
    }

    // 3) Weight renormalization.
    let weight_sum = params.weight_historical + params.weight_polls;
    if weight_sum <= 0.0 {
        return Err(BlendError::InvalidWeights);
    }
    let wh = params.weight_historical / weight_sum;
    let wp = params.weight_polls / weight_sum;

    let poll_count = polls.len();

    let mut prediction = ShareMap::new();
    for &party in &all_parties {
        let hist = baseline.get(party).copied().unwrap_or(0.0);

        // Mean over all polls; a poll that omits the party contributes 0.
        let poll_avg = if poll_count == 0 {
            0.0
        } else {
            let sum: f64 = polls
                .values()
                .map(|poll| poll.get(party).copied().unwrap_or(0.0))
                .sum();
            sum / poll_count as f64
        };

        let mut base = hist * wh + poll_avg * wp;
        match params.trend_adjustment {
            TrendAdjustment::Conserve => {}
            TrendAdjustment::Accentuate => {
                if poll_avg > hist {
                    base *= 1.05;
                } else if poll_avg < hist {
                    base *= 0.95;
                }
            }
            // Smooth overrides the weighted blend entirely.
            TrendAdjustment::Smooth => base = (hist + poll_avg) / 2.0,
        }

        // One independent draw per party, in canonical party order.
        let jitter = rng.symmetric(params.error_margin);
        prediction.insert(party.clone(), (base * (1.0 + jitter)).max(0.0));
    }

    // 4) Normalize to sum 100.
    if !ep_core::shares::normalize_to_100(&mut prediction) {
        return Err(BlendError::ZeroPrediction);
    }
    Ok(prediction)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn share_map(pairs: &[(&str, f64)]) -> ShareMap {
        pairs.iter().map(|&(p, v)| (p.parse().unwrap(), v)).collect()
    }

    fn party(s: &str) -> PartyId {
        s.parse().unwrap()
    }

    fn deterministic_params() -> Params {
        Params { error_margin: 0.0, ..Params::default() }
    }

    #[test]
    fn empty_historical_fails() {
        let mut rng = JitterRng::from_seed_u64(0);
        let err = blend(&HistoricalRecord::new(), &PollSet::new(), &deterministic_params(), &mut rng);
        assert_eq!(err, Err(BlendError::NoHistoricalData));
    }

    #[test]
    fn zero_weights_fail() {
        let hist: HistoricalRecord = [(2020u16, share_map(&[("A", 50.0)]))].into();
        let params = Params { weight_historical: 0.0, weight_polls: 0.0, ..deterministic_params() };
        let mut rng = JitterRng::from_seed_u64(0);
        assert_eq!(blend(&hist, &PollSet::new(), &params, &mut rng), Err(BlendError::InvalidWeights));
    }

    #[test]
    fn all_zero_input_fails_as_zero_prediction() {
        let hist: HistoricalRecord = [(2020u16, share_map(&[("A", 0.0), ("B", 0.0)]))].into();
        let mut rng = JitterRng::from_seed_u64(0);
        assert_eq!(
            blend(&hist, &PollSet::new(), &deterministic_params(), &mut rng),
            Err(BlendError::ZeroPrediction)
        );
    }

    #[test]
    fn deterministic_blend_matches_hand_computation() {
        // hist {A:55,B:30,C:15}, poll {A:48,B:35,C:17}, weights 0.4/0.6, no jitter.
        let hist: HistoricalRecord = [(2020u16, share_map(&[("A", 55.0), ("B", 30.0), ("C", 15.0)]))].into();
        let polls: PollSet = [("P1".to_string(), share_map(&[("A", 48.0), ("B", 35.0), ("C", 17.0)]))].into();
        let mut rng = JitterRng::from_seed_u64(0);
        let out = blend(&hist, &polls, &deterministic_params(), &mut rng).unwrap();

        // 0.4·55 + 0.6·48 = 50.8 etc.; inputs already sum to 100.
        assert!((out[&party("A")] - 50.8).abs() < 1e-9);
        assert!((out[&party("B")] - 33.0).abs() < 1e-9);
        assert!((out[&party("C")] - 16.2).abs() < 1e-9);
    }

    #[test]
    fn most_recent_year_wins() {
        let hist: HistoricalRecord = [
            (2014u16, share_map(&[("OLD", 100.0)])),
            (2020, share_map(&[("NEW", 100.0)])),
        ]
        .into();
        let mut rng = JitterRng::from_seed_u64(0);
        let out = blend(&hist, &PollSet::new(), &deterministic_params(), &mut rng).unwrap();
        assert!((out[&party("NEW")] - 100.0).abs() < 1e-9);
        assert!(!out.contains_key(&party("OLD")));
    }

    #[test]
    fn absent_party_counts_as_zero_in_poll_mean() {
        // B appears in one of two polls: mean = (20 + 0) / 2 = 10, not 20.
        let hist: HistoricalRecord = [(2020u16, share_map(&[("A", 80.0)]))].into();
        let polls: PollSet = [
            ("P1".to_string(), share_map(&[("A", 80.0), ("B", 20.0)])),
            ("P2".to_string(), share_map(&[("A", 80.0)])),
        ]
        .into();
        let params = Params { weight_historical: 0.0, weight_polls: 1.0, ..deterministic_params() };
        let mut rng = JitterRng::from_seed_u64(0);
        let out = blend(&hist, &polls, &params, &mut rng).unwrap();
        // Pre-normalization: A = 80, B = 10 → 88.888… / 11.111…
        assert!((out[&party("B")] - 100.0 * 10.0 / 90.0).abs() < 1e-9);
    }

    #[test]
    fn smooth_ignores_configured_weights() {
        let hist: HistoricalRecord = [(2020u16, share_map(&[("A", 60.0), ("B", 40.0)]))].into();
        let polls: PollSet = [("P1".to_string(), share_map(&[("A", 40.0), ("B", 60.0)]))].into();
        let mut rng_a = JitterRng::from_seed_u64(1);
        let mut rng_b = JitterRng::from_seed_u64(1);

        let lopsided = Params {
            weight_historical: 0.99,
            weight_polls: 0.01,
            trend_adjustment: TrendAdjustment::Smooth,
            ..deterministic_params()
        };
        let even = Params {
            trend_adjustment: TrendAdjustment::Smooth,
            ..deterministic_params()
        };
        let a = blend(&hist, &polls, &lopsided, &mut rng_a).unwrap();
        let b = blend(&hist, &polls, &even, &mut rng_b).unwrap();
        assert_eq!(a, b);
        // (60+40)/2 = (40+60)/2 = 50 each.
        assert!((a[&party("A")] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn accentuate_amplifies_poll_movement() {
        let hist: HistoricalRecord = [(2020u16, share_map(&[("UP", 40.0), ("DOWN", 40.0), ("FLAT", 20.0)]))].into();
        let polls: PollSet = [(
            "P1".to_string(),
            share_map(&[("UP", 50.0), ("DOWN", 30.0), ("FLAT", 20.0)]),
        )]
        .into();
        let params = Params { trend_adjustment: TrendAdjustment::Accentuate, ..deterministic_params() };
        let mut rng = JitterRng::from_seed_u64(0);
        let out = blend(&hist, &polls, &params, &mut rng).unwrap();

        // Pre-normalization: UP = 46·1.05 = 48.3, DOWN = 34·0.95 = 32.3, FLAT = 20.
        let sum = 48.3 + 32.3 + 20.0;
        assert!((out[&party("UP")] - 100.0 * 48.3 / sum).abs() < 1e-9);
        assert!((out[&party("DOWN")] - 100.0 * 32.3 / sum).abs() < 1e-9);
        assert!((out[&party("FLAT")] - 100.0 * 20.0 / sum).abs() < 1e-9);
    }

    #[test]
    fn output_normalizes_to_100_with_jitter() {
        let hist: HistoricalRecord = [(2020u16, share_map(&[("A", 55.0), ("B", 30.0), ("C", 15.0)]))].into();
        let polls: PollSet = [("P1".to_string(), share_map(&[("A", 48.0), ("B", 35.0), ("C", 17.0)]))].into();
        for seed in 0..32u64 {
            let mut rng = JitterRng::from_seed_u64(seed);
            let out = blend(&hist, &polls, &Params::default(), &mut rng).unwrap();
            let total: f64 = out.values().sum();
            assert!((total - 100.0).abs() < 1e-9, "seed {seed}: sum {total}");
            assert!(out.values().all(|&v| v >= 0.0));
        }
    }

    #[test]
    fn same_seed_reproduces_the_prediction() {
        let hist: HistoricalRecord = [(2020u16, share_map(&[("A", 55.0), ("B", 30.0), ("C", 15.0)]))].into();
        let polls: PollSet = [("P1".to_string(), share_map(&[("A", 48.0), ("B", 35.0), ("C", 17.0)]))].into();
        let mut rng_a = JitterRng::from_seed_u64(42);
        let mut rng_b = JitterRng::from_seed_u64(42);
        let a = blend(&hist, &polls, &Params::default(), &mut rng_a).unwrap();
        let b = blend(&hist, &polls, &Params::default(), &mut rng_b).unwrap();
        assert_eq!(a, b);
    }
}
