//! Runoff ("segunda vuelta") rules — Ley 026 two-round system.
//!
//! First-round gate:
//! - top1 > 50%                         → decided, no runoff
//! - top1 ≥ 40% and top1 − top2 ≥ 10pt  → decided, no runoff
//! - otherwise                          → runoff between the top two
//!
//! Ranking sorts share-descending with the lexicographic id tie-break; a
//! field with fewer than two parties cannot go to a second round.
//!
//! The simulator redistributes every third-party vote between the two
//! candidates with a configurable split (the historical 70/30 is a modeling
//! simplification, so it is a parameter, not a constant). Vote mass is
//! conserved: the two-party result sums to the input total.

use core::fmt;

use ep_core::determinism::rank_by_share;
use ep_core::parties::PartyId;
use ep_core::shares::{self, ShareMap};

/// Outcome of the first-round gate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunoffDecision {
    pub required: bool,
    /// Exactly two entries when `required`, empty otherwise.
    pub candidates: Vec<PartyId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunoffError {
    /// Simulation invoked with fewer than two candidates.
    InsufficientCandidates,
}

impl fmt::Display for RunoffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunoffError::InsufficientCandidates => {
                write!(f, "runoff simulation requires two candidates")
            }
        }
    }
}

impl std::error::Error for RunoffError {}

/// Evaluate the first-round gate over a (percentage) share map.
pub fn evaluate(votes: &ShareMap) -> RunoffDecision {
    let ranked = rank_by_share(votes);

    let decided = RunoffDecision { required: false, candidates: Vec::new() };

    let Some(&(_, top1)) = ranked.first() else {
        return decided;
    };

    // Absolute majority.
    if top1 > 50.0 {
        return decided;
    }

    let Some(&(_, top2)) = ranked.get(1) else {
        // Single-party field: nobody to face in a second round.
        return decided;
    };

    // 40% with a 10-point lead.
    if top1 >= 40.0 && (top1 - top2) >= 10.0 {
        return decided;
    }

    RunoffDecision {
        required: true,
        candidates: vec![ranked[0].0.clone(), ranked[1].0.clone()],
    }
}

/// Simulate the second round: all votes outside the two candidates are
/// split `split` to the first and `1 - split` to the second. A candidate
/// missing from `votes` counts as 0 first-round votes.
pub fn simulate(
    votes: &ShareMap,
    candidates: &[PartyId],
    split: f64,
) -> Result<ShareMap, RunoffError> {
    let (Some(first), Some(second)) = (candidates.first(), candidates.get(1)) else {
        return Err(RunoffError::InsufficientCandidates);
    };

    let total = shares::total(votes);
    let v1 = votes.get(first).copied().unwrap_or(0.0);
    let v2 = votes.get(second).copied().unwrap_or(0.0);
    let others = total - v1 - v2;

    let mut out = ShareMap::new();
    out.insert(first.clone(), v1 + others * split);
    out.insert(second.clone(), v2 + others * (1.0 - split));
    Ok(out)
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

    #[test]
    fn absolute_majority_skips_runoff() {
        let d = evaluate(&share_map(&[("A", 50.01), ("B", 49.99)]));
        assert!(!d.required);
        assert!(d.candidates.is_empty());
    }

    #[test]
    fn forty_with_ten_point_lead_skips_runoff() {
        let d = evaluate(&share_map(&[("A", 40.0), ("B", 29.9)]));
        assert!(!d.required);
    }

    #[test]
    fn under_forty_forces_runoff() {
        let d = evaluate(&share_map(&[("A", 39.9), ("B", 30.0)]));
        assert!(d.required);
        assert_eq!(d.candidates, vec![party("A"), party("B")]);
    }

    #[test]
    fn narrow_lead_forces_runoff_despite_forty() {
        let d = evaluate(&share_map(&[("A", 45.0), ("B", 40.0)]));
        assert!(d.required);
    }

    #[test]
    fn exactly_fifty_is_not_absolute_majority() {
        // 50.0 fails the >50 gate and, at a 25-point lead, passes the 40/10 gate.
        let d = evaluate(&share_map(&[("A", 50.0), ("B", 25.0), ("C", 25.0)]));
        assert!(!d.required);
    }

    #[test]
    fn candidates_ranked_with_lexicographic_tie_break() {
        let d = evaluate(&share_map(&[("Z", 35.0), ("M", 35.0), ("A", 30.0)]));
        assert!(d.required);
        assert_eq!(d.candidates, vec![party("M"), party("Z")]);
    }

    #[test]
    fn degenerate_fields_never_require_runoff() {
        assert!(!evaluate(&ShareMap::new()).required);
        assert!(!evaluate(&share_map(&[("A", 30.0)])).required);
    }

    #[test]
    fn simulation_conserves_vote_mass() {
        let votes = share_map(&[("A", 39.0), ("B", 31.0), ("C", 20.0), ("D", 10.0)]);
        let out = simulate(&votes, &[party("A"), party("B")], 0.70).unwrap();
        let total_out: f64 = out.values().sum();
        assert!((total_out - 100.0).abs() < 1e-9);
        assert!((out[&party("A")] - (39.0 + 30.0 * 0.7)).abs() < 1e-9);
        assert!((out[&party("B")] - (31.0 + 30.0 * 0.3)).abs() < 1e-9);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn simulation_respects_configured_split() {
        let votes = share_map(&[("A", 40.0), ("B", 40.0), ("C", 20.0)]);
        let out = simulate(&votes, &[party("A"), party("B")], 0.5).unwrap();
        assert!((out[&party("A")] - 50.0).abs() < 1e-9);
        assert!((out[&party("B")] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn simulation_requires_two_candidates() {
        let votes = share_map(&[("A", 60.0), ("B", 40.0)]);
        assert_eq!(simulate(&votes, &[party("A")], 0.7), Err(RunoffError::InsufficientCandidates));
        assert_eq!(simulate(&votes, &[], 0.7), Err(RunoffError::InsufficientCandidates));
    }
}
