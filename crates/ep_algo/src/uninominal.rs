//! Uninominal (district) seat simulation.
//!
//! The model has no district-level polling, so department seats are
//! distributed from the *national* share, reweighted per party/department
//! by an injected `RegionalWeights` strategy — the hand-coded multiplier
//! table is a stand-in for real electoral geography and must stay
//! replaceable without touching the allocation core.
//!
//! Per department with `S` seats:
//! 1. eligible = parties clearing the national threshold;
//!    weight each as `share · factor(party, department)`.
//! 2. proportional pass: `floor(S · w / Σw)` seats per party.
//! 3. fallback pass: the remainder goes one-by-one to the strongest
//!    parties by weight (canonical tie-break), at most 2 fallback seats
//!    per party. The floor pass leaves at most `parties − 1` seats, so a
//!    single cycle always exhausts the remainder; the cap and the
//!    cycle-stall guard are kept as stated rules, not reachable paths.

use ep_core::determinism::cmp_by_share_desc;
use ep_core::parties::{DepartmentId, PartyId};
use ep_core::shares::{self, ShareMap};
use std::collections::BTreeMap;

/// Regional strength adjustment for a party in a department.
///
/// Factors multiply the national share; 1.0 is neutral. Implementations
/// must be pure — the composer calls this once per (party, department).
pub trait RegionalWeights {
    fn factor(&self, party: &PartyId, department: &DepartmentId) -> f64;
}

/// Neutral strategy: every party at national strength everywhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlatRegionalWeights;

impl RegionalWeights for FlatRegionalWeights {
    fn factor(&self, _party: &PartyId, _department: &DepartmentId) -> f64 {
        1.0
    }
}

/// Table-backed strategy; pairs absent from the table are neutral.
#[derive(Clone, Debug, Default)]
pub struct TableRegionalWeights {
    factors: BTreeMap<PartyId, BTreeMap<DepartmentId, f64>>,
}

impl TableRegionalWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, party: &'static str, department: &'static str, factor: f64) -> Self {
        self.insert(PartyId::from_static(party), DepartmentId::from_static(department), factor);
        self
    }

    pub fn insert(&mut self, party: PartyId, department: DepartmentId, factor: f64) {
        self.factors.entry(party).or_default().insert(department, factor);
    }

    /// The default multiplier table: regional strongholds as of the 2020
    /// cycle (MAS in the altiplano, Creemos in the eastern lowlands, CC in
    /// the urban valley departments).
    pub fn bolivia_2025() -> Self {
        Self::new()
            .with("MAS", "La Paz", 1.30)
            .with("MAS", "Cochabamba", 1.25)
            .with("MAS", "Oruro", 1.20)
            .with("MAS", "Potosí", 1.20)
            .with("MAS", "Chuquisaca", 1.10)
            .with("MAS", "Santa Cruz", 0.70)
            .with("CC", "La Paz", 1.10)
            .with("CC", "Cochabamba", 1.05)
            .with("CC", "Tarija", 1.15)
            .with("CC", "Chuquisaca", 1.05)
            .with("Creemos", "Santa Cruz", 1.50)
            .with("Creemos", "Beni", 1.30)
            .with("Creemos", "Pando", 1.20)
            .with("Creemos", "La Paz", 0.60)
    }
}

impl RegionalWeights for TableRegionalWeights {
    fn factor(&self, party: &PartyId, department: &DepartmentId) -> f64 {
        self.factors
            .get(party)
            .and_then(|by_dept| by_dept.get(department))
            .copied()
            .unwrap_or(1.0)
    }
}

/// Cap on seats any single party may take in the fallback pass.
const FALLBACK_CAP: u32 = 2;

/// Distribute one department's seats from national shares.
///
/// Returns only parties holding at least one seat. An empty result is the
/// legitimate outcome when no party clears `threshold`.
pub fn simulate_uninominal(
    votes: &ShareMap,
    department: &DepartmentId,
    dept_seats: u32,
    threshold: f64,
    weights: &dyn RegionalWeights,
) -> BTreeMap<PartyId, u32> {
    if dept_seats == 0 {
        return BTreeMap::new();
    }
    let total = shares::total(votes);
    if total <= 0.0 {
        return BTreeMap::new();
    }

    // Regionally weighted strength of each eligible party.
    let weighted: ShareMap = votes
        .iter()
        .filter(|(_, &v)| v / total >= threshold)
        .map(|(p, &v)| (p.clone(), v * weights.factor(p, department)))
        .collect();

    let weighted_total = shares::total(&weighted);
    if weighted.is_empty() || weighted_total <= 0.0 {
        return BTreeMap::new();
    }

    // Proportional floor pass.
    let mut won: BTreeMap<PartyId, u32> = BTreeMap::new();
    for (p, &w) in &weighted {
        let floor_seats = (dept_seats as f64 * w / weighted_total).floor() as u32;
        if floor_seats > 0 {
            won.insert(p.clone(), floor_seats);
        }
    }

    // Fallback pass: strongest-first, capped per party.
    let mut remaining = dept_seats.saturating_sub(won.values().sum::<u32>());
    let mut order: Vec<(&PartyId, f64)> = weighted.iter().map(|(p, &w)| (p, w)).collect();
    order.sort_by(cmp_by_share_desc);

    let mut fallback: BTreeMap<&PartyId, u32> = BTreeMap::new();
    while remaining > 0 {
        let mut assigned_this_cycle = false;
        for &(p, _) in &order {
            if remaining == 0 {
                break;
            }
            let taken = fallback.entry(p).or_insert(0);
            if *taken >= FALLBACK_CAP {
                continue;
            }
            *taken += 1;
            *won.entry(p.clone()).or_insert(0) += 1;
            remaining -= 1;
            assigned_this_cycle = true;
        }
        if !assigned_this_cycle {
            break;
        }
    }

    won
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

    fn dept(s: &str) -> DepartmentId {
        s.parse().unwrap()
    }

    #[test]
    fn flat_weights_split_proportionally() {
        let votes = share_map(&[("A", 50.0), ("B", 30.0), ("C", 20.0)]);
        let out = simulate_uninominal(&votes, &dept("La Paz"), 10, 0.0, &FlatRegionalWeights);
        assert_eq!(out.values().sum::<u32>(), 10);
        assert_eq!(out[&party("A")], 5);
        assert_eq!(out[&party("B")], 3);
        assert_eq!(out[&party("C")], 2);
    }

    #[test]
    fn fallback_hands_remainder_to_strongest() {
        // Floors on 7 seats at 50/50: 3 + 3; the leftover goes to A (tie-break).
        let votes = share_map(&[("A", 50.0), ("B", 50.0)]);
        let out = simulate_uninominal(&votes, &dept("Beni"), 7, 0.0, &FlatRegionalWeights);
        assert_eq!(out[&party("A")], 4);
        assert_eq!(out[&party("B")], 3);
    }

    #[test]
    fn regional_factor_shifts_seats() {
        let votes = share_map(&[("MAS", 40.0), ("Creemos", 40.0), ("CC", 20.0)]);
        let table = TableRegionalWeights::bolivia_2025();
        let flat = simulate_uninominal(&votes, &dept("Santa Cruz"), 15, 0.0, &FlatRegionalWeights);
        let weighted = simulate_uninominal(&votes, &dept("Santa Cruz"), 15, 0.0, &table);
        // Creemos (×1.50) gains at MAS's (×0.70) expense in Santa Cruz.
        assert!(weighted[&party("Creemos")] > flat[&party("Creemos")]);
        assert!(weighted[&party("MAS")] < flat[&party("MAS")]);
        assert_eq!(weighted.values().sum::<u32>(), 15);
    }

    #[test]
    fn threshold_applies_before_weighting() {
        let votes = share_map(&[("A", 97.0), ("B", 3.0), ("C", 0.5)]);
        let out = simulate_uninominal(&votes, &dept("Pando"), 2, 0.03, &FlatRegionalWeights);
        assert!(!out.contains_key(&party("C")));
        assert_eq!(out.values().sum::<u32>(), 2);
    }

    #[test]
    fn empty_outcomes() {
        let votes = share_map(&[("A", 10.0), ("B", 10.0)]);
        assert!(simulate_uninominal(&votes, &dept("Beni"), 0, 0.0, &FlatRegionalWeights).is_empty());
        assert!(simulate_uninominal(&ShareMap::new(), &dept("Beni"), 4, 0.0, &FlatRegionalWeights).is_empty());
        // Nobody clears an absurd threshold.
        assert!(simulate_uninominal(&votes, &dept("Beni"), 4, 0.9, &FlatRegionalWeights).is_empty());
    }

    #[test]
    fn seats_always_exhausted() {
        for seats in 1..=20u32 {
            let votes = share_map(&[("A", 48.0), ("B", 47.0), ("C", 5.0)]);
            let out = simulate_uninominal(&votes, &dept("La Paz"), seats, 0.0, &FlatRegionalWeights);
            assert_eq!(out.values().sum::<u32>(), seats, "seats = {seats}");
        }
    }

    #[test]
    fn weak_party_fallback_bounded_by_cap() {
        // C floors to 0 (15 · 0.05 = 0.75); anything it gets comes from fallback.
        let votes = share_map(&[("A", 48.0), ("B", 47.0), ("C", 5.0)]);
        let out = simulate_uninominal(&votes, &dept("La Paz"), 15, 0.0, &FlatRegionalWeights);
        assert!(out.get(&party("C")).copied().unwrap_or(0) <= FALLBACK_CAP);
    }
}
