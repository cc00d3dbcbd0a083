//! D'Hondt (highest averages) allocation over a share map.
//!
//! Contract:
//! - Apply the entry threshold on shares relative to the map's own total.
//! - Allocate `seats` sequentially by picking max of v/(s+1).
//! - Quotients are *recomputed from the original vote value* after each
//!   award rather than kept as a divisor table; the two forms are
//!   equivalent, but the recomputation form matches the source model's
//!   float arithmetic bit-for-bit.
//! - Exact quotient ties go to the first party in canonical order
//!   (lexicographic id — the scan uses a strict `>`).
//! - An empty pool (zero total, or no party clearing the threshold) is a
//!   legitimate outcome and returns an empty map, not an error.
//! - Parties that never win a seat are absent from the result; callers
//!   treat missing keys as 0.

use ep_core::parties::PartyId;
use ep_core::shares::{self, ShareMap};
use std::collections::BTreeMap;

/// Allocate `seats` using the D'Hondt (highest averages) method.
///
/// `threshold` is fractional (0.03 = 3%) and is applied against the sum of
/// the provided shares. If `seats == 0`, returns an empty map.
pub fn apportion_dhondt(
    votes: &ShareMap,
    seats: u32,
    threshold: f64,
) -> BTreeMap<PartyId, u32> {
    if seats == 0 {
        return BTreeMap::new();
    }

    let total = shares::total(votes);
    if total <= 0.0 {
        return BTreeMap::new();
    }

    // 1) Threshold on the map's own total.
    let eligible: BTreeMap<&PartyId, f64> = votes
        .iter()
        .filter(|(_, &v)| v / total >= threshold)
        .map(|(p, &v)| (p, v))
        .collect();

    if eligible.is_empty() {
        return BTreeMap::new();
    }

    // 2) Running quotients start at the raw vote value (divisor 1).
    let mut quotients: BTreeMap<&PartyId, f64> = eligible.clone();
    let mut won: BTreeMap<&PartyId, u32> = BTreeMap::new();

    // 3) Sequential awards; the scan order is canonical, so the strict `>`
    //    hands exact ties to the lexicographically first party.
    for _round in 0..seats {
        let mut winner: Option<(&PartyId, f64)> = None;
        for (&p, &q) in &quotients {
            match winner {
                Some((_, best)) if q <= best => {}
                _ => winner = Some((p, q)),
            }
        }
        let (winner, _) = winner.expect("eligible set is non-empty");

        let s = won.entry(winner).or_insert(0);
        *s += 1;
        quotients.insert(winner, eligible[winner] / (*s as f64 + 1.0));
    }

    won.into_iter().map(|(p, s)| (p.clone(), s)).collect()
}
