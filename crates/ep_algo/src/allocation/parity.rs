//! Gender-parity split and seat-map helpers.
//!
//! Parity is a post-processing step: it never changes which party wins a
//! seat, only labels already-awarded seats under a 50/50 target. The odd
//! seat goes to men (`men = total - total/2`) — preserved source behavior,
//! kept as-is pending a policy decision.

use ep_core::parties::PartyId;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A party's awarded seats with the women/men split.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SeatAllocation {
    pub total: u32,
    pub women: u32,
    pub men: u32,
}

impl SeatAllocation {
    /// Split `total` seats: `women = total / 2` (floor), remainder to men.
    pub fn split(total: u32) -> Self {
        let women = total / 2;
        Self { total, women, men: total - women }
    }
}

/// Apply the parity split to every party in a seat map. Zero-seat entries
/// map to the all-zero allocation.
pub fn apply_gender_parity(
    seats: &BTreeMap<PartyId, u32>,
) -> BTreeMap<PartyId, SeatAllocation> {
    seats
        .iter()
        .map(|(p, &total)| (p.clone(), SeatAllocation::split(total)))
        .collect()
}

/// Party holding the most seats; ties go to the lexicographically first.
/// `None` on an empty map.
pub fn majority_party(seats: &BTreeMap<PartyId, u32>) -> Option<PartyId> {
    let mut best: Option<(&PartyId, u32)> = None;
    for (p, &s) in seats {
        match best {
            Some((_, top)) if s <= top => {}
            _ => best = Some((p, s)),
        }
    }
    best.map(|(p, _)| p.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat_map(pairs: &[(&str, u32)]) -> BTreeMap<PartyId, u32> {
        pairs.iter().map(|&(p, s)| (p.parse().unwrap(), s)).collect()
    }

    #[test]
    fn split_floors_women_and_conserves_total() {
        for total in 0..=25u32 {
            let a = SeatAllocation::split(total);
            assert_eq!(a.women + a.men, total);
            assert_eq!(a.women, total / 2);
        }
        // Odd seat goes to men.
        let odd = SeatAllocation::split(7);
        assert_eq!((odd.women, odd.men), (3, 4));
    }

    #[test]
    fn parity_covers_every_party_including_zero() {
        let out = apply_gender_parity(&seat_map(&[("MAS", 5), ("CC", 0)]));
        assert_eq!(out[&"MAS".parse::<PartyId>().unwrap()], SeatAllocation { total: 5, women: 2, men: 3 });
        assert_eq!(out[&"CC".parse::<PartyId>().unwrap()], SeatAllocation::default());
    }

    #[test]
    fn majority_party_breaks_ties_lexicographically() {
        assert_eq!(majority_party(&seat_map(&[])), None);
        let m = seat_map(&[("CC", 12), ("MAS", 20), ("Creemos", 4)]);
        assert_eq!(majority_party(&m).unwrap().as_str(), "MAS");
        let tied = seat_map(&[("CC", 12), ("MAS", 12)]);
        assert_eq!(majority_party(&tied).unwrap().as_str(), "CC");
    }
}
