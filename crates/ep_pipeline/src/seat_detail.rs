//! SEAT DETAIL stage: three independent pools over one vote map.
//!
//! - Senate: national-list D'Hondt.
//! - Plurinominal deputies: national-list D'Hondt, separate seat pool.
//! - Uninominal deputies: per-department simulation from national shares
//!   (no D'Hondt — districts have no own polling in this model).
//!
//! The pools share nothing but the input map: a pool with no eligible
//! parties comes back empty without touching the other two, and a party
//! can hold senate seats with zero deputies or vice versa. Deputy totals
//! merge plurinominal + Σ uninominal. When gender parity is configured
//! the merged maps are additionally split into women/men counts.

use std::collections::BTreeMap;

use ep_algo::{
    apply_gender_parity, apportion_dhondt, simulate_uninominal, RegionalWeights, SeatAllocation,
};
use ep_core::parties::{DepartmentId, PartyId};
use ep_core::shares::ShareMap;
use ep_core::variables::Params;
use serde::{Deserialize, Serialize};

/// Full seat breakdown for one prediction run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatDetail {
    pub senate: BTreeMap<PartyId, u32>,
    pub plurinominal: BTreeMap<PartyId, u32>,
    /// Per-party uninominal totals across all departments.
    pub uninominal: BTreeMap<PartyId, u32>,
    pub uninominal_by_department: BTreeMap<DepartmentId, BTreeMap<PartyId, u32>>,
    /// plurinominal + uninominal, per party.
    pub total_deputies: BTreeMap<PartyId, u32>,
    /// Women/men splits; present iff `Params::gender_parity`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parity: Option<ParityDetail>,
}

/// Gender-parity splits of the per-chamber seat maps.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParityDetail {
    pub senate: BTreeMap<PartyId, SeatAllocation>,
    pub plurinominal: BTreeMap<PartyId, SeatAllocation>,
    pub total_deputies: BTreeMap<PartyId, SeatAllocation>,
}

/// Compose the full seat detail from a (percentage) share map.
pub fn compose(votes: &ShareMap, params: &Params, weights: &dyn RegionalWeights) -> SeatDetail {
    let senate = apportion_dhondt(votes, params.senate_seats, params.min_threshold);
    let plurinominal = apportion_dhondt(votes, params.plurinominal_seats, params.min_threshold);

    let mut uninominal_by_department = BTreeMap::new();
    let mut uninominal: BTreeMap<PartyId, u32> = BTreeMap::new();
    for (department, &dept_seats) in &params.uninominal_seats {
        let dept_result =
            simulate_uninominal(votes, department, dept_seats, params.min_threshold, weights);
        for (p, &s) in &dept_result {
            *uninominal.entry(p.clone()).or_insert(0) += s;
        }
        uninominal_by_department.insert(department.clone(), dept_result);
    }

    let mut total_deputies = plurinominal.clone();
    for (p, &s) in &uninominal {
        *total_deputies.entry(p.clone()).or_insert(0) += s;
    }

    let parity = params.gender_parity.then(|| ParityDetail {
        senate: apply_gender_parity(&senate),
        plurinominal: apply_gender_parity(&plurinominal),
        total_deputies: apply_gender_parity(&total_deputies),
    });

    SeatDetail {
        senate,
        plurinominal,
        uninominal,
        uninominal_by_department,
        total_deputies,
        parity,
    }
}
