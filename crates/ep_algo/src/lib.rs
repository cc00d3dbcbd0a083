// crates/ep_algo/src/lib.rs
#![forbid(unsafe_code)]

//! Algorithm layer for the EP engine.
//!
//! Pure functions over `ep_core` types: the prediction blender, the runoff
//! (segunda vuelta) evaluator/simulator, D'Hondt seat allocation with the
//! gender-parity split, and the uninominal department simulation. Every
//! scan runs in canonical party order (`BTreeMap` iteration), so exact
//! ties resolve to the lexicographically first party — deterministically,
//! on every platform.

// Core types re-exported for caller ergonomics
pub use ep_core::{
    parties::{DepartmentId, PartyId},
    shares::ShareMap,
};

// ----------------------------- Blend & runoff (public surface) -----------------------------

#[cfg(feature = "blend")]
pub mod blend;
#[cfg(feature = "runoff")]
pub mod runoff;

#[cfg(feature = "blend")]
pub use blend::{blend, BlendError};
#[cfg(feature = "runoff")]
pub use runoff::{evaluate, simulate, RunoffDecision, RunoffError};

// ----------------------------- Allocation (public surface) ---------------------------

#[cfg(feature = "pr_methods")]
pub mod allocation {
    // File modules (actual implementations)
    pub mod dhondt;
    pub mod parity;

    pub use dhondt::apportion_dhondt;
    pub use parity::{apply_gender_parity, majority_party, SeatAllocation};
}

#[cfg(feature = "pr_methods")]
pub mod uninominal;

// Tight, explicit re-exports (avoid wildcard export drift).
#[cfg(feature = "pr_methods")]
pub use allocation::{apply_gender_parity, apportion_dhondt, majority_party, SeatAllocation};
#[cfg(feature = "pr_methods")]
pub use uninominal::{simulate_uninominal, FlatRegionalWeights, RegionalWeights, TableRegionalWeights};
