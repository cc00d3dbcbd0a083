//! ep_core — Core types, parameter domains, ordering helpers, and seeded jitter RNG.
//!
//! This crate is **I/O-free**. It defines stable types/APIs used across the
//! engine (`ep_io`, `ep_algo`, `ep_pipeline`, `ep_report`, `ep_cli`).
//!
//! - Registry tokens: `PartyId`, `DepartmentId`
//! - Share maps: `ShareMap`, `HistoricalRecord`, `PollSet`
//! - Model parameters: `Params`, `TrendAdjustment`
//! - Deterministic ordering helpers (share-descending with lexicographic ties)
//! - Seedable RNG (ChaCha20) for **prediction jitter only**
//!
//! Serialization derives are gated behind the `serde` feature.

#![forbid(unsafe_code)]

pub mod rng;
pub mod variables;

pub mod errors {
    use core::fmt;

    /// Minimal error set for core-domain validation & parsing.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub enum CoreError {
        InvalidName,
        DomainOutOfRange(&'static str),
    }

    impl fmt::Display for CoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                CoreError::InvalidName => write!(f, "invalid name"),
                CoreError::DomainOutOfRange(k) => write!(f, "domain out of range: {k}"),
            }
        }
    }

    impl std::error::Error for CoreError {}
}

pub mod parties {
    //! Newtypes for party and department identifiers.
    //!
    //! Names are real-world labels ("MAS", "La Paz", "Potosí"): any
    //! non-control Unicode is accepted, 1..=64 chars, no surrounding
    //! whitespace. `Ord` on the inner string gives every `BTreeMap` keyed
    //! by these tokens a canonical lexicographic iteration order, which is
    //! the engine-wide deterministic tie-break.

    use crate::errors::CoreError;
    use core::fmt;
    use core::str::FromStr;

    #[cfg(feature = "serde")]
    use serde::{Deserialize, Serialize};

    fn is_name(s: &str) -> bool {
        let n = s.chars().count();
        (1..=64).contains(&n)
            && !s.chars().any(char::is_control)
            && s.trim() == s
    }

    macro_rules! def_name_token {
        ($name:ident) => {
            #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
            #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
            #[cfg_attr(feature = "serde", serde(transparent))]
            pub struct $name(String);

            impl $name {
                pub fn new(s: impl Into<String>) -> Result<Self, CoreError> {
                    let s = s.into();
                    if is_name(&s) { Ok(Self(s)) } else { Err(CoreError::InvalidName) }
                }

                /// Infallible constructor for compile-time-known names.
                /// Panics on an invalid literal; use only with constants.
                pub fn from_static(s: &'static str) -> Self {
                    debug_assert!(is_name(s), "invalid static name: {s:?}");
                    Self(s.to_string())
                }

                pub fn as_str(&self) -> &str { &self.0 }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl FromStr for $name {
                type Err = CoreError;
                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    Self::new(s)
                }
            }
        };
    }

    def_name_token!(PartyId);
    def_name_token!(DepartmentId);

}

pub mod shares {
    //! Vote-share containers and numeric helpers.

    use crate::parties::PartyId;
    use std::collections::BTreeMap;

    /// Party → non-negative percentage. Values need not sum to 100; the
    /// engine normalizes before apportionment.
    pub type ShareMap = BTreeMap<PartyId, f64>;

    /// Election year → shares. Only the greatest year key is ever used as
    /// the historical baseline.
    pub type HistoricalRecord = BTreeMap<u16, ShareMap>;

    /// Poll identifier → shares. A party absent from a poll counts as an
    /// explicit 0 for that poll when averaging.
    pub type PollSet = BTreeMap<String, ShareMap>;

    /// Sum of all share values.
    pub fn total(shares: &ShareMap) -> f64 {
        shares.values().sum()
    }

    /// Scale `shares` in place so values sum to 100. Returns `false`
    /// (leaving the map untouched) when the current sum is not positive.
    pub fn normalize_to_100(shares: &mut ShareMap) -> bool {
        let sum = total(shares);
        if sum <= 0.0 {
            return false;
        }
        for v in shares.values_mut() {
            *v = (*v / sum) * 100.0;
        }
        true
    }
}

pub mod determinism {
    //! Stable ordering helpers.
    //!
    //! Share comparisons sort descending; equal shares fall back to
    //! lexicographic party id so rankings never depend on map internals.

    use crate::parties::PartyId;
    use crate::shares::ShareMap;
    use core::cmp::Ordering;

    /// Compare two `(party, share)` pairs: share descending, then id ascending.
    pub fn cmp_by_share_desc(a: &(&PartyId, f64), b: &(&PartyId, f64)) -> Ordering {
        match b.1.partial_cmp(&a.1) {
            Some(Ordering::Equal) | None => a.0.cmp(b.0),
            Some(o) => o,
        }
    }

    /// Rank parties by share descending (lexicographic tie-break).
    pub fn rank_by_share(shares: &ShareMap) -> Vec<(&PartyId, f64)> {
        let mut ranked: Vec<(&PartyId, f64)> = shares.iter().map(|(p, &v)| (p, v)).collect();
        ranked.sort_by(cmp_by_share_desc);
        ranked
    }

}
