//! Params loading and JSON artifact writing.
//!
//! Artifacts are plain pretty-printed JSON with stable field order
//! (struct layout plus `BTreeMap` keys); no canonicalization or hashing —
//! results are data for downstream renderers, not hash-addressed records.

use std::fs;
use std::path::Path;

use ep_core::variables::Params;
use serde::Serialize;

use crate::{IoError, IoResult};

/// Load and validate model parameters from a JSON file.
///
/// Missing fields take their defaults (`Params` is `serde(default)`), so a
/// config file may specify only the knobs it changes.
pub fn load_params(path: &Path) -> IoResult<Params> {
    let bytes = fs::read(path)?;
    let params: Params = serde_json::from_slice(&bytes)?;
    params
        .validate()
        .map_err(|e| IoError::Params(e.to_string()))?;
    Ok(params)
}

/// Write any serializable value as a pretty JSON artifact.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> IoResult<()> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    fs::write(path, text)?;
    Ok(())
}
