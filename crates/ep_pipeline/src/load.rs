//! LOAD stage: wire `ep_io` readers into model inputs.
//!
//! Every path is optional — omitted inputs fall back to the built-in
//! datasets/defaults so a bare invocation still produces a run. Import
//! warnings (rows not summing to 100) ride along with the data; they are
//! reported, never fatal.

use std::path::Path;

use ep_core::shares::{HistoricalRecord, PollSet};
use ep_core::variables::{self, Params};
use ep_io::tabular::{read_historical, read_polls, ImportWarning};
use ep_io::IoResult;

/// Inputs assembled for one engine run.
#[derive(Clone, Debug)]
pub struct LoadedInputs {
    pub historical: HistoricalRecord,
    pub polls: PollSet,
    pub params: Params,
    pub warnings: Vec<ImportWarning>,
}

/// Load inputs from the given paths, defaulting whatever is omitted.
pub fn load_inputs(
    historical_path: Option<&Path>,
    polls_path: Option<&Path>,
    params_path: Option<&Path>,
) -> IoResult<LoadedInputs> {
    let mut warnings = Vec::new();

    let historical = match historical_path {
        Some(path) => {
            let imported = read_historical(path)?;
            warnings.extend(imported.warnings);
            imported.data
        }
        None => variables::default_historical(),
    };

    let polls = match polls_path {
        Some(path) => {
            let imported = read_polls(path)?;
            warnings.extend(imported.warnings);
            imported.data
        }
        None => variables::default_polls(),
    };

    let params = match params_path {
        Some(path) => ep_io::artifact::load_params(path)?,
        None => Params::default(),
    };

    Ok(LoadedInputs { historical, polls, params, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_cover_omitted_paths() {
        let loaded = load_inputs(None, None, None).unwrap();
        assert!(loaded.historical.contains_key(&2020));
        assert_eq!(loaded.polls.len(), 3);
        assert!(loaded.warnings.is_empty());
        assert_eq!(loaded.params, Params::default());
    }

    #[test]
    fn file_warnings_are_carried() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hist.csv");
        fs::write(&path, "Año,MAS,CC\n2020,50.0,30.0\n").unwrap();
        let loaded = load_inputs(Some(&path), None, None).unwrap();
        assert_eq!(loaded.warnings.len(), 1);
        assert_eq!(loaded.historical.len(), 1);
    }
}
