// crates/ep_cli/src/main.rs
//
// Wires up: exit codes, typed error mapping, CLI parsing, the
// validate-only short-circuit, and the full run path (load → model →
// prediction → optional runoff/scenarios → artifacts → rendering).

mod args;

mod exitcodes {
    pub const OK: i32 = 0;
    pub const VALIDATION: i32 = 2;
    pub const IO: i32 = 4;
    pub const ENGINE: i32 = 5;
}

use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use args::{parse_and_validate as parse_cli, Args};

use ep_pipeline::{load_inputs, ElectoralModel, EngineError, LoadedInputs};

/// Central error type for CLI → exit-code mapping.
#[derive(Debug)]
enum MainError {
    /// Import/params shape failures and engine config rejections.
    Validation(String),
    /// Filesystem errors (read/write/path).
    Io(String),
    /// Engine failures (blend/runoff).
    Engine(String),
    /// Rendering errors (report build or output).
    Render(String),
}

fn main() -> ExitCode {
    let args = match parse_cli() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("ep: error: {e}");
            return ExitCode::from(exitcodes::VALIDATION as u8);
        }
    };

    let rc = match run_once(&args) {
        Ok(()) => exitcodes::OK,
        Err(e) => {
            eprintln!("ep: error: {e}");
            map_error(&e)
        }
    };
    ExitCode::from(rc as u8)
}

/// Map typed errors to the exit-code table.
fn map_error(e: &MainError) -> i32 {
    use exitcodes::*;
    match e {
        MainError::Validation(_) => VALIDATION,
        MainError::Io(_) => IO,
        MainError::Engine(_) => ENGINE,
        MainError::Render(_) => IO,
    }
}

impl std::fmt::Display for MainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainError::Validation(m) => write!(f, "validation: {m}"),
            MainError::Io(m) => write!(f, "io: {m}"),
            MainError::Engine(m) => write!(f, "engine: {m}"),
            MainError::Render(m) => write!(f, "render: {m}"),
        }
    }
}

/// Translate ep_io::IoError into MainError buckets.
fn map_io_err(e: ep_io::IoError) -> MainError {
    use ep_io::IoError::*;
    match e {
        Path(m) => MainError::Io(m),
        Csv(m) | Xlsx(m) | Json(m) => MainError::Validation(m),
        Table { location, msg } => MainError::Validation(format!("{location}: {msg}")),
        Params(m) => MainError::Validation(m),
    }
}

fn map_engine_err(e: EngineError) -> MainError {
    match e {
        EngineError::Config(m) => MainError::Validation(m),
        EngineError::Io(m) => MainError::Io(m),
        other => MainError::Engine(other.to_string()),
    }
}

fn run_once(args: &Args) -> Result<(), MainError> {
    // --- LOAD (+ import warnings) ---
    let LoadedInputs { historical, polls, params, warnings } = load_inputs(
        args.historical.as_deref(),
        args.polls.as_deref(),
        args.params.as_deref(),
    )
    .map_err(map_io_err)?;

    if !args.quiet {
        for w in &warnings {
            eprintln!("ep: warning: {w}");
        }
    }

    if args.validate_only {
        if !args.quiet {
            eprintln!("validate-only: inputs OK ({} warning(s))", warnings.len());
        }
        return Ok(());
    }

    // --- MODEL + RUN ---
    let model = ElectoralModel::new(historical, polls, params).map_err(map_engine_err)?;
    let seed = args.seed.unwrap_or_else(wall_clock_seed);

    let mut result = model.run_prediction(seed).map_err(map_engine_err)?;

    if args.runoff && result.runoff.required {
        let second = model.run_runoff(&result).map_err(map_engine_err)?;
        result.runoff.second_round = Some(second);
    }

    // --- ARTIFACTS ---
    std::fs::create_dir_all(&args.out).map_err(|e| MainError::Io(e.to_string()))?;
    let result_path = args.out.join("result.json");
    ep_io::artifact::write_json(&result_path, &result).map_err(map_io_err)?;

    if let Some(runs) = args.scenarios {
        let summary = model.simulate_scenarios(runs, seed).map_err(map_engine_err)?;
        let path = args.out.join("scenarios.json");
        ep_io::artifact::write_json(&path, &summary).map_err(map_io_err)?;
        if !args.quiet {
            eprintln!(
                "scenarios: {}/{} runs triggered a runoff",
                summary.runoff_runs, summary.runs
            );
        }
    }

    // --- RENDER ---
    render(args, &result)?;

    if !args.quiet {
        let outcome = if result.runoff.required { "segunda vuelta" } else { "primera vuelta" };
        eprintln!(
            "prediction complete ({outcome}, seed {seed}); artifacts in {}",
            args.out.display()
        );
    }
    Ok(())
}

fn render(args: &Args, result: &ep_pipeline::PredictionResult) -> Result<(), MainError> {
    if args.render.is_empty() {
        return Ok(());
    }
    let report = ep_report::build_model(result);

    for kind in &args.render {
        match kind.as_str() {
            "json" => {
                #[cfg(feature = "report-json")]
                {
                    let text = ep_report::render_json(&report)
                        .map_err(|e| MainError::Render(e.to_string()))?;
                    std::fs::write(args.out.join("report.json"), text)
                        .map_err(|e| MainError::Io(e.to_string()))?;
                }
                #[cfg(not(feature = "report-json"))]
                return Err(MainError::Render("json renderer not built in".into()));
            }
            "html" => {
                #[cfg(feature = "report-html")]
                {
                    let text = ep_report::render_html(&report)
                        .map_err(|e| MainError::Render(e.to_string()))?;
                    std::fs::write(args.out.join("report.html"), text)
                        .map_err(|e| MainError::Io(e.to_string()))?;
                }
                #[cfg(not(feature = "report-html"))]
                return Err(MainError::Render("html renderer not built in".into()));
            }
            other => return Err(MainError::Render(format!("unknown renderer: {other}"))),
        }
    }
    Ok(())
}

/// Non-reproducible fallback seed; `--seed` is the deterministic path.
fn wall_clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
