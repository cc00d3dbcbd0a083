// crates/ep_cli/src/args.rs
//
// Deterministic, offline CLI argument parsing surface.
//
// Rules:
// - No networked paths (reject any scheme:// like http/https/file)
// - All inputs optional: omitted files fall back to the built-in datasets
// - Output: --out dir, --render [json|html]*
// - Seed accepts u64 decimal or 0x-hex up to 16 nybbles
// - --validate-only performs load + import checks without running the engine

use clap::Parser;
use std::path::{Path, PathBuf};

/// Parsed CLI arguments (raw).
#[derive(Debug, Parser, Clone)]
#[command(
    name = "ep",
    disable_help_subcommand = true,
    about = "Offline, deterministic CLI for the EP electoral prediction engine"
)]
pub struct Args {
    // --- Inputs (all optional; defaults are the built-in datasets) ---
    /// Historical results table (CSV/XLSX, id column `Año`).
    #[arg(long)]
    pub historical: Option<PathBuf>,
    /// Poll table (CSV/XLSX, id column `Encuesta`).
    #[arg(long)]
    pub polls: Option<PathBuf>,
    /// Model parameters JSON (partial files take defaults).
    #[arg(long)]
    pub params: Option<PathBuf>,

    // --- Output & rendering ---
    /// Output directory (default: current directory).
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
    /// Renderer(s) to emit. Choose up to 2 (json, html). Omit to skip rendering.
    #[arg(long, value_parser = ["json", "html"], num_args = 0..=2)]
    pub render: Vec<String>,

    // --- Determinism & control ---
    /// Jitter RNG seed. Accepts decimal u64 or 0x-hex (≤16 hex digits).
    /// Omitted: derived from the wall clock (non-reproducible by design).
    #[arg(long, value_parser = parse_seed)]
    pub seed: Option<u64>,

    /// Also simulate the second round when the first round triggers one.
    #[arg(long)]
    pub runoff: bool,

    /// Monte-Carlo sweep: run N independent predictions and write the summary.
    #[arg(long, value_name = "N")]
    pub scenarios: Option<u32>,

    /// Validate inputs only (load + import checks), do not run the engine.
    #[arg(long)]
    pub validate_only: bool,

    /// Suppress non-essential stderr output (including import warnings).
    #[arg(long)]
    pub quiet: bool,
}

/// Errors surfaced by argument parsing/validation.
/// Keep messages short/stable (handy for scripts/tests).
#[derive(Debug)]
pub enum CliError {
    NonLocalPath(String),
    NotFound(String),
    BadScenarios(&'static str),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CliError::*;
        match self {
            NonLocalPath(p) => write!(f, "path must be a local file (no scheme): {p}"),
            NotFound(p) => write!(f, "file not found: {p}"),
            BadScenarios(s) => write!(f, "invalid --scenarios: {s}"),
        }
    }
}
impl std::error::Error for CliError {}

/// Seed parser: decimal u64 or 0x-hex (1..=16 nybbles).
pub fn parse_seed(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty seed".into());
    }
    if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if rest.is_empty() || rest.len() > 16 || !rest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err("hex seed must be 1..16 hex digits".into());
        }
        u64::from_str_radix(rest, 16).map_err(|_| "hex seed out of range".into())
    } else {
        s.parse::<u64>().map_err(|_| "decimal seed must be a valid u64".into())
    }
}

/// Reject any explicit URI scheme (e.g., http://, https://, file://).
#[inline]
fn has_scheme(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    lower.contains("://") || lower.starts_with("http:") || lower.starts_with("https:") || lower.starts_with("file:")
}

/// Ensure a provided path string is local (no scheme).
#[inline]
fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    if let Some(s) = p.to_str() {
        if has_scheme(s) {
            return Err(CliError::NonLocalPath(s.to_string()));
        }
    }
    Ok(())
}

/// Parse argv and enforce the filesystem/shape rules clap can't express.
pub fn parse_and_validate() -> Result<Args, CliError> {
    let args = Args::parse();
    validate(&args)?;
    Ok(args)
}

/// Validation split out so tests can exercise it without argv.
pub fn validate(args: &Args) -> Result<(), CliError> {
    for path in [&args.historical, &args.polls, &args.params]
        .into_iter()
        .flatten()
    {
        ensure_local_path(path)?;
        if !path.is_file() {
            return Err(CliError::NotFound(path.display().to_string()));
        }
    }
    ensure_local_path(&args.out)?;
    if args.scenarios == Some(0) {
        return Err(CliError::BadScenarios("must be at least 1"));
    }
    Ok(())
}
