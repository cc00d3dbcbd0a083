//! ep_report — pure offline report model + renderers (JSON/HTML).
//!
//! Determinism rules:
//! - No network, no I/O here. Callers supply an in-memory `PredictionResult`.
//! - Stable section order and field names; tables sort share-descending.
//! - Percent strings carry one decimal.
//!
//! The facets mirror the workbook the original exporter produced: vote
//! prediction, senate, plurinominal deputies, uninominal deputies,
//! per-department breakdown, consolidated summary — plus the runoff block
//! and an integrity footer (engine identifiers, jitter seed).

#![forbid(unsafe_code)]

use ep_core::determinism::rank_by_share;
use ep_pipeline::{PredictionResult, SeatDetail};
use serde::Serialize;
use std::collections::BTreeMap;

// ===== Errors =====

#[derive(Debug)]
pub enum ReportError {
    Template(&'static str),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Template(t) => write!(f, "template error: {t}"),
        }
    }
}

impl std::error::Error for ReportError {}

// ===== Model =====

#[derive(Clone, Debug, Serialize)]
pub struct ReportModel {
    pub cover: SectionCover,
    pub prediction: SectionPrediction,
    pub runoff: SectionRunoff,
    pub senate: SectionChamber,
    pub plurinominal: SectionChamber,
    pub uninominal: SectionChamber,
    pub departments: SectionDepartments,
    pub summary: SectionSummary,
    pub integrity: SectionIntegrity,
}

#[derive(Clone, Debug, Serialize)]
pub struct SectionCover {
    pub title: String,
    /// "Primera vuelta decisiva" | "Segunda vuelta requerida"
    pub outcome: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ShareRow {
    pub party: String,
    pub share_pct: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct SectionPrediction {
    pub rows: Vec<ShareRow>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SectionRunoff {
    pub required: bool,
    pub candidates: Vec<String>,
    /// Simulated second round, when the caller ran it.
    pub second_round: Vec<ShareRow>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SeatRow {
    pub party: String,
    pub seats: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub women: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub men: Option<u32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SectionChamber {
    pub title: String,
    pub total_seats: u32,
    pub rows: Vec<SeatRow>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DepartmentRow {
    pub department: String,
    pub party: String,
    pub seats: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct SectionDepartments {
    pub rows: Vec<DepartmentRow>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SummaryRow {
    pub party: String,
    pub senate: u32,
    pub plurinominal: u32,
    pub uninominal: u32,
    pub total_deputies: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct SectionSummary {
    pub rows: Vec<SummaryRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub majority_party: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SectionIntegrity {
    pub engine_name: String,
    pub engine_version: String,
    pub jitter_seed: u64,
}

// ===== API =====

/// Build the report model from a prediction result (pure, offline).
pub fn build_model(result: &PredictionResult) -> ReportModel {
    let outcome = if result.runoff.required {
        "Segunda vuelta requerida".to_string()
    } else {
        "Primera vuelta decisiva".to_string()
    };

    let prediction_rows = rank_by_share(&result.shares)
        .into_iter()
        .map(|(p, v)| ShareRow { party: p.to_string(), share_pct: pct_1dp(v) })
        .collect();

    let second_round = result
        .runoff
        .second_round
        .as_ref()
        .map(|shares| {
            rank_by_share(shares)
                .into_iter()
                .map(|(p, v)| ShareRow { party: p.to_string(), share_pct: pct_1dp(v) })
                .collect()
        })
        .unwrap_or_default();

    let seats = &result.seats;
    ReportModel {
        cover: SectionCover {
            title: "Predicción Electoral Bolivia".to_string(),
            outcome,
        },
        prediction: SectionPrediction { rows: prediction_rows },
        runoff: SectionRunoff {
            required: result.runoff.required,
            candidates: result.runoff.candidates.iter().map(|p| p.to_string()).collect(),
            second_round,
        },
        senate: chamber_section("Senadores", &seats.senate, seats.parity.as_ref().map(|p| &p.senate)),
        plurinominal: chamber_section(
            "Diputados Plurinominales",
            &seats.plurinominal,
            seats.parity.as_ref().map(|p| &p.plurinominal),
        ),
        uninominal: chamber_section("Diputados Uninominales", &seats.uninominal, None),
        departments: departments_section(seats),
        summary: summary_section(result),
        integrity: SectionIntegrity {
            engine_name: result.engine.name.clone(),
            engine_version: result.engine.version.clone(),
            jitter_seed: result.jitter_seed,
        },
    }
}

fn chamber_section(
    title: &str,
    seats: &BTreeMap<ep_core::parties::PartyId, u32>,
    parity: Option<&BTreeMap<ep_core::parties::PartyId, ep_pipeline::SeatAllocation>>,
) -> SectionChamber {
    let mut rows: Vec<SeatRow> = seats
        .iter()
        .map(|(p, &s)| {
            let split = parity.and_then(|m| m.get(p));
            SeatRow {
                party: p.to_string(),
                seats: s,
                women: split.map(|a| a.women),
                men: split.map(|a| a.men),
            }
        })
        .collect();
    // Seats descending, then party name for stable presentation.
    rows.sort_by(|a, b| b.seats.cmp(&a.seats).then_with(|| a.party.cmp(&b.party)));
    SectionChamber {
        title: title.to_string(),
        total_seats: seats.values().sum(),
        rows,
    }
}

fn departments_section(seats: &SeatDetail) -> SectionDepartments {
    let mut rows = Vec::new();
    for (department, dept_map) in &seats.uninominal_by_department {
        for (party, &won) in dept_map {
            rows.push(DepartmentRow {
                department: department.to_string(),
                party: party.to_string(),
                seats: won,
            });
        }
    }
    SectionDepartments { rows }
}

fn summary_section(result: &PredictionResult) -> SectionSummary {
    let seats = &result.seats;
    let mut parties: std::collections::BTreeSet<&ep_core::parties::PartyId> =
        seats.senate.keys().collect();
    parties.extend(seats.total_deputies.keys());

    let rows = parties
        .into_iter()
        .map(|p| SummaryRow {
            party: p.to_string(),
            senate: seats.senate.get(p).copied().unwrap_or(0),
            plurinominal: seats.plurinominal.get(p).copied().unwrap_or(0),
            uninominal: seats.uninominal.get(p).copied().unwrap_or(0),
            total_deputies: seats.total_deputies.get(p).copied().unwrap_or(0),
        })
        .collect();

    SectionSummary {
        rows,
        majority_party: result.majority_party.as_ref().map(|p| p.to_string()),
    }
}

/// One-decimal percent string.
fn pct_1dp(v: f64) -> String {
    format!("{v:.1}%")
}

// ===== Renderers =====

/// Serialize the model as JSON (deterministic field order courtesy of struct layout).
#[cfg(feature = "render_json")]
pub fn render_json(model: &ReportModel) -> Result<String, ReportError> {
    serde_json::to_string_pretty(model).map_err(|_| ReportError::Template("json_serialize"))
}

/// Render a compact HTML summary using an embedded template (no external assets).
#[cfg(feature = "render_html")]
pub fn render_html(model: &ReportModel) -> Result<String, ReportError> {
    use minijinja::{value::Value, Environment};

    static TEMPLATE: &str = r#"<!doctype html>
<html lang="es"><meta charset="utf-8">
<title>{{ cover.title }}</title>
<h1>{{ cover.title }}</h1>
<p><strong>{{ cover.outcome }}</strong></p>

<h2>Predicción de votos</h2>
<table border="1">
<tr><th>Partido</th><th>Votos</th></tr>
{% for r in prediction.rows %}<tr><td>{{ r.party }}</td><td>{{ r.share_pct }}</td></tr>
{% endfor %}</table>

{% if runoff.required %}
<h2>Segunda vuelta</h2>
<p>Candidatos: {{ runoff.candidates | join(", ") }}</p>
{% if runoff.second_round %}
<table border="1">
<tr><th>Partido</th><th>Votos</th></tr>
{% for r in runoff.second_round %}<tr><td>{{ r.party }}</td><td>{{ r.share_pct }}</td></tr>
{% endfor %}</table>
{% endif %}
{% endif %}

{% for chamber in [senate, plurinominal, uninominal] %}
<h2>{{ chamber.title }} ({{ chamber.total_seats }} escaños)</h2>
<table border="1">
<tr><th>Partido</th><th>Escaños</th>{% if chamber.rows and chamber.rows[0].women is defined %}<th>Mujeres</th><th>Hombres</th>{% endif %}</tr>
{% for r in chamber.rows %}<tr><td>{{ r.party }}</td><td>{{ r.seats }}</td>{% if r.women is defined %}<td>{{ r.women }}</td><td>{{ r.men }}</td>{% endif %}</tr>
{% endfor %}</table>
{% endfor %}

<h2>Uninominales por departamento</h2>
<table border="1">
<tr><th>Departamento</th><th>Partido</th><th>Escaños</th></tr>
{% for r in departments.rows %}<tr><td>{{ r.department }}</td><td>{{ r.party }}</td><td>{{ r.seats }}</td></tr>
{% endfor %}</table>

<h2>Resumen consolidado</h2>
<table border="1">
<tr><th>Partido</th><th>Senadores</th><th>Plurinominales</th><th>Uninominales</th><th>Total Diputados</th></tr>
{% for r in summary.rows %}<tr><td>{{ r.party }}</td><td>{{ r.senate }}</td><td>{{ r.plurinominal }}</td><td>{{ r.uninominal }}</td><td>{{ r.total_deputies }}</td></tr>
{% endfor %}</table>
{% if summary.majority_party %}<p>Mayoría en diputados: <strong>{{ summary.majority_party }}</strong></p>{% endif %}

<hr>
<p>{{ integrity.engine_name }} v{{ integrity.engine_version }} — semilla {{ integrity.jitter_seed }}</p>
</html>
"#;

    let mut env = Environment::new();
    env.add_template("report.html", TEMPLATE)
        .map_err(|_| ReportError::Template("add_template"))?;
    let tmpl = env
        .get_template("report.html")
        .map_err(|_| ReportError::Template("get_template"))?;
    tmpl.render(Value::from_serialize(model))
        .map_err(|_| ReportError::Template("render_html"))
}
