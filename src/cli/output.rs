use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::model::task::{Priority, ScanResult};
use crate::sync::orchestrator::CycleReport;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct CandidateJson {
    pub text: String,
    pub priority: Priority,
    pub source: PathBuf,
    pub line: usize,
}

#[derive(Serialize)]
pub struct ScanJson {
    pub candidates: Vec<CandidateJson>,
}

#[derive(Serialize)]
pub struct SyncJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregator: Option<PathBuf>,
    #[serde(flatten)]
    pub report: CycleReport,
}

pub fn candidate_to_json(result: &ScanResult) -> CandidateJson {
    CandidateJson {
        text: result.canonical_text.clone(),
        priority: result.priority,
        source: result.source.clone(),
        // 1-based, like an editor
        line: result.line_index + 1,
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::Elevated => "high",
        Priority::Standard => "medium",
        Priority::None => "-",
    }
}

/// `high    notes/plan.md:3  Book flights`
pub fn format_candidate(result: &ScanResult) -> String {
    format!(
        "{:<7} {}:{}  {}",
        priority_label(result.priority),
        result.source.display(),
        result.line_index + 1,
        result.canonical_text
    )
}

pub fn format_report(report: &CycleReport, aggregator: Option<&Path>) -> String {
    let Some(aggregator) = aggregator else {
        return "No aggregator document found; nothing synced".to_string();
    };
    if report.is_empty() {
        return format!("{}: up to date", aggregator.display());
    }
    format!(
        "{}: {} appended, {} mirrored, {} propagated to sources",
        aggregator.display(),
        report.appended,
        report.mirrored_to_aggregator,
        report.propagated_to_sources
    )
}
