// Parsing and file helpers for civil times, window batches and exports
use crate::error::{PlannerError, PlannerResult};
use crate::evaluator::{MeetingWindow, WindowEvaluation};
use crate::recommender::CandidateOption;
use chrono::NaiveDateTime;
use csv::{Reader, Writer};
use serde::{Deserialize, Serialize};
use std::path::Path;

const CIVIL_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a wall-clock time such as `2025-01-15T09:00` or `2025-01-15 09:00:30`
pub fn parse_civil(s: &str) -> PlannerResult<NaiveDateTime> {
    let s = s.trim();
    CIVIL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| PlannerError::InvalidDateTime(format!("{}: expected YYYY-MM-DDTHH:MM[:SS]", s)))
}

pub fn format_civil(instant: &NaiveDateTime) -> String {
    instant.format("%Y-%m-%d %H:%M").to_string()
}

/// CSV row: start,end,timezone
#[derive(Debug, Deserialize)]
struct WindowRecord {
    start: String,
    end: String,
    timezone: String,
}

/// Load meeting windows for batch evaluation
pub fn load_windows_csv(path: &Path) -> anyhow::Result<Vec<MeetingWindow>> {
    let mut rdr = Reader::from_path(path)?;
    let mut windows = Vec::new();

    for (row, result) in rdr.deserialize().enumerate() {
        let record: WindowRecord = result?;
        let start = parse_civil(&record.start).map_err(|e| anyhow::anyhow!("Row {}: {}", row + 1, e))?;
        let end = parse_civil(&record.end).map_err(|e| anyhow::anyhow!("Row {}: {}", row + 1, e))?;
        windows.push(MeetingWindow::new(start, end, record.timezone.trim()));
    }

    Ok(windows)
}

#[derive(Debug, Serialize)]
struct CandidateRow<'a> {
    rank: usize,
    start: String,
    end: String,
    timezone: &'a str,
    suitability_score: f64,
    working_count: usize,
    participants: usize,
    is_optimal: bool,
}

/// Write ranked candidates to CSV, one row per option
pub fn write_candidates_csv(path: &Path, options: &[CandidateOption]) -> anyhow::Result<()> {
    let mut wtr = Writer::from_path(path)?;

    for (i, option) in options.iter().enumerate() {
        wtr.serialize(CandidateRow {
            rank: i + 1,
            start: format_civil(&option.window.start),
            end: format_civil(&option.window.end),
            timezone: &option.window.anchor_timezone,
            suitability_score: option.suitability_score,
            working_count: option.evaluation.working_count,
            participants: option.evaluation.total(),
            is_optimal: option.evaluation.is_optimal,
        })?;
    }
    wtr.flush()?;

    Ok(())
}

#[derive(Debug, Serialize)]
struct BatchRow<'a> {
    start: String,
    end: String,
    timezone: &'a str,
    working_count: Option<usize>,
    working_percentage: Option<f64>,
    is_optimal: Option<bool>,
    error: Option<String>,
}

/// Write batch evaluation results to CSV. Failed windows keep their row with the error text.
pub fn write_batch_csv(
    path: &Path,
    windows: &[MeetingWindow],
    results: &[PlannerResult<WindowEvaluation>],
) -> anyhow::Result<()> {
    let mut wtr = Writer::from_path(path)?;

    for (window, result) in windows.iter().zip(results) {
        let row = match result {
            Ok(evaluation) => BatchRow {
                start: format_civil(&window.start),
                end: format_civil(&window.end),
                timezone: &window.anchor_timezone,
                working_count: Some(evaluation.working_count),
                working_percentage: Some(evaluation.working_percentage()),
                is_optimal: Some(evaluation.is_optimal),
                error: None,
            },
            Err(e) => BatchRow {
                start: format_civil(&window.start),
                end: format_civil(&window.end),
                timezone: &window.anchor_timezone,
                working_count: None,
                working_percentage: None,
                is_optimal: None,
                error: Some(e.to_string()),
            },
        };
        wtr.serialize(row)?;
    }
    wtr.flush()?;

    Ok(())
}
