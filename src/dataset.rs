use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{DashboardError, Result};
use crate::models::DailyRecord;
use crate::risk::RiskLevel;

/// Built-in 30 day sample, 2025-11-01 through 2025-11-30.
pub const EMBEDDED_CSV: &str = include_str!("../data/daily_metrics.csv");

pub const COLUMNS: [&str; 10] = [
    "Date",
    "Daily_Revenue",
    "New_Leads",
    "Active_Users",
    "Avg_Employee_Mood_Score",
    "Overtime_Hours_Logged",
    "Code_Commits",
    "System_Error_Rate",
    "Cloud_Cost",
    "Risk_Flag",
];

#[derive(Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Daily_Revenue")]
    revenue: f64,
    #[serde(rename = "New_Leads")]
    new_leads: u32,
    #[serde(rename = "Active_Users")]
    active_users: u32,
    #[serde(rename = "Avg_Employee_Mood_Score")]
    mood_score: f64,
    #[serde(rename = "Overtime_Hours_Logged")]
    overtime_hours: f64,
    #[serde(rename = "Code_Commits")]
    commits: u32,
    #[serde(rename = "System_Error_Rate")]
    error_rate: String,
    #[serde(rename = "Cloud_Cost")]
    cloud_cost: f64,
    #[serde(rename = "Risk_Flag")]
    risk: String,
}

/// Parsed history, ordered by date ascending with at least one day.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<DailyRecord>,
}

impl Dataset {
    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn latest(&self) -> &DailyRecord {
        &self.records[self.records.len() - 1]
    }

    pub fn revenue_series(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.revenue).collect()
    }

    /// Leads scaled so they share an axis with revenue when charted.
    pub fn leads_series(&self, scale: f64) -> Vec<f64> {
        self.records
            .iter()
            .map(|r| r.new_leads as f64 * scale)
            .collect()
    }

    pub fn risk_series(&self) -> Vec<f64> {
        self.records
            .iter()
            .map(|r| r.risk.ordinal() as f64)
            .collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.records.iter().map(|r| r.date).collect()
    }
}

pub fn load_embedded() -> Result<Dataset> {
    parse(EMBEDDED_CSV)
}

pub fn load_path(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).map_err(|err| DashboardError::Parse {
        line: 0,
        reason: format!("cannot read {}: {err}", path.display()),
    })?;
    parse(&text)
}

/// Parses header + rows into records. Any malformed row rejects the whole input.
pub fn parse(text: &str) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(text.trim().as_bytes());

    let headers = reader.headers()?.clone();
    if headers.is_empty() || headers.iter().all(str::is_empty) {
        return Err(DashboardError::MissingHeader);
    }
    if headers.iter().ne(COLUMNS.iter().copied()) {
        return Err(DashboardError::HeaderMismatch {
            expected: COLUMNS.join(","),
            found: headers.iter().collect::<Vec<_>>().join(","),
        });
    }

    let mut records: Vec<DailyRecord> = Vec::new();
    for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row.map_err(row_error)?;
        let line = index as u64 + 2;

        if let Some(previous) = records.last() {
            if row.date <= previous.date {
                return Err(DashboardError::OutOfOrder {
                    line,
                    date: row.date,
                    previous: previous.date,
                });
            }
        }

        let error_rate = parse_percentage(&row.error_rate)
            .map_err(|reason| DashboardError::Parse { line, reason })?;
        check_finite(&row).map_err(|reason| DashboardError::Parse { line, reason })?;

        records.push(DailyRecord {
            date: row.date,
            revenue: row.revenue,
            new_leads: row.new_leads,
            active_users: row.active_users,
            mood_score: row.mood_score,
            overtime_hours: row.overtime_hours,
            commits: row.commits,
            error_rate_text: row.error_rate,
            error_rate,
            cloud_cost: row.cloud_cost,
            risk: RiskLevel::from_label(&row.risk),
        });
    }

    if records.is_empty() {
        return Err(DashboardError::Parse {
            line: 2,
            reason: "no data rows".to_string(),
        });
    }

    tracing::info!(
        rows = records.len(),
        first = %records[0].date,
        last = %records[records.len() - 1].date,
        "parsed daily records"
    );

    Ok(Dataset { records })
}

/// Converts `"2.50%"` into `2.5`. The `%` suffix is required.
pub fn parse_percentage(text: &str) -> std::result::Result<f64, String> {
    let number = text
        .trim()
        .strip_suffix('%')
        .ok_or_else(|| format!("percentage {text:?} is missing '%'"))?;
    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| format!("percentage {text:?} is not a number"))?;

    if !value.is_finite() {
        return Err(format!("percentage {text:?} is not finite"));
    }
    Ok(value)
}

/// Float columns must be finite; serde parses `NaN` and `inf` as floats.
fn check_finite(row: &CsvRow) -> std::result::Result<(), String> {
    let columns = [
        ("Daily_Revenue", row.revenue),
        ("Avg_Employee_Mood_Score", row.mood_score),
        ("Overtime_Hours_Logged", row.overtime_hours),
        ("Cloud_Cost", row.cloud_cost),
    ];
    match columns.iter().find(|(_, value)| !value.is_finite()) {
        Some((column, value)) => Err(format!("{column} value {value} is not finite")),
        None => Ok(()),
    }
}

fn row_error(err: csv::Error) -> DashboardError {
    let line = err.position().map(|pos| pos.line()).unwrap_or_default();
    let reason = match err.kind() {
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => Some(format!("expected {expected_len} columns, found {len}")),
        csv::ErrorKind::Deserialize { err: inner, .. } => Some(inner.to_string()),
        _ => None,
    };

    match reason {
        Some(reason) => DashboardError::Parse { line, reason },
        None => DashboardError::Csv(err),
    }
}
