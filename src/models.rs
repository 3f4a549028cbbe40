use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::risk::RiskLevel;

/// One calendar day of operational metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub revenue: f64,
    pub new_leads: u32,
    pub active_users: u32,
    pub mood_score: f64,
    pub overtime_hours: f64,
    pub commits: u32,
    /// Error rate exactly as it appeared in the source, e.g. `"0.90%"`.
    pub error_rate_text: String,
    /// Error rate in percentage points, parsed from `error_rate_text`.
    pub error_rate: f64,
    pub cloud_cost: f64,
    pub risk: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub fatigue: u8,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Machine {
    pub id: Uuid,
    pub name: String,
    pub kind: String,
    pub health: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherKind {
    Sunny,
    Cloudy,
    Rainy,
    Stormy,
}

impl WeatherKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherKind::Sunny => "Sunny",
            WeatherKind::Cloudy => "Cloudy",
            WeatherKind::Rainy => "Rainy",
            WeatherKind::Stormy => "Stormy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeatherDay {
    pub date: NaiveDate,
    pub kind: WeatherKind,
}

/// Cosmetic label for where the dashboard claims its data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataSource {
    GoogleBigQuery,
    AzureSynapse,
}

impl DataSource {
    pub fn toggled(self) -> Self {
        match self {
            DataSource::GoogleBigQuery => DataSource::AzureSynapse,
            DataSource::AzureSynapse => DataSource::GoogleBigQuery,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::GoogleBigQuery => "Google BigQuery",
            DataSource::AzureSynapse => "Azure Synapse",
        }
    }
}

/// One sample of the synthetic load metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadSample {
    pub label: String,
    pub load: u32,
}
