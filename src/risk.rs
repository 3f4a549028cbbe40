use serde::{Deserialize, Serialize};

use crate::models::DailyRecord;

pub const ERROR_RATE_LIMIT: f64 = 1.0;
pub const OVERTIME_LIMIT: f64 = 30.0;
pub const MOOD_FLOOR: f64 = 7.0;

/// Ordinal risk scale. The derived `Ord` follows declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn ordinal(self) -> u8 {
        match self {
            RiskLevel::Low => 0,
            RiskLevel::Medium => 1,
            RiskLevel::High => 2,
            RiskLevel::Critical => 3,
        }
    }

    pub fn from_ordinal(value: u8) -> Option<Self> {
        match value {
            0 => Some(RiskLevel::Low),
            1 => Some(RiskLevel::Medium),
            2 => Some(RiskLevel::High),
            3 => Some(RiskLevel::Critical),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }

    /// Maps a textual label to its level.
    ///
    /// Unrecognized labels fall back to `Low`. This masks unexpected
    /// categories instead of failing, so the fallback is logged.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Low" => RiskLevel::Low,
            "Medium" => RiskLevel::Medium,
            "High" => RiskLevel::High,
            "Critical" => RiskLevel::Critical,
            other => {
                tracing::warn!(label = other, "unrecognized risk label, treating as Low");
                RiskLevel::Low
            }
        }
    }

    /// Recovers a level from a projected ordinal by rounding and clamping to 0..=3.
    pub fn from_projection(value: f64) -> Self {
        let rounded = value.round().clamp(0.0, 3.0) as u8;
        RiskLevel::from_ordinal(rounded).unwrap_or(RiskLevel::Low)
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskReason {
    HighErrorRate,
    HighOvertime,
    LowMorale,
}

impl RiskReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskReason::HighErrorRate => "High Error Rate",
            RiskReason::HighOvertime => "High Overtime",
            RiskReason::LowMorale => "Low Morale",
        }
    }
}

/// Independent threshold checks over a single day.
pub fn risk_reasons(record: &DailyRecord) -> Vec<RiskReason> {
    let mut reasons = Vec::new();

    if record.error_rate > ERROR_RATE_LIMIT {
        reasons.push(RiskReason::HighErrorRate);
    }
    if record.overtime_hours > OVERTIME_LIMIT {
        reasons.push(RiskReason::HighOvertime);
    }
    if record.mood_score < MOOD_FLOOR {
        reasons.push(RiskReason::LowMorale);
    }

    reasons
}

pub fn reason_summary(reasons: &[RiskReason]) -> String {
    if reasons.is_empty() {
        return "System Stable".to_string();
    }

    let joined: Vec<&str> = reasons.iter().map(RiskReason::as_str).collect();
    format!("Causes: {}", joined.join(", "))
}

/// How loudly the latest day's risk flag should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskBadge {
    Critical,
    High,
    Normal,
}

pub fn badge_for(level: RiskLevel) -> RiskBadge {
    match level {
        RiskLevel::Critical => RiskBadge::Critical,
        RiskLevel::High => RiskBadge::High,
        RiskLevel::Low | RiskLevel::Medium => RiskBadge::Normal,
    }
}
