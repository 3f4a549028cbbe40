use serde::Serialize;
use uuid::Uuid;

use crate::config::AdvisoryConfig;
use crate::forecast::{ForecastInsight, TrendDirection};
use crate::models::{DailyRecord, WeatherKind};
use crate::risk::{self, RiskBadge, RiskLevel, RiskReason};
use crate::simulation::SimulationState;
use crate::weather::{self, FloodAssessment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    Operations,
    HumanResources,
    Weather,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Operations => "OPERATIONS",
            Category::HumanResources => "HUMAN RESOURCES",
            Category::Weather => "WEATHER",
        }
    }
}

/// Recommended response, one per triggering rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
    Repair,
    Rest,
    RemoteWork,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Repair => "Emergency Repair",
            Action::Rest => "Give Rest",
            Action::RemoteWork => "Work From Home",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub category: Category,
    pub action: Action,
    pub subject: String,
    pub entity: Option<Uuid>,
}

impl Alert {
    pub fn message(&self) -> String {
        match self.category {
            Category::Operations => format!("{} is down", self.subject),
            Category::HumanResources => format!("{} is exhausted", self.subject),
            Category::Weather => "Storm Alert".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Band {
    ActionRequired,
    Optimal,
}

/// Everything the banner and the latest-day card need.
#[derive(Debug, Clone, Serialize)]
pub struct Advisory {
    pub band: Band,
    pub alerts: Vec<Alert>,
    pub latest_risk: RiskLevel,
    pub badge: RiskBadge,
    pub reasons: Vec<RiskReason>,
    pub reason_summary: String,
    pub flood: Option<FloodAssessment>,
    pub kpi_alerts: usize,
}

impl Advisory {
    pub fn triggered(&self) -> usize {
        self.alerts.len()
    }
}

pub fn evaluate(
    state: &SimulationState,
    latest: &DailyRecord,
    config: &AdvisoryConfig,
) -> Advisory {
    let mut alerts = Vec::new();

    for machine in state
        .machines()
        .iter()
        .filter(|m| m.health < config.critical_health)
    {
        alerts.push(Alert {
            category: Category::Operations,
            action: Action::Repair,
            subject: machine.name.clone(),
            entity: Some(machine.id),
        });
    }

    for employee in state
        .employees()
        .iter()
        .filter(|e| e.fatigue > config.critical_fatigue)
    {
        alerts.push(Alert {
            category: Category::HumanResources,
            action: Action::Rest,
            subject: employee.name.clone(),
            entity: Some(employee.id),
        });
    }

    let days = state.weather();
    if days.iter().any(|d| d.kind == WeatherKind::Stormy) {
        alerts.push(Alert {
            category: Category::Weather,
            action: Action::RemoteWork,
            subject: "Storm".to_string(),
            entity: None,
        });
    }

    let band = if alerts.is_empty() {
        Band::Optimal
    } else {
        Band::ActionRequired
    };
    let reasons = risk::risk_reasons(latest);

    if band == Band::ActionRequired {
        tracing::info!(triggered = alerts.len(), "advisory requires action");
    }

    Advisory {
        band,
        latest_risk: latest.risk,
        badge: risk::badge_for(latest.risk),
        reason_summary: risk::reason_summary(&reasons),
        reasons,
        flood: (!days.is_empty()).then(|| weather::assess(days)),
        kpi_alerts: kpi_alert_count(state, config),
        alerts,
    }
}

/// Headline alert counter: tired staff plus unhealthy machines.
pub fn kpi_alert_count(state: &SimulationState, config: &AdvisoryConfig) -> usize {
    let tired = state
        .employees()
        .iter()
        .filter(|e| e.fatigue > config.kpi_fatigue)
        .count();
    let unhealthy = state
        .machines()
        .iter()
        .filter(|m| m.health < config.kpi_health)
        .count();
    tired + unhealthy
}

/// Inputs for the advisor's canned answers.
pub struct AdvisorContext<'a> {
    pub latest: &'a DailyRecord,
    pub insight: &'a ForecastInsight,
    pub state: &'a SimulationState,
    pub config: &'a AdvisoryConfig,
}

/// Answers a free-text operator question by keyword.
pub fn answer(question: &str, ctx: &AdvisorContext<'_>) -> String {
    let lowered = question.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let mentions = |keys: &[&str]| words.iter().any(|w| keys.contains(w));

    let latest = ctx.latest;

    if mentions(&["hello", "hi", "hey"]) {
        return "Hello. I'm ready to review the numbers or discuss operational risks. Where should we start?"
            .to_string();
    }

    if mentions(&["kpi", "performance", "numbers"]) {
        let sentiment = match ctx.insight.direction {
            TrendDirection::Up => "positive",
            TrendDirection::Down => "concerning",
        };
        return format!(
            "Executive Summary:\n1. Revenue: ${:.0} (daily)\n2. Forecast: tracking for {:.1}% growth over the horizon.\n3. Efficiency: error rate is at {}.\nAssessment: the trend is {sentiment}, but watch the error rate closely.",
            latest.revenue, ctx.insight.growth_pct, latest.error_rate_text
        );
    }

    if mentions(&["alert", "alerts", "problem", "problems", "status"]) {
        let broken = ctx
            .state
            .machines()
            .iter()
            .find(|m| m.health < ctx.config.attention_health);
        let tired = ctx
            .state
            .employees()
            .iter()
            .find(|e| e.fatigue > ctx.config.kpi_fatigue);

        return match (broken, tired) {
            (Some(machine), _) => format!(
                "Priority One: hardware failure in {} ({:.0}% health). Deploy the maintenance team immediately.",
                machine.name, machine.health
            ),
            (None, Some(employee)) => format!(
                "HR Notice: {} is showing fatigue signs ({}%). Recommend immediate rotation or rest.",
                employee.name, employee.fatigue
            ),
            (None, None) => {
                "Operational Status: all systems are nominal. No immediate interventions required."
                    .to_string()
            }
        };
    }

    if mentions(&["cost", "costs", "money"]) {
        return format!(
            "We have accumulated ${} in efficiency savings. Cloud costs are at ${:.0} per day; audit {} usage to keep margins healthy.",
            ctx.state.company_savings(),
            latest.cloud_cost,
            ctx.state.data_source().as_str()
        );
    }

    if mentions(&["staff", "team"]) {
        return format!(
            "The team's average mood score is {:.1}/10. Keep overtime below 20 hours; it is at {:.0}.",
            latest.mood_score, latest.overtime_hours
        );
    }

    if mentions(&["strategy", "advice"]) {
        return format!(
            "Strategic Recommendation: with {} new leads, scale up.\n1. Fix all machines.\n2. Train staff to handle the load.\n3. Monitor the forecast for revenue dips.",
            latest.new_leads
        );
    }

    "I can provide a KPI breakdown, a risk assessment, or a review of financials. What do you need?"
        .to_string()
}
