use std::fmt::Write;

use serde::Serialize;

use crate::advisory::{Advisory, Band};
use crate::dataset::Dataset;
use crate::forecast::{self, ChartSeries, ForecastBundle, ForecastInsight, TrendDirection};
use crate::models::DailyRecord;
use crate::risk::RiskLevel;
use crate::simulation::{SimulationSnapshot, SimulationState};
use crate::weather;

/// Everything a renderer needs, in one serializable value.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub latest: DailyRecord,
    pub insight: ForecastInsight,
    pub risk_chart: ChartSeries,
    pub revenue_chart: ChartSeries,
    pub leads_chart: ChartSeries,
    pub simulation: SimulationSnapshot,
    pub advisory: Advisory,
}

pub fn snapshot(
    dataset: &Dataset,
    bundle: &ForecastBundle,
    leads_scale: f64,
    state: &SimulationState,
    advisory: &Advisory,
) -> DashboardSnapshot {
    let dates = dataset.dates();
    let risk_future: Vec<f64> = bundle.risk.iter().map(|r| r.ordinal() as f64).collect();

    DashboardSnapshot {
        latest: dataset.latest().clone(),
        insight: forecast::revenue_insight(dataset, bundle),
        risk_chart: ChartSeries::bridge(&dates, &dataset.risk_series(), &bundle.dates, &risk_future),
        revenue_chart: ChartSeries::bridge(
            &dates,
            &dataset.revenue_series(),
            &bundle.dates,
            &bundle.revenue.values,
        ),
        leads_chart: ChartSeries::bridge(
            &dates,
            &dataset.leads_series(leads_scale),
            &bundle.dates,
            &bundle.leads.values,
        ),
        simulation: state.snapshot(),
        advisory: advisory.clone(),
    }
}

pub fn render_forecast(dataset: &Dataset, bundle: &ForecastBundle) -> String {
    let insight = forecast::revenue_insight(dataset, bundle);
    let mut output = String::new();

    let _ = writeln!(
        output,
        "Revenue trend: slope {:.2}/day, intercept {:.2}",
        bundle.revenue.trend.slope, bundle.revenue.trend.intercept
    );
    let _ = writeln!(
        output,
        "{:<12} {:>12} {:>12} {:>12} {:>10}",
        "date", "trend", "revenue", "leads", "risk"
    );
    for (i, date) in bundle.dates.iter().enumerate() {
        let _ = writeln!(
            output,
            "{:<12} {:>12.0} {:>12.0} {:>12.0} {:>10}",
            date.to_string(),
            bundle.revenue.trend_value(i + 1),
            bundle.revenue.values[i],
            bundle.leads.values[i],
            bundle.risk[i]
        );
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "{}", insight_line(&insight));
    output
}

pub fn render_status(state: &SimulationState, advisory: &Advisory) -> String {
    let snapshot = state.snapshot();
    let mut output = String::new();

    let _ = writeln!(
        output,
        "tick {} | load {}% | alerts {} | savings ${} | source {}",
        snapshot.ticks,
        snapshot
            .current_load
            .map(|l| l.to_string())
            .unwrap_or_else(|| "-".to_string()),
        advisory.kpi_alerts,
        snapshot.company_savings,
        snapshot.data_source
    );

    for view in &snapshot.employees {
        let _ = writeln!(
            output,
            "  {:<12} {:<10} fatigue {:>3}%  score {:>4}  {}",
            view.employee.name,
            view.employee.role,
            view.employee.fatigue,
            view.employee.score,
            view.status.as_str()
        );
    }
    for view in &snapshot.machines {
        let _ = writeln!(
            output,
            "  {:<22} {:<10} health {:>3.0}%  {}",
            view.machine.name,
            view.machine.kind,
            view.machine.health.floor(),
            view.status.as_str()
        );
    }

    output.push_str(&banner(advisory));
    output
}

pub fn banner(advisory: &Advisory) -> String {
    let mut output = String::new();

    match advisory.band {
        Band::Optimal => {
            let _ = writeln!(output, "OPTIMAL: Systems stable. Forecast suggests growth.");
        }
        Band::ActionRequired => {
            let _ = writeln!(output, "ACTION REQUIRED ({})", advisory.triggered());
            for alert in &advisory.alerts {
                let _ = writeln!(
                    output,
                    "  [{}] {} -> {}",
                    alert.category.as_str(),
                    alert.message(),
                    alert.action.as_str()
                );
            }
        }
    }
    output
}

pub fn render_weather(state: &SimulationState) -> String {
    let mut output = String::new();
    let days = state.weather();

    if days.is_empty() {
        let _ = writeln!(output, "No weather forecast generated for this session.");
        return output;
    }

    let assessment = weather::assess(days);
    for day in days {
        let _ = writeln!(output, "{} {}", day.date.format("%m-%d"), day.kind.as_str());
    }
    let _ = writeln!(
        output,
        "Flood risk: {} ({} rainy, {} stormy) | Work location: {}",
        assessment.risk.as_str(),
        assessment.rain_days,
        assessment.storm_days,
        assessment.location.as_str()
    );
    output
}

fn insight_line(insight: &ForecastInsight) -> String {
    let arrow = match insight.direction {
        TrendDirection::Up => "UP",
        TrendDirection::Down => "DOWN",
    };
    format!(
        "Last revenue ${:.0} | projected ${:.0} | {} ${:.0} ({:+.1}%)",
        insight.last_revenue,
        insight.projected_revenue,
        arrow,
        insight.difference.abs(),
        insight.growth_pct
    )
}

pub fn build_report(
    dataset: &Dataset,
    bundle: &ForecastBundle,
    state: &SimulationState,
    advisory: &Advisory,
) -> String {
    let latest = dataset.latest();
    let insight = forecast::revenue_insight(dataset, bundle);
    let snapshot = state.snapshot();
    let mut output = String::new();

    let _ = writeln!(output, "# Operations Dashboard Report");
    let _ = writeln!(
        output,
        "Data through {} ({} days, source {})",
        latest.date,
        dataset.len(),
        snapshot.data_source
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Latest Day");
    let _ = writeln!(output, "- Revenue: ${:.0}", latest.revenue);
    let _ = writeln!(output, "- New leads: {}", latest.new_leads);
    let _ = writeln!(output, "- Active users: {}", latest.active_users);
    let _ = writeln!(output, "- Error rate: {}", latest.error_rate_text);
    let _ = writeln!(output, "- Risk flag: {}", latest.risk);
    if advisory.latest_risk >= RiskLevel::High {
        let _ = writeln!(output, "- {}", advisory.reason_summary);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Forecast");
    let _ = writeln!(output, "{}", insight_line(&insight));
    let _ = writeln!(output);
    for (i, date) in bundle.dates.iter().enumerate() {
        let _ = writeln!(
            output,
            "- {}: revenue ${:.0}, risk {}",
            date, bundle.revenue.values[i], bundle.risk[i]
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Workforce");
    for view in &snapshot.employees {
        let _ = writeln!(
            output,
            "- {} ({}) fatigue {}% score {}: {}",
            view.employee.name,
            view.employee.role,
            view.employee.fatigue,
            view.employee.score,
            view.status.as_str()
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Machines");
    for view in &snapshot.machines {
        let _ = writeln!(
            output,
            "- {} ({}) health {:.0}%: {}",
            view.machine.name,
            view.machine.kind,
            view.machine.health.floor(),
            view.status.as_str()
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Weather");
    output.push_str(&render_weather(state));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Advisory");
    output.push_str(&banner(advisory));

    output
}
