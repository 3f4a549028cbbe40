use chrono::{Duration, NaiveDate};
use rand::Rng;
use serde::Serialize;

use crate::config::ForecastConfig;
use crate::dataset::Dataset;
use crate::error::{DashboardError, Result};
use crate::risk::RiskLevel;

/// Least-squares line over `(index, value)` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
}

impl TrendLine {
    /// Fits the closed-form normal equations, using positions 0..n-1 as x.
    pub fn fit(series: &[f64]) -> Result<Self> {
        let n = series.len();
        if n < 2 {
            return Err(DashboardError::InsufficientSeries { len: n });
        }
        if let Some(index) = series.iter().position(|y| !y.is_finite()) {
            return Err(DashboardError::NonFiniteSeries { index });
        }

        let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
        for (i, y) in series.iter().enumerate() {
            let x = i as f64;
            sum_x += x;
            sum_y += y;
            sum_xy += x * y;
            sum_xx += x * x;
        }

        let n = n as f64;
        let slope = (n * sum_xy - sum_x * sum_y) / (n * sum_xx - sum_x * sum_x);
        let intercept = (sum_y - slope * sum_x) / n;

        Ok(Self { slope, intercept })
    }

    pub fn value_at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Projected values for one series. Noisy, so not reproducible without a seeded rng.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub trend: TrendLine,
    pub history_len: usize,
    pub values: Vec<f64>,
}

impl Forecast {
    /// Noise-free trend value for future step `k` (1-based).
    pub fn trend_value(&self, k: usize) -> f64 {
        self.trend.value_at((self.history_len - 1 + k) as f64)
    }

    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }
}

/// Projects `horizon` points past the end of `series`.
///
/// Each point is the trend value times `1 + u` with `u` uniform in
/// `[-noise_bound, noise_bound]`, floored at zero.
pub fn project<R: Rng + ?Sized>(
    series: &[f64],
    horizon: usize,
    noise_bound: f64,
    rng: &mut R,
) -> Result<Forecast> {
    let trend = TrendLine::fit(series)?;
    let n = series.len();

    let values = (1..=horizon)
        .map(|k| {
            let base = trend.value_at((n - 1 + k) as f64);
            let variance = if noise_bound > 0.0 {
                base * rng.gen_range(-noise_bound..=noise_bound)
            } else {
                0.0
            };
            (base + variance).max(0.0)
        })
        .collect();

    tracing::debug!(
        slope = trend.slope,
        intercept = trend.intercept,
        horizon,
        "projected series"
    );

    Ok(Forecast {
        trend,
        history_len: n,
        values,
    })
}

/// Runs the risk ordinals through [`project`] and maps each point back onto the scale.
pub fn project_risk<R: Rng + ?Sized>(
    levels: &[f64],
    horizon: usize,
    noise_bound: f64,
    rng: &mut R,
) -> Result<Vec<RiskLevel>> {
    let forecast = project(levels, horizon, noise_bound, rng)?;
    Ok(forecast
        .values
        .into_iter()
        .map(RiskLevel::from_projection)
        .collect())
}

pub fn future_dates(last: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    (1..=horizon as i64)
        .map(|k| last + Duration::days(k))
        .collect()
}

/// All projections the dashboard shows, generated once per session.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastBundle {
    pub dates: Vec<NaiveDate>,
    pub revenue: Forecast,
    pub leads: Forecast,
    pub risk: Vec<RiskLevel>,
}

pub fn build_bundle<R: Rng + ?Sized>(
    dataset: &Dataset,
    config: &ForecastConfig,
    rng: &mut R,
) -> Result<ForecastBundle> {
    let horizon = config.horizon;
    let bound = config.noise_bound;

    let risk = project_risk(&dataset.risk_series(), horizon, bound, rng)?;
    let revenue = project(&dataset.revenue_series(), horizon, bound, rng)?;
    let leads = project(
        &dataset.leads_series(config.leads_scale),
        horizon,
        bound,
        rng,
    )?;

    tracing::info!(
        horizon,
        noise_bound = bound,
        revenue_slope = revenue.trend.slope,
        "forecast generated"
    );

    Ok(ForecastBundle {
        dates: future_dates(dataset.latest().date, horizon),
        revenue,
        leads,
        risk,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastInsight {
    pub last_revenue: f64,
    pub projected_revenue: f64,
    pub difference: f64,
    pub growth_pct: f64,
    pub direction: TrendDirection,
}

/// Compares the last observed revenue with the final projected point.
pub fn revenue_insight(dataset: &Dataset, bundle: &ForecastBundle) -> ForecastInsight {
    let last_revenue = dataset.latest().revenue;
    let projected_revenue = bundle.revenue.last().unwrap_or(last_revenue);
    let difference = projected_revenue - last_revenue;
    let growth_pct = if last_revenue == 0.0 {
        0.0
    } else {
        difference / last_revenue * 100.0
    };

    ForecastInsight {
        last_revenue,
        projected_revenue,
        difference,
        growth_pct,
        direction: if difference > 0.0 {
            TrendDirection::Up
        } else {
            TrendDirection::Down
        },
    }
}

/// Historical and projected lines sharing one label axis.
///
/// The forecast line starts on the last historical point so the two connect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub historical: Vec<Option<f64>>,
    pub forecast: Vec<Option<f64>>,
}

impl ChartSeries {
    pub fn bridge(
        past_dates: &[NaiveDate],
        past: &[f64],
        future_dates: &[NaiveDate],
        future: &[f64],
    ) -> Self {
        let labels = past_dates
            .iter()
            .chain(future_dates)
            .map(|d| d.format("%m-%d").to_string())
            .collect();

        let historical = past
            .iter()
            .map(|v| Some(*v))
            .chain(future.iter().map(|_| None))
            .collect();

        let mut forecast: Vec<Option<f64>> = vec![None; past.len()];
        if let (Some(slot), Some(anchor)) = (forecast.last_mut(), past.last()) {
            *slot = Some(*anchor);
        }
        forecast.extend(future.iter().map(|v| Some(*v)));

        Self {
            labels,
            historical,
            forecast,
        }
    }
}
