use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;

use crate::models::{WeatherDay, WeatherKind};

/// Draws one day's weather: Sunny 30%, Cloudy 30%, Rainy 25%, Stormy 15%.
pub fn draw_kind<R: Rng + ?Sized>(rng: &mut R) -> WeatherKind {
    kind_for(rng.gen::<f64>())
}

fn kind_for(roll: f64) -> WeatherKind {
    if roll < 0.3 {
        WeatherKind::Sunny
    } else if roll < 0.6 {
        WeatherKind::Cloudy
    } else if roll < 0.85 {
        WeatherKind::Rainy
    } else {
        WeatherKind::Stormy
    }
}

pub fn generate<R: Rng + ?Sized>(dates: &[NaiveDate], rng: &mut R) -> Vec<WeatherDay> {
    dates
        .iter()
        .map(|date| WeatherDay {
            date: *date,
            kind: draw_kind(rng),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum FloodRisk {
    Low,
    Medium,
    High,
}

impl FloodRisk {
    pub fn as_str(&self) -> &'static str {
        match self {
            FloodRisk::Low => "LOW",
            FloodRisk::Medium => "MEDIUM",
            FloodRisk::High => "HIGH - FLOOD WARNING",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WorkLocation {
    Office,
    Hybrid,
    MandatoryRemote,
}

impl WorkLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkLocation::Office => "OFFICE",
            WorkLocation::Hybrid => "HYBRID",
            WorkLocation::MandatoryRemote => "MANDATORY WFH",
        }
    }
}

impl From<FloodRisk> for WorkLocation {
    fn from(risk: FloodRisk) -> Self {
        match risk {
            FloodRisk::Low => WorkLocation::Office,
            FloodRisk::Medium => WorkLocation::Hybrid,
            FloodRisk::High => WorkLocation::MandatoryRemote,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FloodAssessment {
    pub rain_days: usize,
    pub storm_days: usize,
    pub risk: FloodRisk,
    pub location: WorkLocation,
}

pub fn flood_risk(rain_days: usize, storm_days: usize) -> FloodRisk {
    if storm_days >= 2 || (rain_days >= 3 && storm_days >= 1) {
        FloodRisk::High
    } else if storm_days >= 1 || rain_days >= 3 {
        FloodRisk::Medium
    } else {
        FloodRisk::Low
    }
}

pub fn assess(days: &[WeatherDay]) -> FloodAssessment {
    let rain_days = days.iter().filter(|d| d.kind == WeatherKind::Rainy).count();
    let storm_days = days.iter().filter(|d| d.kind == WeatherKind::Stormy).count();
    let risk = flood_risk(rain_days, storm_days);

    FloodAssessment {
        rain_days,
        storm_days,
        risk,
        location: risk.into(),
    }
}
