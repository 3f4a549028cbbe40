use std::path::Path;

use serde::Deserialize;

use crate::error::{DashboardError, Result};

pub const CONFIG_ENV: &str = "OPS_PULSE_CONFIG";

/// Every tunable of the engine. Missing keys in a config file keep their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub forecast: ForecastConfig,
    pub simulation: SimulationConfig,
    pub advisory: AdvisoryConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub horizon: usize,
    /// Symmetric multiplicative noise bound, 0.05 means +/-5% of the trend value.
    pub noise_bound: f64,
    pub leads_scale: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: 7,
            noise_bound: 0.05,
            leads_scale: 300.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmployeeSeed {
    pub name: String,
    pub role: String,
    pub fatigue: u8,
    pub score: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MachineSeed {
    pub name: String,
    pub kind: String,
    pub health: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_interval_ms: u64,
    pub clock_interval_ms: u64,
    pub machine_decay: f64,
    pub fatigue_step: u8,
    pub rest_score_bonus: i64,
    pub load_min: u32,
    pub load_max: u32,
    pub history_capacity: usize,
    pub initial_load: Vec<u32>,
    pub first_hour: u32,
    pub company_savings: u64,
    pub employees: Vec<EmployeeSeed>,
    pub machines: Vec<MachineSeed>,
    pub status: StatusThresholds,
}

/// Display status bands. Fatigue bands are strict lower bounds, health bands strict upper bounds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatusThresholds {
    pub burnout_fatigue: u8,
    pub tired_fatigue: u8,
    pub working_fatigue: u8,
    pub failure_health: f64,
    pub degrading_health: f64,
    pub optimal_health: f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            burnout_fatigue: 90,
            tired_fatigue: 70,
            working_fatigue: 30,
            failure_health: 20.0,
            degrading_health: 60.0,
            optimal_health: 100.0,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let employees = [
            ("Sarah J.", "Engineer", 30, 135),
            ("Mike R.", "Logistics", 52, 65),
            ("Jessica T.", "Sales", 10, 88),
            ("David B.", "Manager", 75, 75),
            ("Alex K.", "Intern", 20, 90),
            ("Priya M.", "DevOps", 60, 77),
        ];
        let machines = [
            ("Server A", "Hardware", 90.0),
            ("Server B", "Hardware", 65.0),
            ("Cloud Infrastructure", "Cloud", 100.0),
            ("Cooling System", "Facility", 75.0),
            ("Router", "Internet", 85.0),
        ];

        Self {
            tick_interval_ms: 2000,
            clock_interval_ms: 1000,
            machine_decay: 2.0,
            fatigue_step: 1,
            rest_score_bonus: 0,
            load_min: 50,
            load_max: 79,
            history_capacity: 5,
            initial_load: vec![45, 50, 48, 55, 60],
            first_hour: 9,
            company_savings: 450_000,
            employees: employees
                .iter()
                .map(|(name, role, fatigue, score)| EmployeeSeed {
                    name: name.to_string(),
                    role: role.to_string(),
                    fatigue: *fatigue,
                    score: *score,
                })
                .collect(),
            machines: machines
                .iter()
                .map(|(name, kind, health)| MachineSeed {
                    name: name.to_string(),
                    kind: kind.to_string(),
                    health: *health,
                })
                .collect(),
            status: StatusThresholds::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    /// Machines strictly below this health are reported as down.
    pub critical_health: f64,
    /// Employees strictly above this fatigue are reported as exhausted.
    pub critical_fatigue: u8,
    pub kpi_health: f64,
    pub kpi_fatigue: u8,
    /// Health below which the advisor calls a machine out when asked for status.
    pub attention_health: f64,
    pub weather_days: usize,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            critical_health: 10.0,
            critical_fatigue: 85,
            kpi_health: 40.0,
            kpi_fatigue: 80,
            attention_health: 50.0,
            weather_days: 5,
        }
    }
}

impl DashboardConfig {
    /// Reads `path`, else the file named by `OPS_PULSE_CONFIG`, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV).map(std::path::PathBuf::from);
        let config = match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => {
                let text = std::fs::read_to_string(&path).map_err(|err| {
                    DashboardError::Config(format!("cannot read {}: {err}", path.display()))
                })?;
                let config: DashboardConfig = serde_json::from_str(&text)
                    .map_err(|err| DashboardError::Config(format!("{}: {err}", path.display())))?;
                tracing::info!(path = %path.display(), "loaded configuration");
                config
            }
            None => DashboardConfig::default(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let sim = &self.simulation;

        if self.forecast.horizon == 0 {
            return Err(DashboardError::Config("forecast.horizon must be positive".into()));
        }
        if !(0.0..1.0).contains(&self.forecast.noise_bound) {
            return Err(DashboardError::Config(
                "forecast.noise_bound must be in [0, 1)".into(),
            ));
        }
        if !self.forecast.leads_scale.is_finite() || self.forecast.leads_scale <= 0.0 {
            return Err(DashboardError::Config(
                "forecast.leads_scale must be a positive number".into(),
            ));
        }
        if !sim.machine_decay.is_finite() || sim.machine_decay < 0.0 {
            return Err(DashboardError::Config(
                "simulation.machine_decay must be a non-negative number".into(),
            ));
        }
        if sim.fatigue_step > 100 {
            return Err(DashboardError::Config(
                "simulation.fatigue_step must be 0-100".into(),
            ));
        }
        if sim.history_capacity == 0 {
            return Err(DashboardError::Config(
                "simulation.history_capacity must be positive".into(),
            ));
        }
        if sim.initial_load.len() > sim.history_capacity {
            return Err(DashboardError::Config(format!(
                "simulation.initial_load has {} samples but capacity is {}",
                sim.initial_load.len(),
                sim.history_capacity
            )));
        }
        if sim.load_min > sim.load_max {
            return Err(DashboardError::Config(
                "simulation.load_min exceeds load_max".into(),
            ));
        }
        if sim.first_hour > 23 {
            return Err(DashboardError::Config("simulation.first_hour must be 0-23".into()));
        }
        if sim.tick_interval_ms == 0 || sim.clock_interval_ms == 0 {
            return Err(DashboardError::Config("intervals must be positive".into()));
        }
        if sim.employees.iter().any(|e| e.fatigue > 100) {
            return Err(DashboardError::Config("employee fatigue must be 0-100".into()));
        }
        if sim
            .machines
            .iter()
            .any(|m| !(0.0..=100.0).contains(&m.health))
        {
            return Err(DashboardError::Config("machine health must be 0-100".into()));
        }
        let status = &sim.status;
        if !(status.working_fatigue < status.tired_fatigue
            && status.tired_fatigue < status.burnout_fatigue)
        {
            return Err(DashboardError::Config(
                "simulation.status fatigue bands must increase: working < tired < burnout".into(),
            ));
        }
        if !(status.failure_health < status.degrading_health
            && status.degrading_health <= status.optimal_health)
        {
            return Err(DashboardError::Config(
                "simulation.status health bands must increase: failure < degrading <= optimal"
                    .into(),
            ));
        }
        if self.advisory.critical_health >= self.advisory.kpi_health {
            return Err(DashboardError::Config(
                "advisory.critical_health must be below kpi_health".into(),
            ));
        }
        if self.advisory.weather_days == 0 {
            return Err(DashboardError::Config(
                "advisory.weather_days must be positive".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_are_valid() {
        let config = DashboardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.simulation.employees.len(), 6);
        assert_eq!(config.simulation.machines.len(), 5);
        assert_eq!(config.forecast.noise_bound, 0.05);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: DashboardConfig =
            serde_json::from_str(r#"{"simulation": {"machine_decay": 5.0}}"#).unwrap();
        assert_eq!(config.simulation.machine_decay, 5.0);
        assert_eq!(config.simulation.history_capacity, 5);
        assert_eq!(config.advisory.critical_fatigue, 85);
        assert_eq!(config.forecast.horizon, 7);
    }

    #[test]
    fn rejects_oversized_initial_history() {
        let mut config = DashboardConfig::default();
        config.simulation.history_capacity = 3;
        assert!(matches!(config.validate(), Err(DashboardError::Config(_))));
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let mut config = DashboardConfig::default();
        config.advisory.critical_health = 50.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_negative_or_non_finite_decay() {
        for decay in [-5.0, f64::NAN, f64::INFINITY] {
            let mut config = DashboardConfig::default();
            config.simulation.machine_decay = decay;
            assert!(
                matches!(config.validate(), Err(DashboardError::Config(_))),
                "decay {decay} accepted"
            );
        }

        let mut config = DashboardConfig::default();
        config.simulation.machine_decay = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unusable_leads_scale() {
        for scale in [0.0, -300.0, f64::NAN] {
            let mut config = DashboardConfig::default();
            config.forecast.leads_scale = scale;
            assert!(config.validate().is_err(), "scale {scale} accepted");
        }
    }

    #[test]
    fn rejects_oversized_fatigue_step() {
        let mut config = DashboardConfig::default();
        config.simulation.fatigue_step = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_weather_window() {
        let mut config = DashboardConfig::default();
        config.advisory.weather_days = 0;
        assert!(matches!(config.validate(), Err(DashboardError::Config(_))));
    }

    #[test]
    fn rejects_overlapping_status_bands() {
        let mut config = DashboardConfig::default();
        config.simulation.status.tired_fatigue = 95;
        assert!(config.validate().is_err());

        let mut config = DashboardConfig::default();
        config.simulation.status.failure_health = 60.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn status_bands_load_from_json() {
        let config: DashboardConfig =
            serde_json::from_str(r#"{"simulation": {"status": {"burnout_fatigue": 95}}}"#)
                .unwrap();
        assert_eq!(config.simulation.status.burnout_fatigue, 95);
        assert_eq!(config.simulation.status.tired_fatigue, 70);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn loads_explicit_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"forecast": {{"horizon": 3}}}}"#).unwrap();

        let config = DashboardConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.forecast.horizon, 3);
    }

    #[test]
    fn rejects_invalid_file_contents() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"simulation": {{"machine_decay": -5.0}}}}"#).unwrap();

        assert!(matches!(
            DashboardConfig::load(Some(file.path())),
            Err(DashboardError::Config(_))
        ));
    }
}
