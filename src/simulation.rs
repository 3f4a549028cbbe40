use std::collections::VecDeque;

use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use crate::config::{SimulationConfig, StatusThresholds};
use crate::error::{DashboardError, Result};
use crate::models::{DataSource, Employee, LoadSample, Machine, WeatherDay};
use crate::weather;

/// Fixed-capacity FIFO window of load samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadHistory {
    capacity: usize,
    samples: VecDeque<LoadSample>,
}

impl LoadHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends `sample`, returning the evicted oldest entry once the window is full.
    pub fn push(&mut self, sample: LoadSample) -> Option<LoadSample> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    pub fn latest(&self) -> Option<&LoadSample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadSample> {
        self.samples.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EmployeeStatus {
    BurnoutRisk,
    Tired,
    Working,
    PeakPerformance,
}

impl EmployeeStatus {
    pub fn of(employee: &Employee, bands: &StatusThresholds) -> Self {
        match employee.fatigue {
            f if f > bands.burnout_fatigue => EmployeeStatus::BurnoutRisk,
            f if f > bands.tired_fatigue => EmployeeStatus::Tired,
            f if f > bands.working_fatigue => EmployeeStatus::Working,
            _ => EmployeeStatus::PeakPerformance,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::BurnoutRisk => "BURNOUT RISK",
            EmployeeStatus::Tired => "TIRED",
            EmployeeStatus::Working => "WORKING",
            EmployeeStatus::PeakPerformance => "PEAK PERF.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MachineStatus {
    Failure,
    Degrading,
    Operational,
    Optimal,
}

impl MachineStatus {
    pub fn of(machine: &Machine, bands: &StatusThresholds) -> Self {
        match machine.health {
            h if h < bands.failure_health => MachineStatus::Failure,
            h if h < bands.degrading_health => MachineStatus::Degrading,
            h if h < bands.optimal_health => MachineStatus::Operational,
            _ => MachineStatus::Optimal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MachineStatus::Failure => "FAILURE",
            MachineStatus::Degrading => "DEGRADING",
            MachineStatus::Operational => "OPERATIONAL",
            MachineStatus::Optimal => "OPTIMAL",
        }
    }
}

/// The whole mutable model. Created from config, owned by the caller,
/// advanced only through `tick` and the operator actions below.
#[derive(Debug, Clone)]
pub struct SimulationState {
    config: SimulationConfig,
    initial_employees: Vec<Employee>,
    initial_machines: Vec<Machine>,
    employees: Vec<Employee>,
    machines: Vec<Machine>,
    load_history: LoadHistory,
    next_hour: u32,
    data_source: DataSource,
    weather: Vec<WeatherDay>,
    ticks: u64,
}

impl SimulationState {
    pub fn new(config: SimulationConfig) -> Self {
        let employees: Vec<Employee> = config
            .employees
            .iter()
            .map(|seed| Employee {
                id: Uuid::new_v4(),
                name: seed.name.clone(),
                role: seed.role.clone(),
                fatigue: seed.fatigue.min(100),
                score: seed.score,
            })
            .collect();
        let machines: Vec<Machine> = config
            .machines
            .iter()
            .map(|seed| Machine {
                id: Uuid::new_v4(),
                name: seed.name.clone(),
                kind: seed.kind.clone(),
                health: seed.health.clamp(0.0, 100.0),
            })
            .collect();

        let mut state = Self {
            initial_employees: employees.clone(),
            initial_machines: machines.clone(),
            employees,
            machines,
            load_history: LoadHistory::new(config.history_capacity),
            next_hour: config.first_hour,
            data_source: DataSource::GoogleBigQuery,
            weather: Vec::new(),
            ticks: 0,
            config,
        };
        state.seed_load_history();
        state
    }

    fn seed_load_history(&mut self) {
        self.load_history = LoadHistory::new(self.config.history_capacity);
        self.next_hour = self.config.first_hour;
        for load in self.config.initial_load.clone() {
            let label = self.advance_hour();
            self.load_history.push(LoadSample { label, load });
        }
    }

    fn advance_hour(&mut self) -> String {
        let label = format!("{:02}:00", self.next_hour);
        self.next_hour = (self.next_hour + 1) % 24;
        label
    }

    /// Advances the model by exactly one step: one load sample in, one
    /// decay step on every machine, one fatigue step on every employee.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> LoadSample {
        let load = rng.gen_range(self.config.load_min..=self.config.load_max);
        let sample = LoadSample {
            label: self.advance_hour(),
            load,
        };
        let evicted = self.load_history.push(sample.clone());

        let decay = self.config.machine_decay;
        for machine in &mut self.machines {
            machine.health = (machine.health - decay).max(0.0);
        }

        let step = self.config.fatigue_step;
        for employee in &mut self.employees {
            employee.fatigue = employee.fatigue.saturating_add(step).min(100);
        }

        self.ticks += 1;
        tracing::debug!(
            tick = self.ticks,
            load,
            evicted = ?evicted.map(|s| s.load),
            window = self.load_history.len(),
            "simulation tick"
        );
        sample
    }

    pub fn repair(&mut self, id: Uuid) -> Result<&Machine> {
        let machine = self
            .machines
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(DashboardError::UnknownEntity { kind: "machine", id })?;

        machine.health = 100.0;
        tracing::info!(machine = %machine.name, "machine repaired");
        Ok(&*machine)
    }

    /// Resets one employee's fatigue and awards the configured score bonus.
    pub fn rest(&mut self, id: Uuid) -> Result<&Employee> {
        let bonus = self.config.rest_score_bonus;
        let employee = self
            .employees
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(DashboardError::UnknownEntity {
                kind: "employee",
                id,
            })?;

        employee.fatigue = 0;
        employee.score += bonus;
        tracing::info!(employee = %employee.name, bonus, "employee rested");
        Ok(&*employee)
    }

    pub fn rest_all(&mut self) {
        for employee in &mut self.employees {
            employee.fatigue = 0;
        }
        tracing::info!(count = self.employees.len(), "entire staff sent on break");
    }

    pub fn toggle_data_source(&mut self) -> DataSource {
        self.data_source = self.data_source.toggled();
        tracing::info!(source = self.data_source.as_str(), "data source switched");
        self.data_source
    }

    /// Restores the configured starting state. Entity ids are preserved and
    /// the session weather is discarded.
    pub fn reset(&mut self) {
        self.employees = self.initial_employees.clone();
        self.machines = self.initial_machines.clone();
        self.data_source = DataSource::GoogleBigQuery;
        self.weather.clear();
        self.ticks = 0;
        self.seed_load_history();
        tracing::info!("simulation reset");
    }

    /// Generates the weather for `dates` the first time it is called;
    /// later calls return the same days.
    pub fn ensure_weather<R: Rng + ?Sized>(
        &mut self,
        dates: &[NaiveDate],
        rng: &mut R,
    ) -> &[WeatherDay] {
        if self.weather.is_empty() {
            self.weather = weather::generate(dates, rng);
            tracing::info!(days = self.weather.len(), "weather forecast generated");
        }
        &self.weather
    }

    pub fn weather(&self) -> &[WeatherDay] {
        &self.weather
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    pub fn load_history(&self) -> &LoadHistory {
        &self.load_history
    }

    pub fn data_source(&self) -> DataSource {
        self.data_source
    }

    pub fn company_savings(&self) -> u64 {
        self.config.company_savings
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn find_employee(&self, name: &str) -> Option<&Employee> {
        self.employees
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn find_machine(&self, name: &str) -> Option<&Machine> {
        self.machines
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            ticks: self.ticks,
            data_source: self.data_source.as_str(),
            company_savings: self.config.company_savings,
            current_load: self.load_history.latest().map(|s| s.load),
            history_capacity: self.load_history.capacity(),
            load_history: self.load_history.iter().cloned().collect(),
            employees: self
                .employees
                .iter()
                .map(|e| EmployeeView {
                    employee: e.clone(),
                    status: EmployeeStatus::of(e, &self.config.status),
                })
                .collect(),
            machines: self
                .machines
                .iter()
                .map(|m| MachineView {
                    machine: m.clone(),
                    status: MachineStatus::of(m, &self.config.status),
                })
                .collect(),
            weather: self.weather.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployeeView {
    #[serde(flatten)]
    pub employee: Employee,
    pub status: EmployeeStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct MachineView {
    #[serde(flatten)]
    pub machine: Machine,
    pub status: MachineStatus,
}

/// Read-only copy of the model for renderers.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSnapshot {
    pub ticks: u64,
    pub data_source: &'static str,
    pub company_savings: u64,
    pub current_load: Option<u32>,
    pub history_capacity: usize,
    pub load_history: Vec<LoadSample>,
    pub employees: Vec<EmployeeView>,
    pub machines: Vec<MachineView>,
    pub weather: Vec<WeatherDay>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmployeeSeed, MachineSeed};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config() -> SimulationConfig {
        SimulationConfig::default()
    }

    fn tiny_config() -> SimulationConfig {
        SimulationConfig {
            employees: vec![EmployeeSeed {
                name: "Sarah J.".to_string(),
                role: "Engineer".to_string(),
                fatigue: 98,
                score: 100,
            }],
            machines: vec![MachineSeed {
                name: "Router".to_string(),
                kind: "Internet".to_string(),
                health: 3.0,
            }],
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn decay_is_uniform_per_tick() {
        let mut state = SimulationState::new(config());
        let initial: Vec<f64> = state.machines().iter().map(|m| m.health).collect();
        let mut rng = StdRng::seed_from_u64(5);

        for ticks in 1..=60u32 {
            state.tick(&mut rng);
            for (machine, start) in state.machines().iter().zip(&initial) {
                let expected = (start - ticks as f64 * 2.0).max(0.0);
                assert_eq!(machine.health, expected);
            }
        }
        assert_eq!(state.ticks(), 60);
    }

    #[test]
    fn repair_restores_full_health() {
        let mut state = SimulationState::new(config());
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..70 {
            state.tick(&mut rng);
        }

        let id = state.machines()[1].id;
        assert_eq!(state.machines()[1].health, 0.0);
        assert_eq!(state.repair(id).unwrap().health, 100.0);

        state.tick(&mut rng);
        assert_eq!(state.machines()[1].health, 98.0);
    }

    #[test]
    fn fatigue_is_capped() {
        let mut state = SimulationState::new(tiny_config());
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..5 {
            state.tick(&mut rng);
        }
        assert_eq!(state.employees()[0].fatigue, 100);
        assert_eq!(state.machines()[0].health, 0.0);
    }

    #[test]
    fn rest_resets_fatigue_and_awards_bonus() {
        let mut cfg = tiny_config();
        cfg.rest_score_bonus = 5;
        let mut state = SimulationState::new(cfg);
        let id = state.employees()[0].id;

        let rested = state.rest(id).unwrap();
        assert_eq!(rested.fatigue, 0);
        assert_eq!(rested.score, 105);
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut state = SimulationState::new(config());
        assert!(matches!(
            state.repair(Uuid::new_v4()),
            Err(DashboardError::UnknownEntity { kind: "machine", .. })
        ));
        assert!(matches!(
            state.rest(Uuid::new_v4()),
            Err(DashboardError::UnknownEntity { kind: "employee", .. })
        ));
    }

    #[test]
    fn load_history_is_a_fixed_window() {
        let mut state = SimulationState::new(config());
        let labels: Vec<String> = state.load_history().iter().map(|s| s.label.clone()).collect();
        assert_eq!(labels, vec!["09:00", "10:00", "11:00", "12:00", "13:00"]);

        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..12 {
            let before: Vec<LoadSample> = state.load_history().iter().cloned().collect();
            let added = state.tick(&mut rng);
            let after: Vec<LoadSample> = state.load_history().iter().cloned().collect();

            assert_eq!(after.len(), 5);
            assert_eq!(&after[..4], &before[1..]);
            assert_eq!(after[4], added);
            assert!((50..=79).contains(&added.load));
        }
        assert_eq!(state.load_history().latest().unwrap().label, "01:00");
    }

    #[test]
    fn ring_buffer_fills_before_evicting() {
        let mut history = LoadHistory::new(2);
        let sample = |load| LoadSample {
            label: "x".to_string(),
            load,
        };
        assert_eq!(history.push(sample(1)), None);
        assert_eq!(history.push(sample(2)), None);
        assert_eq!(history.push(sample(3)), Some(sample(1)));
        assert_eq!(history.len(), history.capacity());
    }

    #[test]
    fn weather_is_generated_once() {
        let mut state = SimulationState::new(config());
        let start = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let dates: Vec<NaiveDate> = (0..5).map(|i| start + chrono::Duration::days(i)).collect();

        let mut rng = StdRng::seed_from_u64(1);
        let first = state.ensure_weather(&dates, &mut rng).to_vec();
        let mut other = StdRng::seed_from_u64(2);
        let second = state.ensure_weather(&dates, &mut other).to_vec();

        assert_eq!(first.len(), 5);
        assert_eq!(first, second);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut state = SimulationState::new(config());
        let ids: Vec<Uuid> = state.machines().iter().map(|m| m.id).collect();
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..10 {
            state.tick(&mut rng);
        }
        state.toggle_data_source();
        state.ensure_weather(&[NaiveDate::from_ymd_opt(2025, 12, 1).unwrap()], &mut rng);

        state.reset();

        assert_eq!(state.ticks(), 0);
        assert_eq!(state.data_source(), DataSource::GoogleBigQuery);
        assert!(state.weather().is_empty());
        assert_eq!(state.machines()[0].health, 90.0);
        assert_eq!(state.employees()[0].fatigue, 30);
        assert_eq!(state.machines().iter().map(|m| m.id).collect::<Vec<_>>(), ids);
        assert_eq!(state.load_history().latest().unwrap().load, 60);
    }

    #[test]
    fn rest_all_clears_everyone() {
        let mut state = SimulationState::new(config());
        state.rest_all();
        assert!(state.employees().iter().all(|e| e.fatigue == 0));
    }

    #[test]
    fn data_source_toggles_back_and_forth() {
        let mut state = SimulationState::new(config());
        assert_eq!(state.toggle_data_source(), DataSource::AzureSynapse);
        assert_eq!(state.toggle_data_source(), DataSource::GoogleBigQuery);
    }

    #[test]
    fn statuses_follow_thresholds() {
        let mut state = SimulationState::new(config());
        let snapshot = state.snapshot();
        assert_eq!(snapshot.employees[3].status, EmployeeStatus::Tired);
        assert_eq!(snapshot.employees[2].status, EmployeeStatus::PeakPerformance);
        assert_eq!(snapshot.machines[2].status, MachineStatus::Optimal);
        assert_eq!(snapshot.machines[1].status, MachineStatus::Operational);

        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..25 {
            state.tick(&mut rng);
        }
        let snapshot = state.snapshot();
        assert_eq!(snapshot.machines[1].status, MachineStatus::Failure);
        assert_eq!(snapshot.employees[3].status, EmployeeStatus::BurnoutRisk);
        assert_eq!(snapshot.current_load, state.load_history().latest().map(|s| s.load));
    }

    #[test]
    fn status_bands_come_from_config() {
        let mut cfg = config();
        cfg.status.working_fatigue = 5;
        cfg.status.tired_fatigue = 25;
        cfg.status.degrading_health = 95.0;
        let state = SimulationState::new(cfg);
        let snapshot = state.snapshot();

        // Sarah J. at 30 fatigue, Server A at 90 health.
        assert_eq!(snapshot.employees[0].status, EmployeeStatus::Tired);
        assert_eq!(snapshot.employees[2].status, EmployeeStatus::Working);
        assert_eq!(snapshot.machines[0].status, MachineStatus::Degrading);
        assert_eq!(snapshot.machines[2].status, MachineStatus::Optimal);
    }

    #[test]
    fn find_by_name_ignores_case() {
        let state = SimulationState::new(config());
        assert_eq!(state.find_machine("server a").unwrap().name, "Server A");
        assert_eq!(state.find_employee(" Mike R. ").unwrap().role, "Logistics");
        assert!(state.find_machine("Mainframe").is_none());
    }
}
