use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::{AsyncBufReadExt, BufReader};

mod advisory;
mod config;
mod dataset;
mod error;
mod forecast;
mod logging;
mod models;
mod report;
mod risk;
mod simulation;
mod weather;

use config::DashboardConfig;
use dataset::Dataset;
use forecast::ForecastBundle;
use simulation::SimulationState;

#[derive(Parser)]
#[command(name = "ops-pulse")]
#[command(about = "Operations dashboard engine: forecasts, simulation and advisories", long_about = None)]
struct Cli {
    /// JSON configuration file (falls back to OPS_PULSE_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SessionArgs {
    /// Read daily records from this CSV instead of the built-in sample
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Seed for forecast noise and simulation draws
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Project revenue, leads and risk past the last recorded day
    Forecast {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long)]
        horizon: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Advance the simulation and print entities plus the advisory banner
    Status {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long, default_value_t = 0)]
        ticks: u64,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long, default_value_t = 0)]
        ticks: u64,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Show the session weather and flood assessment
    Weather {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Ask the advisor a question
    Ask {
        question: Vec<String>,
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long, default_value_t = 0)]
        ticks: u64,
    },
    /// Run the live simulation, reading operator commands from stdin
    Run {
        #[command(flatten)]
        session: SessionArgs,
        /// Stop after this many simulation ticks; 0 prints the starting state and exits
        #[arg(long)]
        ticks: Option<u64>,
    },
}

struct Session {
    config: DashboardConfig,
    dataset: Dataset,
    bundle: ForecastBundle,
    state: SimulationState,
    rng: StdRng,
}

impl Session {
    fn open(config: DashboardConfig, args: &SessionArgs) -> anyhow::Result<Self> {
        let dataset = match &args.csv {
            Some(path) => dataset::load_path(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => dataset::load_embedded().context("built-in dataset is invalid")?,
        };

        let mut rng = match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let bundle = forecast::build_bundle(&dataset, &config.forecast, &mut rng)
            .context("failed to project forecast")?;
        let state = SimulationState::new(config.simulation.clone());

        let mut session = Self {
            config,
            dataset,
            bundle,
            state,
            rng,
        };
        session.ensure_weather();
        Ok(session)
    }

    fn ensure_weather(&mut self) {
        let dates = forecast::future_dates(
            self.dataset.latest().date,
            self.config.advisory.weather_days,
        );
        self.state.ensure_weather(&dates, &mut self.rng);
    }

    fn advance(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.state.tick(&mut self.rng);
        }
    }

    fn advisory(&self) -> advisory::Advisory {
        advisory::evaluate(&self.state, self.dataset.latest(), &self.config.advisory)
    }

    fn snapshot(&self) -> report::DashboardSnapshot {
        report::snapshot(
            &self.dataset,
            &self.bundle,
            self.config.forecast.leads_scale,
            &self.state,
            &self.advisory(),
        )
    }

    fn answer(&self, question: &str) -> String {
        let insight = forecast::revenue_insight(&self.dataset, &self.bundle);
        let ctx = advisory::AdvisorContext {
            latest: self.dataset.latest(),
            insight: &insight,
            state: &self.state,
            config: &self.config.advisory,
        };
        advisory::answer(question, &ctx)
    }

    fn tick_limit_reached(&self, limit: Option<u64>) -> bool {
        limit.is_some_and(|max| self.state.ticks() >= max)
    }

    fn render(&self) {
        print!("{}", report::render_status(&self.state, &self.advisory()));
    }

    /// Applies one operator command. Returns `false` when the operator quits.
    fn handle_command(&mut self, line: &str) -> anyhow::Result<bool> {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match command {
            "" => return Ok(true),
            "quit" | "exit" => return Ok(false),
            "repair" => match self.state.find_machine(rest).map(|m| m.id) {
                Some(id) => {
                    self.state.repair(id)?;
                }
                None => println!("No machine named {rest:?}."),
            },
            "rest" => match self.state.find_employee(rest).map(|e| e.id) {
                Some(id) => {
                    self.state.rest(id)?;
                }
                None => println!("No employee named {rest:?}."),
            },
            "rest-all" => self.state.rest_all(),
            "source" => {
                let source = self.state.toggle_data_source();
                println!("Data source switched to {}.", source.as_str());
            }
            "reset" => {
                self.state.reset();
                self.ensure_weather();
            }
            "weather" => {
                print!("{}", report::render_weather(&self.state));
                return Ok(true);
            }
            "ask" => {
                println!("{}", self.answer(rest));
                return Ok(true);
            }
            _ => {
                println!(
                    "Commands: repair <machine>, rest <employee>, rest-all, source, reset, weather, ask <question>, quit"
                );
                return Ok(true);
            }
        }

        self.render();
        Ok(true)
    }
}

async fn run_live(mut session: Session, tick_limit: Option<u64>) -> anyhow::Result<()> {
    let sim = &session.config.simulation;
    let mut clock = tokio::time::interval(Duration::from_millis(sim.clock_interval_ms));
    let mut ticker = tokio::time::interval(Duration::from_millis(sim.tick_interval_ms));
    // The first interval tick completes immediately; the simulation waits a full period.
    ticker.tick().await;

    session.render();
    if session.tick_limit_reached(tick_limit) {
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = clock.tick() => {
                tracing::debug!(time = %chrono::Local::now().format("%H:%M:%S"), "clock");
            }
            _ = ticker.tick() => {
                session.state.tick(&mut session.rng);
                session.render();
                if session.tick_limit_reached(tick_limit) {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line.context("failed to read operator input")? {
                    Some(line) => {
                        if !session.handle_command(&line)? {
                            break;
                        }
                    }
                    None => stdin_open = false,
                }
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>, horizon: Option<usize>) -> anyhow::Result<DashboardConfig> {
    let mut config = DashboardConfig::load(path).context("failed to load configuration")?;
    if let Some(horizon) = horizon {
        config.forecast.horizon = horizon;
        config.validate()?;
    }
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Forecast {
            session,
            horizon,
            json,
        } => {
            let config = load_config(config_path, horizon)?;
            let session = Session::open(config, &session)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&session.bundle)?);
            } else {
                print!("{}", report::render_forecast(&session.dataset, &session.bundle));
            }
        }
        Commands::Status {
            session,
            ticks,
            json,
        } => {
            let mut session = Session::open(load_config(config_path, None)?, &session)?;
            session.advance(ticks);

            if json {
                println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
            } else {
                session.render();
            }
        }
        Commands::Report {
            session,
            ticks,
            out,
        } => {
            let mut session = Session::open(load_config(config_path, None)?, &session)?;
            session.advance(ticks);

            let report = report::build_report(
                &session.dataset,
                &session.bundle,
                &session.state,
                &session.advisory(),
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Weather { session } => {
            let session = Session::open(load_config(config_path, None)?, &session)?;
            print!("{}", report::render_weather(&session.state));
        }
        Commands::Ask {
            question,
            session,
            ticks,
        } => {
            let mut session = Session::open(load_config(config_path, None)?, &session)?;
            session.advance(ticks);
            println!("{}", session.answer(&question.join(" ")));
        }
        Commands::Run { session, ticks } => {
            let session = Session::open(load_config(config_path, None)?, &session)?;
            run_live(session, ticks).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        let args = SessionArgs {
            csv: None,
            seed: Some(7),
        };
        Session::open(DashboardConfig::default(), &args).unwrap()
    }

    fn health(session: &Session, name: &str) -> f64 {
        session.state.find_machine(name).unwrap().health
    }

    #[test]
    fn repair_command_finds_machine_by_name() {
        let mut session = session();
        session.advance(10);
        assert_eq!(health(&session, "Server A"), 70.0);

        assert!(session.handle_command("repair  server a ").unwrap());
        assert_eq!(health(&session, "Server A"), 100.0);
        assert_eq!(health(&session, "Server B"), 45.0);
    }

    #[test]
    fn multi_word_names_survive_the_split() {
        let mut session = session();
        session.advance(5);

        assert!(session.handle_command("repair Cloud Infrastructure").unwrap());
        assert_eq!(health(&session, "Cloud Infrastructure"), 100.0);
    }

    #[test]
    fn rest_commands_clear_fatigue() {
        let mut session = session();
        assert!(session.handle_command("rest David B.").unwrap());
        assert_eq!(session.state.find_employee("David B.").unwrap().fatigue, 0);
        assert_eq!(session.state.find_employee("Mike R.").unwrap().fatigue, 52);

        assert!(session.handle_command("rest-all").unwrap());
        assert!(session.state.employees().iter().all(|e| e.fatigue == 0));
    }

    #[test]
    fn unknown_names_and_commands_change_nothing() {
        let mut session = session();
        session.advance(3);
        let before = session.state.snapshot();

        for line in ["repair Mainframe", "rest Nobody", "repair", "dance", ""] {
            assert!(session.handle_command(line).unwrap(), "{line:?} ended the session");
        }

        let after = session.state.snapshot();
        assert_eq!(after.ticks, before.ticks);
        for (a, b) in after.machines.iter().zip(&before.machines) {
            assert_eq!(a.machine.health, b.machine.health);
        }
        for (a, b) in after.employees.iter().zip(&before.employees) {
            assert_eq!(a.employee.fatigue, b.employee.fatigue);
        }
    }

    #[test]
    fn source_command_toggles() {
        let mut session = session();
        assert!(session.handle_command("source").unwrap());
        assert_eq!(session.state.data_source(), models::DataSource::AzureSynapse);
    }

    #[test]
    fn reset_regenerates_weather() {
        let mut session = session();
        assert_eq!(session.state.weather().len(), 5);
        session.advance(8);

        assert!(session.handle_command("reset").unwrap());
        assert_eq!(session.state.ticks(), 0);
        assert_eq!(health(&session, "Server A"), 90.0);
        assert_eq!(session.state.weather().len(), 5);
    }

    #[test]
    fn quit_ends_the_session() {
        let mut session = session();
        assert!(!session.handle_command("quit").unwrap());
        assert!(!session.handle_command(" exit ").unwrap());
    }

    #[test]
    fn zero_tick_limit_is_reached_before_any_tick() {
        let mut session = session();
        assert!(session.tick_limit_reached(Some(0)));
        assert!(!session.tick_limit_reached(None));
        assert!(!session.tick_limit_reached(Some(2)));

        session.advance(2);
        assert!(session.tick_limit_reached(Some(2)));
        assert!(!session.tick_limit_reached(None));
    }
}
