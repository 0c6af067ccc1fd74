#![allow(non_snake_case)]
use RustedNumLabs::Examples::approximation_examples::run_approximation_lab;
use RustedNumLabs::Examples::bvp_examples::run_bvp_lab;
use RustedNumLabs::Examples::integration_examples::run_integration_lab;
use RustedNumLabs::Examples::ivp_examples::run_ivp_lab;
use RustedNumLabs::Examples::lab_config::{LabConfig, LabOutput};
use RustedNumLabs::Examples::lab_error::LabError;
use RustedNumLabs::Examples::nonlinear_eq_examples::run_equation_lab;
use RustedNumLabs::Examples::nonlinear_system_examples::run_system_lab;
use RustedNumLabs::Examples::spline_examples::run_spline_lab;
use RustedNumLabs::Utils::logger::{init_logger, parse_loglevel};
use clap::{Parser, ValueEnum};
use log::{LevelFilter, error, info};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Task {
    Equation,
    System,
    Approximation,
    Spline,
    Integration,
    Ivp,
    Bvp,
    All,
}

impl Task {
    const LABS: [Task; 7] = [
        Task::Equation,
        Task::System,
        Task::Approximation,
        Task::Spline,
        Task::Integration,
        Task::Ivp,
        Task::Bvp,
    ];

    fn expand(self) -> Vec<Task> {
        match self {
            Task::All => Task::LABS.to_vec(),
            lab => vec![lab],
        }
    }
}

#[derive(Parser)]
#[command(name = "numlabs")]
#[command(about = "Classical numerical-analysis labs: tables, plots and error estimates")]
#[command(version)]
struct Cli {
    /// lab to run
    #[arg(long, value_enum, default_value_t = Task::All)]
    task: Task,
    /// keyed document overriding the default parameters
    #[arg(long)]
    config: Option<PathBuf>,
    /// directory for plots and CSV files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
    /// off, error, warn, info or debug
    #[arg(long, default_value = "info", value_parser = parse_level)]
    loglevel: LevelFilter,
    /// also write a dated log file into this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// export solution tables as CSV
    #[arg(long)]
    csv: bool,
}

fn parse_level(s: &str) -> Result<LevelFilter, String> {
    parse_loglevel(s).ok_or_else(|| format!("unknown log level '{}'", s))
}

fn run_task(task: Task, config: &LabConfig, output: &LabOutput) -> Result<(), LabError> {
    match task {
        Task::Equation => run_equation_lab(&config.equation, output).map(|_| ()),
        Task::System => run_system_lab(&config.system, output).map(|_| ()),
        Task::Approximation => run_approximation_lab(&config.approximation, output).map(|_| ()),
        Task::Spline => run_spline_lab(&config.spline, output).map(|_| ()),
        Task::Integration => run_integration_lab(&config.integration, output).map(|_| ()),
        Task::Ivp => run_ivp_lab(&config.ivp, output).map(|_| ()),
        Task::Bvp => run_bvp_lab(&config.bvp, output).map(|_| ()),
        Task::All => {
            for lab in Task::LABS {
                run_task(lab, config, output)?;
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match init_logger(cli.loglevel, cli.log_dir.as_deref()) {
        Ok(Some(path)) => info!("logging to {}", path.display()),
        Ok(None) => {}
        Err(e) => {
            eprintln!("cannot open log file: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let config = match &cli.config {
        Some(path) => match LabConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => LabConfig::default(),
    };
    if let Err(e) = std::fs::create_dir_all(&cli.output_dir) {
        error!("cannot create {}: {}", cli.output_dir.display(), e);
        return ExitCode::FAILURE;
    }
    let output = LabOutput::new(cli.output_dir, cli.csv);

    let mut failed = false;
    for task in cli.task.expand() {
        info!("running {:?} lab", task);
        if let Err(e) = run_task(task, &config, &output) {
            error!("{:?} lab failed: {}", task, e);
            failed = true;
        }
    }
    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}
