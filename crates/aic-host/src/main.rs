//! Operational CLI for the AIC attitude controller host
//!
//! `start` runs the controller loop against the built-in simulated
//! vehicle, `status` performs a one-second shakedown and prints the
//! controller diagnostics, `stop` addresses a running instance. The
//! inter-process bus that would carry these commands to a resident
//! flight task belongs to the embedding host.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use nalgebra::Vector3;
use tracing::{error, info};

use aic_host::{
    init_logging, HostConfig, Runtime, RuntimeError, SimulatedVehicle,
};
use aic_core::simulation::SinusoidalRollReference;

#[derive(Parser)]
#[command(name = "aic-host")]
#[command(about = "Adaptive inertia-aware composite attitude controller host")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the controller loop against the built-in simulated vehicle
    Start {
        /// JSON configuration file (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Run duration in seconds
        #[arg(short, long, default_value_t = 10.0)]
        duration: f64,
    },
    /// Validate the configuration, run a short shakedown, print status
    Status {
        /// JSON configuration file (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Stop a running controller instance
    Stop,
}

fn load_config(path: &Option<PathBuf>) -> Result<HostConfig, aic_host::ConfigError> {
    match path {
        Some(path) => HostConfig::from_json_file(path),
        None => Ok(HostConfig::default()),
    }
}

/// True inertia diagonal of the built-in simulated vehicle [kg m^2]
fn sim_inertia() -> Vector3<f64> {
    Vector3::new(0.05, 0.045, 0.03)
}

fn run(cli: Cli) -> Result<(), RuntimeError> {
    match cli.command {
        Command::Start { config, duration } => {
            let config = load_config(&config)?;
            let inertia = sim_inertia();

            info!(duration, ?inertia, "starting controller against simulated vehicle");

            let vehicle = SimulatedVehicle::new(
                inertia,
                SinusoidalRollReference::default(),
                &config,
                duration,
            );

            let mut runtime = Runtime::new();
            runtime.start(&config, vehicle)?;
            let status = runtime.wait()?;

            info!(ticks = status.ticks, "run complete");
            if let Some(controller) = &status.controller {
                info!(
                    det_p = controller.information_determinant,
                    excited = controller.persistently_excited,
                    invalid_input = controller.invalid_input,
                    "controller diagnostics"
                );
                println!(
                    "{}",
                    serde_json::to_string_pretty(controller).expect("status serialises")
                );
            }
            Ok(())
        }
        Command::Status { config } => {
            let config = load_config(&config)?;

            info!("configuration valid; running one-second shakedown");

            let vehicle = SimulatedVehicle::new(
                sim_inertia(),
                SinusoidalRollReference::default(),
                &config,
                1.0,
            );

            let mut runtime = Runtime::new();
            runtime.start(&config, vehicle)?;
            let status = runtime.wait()?;

            println!(
                "{}",
                serde_json::to_string_pretty(&status).expect("status serialises")
            );
            Ok(())
        }
        Command::Stop => {
            // A resident flight task would be addressed over the host's
            // command bus; a fresh CLI process has nothing to stop.
            Err(RuntimeError::NotRunning)
        }
    }
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
