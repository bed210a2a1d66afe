//! cc-test: spent fuel assembly gamma source into a Compton camera.

use clap::Parser;
use spent_fuel_cc::{PhysicsList, RunConfig, Session};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "cc-test")]
#[command(about = "Simulate gamma rays from a spent fuel assembly recorded by a Compton camera")]
struct Args {
    /// Macro file to execute (batch mode); commands are read from stdin otherwise
    #[arg(short = 'm', long = "macro")]
    macro_file: Option<PathBuf>,

    /// Number of worker threads
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Physics list: standard or compton-only
    #[arg(short = 'p', long)]
    physics: Option<String>,

    /// Run configuration (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Output file, overriding the configuration
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

fn run(args: Args) -> spent_fuel_cc::Result<()> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };
    if let Some(threads) = args.threads {
        config.run.threads = threads;
    }
    if let Some(physics) = args.physics {
        if PhysicsList::from_str_option(&physics).is_none() {
            return Err(spent_fuel_cc::CcError::UnknownPhysicsList(physics));
        }
        config.run.physics = physics;
    }
    if let Some(output) = args.output {
        config.output = output;
    }
    // fresh seed per invocation unless fixed by the configuration or a macro
    if config.run.seed.is_none() {
        config.run.seed = Some(rand::random());
    }

    let mut session = Session::new(config);
    match &args.macro_file {
        Some(path) => session.execute_file(path)?,
        None => {
            tracing::info!("Reading commands from stdin, 'exit' to quit");
            let stdin = std::io::stdin();
            session.run_reader(stdin.lock(), "stdin")?;
        }
    }
    session.finish()
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("spent_fuel_cc=info,cc_test=info")),
        )
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
