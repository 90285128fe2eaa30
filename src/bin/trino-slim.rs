use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;
use trino_slim::cli::{self, CliArgs, Invocation};
use trino_slim::{pipeline, preflight, Architecture, ProcessToolchain, RunConfig};

const LOG_LEVEL_ENV: &str = "TRINO_SLIM_LOG";

fn main() -> ExitCode {
    let invocation = match cli::parse_args(std::env::args().skip(1)) {
        Ok(invocation) => invocation,
        Err(err) => {
            eprintln!("error: {err}\n\n{}", cli::usage());
            return ExitCode::from(err.exit_code());
        }
    };

    let args = match invocation {
        Invocation::Help => {
            println!("{}", cli::usage());
            return ExitCode::SUCCESS;
        }
        Invocation::Run(args) => args,
    };

    init_logging();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let level = std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|value| value.trim().parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    let mut subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .without_time();

    if [Level::DEBUG, Level::TRACE].contains(&level) {
        subscriber = subscriber.with_file(true).with_line_number(true);
    }

    if let Err(err) = tracing::subscriber::set_global_default(subscriber.finish()) {
        eprintln!("warning: logging unavailable: {err}");
    }
}

fn run(args: CliArgs) -> Result<()> {
    let work_dir = std::env::current_dir().context("resolving current directory")?;
    let mut config = RunConfig::new(args.release, args.architectures, work_dir);
    config.jdk_release = args.jdk_release;
    if let Some(path) = &args.config_file {
        config.apply_file(path)?;
    }

    preflight::check_host_tools(config.jdk_strategy)?;

    let toolchain = ProcessToolchain::new();
    pipeline::run(&config, &toolchain, Architecture::host())
}
