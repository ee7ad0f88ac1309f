mod commands;

use clap::Parser;
use quakelab_core::domain::EngineError;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "quakelab",
    version,
    about = "Strong-motion record processing and design-spectrum construction"
)]
struct Cli {
    /// Log filter directive, e.g. `info` or `quakelab_core=debug`
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: commands::Command,
}

pub fn run_from_env() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => match error.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{error}");
                return 0;
            }
            _ => {
                eprint!("{error}");
                return 2;
            }
        },
    };

    init_tracing(&cli.log_level);

    match cli.command.execute() {
        Ok(()) => 0,
        Err(error) => match error.downcast::<EngineError>() {
            Ok(engine_error) => {
                eprintln!("{}", engine_error.diagnostic_line());
                eprintln!("{}", engine_error.fatal_exit_line());
                engine_error.exit_code()
            }
            Err(other) => {
                eprintln!("ERROR: {other:#}");
                5
            }
        },
    }
}

fn init_tracing(directive: &str) {
    let filter =
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
