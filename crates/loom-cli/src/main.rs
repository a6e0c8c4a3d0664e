//! Loom CLI
//!
//! Lowers compilation units given as JSON into graph IR definitions.

use clap::{ArgAction, Parser, Subcommand};
use loom_cli::commands::{self, OutputFormat};
use loom_cli::config::{self, Overrides};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "loom")]
#[command(about = "Lower typed class trees to graph IR", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lower a compilation unit and print its definitions
    Lower {
        /// Compilation unit (JSON)
        file: PathBuf,
        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Worker threads
        #[arg(short, long)]
        jobs: Option<usize>,
        /// Skip graph validation
        #[arg(long)]
        no_validate: bool,
        /// Only lower methods whose name contains this string
        #[arg(long)]
        filter: Option<String>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Lower a compilation unit and report counts only
    Check {
        /// Compilation unit (JSON)
        file: PathBuf,
        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn setup_logging(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let formatter = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(formatter)
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let result = match cli.command {
        Commands::Lower {
            file,
            config,
            jobs,
            no_validate,
            filter,
            format,
        } => config::load(config.as_deref()).and_then(|options| {
            let options = Overrides {
                jobs,
                no_validate,
                filter,
            }
            .apply(options);
            commands::lower::execute(&file, options, format)
        }),

        Commands::Check { file, config } => config::load(config.as_deref())
            .and_then(|options| commands::check::execute(&file, options)),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
