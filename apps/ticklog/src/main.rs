use clap::{Parser, Subcommand};
use std::path::PathBuf;
use ticklog::commands::{exit_code_for, run_command, Command};
use ticklog::obs;
use ticklog_application::config::load_config_or_default;
use ticklog_infrastructure::clock::SystemClock;

#[derive(Parser, Debug)]
#[command(name = "ticklog")]
#[command(about = "Per-signal equity tick logs with week/month profit reports.", version)]
struct Cli {
    /// Config file path (TOML). Built-in defaults apply when neither this nor
    /// TICKLOG_CONFIG is set.
    #[arg(long, global = true, env = "TICKLOG_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Append a snapshot unless it repeats the last one within a minute.
    Record {
        #[arg(long)]
        signal: String,
        /// Observation time, "dd.MM.yyyy HH:mm:ss" or "yyyy-MM-dd HH:mm:ss".
        #[arg(long)]
        timestamp: String,
        #[arg(long, allow_negative_numbers = true)]
        equity: f64,
        #[arg(long, allow_negative_numbers = true)]
        floating: f64,
        #[arg(long, allow_negative_numbers = true, default_value_t = 0.0)]
        profit: f64,
    },
    /// Latest recorded snapshot.
    Status {
        #[arg(long)]
        signal: String,
    },
    /// Profit since the start of the current week and month.
    Profit {
        #[arg(long)]
        signal: String,
        /// Reference instant (default: local now).
        #[arg(long)]
        now: Option<String>,
    },
    /// Drop ticks older than the retention window, keeping a .backup copy.
    Compact {
        #[arg(long, conflicts_with = "all")]
        signal: Option<String>,
        #[arg(long)]
        all: bool,
        /// e.g. 30d, 12h, 2w (default: retention.max_age).
        #[arg(long)]
        max_age: Option<String>,
        #[arg(long)]
        now: Option<String>,
    },
    /// Write the series as CSV with a derived total_value column.
    Export {
        #[arg(long)]
        signal: String,
        #[arg(long)]
        out: PathBuf,
        /// Only the last N ticks.
        #[arg(long)]
        tail: Option<usize>,
    },
    /// Line-level quality report; --strict fails above validation.max_malformed.
    Validate {
        #[arg(long)]
        signal: String,
        #[arg(long)]
        strict: bool,
    },
    /// Status and period profit for every signal in the data directory.
    Summary {
        #[arg(long)]
        now: Option<String>,
    },
}

impl From<Commands> for Command {
    fn from(value: Commands) -> Self {
        match value {
            Commands::Record {
                signal,
                timestamp,
                equity,
                floating,
                profit,
            } => Command::Record {
                signal,
                timestamp,
                equity,
                floating,
                profit,
            },
            Commands::Status { signal } => Command::Status { signal },
            Commands::Profit { signal, now } => Command::Profit { signal, now },
            Commands::Compact {
                signal,
                all,
                max_age,
                now,
            } => Command::Compact {
                signal,
                all,
                max_age,
                now,
            },
            Commands::Export { signal, out, tail } => Command::Export { signal, out, tail },
            Commands::Validate { signal, strict } => Command::Validate { signal, strict },
            Commands::Summary { now } => Command::Summary { now },
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = obs::init_tracing(config.log_level(), config.log_format()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    if let Err(err) = obs::init_metrics() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }

    match run_command(&config, cli.command.into(), SystemClock) {
        Ok(json) => {
            println!(
                "{}",
                serde_json::to_string(&json)
                    .unwrap_or_else(|_| "{\"status\":\"error\",\"error\":\"json\"}".to_string())
            );
        }
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("error: {err}");
            std::process::exit(exit_code_for(&err));
        }
    }
}
