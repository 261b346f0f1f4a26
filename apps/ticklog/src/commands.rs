use chrono::NaiveDateTime;
use std::path::PathBuf;
use ticklog_application::config::Config;
use ticklog_application::maintenance::{self, CompactTarget};
use ticklog_application::{parse_timestamp, recording, reporting, validation};
use ticklog_domain::repositories::clock::Clock;
use ticklog_domain::value_objects::retention::RetentionWindow;
use ticklog_domain::value_objects::snapshot::Snapshot;
use ticklog_infrastructure::reporting::FilesystemSeriesExporter;
use ticklog_infrastructure::tick_log::FilesystemSeriesRepository;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Record {
        signal: String,
        timestamp: String,
        equity: f64,
        floating: f64,
        profit: f64,
    },
    Status {
        signal: String,
    },
    Profit {
        signal: String,
        now: Option<String>,
    },
    Compact {
        signal: Option<String>,
        all: bool,
        max_age: Option<String>,
        now: Option<String>,
    },
    Export {
        signal: String,
        out: PathBuf,
        tail: Option<usize>,
    },
    Validate {
        signal: String,
        strict: bool,
    },
    Summary {
        now: Option<String>,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Record { .. } => "record",
            Command::Status { .. } => "status",
            Command::Profit { .. } => "profit",
            Command::Compact { .. } => "compact",
            Command::Export { .. } => "export",
            Command::Validate { .. } => "validate",
            Command::Summary { .. } => "summary",
        }
    }
}

/// Runs one command against the configured data directory and wraps the use-case
/// report in `{"status": "ok", "command": ..}`.
pub fn run_command<C: Clock + Clone>(
    config: &Config,
    command: Command,
    clock: C,
) -> Result<serde_json::Value, String> {
    let name = command.name();
    let repo = FilesystemSeriesRepository::with_clock(
        config.data_dir(),
        config.file_extension(),
        clock.clone(),
    );

    let result = match command {
        Command::Record {
            signal,
            timestamp,
            equity,
            floating,
            profit,
        } => {
            let snapshot = Snapshot::new(parse_timestamp(&timestamp)?, equity, floating, profit);
            recording::record_snapshot(&repo, &signal, &snapshot)
        }
        Command::Status { signal } => reporting::latest_status(&repo, &signal),
        Command::Profit { signal, now } => {
            let now = resolve_now(now.as_deref(), &clock)?;
            reporting::period_profit_report(&repo, &signal, now)
        }
        Command::Compact {
            signal,
            all,
            max_age,
            now,
        } => {
            let target = match (signal.as_deref(), all) {
                (Some(_), true) => return Err("use either --signal or --all, not both".to_string()),
                (Some(signal), false) => CompactTarget::Signal(signal),
                (None, true) => CompactTarget::All,
                (None, false) => return Err("compact needs --signal or --all".to_string()),
            };
            let window = match max_age.as_deref() {
                Some(raw) => RetentionWindow::parse(raw)?,
                None => config.retention_window()?,
            };
            let now = resolve_now(now.as_deref(), &clock)?;
            maintenance::compact(&repo, target, &window, now)
        }
        Command::Export { signal, out, tail } => reporting::export_series(
            &repo,
            &FilesystemSeriesExporter::new(),
            &signal,
            &out,
            tail,
        ),
        Command::Validate { signal, strict } => {
            validation::validate(&repo, &signal, strict, config.max_malformed())
        }
        Command::Summary { now } => {
            let now = resolve_now(now.as_deref(), &clock)?;
            reporting::summary(&repo, now)
        }
    };

    let result_label = if result.is_ok() { "ok" } else { "err" };
    metrics::counter!("ticklog.cli.commands_total", "command" => name, "result" => result_label)
        .increment(1);

    let report = result?;
    Ok(serde_json::json!({
        "status": "ok",
        "command": name,
        "result": report,
    }))
}

fn resolve_now(raw: Option<&str>, clock: &dyn Clock) -> Result<NaiveDateTime, String> {
    match raw {
        Some(raw) => parse_timestamp(raw),
        None => Ok(clock.now()),
    }
}

/// Strict validation failures exit with 2, everything else with 1.
pub fn exit_code_for(err: &str) -> i32 {
    if err.to_lowercase().contains("strict validation failed") {
        2
    } else {
        1
    }
}
