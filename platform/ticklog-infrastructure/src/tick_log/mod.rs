//! Filesystem tick logs: one append-only text file per signal under a data directory.

pub mod loader;
pub mod writer;

use crate::clock::SystemClock;
use chrono::{Duration, NaiveDateTime};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use ticklog_domain::repositories::clock::Clock;
use ticklog_domain::repositories::series::{AppendOutcome, SeriesRepository};
use ticklog_domain::services::series_quality::LoadReport;
use ticklog_domain::value_objects::series::{validate_entity_id, Series};
use ticklog_domain::value_objects::snapshot::Snapshot;

pub const DEFAULT_EXTENSION: &str = "csv";

#[derive(Debug, Clone)]
pub struct FilesystemSeriesRepository<C: Clock = SystemClock> {
    data_dir: PathBuf,
    extension: String,
    clock: C,
}

impl FilesystemSeriesRepository<SystemClock> {
    pub fn new(data_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self::with_clock(data_dir, extension, SystemClock)
    }
}

impl<C: Clock> FilesystemSeriesRepository<C> {
    pub fn with_clock(data_dir: impl Into<PathBuf>, extension: impl Into<String>, clock: C) -> Self {
        let extension = extension.into();
        let extension = extension.trim_start_matches('.').to_string();
        Self {
            data_dir: data_dir.into(),
            extension: if extension.is_empty() {
                DEFAULT_EXTENSION.to_string()
            } else {
                extension
            },
            clock,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path_for(&self, entity_id: &str) -> Result<PathBuf, String> {
        validate_entity_id(entity_id)?;
        Ok(self
            .data_dir
            .join(format!("{entity_id}.{}", self.extension)))
    }
}

fn record_call_metrics<T>(op: &'static str, start: Instant, result: &Result<T, String>) {
    let result_label = if result.is_ok() { "ok" } else { "err" };
    metrics::counter!(
        "ticklog.infra.series.calls_total",
        "op" => op,
        "result" => result_label
    )
    .increment(1);
    metrics::histogram!("ticklog.infra.series.op_ms", "op" => op, "result" => result_label)
        .record(start.elapsed().as_millis() as f64);
}

impl<C: Clock> SeriesRepository for FilesystemSeriesRepository<C> {
    fn load_with_report(&self, entity_id: &str) -> Result<Option<(Series, LoadReport)>, String> {
        let start = Instant::now();
        let result = self
            .path_for(entity_id)
            .and_then(|path| loader::load_with_report(&path, entity_id));
        record_call_metrics("load", start, &result);
        result
    }

    fn read_last_record(&self, entity_id: &str) -> Result<Option<Snapshot>, String> {
        let start = Instant::now();
        let result = self
            .path_for(entity_id)
            .and_then(|path| loader::read_last_record(&path, entity_id));
        record_call_metrics("read_last", start, &result);
        result
    }

    fn append(&self, entity_id: &str, snapshot: &Snapshot) -> Result<AppendOutcome, String> {
        let start = Instant::now();
        let result = self
            .path_for(entity_id)
            .and_then(|path| writer::append(&path, entity_id, snapshot, &self.clock));
        record_call_metrics("append", start, &result);
        if let Ok(outcome) = &result {
            metrics::counter!("ticklog.infra.series.append_total", "outcome" => outcome.label())
                .increment(1);
        }
        result
    }

    fn compact(
        &self,
        entity_id: &str,
        max_age: Duration,
        now: NaiveDateTime,
    ) -> Result<usize, String> {
        let start = Instant::now();
        let result = self
            .path_for(entity_id)
            .and_then(|path| writer::compact(&path, entity_id, max_age, now, &self.clock));
        record_call_metrics("compact", start, &result);
        if let Ok(dropped) = &result {
            metrics::counter!("ticklog.infra.series.compacted_ticks_total")
                .increment(*dropped as u64);
        }
        result
    }

    /// Ids of every log in the data directory, sorted. A missing directory is empty.
    fn list_entities(&self) -> Result<Vec<String>, String> {
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(format!(
                    "failed to list data dir {}: {}",
                    self.data_dir.display(),
                    err
                ))
            }
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| {
                format!("failed to list data dir {}: {}", self.data_dir.display(), err)
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(self.extension.as_str()) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                if validate_entity_id(stem).is_ok() {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}
