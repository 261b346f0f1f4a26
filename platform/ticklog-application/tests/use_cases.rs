use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use ticklog_application::maintenance::{compact, CompactTarget};
use ticklog_application::recording::record_snapshot;
use ticklog_application::reporting::{
    export_series, latest_status, period_profit_report, summary,
};
use ticklog_application::validation::validate;
use ticklog_domain::repositories::export::SeriesExporter;
use ticklog_domain::repositories::series::{AppendOutcome, SeriesRepository};
use ticklog_domain::services::series_quality::{timeline_stats, LoadReport};
use ticklog_domain::services::suppression::{duplicate_decision, AppendDecision};
use ticklog_domain::value_objects::retention::RetentionWindow;
use ticklog_domain::value_objects::series::Series;
use ticklog_domain::value_objects::snapshot::Snapshot;

fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 5, day)
        .and_then(|d| d.and_hms_opt(h, m, 0))
        .expect("valid timestamp")
}

fn snap(ts: NaiveDateTime, equity: f64) -> Snapshot {
    Snapshot::new(ts, equity, 0.0, 0.0)
}

#[derive(Default)]
struct InMemorySeriesRepo {
    logs: RefCell<BTreeMap<String, Vec<Snapshot>>>,
    malformed: RefCell<BTreeMap<String, usize>>,
    compact_calls: RefCell<Vec<(String, Duration, NaiveDateTime)>>,
    unreadable: RefCell<BTreeSet<String>>,
}

impl InMemorySeriesRepo {
    fn with_ticks(entity_id: &str, ticks: Vec<Snapshot>) -> Self {
        let repo = Self::default();
        repo.logs.borrow_mut().insert(entity_id.to_string(), ticks);
        repo
    }
}

impl SeriesRepository for InMemorySeriesRepo {
    fn load_with_report(&self, entity_id: &str) -> Result<Option<(Series, LoadReport)>, String> {
        if self.unreadable.borrow().contains(entity_id) {
            return Err(format!("failed to read tick log mem/{entity_id}: permission denied"));
        }
        let logs = self.logs.borrow();
        let Some(ticks) = logs.get(entity_id) else {
            return Ok(None);
        };
        let mut series = Series::new(entity_id, format!("mem/{entity_id}"));
        series.ticks = ticks.clone();
        let malformed = self.malformed.borrow().get(entity_id).copied().unwrap_or(0);
        let mut report = LoadReport {
            data_lines: ticks.len() + malformed,
            ..LoadReport::default()
        };
        for line in 0..malformed {
            report.record_malformed(line + 1);
        }
        timeline_stats(&series.ticks, &mut report);
        Ok(Some((series, report)))
    }

    fn read_last_record(&self, entity_id: &str) -> Result<Option<Snapshot>, String> {
        Ok(self
            .logs
            .borrow()
            .get(entity_id)
            .and_then(|ticks| ticks.last().cloned()))
    }

    fn append(&self, entity_id: &str, snapshot: &Snapshot) -> Result<AppendOutcome, String> {
        if let Err(reason) = snapshot.validate() {
            return Ok(AppendOutcome::Rejected { reason });
        }
        let mut logs = self.logs.borrow_mut();
        let ticks = logs.entry(entity_id.to_string()).or_default();
        if duplicate_decision(ticks.last(), snapshot) == AppendDecision::Suppress {
            return Ok(AppendOutcome::Suppressed);
        }
        ticks.push(snapshot.clone());
        Ok(AppendOutcome::Applied)
    }

    fn compact(
        &self,
        entity_id: &str,
        max_age: Duration,
        now: NaiveDateTime,
    ) -> Result<usize, String> {
        self.compact_calls
            .borrow_mut()
            .push((entity_id.to_string(), max_age, now));
        if self.unreadable.borrow().contains(entity_id) {
            return Err(format!("failed to read tick log mem/{entity_id}: permission denied"));
        }
        let mut logs = self.logs.borrow_mut();
        let Some(ticks) = logs.get_mut(entity_id) else {
            return Ok(0);
        };
        let before = ticks.len();
        ticks.retain(|tick| now.signed_duration_since(tick.timestamp) <= max_age);
        Ok(before - ticks.len())
    }

    fn list_entities(&self) -> Result<Vec<String>, String> {
        Ok(self.logs.borrow().keys().cloned().collect())
    }
}

#[derive(Default)]
struct RecordingExporter {
    written: RefCell<Vec<(PathBuf, usize)>>,
}

impl SeriesExporter for RecordingExporter {
    fn write_series_csv(&self, path: &Path, series: &Series) -> Result<usize, String> {
        self.written
            .borrow_mut()
            .push((path.to_path_buf(), series.len()));
        Ok(series.len())
    }
}

#[test]
fn record_reports_applied_suppressed_and_rejected() {
    let repo = InMemorySeriesRepo::default();

    let applied = record_snapshot(&repo, "alpha", &snap(at(20, 10, 0), 100.0)).expect("record");
    assert_eq!(applied["outcome"], "applied");
    assert_eq!(applied["snapshot"]["timestamp"], "2025-05-20 10:00:00");

    let suppressed =
        record_snapshot(&repo, "alpha", &snap(at(20, 10, 0), 100.0)).expect("record");
    assert_eq!(suppressed["outcome"], "suppressed");

    let rejected = record_snapshot(
        &repo,
        "alpha",
        &Snapshot::new(at(20, 10, 5), f64::INFINITY, 0.0, 0.0),
    )
    .expect("record");
    assert_eq!(rejected["outcome"], "rejected");
    assert!(rejected["reason"].as_str().unwrap_or("").contains("equity"));

    assert_eq!(repo.logs.borrow()["alpha"].len(), 1);
}

#[test]
fn record_refuses_path_like_ids() {
    let repo = InMemorySeriesRepo::default();
    assert!(record_snapshot(&repo, "../x", &snap(at(20, 10, 0), 1.0)).is_err());
    assert!(repo.logs.borrow().is_empty());
}

#[test]
fn status_shows_latest_with_total_value() {
    let repo = InMemorySeriesRepo::with_ticks(
        "alpha",
        vec![
            snap(at(19, 9, 0), 90.0),
            Snapshot::new(at(20, 9, 0), 100.0, -5.0, 2.0),
        ],
    );
    let status = latest_status(&repo, "alpha").expect("status");
    assert_eq!(status["latest"]["equity"], 100.0);
    assert_eq!(status["latest"]["total_value"], 95.0);

    let missing = latest_status(&repo, "beta").expect("status");
    assert!(missing["latest"].is_null());
}

#[test]
fn profit_report_formats_week_and_month() {
    // 2025-05-21 is a Wednesday; the week starts on Sunday 2025-05-18.
    let repo = InMemorySeriesRepo::with_ticks(
        "alpha",
        vec![
            snap(at(1, 0, 0), 100.0),
            snap(at(17, 12, 0), 105.0),
            snap(at(18, 9, 0), 110.0),
            snap(at(21, 9, 0), 121.0),
        ],
    );
    let report = period_profit_report(&repo, "alpha", at(21, 12, 0)).expect("profit");
    assert_eq!(report["found"], true);
    assert_eq!(report["ticks"], 4);
    assert_eq!(report["week_start"], "2025-05-18 00:00:00");
    assert_eq!(report["month_start"], "2025-05-01 00:00:00");
    assert_eq!(report["week"]["formatted"], "+10.00%");
    assert_eq!(report["week"]["reference"]["strategy"], "at-or-after boundary");
    assert_eq!(report["month"]["formatted"], "+21.00%");
    assert!(report["diagnostic"].as_str().unwrap_or("").starts_with("week:"));
}

#[test]
fn profit_report_for_missing_or_short_series_is_na() {
    let repo = InMemorySeriesRepo::with_ticks("alpha", vec![snap(at(20, 9, 0), 100.0)]);
    let single = period_profit_report(&repo, "alpha", at(21, 12, 0)).expect("profit");
    assert_eq!(single["week"]["formatted"], "N/A");
    assert_eq!(single["month"]["formatted"], "N/A");
    assert!(single["week"]["percent"].is_null());

    let missing = period_profit_report(&repo, "beta", at(21, 12, 0)).expect("profit");
    assert_eq!(missing["found"], false);
    assert_eq!(missing["week"], "N/A");
}

#[test]
fn compact_single_signal_uses_window_and_now() {
    let repo = InMemorySeriesRepo::with_ticks(
        "alpha",
        vec![snap(at(1, 0, 0), 1.0), snap(at(19, 0, 0), 2.0), snap(at(20, 0, 0), 3.0)],
    );
    let window = RetentionWindow::parse("7d").expect("window");
    let report = compact(&repo, CompactTarget::Signal("alpha"), &window, at(20, 12, 0))
        .expect("compact");
    assert_eq!(report["dropped_total"], 1);
    assert_eq!(report["max_age_seconds"], 7 * 86_400);

    let calls = repo.compact_calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, Duration::days(7));
    assert_eq!(calls[0].2, at(20, 12, 0));
}

#[test]
fn compact_all_visits_every_signal() {
    let repo = InMemorySeriesRepo::with_ticks("alpha", vec![snap(at(1, 0, 0), 1.0)]);
    repo.logs
        .borrow_mut()
        .insert("beta".to_string(), vec![snap(at(20, 0, 0), 1.0)]);
    let window = RetentionWindow::from_days(7);
    let report = compact(&repo, CompactTarget::All, &window, at(20, 12, 0)).expect("compact");
    assert_eq!(report["dropped_total"], 1);
    assert_eq!(report["signals"].as_array().map(Vec::len), Some(2));
    assert_eq!(repo.compact_calls.borrow().len(), 2);
    assert_eq!(report["failed"], 0);
}

#[test]
fn compact_all_reports_failures_and_keeps_going() {
    let repo = InMemorySeriesRepo::with_ticks("alpha", vec![snap(at(1, 0, 0), 1.0)]);
    for id in ["beta", "gamma"] {
        repo.logs
            .borrow_mut()
            .insert(id.to_string(), vec![snap(at(1, 0, 0), 1.0)]);
    }
    repo.unreadable.borrow_mut().insert("beta".to_string());
    let window = RetentionWindow::from_days(7);

    let report = compact(&repo, CompactTarget::All, &window, at(20, 12, 0)).expect("compact");
    assert_eq!(report["failed"], 1);
    assert_eq!(report["dropped_total"], 2);
    let signals = report["signals"].as_array().expect("signals");
    assert_eq!(signals[0]["dropped"], 1);
    assert!(signals[1]["error"]
        .as_str()
        .unwrap_or("")
        .contains("permission denied"));
    assert_eq!(signals[2]["signal"], "gamma");
    assert_eq!(signals[2]["dropped"], 1);

    let err = compact(&repo, CompactTarget::Signal("beta"), &window, at(20, 12, 0))
        .expect_err("single signal");
    assert!(err.contains("permission denied"));
}

#[test]
fn export_honours_tail() {
    let repo = InMemorySeriesRepo::with_ticks(
        "alpha",
        vec![snap(at(18, 0, 0), 1.0), snap(at(19, 0, 0), 2.0), snap(at(20, 0, 0), 3.0)],
    );
    let exporter = RecordingExporter::default();
    let out = Path::new("out/alpha.csv");
    let report = export_series(&repo, &exporter, "alpha", out, Some(2)).expect("export");
    assert_eq!(report["rows"], 2);
    assert_eq!(exporter.written.borrow()[0], (out.to_path_buf(), 2));

    assert!(export_series(&repo, &exporter, "beta", out, None).is_err());
}

#[test]
fn strict_validation_fails_above_malformed_limit() {
    let repo = InMemorySeriesRepo::with_ticks("alpha", vec![snap(at(20, 0, 0), 1.0)]);
    repo.malformed.borrow_mut().insert("alpha".to_string(), 2);

    let lenient = validate(&repo, "alpha", false, 0).expect("validate");
    assert_eq!(lenient["report"]["malformed"], 2);
    assert_eq!(lenient["report"]["first_malformed_line"], 1);
    assert_eq!(lenient["report"]["decoded"], 1);

    let err = validate(&repo, "alpha", true, 1).expect_err("strict");
    assert!(err.starts_with("strict validation failed"));
    assert!(validate(&repo, "alpha", true, 2).is_ok());
}

#[test]
fn summary_lists_every_signal() {
    let repo = InMemorySeriesRepo::with_ticks(
        "alpha",
        vec![
            snap(at(17, 0, 0), 90.0),
            snap(at(18, 1, 0), 100.0),
            snap(at(20, 0, 0), 110.0),
        ],
    );
    repo.logs
        .borrow_mut()
        .insert("beta".to_string(), vec![snap(at(20, 0, 0), 50.0)]);

    let report = summary(&repo, at(21, 12, 0)).expect("summary");
    assert_eq!(report["count"], 2);
    let signals = report["signals"].as_array().expect("signals");
    assert_eq!(signals[0]["signal"], "alpha");
    assert_eq!(signals[0]["week"], "+10.00%");
    assert_eq!(signals[1]["signal"], "beta");
    assert_eq!(signals[1]["week"], "N/A");
}

#[test]
fn summary_reports_unreadable_logs_and_continues() {
    let repo = InMemorySeriesRepo::with_ticks("alpha", vec![snap(at(20, 0, 0), 100.0)]);
    repo.logs
        .borrow_mut()
        .insert("beta".to_string(), vec![snap(at(20, 0, 0), 50.0)]);
    repo.unreadable.borrow_mut().insert("alpha".to_string());

    let report = summary(&repo, at(21, 12, 0)).expect("summary");
    assert_eq!(report["count"], 2);
    let signals = report["signals"].as_array().expect("signals");
    assert!(signals[0]["error"]
        .as_str()
        .unwrap_or("")
        .contains("permission denied"));
    assert_eq!(signals[1]["signal"], "beta");
    assert_eq!(signals[1]["found"], true);
}
