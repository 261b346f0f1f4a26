use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use ticklog_application::maintenance::{compact, CompactTarget};
use ticklog_application::recording::record_snapshot;
use ticklog_application::reporting::{export_series, period_profit_report};
use ticklog_domain::repositories::clock::FixedClock;
use ticklog_domain::value_objects::retention::RetentionWindow;
use ticklog_domain::value_objects::snapshot::Snapshot;
use ticklog_infrastructure::reporting::FilesystemSeriesExporter;
use ticklog_infrastructure::tick_log::FilesystemSeriesRepository;

fn unique_tmp_dir(prefix: &str) -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!("ticklog_{prefix}_{}_{}", std::process::id(), now))
}

fn at(month: u32, day: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, month, day)
        .and_then(|d| d.and_hms_opt(h, 0, 0))
        .expect("valid timestamp")
}

#[test]
fn record_profit_compact_export_round() {
    let dir = unique_tmp_dir("flow");
    let repo = FilesystemSeriesRepository::with_clock(dir.join("signals"), "csv", FixedClock(at(3, 1, 0)));

    for (ts, equity) in [
        (at(3, 15, 9), 80.0),
        (at(5, 1, 9), 100.0),
        (at(5, 17, 9), 105.0),
        (at(5, 19, 9), 110.0),
        (at(5, 21, 9), 121.0),
    ] {
        let report = record_snapshot(&repo, "alpha", &Snapshot::new(ts, equity, 0.0, 0.0))
            .expect("record");
        assert_eq!(report["outcome"], "applied");
    }

    let profit = period_profit_report(&repo, "alpha", at(5, 21, 12)).expect("profit");
    assert_eq!(profit["week"]["formatted"], "+10.00%");
    assert_eq!(profit["month"]["formatted"], "+21.00%");

    let window = RetentionWindow::parse("30d").expect("window");
    let compacted =
        compact(&repo, CompactTarget::All, &window, at(5, 21, 12)).expect("compact");
    assert_eq!(compacted["dropped_total"], 1);
    assert!(dir.join("signals").join("alpha.csv.backup").exists());

    let out = dir.join("export").join("alpha.csv");
    let exported = export_series(&repo, &FilesystemSeriesExporter::new(), "alpha", &out, None)
        .expect("export");
    assert_eq!(exported["rows"], 4);
    let text = fs::read_to_string(&out).expect("read export");
    assert_eq!(text.lines().count(), 5);

    let _ = fs::remove_dir_all(&dir);
}
