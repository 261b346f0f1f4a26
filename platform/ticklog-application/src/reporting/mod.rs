use crate::shared::{checked_entity_id, format_timestamp, snapshot_json};
use chrono::NaiveDateTime;
use std::path::Path;
use std::time::Instant;
use ticklog_domain::repositories::export::SeriesExporter;
use ticklog_domain::repositories::series::SeriesRepository;
use ticklog_domain::services::period_profit::{
    period_profit, PeriodProfit, PeriodProfitReport, ReferencePoint,
};
use tracing::info_span;

/// Latest recorded snapshot, found without loading the full series.
pub fn latest_status(
    repo: &dyn SeriesRepository,
    entity_id: &str,
) -> Result<serde_json::Value, String> {
    let _span = info_span!("status", signal = %entity_id).entered();
    let entity_id = checked_entity_id(entity_id)?;

    let latest = repo.read_last_record(entity_id)?;
    metrics::counter!(
        "ticklog.app.status_total",
        "found" => if latest.is_some() { "yes" } else { "no" }
    )
    .increment(1);

    Ok(serde_json::json!({
        "signal": entity_id,
        "latest": latest.as_ref().map(snapshot_json),
    }))
}

/// Week and month profit for one signal at `now`. A missing log reports `N/A`.
pub fn period_profit_report(
    repo: &dyn SeriesRepository,
    entity_id: &str,
    now: NaiveDateTime,
) -> Result<serde_json::Value, String> {
    let _span = info_span!("profit", signal = %entity_id, now = %now).entered();
    let entity_id = checked_entity_id(entity_id)?;

    let start = Instant::now();
    let Some(series) = repo.load_full(entity_id)? else {
        tracing::info!("no tick log; reporting N/A");
        return Ok(serde_json::json!({
            "signal": entity_id,
            "found": false,
            "ticks": 0,
            "week": "N/A",
            "month": "N/A",
        }));
    };
    let report = period_profit(&series, now);
    metrics::histogram!("ticklog.app.profit_ms").record(start.elapsed().as_millis() as f64);
    tracing::debug!(diagnostic = %report.diagnostic, "period profit computed");

    let mut value = profit_report_json(&report);
    if let Some(object) = value.as_object_mut() {
        object.insert("signal".to_string(), entity_id.into());
        object.insert("found".to_string(), true.into());
        object.insert("ticks".to_string(), series.len().into());
    }
    Ok(value)
}

/// Status and period profit for every signal in storage.
pub fn summary(repo: &dyn SeriesRepository, now: NaiveDateTime) -> Result<serde_json::Value, String> {
    let _span = info_span!("summary", now = %now).entered();

    let ids = repo.list_entities()?;
    let mut signals = Vec::with_capacity(ids.len());
    for id in &ids {
        let series = match repo.load_full(id) {
            Ok(Some(series)) => series,
            Ok(None) => {
                signals.push(serde_json::json!({ "signal": id, "found": false }));
                continue;
            }
            Err(err) => {
                tracing::warn!(signal = %id, error = %err, "skipping unreadable tick log");
                signals.push(serde_json::json!({ "signal": id, "error": err }));
                continue;
            }
        };
        let report = period_profit(&series, now);
        signals.push(serde_json::json!({
            "signal": id,
            "found": true,
            "ticks": series.len(),
            "latest": series.last().map(snapshot_json),
            "week": report.week.formatted(),
            "month": report.month.formatted(),
        }));
    }
    metrics::gauge!("ticklog.app.summary.signals").set(ids.len() as f64);

    Ok(serde_json::json!({
        "now": format_timestamp(now),
        "count": ids.len(),
        "signals": signals,
    }))
}

/// Writes the signal's ticks (optionally only the last `tail`) as a CSV table.
pub fn export_series(
    repo: &dyn SeriesRepository,
    exporter: &dyn SeriesExporter,
    entity_id: &str,
    out: &Path,
    tail: Option<usize>,
) -> Result<serde_json::Value, String> {
    let _span = info_span!("export", signal = %entity_id, out = %out.display()).entered();
    let entity_id = checked_entity_id(entity_id)?;

    let series = match tail {
        Some(max_count) => repo.load_tail(entity_id, max_count)?,
        None => repo.load_full(entity_id)?,
    }
    .ok_or_else(|| format!("no tick log for signal '{entity_id}'"))?;

    let rows = exporter.write_series_csv(out, &series)?;
    metrics::counter!("ticklog.app.export_rows_total").increment(rows as u64);
    tracing::info!(rows, "series exported");

    Ok(serde_json::json!({
        "signal": entity_id,
        "out": out.display().to_string(),
        "rows": rows,
    }))
}

pub fn profit_report_json(report: &PeriodProfitReport) -> serde_json::Value {
    serde_json::json!({
        "week_start": format_timestamp(report.reference.week_start),
        "month_start": format_timestamp(report.reference.month_start),
        "current_equity": report.current_equity,
        "week": period_json(&report.week),
        "month": period_json(&report.month),
        "diagnostic": report.diagnostic,
    })
}

fn period_json(profit: &PeriodProfit) -> serde_json::Value {
    serde_json::json!({
        "formatted": profit.formatted(),
        "percent": if profit.has_data { Some(profit.percent) } else { None },
        "has_data": profit.has_data,
        "reference": profit.reference.as_ref().map(reference_json),
    })
}

fn reference_json(point: &ReferencePoint) -> serde_json::Value {
    serde_json::json!({
        "equity": point.equity,
        "timestamp": format_timestamp(point.timestamp),
        "strategy": point.strategy.label(),
    })
}
