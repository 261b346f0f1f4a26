use crate::shared::{checked_entity_id, format_timestamp};
use chrono::NaiveDateTime;
use std::time::Instant;
use ticklog_domain::repositories::series::SeriesRepository;
use ticklog_domain::value_objects::retention::RetentionWindow;
use tracing::info_span;

pub enum CompactTarget<'a> {
    Signal(&'a str),
    All,
}

/// Drops ticks older than `window` relative to `now` for one signal or for all of them.
pub fn compact(
    repo: &dyn SeriesRepository,
    target: CompactTarget<'_>,
    window: &RetentionWindow,
    now: NaiveDateTime,
) -> Result<serde_json::Value, String> {
    let _span = info_span!("compact", max_age = %window.label, now = %now).entered();

    // A single signal fails the command; a sweep records the failure and moves on.
    let (ids, keep_going) = match target {
        CompactTarget::Signal(id) => (vec![checked_entity_id(id)?.to_string()], false),
        CompactTarget::All => (repo.list_entities()?, true),
    };

    let start = Instant::now();
    let mut results = Vec::with_capacity(ids.len());
    let mut total_dropped = 0usize;
    let mut failed = 0usize;
    for id in &ids {
        let dropped = match repo.compact(id, window.as_duration(), now) {
            Ok(dropped) => dropped,
            Err(err) if keep_going => {
                tracing::error!(signal = %id, error = %err, "compaction failed; continuing");
                metrics::counter!("ticklog.app.compact_failed_total").increment(1);
                failed += 1;
                results.push(serde_json::json!({ "signal": id, "error": err }));
                continue;
            }
            Err(err) => return Err(err),
        };
        if dropped > 0 {
            tracing::warn!(signal = %id, dropped, "ticks older than retention window dropped");
        }
        total_dropped += dropped;
        results.push(serde_json::json!({ "signal": id, "dropped": dropped }));
    }
    metrics::counter!("ticklog.app.compact_dropped_total").increment(total_dropped as u64);
    metrics::histogram!("ticklog.app.compact_ms").record(start.elapsed().as_millis() as f64);

    Ok(serde_json::json!({
        "max_age": window.label,
        "max_age_seconds": window.seconds,
        "now": format_timestamp(now),
        "dropped_total": total_dropped,
        "failed": failed,
        "signals": results,
    }))
}
