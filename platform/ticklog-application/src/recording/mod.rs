use crate::shared::{checked_entity_id, snapshot_json};
use std::time::Instant;
use ticklog_domain::repositories::series::{AppendOutcome, SeriesRepository};
use ticklog_domain::value_objects::snapshot::Snapshot;
use tracing::info_span;

/// Persists one producer snapshot. Suppressed and rejected snapshots are reported,
/// not treated as failures.
pub fn record_snapshot(
    repo: &dyn SeriesRepository,
    entity_id: &str,
    snapshot: &Snapshot,
) -> Result<serde_json::Value, String> {
    let _span = info_span!("record", signal = %entity_id, timestamp = %snapshot.timestamp).entered();
    let entity_id = checked_entity_id(entity_id)?;

    let start = Instant::now();
    let outcome = repo.append(entity_id, snapshot)?;
    metrics::counter!("ticklog.app.record_total", "outcome" => outcome.label()).increment(1);
    metrics::histogram!("ticklog.app.record_ms").record(start.elapsed().as_millis() as f64);

    let reason = match &outcome {
        AppendOutcome::Applied => {
            tracing::info!(equity = snapshot.equity, "snapshot recorded");
            None
        }
        AppendOutcome::Suppressed => {
            tracing::warn!("snapshot unchanged within duplicate window; suppressed");
            None
        }
        AppendOutcome::Rejected { reason } => {
            tracing::warn!(reason = %reason, "snapshot rejected");
            Some(reason.clone())
        }
    };

    Ok(serde_json::json!({
        "signal": entity_id,
        "outcome": outcome.label(),
        "reason": reason,
        "snapshot": snapshot_json(snapshot),
    }))
}
