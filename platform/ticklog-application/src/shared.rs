use chrono::NaiveDateTime;
use ticklog_domain::services::record_codec::{CREATED_FORMAT, TIMESTAMP_FORMAT};
use ticklog_domain::value_objects::series::validate_entity_id;
use ticklog_domain::value_objects::snapshot::Snapshot;

/// Accepts both the log's own `dd.MM.yyyy HH:mm:ss` and ISO `yyyy-MM-dd HH:mm:ss`.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, String> {
    let trimmed = raw.trim();
    NaiveDateTime::parse_from_str(trimmed, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, CREATED_FORMAT))
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| format!("invalid timestamp '{raw}' (expected dd.MM.yyyy HH:mm:ss)"))
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(CREATED_FORMAT).to_string()
}

pub fn checked_entity_id(entity_id: &str) -> Result<&str, String> {
    validate_entity_id(entity_id)?;
    Ok(entity_id)
}

pub fn snapshot_json(snapshot: &Snapshot) -> serde_json::Value {
    serde_json::json!({
        "timestamp": format_timestamp(snapshot.timestamp),
        "equity": snapshot.equity,
        "floating_profit": snapshot.floating_profit,
        "profit": snapshot.profit,
        "total_value": snapshot.total_value(),
    })
}
