use crate::value_objects::snapshot::Snapshot;

/// Unchanged snapshots closer than this to the last stored one are not written.
pub const DUPLICATE_WINDOW_SECONDS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendDecision {
    Write,
    Suppress,
}

/// A changed value is always written; an unchanged one only once the window has
/// elapsed. Equality is exact, with no tolerance band. A timestamp earlier than the
/// last record counts as inside the window.
pub fn duplicate_decision(last: Option<&Snapshot>, candidate: &Snapshot) -> AppendDecision {
    let Some(last) = last else {
        return AppendDecision::Write;
    };
    if !candidate.same_values(last) {
        return AppendDecision::Write;
    }
    let elapsed = candidate
        .timestamp
        .signed_duration_since(last.timestamp)
        .num_seconds();
    if elapsed < DUPLICATE_WINDOW_SECONDS {
        AppendDecision::Suppress
    } else {
        AppendDecision::Write
    }
}
