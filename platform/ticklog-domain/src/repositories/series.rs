use crate::services::series_quality::LoadReport;
use crate::value_objects::series::Series;
use crate::value_objects::snapshot::Snapshot;
use chrono::{Duration, NaiveDateTime};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    Applied,
    /// Unchanged values inside the duplicate window; the log was not touched.
    Suppressed,
    /// Invalid input; the log was not touched.
    Rejected { reason: String },
}

impl AppendOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            AppendOutcome::Applied => "applied",
            AppendOutcome::Suppressed => "suppressed",
            AppendOutcome::Rejected { .. } => "rejected",
        }
    }
}

/// Per-signal tick log storage. `Ok(None)` means the log does not exist;
/// `Err` is reserved for storage failures.
pub trait SeriesRepository {
    fn load_with_report(&self, entity_id: &str) -> Result<Option<(Series, LoadReport)>, String>;

    fn read_last_record(&self, entity_id: &str) -> Result<Option<Snapshot>, String>;

    fn append(&self, entity_id: &str, snapshot: &Snapshot) -> Result<AppendOutcome, String>;

    /// Drops ticks older than `max_age` relative to `now`; returns how many were dropped.
    fn compact(&self, entity_id: &str, max_age: Duration, now: NaiveDateTime)
        -> Result<usize, String>;

    fn list_entities(&self) -> Result<Vec<String>, String>;

    fn load_full(&self, entity_id: &str) -> Result<Option<Series>, String> {
        Ok(self.load_with_report(entity_id)?.map(|(series, _)| series))
    }

    fn load_tail(&self, entity_id: &str, max_count: usize) -> Result<Option<Series>, String> {
        Ok(self
            .load_full(entity_id)?
            .map(|series| series.tail(max_count)))
    }

    fn load_window(
        &self,
        entity_id: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Option<Series>, String> {
        Ok(self
            .load_full(entity_id)?
            .map(|series| series.window(from, to)))
    }
}
