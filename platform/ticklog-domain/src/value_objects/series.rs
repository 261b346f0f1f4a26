use crate::value_objects::snapshot::Snapshot;
use chrono::{Duration, NaiveDateTime};
use std::path::PathBuf;

/// Ticks for one signal in on-disk (append) order. Never re-sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub entity_id: String,
    pub ticks: Vec<Snapshot>,
    pub created_at: Option<NaiveDateTime>,
    pub source_path: PathBuf,
}

impl Series {
    pub fn new(entity_id: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            entity_id: entity_id.into(),
            ticks: Vec::new(),
            created_at: None,
            source_path: source_path.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.ticks.last()
    }

    /// Keeps only the last `max_count` ticks by insertion order.
    pub fn tail(mut self, max_count: usize) -> Self {
        if self.ticks.len() > max_count {
            let excess = self.ticks.len() - max_count;
            self.ticks.drain(..excess);
        }
        self
    }

    /// Keeps ticks with `from <= timestamp <= to`.
    pub fn window(mut self, from: NaiveDateTime, to: NaiveDateTime) -> Self {
        self.ticks
            .retain(|tick| tick.timestamp >= from && tick.timestamp <= to);
        self
    }

    /// Splits ticks into those no older than `max_age` relative to `now` (kept, original
    /// order) and the number of older ones.
    pub fn split_by_age(&self, now: NaiveDateTime, max_age: Duration) -> (Vec<Snapshot>, usize) {
        let mut kept = Vec::with_capacity(self.ticks.len());
        let mut dropped = 0usize;
        for tick in &self.ticks {
            if now.signed_duration_since(tick.timestamp) <= max_age {
                kept.push(tick.clone());
            } else {
                dropped += 1;
            }
        }
        (kept, dropped)
    }
}

/// Signal ids double as file-name stems, so they may not name a path.
pub fn validate_entity_id(entity_id: &str) -> Result<(), String> {
    let trimmed = entity_id.trim();
    if trimmed.is_empty() {
        return Err("signal id must not be empty".to_string());
    }
    if trimmed != entity_id {
        return Err(format!("signal id has surrounding whitespace: '{entity_id}'"));
    }
    if entity_id.starts_with('.') || entity_id.contains(['/', '\\', '\0']) {
        return Err(format!("signal id is not a plain file name: '{entity_id}'"));
    }
    Ok(())
}
