use crate::value_objects::snapshot::Snapshot;
use chrono::NaiveDateTime;

/// Line-level statistics collected while loading a tick log.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LoadReport {
    pub data_lines: usize,
    pub comment_lines: usize,
    pub blank_lines: usize,
    pub malformed: usize,
    pub first_malformed_line: Option<usize>,
    pub out_of_order: usize,
    pub first_out_of_order: Option<NaiveDateTime>,
    pub first_timestamp: Option<NaiveDateTime>,
    pub last_timestamp: Option<NaiveDateTime>,
}

impl LoadReport {
    pub fn record_malformed(&mut self, line_number: usize) {
        self.malformed += 1;
        if self.first_malformed_line.is_none() {
            self.first_malformed_line = Some(line_number);
        }
    }

    pub fn decoded(&self) -> usize {
        self.data_lines.saturating_sub(self.malformed)
    }
}

/// Fills the timeline fields of `report` from ticks in stored order.
pub fn timeline_stats(ticks: &[Snapshot], report: &mut LoadReport) {
    report.out_of_order = 0;
    report.first_out_of_order = None;
    report.first_timestamp = ticks.first().map(|t| t.timestamp);
    report.last_timestamp = ticks.last().map(|t| t.timestamp);

    for pair in ticks.windows(2) {
        if pair[1].timestamp < pair[0].timestamp {
            report.out_of_order += 1;
            if report.first_out_of_order.is_none() {
                report.first_out_of_order = Some(pair[1].timestamp);
            }
        }
    }
}
