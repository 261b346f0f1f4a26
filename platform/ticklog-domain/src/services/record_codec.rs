//! Line codec for the per-signal tick log.
//!
//! The writer only ever produces the canonical five-field layout. The reader also
//! accepts the layouts older encoders left behind, where a locale-formatted decimal
//! comma split one number into two fields. The field count selects the layout.

use crate::value_objects::snapshot::Snapshot;
use chrono::NaiveDateTime;

pub const COMMENT_MARKER: char = '#';
pub const CREATED_MARKER: &str = "Created:";
pub const FORMAT_MARKER: &str = "# ticklog v1: date,time,equity,floating_profit,profit";
pub const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M:%S";
pub const CREATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATE_FORMAT: &str = "%d.%m.%Y";
const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    FieldCount(usize),
    Timestamp(String),
    Number { field: &'static str, raw: String },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::FieldCount(count) => write!(f, "unsupported field count: {count}"),
            DecodeError::Timestamp(raw) => write!(f, "invalid timestamp: {raw}"),
            DecodeError::Number { field, raw } => write!(f, "invalid {field}: '{raw}'"),
        }
    }
}

/// Where each value lives in a record, keyed by field count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLayout {
    /// `date,time,equity,floating`
    Legacy,
    /// `date,time,equity,floating,profit`
    Canonical,
    /// `date,time,eq_int,eq_frac,fl_int,fl_frac`
    SplitDecimals,
    /// `date,time,eq_int,eq_frac,fl_int,fl_frac,profit`
    SplitDecimalsWholeProfit,
    /// `date,time,eq_int,eq_frac,fl_int,fl_frac,pr_int,pr_frac[,...]`
    SplitDecimalsSplitProfit,
}

#[derive(Debug, Clone, Copy)]
enum ValueSource {
    Whole(usize),
    Split(usize),
    Zero,
}

impl RecordLayout {
    pub fn for_field_count(count: usize) -> Option<Self> {
        match count {
            4 => Some(RecordLayout::Legacy),
            5 => Some(RecordLayout::Canonical),
            6 => Some(RecordLayout::SplitDecimals),
            7 => Some(RecordLayout::SplitDecimalsWholeProfit),
            n if n >= 8 => Some(RecordLayout::SplitDecimalsSplitProfit),
            _ => None,
        }
    }

    /// Sources for equity, floating profit and profit, in that order.
    fn sources(self) -> [ValueSource; 3] {
        use ValueSource::{Split, Whole, Zero};
        match self {
            RecordLayout::Legacy => [Whole(2), Whole(3), Zero],
            RecordLayout::Canonical => [Whole(2), Whole(3), Whole(4)],
            RecordLayout::SplitDecimals => [Split(2), Split(4), Zero],
            RecordLayout::SplitDecimalsWholeProfit => [Split(2), Split(4), Whole(6)],
            RecordLayout::SplitDecimalsSplitProfit => [Split(2), Split(4), Split(6)],
        }
    }
}

pub fn encode(snapshot: &Snapshot) -> String {
    format!(
        "{},{},{:.2},{:.2},{:.2}",
        snapshot.timestamp.format(DATE_FORMAT),
        snapshot.timestamp.format(TIME_FORMAT),
        snapshot.equity,
        snapshot.floating_profit,
        snapshot.profit
    )
}

/// The snapshot as it reads back after `encode`: values rounded to the stored cents.
pub fn stored_form(snapshot: &Snapshot) -> Snapshot {
    decode(&encode(snapshot)).unwrap_or_else(|_| snapshot.clone())
}

/// Decodes one trimmed, non-empty, non-comment line.
pub fn decode(line: &str) -> Result<Snapshot, DecodeError> {
    let fields: Vec<&str> = line.split(',').collect();
    let layout =
        RecordLayout::for_field_count(fields.len()).ok_or(DecodeError::FieldCount(fields.len()))?;

    let timestamp = parse_timestamp(fields[0], fields[1])?;
    let [equity, floating, profit] = layout.sources();

    Ok(Snapshot {
        timestamp,
        equity: read_value(&fields, equity, "equity")?,
        floating_profit: read_value(&fields, floating, "floating_profit")?,
        profit: read_value(&fields, profit, "profit")?,
    })
}

fn read_value(fields: &[&str], source: ValueSource, name: &'static str) -> Result<f64, DecodeError> {
    match source {
        ValueSource::Zero => Ok(0.0),
        ValueSource::Whole(idx) => parse_number(fields[idx], name),
        ValueSource::Split(idx) => {
            let joined = format!("{}.{}", fields[idx].trim(), fields[idx + 1].trim());
            parse_number(&joined, name)
        }
    }
}

fn parse_timestamp(date: &str, time: &str) -> Result<NaiveDateTime, DecodeError> {
    let raw = format!("{} {}", date.trim(), time.trim());
    NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(|_| DecodeError::Timestamp(raw))
}

/// Whitespace is dropped and a remaining decimal comma becomes a point.
pub fn parse_number(raw: &str, field: &'static str) -> Result<f64, DecodeError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    let invalid = || DecodeError::Number {
        field,
        raw: raw.to_string(),
    };
    if cleaned.is_empty() {
        return Err(invalid());
    }
    let value: f64 = cleaned.parse().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(invalid());
    }
    Ok(value)
}

pub fn is_comment(line: &str) -> bool {
    line.starts_with(COMMENT_MARKER)
}

/// Reads the creation time from a `# Created: yyyy-MM-dd HH:mm:ss` header line.
pub fn parse_created_marker(line: &str) -> Option<NaiveDateTime> {
    if !is_comment(line) {
        return None;
    }
    let (_, rest) = line.split_once(CREATED_MARKER)?;
    NaiveDateTime::parse_from_str(rest.trim(), CREATED_FORMAT).ok()
}

pub fn encode_header(entity_id: &str, created_at: NaiveDateTime) -> [String; 3] {
    [
        FORMAT_MARKER.to_string(),
        format!("# Signal: {entity_id}"),
        format!("# {CREATED_MARKER} {}", created_at.format(CREATED_FORMAT)),
    ]
}
