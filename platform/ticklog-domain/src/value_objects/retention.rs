use chrono::Duration;

/// Maximum tick age kept by compaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionWindow {
    pub label: String,
    pub seconds: i64,
}

impl RetentionWindow {
    pub fn parse(value: &str) -> Result<Self, String> {
        let seconds = parse_duration_like_seconds(value)?;
        if seconds <= 0 {
            return Err(format!("retention window must be > 0: {value}"));
        }
        if Duration::try_seconds(seconds).is_none() {
            return Err(format!("retention window out of range: {value}"));
        }
        Ok(Self {
            label: value.trim().to_lowercase(),
            seconds,
        })
    }

    pub fn from_days(days: i64) -> Self {
        Self {
            label: format!("{days}d"),
            seconds: days.saturating_mul(86_400),
        }
    }

    /// Saturates at `Duration::MAX` for hand-built windows beyond chrono's range.
    pub fn as_duration(&self) -> Duration {
        Duration::try_seconds(self.seconds).unwrap_or(Duration::MAX)
    }
}

pub fn parse_duration_like_seconds(value: &str) -> Result<i64, String> {
    let trimmed = value.trim().to_lowercase();
    if trimmed.is_empty() {
        return Err("empty duration".to_string());
    }
    if let Ok(seconds) = trimmed.parse::<i64>() {
        return Ok(seconds);
    }

    // Longest matching suffix wins: "month" over "h", "secs" over "s".
    const UNITS: [(&str, i64); 13] = [
        ("month", 2_592_000),
        ("week", 604_800),
        ("hour", 3_600),
        ("day", 86_400),
        ("min", 60),
        ("mo", 2_592_000),
        ("s", 1),
        ("m", 60),
        ("h", 3_600),
        ("d", 86_400),
        ("w", 604_800),
        ("sec", 1),
        ("secs", 1),
    ];

    let (number_part, multiplier) = UNITS
        .iter()
        .filter(|(suffix, _)| trimmed.ends_with(suffix))
        .max_by_key(|(suffix, _)| suffix.len())
        .map(|(suffix, multiplier)| (&trimmed[..trimmed.len() - suffix.len()], *multiplier))
        .ok_or_else(|| format!("unsupported duration unit: {value}"))?;

    let number: i64 = number_part
        .trim()
        .parse()
        .map_err(|_| format!("invalid duration: {value}"))?;
    number
        .checked_mul(multiplier)
        .ok_or_else(|| format!("duration overflows: {value}"))
}
