//! Percentage profit since the start of the current week and month.
//!
//! Pure over `(ticks, now)`. The reference equity for a boundary comes from one of
//! three mutually exclusive strategies, recorded in the outcome for diagnostics.

use crate::value_objects::period::PeriodReference;
use crate::value_objects::series::Series;
use crate::value_objects::snapshot::Snapshot;
use chrono::NaiveDateTime;
use serde::Serialize;

pub const MIN_TICKS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceStrategy {
    /// Ticks span the boundary: first tick at or after it.
    AtOrAfterBoundary,
    /// Every tick precedes the boundary: the last one before it.
    LastBeforeBoundary,
    /// No tick precedes the boundary: the first tick of the series.
    FirstAvailable,
}

impl ReferenceStrategy {
    pub fn label(self) -> &'static str {
        match self {
            ReferenceStrategy::AtOrAfterBoundary => "at-or-after boundary",
            ReferenceStrategy::LastBeforeBoundary => "last-before boundary",
            ReferenceStrategy::FirstAvailable => "fallback: first available",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferencePoint {
    pub equity: f64,
    pub timestamp: NaiveDateTime,
    pub strategy: ReferenceStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquitySearchOutcome {
    pub point: Option<ReferencePoint>,
    pub diagnostic: String,
}

pub fn find_reference_equity(ticks: &[Snapshot], boundary: NaiveDateTime) -> EquitySearchOutcome {
    let Some(first) = ticks.first() else {
        return EquitySearchOutcome {
            point: None,
            diagnostic: "no data".to_string(),
        };
    };

    let has_before = ticks.iter().any(|tick| tick.timestamp < boundary);
    let first_at_or_after = ticks.iter().find(|tick| tick.timestamp >= boundary);

    let (tick, strategy) = match (first_at_or_after, has_before) {
        (Some(tick), true) => (tick, ReferenceStrategy::AtOrAfterBoundary),
        (Some(_), false) => (first, ReferenceStrategy::FirstAvailable),
        (None, _) => {
            let last_before = ticks
                .iter()
                .rev()
                .find(|tick| tick.timestamp < boundary)
                .unwrap_or(first);
            (last_before, ReferenceStrategy::LastBeforeBoundary)
        }
    };

    let point = ReferencePoint {
        equity: tick.equity,
        timestamp: tick.timestamp,
        strategy,
    };
    EquitySearchOutcome {
        diagnostic: format!(
            "{} @ {} (equity {:.2})",
            strategy.label(),
            point.timestamp.format("%Y-%m-%d %H:%M:%S"),
            point.equity
        ),
        point: Some(point),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodProfit {
    pub percent: f64,
    pub has_data: bool,
    pub reference: Option<ReferencePoint>,
}

impl PeriodProfit {
    pub fn no_data(reference: Option<ReferencePoint>) -> Self {
        Self {
            percent: 0.0,
            has_data: false,
            reference,
        }
    }

    /// `"+X.XX%"`, `"-X.XX%"` or `"N/A"`.
    pub fn formatted(&self) -> String {
        if !self.has_data {
            return "N/A".to_string();
        }
        if self.percent < 0.0 {
            format!("-{:.2}%", self.percent.abs())
        } else {
            format!("+{:.2}%", self.percent)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodProfitReport {
    pub reference: PeriodReference,
    pub current_equity: Option<f64>,
    pub week: PeriodProfit,
    pub month: PeriodProfit,
    pub diagnostic: String,
}

pub fn profit_percent(current_equity: f64, reference_equity: f64) -> Option<f64> {
    if reference_equity == 0.0 {
        return None;
    }
    let percent = (current_equity - reference_equity) / reference_equity * 100.0;
    percent.is_finite().then_some(percent)
}

pub fn period_profit(series: &Series, now: NaiveDateTime) -> PeriodProfitReport {
    period_profit_from_ticks(&series.ticks, now)
}

pub fn period_profit_from_ticks(ticks: &[Snapshot], now: NaiveDateTime) -> PeriodProfitReport {
    let reference = PeriodReference::from_now(now);

    let current = match ticks.last() {
        Some(last) if ticks.len() >= MIN_TICKS => last.equity,
        _ => {
            return PeriodProfitReport {
                reference,
                current_equity: None,
                week: PeriodProfit::no_data(None),
                month: PeriodProfit::no_data(None),
                diagnostic: format!(
                    "insufficient data ({} tick(s), need {MIN_TICKS})",
                    ticks.len()
                ),
            };
        }
    };

    let (week, week_note) = profit_since(ticks, reference.week_start, current);
    let (month, month_note) = profit_since(ticks, reference.month_start, current);

    PeriodProfitReport {
        reference,
        current_equity: Some(current),
        week,
        month,
        diagnostic: format!("week: {week_note}; month: {month_note}"),
    }
}

fn profit_since(ticks: &[Snapshot], boundary: NaiveDateTime, current: f64) -> (PeriodProfit, String) {
    let outcome = find_reference_equity(ticks, boundary);
    let Some(point) = outcome.point else {
        return (PeriodProfit::no_data(None), outcome.diagnostic);
    };
    match profit_percent(current, point.equity) {
        Some(percent) => (
            PeriodProfit {
                percent,
                has_data: true,
                reference: Some(point),
            },
            outcome.diagnostic,
        ),
        None => (
            PeriodProfit::no_data(Some(point)),
            format!("{} -> zero reference equity", outcome.diagnostic),
        ),
    }
}
