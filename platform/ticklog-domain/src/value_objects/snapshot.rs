use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One observed account state for a tracked signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
    pub floating_profit: f64,
    pub profit: f64,
}

impl Snapshot {
    pub fn new(timestamp: NaiveDateTime, equity: f64, floating_profit: f64, profit: f64) -> Self {
        Self {
            timestamp,
            equity,
            floating_profit,
            profit,
        }
    }

    /// Equity plus floating profit. Always derived, never stored.
    pub fn total_value(&self) -> f64 {
        self.equity + self.floating_profit
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.equity.is_finite() {
            return Err(format!("equity must be finite (got {})", self.equity));
        }
        if !self.floating_profit.is_finite() {
            return Err(format!(
                "floating_profit must be finite (got {})",
                self.floating_profit
            ));
        }
        if !self.profit.is_finite() {
            return Err(format!("profit must be finite (got {})", self.profit));
        }
        Ok(())
    }

    /// Exact comparison of the three recorded values; timestamps are ignored.
    pub fn same_values(&self, other: &Snapshot) -> bool {
        self.equity == other.equity
            && self.floating_profit == other.floating_profit
            && self.profit == other.profit
    }
}
