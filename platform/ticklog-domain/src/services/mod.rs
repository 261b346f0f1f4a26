pub mod period_profit;
pub mod record_codec;
pub mod series_quality;
pub mod suppression;
