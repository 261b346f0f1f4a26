pub mod clock;
pub mod reporting;
pub mod tick_log;
