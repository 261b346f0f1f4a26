pub mod period;
pub mod retention;
pub mod series;
pub mod snapshot;
