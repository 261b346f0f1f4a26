pub mod config;
pub mod maintenance;
pub mod recording;
pub mod reporting;
mod shared;
pub mod validation;

pub use shared::{format_timestamp, parse_timestamp};
