use chrono::{Local, NaiveDateTime};
use ticklog_domain::repositories::clock::Clock;

/// Local wall clock; tick logs store local naive timestamps.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
