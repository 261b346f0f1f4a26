pub mod clock;
pub mod export;
pub mod series;
