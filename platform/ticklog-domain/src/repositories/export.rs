use crate::value_objects::series::Series;
use std::path::Path;

pub trait SeriesExporter {
    /// Writes `series` as a CSV table and returns the number of rows written.
    fn write_series_csv(&self, path: &Path, series: &Series) -> Result<usize, String>;
}
