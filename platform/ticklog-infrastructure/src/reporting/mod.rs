use std::fs;
use std::path::Path;
use std::time::Instant;
use ticklog_domain::repositories::export::SeriesExporter;
use ticklog_domain::services::record_codec::CREATED_FORMAT;
use ticklog_domain::value_objects::series::Series;

pub const EXPORT_HEADER: [&str; 5] = [
    "timestamp",
    "equity",
    "floating_profit",
    "profit",
    "total_value",
];

/// Writes one row per tick in stored order. Returns the number of rows.
pub fn write_series_csv(path: &Path, series: &Series) -> Result<usize, String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|err| format!("failed to create dir {}: {}", parent.display(), err))?;
    }

    let mut wtr = csv::Writer::from_path(path)
        .map_err(|err| format!("failed to create export csv {}: {}", path.display(), err))?;
    wtr.write_record(EXPORT_HEADER)
        .map_err(|err| format!("failed to write export csv header: {}", err))?;

    for tick in &series.ticks {
        wtr.write_record([
            tick.timestamp.format(CREATED_FORMAT).to_string(),
            format!("{:.2}", tick.equity),
            format!("{:.2}", tick.floating_profit),
            format!("{:.2}", tick.profit),
            format!("{:.2}", tick.total_value()),
        ])
        .map_err(|err| format!("failed to write export csv row: {}", err))?;
    }
    wtr.flush()
        .map_err(|err| format!("failed to flush export csv {}: {}", path.display(), err))?;
    Ok(series.ticks.len())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemSeriesExporter;

impl FilesystemSeriesExporter {
    pub fn new() -> Self {
        Self
    }
}

impl SeriesExporter for FilesystemSeriesExporter {
    fn write_series_csv(&self, path: &Path, series: &Series) -> Result<usize, String> {
        let start = Instant::now();
        let result = write_series_csv(path, series);
        let result_label = if result.is_ok() { "ok" } else { "err" };
        metrics::counter!("ticklog.infra.export.calls_total", "result" => result_label).increment(1);
        metrics::histogram!("ticklog.infra.export.write_ms", "result" => result_label)
            .record(start.elapsed().as_millis() as f64);
        result
    }
}
