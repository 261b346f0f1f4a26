use crate::shared::{checked_entity_id, format_timestamp};
use ticklog_domain::repositories::series::SeriesRepository;
use ticklog_domain::services::series_quality::LoadReport;
use tracing::info_span;

/// Line-level quality report for one tick log. With `strict`, more than
/// `max_malformed` undecodable lines is an error.
pub fn validate(
    repo: &dyn SeriesRepository,
    entity_id: &str,
    strict: bool,
    max_malformed: usize,
) -> Result<serde_json::Value, String> {
    let _span = info_span!("validate", signal = %entity_id, strict = strict).entered();
    let entity_id = checked_entity_id(entity_id)?;

    let Some((series, report)) = repo.load_with_report(entity_id)? else {
        if strict {
            return Err(format!(
                "strict validation failed: no readable tick log for signal '{entity_id}'"
            ));
        }
        return Ok(serde_json::json!({
            "signal": entity_id,
            "found": false,
            "strict": strict,
        }));
    };

    metrics::gauge!("ticklog.app.validate.malformed").set(report.malformed as f64);
    metrics::gauge!("ticklog.app.validate.out_of_order").set(report.out_of_order as f64);

    if strict && report.malformed > max_malformed {
        return Err(format!(
            "strict validation failed: {} malformed line(s) (first at line {}), limit {}",
            report.malformed,
            report
                .first_malformed_line
                .map(|line| line.to_string())
                .unwrap_or_else(|| "?".to_string()),
            max_malformed
        ));
    }
    if report.malformed > 0 {
        tracing::warn!(malformed = report.malformed, "tick log has malformed lines");
    }

    Ok(serde_json::json!({
        "signal": entity_id,
        "found": true,
        "path": series.source_path.display().to_string(),
        "created_at": series.created_at.map(format_timestamp),
        "ticks": series.len(),
        "report": load_report_json(&report),
        "limits": { "max_malformed": max_malformed },
        "strict": strict,
    }))
}

fn load_report_json(report: &LoadReport) -> serde_json::Value {
    serde_json::json!({
        "data_lines": report.data_lines,
        "decoded": report.decoded(),
        "comment_lines": report.comment_lines,
        "blank_lines": report.blank_lines,
        "malformed": report.malformed,
        "first_malformed_line": report.first_malformed_line,
        "out_of_order": report.out_of_order,
        "first_out_of_order": report.first_out_of_order.map(format_timestamp),
        "first_timestamp": report.first_timestamp.map(format_timestamp),
        "last_timestamp": report.last_timestamp.map(format_timestamp),
    })
}
