use crate::tick_log::loader::{load_with_report, read_last_record};
use chrono::{Duration, NaiveDateTime};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use ticklog_domain::repositories::clock::Clock;
use ticklog_domain::repositories::series::AppendOutcome;
use ticklog_domain::services::record_codec::{encode, encode_header, stored_form};
use ticklog_domain::services::suppression::{duplicate_decision, AppendDecision};
use ticklog_domain::value_objects::snapshot::Snapshot;

pub const BACKUP_SUFFIX: &str = "backup";

/// Appends one record, writing the header first when the log does not exist yet.
pub fn append(
    path: &Path,
    entity_id: &str,
    snapshot: &Snapshot,
    clock: &dyn Clock,
) -> Result<AppendOutcome, String> {
    if let Err(reason) = snapshot.validate() {
        tracing::warn!(signal = %entity_id, reason = %reason, "rejecting invalid snapshot");
        return Ok(AppendOutcome::Rejected { reason });
    }

    ensure_parent_dir(path)?;

    // The last record comes back at stored precision; compare like with like.
    let candidate = stored_form(snapshot);
    let last = read_last_record(path, entity_id)?;
    if duplicate_decision(last.as_ref(), &candidate) == AppendDecision::Suppress {
        tracing::debug!(
            signal = %entity_id,
            timestamp = %snapshot.timestamp,
            "unchanged snapshot inside duplicate window; not written"
        );
        return Ok(AppendOutcome::Suppressed);
    }

    let mut payload = String::new();
    if !path.exists() {
        for line in encode_header(entity_id, clock.now()) {
            payload.push_str(&line);
            payload.push('\n');
        }
    } else if !ends_with_newline(path)
        .map_err(|err| format!("failed to inspect tick log {}: {}", path.display(), err))?
    {
        payload.push('\n');
    }
    payload.push_str(&encode(&candidate));
    payload.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| format!("failed to open tick log {}: {}", path.display(), err))?;
    file.write_all(payload.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|err| {
            tracing::error!(signal = %entity_id, path = %path.display(), error = %err, "append failed");
            format!("failed to append to tick log {}: {}", path.display(), err)
        })?;

    Ok(AppendOutcome::Applied)
}

/// Rewrites the log without ticks older than `max_age`, keeping a `.backup` copy of
/// the previous content. Returns the number of dropped ticks.
pub fn compact(
    path: &Path,
    entity_id: &str,
    max_age: Duration,
    now: NaiveDateTime,
    clock: &dyn Clock,
) -> Result<usize, String> {
    let Some((series, report)) = load_with_report(path, entity_id)? else {
        return Ok(0);
    };

    let (kept, dropped) = series.split_by_age(now, max_age);
    if dropped == 0 {
        return Ok(0);
    }

    let backup = sibling_path(path, BACKUP_SUFFIX);
    fs::copy(path, &backup).map_err(|err| {
        tracing::error!(signal = %entity_id, error = %err, "compaction backup failed");
        format!(
            "failed to back up tick log {} to {}: {}",
            path.display(),
            backup.display(),
            err
        )
    })?;

    let created_at = series.created_at.unwrap_or_else(|| clock.now());
    let mut contents = String::new();
    for line in encode_header(entity_id, created_at) {
        contents.push_str(&line);
        contents.push('\n');
    }
    for tick in &kept {
        contents.push_str(&encode(tick));
        contents.push('\n');
    }

    replace_via_staging(path, &contents).map_err(|err| {
        tracing::error!(signal = %entity_id, error = %err, "compaction rewrite failed");
        err
    })?;

    tracing::info!(
        signal = %entity_id,
        dropped,
        kept = kept.len(),
        malformed_discarded = report.malformed,
        backup = %backup.display(),
        "tick log compacted"
    );
    Ok(dropped)
}

/// `<file>.<suffix>` next to `path`.
pub fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

/// Writes `contents` to a `.tmp` sibling and renames it over `path`. The sibling is
/// removed when either step fails.
fn replace_via_staging(path: &Path, contents: &str) -> Result<(), String> {
    let staging = sibling_path(path, "tmp");
    fs::write(&staging, contents)
        .and_then(|_| fs::rename(&staging, path))
        .map_err(|err| {
            let _ = fs::remove_file(&staging);
            format!("failed to rewrite tick log {}: {}", path.display(), err)
        })
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .map_err(|err| format!("failed to create dir {}: {}", parent.display(), err)),
        _ => Ok(()),
    }
}

fn ends_with_newline(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
