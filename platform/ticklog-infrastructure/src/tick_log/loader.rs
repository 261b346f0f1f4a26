use chrono::NaiveDateTime;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use ticklog_domain::services::record_codec::{decode, is_comment, parse_created_marker};
use ticklog_domain::services::series_quality::{timeline_stats, LoadReport};
use ticklog_domain::value_objects::series::Series;
use ticklog_domain::value_objects::snapshot::Snapshot;

const REVERSE_CHUNK_BYTES: u64 = 8 * 1024;

/// Loads a whole tick log. `Ok(None)` when the file is missing or none of its data
/// lines decode; a header-only file yields an empty series.
pub fn load_with_report(
    path: &Path,
    entity_id: &str,
) -> Result<Option<(Series, LoadReport)>, String> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(format!(
                "failed to open tick log {}: {}",
                path.display(),
                err
            ))
        }
    };

    let mut reader = BufReader::new(file);
    let mut series = Series::new(entity_id, path);
    let mut report = LoadReport::default();
    let mut raw = Vec::new();
    let mut line_number = 0usize;

    loop {
        raw.clear();
        let read = reader
            .read_until(b'\n', &mut raw)
            .map_err(|err| format!("failed to read tick log {}: {}", path.display(), err))?;
        if read == 0 {
            break;
        }
        line_number += 1;

        let line = String::from_utf8_lossy(&raw);
        let trimmed = line.trim();
        if trimmed.is_empty() {
            report.blank_lines += 1;
            continue;
        }
        if is_comment(trimmed) {
            report.comment_lines += 1;
            if series.created_at.is_none() {
                series.created_at = parse_created_marker(trimmed);
            }
            continue;
        }

        report.data_lines += 1;
        match decode(trimmed) {
            Ok(snapshot) => series.ticks.push(snapshot),
            Err(err) => {
                report.record_malformed(line_number);
                tracing::debug!(
                    signal = %entity_id,
                    path = %path.display(),
                    line = line_number,
                    error = %err,
                    "skipping malformed tick record"
                );
            }
        }
    }

    if report.malformed > 0 {
        metrics::counter!("ticklog.infra.series.malformed_lines_total")
            .increment(report.malformed as u64);
    }

    if report.data_lines > 0 && series.ticks.is_empty() {
        tracing::warn!(
            signal = %entity_id,
            path = %path.display(),
            malformed = report.malformed,
            "tick log has no decodable records"
        );
        return Ok(None);
    }

    timeline_stats(&series.ticks, &mut report);
    Ok(Some((series, report)))
}

/// Absent on a missing or unreadable file.
pub fn load_full(path: &Path, entity_id: &str) -> Option<Series> {
    match load_with_report(path, entity_id) {
        Ok(loaded) => loaded.map(|(series, _)| series),
        Err(err) => {
            tracing::warn!(signal = %entity_id, error = %err, "tick log unreadable");
            None
        }
    }
}

pub fn load_tail(path: &Path, entity_id: &str, max_count: usize) -> Option<Series> {
    load_full(path, entity_id).map(|series| series.tail(max_count))
}

pub fn load_window(
    path: &Path,
    entity_id: &str,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Option<Series> {
    load_full(path, entity_id).map(|series| series.window(from, to))
}

/// Scans backward from the end of the file and decodes the first data line that
/// parses. Only the tail of the file is read in the common case.
pub fn read_last_record(path: &Path, entity_id: &str) -> Result<Option<Snapshot>, String> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(format!(
                "failed to open tick log {}: {}",
                path.display(),
                err
            ))
        }
    };

    let mut lines = ReverseLines::new(&mut file)
        .map_err(|err| format!("failed to read tick log {}: {}", path.display(), err))?;
    while let Some(line) = lines
        .next_line()
        .map_err(|err| format!("failed to read tick log {}: {}", path.display(), err))?
    {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_comment(trimmed) {
            continue;
        }
        match decode(trimmed) {
            Ok(snapshot) => return Ok(Some(snapshot)),
            Err(err) => {
                tracing::debug!(signal = %entity_id, error = %err, "skipping malformed tail record");
            }
        }
    }
    Ok(None)
}

/// Yields the lines of a file last-to-first, reading fixed-size chunks from the end.
struct ReverseLines<'a, R: Read + Seek> {
    inner: &'a mut R,
    pos: u64,
    /// Bytes of the line that continues into the not-yet-read part of the file.
    pending: Vec<u8>,
    /// Complete lines from the last chunk, in file order.
    ready: Vec<Vec<u8>>,
}

impl<'a, R: Read + Seek> ReverseLines<'a, R> {
    fn new(inner: &'a mut R) -> io::Result<Self> {
        let pos = inner.seek(SeekFrom::End(0))?;
        Ok(Self {
            inner,
            pos,
            pending: Vec::new(),
            ready: Vec::new(),
        })
    }

    fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(line) = self.ready.pop() {
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }
            if self.pos == 0 {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                let line = std::mem::take(&mut self.pending);
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }

            let read_len = REVERSE_CHUNK_BYTES.min(self.pos);
            self.pos -= read_len;
            self.inner.seek(SeekFrom::Start(self.pos))?;
            let mut chunk = vec![0u8; read_len as usize];
            self.inner.read_exact(&mut chunk)?;
            chunk.extend_from_slice(&self.pending);

            let mut parts = chunk.split(|byte| *byte == b'\n').map(<[u8]>::to_vec);
            self.pending = parts.next().unwrap_or_default();
            self.ready = parts.collect();
        }
    }
}
