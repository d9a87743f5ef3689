//! Console rendering and file export of result sets.
//!
//! Text reports hold one section per command, in run order:
//!
//! ```text
//!
//! ===== System Status =====
//! Version: FortiGate-60E v7.2.5
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use log::info;
use serde::Serialize;

use crate::error::{ReportError, Result};
use crate::runner::ResultSet;

/// Timestamp layout used in report file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Write every section of `results` to `writer`.
pub fn render_sections<W: Write>(writer: &mut W, results: &ResultSet) -> io::Result<()> {
    for (label, result) in results.iter() {
        writeln!(writer)?;
        writeln!(writer, "===== {} =====", label)?;
        writeln!(writer, "{}", result.outcome.text())?;
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    label: &'a str,
    command: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Pretty JSON array with one object per command, in run order.
pub fn render_json(results: &ResultSet) -> Result<String> {
    let entries: Vec<JsonEntry<'_>> = results
        .iter()
        .map(|(label, result)| {
            let failure = result.outcome.failure();
            JsonEntry {
                label,
                command: &result.command,
                status: if failure.is_none() { "ok" } else { "failed" },
                output: failure.is_none().then(|| result.outcome.text()),
                error_kind: failure.map(|f| f.kind()),
                error: failure.map(ToString::to_string),
            }
        })
        .collect();

    Ok(serde_json::to_string_pretty(&entries).map_err(ReportError::from)?)
}

/// `<dir>/<prefix>_<YYYYMMDD_HHMMSS>.txt`
pub fn timestamped_path<Tz>(dir: &Path, prefix: &str, timestamp: &DateTime<Tz>) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    dir.join(format!("{}_{}.txt", prefix, timestamp.format(TIMESTAMP_FORMAT)))
}

/// Write `results` to a new timestamped file under `dir`, creating `dir`
/// if needed. Returns the path written.
pub fn save(dir: &Path, prefix: &str, results: &ResultSet) -> Result<PathBuf> {
    save_at(dir, prefix, results, &Local::now())
}

/// [`save`] with an explicit timestamp.
pub fn save_at<Tz>(
    dir: &Path,
    prefix: &str,
    results: &ResultSet,
    timestamp: &DateTime<Tz>,
) -> Result<PathBuf>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let path = timestamped_path(dir, prefix, timestamp);
    let write_err = |source| ReportError::Write {
        path: path.clone(),
        source,
    };

    fs::create_dir_all(dir).map_err(write_err)?;

    let mut file = io::BufWriter::new(fs::File::create(&path).map_err(write_err)?);
    render_sections(&mut file, results).map_err(write_err)?;
    file.flush().map_err(write_err)?;

    info!("saved {} sections to {}", results.len(), path.display());
    Ok(path)
}
