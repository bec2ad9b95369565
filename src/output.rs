//! Output formatting and persistence for view results.
//!
//! Supports pretty-printing, JSON serialization, and CSV files (gzip when the
//! path ends in `.gz`).

use anyhow::{Context, Result, anyhow};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fmt::Debug;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty<T: Debug>(value: &T) {
    debug!("{:#?}", value);
}

/// Writes a value as pretty-printed JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

fn write_csv_to<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<W> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV writer: {}", e.error()))
}

/// Writes `rows` to a CSV file at `path`, replacing any existing file.
///
/// The file is gzip-compressed when `path` ends in `.gz`.
pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path).with_context(|| format!("Failed to create {path}"))?;
    let gzip = path.ends_with(".gz");
    debug!(path, gzip, rows = rows.len(), "Writing CSV");

    if gzip {
        let encoder = write_csv_to(GzEncoder::new(file, Compression::default()), rows)?;
        encoder.finish()?;
    } else {
        write_csv_to(file, rows)?;
    }

    info!(path, rows = rows.len(), "CSV written");
    Ok(())
}
