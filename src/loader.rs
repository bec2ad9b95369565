//! CSV decoding for the input relations.
//!
//! Every loader takes raw bytes (as returned by [`crate::fetch::load_source`])
//! and transparently gunzips them when they carry the gzip magic header.

use std::io::Read;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::model::{
    BaselineRow, BaselineSample, Corridor, CorridorSegment, DailyObservation, Period, PeriodRecord,
    Segment,
};
use crate::period::{Bounds, TimeRange};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Returns the bytes, gunzipped when they start with the gzip magic number.
pub fn maybe_gunzip(bytes: Vec<u8>) -> Result<Vec<u8>> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes);
    }
    let mut out = Vec::new();
    GzDecoder::new(bytes.as_slice())
        .read_to_end(&mut out)
        .context("Failed to decompress gzip input")?;
    Ok(out)
}

/// Deserializes every CSV row of `bytes` into `T`.
///
/// `name` identifies the relation in error messages.
pub fn read_rows<T: DeserializeOwned>(name: &str, bytes: Vec<u8>) -> Result<Vec<T>> {
    let bytes = maybe_gunzip(bytes)?;
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes.as_slice());

    let mut rows = Vec::new();
    for (i, result) in rdr.deserialize().enumerate() {
        // header is line 1
        let record: T = result
            .with_context(|| format!("{name}: invalid row at line {}", i + 2))?;
        rows.push(record);
    }

    debug!(relation = name, rows = rows.len(), "Rows decoded");
    Ok(rows)
}

pub fn load_baselines(bytes: Vec<u8>) -> Result<Vec<BaselineSample>> {
    read_rows("baselines", bytes)
}

/// Loads `periods`, parsing bare ranges with the given inclusivity.
pub fn load_periods(bytes: Vec<u8>, bare: Bounds) -> Result<Vec<Period>> {
    read_rows::<PeriodRecord>("periods", bytes)?
        .into_iter()
        .map(|r| {
            let period_range = TimeRange::parse(&r.period_range, bare)
                .with_context(|| format!("periods: bad range for '{}'", r.period))?;
            if period_range.is_empty() {
                warn!(day_type = %r.day_type, period = %r.period, "Period range is empty");
            }
            Ok(Period {
                day_type: r.day_type,
                period: r.period,
                period_range,
            })
        })
        .collect()
}

pub fn load_segments(bytes: Vec<u8>) -> Result<Vec<Segment>> {
    read_rows("bt_segments", bytes)
}

pub fn load_corridor_segments(bytes: Vec<u8>) -> Result<Vec<CorridorSegment>> {
    read_rows("bt_corridor_segments", bytes)
}

pub fn load_corridors(bytes: Vec<u8>) -> Result<Vec<Corridor>> {
    read_rows("bt_corridors", bytes)
}

/// Loads a previously written baseline view.
pub fn load_baseline_rows(bytes: Vec<u8>) -> Result<Vec<BaselineRow>> {
    read_rows("baseline", bytes)
}

pub fn load_daily(bytes: Vec<u8>) -> Result<Vec<DailyObservation>> {
    read_rows("daily", bytes)
}
