//! Row types for the input relations and the derived aggregate rows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::period::{TimeBin, TimeRange};

pub type SegmentId = i64;
pub type CorridorId = i64;

/// A baseline travel-time sample (`baselines`). `tt` is in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineSample {
    pub segment_id: SegmentId,
    pub day_type: String,
    pub time_bin: TimeBin,
    pub tt: f64,
}

/// A named time-of-day window scoped to a day type (`periods`).
#[derive(Debug, Clone, PartialEq)]
pub struct Period {
    pub day_type: String,
    pub period: String,
    pub period_range: TimeRange,
}

/// `periods` as it appears on disk; the range is parsed by the loader so
/// that the bare-range inclusivity can be chosen at load time.
#[derive(Debug, Deserialize)]
pub(crate) struct PeriodRecord {
    pub(crate) day_type: String,
    pub(crate) period: String,
    pub(crate) period_range: String,
}

/// A registered bluetooth segment (`bt_segments`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub segment_id: SegmentId,
    #[serde(default)]
    pub segment_name: Option<String>,
}

/// Segment-to-corridor membership (`bt_corridor_segments`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorridorSegment {
    pub segment_id: SegmentId,
    pub corridor_id: CorridorId,
}

/// A directional corridor made of `segment_count` segments (`bt_corridors`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corridor {
    pub corridor_id: CorridorId,
    pub corridor_name: String,
    pub street: String,
    pub direction: String,
    pub segment_count: usize,
}

/// One row of the dashboard baseline view. `tt` is in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineRow {
    #[serde(skip)]
    pub corridor_id: CorridorId,
    pub street: String,
    pub direction: String,
    pub day_type: String,
    pub period: String,
    pub tt: f64,
}

/// A daily "after" travel time in minutes for a street, direction and period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
    pub street: String,
    pub direction: String,
    pub date: NaiveDate,
    pub day_type: String,
    pub period: String,
    pub tt: f64,
}
