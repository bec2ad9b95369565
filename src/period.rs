//! Time bins and period ranges.
//!
//! Periods are named time-of-day windows expressed as a range over time bins.
//! A range keeps its own bound inclusivity so that containment matches the
//! upstream definition exactly:
//!
//! - `[07:00,10:00)` — Postgres range notation, bounds as written
//! - `07:00,10:00` or `07:00-10:00` — bare bounds, inclusivity from [`Bounds`]
//! - `(,10:00)` or `[07:00,)` — one side unbounded
//! - `empty` — contains nothing

use anyhow::{Result, anyhow, bail};
use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A discrete time-of-day bin a baseline sample was measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeBin(pub NaiveTime);

impl TimeBin {
    pub fn from_hms(hour: u32, min: u32, sec: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, min, sec).map(TimeBin)
    }
}

impl FromStr for TimeBin {
    type Err = anyhow::Error;

    /// Accepts `HH:MM:SS` or `HH:MM`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        NaiveTime::parse_from_str(s, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
            .map(TimeBin)
            .map_err(|e| anyhow!("invalid time bin '{s}': {e}"))
    }
}

impl fmt::Display for TimeBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M:%S"))
    }
}

impl Serialize for TimeBin {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeBin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Inclusivity applied to ranges written without brackets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bounds {
    /// `[lower, upper]`
    #[default]
    Closed,
    /// `[lower, upper)`
    HalfOpen,
}

/// A time-of-day range with explicit bound inclusivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub lower: TimeBin,
    pub upper: TimeBin,
    pub lower_inclusive: bool,
    pub upper_inclusive: bool,
}

impl TimeRange {
    pub fn closed(lower: TimeBin, upper: TimeBin) -> Self {
        Self {
            lower,
            upper,
            lower_inclusive: true,
            upper_inclusive: true,
        }
    }

    pub fn half_open(lower: TimeBin, upper: TimeBin) -> Self {
        Self {
            upper_inclusive: false,
            ..Self::closed(lower, upper)
        }
    }

    /// Returns `true` if `bin` falls inside the range, honouring both bounds.
    pub fn contains(&self, bin: TimeBin) -> bool {
        let above_lower = if self.lower_inclusive {
            bin >= self.lower
        } else {
            bin > self.lower
        };
        let below_upper = if self.upper_inclusive {
            bin <= self.upper
        } else {
            bin < self.upper
        };
        above_lower && below_upper
    }

    /// A range that contains no time bin.
    pub fn empty() -> Self {
        let midnight = TimeBin(NaiveTime::MIN);
        Self {
            lower: midnight,
            upper: midnight,
            lower_inclusive: false,
            upper_inclusive: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lower > self.upper
            || (self.lower == self.upper && !(self.lower_inclusive && self.upper_inclusive))
    }

    /// Parses a range, applying `bare` to ranges written without brackets.
    ///
    /// `empty` yields [`TimeRange::empty`]. A missing bound, as in `(,10:00)`,
    /// leaves that side open to the start or end of the day.
    pub fn parse(text: &str, bare: Bounds) -> Result<Self> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("empty") {
            return Ok(Self::empty());
        }

        let (lower_inclusive, rest) = match text.chars().next() {
            Some('[') => (Some(true), &text[1..]),
            Some('(') => (Some(false), &text[1..]),
            _ => (None, text),
        };
        let (upper_inclusive, body) = match rest.chars().last() {
            Some(']') => (Some(true), &rest[..rest.len() - 1]),
            Some(')') => (Some(false), &rest[..rest.len() - 1]),
            _ => (None, rest),
        };

        let (lower_inclusive, upper_inclusive) = match (lower_inclusive, upper_inclusive) {
            (Some(l), Some(u)) => (l, u),
            (None, None) => (true, bare == Bounds::Closed),
            _ => bail!("unbalanced range brackets in '{text}'"),
        };

        let (lower, upper) = body
            .split_once(',')
            .or_else(|| body.split_once('-'))
            .ok_or_else(|| anyhow!("range '{text}' has no separator"))?;

        let (lower, lower_inclusive) = match parse_bound(lower)? {
            Some(bin) => (bin, lower_inclusive),
            None => (TimeBin(NaiveTime::MIN), true),
        };
        let (upper, upper_inclusive) = match parse_bound(upper)? {
            Some(bin) => (bin, upper_inclusive),
            None => (end_of_day()?, true),
        };

        if lower > upper {
            bail!("range '{text}' has lower bound after upper bound");
        }

        Ok(Self {
            lower,
            upper,
            lower_inclusive,
            upper_inclusive,
        })
    }
}

/// Parses one side of a range; an empty side is unbounded.
fn parse_bound(text: &str) -> Result<Option<TimeBin>> {
    let text = text.trim().trim_matches('"').trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse().map(Some)
}

fn end_of_day() -> Result<TimeBin> {
    NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
        .map(TimeBin)
        .ok_or_else(|| anyhow!("invalid end of day"))
}

impl FromStr for TimeRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, Bounds::Closed)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("empty");
        }
        write!(
            f,
            "{}{},{}{}",
            if self.lower_inclusive { '[' } else { '(' },
            self.lower,
            self.upper,
            if self.upper_inclusive { ']' } else { ')' },
        )
    }
}
