//! Dashboard views comparing daily "after" travel times against the baseline.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::config::DashboardConfig;
use crate::model::{BaselineRow, DailyObservation};

/// How an "after" travel time compares with its baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellClass {
    Better,
    Worse,
    Same,
}

/// Classifies a change in travel time (minutes) against `threshold`.
pub fn classify(baseline: f64, after: f64, threshold: f64) -> CellClass {
    let delta = after - baseline;
    if delta > threshold {
        CellClass::Worse
    } else if delta < -threshold {
        CellClass::Better
    } else {
        CellClass::Same
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionCell {
    pub after: Option<f64>,
    pub baseline: Option<f64>,
    pub class: Option<CellClass>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub street: String,
    /// Keyed by direction code.
    pub directions: BTreeMap<String, DirectionCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardTable {
    pub period: String,
    pub day_type: String,
    pub rows: Vec<TableRow>,
}

#[derive(Default)]
struct Mean {
    sum: f64,
    n: usize,
}

impl Mean {
    fn push(&mut self, v: f64) {
        self.sum += v;
        self.n += 1;
    }

    fn value(&self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / self.n as f64)
    }
}

fn mean_by_street_direction<'a, I>(values: I) -> HashMap<(&'a str, &'a str), f64>
where
    I: Iterator<Item = (&'a str, &'a str, f64)>,
{
    let mut acc: HashMap<(&str, &str), Mean> = HashMap::new();
    for (street, direction, tt) in values {
        acc.entry((street, direction)).or_default().push(tt);
    }
    acc.into_iter()
        .filter_map(|(k, m)| m.value().map(|v| (k, v)))
        .collect()
}

/// Builds the street-by-direction comparison table for one period and day type.
///
/// Streets follow the configured order; streets missing from the
/// configuration are left out.
#[tracing::instrument(skip(daily, baseline, config))]
pub fn compare_table(
    daily: &[DailyObservation],
    baseline: &[BaselineRow],
    period: &str,
    day_type: &str,
    config: &DashboardConfig,
) -> DashboardTable {
    let after = mean_by_street_direction(
        daily
            .iter()
            .filter(|d| d.period == period && d.day_type == day_type)
            .map(|d| (d.street.as_str(), d.direction.as_str(), d.tt)),
    );
    let before = mean_by_street_direction(
        baseline
            .iter()
            .filter(|b| b.period == period && b.day_type == day_type)
            .map(|b| (b.street.as_str(), b.direction.as_str(), b.tt)),
    );

    let rows = config
        .streets
        .iter()
        .map(|street| {
            let directions = config
                .directions
                .keys()
                .map(|dir| {
                    let key = (street.as_str(), dir.as_str());
                    let after = after.get(&key).copied().map(round1);
                    let baseline = before.get(&key).copied().map(round1);
                    let class = match (baseline, after) {
                        (Some(b), Some(a)) => Some(classify(b, a, config.threshold)),
                        _ => None,
                    };
                    (
                        dir.clone(),
                        DirectionCell {
                            after,
                            baseline,
                            class,
                        },
                    )
                })
                .collect();
            TableRow {
                street: street.clone(),
                directions,
            }
        })
        .collect::<Vec<_>>();

    debug!(rows = rows.len(), "Dashboard table built");
    DashboardTable {
        period: period.to_string(),
        day_type: day_type.to_string(),
        rows,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphPoint {
    pub date: NaiveDate,
    pub tt: f64,
}

/// Daily travel times for one street and direction, with the baseline level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphSeries {
    pub title: String,
    pub street: String,
    pub direction: String,
    pub day_type: String,
    pub period: String,
    pub points: Vec<GraphPoint>,
    pub baseline: Option<f64>,
}

/// Selects the daily series and baseline for a street and direction.
#[tracing::instrument(skip(daily, baseline, config))]
pub fn graph_series(
    daily: &[DailyObservation],
    baseline: &[BaselineRow],
    street: &str,
    direction: &str,
    day_type: &str,
    period: &str,
    config: &DashboardConfig,
) -> GraphSeries {
    let mut points: Vec<GraphPoint> = daily
        .iter()
        .filter(|d| {
            d.street == street
                && d.direction == direction
                && d.day_type == day_type
                && d.period == period
        })
        .map(|d| GraphPoint {
            date: d.date,
            tt: d.tt,
        })
        .collect();
    points.sort_by_key(|p| p.date);

    let mut base = Mean::default();
    baseline
        .iter()
        .filter(|b| {
            b.street == street
                && b.direction == direction
                && b.day_type == day_type
                && b.period == period
        })
        .for_each(|b| base.push(b.tt));

    GraphSeries {
        title: config.direction_label(direction).to_string(),
        street: street.to_string(),
        direction: direction.to_string(),
        day_type: day_type.to_string(),
        period: period.to_string(),
        points,
        baseline: base.value(),
    }
}
