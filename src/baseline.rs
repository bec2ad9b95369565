//! Dashboard baseline view.
//!
//! Averages baseline samples per segment and period, sums those averages over
//! each corridor's segments and keeps only corridors where every member
//! segment reported data for the period.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::model::{
    BaselineRow, BaselineSample, Corridor, CorridorId, CorridorSegment, Period, Segment, SegmentId,
};

/// Corridor excluded from the dashboard regardless of completeness.
pub const EXCLUDED_CORRIDOR: CorridorId = 6;

const SECONDS_PER_MINUTE: f64 = 60.0;

/// The relations the view is computed from.
#[derive(Debug, Default, Clone)]
pub struct BaselineInputs {
    pub baselines: Vec<BaselineSample>,
    pub periods: Vec<Period>,
    pub segments: Vec<Segment>,
    pub corridor_segments: Vec<CorridorSegment>,
    pub corridors: Vec<Corridor>,
}

/// Mean travel time (seconds) of one segment within one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentPeriodAvg {
    pub segment_id: SegmentId,
    pub day_type: String,
    pub period: String,
    pub avg_tt: f64,
    pub samples: usize,
}

/// A (corridor, day type, period) group dropped because segments were missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncompleteGroup {
    pub corridor_id: CorridorId,
    pub day_type: String,
    pub period: String,
    pub present: usize,
    pub expected: usize,
}

#[derive(Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }
}

type GroupKey<'a> = (CorridorId, &'a str, &'a str);

/// Averages samples of registered segments over every matching period.
///
/// A sample counts towards each period of its day type whose range contains
/// its time bin. Segments without samples in a period produce no entry.
pub fn segment_period_averages(inputs: &BaselineInputs) -> Vec<SegmentPeriodAvg> {
    let known: HashSet<SegmentId> = inputs.segments.iter().map(|s| s.segment_id).collect();

    let mut periods_by_day: HashMap<&str, Vec<&Period>> = HashMap::new();
    for p in &inputs.periods {
        periods_by_day
            .entry(p.day_type.as_str())
            .or_default()
            .push(p);
    }

    let mut acc: BTreeMap<(SegmentId, &str, &str), Accumulator> = BTreeMap::new();

    for sample in &inputs.baselines {
        if !known.contains(&sample.segment_id) {
            continue;
        }
        let Some(periods) = periods_by_day.get(sample.day_type.as_str()) else {
            continue;
        };
        for p in periods {
            if p.period_range.contains(sample.time_bin) {
                acc.entry((sample.segment_id, p.day_type.as_str(), p.period.as_str()))
                    .or_default()
                    .push(sample.tt);
            }
        }
    }

    acc.into_iter()
        .map(|((segment_id, day_type, period), a)| SegmentPeriodAvg {
            segment_id,
            day_type: day_type.to_string(),
            period: period.to_string(),
            avg_tt: a.sum / a.count as f64,
            samples: a.count,
        })
        .collect()
}

/// Sums segment averages into (corridor, day type, period) groups.
fn corridor_groups<'a>(
    inputs: &BaselineInputs,
    averages: &'a [SegmentPeriodAvg],
) -> BTreeMap<GroupKey<'a>, Accumulator> {
    let mut membership: HashMap<SegmentId, Vec<CorridorId>> = HashMap::new();
    for cs in &inputs.corridor_segments {
        membership
            .entry(cs.segment_id)
            .or_default()
            .push(cs.corridor_id);
    }

    let mut groups: BTreeMap<GroupKey<'a>, Accumulator> = BTreeMap::new();
    for avg in averages {
        let Some(corridor_ids) = membership.get(&avg.segment_id) else {
            continue;
        };
        for &corridor_id in corridor_ids {
            groups
                .entry((corridor_id, avg.day_type.as_str(), avg.period.as_str()))
                .or_default()
                .push(avg.avg_tt);
        }
    }
    groups
}

fn corridor_index(corridors: &[Corridor]) -> HashMap<CorridorId, &Corridor> {
    corridors.iter().map(|c| (c.corridor_id, c)).collect()
}

/// Computes the dashboard baseline rows, ordered by corridor id, then day
/// type, then period.
#[tracing::instrument(
    skip(inputs),
    fields(
        samples = inputs.baselines.len(),
        periods = inputs.periods.len(),
        corridors = inputs.corridors.len(),
    )
)]
pub fn aggregate(inputs: &BaselineInputs) -> Vec<BaselineRow> {
    let corridors = corridor_index(&inputs.corridors);

    let averages = segment_period_averages(inputs);
    debug!(segment_period_avgs = averages.len(), "Segment averages computed");

    let rows: Vec<BaselineRow> = corridor_groups(inputs, &averages)
        .into_iter()
        .filter(|((corridor_id, _, _), _)| *corridor_id != EXCLUDED_CORRIDOR)
        .filter_map(|((corridor_id, day_type, period), group)| {
            let corridor = corridors.get(&corridor_id)?;
            if group.count != corridor.segment_count {
                return None;
            }
            Some(BaselineRow {
                corridor_id,
                street: corridor.street.clone(),
                direction: corridor.direction.clone(),
                day_type: day_type.to_string(),
                period: period.to_string(),
                tt: group.sum / SECONDS_PER_MINUTE,
            })
        })
        .collect();

    debug!(rows = rows.len(), "Baseline view computed");
    rows
}

/// Lists groups that [`aggregate`] drops for not covering every segment.
pub fn incomplete_groups(inputs: &BaselineInputs) -> Vec<IncompleteGroup> {
    let corridors = corridor_index(&inputs.corridors);
    let averages = segment_period_averages(inputs);

    corridor_groups(inputs, &averages)
        .into_iter()
        .filter(|((corridor_id, _, _), _)| *corridor_id != EXCLUDED_CORRIDOR)
        .filter_map(|((corridor_id, day_type, period), group)| {
            let corridor = corridors.get(&corridor_id)?;
            if group.count == corridor.segment_count {
                return None;
            }
            Some(IncompleteGroup {
                corridor_id,
                day_type: day_type.to_string(),
                period: period.to_string(),
                present: group.count,
                expected: corridor.segment_count,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::{TimeBin, TimeRange};

    fn bin(h: u32, m: u32) -> TimeBin {
        TimeBin::from_hms(h, m, 0).unwrap()
    }

    fn sample(segment_id: SegmentId, h: u32, m: u32, tt: f64) -> BaselineSample {
        BaselineSample {
            segment_id,
            day_type: "Weekday".to_string(),
            time_bin: bin(h, m),
            tt,
        }
    }

    fn corridor(corridor_id: CorridorId, segment_count: usize) -> Corridor {
        Corridor {
            corridor_id,
            corridor_name: format!("Corridor {corridor_id}"),
            street: "Main St".to_string(),
            direction: "NB".to_string(),
            segment_count,
        }
    }

    fn segment(segment_id: SegmentId) -> Segment {
        Segment {
            segment_id,
            segment_name: None,
        }
    }

    fn member(segment_id: SegmentId, corridor_id: CorridorId) -> CorridorSegment {
        CorridorSegment {
            segment_id,
            corridor_id,
        }
    }

    fn am_peak() -> Period {
        Period {
            day_type: "Weekday".to_string(),
            period: "AM Peak".to_string(),
            period_range: TimeRange::closed(bin(7, 0), bin(10, 0)),
        }
    }

    fn main_st_inputs() -> BaselineInputs {
        BaselineInputs {
            baselines: vec![
                sample(1, 7, 0, 100.0),
                sample(1, 8, 0, 140.0),
                sample(2, 9, 0, 180.0),
                sample(2, 12, 0, 999.0),
            ],
            periods: vec![am_peak()],
            segments: vec![segment(1), segment(2)],
            corridor_segments: vec![member(1, 1), member(2, 1)],
            corridors: vec![corridor(1, 2)],
        }
    }

    #[test]
    fn test_complete_corridor_sums_averages_in_minutes() {
        let rows = aggregate(&main_st_inputs());

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.street, "Main St");
        assert_eq!(row.direction, "NB");
        assert_eq!(row.day_type, "Weekday");
        assert_eq!(row.period, "AM Peak");
        assert!((row.tt - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_segment_drops_row() {
        let mut inputs = main_st_inputs();
        inputs.baselines.retain(|s| s.segment_id == 1);

        assert!(aggregate(&inputs).is_empty());

        let incomplete = incomplete_groups(&inputs);
        assert_eq!(incomplete.len(), 1);
        assert_eq!(incomplete[0].present, 1);
        assert_eq!(incomplete[0].expected, 2);
    }

    #[test]
    fn test_excluded_corridor_never_appears() {
        let mut inputs = main_st_inputs();
        for cs in &mut inputs.corridor_segments {
            cs.corridor_id = EXCLUDED_CORRIDOR;
        }
        inputs.corridors = vec![corridor(EXCLUDED_CORRIDOR, 2)];

        assert!(aggregate(&inputs).is_empty());
        assert!(incomplete_groups(&inputs).is_empty());
    }

    #[test]
    fn test_unregistered_segment_is_ignored() {
        let mut inputs = main_st_inputs();
        inputs.segments.retain(|s| s.segment_id != 2);

        assert!(aggregate(&inputs).is_empty());
    }

    #[test]
    fn test_extra_segment_data_breaks_reconciliation() {
        let mut inputs = main_st_inputs();
        inputs.corridors = vec![corridor(1, 1)];

        assert!(aggregate(&inputs).is_empty());
    }

    #[test]
    fn test_sample_counts_towards_overlapping_periods() {
        let mut inputs = main_st_inputs();
        inputs.periods.push(Period {
            day_type: "Weekday".to_string(),
            period: "Early".to_string(),
            period_range: TimeRange::closed(bin(6, 0), bin(8, 0)),
        });

        let avgs = segment_period_averages(&inputs);
        let early: Vec<_> = avgs.iter().filter(|a| a.period == "Early").collect();
        assert_eq!(early.len(), 1);
        assert_eq!(early[0].segment_id, 1);
        assert_eq!(early[0].samples, 2);
        assert!((early[0].avg_tt - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_period_day_type_must_match() {
        let mut inputs = main_st_inputs();
        for s in &mut inputs.baselines {
            s.day_type = "Weekend".to_string();
        }

        assert!(segment_period_averages(&inputs).is_empty());
        assert!(aggregate(&inputs).is_empty());
    }

    #[test]
    fn test_half_open_range_excludes_upper_bin() {
        let mut inputs = main_st_inputs();
        inputs.baselines.push(sample(1, 10, 0, 400.0));
        inputs.periods[0].period_range = TimeRange::half_open(bin(7, 0), bin(10, 0));

        let rows = aggregate(&inputs);
        assert!((rows[0].tt - 5.0).abs() < 1e-9);

        inputs.periods[0].period_range = TimeRange::closed(bin(7, 0), bin(10, 0));
        let rows = aggregate(&inputs);
        // segment 1 average becomes (100 + 140 + 400) / 3
        assert!((rows[0].tt - (640.0 / 3.0 + 180.0) / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_rows_ordered_by_corridor() {
        let mut inputs = main_st_inputs();
        inputs.baselines.push(sample(3, 8, 0, 60.0));
        inputs.segments.push(segment(3));
        inputs.corridor_segments.insert(0, member(3, 9));
        inputs.corridors.insert(0, corridor(9, 1));

        let ids: Vec<_> = aggregate(&inputs).iter().map(|r| r.corridor_id).collect();
        assert_eq!(ids, vec![1, 9]);
    }

    #[test]
    fn test_shared_segment_joins_each_corridor_and_unknown_corridor_drops() {
        let inputs = BaselineInputs {
            baselines: vec![
                sample(1, 8, 0, 120.0),
                sample(2, 8, 0, 180.0),
                sample(3, 8, 0, 60.0),
            ],
            periods: vec![am_peak()],
            segments: vec![segment(1), segment(2), segment(3)],
            corridor_segments: vec![
                member(1, 1),
                member(2, 1),
                member(1, 2),
                member(3, 99),
            ],
            corridors: vec![corridor(1, 2), corridor(2, 1)],
        };

        let rows = aggregate(&inputs);
        let summary: Vec<_> = rows.iter().map(|r| (r.corridor_id, r.tt)).collect();
        assert_eq!(summary, vec![(1, 5.0), (2, 2.0)]);
        assert!(incomplete_groups(&inputs).is_empty());
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let inputs = main_st_inputs();
        assert_eq!(aggregate(&inputs), aggregate(&inputs));
    }
}
