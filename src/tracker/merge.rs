use crate::config::TrackerConfig;

use super::Segment;
use super::interval::{contains_time, does_cover, does_overlap, is_less_or_equal, is_within};

/// Whether `time` falls inside any recorded segment.
///
/// An empty list never contains anything.
pub fn is_time_in_segments(segments: &[Segment], time: f64) -> bool {
    contains(segments, time, &TrackerConfig::default())
}

/// Inserts `candidate` into a sorted, non-overlapping list and returns the
/// minimal sorted, non-overlapping cover of both. `segments` is not modified.
pub fn add_to_segments(segments: &[Segment], candidate: Segment) -> Vec<Segment> {
    merge(segments, candidate, &TrackerConfig::default())
}

pub(super) fn contains(segments: &[Segment], time: f64, config: &TrackerConfig) -> bool {
    segments
        .iter()
        .any(|segment| contains_time(segment, time, config.membership_epsilon))
}

pub(super) fn merge(segments: &[Segment], candidate: Segment, config: &TrackerConfig) -> Vec<Segment> {
    let epsilon = config.membership_epsilon;
    let mut copy = segments.to_vec();

    let found = copy.iter_mut().find(|existing| {
        does_overlap(existing, &candidate, epsilon) || does_cover(existing, &candidate)
    });
    match found {
        Some(existing) => {
            if !is_within(existing, &candidate, epsilon) {
                existing.start = existing.start.min(candidate.start);
                existing.stop = existing.stop.max(candidate.stop);
            }
        }
        None => copy.push(candidate),
    }

    copy.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut merged: Vec<Segment> = Vec::with_capacity(copy.len());
    for segment in copy {
        match merged.last_mut() {
            Some(previous) if is_less_or_equal(segment.start, previous.stop, config.adjacency_gap) => {
                previous.stop = previous.stop.max(segment.stop);
            }
            _ => merged.push(segment),
        }
    }

    if merged.len() < segments.len() + 1 {
        tracing::debug!(
            before = segments.len(),
            after = merged.len(),
            start = candidate.start,
            stop = candidate.stop,
            "merged watched segment"
        );
    }
    merged
}
