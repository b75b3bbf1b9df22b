use crate::config::TrackerConfig;

use super::{PlaybackState, Segment, Tracker, WatchProgress, aggregate, merge, normalize_time};

/// Returns `progress` advanced by one playback-position sample.
pub fn update_progress(progress: &WatchProgress, current_time: f64) -> WatchProgress {
    Tracker::default().update(progress, current_time)
}

pub(super) fn apply_sample(progress: &mut WatchProgress, current_time: f64, config: &TrackerConfig) {
    let current_time = normalize_time(current_time);
    progress.current_position = current_time;

    if merge::contains(&progress.watch_segments, current_time, config) {
        // Caught up with recorded history; totals already count this territory.
        if close_open_interval(progress, config) {
            tracing::trace!(current_time, "closed interval on known territory");
        }
        return;
    }

    if let Some(index) = rejoin_candidate(&progress.watch_segments, current_time, config) {
        let rejoined = progress.watch_segments.remove(index);
        close_open_interval(progress, config);
        progress.state = PlaybackState::Recording {
            start: rejoined.start,
            last_position: current_time,
        };
        tracing::trace!(
            current_time,
            start = rejoined.start,
            stop = rejoined.stop,
            "rejoined recorded segment"
        );
    } else {
        let state = progress.state;
        progress.state = match state {
            PlaybackState::Idle => {
                tracing::trace!(current_time, "opened interval");
                PlaybackState::Recording {
                    start: opening_start(current_time, config),
                    last_position: current_time,
                }
            }
            // A last position of 0 is never a seek origin: the first move
            // away from the very start extends the interval.
            PlaybackState::Recording { last_position, .. }
                if last_position != 0.0
                    && (last_position - current_time).abs() > config.seek_threshold =>
            {
                close_open_interval(progress, config);
                tracing::trace!(from = last_position, to = current_time, "seek");
                PlaybackState::Recording {
                    start: opening_start(current_time, config),
                    last_position: current_time,
                }
            }
            PlaybackState::Recording { start, .. } => PlaybackState::Recording {
                start,
                last_position: current_time,
            },
        };
    }

    aggregate::recompute(progress, config);
}

/// Where an interval opened at `time` starts: anything before the start
/// clamp counts from 0.
pub(super) fn opening_start(time: f64, config: &TrackerConfig) -> f64 {
    if time < config.start_clamp { 0.0 } else { time }
}

/// The segment an open interval becomes once it is closed.
pub(super) fn open_segment(start: f64, last_position: f64, config: &TrackerConfig) -> Segment {
    Segment::new(opening_start(start, config), last_position)
}

/// Merges the open interval into the segment list and goes idle.
///
/// Returns whether an interval was open.
pub(super) fn close_open_interval(progress: &mut WatchProgress, config: &TrackerConfig) -> bool {
    let PlaybackState::Recording {
        start,
        last_position,
    } = progress.state
    else {
        return false;
    };
    let closed = open_segment(start, last_position, config);
    progress.watch_segments = merge::merge(&progress.watch_segments, closed, config);
    progress.state = PlaybackState::Idle;
    true
}

/// Index of a segment whose stop lies just before `current_time`.
fn rejoin_candidate(segments: &[Segment], current_time: f64, config: &TrackerConfig) -> Option<usize> {
    segments.iter().position(|segment| {
        let gap = current_time - segment.stop;
        gap > 0.0 && gap < config.rejoin_window
    })
}
