use crate::config::TrackerConfig;

use super::{PlaybackState, Segment, WatchProgress};

/// Closed segment durations plus the open interval's length so far.
pub fn total_watch_time(segments: &[Segment], state: PlaybackState) -> f64 {
    let closed: f64 = segments.iter().map(Segment::duration).sum();
    let open = match state {
        PlaybackState::Recording {
            start,
            last_position,
        } => (last_position - start).max(0.0),
        PlaybackState::Idle => 0.0,
    };
    closed + open
}

/// `floor(total / duration * 100)`, or 0 when the duration is unusable.
///
/// Not clamped: an under-reported duration can yield values above 100.
pub fn percent_of(total_watch_time: f64, video_duration: f64) -> i64 {
    if !video_duration.is_finite() || video_duration <= 0.0 {
        return 0;
    }
    (total_watch_time * 100.0 / video_duration).floor() as i64
}

pub(super) fn recompute(progress: &mut WatchProgress, config: &TrackerConfig) {
    let mut total = total_watch_time(&progress.watch_segments, progress.state);
    if let Some(window) = config.completion_snap
        && progress.video_duration.is_finite()
        && (progress.video_duration - total).abs() < window
    {
        total = progress.video_duration;
    }
    progress.total_watch_time = total;
    progress.percent_watched = percent_of(total, progress.video_duration);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_include_open_interval() {
        let segments = [Segment::new(0.0, 5.0), Segment::new(10.0, 12.5)];
        assert_eq!(total_watch_time(&segments, PlaybackState::Idle), 7.5);
        let recording = PlaybackState::Recording {
            start: 20.0,
            last_position: 24.0,
        };
        assert_eq!(total_watch_time(&segments, recording), 11.5);
    }

    #[test]
    fn backward_jitter_does_not_make_open_interval_negative() {
        let recording = PlaybackState::Recording {
            start: 5.0,
            last_position: 4.9,
        };
        assert_eq!(total_watch_time(&[], recording), 0.0);
    }

    #[test]
    fn percent_floors() {
        assert_eq!(percent_of(5.0, 100.0), 5);
        assert_eq!(percent_of(6.99, 100.0), 6);
        assert_eq!(percent_of(23.0, 45.0), 51);
    }

    #[test]
    fn percent_is_zero_for_unusable_duration() {
        assert_eq!(percent_of(10.0, 0.0), 0);
        assert_eq!(percent_of(10.0, -4.0), 0);
        assert_eq!(percent_of(10.0, f64::INFINITY), 0);
        assert_eq!(percent_of(10.0, f64::NAN), 0);
    }

    #[test]
    fn percent_is_not_clamped_above_one_hundred() {
        assert_eq!(percent_of(105.0, 100.0), 105);
    }
}
