pub mod aggregate;
pub mod interval;
mod merge;
mod session;


use crate::config::TrackerConfig;

pub use merge::{add_to_segments, is_time_in_segments};
pub use session::update_progress;

/// A closed interval of playback time known to have been watched, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: f64,
    pub stop: f64,
}

impl Segment {
    /// Negative or non-finite bounds become 0 and reversed bounds are swapped.
    pub fn new(start: f64, stop: f64) -> Self {
        let start = normalize_time(start);
        let stop = normalize_time(stop);
        if stop < start {
            Self {
                start: stop,
                stop: start,
            }
        } else {
            Self { start, stop }
        }
    }

    pub fn duration(&self) -> f64 {
        self.stop - self.start
    }
}

/// Whether an interval is currently being recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackState {
    Idle,
    Recording { start: f64, last_position: f64 },
}

impl PlaybackState {
    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording { .. })
    }
}

/// Watch progress of one viewer on one video.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchProgress {
    video_duration: f64,
    watch_segments: Vec<Segment>,
    state: PlaybackState,
    current_position: f64,
    total_watch_time: f64,
    percent_watched: i64,
}

impl WatchProgress {
    pub fn new(video_duration: f64) -> Self {
        Self {
            video_duration,
            watch_segments: Vec::new(),
            state: PlaybackState::Idle,
            current_position: 0.0,
            total_watch_time: 0.0,
            percent_watched: 0,
        }
    }

    /// Rebuilds a persisted record.
    ///
    /// `segments` are folded through the merger so the result is sorted and
    /// compacted whatever order they were stored in. Aggregates are recomputed.
    pub fn restore(
        video_duration: f64,
        segments: impl IntoIterator<Item = Segment>,
        state: PlaybackState,
        current_position: f64,
    ) -> Self {
        Tracker::default().restore(video_duration, segments, state, current_position)
    }

    pub fn video_duration(&self) -> f64 {
        self.video_duration
    }

    pub fn watch_segments(&self) -> &[Segment] {
        &self.watch_segments
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_start(&self) -> Option<f64> {
        match self.state {
            PlaybackState::Recording { start, .. } => Some(start),
            PlaybackState::Idle => None,
        }
    }

    pub fn last_known_position(&self) -> Option<f64> {
        match self.state {
            PlaybackState::Recording { last_position, .. } => Some(last_position),
            PlaybackState::Idle => None,
        }
    }

    pub fn current_position(&self) -> f64 {
        self.current_position
    }

    pub fn total_watch_time(&self) -> f64 {
        self.total_watch_time
    }

    pub fn percent_watched(&self) -> i64 {
        self.percent_watched
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, PlaybackState::Recording { .. })
    }

    /// Closed segments with the open interval merged in.
    pub fn watched_segments(&self) -> Vec<Segment> {
        Tracker::default().watched_segments(self)
    }

    /// Closes the open interval, if any, and returns the finalized record.
    pub fn finish(&self) -> Self {
        Tracker::default().finish(self)
    }
}

/// Applies a [`TrackerConfig`] to watch progress records.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tracker {
    config: TrackerConfig,
}

impl Tracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self { config }
    }

    pub fn update(&self, progress: &WatchProgress, current_time: f64) -> WatchProgress {
        let mut next = progress.clone();
        session::apply_sample(&mut next, current_time, &self.config);
        next
    }

    /// Folds a sequence of samples, one [`Tracker::update`] per sample.
    pub fn update_all<I>(&self, progress: &WatchProgress, samples: I) -> WatchProgress
    where
        I: IntoIterator<Item = f64>,
    {
        let mut next = progress.clone();
        for sample in samples {
            session::apply_sample(&mut next, sample, &self.config);
        }
        next
    }

    pub fn is_time_in_segments(&self, segments: &[Segment], time: f64) -> bool {
        merge::contains(segments, time, &self.config)
    }

    pub fn add_to_segments(&self, segments: &[Segment], candidate: Segment) -> Vec<Segment> {
        merge::merge(segments, candidate, &self.config)
    }

    pub fn restore(
        &self,
        video_duration: f64,
        segments: impl IntoIterator<Item = Segment>,
        state: PlaybackState,
        current_position: f64,
    ) -> WatchProgress {
        let watch_segments = segments
            .into_iter()
            .fold(Vec::new(), |acc, segment| {
                merge::merge(&acc, Segment::new(segment.start, segment.stop), &self.config)
            });
        let state = match state {
            PlaybackState::Recording {
                start,
                last_position,
            } => PlaybackState::Recording {
                start: session::opening_start(normalize_time(start), &self.config),
                last_position: normalize_time(last_position),
            },
            PlaybackState::Idle => PlaybackState::Idle,
        };
        let mut progress = WatchProgress {
            video_duration,
            watch_segments,
            state,
            current_position: normalize_time(current_position),
            total_watch_time: 0.0,
            percent_watched: 0,
        };
        aggregate::recompute(&mut progress, &self.config);
        progress
    }

    pub fn watched_segments(&self, progress: &WatchProgress) -> Vec<Segment> {
        match progress.state {
            PlaybackState::Recording {
                start,
                last_position,
            } => merge::merge(
                &progress.watch_segments,
                session::open_segment(start, last_position, &self.config),
                &self.config,
            ),
            PlaybackState::Idle => progress.watch_segments.clone(),
        }
    }

    pub fn finish(&self, progress: &WatchProgress) -> WatchProgress {
        let mut next = progress.clone();
        if session::close_open_interval(&mut next, &self.config) {
            aggregate::recompute(&mut next, &self.config);
        }
        next
    }
}

/// Clamps negative and non-finite times to 0.
pub(crate) fn normalize_time(time: f64) -> f64 {
    if time.is_finite() && time > 0.0 {
        time
    } else {
        0.0
    }
}
