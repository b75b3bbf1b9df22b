//! Watch-progress tracking for video playback.
//!
//! The [`tracker`] module turns a stream of playback-position samples into a
//! minimal set of watched intervals and derives the total watched time and the
//! percentage of the video watched. [`config`] holds the tolerance policy.

pub mod config;
pub mod tracker;

pub use config::TrackerConfig;
pub use tracker::{
    PlaybackState, Segment, Tracker, WatchProgress, add_to_segments, is_time_in_segments,
    update_progress,
};
