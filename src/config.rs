use std::env;

/// Slack used by membership and overlap tests, in seconds.
pub const MEMBERSHIP_EPSILON: f64 = 0.2;
/// Segments closer than this after insertion are fused into one.
pub const ADJACENCY_GAP: f64 = 2.0;
/// A jump from the last known position larger than this is treated as a seek.
pub const SEEK_THRESHOLD: f64 = 1.2;
/// A sample this close past a segment's stop continues that segment.
pub const REJOIN_WINDOW: f64 = 2.0;
/// Open intervals starting earlier than this are recorded from 0.
pub const START_CLAMP: f64 = 1.0;

const ENV_EPSILON: &str = "WATCHTRACK_EPSILON";
const ENV_ADJACENCY_GAP: &str = "WATCHTRACK_ADJACENCY_GAP";
const ENV_SEEK_THRESHOLD: &str = "WATCHTRACK_SEEK_THRESHOLD";
const ENV_REJOIN_WINDOW: &str = "WATCHTRACK_REJOIN_WINDOW";
const ENV_START_CLAMP: &str = "WATCHTRACK_START_CLAMP";
const ENV_COMPLETION_SNAP: &str = "WATCHTRACK_COMPLETION_SNAP";

/// Tolerance policy for the tracker.
///
/// These are policy values rather than derived ones; the defaults match the
/// constants above.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    pub membership_epsilon: f64,
    pub adjacency_gap: f64,
    pub seek_threshold: f64,
    pub rejoin_window: f64,
    pub start_clamp: f64,
    /// When set, a total within this many seconds of the video duration is
    /// reported as the full duration.
    pub completion_snap: Option<f64>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            membership_epsilon: MEMBERSHIP_EPSILON,
            adjacency_gap: ADJACENCY_GAP,
            seek_threshold: SEEK_THRESHOLD,
            rejoin_window: REJOIN_WINDOW,
            start_clamp: START_CLAMP,
            completion_snap: None,
        }
    }
}

impl TrackerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from `WATCHTRACK_*` values returned by `lookup`.
    ///
    /// Values that do not parse as a finite positive number are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |key: &str, fallback: f64| -> f64 {
            lookup(key)
                .and_then(|raw| parse_positive(key, &raw))
                .unwrap_or(fallback)
        };

        Self {
            membership_epsilon: read(ENV_EPSILON, defaults.membership_epsilon),
            adjacency_gap: read(ENV_ADJACENCY_GAP, defaults.adjacency_gap),
            seek_threshold: read(ENV_SEEK_THRESHOLD, defaults.seek_threshold),
            rejoin_window: read(ENV_REJOIN_WINDOW, defaults.rejoin_window),
            start_clamp: read(ENV_START_CLAMP, defaults.start_clamp),
            completion_snap: lookup(ENV_COMPLETION_SNAP)
                .and_then(|raw| parse_positive(ENV_COMPLETION_SNAP, &raw)),
        }
    }

    pub fn with_completion_snap(mut self, window: Option<f64>) -> Self {
        self.completion_snap = window.filter(|w| w.is_finite() && *w > 0.0);
        self
    }
}

fn parse_positive(key: &str, raw: &str) -> Option<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Some(value),
        _ => {
            tracing::warn!(key, value = raw, "ignoring invalid tolerance override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = TrackerConfig::from_lookup(|_| None);
        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.membership_epsilon, 0.2);
        assert_eq!(config.adjacency_gap, 2.0);
        assert_eq!(config.seek_threshold, 1.2);
        assert_eq!(config.completion_snap, None);
    }

    #[test]
    fn overrides_are_applied() {
        let config = TrackerConfig::from_lookup(lookup_from(&[
            ("WATCHTRACK_SEEK_THRESHOLD", "3.5"),
            ("WATCHTRACK_ADJACENCY_GAP", " 1 "),
            ("WATCHTRACK_COMPLETION_SNAP", "1"),
        ]));
        assert_eq!(config.seek_threshold, 3.5);
        assert_eq!(config.adjacency_gap, 1.0);
        assert_eq!(config.completion_snap, Some(1.0));
        assert_eq!(config.membership_epsilon, MEMBERSHIP_EPSILON);
    }

    #[test]
    fn invalid_overrides_keep_defaults() {
        let config = TrackerConfig::from_lookup(lookup_from(&[
            ("WATCHTRACK_EPSILON", "abc"),
            ("WATCHTRACK_REJOIN_WINDOW", "-2"),
            ("WATCHTRACK_START_CLAMP", "NaN"),
            ("WATCHTRACK_COMPLETION_SNAP", "0"),
        ]));
        assert_eq!(config, TrackerConfig::default());
    }

    #[test]
    fn completion_snap_rejects_non_positive_windows() {
        let config = TrackerConfig::default().with_completion_snap(Some(0.0));
        assert_eq!(config.completion_snap, None);
        let config = TrackerConfig::default().with_completion_snap(Some(0.5));
        assert_eq!(config.completion_snap, Some(0.5));
    }
}
