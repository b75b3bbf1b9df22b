use chrono::{DateTime, Local};
use watchtrack::Segment;

pub(crate) fn truncate(s: &str, max: usize) -> String {
    let mut out = s.to_string();
    if out.chars().count() > max {
        out = out.chars().take(max.saturating_sub(3)).collect::<String>() + "...";
    }
    out
}

/// `m:ss`, or `h:mm:ss` from one hour up. Fractions are dropped.
pub(crate) fn format_seconds(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

pub(crate) fn format_segment(segment: &Segment) -> String {
    format!(
        "{} - {}",
        format_seconds(segment.start),
        format_seconds(segment.stop)
    )
}

pub(crate) fn format_segments(segments: &[Segment]) -> String {
    if segments.is_empty() {
        return "-".to_string();
    }
    segments
        .iter()
        .map(format_segment)
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn format_updated_display(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| {
            dt.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M %:z")
                .to_string()
        })
        .unwrap_or_else(|_| raw.to_string())
}

pub(crate) fn format_updated_display_tui(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// One character per cell of the video: `█` where any watched segment
/// touches the cell, `░` elsewhere.
pub(crate) fn segment_timeline(segments: &[Segment], duration: f64, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    if !duration.is_finite() || duration <= 0.0 {
        return "░".repeat(width);
    }
    let cell = duration / width as f64;
    (0..width)
        .map(|idx| {
            let cell_start = idx as f64 * cell;
            let cell_stop = cell_start + cell;
            let watched = segments
                .iter()
                .any(|segment| segment.start < cell_stop && segment.stop > cell_start);
            if watched { '█' } else { '░' }
        })
        .collect()
}

pub(crate) fn build_progress_gauge(percent_watched: i64) -> (f64, String) {
    let ratio = (percent_watched as f64 / 100.0).clamp(0.0, 1.0);
    (ratio, format!("{percent_watched}%"))
}
