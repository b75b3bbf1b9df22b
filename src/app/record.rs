use anyhow::{Result, anyhow};
use watchtrack::{Tracker, WatchProgress};

use super::report::should_report;
use crate::db::Database;

#[derive(Debug, Clone)]
pub(crate) struct RecordRequest<'a> {
    pub(crate) project_id: &'a str,
    pub(crate) skill_id: &'a str,
    pub(crate) duration: Option<f64>,
    pub(crate) samples: &'a [f64],
    pub(crate) finish: bool,
    pub(crate) report_at: Option<i64>,
}

#[derive(Debug, Clone)]
pub(crate) struct RecordOutcome {
    pub(crate) progress: WatchProgress,
    pub(crate) previous_percent: i64,
    pub(crate) created: bool,
    pub(crate) report_due: bool,
    pub(crate) warnings: Vec<String>,
}

/// Folds `request.samples` into the stored record and persists the result.
pub(crate) fn record_samples(
    db: &Database,
    tracker: &Tracker,
    request: &RecordRequest<'_>,
) -> Result<RecordOutcome> {
    let mut warnings = Vec::new();
    let stored = db.load_progress(request.project_id, request.skill_id)?;
    let already_reported = stored
        .as_ref()
        .is_some_and(|item| item.reported_at.is_some());

    let (progress, created) = match &stored {
        Some(item) => {
            if let Some(duration) = request.duration
                && (duration - item.video_duration).abs() > f64::EPSILON
            {
                warnings.push(format!(
                    "ignoring --duration {duration}; {}/{} keeps its recorded duration of {}",
                    request.project_id, request.skill_id, item.video_duration
                ));
            }
            (item.restore(tracker), false)
        }
        None => {
            let duration = request.duration.ok_or_else(|| {
                anyhow!(
                    "no progress recorded yet for {}/{}; pass --duration to start tracking",
                    request.project_id,
                    request.skill_id
                )
            })?;
            if !duration.is_finite() || duration <= 0.0 {
                warnings.push(format!(
                    "duration {duration} is not a positive number of seconds; percent watched will stay at 0"
                ));
            }
            (WatchProgress::new(duration), true)
        }
    };

    let previous_percent = progress.percent_watched();
    let mut next = tracker.update_all(&progress, request.samples.iter().copied());
    if request.finish {
        next = tracker.finish(&next);
    }
    db.upsert_progress(request.project_id, request.skill_id, &next)?;
    tracing::debug!(
        project = request.project_id,
        skill = request.skill_id,
        samples = request.samples.len(),
        percent = next.percent_watched(),
        "recorded samples"
    );

    let report_due = request.report_at.is_some_and(|threshold| {
        should_report(next.percent_watched(), threshold, already_reported)
    });

    Ok(RecordOutcome {
        progress: next,
        previous_percent,
        created,
        report_due,
        warnings,
    })
}
