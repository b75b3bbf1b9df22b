use anyhow::Result;
use ratatui::widgets::TableState;
use watchtrack::Tracker;

use crate::db::{Database, StoredProgress};

pub(super) fn select_after_refresh(
    items: &[StoredProgress],
    table_state: &mut TableState,
    preferred: Option<(&str, &str)>,
) {
    if items.is_empty() {
        table_state.select(None);
        return;
    }

    if let Some((project_id, skill_id)) = preferred
        && let Some(idx) = items
            .iter()
            .position(|item| item.project_id == project_id && item.skill_id == skill_id)
    {
        table_state.select(Some(idx));
        return;
    }

    match table_state.selected() {
        Some(selected) => table_state.select(Some(selected.min(items.len() - 1))),
        None => table_state.select(Some(0)),
    }
}

pub(super) fn status_info(msg: &str) -> String {
    format!("INFO: {msg}")
}

pub(super) fn status_error(msg: &str) -> String {
    format!("ERROR: {msg}")
}

/// Closes the open interval of `item` and persists the finalized record.
pub(super) fn finish_selected(
    db: &Database,
    tracker: &Tracker,
    item: &StoredProgress,
) -> Result<String> {
    let progress = item.restore(tracker);
    if !progress.is_recording() {
        return Ok(format!(
            "{}/{} has no open interval.",
            item.project_id, item.skill_id
        ));
    }
    let finished = tracker.finish(&progress);
    db.upsert_progress(&item.project_id, &item.skill_id, &finished)?;
    Ok(format!(
        "Closed open interval for {}/{}: {}% watched.",
        item.project_id,
        item.skill_id,
        finished.percent_watched()
    ))
}
