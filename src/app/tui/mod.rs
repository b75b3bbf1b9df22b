mod actions;
mod render;
mod session;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::TableState;
use watchtrack::{Tracker, TrackerConfig};

use crate::db::{Database, StoredProgress};

use self::actions::{finish_selected, select_after_refresh, status_error, status_info};
use self::render::draw_tui;
use self::session::TerminalGuard;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct PendingDelete {
    pub(super) project_id: String,
    pub(super) skill_id: String,
}

impl PendingDelete {
    pub(super) fn label(&self) -> String {
        format!("{}/{}", self.project_id, self.skill_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Everything the dashboard draws, plus the tracker used to rebuild records.
pub(super) struct Dashboard {
    pub(super) items: Vec<StoredProgress>,
    pub(super) table_state: TableState,
    pub(super) pending_delete: Option<PendingDelete>,
    pub(super) status: String,
    pub(super) tracker: Tracker,
}

impl Dashboard {
    fn load(db: &Database, tracker: Tracker) -> Result<Self> {
        let items = db.list_progress()?;
        let mut table_state = TableState::default();
        table_state.select((!items.is_empty()).then_some(0));
        let status = if items.is_empty() {
            status_info("No tracked videos yet. Run `watchtrack record` to add one.")
        } else {
            status_info("Ready.")
        };
        Ok(Self {
            items,
            table_state,
            pending_delete: None,
            status,
            tracker,
        })
    }

    pub(super) fn selected(&self) -> Option<&StoredProgress> {
        self.table_state
            .selected()
            .and_then(|idx| self.items.get(idx))
    }

    fn selected_key(&self) -> Option<(String, String)> {
        self.selected()
            .map(|item| (item.project_id.clone(), item.skill_id.clone()))
    }

    fn move_selection(&mut self, delta: isize) {
        if self.items.is_empty() {
            self.table_state.select(None);
            return;
        }
        let last = self.items.len() - 1;
        let current = self.table_state.selected().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(last);
        self.table_state.select(Some(next));
    }

    fn reload(&mut self, db: &Database, preferred: Option<(String, String)>) -> Result<()> {
        self.items = db.list_progress()?;
        let preferred = preferred
            .as_ref()
            .map(|(project, skill)| (project.as_str(), skill.as_str()));
        select_after_refresh(&self.items, &mut self.table_state, preferred);
        Ok(())
    }

    fn handle_key(&mut self, db: &Database, code: KeyCode) -> Result<Flow> {
        if let Some(dialog) = self.pending_delete.take() {
            self.confirm_delete(db, dialog, code)?;
            return Ok(Flow::Continue);
        }

        match code {
            KeyCode::Char('q') => return Ok(Flow::Quit),
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Char('r') => {
                self.reload(db, self.selected_key())?;
                self.status = status_info(&format!("Reloaded {} tracked videos.", self.items.len()));
            }
            KeyCode::Char('d') => match self.selected_key() {
                Some((project_id, skill_id)) => {
                    self.pending_delete = Some(PendingDelete {
                        project_id,
                        skill_id,
                    });
                    self.status =
                        status_info("Confirm delete: y/Enter to delete, n/Esc to cancel.");
                }
                None => self.status = status_error("Delete failed: no video selected."),
            },
            KeyCode::Char('f') | KeyCode::Enter => {
                let Some(item) = self.selected() else {
                    return Ok(Flow::Continue);
                };
                let key = (item.project_id.clone(), item.skill_id.clone());
                self.status = match finish_selected(db, &self.tracker, item) {
                    Ok(msg) => status_info(&msg),
                    Err(err) => {
                        status_error(&format!("Finish failed for {}/{}: {err}", key.0, key.1))
                    }
                };
                self.reload(db, Some(key))?;
            }
            _ => {}
        }
        Ok(Flow::Continue)
    }

    fn confirm_delete(
        &mut self,
        db: &Database,
        dialog: PendingDelete,
        code: KeyCode,
    ) -> Result<()> {
        match code {
            KeyCode::Char('y') | KeyCode::Enter => {
                match db.delete_progress(&dialog.project_id, &dialog.skill_id) {
                    Ok(true) => {
                        self.status = status_info(&format!("Deleted progress for {}", dialog.label()));
                        self.reload(db, None)?;
                    }
                    Ok(false) => {
                        self.status = status_error("Delete failed: record no longer exists.");
                        self.reload(db, None)?;
                    }
                    Err(err) => self.status = status_error(&format!("Delete failed: {err}")),
                }
            }
            KeyCode::Esc | KeyCode::Char('n') => self.status = status_info("Delete canceled."),
            _ => self.pending_delete = Some(dialog),
        }
        Ok(())
    }
}

pub(crate) fn run_tui(db: &Database) -> Result<()> {
    let mut dashboard = Dashboard::load(db, Tracker::new(TrackerConfig::from_env()))?;
    let guard = TerminalGuard::acquire()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .context("failed to initialize terminal backend")?;
    terminal.clear()?;

    loop {
        terminal.draw(|frame| draw_tui(frame, &mut dashboard))?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if dashboard.handle_key(db, key.code)? == Flow::Quit {
            break;
        }
    }

    terminal.show_cursor()?;
    guard.restore()
}
