use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde_json::{Value, json};
use watchtrack::{PlaybackState, Segment, Tracker, WatchProgress};

#[derive(Debug, Clone, PartialEq)]
pub struct StoredProgress {
    pub project_id: String,
    pub skill_id: String,
    pub video_duration: f64,
    pub segments: Vec<Segment>,
    pub state: PlaybackState,
    pub current_position: f64,
    pub total_watch_time: f64,
    pub percent_watched: i64,
    pub reported_at: Option<String>,
    pub updated_at: String,
}

impl StoredProgress {
    pub fn restore(&self, tracker: &Tracker) -> WatchProgress {
        tracker.restore(
            self.video_duration,
            self.segments.iter().copied(),
            self.state,
            self.current_position,
        )
    }
}

pub struct Database {
    conn: Connection,
}

const SELECT_COLUMNS: &str = "project_id, skill_id, video_duration, segments, open_start, open_last, current_position, total_watch_time, percent_watched, reported_at, updated_at";

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Ok(Self { conn })
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS watch_progress (
                project_id TEXT NOT NULL,
                skill_id TEXT NOT NULL,
                video_duration REAL NOT NULL,
                segments TEXT NOT NULL,
                open_start REAL,
                open_last REAL,
                current_position REAL NOT NULL,
                total_watch_time REAL NOT NULL,
                percent_watched INTEGER NOT NULL,
                reported_at TEXT,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (project_id, skill_id)
            );
            CREATE INDEX IF NOT EXISTS idx_watch_progress_updated_at ON watch_progress(updated_at DESC);
            "#,
        )?;
        Ok(())
    }

    pub fn upsert_progress(
        &self,
        project_id: &str,
        skill_id: &str,
        progress: &WatchProgress,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let segments = encode_segments(progress.watch_segments());
        self.conn.execute(
            r#"
            INSERT INTO watch_progress (
                project_id, skill_id, video_duration, segments, open_start, open_last,
                current_position, total_watch_time, percent_watched, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(project_id, skill_id) DO UPDATE SET
                segments = excluded.segments,
                open_start = excluded.open_start,
                open_last = excluded.open_last,
                current_position = excluded.current_position,
                total_watch_time = excluded.total_watch_time,
                percent_watched = excluded.percent_watched,
                updated_at = excluded.updated_at
            "#,
            params![
                project_id,
                skill_id,
                progress.video_duration(),
                segments,
                progress.current_start(),
                progress.last_known_position(),
                progress.current_position(),
                progress.total_watch_time(),
                progress.percent_watched(),
                now
            ],
        )?;
        Ok(())
    }

    pub fn load_progress(&self, project_id: &str, skill_id: &str) -> Result<Option<StoredProgress>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM watch_progress WHERE project_id = ?1 AND skill_id = ?2"
        );
        let raw = self
            .conn
            .query_row(&sql, params![project_id, skill_id], RawRow::from_row)
            .optional()?;
        raw.map(RawRow::into_stored).transpose()
    }

    pub fn list_progress(&self) -> Result<Vec<StoredProgress>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM watch_progress ORDER BY updated_at DESC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], RawRow::from_row)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?.into_stored()?);
        }
        Ok(out)
    }

    pub fn delete_progress(&self, project_id: &str, skill_id: &str) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM watch_progress WHERE project_id = ?1 AND skill_id = ?2",
            params![project_id, skill_id],
        )?;
        Ok(deleted > 0)
    }

    pub fn mark_reported(&self, project_id: &str, skill_id: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE watch_progress SET reported_at = ?3 WHERE project_id = ?1 AND skill_id = ?2",
            params![project_id, skill_id, now],
        )?;
        Ok(())
    }
}

struct RawRow {
    project_id: String,
    skill_id: String,
    video_duration: f64,
    segments: String,
    open_start: Option<f64>,
    open_last: Option<f64>,
    current_position: f64,
    total_watch_time: f64,
    percent_watched: i64,
    reported_at: Option<String>,
    updated_at: String,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            project_id: row.get(0)?,
            skill_id: row.get(1)?,
            video_duration: row.get(2)?,
            segments: row.get(3)?,
            open_start: row.get(4)?,
            open_last: row.get(5)?,
            current_position: row.get(6)?,
            total_watch_time: row.get(7)?,
            percent_watched: row.get(8)?,
            reported_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn into_stored(self) -> Result<StoredProgress> {
        let segments = decode_segments(&self.segments).with_context(|| {
            format!(
                "invalid stored segments for {}/{}",
                self.project_id, self.skill_id
            )
        })?;
        let state = match (self.open_start, self.open_last) {
            (Some(start), Some(last_position)) => PlaybackState::Recording {
                start,
                last_position,
            },
            (Some(start), None) => PlaybackState::Recording {
                start,
                last_position: start,
            },
            _ => PlaybackState::Idle,
        };
        Ok(StoredProgress {
            project_id: self.project_id,
            skill_id: self.skill_id,
            video_duration: self.video_duration,
            segments,
            state,
            current_position: self.current_position,
            total_watch_time: self.total_watch_time,
            percent_watched: self.percent_watched,
            reported_at: self.reported_at,
            updated_at: self.updated_at,
        })
    }
}

pub(crate) fn encode_segments(segments: &[Segment]) -> String {
    let items: Vec<Value> = segments
        .iter()
        .map(|segment| json!({ "start": segment.start, "stop": segment.stop }))
        .collect();
    Value::Array(items).to_string()
}

pub(crate) fn decode_segments(raw: &str) -> Result<Vec<Segment>> {
    let parsed: Value = serde_json::from_str(raw).context("segments are not valid JSON")?;
    let items = parsed
        .as_array()
        .ok_or_else(|| anyhow!("segments must be a JSON array"))?;
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let start = item.get("start").and_then(Value::as_f64);
            let stop = item.get("stop").and_then(Value::as_f64);
            match (start, stop) {
                (Some(start), Some(stop)) => Ok(Segment::new(start, stop)),
                _ => Err(anyhow!("segment {idx} is missing a numeric start/stop")),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        let db = Database::open_in_memory().expect("open db");
        db.migrate().expect("migrate");
        db
    }

    fn sample_progress() -> WatchProgress {
        let tracker = Tracker::default();
        let progress = tracker.update_all(&WatchProgress::new(120.0), (0..=10).map(f64::from));
        tracker.update_all(&progress, (40..=45).map(f64::from))
    }

    #[test]
    fn migrate_is_idempotent() {
        let db = test_db();
        db.migrate().expect("second migrate");
        assert!(db.list_progress().expect("list").is_empty());
    }

    #[test]
    fn upsert_then_load_restores_progress() {
        let db = test_db();
        let progress = sample_progress();
        db.upsert_progress("proj", "skill-1", &progress)
            .expect("upsert");

        let stored = db
            .load_progress("proj", "skill-1")
            .expect("load")
            .expect("row should exist");
        assert_eq!(stored.video_duration, 120.0);
        assert_eq!(stored.segments, vec![Segment::new(0.0, 10.0)]);
        assert_eq!(
            stored.state,
            PlaybackState::Recording {
                start: 40.0,
                last_position: 45.0
            }
        );
        assert_eq!(stored.percent_watched, progress.percent_watched());
        assert_eq!(stored.reported_at, None);
        assert_eq!(stored.restore(&Tracker::default()), progress);
    }

    #[test]
    fn upsert_keeps_original_duration() {
        let db = test_db();
        db.upsert_progress("proj", "skill-1", &WatchProgress::new(60.0))
            .expect("first upsert");
        db.upsert_progress("proj", "skill-1", &WatchProgress::new(90.0))
            .expect("second upsert");
        let stored = db
            .load_progress("proj", "skill-1")
            .expect("load")
            .expect("row should exist");
        assert_eq!(stored.video_duration, 60.0);
    }

    #[test]
    fn load_missing_returns_none() {
        let db = test_db();
        assert!(db.load_progress("proj", "nope").expect("load").is_none());
    }

    #[test]
    fn delete_reports_whether_row_existed() {
        let db = test_db();
        db.upsert_progress("proj", "skill-1", &sample_progress())
            .expect("upsert");
        assert!(db.delete_progress("proj", "skill-1").expect("delete"));
        assert!(!db.delete_progress("proj", "skill-1").expect("delete again"));
    }

    #[test]
    fn mark_reported_sets_timestamp() {
        let db = test_db();
        db.upsert_progress("proj", "skill-1", &sample_progress())
            .expect("upsert");
        db.mark_reported("proj", "skill-1").expect("mark");
        let stored = db
            .load_progress("proj", "skill-1")
            .expect("load")
            .expect("row should exist");
        assert!(stored.reported_at.is_some());
    }

    #[test]
    fn list_returns_every_tracked_video() {
        let db = test_db();
        db.upsert_progress("proj", "a", &sample_progress())
            .expect("upsert a");
        db.upsert_progress("proj", "b", &WatchProgress::new(30.0))
            .expect("upsert b");
        let items = db.list_progress().expect("list");
        assert_eq!(items.len(), 2);
        assert!(items.iter().any(|item| item.skill_id == "a"));
        assert!(items.iter().any(|item| item.skill_id == "b"));
    }

    #[test]
    fn decode_rejects_malformed_segments() {
        assert!(decode_segments("not json").is_err());
        assert!(decode_segments("{\"start\":1}").is_err());
        assert!(decode_segments("[{\"start\":1}]").is_err());
        assert_eq!(
            decode_segments("[{\"start\":1,\"stop\":4.5}]").expect("valid"),
            vec![Segment::new(1.0, 4.5)]
        );
    }

    #[test]
    fn encoded_segments_decode_back() {
        let segments = vec![Segment::new(0.0, 5.25), Segment::new(30.0, 41.5)];
        let decoded = decode_segments(&encode_segments(&segments)).expect("decode");
        assert_eq!(decoded, segments);
    }
}
