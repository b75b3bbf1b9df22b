mod format;
mod record;
mod report;
mod samples;
mod tui;


use anyhow::{Result, bail};
use watchtrack::{Tracker, TrackerConfig, WatchProgress};

use crate::cli::{Cli, Command, RecordArgs, VideoKey};
use crate::db::{Database, StoredProgress};
use crate::paths::database_file_path;

use self::format::{
    format_seconds, format_segments, format_updated_display, segment_timeline, truncate,
};
use self::record::{RecordOutcome, RecordRequest, record_samples};
use self::report::{resolve_service_url, send_self_report};
use self::samples::{SampleRead, parse_samples, read_sample_source};

const TIMELINE_WIDTH: usize = 50;

pub fn run(cli: Cli) -> Result<()> {
    let db = open_db()?;

    match cli.command {
        Some(Command::Record(args)) => run_record(&db, &args)?,
        Some(Command::Show(key)) => run_show(&db, &key)?,
        Some(Command::List) => run_list(&db)?,
        Some(Command::Delete(key)) => run_delete(&db, &key)?,
        Some(Command::Tui) | None => tui::run_tui(&db)?,
    }

    Ok(())
}

fn run_record(db: &Database, args: &RecordArgs) -> Result<()> {
    let mut read = parse_samples(&args.samples.join(" "));
    if let Some(path) = &args.input {
        read.extend(read_sample_source(path)?);
    }
    let SampleRead { samples, warnings } = read;
    emit_warnings(&warnings);
    if samples.is_empty() && !args.finish {
        bail!("no samples given; pass positions as arguments or with --input");
    }

    let mut config = TrackerConfig::from_env();
    if args.snap_to_end.is_some() {
        config = config.with_completion_snap(args.snap_to_end);
    }
    let tracker = Tracker::new(config);
    let service_url = resolve_service_url(args.service_url.as_deref());
    let request = RecordRequest {
        project_id: &args.key.project,
        skill_id: &args.key.skill,
        duration: args.duration,
        samples: &samples,
        finish: args.finish,
        report_at: args.report_at,
    };

    let message = record_and_report(
        db,
        &tracker,
        &request,
        service_url.as_deref(),
        |url, percent| send_self_report(url, request.project_id, request.skill_id, percent),
    )?;
    println!("{message}");
    Ok(())
}

/// Records samples, then reports the skill through `reporter` once the
/// threshold is reached. A failed report never loses recorded progress.
pub(crate) fn record_and_report<F>(
    db: &Database,
    tracker: &Tracker,
    request: &RecordRequest<'_>,
    service_url: Option<&str>,
    reporter: F,
) -> Result<String>
where
    F: FnOnce(&str, i64) -> Result<(), String>,
{
    let outcome = record_samples(db, tracker, request)?;
    emit_warnings(&outcome.warnings);
    let mut message = record_summary(request, &outcome);

    if outcome.report_due {
        match service_url {
            Some(url) => match reporter(url, outcome.progress.percent_watched()) {
                Ok(()) => {
                    db.mark_reported(request.project_id, request.skill_id)?;
                    message.push_str("\nReported skill as watched.");
                }
                Err(err) => {
                    message.push_str(&format!(
                        "\nWarning: self-report failed: {err}. Will retry on the next record."
                    ));
                }
            },
            None => message.push_str(
                "\nWarning: threshold reached but no service URL is configured; set --service-url or WATCHTRACK_SERVICE_URL.",
            ),
        }
    }

    Ok(message)
}

fn record_summary(request: &RecordRequest<'_>, outcome: &RecordOutcome) -> String {
    let progress = &outcome.progress;
    let verb = if outcome.created { "Started" } else { "Updated" };
    let mut message = format!(
        "{verb} {}/{}: {}% watched ({} of {}), was {}%",
        request.project_id,
        request.skill_id,
        progress.percent_watched(),
        format_seconds(progress.total_watch_time()),
        format_seconds(progress.video_duration()),
        outcome.previous_percent,
    );
    message.push_str(&format!(
        "\nSamples: {} | Segments: {}",
        request.samples.len(),
        format_segments(progress.watch_segments())
    ));
    if let (Some(start), Some(last)) = (progress.current_start(), progress.last_known_position()) {
        message.push_str(&format!(
            "\nOpen interval: {} - {}",
            format_seconds(start),
            format_seconds(last)
        ));
    }
    message
}

fn run_show(db: &Database, key: &VideoKey) -> Result<()> {
    let Some(item) = db.load_progress(&key.project, &key.skill)? else {
        println!(
            "No progress recorded for {}/{}. Run `watchtrack record` first.",
            key.project, key.skill
        );
        return Ok(());
    };
    let tracker = Tracker::new(TrackerConfig::from_env());
    let progress = item.restore(&tracker);
    println!("{}", show_text(&item, &progress));
    Ok(())
}

fn show_text(item: &StoredProgress, progress: &WatchProgress) -> String {
    let watched = progress.watched_segments();
    let mut text = format!(
        "Project: {}\nSkill: {}\nDuration: {}\nWatched: {}% ({})\nPosition: {}\nSegments: {}",
        item.project_id,
        item.skill_id,
        format_seconds(progress.video_duration()),
        progress.percent_watched(),
        format_seconds(progress.total_watch_time()),
        format_seconds(progress.current_position()),
        format_segments(&watched),
    );
    text.push_str(&format!(
        "\nTimeline: {}",
        segment_timeline(&watched, progress.video_duration(), TIMELINE_WIDTH)
    ));
    if progress.is_recording() {
        text.push_str("\nState: recording (open interval not yet closed)");
    }
    text.push_str(&format!(
        "\nReported: {}",
        item.reported_at
            .as_deref()
            .map(format_updated_display)
            .unwrap_or_else(|| "no".to_string())
    ));
    text.push_str(&format!(
        "\nUpdated: {}",
        format_updated_display(&item.updated_at)
    ));
    text
}

fn run_list(db: &Database) -> Result<()> {
    let items = db.list_progress()?;
    if items.is_empty() {
        println!("No tracked videos yet. Run `watchtrack record` first.");
        return Ok(());
    }

    println!(
        "{:<20} {:<24} {:>8} {:>9} {:>9} {:<28}",
        "PROJECT", "SKILL", "WATCHED", "TIME", "DURATION", "UPDATED"
    );
    for item in items {
        println!(
            "{:<20} {:<24} {:>7}% {:>9} {:>9} {:<28}",
            truncate(&item.project_id, 20),
            truncate(&item.skill_id, 24),
            item.percent_watched,
            format_seconds(item.total_watch_time),
            format_seconds(item.video_duration),
            format_updated_display(&item.updated_at)
        );
    }
    Ok(())
}

fn run_delete(db: &Database, key: &VideoKey) -> Result<()> {
    if db.delete_progress(&key.project, &key.skill)? {
        println!("Deleted progress for {}/{}.", key.project, key.skill);
    } else {
        println!("No progress recorded for {}/{}.", key.project, key.skill);
    }
    Ok(())
}

fn emit_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("Warning: {warning}");
    }
}

fn open_db() -> Result<Database> {
    let db_path = database_file_path()?;
    let db = Database::open(&db_path)?;
    db.migrate()?;
    Ok(db)
}
