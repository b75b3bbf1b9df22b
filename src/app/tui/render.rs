use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Cell, Clear, Gauge, Padding, Paragraph, Row, Table, Wrap,
};

use crate::db::StoredProgress;

use super::super::format::{
    build_progress_gauge, format_seconds, format_segments, format_updated_display_tui,
    segment_timeline, truncate,
};
use super::{Dashboard, PendingDelete};

const ACCENT: Color = Color::Rgb(110, 170, 255);
const MUTED: Color = Color::Rgb(185, 195, 210);
const TEXT: Color = Color::Rgb(230, 232, 238);
const BORDER: Color = Color::Rgb(125, 135, 150);
const ERROR: Color = Color::Rgb(255, 145, 120);
const INFO: Color = Color::Rgb(205, 165, 255);

pub(super) fn draw_tui(frame: &mut Frame, dashboard: &mut Dashboard) {
    frame.render_widget(
        Block::default().style(Style::default().bg(Color::Black)),
        frame.area(),
    );

    let [header, body, controls, status] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(10),
        Constraint::Length(3),
        Constraint::Length(3),
    ])
    .areas(frame.area());
    let [list, side] =
        Layout::horizontal([Constraint::Percentage(58), Constraint::Percentage(42)]).areas(body);
    let [details, gauge] =
        Layout::vertical([Constraint::Min(8), Constraint::Length(3)]).areas(side);

    draw_header(frame, header, &dashboard.items);
    draw_table(frame, list, dashboard);
    draw_selection(frame, details, gauge, dashboard);
    draw_footer(frame, controls, status, &dashboard.status);

    if let Some(confirm) = &dashboard.pending_delete {
        draw_delete_popup(frame, confirm);
    }
}

fn draw_header(frame: &mut Frame, area: Rect, items: &[StoredProgress]) {
    let open = items
        .iter()
        .filter(|item| item.state.is_recording())
        .count();
    let reported = items
        .iter()
        .filter(|item| item.reported_at.is_some())
        .count();
    let line = Line::from(vec![
        Span::styled(
            "WATCHTRACK",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled(format!("{} videos", items.len()), Style::default().fg(MUTED)),
        Span::raw("   "),
        Span::styled(format!("{open} open"), Style::default().fg(Color::Yellow)),
        Span::raw("   "),
        Span::styled(format!("{reported} reported"), Style::default().fg(MUTED)),
    ]);
    frame.render_widget(
        Paragraph::new(line)
            .alignment(Alignment::Center)
            .block(panel("Dashboard")),
        area,
    );
}

fn draw_table(frame: &mut Frame, area: Rect, dashboard: &mut Dashboard) {
    let rows = dashboard.items.iter().map(|item| {
        Row::new(vec![
            Cell::from(truncate(&item.project_id, 18)),
            Cell::from(truncate(&item.skill_id, 22)),
            Cell::from(format!("{}%", item.percent_watched)),
            Cell::from(format_seconds(item.video_duration)),
            Cell::from(format_updated_display_tui(&item.updated_at)),
        ])
    });
    let widths = [
        Constraint::Percentage(26),
        Constraint::Percentage(30),
        Constraint::Length(8),
        Constraint::Length(9),
        Constraint::Length(17),
    ];
    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["Project", "Skill", "Watched", "Length", "Updated"])
                .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
        )
        .block(panel("Videos"))
        .row_highlight_style(
            Style::default()
                .bg(ACCENT)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");
    frame.render_stateful_widget(table, area, &mut dashboard.table_state);
}

fn draw_selection(frame: &mut Frame, details: Rect, gauge: Rect, dashboard: &Dashboard) {
    let Some(item) = dashboard.selected() else {
        frame.render_widget(
            Paragraph::new("No tracked videos yet.\n\nRun `watchtrack record` to add one.")
                .style(Style::default().fg(TEXT))
                .block(panel("Selected")),
            details,
        );
        return;
    };

    let timeline_width = details.width.saturating_sub(2) as usize;
    frame.render_widget(
        Paragraph::new(selection_text(item, dashboard, timeline_width))
            .style(Style::default().fg(TEXT))
            .wrap(Wrap { trim: false })
            .block(panel("Selected")),
        details,
    );

    let (ratio, label) = build_progress_gauge(item.percent_watched);
    frame.render_widget(
        Gauge::default()
            .block(panel("Watched"))
            .gauge_style(
                Style::default()
                    .fg(ACCENT)
                    .bg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            )
            .label(label)
            .ratio(ratio),
        gauge,
    );
}

fn selection_text(item: &StoredProgress, dashboard: &Dashboard, timeline_width: usize) -> String {
    let progress = item.restore(&dashboard.tracker);
    let watched = progress.watched_segments();
    let state = match (progress.current_start(), progress.last_known_position()) {
        (Some(start), Some(last)) => format!(
            "recording {} - {}",
            format_seconds(start),
            format_seconds(last)
        ),
        _ => "idle".to_string(),
    };
    let reported = item
        .reported_at
        .as_deref()
        .map(format_updated_display_tui)
        .unwrap_or_else(|| "no".to_string());

    format!(
        "Project\n{}\n\nSkill\n{}\n\nWatched\n{} of {}\n\nState\n{state}\n\nSegments\n{}\n\nTimeline\n{}\n\nReported\n{reported}",
        truncate(&item.project_id, 40),
        truncate(&item.skill_id, 40),
        format_seconds(progress.total_watch_time()),
        format_seconds(progress.video_duration()),
        format_segments(&watched),
        segment_timeline(&watched, progress.video_duration(), timeline_width),
    )
}

fn draw_footer(frame: &mut Frame, controls: Rect, status_area: Rect, status: &str) {
    frame.render_widget(
        Paragraph::new(Line::styled(
            "↑/↓ move  f/Enter close open interval  r reload  d delete  q quit",
            Style::default().fg(MUTED),
        ))
        .alignment(Alignment::Center)
        .block(panel("Controls")),
        controls,
    );

    let style = if status.starts_with("ERROR:") {
        Style::default().fg(ERROR).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(INFO)
    };
    frame.render_widget(
        Paragraph::new(status.to_string())
            .style(style)
            .block(panel("Status")),
        status_area,
    );
}

fn draw_delete_popup(frame: &mut Frame, confirm: &PendingDelete) {
    let text = format!(
        "Delete watch progress?\n\n{}\n\nSegments and report state are removed.\n\n[y / Enter] Delete   [n / Esc] Cancel",
        truncate(&confirm.label(), 56)
    );
    let area = popup_area(frame.area(), &text);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::bordered()
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
                    .title("Confirm Delete")
                    .padding(Padding::new(2, 2, 1, 1)),
            ),
        area,
    );
}

fn panel(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .title(title)
}

/// Centers a box sized for `text` inside `screen`, leaving a one-cell margin.
fn popup_area(screen: Rect, text: &str) -> Rect {
    let widest = text
        .lines()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0) as u16;
    let lines = text.lines().count() as u16;

    let max_width = screen.width.saturating_sub(2).max(1);
    let max_height = screen.height.saturating_sub(2).max(1);
    let width = widest.saturating_add(12).clamp(48.min(max_width), 72.min(max_width));
    let height = lines.saturating_add(6).clamp(10.min(max_height), 18.min(max_height));

    Rect::new(
        screen.x + screen.width.saturating_sub(width) / 2,
        screen.y + screen.height.saturating_sub(height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_fits_small_screens() {
        let screen = Rect::new(0, 0, 30, 8);
        let area = popup_area(screen, "line one\nline two");
        assert!(area.width <= 28);
        assert!(area.height <= 6);
        assert!(area.x + area.width <= screen.width);
        assert!(area.y + area.height <= screen.height);
    }

    #[test]
    fn popup_is_centered_on_large_screens() {
        let screen = Rect::new(0, 0, 120, 40);
        let area = popup_area(screen, "short");
        assert_eq!(area.width, 48);
        assert_eq!(area.height, 10);
        assert_eq!(area.x, 36);
        assert_eq!(area.y, 15);
    }
}
