use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::query::{SortDirection, SortKey};
use crate::record::{description_line, Priority};
use crate::table::{format_due, DueState, FlatRow};

use super::app::{AppState, StatusKind, Tab};
use super::model::list_window;

const PRIORITY_WIDTH: usize = 6;
const DUE_WIDTH: usize = 12;
const ASSIGNEE_WIDTH: usize = 18;
const REQUESTOR_WIDTH: usize = 14;
const STAGE_WIDTH: usize = 18;
const COLOR_TEXT: Color = Color::Rgb(234, 236, 239);
const COLOR_MUTED: Color = Color::Rgb(160, 165, 172);
const COLOR_MUTED_DARK: Color = Color::Rgb(118, 124, 130);
const COLOR_BG_MUTED: Color = Color::Rgb(52, 56, 60);
const COLOR_INFO: Color = Color::Rgb(116, 198, 219);
const COLOR_WARNING: Color = Color::Rgb(244, 200, 98);
const COLOR_ERROR: Color = Color::Rgb(255, 107, 107);
const COLOR_SUCCESS: Color = Color::Rgb(126, 210, 146);
const COLOR_ACCENT: Color = Color::Rgb(122, 170, 255);
const COLOR_ORANGE: Color = Color::Rgb(255, 147, 112);
const COLOR_BORDER_LIST: Color = Color::Rgb(92, 126, 166);
const COLOR_MAGENTA: Color = Color::Rgb(214, 140, 230);

pub fn render(frame: &mut Frame, app: &AppState) {
    let area = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);

    render_tabs(frame, app, chunks[0]);
    match app.tab {
        Tab::Board => render_board(frame, app, chunks[1]),
        Tab::Table => render_table(frame, app, chunks[1]),
    }
    render_footer(frame, app, chunks[2]);
}

fn render_tabs(frame: &mut Frame, app: &AppState, area: Rect) {
    let tabs = [
        (
            "1 Board",
            app.tab == Tab::Board,
            app.coordinator.board().len(),
            COLOR_INFO,
        ),
        (
            "2 Table",
            app.tab == Tab::Table,
            app.coordinator.table().len(),
            COLOR_ACCENT,
        ),
    ];

    let mut spans = Vec::new();
    for (idx, (label, selected, count, color)) in tabs.into_iter().enumerate() {
        if idx > 0 {
            spans.push(Span::styled("  ", Style::default().fg(COLOR_MUTED_DARK)));
        }
        let text = format!("{label} ({count})");
        let style = if selected {
            Style::default()
                .fg(color)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(COLOR_MUTED)
        };
        spans.push(Span::styled(text, style));
    }

    let widget = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(COLOR_BG_MUTED)),
    );
    frame.render_widget(widget, area);
}

fn render_board(frame: &mut Frame, app: &AppState, area: Rect) {
    let content_width = area.width.saturating_sub(2) as usize;
    let mut lines = Vec::new();
    for bucket in app.coordinator.board().buckets() {
        lines.push(Line::from(vec![
            Span::styled(
                bucket.assignee.display_name(),
                Style::default()
                    .fg(COLOR_MAGENTA)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {} of {}", bucket.tasks.len(), app.coordinator.board().bucket_size()),
                Style::default().fg(COLOR_MUTED_DARK),
            ),
        ]));
        if bucket.tasks.is_empty() {
            lines.push(Line::from(Span::styled(
                "  no open tasks",
                Style::default().fg(COLOR_MUTED_DARK),
            )));
        }
        for task in &bucket.tasks {
            let due = format_due(task.due, &app.date_format);
            let due_state = DueState::of(task.due, app.today);
            let used = PRIORITY_WIDTH + DUE_WIDTH + STAGE_WIDTH + 8;
            let title_width = content_width.saturating_sub(used);
            lines.push(Line::from(vec![
                Span::raw("  "),
                priority_span(task.priority),
                Span::raw(" "),
                Span::styled(
                    pad_text(&task.title, title_width),
                    Style::default().fg(COLOR_TEXT),
                ),
                Span::raw(" "),
                Span::styled(pad_text(&due, DUE_WIDTH), due_style(due_state)),
                Span::raw(" "),
                Span::styled(
                    truncate_text(&task.stage, STAGE_WIDTH),
                    Style::default().fg(COLOR_ACCENT),
                ),
            ]));
            let description = description_line(&task.description, app.description_max_len);
            lines.push(Line::from(vec![
                Span::raw(" ".repeat(PRIORITY_WIDTH + 3)),
                Span::styled(
                    truncate_text(&description, content_width.saturating_sub(PRIORITY_WIDTH + 3)),
                    Style::default().fg(COLOR_MUTED),
                ),
            ]));
        }
    }

    if lines.is_empty() {
        let message = if app.coordinator.is_loading() {
            "Loading tasks..."
        } else {
            "No tracked assignees"
        };
        lines.push(Line::from(message));
    }

    let height = area.height.saturating_sub(2) as usize;
    let (start, end) = list_window(lines.len(), Some(app.board_scroll), height);
    let visible: Vec<Line> = lines.drain(start..end).collect();

    let widget = Paragraph::new(visible).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Board")
            .border_style(Style::default().fg(COLOR_BORDER_LIST)),
    );
    frame.render_widget(widget, area);
}

fn render_table(frame: &mut Frame, app: &AppState, area: Rect) {
    let content_width = area.width.saturating_sub(2) as usize;
    let rows = app.visible_rows();
    let title_width = content_width
        .saturating_sub(PRIORITY_WIDTH + DUE_WIDTH + ASSIGNEE_WIDTH + REQUESTOR_WIDTH + STAGE_WIDTH + 6);
    let mut lines = Vec::new();

    if app.search_active || !app.query.search.is_empty() || app.query.stage.is_some() {
        let search_label = if app.search_active && app.query.search.is_empty() {
            "search: _".to_string()
        } else {
            format!("search: {}", app.query.search)
        };
        let stage_label = match app.query.stage.as_deref() {
            Some(stage) => format!("stage: {stage}"),
            None => "stage: all".to_string(),
        };
        lines.push(Line::from(vec![
            Span::styled(search_label, Style::default().fg(COLOR_INFO)),
            Span::raw("  "),
            Span::styled(stage_label, Style::default().fg(COLOR_WARNING)),
        ]));
    }

    lines.push(Line::from(vec![
        header_span(app, SortKey::Title, title_width),
        Span::raw(" "),
        header_span(app, SortKey::Assignee, ASSIGNEE_WIDTH),
        Span::raw(" "),
        header_span(app, SortKey::Requestor, REQUESTOR_WIDTH),
        Span::raw(" "),
        header_span(app, SortKey::Priority, PRIORITY_WIDTH),
        Span::raw(" "),
        header_span(app, SortKey::DueDate, DUE_WIDTH),
        Span::raw(" "),
        header_span(app, SortKey::Stage, STAGE_WIDTH),
    ]));

    if rows.is_empty() {
        let message = if app.coordinator.is_loading() {
            "Loading tasks..."
        } else if !app.query.search.is_empty() || app.query.stage.is_some() {
            "No matches"
        } else {
            "No tasks"
        };
        lines.push(Line::from(message));
    } else {
        let height = area
            .height
            .saturating_sub(2)
            .saturating_sub(lines.len() as u16) as usize;
        let (start, end) = list_window(rows.len(), Some(app.table_selected), height);
        for (pos, row) in rows.iter().enumerate().take(end).skip(start) {
            lines.push(render_row(
                row,
                app,
                title_width,
                pos == app.table_selected,
            ));
        }
    }

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Tasks ({} shown)", rows.len()))
            .border_style(Style::default().fg(COLOR_BORDER_LIST)),
    );
    frame.render_widget(widget, area);
}

fn render_row(row: &FlatRow, app: &AppState, title_width: usize, selected: bool) -> Line<'static> {
    let mut spans = vec![
        Span::styled(pad_text(&row.title, title_width), Style::default().fg(COLOR_TEXT)),
        Span::raw(" "),
        Span::styled(
            pad_text(&row.assignee, ASSIGNEE_WIDTH),
            Style::default().fg(COLOR_MUTED),
        ),
        Span::raw(" "),
        Span::styled(
            pad_text(row.requestor.as_deref().unwrap_or(""), REQUESTOR_WIDTH),
            Style::default().fg(COLOR_MUTED),
        ),
        Span::raw(" "),
        priority_span(row.priority),
        Span::raw(" "),
        Span::styled(
            pad_text(&row.due_label, DUE_WIDTH),
            due_style(row.due_state(app.today)),
        ),
        Span::raw(" "),
        Span::styled(
            pad_text(&row.stage, STAGE_WIDTH),
            Style::default().fg(COLOR_ACCENT),
        ),
    ];
    if selected {
        for span in &mut spans {
            span.style = span.style.add_modifier(Modifier::REVERSED);
        }
    }
    Line::from(spans)
}

fn header_span(app: &AppState, key: SortKey, width: usize) -> Span<'static> {
    let active = app.query.sort == key;
    let mut label = key.label().to_uppercase();
    if active {
        label.push_str(match app.query.direction {
            SortDirection::Asc => " ^",
            SortDirection::Desc => " v",
        });
    }
    let style = if active {
        Style::default()
            .fg(COLOR_WARNING)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .fg(COLOR_MUTED_DARK)
            .add_modifier(Modifier::BOLD)
    };
    Span::styled(pad_text(&label, width), style)
}

fn render_footer(frame: &mut Frame, app: &AppState, area: Rect) {
    let hint_span = Span::styled(app.footer_hint(), Style::default().fg(COLOR_INFO));
    let line = if let Some((status, kind)) = app.status_line() {
        let status_style = match kind {
            StatusKind::Error => Style::default()
                .fg(COLOR_ERROR)
                .add_modifier(Modifier::BOLD),
            StatusKind::Info => Style::default().fg(COLOR_WARNING),
        };
        Line::from(vec![
            hint_span,
            Span::raw("  |  "),
            Span::styled(status, status_style),
        ])
    } else {
        Line::from(hint_span)
    };
    let counts_line = Line::from(Span::styled(
        app.count_summary(),
        Style::default().fg(COLOR_ACCENT),
    ));
    let widget = Paragraph::new(vec![line, counts_line])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(COLOR_BORDER_LIST)),
        );
    frame.render_widget(widget, area);
}

fn priority_span(priority: Priority) -> Span<'static> {
    Span::styled(
        pad_text(priority.as_str(), PRIORITY_WIDTH),
        Style::default()
            .fg(priority_color(priority))
            .add_modifier(Modifier::BOLD),
    )
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => COLOR_ERROR,
        Priority::Medium => COLOR_WARNING,
        Priority::Low => COLOR_SUCCESS,
    }
}

fn due_style(state: DueState) -> Style {
    match state {
        DueState::Overdue => Style::default().fg(COLOR_ERROR).add_modifier(Modifier::BOLD),
        DueState::Today => Style::default().fg(COLOR_ORANGE),
        DueState::Upcoming => Style::default().fg(COLOR_SUCCESS),
        DueState::None => Style::default().fg(COLOR_MUTED_DARK),
    }
}

fn pad_text(value: &str, width: usize) -> String {
    let text = truncate_text(value, width);
    format!("{text:width$}")
}

fn truncate_text(value: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= max {
        return value.to_string();
    }
    if max <= 3 {
        return chars[..max].iter().collect();
    }
    let mut out: String = chars[..(max - 3)].iter().collect();
    out.push_str("...");
    out
}
