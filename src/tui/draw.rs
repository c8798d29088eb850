use ratatui::{
    backend::TestBackend,
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Wrap,
    },
    Frame, Terminal,
};

use crate::chat::{ConversationStore, Role};
use crate::tui::state::{App, Focus};

const BORDER: Color = Color::Rgb(50, 50, 80);
const BACKGROUND: Color = Color::Rgb(15, 15, 25);

// ── Drawing ───────────────────────────────────────────────────────────────────

pub fn draw(f: &mut Frame, app: &mut App) {
    let area = f.area();
    f.render_widget(Block::default().style(Style::default().bg(BACKGROUND)), area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    draw_header(f, rows[0], app);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(28), Constraint::Percentage(72)])
        .split(rows[1]);
    draw_conversations(f, cols[0], app);
    draw_chat(f, cols[1], app);

    draw_footer(f, rows[2], app);

    if app.focus == Focus::UploadPath {
        draw_upload_prompt(f, area, app);
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let title = &app.controller.view().title;
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" xlchat ", Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(title.clone(), Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        Span::styled(format!("   {}", app.api_base_url), Style::default().fg(Color::DarkGray)),
    ]))
    .block(Block::default().borders(Borders::BOTTOM).border_style(Style::default().fg(BORDER)));
    f.render_widget(header, area);
}

fn draw_footer(f: &mut Frame, area: Rect, app: &App) {
    let hint = match app.focus {
        Focus::Conversations => " ↑↓ Select   Enter/Tab Chat   d Delete   Ctrl+N New   Ctrl+U Upload   Esc Quit ",
        Focus::Message => " Enter Send   Shift+Enter/Ctrl+J Newline   Tab List   Ctrl+N New   Ctrl+U Upload   Esc Quit ",
        Focus::UploadPath => " Enter Upload   Esc Cancel ",
    };
    let footer = Paragraph::new(hint)
        .style(Style::default().fg(Color::DarkGray).bg(BACKGROUND))
        .alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn draw_conversations(f: &mut Frame, area: Rect, app: &mut App) {
    let focused = app.focus == Focus::Conversations;
    let items: Vec<ListItem> = app
        .controller
        .store()
        .list()
        .into_iter()
        .map(|c| {
            let files = if c.files.is_empty() {
                Span::styled("  no files", Style::default().fg(Color::DarkGray))
            } else {
                Span::styled(format!("  {} file(s)", c.files.len()), Style::default().fg(Color::Green))
            };
            ListItem::new(vec![Line::from(c.title.clone()), Line::from(files)])
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(" Conversations ")
                .title_style(Style::default().fg(if focused { Color::Yellow } else { Color::Cyan }).add_modifier(Modifier::BOLD))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(if focused { Color::Yellow } else { BORDER })),
        )
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD))
        .highlight_symbol("▶ ");
    f.render_stateful_widget(list, area, &mut app.list_state);
}

fn draw_chat(f: &mut Frame, area: Rect, app: &mut App) {
    // Composer: borders on all sides around the content, which grows with the text.
    let input_inner_width = area.width.saturating_sub(2) as usize;
    app.controller.session_mut().input_width = input_inner_width.max(1);
    let composer_rows = app.controller.session().composer.rows;
    let max_input = area.height.saturating_sub(6).max(3);
    let input_height = (composer_rows + 2).min(max_input);
    let has_error = app.controller.view().error.is_some();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(if has_error { 1 } else { 0 }),
            Constraint::Length(input_height),
            Constraint::Length(1),
        ])
        .split(area);

    draw_transcript(f, rows[0], app);

    if let Some(error) = &app.controller.view().error {
        let banner = Paragraph::new(Span::styled(
            format!(" ⚠ {error}"),
            Style::default().fg(Color::White).bg(Color::Red).add_modifier(Modifier::BOLD),
        ));
        f.render_widget(banner, rows[1]);
    }

    draw_composer(f, rows[2], app);

    let status = Paragraph::new(Span::styled(format!(" {}", app.status), Style::default().fg(Color::Yellow)));
    f.render_widget(status, rows[3]);
}

fn draw_transcript(f: &mut Frame, area: Rect, app: &mut App) {
    let view = app.controller.view();
    let mut lines: Vec<Line> = Vec::new();
    for message in &view.messages {
        let color = match message.role {
            Role::User => Color::Cyan,
            Role::Bot => Color::Green,
        };
        lines.push(Line::from(Span::styled(
            format!(" {}: ", message.role.label()),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        for line in message.text.lines() {
            lines.push(Line::from(Span::styled(format!("   {line}"), Style::default().fg(Color::White))));
        }
        lines.push(Line::from(""));
    }
    if view.typing.is_some() {
        lines.push(Line::from(Span::styled(
            " Bot is typing…",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }
    if lines.is_empty() {
        let hint = if app.current_conversation().is_some() {
            " Ask a question about your spreadsheet."
        } else {
            " Press Ctrl+N to start a conversation."
        };
        lines.push(Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))));
    }

    // Rows after wrapping, for auto-scroll to the bottom.
    let height = area.height.saturating_sub(2) as usize;
    let inner_width = area.width.saturating_sub(3) as usize;
    let total: usize = lines
        .iter()
        .map(|line| {
            let w: usize = line.spans.iter().map(|s| s.content.chars().count()).sum();
            if inner_width == 0 || w == 0 { 1 } else { w.div_ceil(inner_width) }
        })
        .sum::<usize>()
        .max(1);
    let max_scroll = total.saturating_sub(height) as u16;
    if app.chat_scroll_manual && app.chat_scroll >= max_scroll {
        app.chat_scroll_manual = false;
    }
    let scroll = if app.chat_scroll_manual { app.chat_scroll } else { max_scroll };
    app.chat_scroll = scroll;

    let transcript = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" Chat ")
                .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(BORDER)),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(transcript, area);

    if max_scroll > 0 {
        let mut state = ScrollbarState::new(max_scroll as usize).position(scroll as usize);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("▲"))
            .end_symbol(Some("▼"))
            .track_symbol(Some("│"))
            .thumb_symbol("█");
        f.render_stateful_widget(scrollbar, area, &mut state);
    }
}

fn draw_composer(f: &mut Frame, area: Rect, app: &mut App) {
    let focused = app.focus == Focus::Message;
    let controls = app.controller.view().controls;
    let composer = &app.controller.session().composer;
    let cursor_style = if focused && controls.input_enabled {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let text_style = if controls.input_enabled {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    // Rows come pre-wrapped from the composer so the height it reports
    // matches what is drawn.
    let width = app.controller.session().input_width;
    let lines: Vec<Line> = composer
        .wrap(width)
        .into_iter()
        .map(|row| match row.cursor {
            Some(col) => {
                let before: String = row.text.chars().take(col).collect();
                let at = row.text.chars().nth(col).map_or_else(|| " ".to_string(), String::from);
                let after: String = row.text.chars().skip(col + 1).collect();
                Line::from(vec![
                    Span::styled(before, text_style),
                    Span::styled(at, cursor_style),
                    Span::styled(after, text_style),
                ])
            }
            None => Line::from(Span::styled(row.text, text_style)),
        })
        .collect();

    let inner_height = area.height.saturating_sub(2);
    let cursor_row = composer.cursor_row(width);
    if cursor_row < app.input_scroll {
        app.input_scroll = cursor_row;
    } else if inner_height > 0 && cursor_row >= app.input_scroll + inner_height {
        app.input_scroll = cursor_row + 1 - inner_height;
    }

    let send_hint = if controls.send_enabled { " [Enter ⏎ send] " } else { " " };
    let title = if controls.input_enabled { " Message " } else { " Message (waiting for reply) " };
    let input = Paragraph::new(lines)
        .block(
            Block::default()
                .title(title)
                .title_bottom(Line::from(send_hint).right_aligned())
                .title_style(Style::default().fg(if focused { Color::Yellow } else { Color::DarkGray }))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(if focused { Color::Yellow } else { BORDER })),
        )
        .scroll((app.input_scroll, 0));
    f.render_widget(input, area);
}

fn draw_upload_prompt(f: &mut Frame, area: Rect, app: &App) {
    let width = area.width.saturating_sub(10).min(80);
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + area.height / 3,
        width,
        height: 3.min(area.height),
    };
    let text = format!("{}█", app.upload_input.text());
    let prompt = Paragraph::new(text)
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .title(" Upload Excel file(s): path[, path…] ")
                .title_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .style(Style::default().bg(BACKGROUND)),
        );
    f.render_widget(Clear, popup);
    f.render_widget(prompt, popup);
}

// ── Test helpers ──────────────────────────────────────────────────────────────

/// Render the current app state into an in-memory buffer using `TestBackend`.
/// Useful for tests that assert on rendered output without a real terminal.
pub fn render_to_buffer(app: &mut App, width: u16, height: u16) -> Buffer {
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend).expect("TestBackend terminal");
    terminal.draw(|f| draw(f, app)).expect("draw");
    terminal.backend().buffer().clone()
}
