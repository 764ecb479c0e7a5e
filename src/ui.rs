use chrono::{Local, TimeZone};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};
use crate::app::{App, FocusPane, Popup, SUGGESTIONS};
use crate::composer::wrap_lines;
use crate::state::{Message, Role};
use crate::theme::Palette;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let palette = Palette::for_setting(app.theme);

    // Paint the theme background first; everything else draws on top
    frame.render_widget(
        Block::default().style(Style::default().bg(palette.background).fg(palette.foreground)),
        area,
    );

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, &palette, frame, header_area);

    let [sidebar_area, main_area] = Layout::horizontal([
        Constraint::Length(30),
        Constraint::Min(0),
    ])
    .areas(body_area);

    // Composer grows with its content, borders take two rows
    let input_width = main_area.width.saturating_sub(2);
    let input_height = app.composer.height(input_width, app.max_input_rows) + 2;

    let [transcript_area, suggestions_area, composer_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(input_height),
    ])
    .areas(main_area);

    // Store areas for mouse hit-testing
    app.sidebar_area = Some(sidebar_area);
    app.transcript_area = Some(transcript_area);

    render_sidebar(app, &palette, frame, sidebar_area);
    render_transcript(app, &palette, frame, transcript_area);
    render_suggestions(app, &palette, frame, suggestions_area);
    render_composer(app, &palette, frame, composer_area);
    render_footer(app, &palette, frame, footer_area);

    if let Popup::ConfirmDelete { title, .. } = &app.popup {
        render_confirm_delete(title, &palette, frame, area);
    }
}

fn render_header(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Simple Chat ", Style::default().fg(palette.accent).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(palette.muted),
        ),
    ]);
    let theme_label = format!("Theme: {} ", app.theme.label());
    let [title_area, theme_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(theme_label.chars().count() as u16),
    ])
    .areas(area);

    let theme = Line::from(Span::styled(theme_label, Style::default().fg(palette.muted)));

    frame.render_widget(Paragraph::new(title), title_area);
    frame.render_widget(Paragraph::new(theme), theme_area);
}

fn border_style(palette: &Palette, focused: bool) -> Style {
    if focused {
        Style::default().fg(palette.accent)
    } else {
        Style::default().fg(palette.muted)
    }
}

fn format_updated(ms: i64) -> String {
    Local
        .timestamp_millis_opt(ms)
        .single()
        .map(|t| t.format("%b %e %H:%M").to_string())
        .unwrap_or_default()
}

fn render_sidebar(app: &mut App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Sidebar;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(palette, focused))
        .title(" Chats ");

    let active_id = app.store.active_chat_id();
    let items: Vec<ListItem> = app
        .store
        .chats()
        .iter()
        .map(|chat| {
            let is_active = Some(chat.id.as_str()) == active_id;
            let marker = if is_active { "● " } else { "  " };
            let title = chat.display_title().replace('\n', " ");
            let title_style = if is_active {
                Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(vec![
                Line::from(Span::styled(format!("{}{}", marker, title), title_style)),
                Line::from(Span::styled(
                    format!("  {}", format_updated(chat.updated_at)),
                    Style::default().fg(palette.muted),
                )),
            ])
        })
        .collect();

    let highlight = if focused {
        Style::default().bg(palette.highlight_bg).fg(palette.highlight_fg)
    } else {
        Style::default()
    };

    let list = List::new(items).block(block).highlight_style(highlight);
    frame.render_stateful_widget(list, area, &mut app.sidebar_state);
}

/// Break one line into rows of at most `width` chars, at spaces where
/// possible. Words longer than a row are split.
fn word_wrap(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in line.split(' ') {
        let word_len = word.chars().count();
        if current_len > 0 && current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
            continue;
        }
        if current_len > 0 {
            rows.push(std::mem::take(&mut current));
        }
        let chars: Vec<char> = word.chars().collect();
        let mut chunks = chars.chunks(width).peekable();
        current_len = 0;
        while let Some(chunk) = chunks.next() {
            if chunks.peek().is_some() {
                rows.push(chunk.iter().collect());
            } else {
                current = chunk.iter().collect();
                current_len = chunk.len();
            }
        }
    }
    if current_len > 0 || rows.is_empty() {
        rows.push(current);
    }
    rows
}

/// Transcript rows for one message, already wrapped to `width` so the
/// row count is exact for scrolling.
fn message_lines(
    message: &Message,
    palette: &Palette,
    animation_frame: u8,
    width: usize,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    match message.role {
        Role::User => lines.push(Line::from(Span::styled(
            "You:",
            Style::default().fg(palette.user).add_modifier(Modifier::BOLD),
        ))),
        Role::Assistant => lines.push(Line::from(Span::styled(
            "Assistant:",
            Style::default().fg(palette.assistant).add_modifier(Modifier::BOLD),
        ))),
    }

    if message.pending {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC),
        )));
    } else {
        for line in message.content.lines() {
            lines.extend(word_wrap(line, width).into_iter().map(Line::from));
        }
    }
    lines.push(Line::default());
    lines
}

fn render_transcript(app: &mut App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(palette, false))
        .title(" Conversation ");

    // Inner size minus borders, kept for scroll calculations
    app.transcript_height = area.height.saturating_sub(2);
    app.transcript_width = area.width.saturating_sub(2);

    let Some(chat) = app.store.active_chat() else {
        let empty = Paragraph::new(Span::styled(
            "No chat selected. Press Ctrl+N to start one.",
            Style::default().fg(palette.muted),
        ))
        .block(block);
        frame.render_widget(empty, area);
        return;
    };

    let width = app.transcript_width.max(1) as usize;
    let mut lines: Vec<Line> = Vec::new();
    for msg in &chat.messages {
        lines.extend(message_lines(msg, palette, app.animation_frame, width));
    }

    // Auto-scroll to the latest entry unless the user scrolled up
    let total = lines.len().min(u16::MAX as usize) as u16;
    let max_scroll = total.saturating_sub(app.transcript_height);
    if app.follow_transcript || app.transcript_scroll >= max_scroll {
        app.transcript_scroll = max_scroll;
        app.follow_transcript = true;
    }

    let transcript = Paragraph::new(Text::from(lines))
        .block(block)
        .scroll((app.transcript_scroll, 0));
    frame.render_widget(transcript, area);
}

fn render_suggestions(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Suggestions;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(palette, focused))
        .title(" Suggestions ");

    let mut spans = Vec::new();
    for (i, text) in SUGGESTIONS.iter().enumerate() {
        let style = if focused && i == app.suggestion_idx {
            Style::default().bg(palette.highlight_bg).fg(palette.highlight_fg)
        } else {
            Style::default().fg(palette.accent)
        };
        spans.push(Span::styled(format!(" {} ", text), style));
        spans.push(Span::raw(" "));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_composer(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Composer;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(palette, focused))
        .title(" Message ");

    let inner_width = area.width.saturating_sub(2);
    let visible_rows = area.height.saturating_sub(2).max(1);

    // Keep the cursor row inside the clamped input
    let (cursor_row, cursor_col) = app.composer.cursor_position(inner_width);
    let scroll = cursor_row.saturating_sub(visible_rows - 1);

    let text = if app.composer.is_empty() && !focused {
        Text::from(Span::styled("Send a message...", Style::default().fg(palette.muted)))
    } else {
        Text::from(
            wrap_lines(app.composer.text(), inner_width as usize)
                .into_iter()
                .map(Line::from)
                .collect::<Vec<_>>(),
        )
    };

    let input = Paragraph::new(text)
        .style(Style::default().fg(palette.user))
        .block(block)
        .scroll((scroll, 0));
    frame.render_widget(input, area);

    if focused && app.popup == Popup::None {
        frame.set_cursor_position((
            area.x + 1 + cursor_col,
            area.y + 1 + cursor_row - scroll,
        ));
    }
}

fn render_footer(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(palette.muted).fg(palette.highlight_fg);
    let label_style = Style::default().fg(palette.foreground);
    let mode_style = Style::default().bg(palette.highlight_bg).fg(palette.highlight_fg);

    let (mode_text, mut hints) = match app.focus {
        FocusPane::Composer => (
            " MESSAGE ",
            vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" send ", label_style),
                Span::styled(" Shift+Enter ", key_style),
                Span::styled(" newline ", label_style),
            ],
        ),
        FocusPane::Sidebar => (
            " CHATS ",
            vec![
                Span::styled(" j/k ", key_style),
                Span::styled(" nav ", label_style),
                Span::styled(" Enter ", key_style),
                Span::styled(" open ", label_style),
                Span::styled(" d ", key_style),
                Span::styled(" delete ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ],
        ),
        FocusPane::Suggestions => (
            " SUGGEST ",
            vec![
                Span::styled(" h/l ", key_style),
                Span::styled(" nav ", label_style),
                Span::styled(" Enter ", key_style),
                Span::styled(" use ", label_style),
            ],
        ),
    };

    hints.extend(vec![
        Span::styled(" Tab ", key_style),
        Span::styled(" focus ", label_style),
        Span::styled(" ^N ", key_style),
        Span::styled(" new chat ", label_style),
        Span::styled(" ^T ", key_style),
        Span::styled(" theme ", label_style),
        Span::styled(" ^C ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    let footer = Line::from(
        vec![Span::styled(mode_text, mode_style), Span::raw(" ")]
            .into_iter()
            .chain(hints)
            .collect::<Vec<_>>(),
    );
    frame.render_widget(Paragraph::new(footer), area);
}

fn render_confirm_delete(title: &str, palette: &Palette, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 50.min(area.width.saturating_sub(4));
    let popup_height = 5.min(area.height);

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.assistant))
        .style(Style::default().bg(palette.background).fg(palette.foreground))
        .title(" Delete this chat? ");

    let body = Text::from(vec![
        Line::from(title.replace('\n', " ")).bold(),
        Line::default(),
        Line::from(vec![
            Span::styled(" y ", Style::default().bg(palette.muted).fg(palette.highlight_fg)),
            Span::raw(" delete  "),
            Span::styled(" n ", Style::default().bg(palette.muted).fg(palette.highlight_fg)),
            Span::raw(" cancel"),
        ]),
    ]);

    frame.render_widget(Paragraph::new(body).block(block), popup_area);
}
