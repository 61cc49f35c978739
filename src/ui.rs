use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use crate::app::{App, Author, Dialog, InputMode, SystemEditorState};
use crate::markdown::{self, Segment};

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.char_indices().peekable();
    let mut current_text = String::new();

    while let Some((_, c)) = chars.next() {
        if c == '*' {
            // Check for ** (bold)
            if chars.peek().map(|(_, c)| *c) == Some('*') {
                // Consume the second *
                chars.next();

                // Push any accumulated plain text
                if !current_text.is_empty() {
                    spans.push(Span::raw(std::mem::take(&mut current_text)));
                }

                // Find closing **
                let mut bold_text = String::new();
                let mut found_close = false;

                while let Some((_, c)) = chars.next() {
                    if c == '*' && chars.peek().map(|(_, c)| *c) == Some('*') {
                        chars.next(); // consume second *
                        found_close = true;
                        break;
                    }
                    bold_text.push(c);
                }

                if found_close && !bold_text.is_empty() {
                    spans.push(Span::styled(
                        bold_text,
                        Style::default().add_modifier(Modifier::BOLD),
                    ));
                } else {
                    // No closing **, treat as literal
                    current_text.push_str("**");
                    current_text.push_str(&bold_text);
                }
            } else {
                // Single * - treat as literal
                current_text.push(c);
            }
        } else {
            current_text.push(c);
        }
    }

    // Push any remaining text
    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, transcript, input, footer
    let [header_area, transcript_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_transcript(app, frame, transcript_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if app.dialog.is_some() {
        render_dialog(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" charla ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!(" action: {} ", app.action.as_str()),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    // Store inner dimensions for scroll/wrap calculations
    app.transcript_height = area.height.saturating_sub(2);
    app.transcript_width = area.width.saturating_sub(2);

    let text = if app.transcript.is_empty() && !app.typing {
        Text::from(Span::styled(
            "Say something, or press v to dictate...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();
        // Copy affordances are numbered across all bot messages, matching
        // the 1-9 copy keys.
        let mut copy_base = 0usize;

        for msg in &app.transcript {
            match msg.author {
                Author::User => {
                    lines.push(Line::from(Span::styled(
                        "You",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )));
                    push_message_lines(&mut lines, &msg.text, None, &app.copy_buttons);
                }
                Author::Bot => {
                    lines.push(Line::from(Span::styled(
                        "Bot",
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    )));
                    copy_base +=
                        push_message_lines(&mut lines, &msg.text, Some(copy_base), &app.copy_buttons);
                }
            }
            lines.push(Line::default());
        }

        if app.typing {
            lines.push(Line::from(Span::styled(
                "Bot",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )));
            // Animated dots: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("typing{}", dots),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let transcript = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.transcript_scroll, 0));

    frame.render_widget(transcript, area);
}

/// Render one message body, returning the number of closed code blocks.
/// `copy_base` is the global index of the message's first code block; `None`
/// renders fences without copy affordances (user messages have no copy
/// targets).
fn push_message_lines(
    lines: &mut Vec<Line<'static>>,
    text: &str,
    copy_base: Option<usize>,
    copy_buttons: &crate::clipboard::CopyButtons,
) -> usize {
    let code_style = Style::default().fg(Color::Green);
    let fence_style = Style::default().fg(Color::DarkGray);

    let rendered = markdown::render(text);
    let block_count = rendered.code_blocks.len();
    for segment in rendered.segments {
        match segment {
            Segment::Text(line) => lines.push(parse_markdown_line(&line)),
            Segment::CodeLine(line) => lines.push(Line::from(Span::styled(line, code_style))),
            Segment::CodeStart { language } => {
                let header = if language.is_empty() {
                    "── code".to_string()
                } else {
                    format!("── {}", language)
                };
                lines.push(Line::from(Span::styled(header, fence_style)));
            }
            Segment::CodeEnd { copy_index } => match copy_base {
                Some(base) => {
                    let index = base + copy_index;
                    lines.push(Line::from(vec![
                        Span::styled("── ", fence_style),
                        Span::styled(
                            format!("[{}] {}", index + 1, copy_buttons.label(index)),
                            Style::default().fg(Color::Magenta),
                        ),
                    ]));
                }
                None => lines.push(Line::from(Span::styled("──", fence_style))),
            },
        }
    }
    block_count
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let border_color = if app.input_mode == InputMode::Editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ");

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);

    frame.render_widget(input, area);

    // Show cursor when editing
    if app.input_mode == InputMode::Editing && app.dialog.is_none() {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let disabled_style = Style::default().bg(Color::Black).fg(Color::DarkGray);

    let hints = match app.input_mode {
        InputMode::Normal => {
            let mut hints = vec![
                Span::styled(" i ", key_style),
                Span::styled(" write ", label_style),
                Span::styled(" Tab ", key_style),
                Span::styled(" action ", label_style),
            ];
            if app.dictation_available() {
                hints.extend(vec![
                    Span::styled(" v ", key_style),
                    Span::styled(
                        if app.dictation_busy {
                            " listening... "
                        } else {
                            " dictate "
                        },
                        label_style,
                    ),
                ]);
            } else {
                // The control stays visible but communicates unavailability.
                hints.push(Span::styled(" dictation unavailable ", disabled_style));
            }
            hints.extend(vec![
                Span::styled(" 1-9 ", key_style),
                Span::styled(" copy code ", label_style),
                Span::styled(" r ", key_style),
                Span::styled(" reset ", label_style),
                Span::styled(" a ", key_style),
                Span::styled(" archive ", label_style),
                Span::styled(" S ", key_style),
                Span::styled(" system ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ]);
            hints
        }
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" action ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" done ", label_style),
        ],
    };

    let footer = Paragraph::new(Line::from(hints));
    frame.render_widget(footer, area);
}

fn render_dialog(app: &App, frame: &mut Frame, area: Rect) {
    match &app.dialog {
        Some(Dialog::Error(message)) => {
            render_alert(frame, area, " Error ", message, Color::Red);
        }
        Some(Dialog::Notice(message)) => {
            render_alert(frame, area, " Backend ", message, Color::Green);
        }
        Some(Dialog::Confirm(command)) => {
            let prompt = format!(
                "Are you sure you want to {} the chat?\n\n(y)es  (n)o",
                command.as_str()
            );
            render_alert(frame, area, " Confirm ", &prompt, Color::Yellow);
        }
        Some(Dialog::System(editor)) => render_system_editor(frame, area, editor),
        None => {}
    }
}

fn render_alert(frame: &mut Frame, area: Rect, title: &str, message: &str, color: Color) {
    let popup = centered_rect(area, 60, 30);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title);

    let body = Paragraph::new(message.to_string())
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(Clear, popup);
    frame.render_widget(body, popup);
}

fn render_system_editor(frame: &mut Frame, area: Rect, editor: &crate::app::SystemEditor) {
    let popup = centered_rect(area, 80, 70);

    let title = match editor.state {
        SystemEditorState::Loading => " System prompt (loading...) ",
        SystemEditorState::Editing => " System prompt (Ctrl+S save, Esc cancel) ",
        SystemEditorState::Saving => " System prompt (saving...) ",
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    let body = Paragraph::new(editor.content.clone())
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(Clear, popup);
    frame.render_widget(body, popup);
}

/// Centered popup rect sized as a percentage of `area`.
fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);

    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(middle);

    center
}
