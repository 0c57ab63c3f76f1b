use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use crate::app::{App, ChatMessage, ChatRole, MessageBody, SessionPhase};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat history, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

/// Lines for one chat entry. Pure: no frame or terminal involved.
pub fn message_lines(msg: &ChatMessage) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    match msg.role {
        ChatRole::User => {
            lines.push(Line::from(Span::styled(
                "You:",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
        }
        ChatRole::Bot => {
            lines.push(Line::from(Span::styled(
                "Agent:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
        }
    }

    if let MessageBody::Annotated { platform, task, .. } = &msg.body {
        let mut badges = vec![Span::styled(
            format!(" {} ", platform),
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )];
        if let Some(task) = task {
            badges.push(Span::raw(" "));
            badges.push(Span::styled(
                format!(" {} ", task),
                Style::default()
                    .bg(Color::Magenta)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        lines.push(Line::from(badges));
    }

    for line in msg.text().lines() {
        lines.push(Line::from(line.to_string()));
    }
    lines.push(Line::default());

    lines
}

/// Typing indicator shown while a request is in flight. The dot count
/// follows the animation frame: ".", "..", "...".
pub fn typing_lines(animation_frame: u8) -> Vec<Line<'static>> {
    let dots = ".".repeat((animation_frame as usize) + 1);
    vec![
        Line::from(Span::styled(
            "Agent:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("Typing{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
    ]
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" CDP Support Assistant ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!(" {} ", app.agent.base_url()),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(title), area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Chat ");

    let mut lines: Vec<Line> = Vec::new();
    for msg in &app.messages {
        lines.extend(message_lines(msg));
    }
    if app.is_awaiting() {
        lines.extend(typing_lines(app.animation_frame));
    }

    let chat = Paragraph::new(lines)
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    // The send affordance: label and border flip while a request is
    // outstanding, back to the default once it settles
    let (title, border_color) = match app.phase {
        SessionPhase::Idle => (" Ask (Enter to send) ", Color::Yellow),
        SessionPhase::AwaitingResponse => (" Sending... ", Color::DarkGray),
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app.input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    // The input keeps focus at all times, in flight included
    let cursor_x = (cursor_pos - scroll_offset) as u16;
    frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let phase_chip = match app.phase {
        SessionPhase::Idle => {
            Span::styled(" READY ", Style::default().bg(Color::Blue).fg(Color::White))
        }
        SessionPhase::AwaitingResponse => {
            Span::styled(" SENDING ", Style::default().bg(Color::Yellow).fg(Color::Black))
        }
    };

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut spans = vec![phase_chip, Span::raw(" ")];
    spans.extend(vec![
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(" ↑/↓ ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" ^d/^u ", key_style),
        Span::styled(" page ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
