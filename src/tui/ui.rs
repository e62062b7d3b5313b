use ratatui::prelude::*;
use ratatui::widgets::{Block, Clear, Gauge, Paragraph, Wrap};
use crate::tui::app::{InputMode, QuizApp};

pub fn draw(frame: &mut Frame, app: &QuizApp) {
    let area = frame.area();

    // Handle very small terminal sizes gracefully
    if area.height < 10 || area.width < 40 {
        let msg = Paragraph::new("Terminal too small")
            .alignment(Alignment::Center);
        frame.render_widget(msg, area);
        return;
    }

    // Layout: Title(1) + Gauge(1) + gap(1) + Question(fill) + Status(1)
    let chunks = Layout::vertical([
        Constraint::Length(1),  // Title bar
        Constraint::Length(1),  // Progress gauge
        Constraint::Length(1),
        Constraint::Fill(1),    // Question and choices
        Constraint::Length(1),  // Status bar
    ])
    .split(area);

    render_title(frame, chunks[0], app);
    render_progress(frame, chunks[1], app);
    render_question(frame, chunks[3], app);
    render_status_bar(frame, chunks[4], app);

    match app.input_mode {
        InputMode::Help => render_help_popup(frame, app),
        InputMode::ConfirmSubmit => render_confirm_popup(frame, app),
        InputMode::Answering => {}
    }
}

fn render_title(frame: &mut Frame, area: Rect, app: &QuizApp) {
    let theme = &app.theme;
    let left = "CoupleFin";
    let right = format!("Question {}/{}", app.current + 1, app.total());
    let middle = format!("  {}", app.title);
    let padding_len = (area.width as usize)
        .saturating_sub(left.len() + middle.chars().count() + right.len());

    let title = Line::from(vec![
        Span::styled(left, Style::default().fg(theme.title_color).bold()),
        Span::styled(middle, Style::default().fg(theme.muted)),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right, Style::default().fg(theme.muted)),
    ]);
    frame.render_widget(Paragraph::new(title), area);
}

fn render_progress(frame: &mut Frame, area: Rect, app: &QuizApp) {
    let label = format!("{}/{} answered", app.answered_count(), app.total());
    let gauge = Gauge::default()
        .gauge_style(
            Style::default()
                .fg(app.theme.gauge_filled)
                .bg(app.theme.gauge_empty),
        )
        .ratio(app.progress().clamp(0.0, 1.0))
        .label(label);
    frame.render_widget(gauge, area);
}

fn render_question(frame: &mut Frame, area: Rect, app: &QuizApp) {
    let theme = &app.theme;
    let Some(question) = app.current_question() else {
        frame.render_widget(Paragraph::new("No questions in the catalog."), area);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(question.category.display_name(), theme.category_style)),
        Line::from(""),
        Line::from(Span::styled(question.text.clone(), theme.question_style)),
        Line::from(""),
    ];

    let answered = app.current_answer();
    for value in app.scale.values() {
        let label = app.scale.label(value).unwrap_or_default();
        let marker = if answered == Some(value) { "●" } else { " " };
        let mut spans = vec![
            Span::styled(format!(" {} ", marker), Style::default().fg(theme.choice_answered)),
            Span::styled(format!("{}", value), Style::default().fg(theme.choice_key).bold()),
            Span::raw(format!("  {}", label)),
        ];
        if value == app.cursor {
            spans = spans
                .into_iter()
                .map(|span| span.patch_style(theme.choice_cursor))
                .collect();
        }
        lines.push(Line::from(spans));
    }

    let block = Block::bordered().border_style(Style::default().fg(theme.muted));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &QuizApp) {
    let theme = &app.theme;
    let digits = digit_hint(app, "-");
    let text = if let Some((ref msg, _)) = app.flash_message {
        let msg_color = if msg.starts_with("Error") {
            theme.flash_error
        } else {
            theme.flash_success
        };
        Line::from(Span::styled(msg.clone(), Style::default().fg(msg_color)))
    } else {
        let hints = [
            (digits.as_str(), ":answer "),
            ("j/k", ":move "),
            ("Enter", ":pick "),
            ("n/p", ":next/prev "),
            ("s", ":submit "),
            ("?", ":help "),
            ("q", ":save & quit"),
        ];
        let mut spans = Vec::new();
        for (i, (key, label)) in hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(*key, Style::default().fg(theme.status_key_color)));
            spans.push(Span::raw(*label));
        }
        Line::from(spans)
    };

    frame.render_widget(
        Paragraph::new(text).style(Style::default().bg(theme.status_bar_bg)),
        area,
    );
}

/// Digit keys that pick an answer, e.g. "1-4", or "j/k" when none do
fn digit_hint(app: &QuizApp, separator: &str) -> String {
    match app.digit_range() {
        Some((low, high)) if low == high => low.to_string(),
        Some((low, high)) => format!("{}{}{}", low, separator, high),
        None => "j/k".to_string(),
    }
}

/// Create a centered rectangle with fixed width and height
fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect {
        x,
        y,
        width,
        height,
    }
}

fn popup_block<'a>(title: &'a str, app: &QuizApp) -> Block<'a> {
    Block::bordered()
        .title(title)
        .title_style(app.theme.popup_title)
        .border_style(Style::default().fg(app.theme.popup_border))
        .style(Style::default().bg(app.theme.popup_bg))
}

fn render_confirm_popup(frame: &mut Frame, app: &QuizApp) {
    let popup_area = centered_rect_fixed(46, 5, frame.area());
    frame.render_widget(Clear, popup_area);

    let block = popup_block(" Submit answers? ", app);
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let lines = vec![
        Line::from("Submitted answers can no longer be changed."),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", Style::default().fg(app.theme.status_key_color).bold()),
            Span::raw(": submit   "),
            Span::styled("n / Esc", Style::default().fg(app.theme.status_key_color).bold()),
            Span::raw(": keep editing"),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render the help overlay popup
fn render_help_popup(frame: &mut Frame, app: &QuizApp) {
    let extra = u16::from(app.needs_cursor_keys());
    let popup_area = centered_rect_fixed(50, 14 + extra, frame.area());
    frame.render_widget(Clear, popup_area);

    let block = popup_block(" Keyboard Shortcuts ", app);
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let key_style = Style::default().fg(app.theme.status_key_color).bold();
    let digit_key = format!("{:<14}", digit_hint(app, " - "));
    let mut entries = vec![
        (digit_key.as_str(), "Answer the current question"),
        ("j / Down      ", "Highlight next choice"),
        ("k / Up        ", "Highlight previous choice"),
        ("Enter / Space ", "Pick the highlighted choice"),
        ("n / Right     ", "Next question"),
        ("p / Left      ", "Previous question"),
        ("s             ", "Submit (all questions answered)"),
        ("q             ", "Save progress and quit"),
        ("Ctrl-c        ", "Quit without saving"),
        ("?             ", "Show/hide this help"),
    ];
    if app.needs_cursor_keys() {
        entries.insert(1, ("              ", "Other values: j/k then Enter"));
    }
    let mut help_lines: Vec<Line> = entries
        .iter()
        .map(|(key, text)| Line::from(vec![Span::styled(*key, key_style), Span::raw(*text)]))
        .collect();
    help_lines.push(Line::from(""));
    help_lines.push(Line::from(Span::styled(
        "Press any key to close",
        Style::default().fg(app.theme.muted),
    )));

    frame.render_widget(Paragraph::new(help_lines), inner);
}
