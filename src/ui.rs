use crate::app::{Alert, App, PromptTab, Tab};
use crate::form::{FormField, UploadSource};
use crate::models::{
    self, ClassificationResult, ConfidenceLevel, HistoryItem, PromptItem, PromptTypes,
};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
};
use tui_textarea::TextArea;

const FOCUSED: Color = Color::Yellow;

pub fn render(f: &mut Frame, app: &mut App<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tabs
            Constraint::Min(5),    // Active view
            Constraint::Length(1), // Key hints
        ])
        .split(f.area());

    render_tabs(f, app, chunks[0]);

    match app.tab {
        Tab::Upload => render_upload(f, app, chunks[1]),
        Tab::Results => render_results(f, app, chunks[1]),
        Tab::History => render_history(f, app, chunks[1]),
        Tab::Prompts => render_prompts(f, app, chunks[1]),
    }

    let hints = Paragraph::new(key_hints(app)).style(Style::default().fg(Color::DarkGray));
    f.render_widget(hints, chunks[2]);

    if let Some(alert) = &app.alert {
        render_alert(f, alert);
    }
}

fn render_tabs(f: &mut Frame, app: &App<'_>, area: Rect) {
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| {
            let label = format!("F{} {}", i + 1, tab.title());
            if app.is_tab_enabled(*tab) {
                Line::from(label)
            } else {
                Line::from(Span::styled(label, Style::default().fg(Color::DarkGray)))
            }
        })
        .collect();

    let selected = Tab::ALL.iter().position(|t| *t == app.tab).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Email Classifier "),
        )
        .select(selected)
        .highlight_style(
            Style::default()
                .fg(FOCUSED)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, area);
}

fn field_style(focused: bool) -> Style {
    if focused {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    }
}

fn render_field(f: &mut Frame, textarea: &mut TextArea<'_>, title: &str, focused: bool, area: Rect) {
    textarea.set_block(
        Block::default()
            .borders(Borders::ALL)
            .title(title.to_string())
            .border_style(field_style(focused)),
    );
    // Only the focused field shows a cursor
    textarea.set_cursor_style(if focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    });
    f.render_widget(&*textarea, area);
}

fn render_upload(f: &mut Frame, app: &mut App<'_>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Source toggle
            Constraint::Length(3), // Subject / Sender / Recipient
            Constraint::Min(5),    // Content or file
            Constraint::Length(1), // Submit
        ])
        .split(area);

    let form = &mut app.form;

    let active = Style::default()
        .fg(Color::Black)
        .bg(Color::White)
        .add_modifier(Modifier::BOLD);
    let inactive = Style::default().fg(Color::Gray);
    let (text_style, file_style) = match form.source {
        UploadSource::Text => (active, inactive),
        UploadSource::File => (inactive, active),
    };
    let toggle = Line::from(vec![
        Span::raw(" Source: "),
        Span::styled(" Direct text ", text_style),
        Span::raw(" "),
        Span::styled(" File upload ", file_style),
        Span::styled("  (Ctrl-T to switch)", Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(toggle), chunks[0]);

    let meta = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ])
        .split(chunks[1]);

    let focused = form.focused_field;
    render_field(
        f,
        &mut form.subject,
        " Subject (optional) ",
        focused == FormField::Subject,
        meta[0],
    );
    render_field(
        f,
        &mut form.sender,
        " Sender (optional) ",
        focused == FormField::Sender,
        meta[1],
    );
    render_field(
        f,
        &mut form.recipient,
        " Recipient (optional) ",
        focused == FormField::Recipient,
        meta[2],
    );

    match form.source {
        UploadSource::Text => render_field(
            f,
            &mut form.content,
            " Email content * ",
            focused == FormField::Content,
            chunks[2],
        ),
        UploadSource::File => {
            let file_chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(2)])
                .split(chunks[2]);
            render_field(
                f,
                &mut form.file_path,
                " File (.txt or .pdf) * ",
                focused == FormField::Content,
                file_chunks[0],
            );

            let selected = match &form.selected_file {
                Some(file) => Text::from(vec![
                    Line::from(Span::styled(
                        file.name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(Span::styled(
                        file.size_label(),
                        Style::default().fg(Color::Gray),
                    )),
                    Line::from(Span::styled(
                        "Ctrl-X removes the file",
                        Style::default().fg(Color::DarkGray),
                    )),
                ]),
                None => Text::from(Line::from(Span::styled(
                    "No file selected. Type a path and press Enter, or drop a file onto the terminal.",
                    Style::default().fg(Color::DarkGray),
                ))),
            };
            let selected = Paragraph::new(selected)
                .block(Block::default().borders(Borders::ALL).title(" Selected file "))
                .wrap(Wrap { trim: true });
            f.render_widget(selected, file_chunks[1]);
        }
    }

    let submit = if app.submitting {
        Span::styled(
            " ⏳ Processing... ",
            Style::default().fg(FOCUSED).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(
            " [Ctrl-S] Classify email ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    };
    f.render_widget(
        Paragraph::new(Line::from(submit)).alignment(ratatui::layout::Alignment::Center),
        chunks[3],
    );
}

fn category_style(productive: bool) -> Style {
    let color = if productive { Color::Green } else { Color::Red };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn confidence_color(level: ConfidenceLevel) -> Color {
    match level {
        ConfidenceLevel::High => Color::Green,
        ConfidenceLevel::Medium => Color::Yellow,
        ConfidenceLevel::Low => Color::Red,
    }
}

fn label(text: &str) -> Span<'static> {
    Span::styled(text.to_string(), Style::default().fg(Color::Gray))
}

pub fn result_lines(
    result: &ClassificationResult,
    copied: bool,
    regenerating: bool,
) -> Vec<Line<'static>> {
    let email = &result.email;
    let classification = &result.classification;
    let percent = classification.confidence_percent();
    let level = ConfidenceLevel::from_percent(percent);
    let mark = if classification.is_productive() { "✔" } else { "✘" };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("{} {}", mark, classification.category),
                category_style(classification.is_productive()),
            ),
            Span::raw("   "),
            label("Confidence: "),
            Span::styled(
                format!("{}%", percent),
                Style::default().fg(confidence_color(level)),
            ),
        ]),
    ];
    if let Some(sub) = &classification.subcategory {
        lines.push(Line::from(vec![
            label("Subcategory: "),
            Span::raw(models::subcategory_label(sub)),
        ]));
    }
    lines.push(Line::from(vec![
        label("Processing time: "),
        Span::raw(classification.processing_time_label()),
        Span::raw("   "),
        label("Classified at: "),
        Span::raw(models::format_timestamp(&classification.created_at)),
    ]));
    lines.push(Line::default());

    lines.push(Line::from(Span::styled(
        "Email",
        Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    )));
    if let Some(subject) = &email.subject {
        lines.push(Line::from(vec![label("Subject: "), Span::raw(subject.clone())]));
    }
    if let Some(sender) = &email.sender {
        lines.push(Line::from(vec![label("Sender: "), Span::raw(sender.clone())]));
    }
    if let Some(file_name) = &email.file_name {
        lines.push(Line::from(vec![label("File: "), Span::raw(file_name.clone())]));
    }
    lines.push(Line::default());
    for line in clean_body(&email.content).lines() {
        lines.push(Line::from(line.to_string()));
    }
    lines.push(Line::default());

    if let Some(response) = &classification.suggested_response {
        let mut heading = vec![Span::styled(
            "Suggested response",
            Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )];
        if regenerating {
            heading.push(Span::styled(
                "  ⏳ Generating...",
                Style::default().fg(FOCUSED),
            ));
        }
        if copied {
            heading.push(Span::styled("  Copied!", Style::default().fg(Color::Green)));
        }
        lines.push(Line::from(heading));
        for line in clean_body(response).lines() {
            lines.push(Line::from(Span::styled(
                line.to_string(),
                Style::default().fg(Color::Cyan),
            )));
        }
    }

    lines
}

fn render_results(f: &mut Frame, app: &mut App<'_>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Classification Result ")
        .border_style(Style::default().fg(FOCUSED));

    let Some(result) = &app.result else {
        let empty = Paragraph::new("No classification yet").block(block);
        f.render_widget(empty, area);
        return;
    };

    let copied = result
        .classification
        .suggested_response
        .as_deref()
        .map(|r| app.copy_feedback.is_copied(r))
        .unwrap_or(false);

    let paragraph = Paragraph::new(result_lines(result, copied, app.regenerating))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.results_scroll, 0));
    f.render_widget(paragraph, area);
}

fn history_item_text(item: &HistoryItem, expanded: bool, width: usize) -> Text<'static> {
    let productive = item.is_productive();
    let mark = if productive { "✔" } else { "✘" };
    let subject = item.email_subject.as_deref().unwrap_or("(No Subject)");
    let sender = item.email_sender.as_deref().unwrap_or("Sender not provided");
    let category = item.classification_category.as_deref().unwrap_or("-");

    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{} ", mark), category_style(productive)),
            Span::styled(
                truncate(subject, width.saturating_sub(4)),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::raw("  "),
            label(&truncate(sender, width.saturating_sub(4))),
        ]),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(category.to_string(), category_style(productive)),
            Span::raw("  "),
            label(&models::format_timestamp(&item.created_at)),
        ]),
    ];

    if expanded {
        if let Some(confidence) = item.classification_confidence {
            lines.push(Line::from(vec![
                label("  Confidence: "),
                Span::raw(format!("{}%", models::confidence_percent(confidence))),
            ]));
        }
        if let Some(content) = &item.email_content {
            lines.push(Line::from(label("  Content:")));
            for line in clean_body(content).lines() {
                lines.push(Line::from(format!("    {}", line)));
            }
        }
        if let Some(response) = &item.classification_suggested_response {
            lines.push(Line::from(label("  Suggested response:")));
            for line in clean_body(response).lines() {
                lines.push(Line::from(Span::styled(
                    format!("    {}", line),
                    Style::default().fg(Color::Cyan),
                )));
            }
        }
    }

    Text::from(lines)
}

fn render_history(f: &mut Frame, app: &mut App<'_>, area: Rect) {
    let history = &app.history;
    let first = history.skip as usize + 1;
    let last = history.skip as usize + history.items.len();
    let title = match history.total {
        Some(total) if !history.items.is_empty() => {
            format!(" Classification History ({}-{} of {}) ", first, last, total)
        }
        _ => " Classification History ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(FOCUSED));

    if history.loading {
        let loading = Paragraph::new("⏳ Loading history…")
            .block(block)
            .style(Style::default().fg(FOCUSED));
        f.render_widget(loading, area);
        return;
    }
    if history.items.is_empty() {
        let empty = Paragraph::new(
            "No emails classified yet\n\nUpload an email to get started.",
        )
        .block(block)
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true });
        f.render_widget(empty, area);
        return;
    }

    let width = area.width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = history
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let text = history_item_text(item, history.is_expanded(item.id), width);
            let style = if i == history.selected {
                Style::default().fg(FOCUSED)
            } else {
                Style::default()
            };
            ListItem::new(text).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_symbol("█");
    let mut state = ListState::default().with_selected(Some(history.selected));
    f.render_stateful_widget(list, area, &mut state);
}

fn prompt_item_text(prompt: &PromptItem, types: &PromptTypes, width: usize) -> Text<'static> {
    let productive = models::is_productive(&prompt.category);
    let badge = |text: String, bg: Color| {
        Span::styled(
            format!(" {} ", text),
            Style::default().fg(Color::White).bg(bg),
        )
    };
    let mut header = vec![
        badge(types.label_for(&prompt.prompt_type), Color::Blue),
        Span::raw(" "),
        badge(
            types.label_for(&prompt.category),
            if productive { Color::Green } else { Color::Red },
        ),
    ];
    if let Some(sub) = &prompt.subcategory {
        header.push(Span::raw(" "));
        header.push(badge(models::subcategory_label(sub), Color::DarkGray));
    }
    if prompt.is_active {
        header.push(Span::styled("  active", Style::default().fg(Color::Green)));
    }
    header.push(label(&format!("  v{}", prompt.version)));

    let mut lines = vec![Line::from(header)];
    for line in prompt.content.lines() {
        lines.push(Line::from(format!("  {}", truncate(line, width.saturating_sub(4)))));
    }
    lines.push(Line::from(label(&format!(
        "  Created: {}",
        models::format_timestamp(&prompt.created_at)
    ))));
    Text::from(lines)
}

fn render_prompts(f: &mut Frame, app: &mut App<'_>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(area);

    let prompts = &mut app.prompts;

    let tab_label = |tab: PromptTab, name: &str, color: Color| {
        let text = format!(" {} ({}) ", name, prompts.count_for(tab));
        if prompts.tab == tab {
            Span::styled(
                text,
                Style::default()
                    .fg(Color::White)
                    .bg(color)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(text, Style::default().fg(Color::Gray))
        }
    };
    let header = Line::from(vec![
        tab_label(PromptTab::Productive, "Productive", Color::Green),
        Span::raw(" "),
        tab_label(PromptTab::Unproductive, "Unproductive", Color::Red),
        Span::styled("  (Tab to switch)", Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(header), chunks[0]);

    if let Some(editor) = &mut prompts.editing {
        let title = match editor.id {
            Some(id) => format!(" Editing prompt #{} [Ctrl-S to Save, Esc to Cancel] ", id),
            None => format!(
                " New {} prompt [Ctrl-S to Create, Esc to Cancel] ",
                prompts.types.label_for(&editor.category)
            ),
        };
        render_field(f, &mut editor.textarea, &title, true, chunks[1]);
        return;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Prompt Manager ")
        .border_style(Style::default().fg(FOCUSED));

    if prompts.loading {
        let loading = Paragraph::new("⏳ Loading prompts…")
            .block(block)
            .style(Style::default().fg(FOCUSED));
        f.render_widget(loading, chunks[1]);
        return;
    }

    let visible = prompts.visible();
    if visible.is_empty() {
        let empty = Paragraph::new("No prompts found")
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(empty, chunks[1]);
        return;
    }

    let width = chunks[1].width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = visible
        .iter()
        .enumerate()
        .map(|(i, prompt)| {
            let style = if i == prompts.selected {
                Style::default().fg(FOCUSED)
            } else {
                Style::default()
            };
            ListItem::new(prompt_item_text(prompt, &prompts.types, width)).style(style)
        })
        .collect();

    let list = List::new(items).block(block).highlight_symbol("█");
    let mut state = ListState::default().with_selected(Some(prompts.selected));
    f.render_stateful_widget(list, chunks[1], &mut state);
}

fn render_alert(f: &mut Frame, alert: &Alert) {
    let area = centered_rect(60, 30, f.area());
    f.render_widget(Clear, area);

    let color = if alert.on_confirm.is_some() {
        Color::Yellow
    } else {
        Color::Red
    };
    let block = Block::default()
        .title(format!(" {} ", alert.title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));

    let footer = if alert.on_confirm.is_some() {
        "[Enter] Confirm   [Esc] Cancel"
    } else {
        "[Enter] OK"
    };
    let text = Text::from(vec![
        Line::from(alert.message.clone()),
        Line::default(),
        Line::from(Span::styled(footer, Style::default().fg(Color::Gray))),
    ]);
    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn key_hints(app: &App<'_>) -> String {
    let tab_hint = match app.tab {
        Tab::Upload => "Tab next field · Ctrl-T text/file · Ctrl-S classify",
        Tab::Results => "c copy response · r regenerate · n new email · ↑↓ scroll",
        Tab::History => "↑↓ select · Enter expand · PgUp/PgDn page · Ctrl-R reload",
        Tab::Prompts if app.prompts.editing.is_some() => "Ctrl-S save · Esc cancel",
        Tab::Prompts => "↑↓ select · Tab category · n new · e edit · d delete · Ctrl-R reload",
    };
    format!(" {} · F1-F4 views · Ctrl-Q quit", tab_hint)
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn truncate(s: &str, len: usize) -> String {
    if s.chars().count() > len {
        let truncated: String = s.chars().take(len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}

/// Normalizes line endings, trims trailing whitespace and collapses runs of
/// blank lines down to one.
fn clean_body(body: &str) -> String {
    let normalized = body.replace("\r\n", "\n").replace('\r', "\n");
    let mut result = String::with_capacity(normalized.len());
    let mut blank_run = 0;

    for line in normalized.split('\n') {
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            blank_run += 1;
            continue;
        }
        if !result.is_empty() {
            let newlines = std::cmp::min(blank_run + 1, 2);
            for _ in 0..newlines {
                result.push('\n');
            }
        }
        result.push_str(trimmed);
        blank_run = 0;
    }

    result
}
