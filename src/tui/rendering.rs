use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

use super::app::App;
use super::focus::provider_field_order;
use super::models::{LoggingField, ProviderField, RenameBehaviorField, Section, TextInput, ValidationStatus};

fn focused_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    }
}

fn checkbox(checked: bool) -> &'static str {
    if checked { "[x]" } else { "[ ]" }
}

/// Show only the last four characters of a key.
fn mask(key: &str) -> String {
    let len = key.chars().count();
    let visible = len.saturating_sub(4);
    key.chars()
        .enumerate()
        .map(|(i, c)| if i < visible { '*' } else { c })
        .collect()
}

fn place_cursor(text: &str, cursor: usize) -> String {
    let mut shown: String = text.chars().take(cursor).collect();
    shown.push('|');
    shown.extend(text.chars().skip(cursor));
    shown
}

fn with_cursor(input: &TextInput, focused: bool) -> String {
    if !focused {
        return input.as_str().to_string();
    }
    place_cursor(input.as_str(), input.cursor())
}

/// Masked key with the cursor marker where edits will land.
fn masked_with_cursor(input: &TextInput, focused: bool) -> String {
    let masked = mask(input.as_str());
    if !focused {
        return masked;
    }
    place_cursor(&masked, input.cursor())
}

fn status_span(status: ValidationStatus) -> Span<'static> {
    match status {
        ValidationStatus::Unknown => Span::styled("", Style::default()),
        ValidationStatus::Validating => Span::styled(" validating...", Style::default().fg(Color::Yellow)),
        ValidationStatus::Valid => Span::styled(" valid", Style::default().fg(Color::Green)),
        ValidationStatus::Invalid => Span::styled(" invalid", Style::default().fg(Color::Red)),
    }
}

pub fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(10), Constraint::Length(3)])
        .split(f.area());

    let header = Paragraph::new("Media Rename - Configuration")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
    f.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(22), Constraint::Min(30)])
        .split(chunks[1]);

    render_section_list(f, body[0], app);
    match app.section() {
        Section::RenameBehavior => render_rename_behavior(f, body[1], app),
        Section::Logging => render_logging(f, body[1], app),
        Section::Providers => render_providers(f, body[1], app),
        section => render_template(f, body[1], app, section),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_section_list(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = Section::ALL
        .into_iter()
        .map(|section| ListItem::new(section.title()).style(focused_style(section == app.section())))
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Sections"));
    f.render_widget(list, area);
}

fn render_template(f: &mut Frame, area: Rect, app: &App, section: Section) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(5), Constraint::Min(3)])
        .split(area);

    let template = app
        .templates()
        .get(section)
        .map(|input| with_cursor(input, true))
        .unwrap_or_default();
    let input = Paragraph::new(template)
        .style(focused_style(true))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(section.title())
                .border_style(Style::default().fg(Color::Yellow)),
        );
    f.render_widget(input, chunks[0]);

    let preview = Paragraph::new(app.preview(section).unwrap_or_default().to_string())
        .style(Style::default().fg(Color::Green))
        .wrap(Wrap { trim: false })
        .scroll((app.preview_scroll(), 0))
        .block(Block::default().borders(Borders::ALL).title("Preview"));
    f.render_widget(preview, chunks[1]);

    let items: Vec<ListItem> = app
        .variables()
        .into_iter()
        .map(|var| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<20}", var.token()), Style::default().fg(Color::Cyan)),
                Span::raw(var.description),
                Span::styled(format!("  e.g. {}", var.example), Style::default().fg(Color::Gray)),
            ]))
        })
        .collect();
    let variables = List::new(items).block(Block::default().borders(Borders::ALL).title("Variables"));
    f.render_widget(variables, chunks[2]);
}

fn render_rename_behavior(f: &mut Frame, area: Rect, app: &App) {
    let rename = app.rename();
    let lines = vec![
        Line::from(Span::styled(
            format!("{} Include subtitles", checkbox(rename.include_subtitles)),
            focused_style(rename.focus == RenameBehaviorField::IncludeSubtitles),
        )),
        Line::from(Span::styled(
            format!("{} Dry run", checkbox(rename.dry_run)),
            focused_style(rename.focus == RenameBehaviorField::DryRun),
        )),
    ];

    let panel = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL).title("Rename Behavior"));
    f.render_widget(panel, area);
}

fn render_logging(f: &mut Frame, area: Rect, app: &App) {
    let logging = app.logging();
    let retention_focused = logging.focus == LoggingField::RetentionDays;
    let lines = vec![
        Line::from(Span::styled(
            format!("{} Write log files", checkbox(logging.enabled)),
            focused_style(logging.focus == LoggingField::Enabled),
        )),
        Line::from(Span::styled(
            format!("Retention (days): {}", with_cursor(&logging.retention_days, retention_focused)),
            focused_style(retention_focused),
        )),
    ];

    let panel = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL).title("Logging"));
    f.render_widget(panel, area);
}

fn render_providers(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(6)])
        .split(area);

    let providers = app.providers();
    let lines: Vec<Line> = provider_field_order(providers)
        .into_iter()
        .map(|field| {
            let focused = providers.focus == field;
            let style = focused_style(focused);
            match field {
                ProviderField::WorkerCount => Line::from(Span::styled(
                    format!("Workers: {}", with_cursor(&providers.worker_count, focused)),
                    style,
                )),
                ProviderField::FFProbeToggle => Line::from(Span::styled(
                    format!("{} FFProbe", checkbox(providers.ffprobe_enabled)),
                    style,
                )),
                ProviderField::Toggle(provider) => {
                    let service = providers.service(provider);
                    Line::from(vec![
                        Span::styled(format!("{} {}", checkbox(service.enabled), provider), style),
                        status_span(service.validation.status),
                    ])
                }
                ProviderField::ApiKey(provider) => {
                    let shown = masked_with_cursor(&providers.service(provider).api_key, focused);
                    Line::from(Span::styled(format!("    API key: {shown}"), style))
                }
                ProviderField::Language(provider) => {
                    let language = providers
                        .service(provider)
                        .language
                        .as_ref()
                        .map(|l| with_cursor(l, focused))
                        .unwrap_or_default();
                    Line::from(Span::styled(format!("    Language: {language}"), style))
                }
            }
        })
        .collect();

    let panel = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL).title("Providers"));
    f.render_widget(panel, chunks[0]);

    let previews: Vec<Line> = Section::ALL
        .into_iter()
        .filter_map(|section| {
            let preview = app.preview(section)?;
            Some(Line::from(vec![
                Span::styled(format!("{:<14}", section.title()), Style::default().fg(Color::Gray)),
                Span::styled(preview.to_string(), Style::default().fg(Color::Green)),
            ]))
        })
        .collect();
    let previews = Paragraph::new(Text::from(previews)).block(Block::default().borders(Borders::ALL).title("Previews"));
    f.render_widget(previews, chunks[1]);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let status = Paragraph::new(app.status_message().unwrap_or_default().to_string())
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, chunks[0]);

    let controls = Paragraph::new("Tab: section  Ctrl+S: save  Ctrl+R: reset  Esc: quit")
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Controls"));
    f.render_widget(controls, chunks[1]);
}
