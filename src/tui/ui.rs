use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, PanelView};
use crate::generation::PlatformState;

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(0),    // Active view
            Constraint::Length(1), // Status line
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    match app.view() {
        PanelView::NoApiKey => render_no_api_key(frame, chunks[1]),
        PanelView::QuotaExhausted => render_quota_exhausted(frame, chunks[1]),
        PanelView::Selection => render_selection(frame, app, chunks[1]),
        PanelView::Streaming => render_streaming(frame, app, chunks[1]),
        PanelView::Results => render_results(frame, app, chunks[1]),
    }

    render_status(frame, app, chunks[2]);

    if app.show_help {
        render_help(frame);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" TrueTone Social ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let line = Line::from(vec![
        Span::styled(
            format!(" Target: {} ", app.target_id),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("| {} generations left", app.remaining_generations),
            Style::default().fg(if app.remaining_generations == 0 {
                Color::Red
            } else {
                Color::Green
            }),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
}

fn render_no_api_key(frame: &mut Frame, area: Rect) {
    let text = "TrueTone API key not configured.\n\nPlease add your API key to:\n~/.config/truetone/config.toml\n\nExample:\napi_key = \"tt_...\"";
    let block = Block::default()
        .title(" Setup ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn render_quota_exhausted(frame: &mut Frame, area: Rect) {
    let text = "You've used all of your generations for this billing period.\n\nUpgrade your plan to keep generating social content.";
    let block = Block::default()
        .title(" Generation limit reached ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn render_selection(frame: &mut Frame, app: &App, area: Rect) {
    let visible = app.selection.visible();

    let items: Vec<ListItem> = visible
        .iter()
        .map(|&platform| {
            let config = platform.config();
            let marker = if app.selection.is_selected(platform) {
                "[x] "
            } else {
                "[ ] "
            };

            let mut spans = vec![
                Span::styled(marker, Style::default().fg(Color::White)),
                Span::styled(
                    format!("{:<10}", config.name),
                    Style::default().fg(config.accent),
                ),
                Span::styled(
                    format!(" up to {} chars", config.max_chars),
                    Style::default().fg(Color::DarkGray),
                ),
            ];

            if let Some(message) = app.store.error_message(platform) {
                spans.push(Span::styled(
                    format!("  ✗ {message}"),
                    Style::default().fg(Color::Red),
                ));
            }

            ListItem::new(Line::from(spans))
        })
        .collect();

    let title = if app.add_more {
        " Generate more platforms "
    } else {
        " Select platforms "
    };

    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(app.selection.cursor()));

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_streaming(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(2, 3)])
        .split(area);

    let items: Vec<ListItem> = app
        .in_flight_platforms()
        .into_iter()
        .map(|platform| {
            let config = platform.config();
            let (icon, style) = match app.store.state(platform) {
                PlatformState::Streaming => (app.spinner(), Style::default().fg(Color::Yellow)),
                PlatformState::Completed => ("✓", Style::default().fg(Color::Green)),
                PlatformState::Errored(_) => ("✗", Style::default().fg(Color::Red)),
                PlatformState::Idle => ("·", Style::default().fg(Color::DarkGray)),
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{icon} "), style),
                Span::styled(
                    format!("{} {}", config.icon, config.name),
                    Style::default().fg(config.accent),
                ),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Generating ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    frame.render_widget(list, chunks[0]);

    // Partial text as it streams in, platform by platform
    let mut lines: Vec<Line> = Vec::new();
    for platform in app.in_flight_platforms() {
        let config = platform.config();
        lines.push(Line::from(Span::styled(
            format!("─ {} ─", config.name),
            Style::default()
                .fg(config.accent)
                .add_modifier(Modifier::BOLD),
        )));
        let body = match app.store.state(platform) {
            PlatformState::Streaming => app
                .store
                .partial(platform)
                .unwrap_or("Waiting for the first words...")
                .to_string(),
            PlatformState::Completed => app.store.content(platform).unwrap_or("").to_string(),
            PlatformState::Errored(message) => format!("Failed: {message}"),
            PlatformState::Idle => "Queued".to_string(),
        };
        for text_line in body.lines() {
            lines.push(Line::from(text_line.to_string()));
        }
        lines.push(Line::from(""));
    }

    let paragraph = Paragraph::new(lines)
        .block(Block::default().title(" Drafts ").borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, chunks[1]);
}

fn render_results(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(2, 3)])
        .split(area);

    let completed = app.store.completed_platforms();

    let items: Vec<ListItem> = completed
        .iter()
        .map(|&platform| {
            let config = platform.config();
            let count = app
                .store
                .content(platform)
                .map(|c| c.chars().count())
                .unwrap_or(0);
            let over_limit = count > config.max_chars;

            let mut spans = vec![Span::styled(
                format!("{:>2} {:<10}", config.icon, config.name),
                Style::default().fg(config.accent),
            )];
            spans.push(Span::styled(
                format!("{count}/{} ", config.max_chars),
                if over_limit {
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::DarkGray)
                },
            ));
            if over_limit {
                spans.push(Span::styled("⚠ ", Style::default().fg(Color::Red)));
            }
            if app.is_saving(platform) {
                spans.push(Span::styled("saving… ", Style::default().fg(Color::Yellow)));
            } else if app.is_saved(platform) {
                spans.push(Span::styled("✓ saved ", Style::default().fg(Color::Green)));
            }
            if app.is_copied(platform) {
                spans.push(Span::styled("copied", Style::default().fg(Color::Cyan)));
            }

            ListItem::new(Line::from(spans))
        })
        .collect();

    let title = if app.all_saved() {
        " Generated content (all saved) "
    } else {
        " Generated content "
    };

    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(app.results_cursor));
    frame.render_stateful_widget(list, chunks[0], &mut state);

    let (title, content) = match app.selected_result() {
        Some(platform) => {
            let config = platform.config();
            let content = app.store.content(platform).unwrap_or("").to_string();
            let title = match app.store.generated_at(platform) {
                Some(at) => format!(" {} (generated {}) ", config.name, at.format("%H:%M")),
                None => format!(" {} ", config.name),
            };
            (title, content)
        }
        None => (" Content ".to_string(), String::new()),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));
    frame.render_widget(
        Paragraph::new(content).block(block).wrap(Wrap { trim: false }),
        chunks[1],
    );
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if let Some(notice) = app.notice() {
        let color = if notice.is_error { Color::Red } else { Color::Green };
        (notice.text.clone(), Style::default().fg(color))
    } else {
        let hint = match app.view() {
            PanelView::NoApiKey | PanelView::QuotaExhausted => "q:quit  ?:help",
            PanelView::Selection => {
                if app.can_generate() {
                    "space:toggle  a:all  x:clear  Enter:generate  ?:help  q:quit"
                } else {
                    "space:toggle  a:all  x:clear  ?:help  q:quit"
                }
            }
            PanelView::Streaming => "Esc:cancel  q:quit",
            PanelView::Results => {
                if app.can_generate_more() {
                    "c:copy  s:save  S:save all  g:regenerate  n:more  R:start over  q:quit"
                } else {
                    "c:copy  s:save  S:save all  g:regenerate  R:start over  q:quit"
                }
            }
        };
        (hint.to_string(), Style::default().fg(Color::DarkGray))
    };

    frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(50, 60, frame.area());

    let help_text = vec![
        "",
        " Selection:",
        "   j / ↓    Move down",
        "   k / ↑    Move up",
        "   space    Toggle platform",
        "   a        Select all",
        "   x        Clear selection",
        "   Enter    Generate",
        "",
        " While generating:",
        "   Esc      Cancel (keeps finished drafts)",
        "",
        " Results:",
        "   c        Copy to clipboard",
        "   s        Save platform",
        "   S        Save all",
        "   g        Regenerate platform",
        "   n        Generate more platforms",
        "   R        Start over",
        "",
        " General:",
        "   ?        Toggle this help",
        "   q        Quit",
        "",
        " Press any key to close",
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_text.join("\n"))
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(ratatui::widgets::Clear, area);
    frame.render_widget(paragraph, area);
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
