//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! ## For contributors
//!
//! * The layout is a two-row split: the main panel on top and a one-line
//!   status bar at the bottom.
//! * The main panel is one of three screens, chosen by [`FetchState`]:
//!   loading, error, or the selected entry.
//! * [`ratatui`] is the TUI framework; see its docs for widget details.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::error::FetchError;
use crate::source::{RemoteItem, PLACEHOLDER_IMAGE_URL, SUMMARY_CHARS};
use crate::state::FetchState;

/// Draw the complete UI for one frame.
pub fn draw(app: &App, frame: &mut Frame) {
    let [main_area, status_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    match &app.state {
        FetchState::Loading { .. } => draw_loading(frame, main_area),
        FetchState::Error(err) => draw_error(err, frame, main_area),
        FetchState::Ready { .. } => draw_entry(&app.state, frame, main_area),
    }
    draw_status_bar(app, frame, status_area);
}

fn panel(title: &str) -> Block<'_> {
    Block::default().title(title).borders(Borders::ALL)
}

fn draw_loading(frame: &mut Frame, area: Rect) {
    let text = Paragraph::new("Loading NASA Picture of the Day...")
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center)
        .block(panel(" TerraLens "));
    frame.render_widget(text, area);
}

fn draw_error(err: &FetchError, frame: &mut Frame, area: Rect) {
    let title = if err.is_rate_limited() {
        "Connection Error (rate limited)"
    } else {
        "Connection Error"
    };
    let text = Paragraph::new(vec![
        Line::from(Span::styled(
            title,
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::raw(err.to_string()),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(panel(" TerraLens "));
    frame.render_widget(text, area);
}

/// Render the selected entry with its navigation hints.
fn draw_entry(state: &FetchState, frame: &mut Frame, area: Rect) {
    let Some(item) = state.selected_item() else {
        return;
    };
    let (pos, len) = state.position().unwrap_or((1, 1));

    let nav = nav_line(state.can_go_older(), state.can_go_newer(), pos, len);
    let mut lines = vec![
        Line::from(Span::styled(
            format!("APOD: {}", item.date),
            Style::default().fg(Color::Blue),
        )),
        Line::from(Span::styled(
            item.title.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
    ];
    lines.extend(media_lines(item));
    lines.push(Line::raw(""));
    lines.push(Line::raw(item.summary(SUMMARY_CHARS)));
    lines.push(Line::raw(""));
    lines.push(nav);

    let text = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(panel(" NASA Picture of the Day "));
    frame.render_widget(text, area);
}

fn media_lines(item: &RemoteItem) -> Vec<Line<'static>> {
    let url = item.resolved_url().unwrap_or(PLACEHOLDER_IMAGE_URL).to_string();
    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!("[{}] ", item.kind.label()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(url, Style::default().fg(Color::DarkGray)),
    ])];
    if let Some(credit) = &item.copyright {
        lines.push(Line::from(Span::styled(
            format!("© {credit}"),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines
}

/// "◀ older  2/7  newer ▶", with unavailable directions dimmed.
fn nav_line(older: bool, newer: bool, pos: usize, len: usize) -> Line<'static> {
    let style = |enabled: bool| {
        if enabled {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };
    Line::from(vec![
        Span::styled("◀ older", style(older)),
        Span::raw(format!("  {pos}/{len}  ")),
        Span::styled("newer ▶", style(newer)),
    ])
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let count = app
        .state
        .window()
        .map(|w| format!("{} days", w.len()))
        .unwrap_or_default();
    let status = Paragraph::new(Line::from(vec![
        Span::styled(" ", Style::default()),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(count, Style::default().fg(Color::Green)),
        Span::raw("  q: quit  ←/→: older/newer  Home/End: jump  r: retry"),
    ]));
    frame.render_widget(status, area);
}
