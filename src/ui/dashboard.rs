//! Dashboard rendering: the installed/outdated panels, sub-mode overlays,
//! and the status bar.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use crate::events::dashboard::viewport_height;
use crate::state::{AppState, DashboardMode, Package, Panel};
use crate::theme::{Theme, theme};

/// Render the dashboard screen.
pub fn render(f: &mut Frame, app: &AppState) {
    let th = theme();
    let area = f.area();

    if app.is_loading {
        render_loading(f, area, &th);
        return;
    }

    let overlay_h: u16 = match app.dashboard.mode {
        DashboardMode::Confirm(_) | DashboardMode::AddInput { .. } => 1,
        _ => 0,
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(overlay_h),
            Constraint::Length(1),
        ])
        .split(area);

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);

    render_installed_panel(f, panels[0], app, &th);
    render_outdated_panel(f, panels[1], app, &th);

    match &app.dashboard.mode {
        DashboardMode::Confirm(confirm) => {
            let prompt = format!("  {} {}? [y/N] ", confirm.action.label(), confirm.target);
            f.render_widget(
                Paragraph::new(prompt).style(Style::default().fg(th.yellow)),
                chunks[1],
            );
        }
        DashboardMode::AddInput { buffer } => {
            let line = Line::from(vec![
                Span::styled("  Add package: ", Style::default().fg(th.blue)),
                Span::styled(buffer.clone(), Style::default().fg(th.cyan)),
                Span::styled("█", Style::default().fg(th.orange)),
            ]);
            f.render_widget(Paragraph::new(line), chunks[1]);
        }
        _ => {}
    }

    render_status_bar(f, chunks[2], app, &th);
}

/// Centered placeholder while a reload or mutating command is in flight.
fn render_loading(f: &mut Frame, area: Rect, th: &Theme) {
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Length(1),
            Constraint::Percentage(50),
        ])
        .split(area);
    f.render_widget(
        Paragraph::new("Loading packages...")
            .alignment(Alignment::Center)
            .style(Style::default().fg(th.text_dim)),
        v[1],
    );
}

/// One row of the installed list.
fn installed_row<'a>(p: &'a Package, selected: bool, th: &Theme) -> Line<'a> {
    let mut spans = vec![
        if selected {
            Span::styled("▶ ", Style::default().fg(th.blue))
        } else {
            Span::raw("  ")
        },
        Span::styled(p.name.as_str(), Style::default().fg(th.purple)),
        Span::raw(" "),
        Span::styled(p.installed_version.as_str(), Style::default().fg(th.cyan)),
    ];
    if selected {
        for s in &mut spans {
            s.style = s.style.bg(th.highlight);
        }
    }
    Line::from(spans)
}

/// One row of the outdated list, with the severity badge.
fn outdated_row<'a>(p: &'a Package, selected: bool, th: &Theme) -> Line<'a> {
    let diff_color = th.severity_color(p.severity);
    let badge = p.severity.map_or("unknown", crate::state::Severity::label);
    let mut spans = vec![
        if selected {
            Span::styled("▶ ", Style::default().fg(th.blue))
        } else {
            Span::raw("  ")
        },
        Span::styled(p.name.as_str(), Style::default().fg(th.purple)),
        Span::raw(" "),
        Span::styled(p.installed_version.as_str(), Style::default().fg(th.cyan)),
        Span::raw(" → "),
        Span::styled(
            p.latest_version.as_deref().unwrap_or("?"),
            Style::default().fg(diff_color),
        ),
        Span::styled(format!(" ({badge})"), Style::default().fg(diff_color)),
    ];
    if selected {
        for s in &mut spans {
            s.style = s.style.bg(th.highlight);
        }
    }
    Line::from(spans)
}

/// Visible window of a list with scroll indicators and an empty placeholder.
fn panel_lines<'a>(
    items: &'a [Package],
    cursor: usize,
    scroll: usize,
    view_h: usize,
    focused: bool,
    empty_text: &'a str,
    row: impl Fn(&'a Package, bool, &Theme) -> Line<'a>,
    th: &Theme,
) -> Vec<Line<'a>> {
    let mut lines = Vec::new();
    if items.is_empty() {
        lines.push(Line::styled(
            format!("  {empty_text}"),
            Style::default().fg(th.text_dim),
        ));
        return lines;
    }
    if scroll > 0 {
        lines.push(Line::styled("  ↑ more", Style::default().fg(th.text_dim)));
    }
    let end = (scroll + view_h).min(items.len());
    for (i, p) in items.iter().enumerate().take(end).skip(scroll) {
        lines.push(row(p, focused && i == cursor, th));
    }
    if end < items.len() {
        lines.push(Line::styled("  ↓ more", Style::default().fg(th.text_dim)));
    }
    lines
}

/// Render the installed panel (left).
fn render_installed_panel(f: &mut Frame, area: Rect, app: &AppState, th: &Theme) {
    let focused = app.active_panel == Panel::Installed;
    let lines = panel_lines(
        &app.installed,
        app.dashboard.installed_cursor,
        app.dashboard.installed_scroll,
        viewport_height(app),
        focused,
        "No packages installed",
        installed_row,
        th,
    );
    f.render_widget(panel_widget(lines, format!("Installed ({})", app.installed.len()), focused, th), area);
}

/// Render the outdated panel (right).
fn render_outdated_panel(f: &mut Frame, area: Rect, app: &AppState, th: &Theme) {
    let focused = app.active_panel == Panel::Outdated;
    let lines = panel_lines(
        &app.outdated,
        app.dashboard.outdated_cursor,
        app.dashboard.outdated_scroll,
        viewport_height(app),
        focused,
        "All packages up to date",
        outdated_row,
        th,
    );
    f.render_widget(panel_widget(lines, format!("Outdated ({})", app.outdated.len()), focused, th), area);
}

/// Wrap panel content in a titled rounded border, highlighted when focused.
fn panel_widget<'a>(lines: Vec<Line<'a>>, title: String, focused: bool, th: &Theme) -> Paragraph<'a> {
    let border = if focused { th.blue } else { th.border };
    Paragraph::new(lines).block(
        Block::default()
            .title(Span::styled(
                title,
                Style::default().fg(th.text).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border)),
    )
}

/// Render the one-line status bar.
fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState, th: &Theme) {
    let outdated_style = if app.outdated.is_empty() {
        Style::default().fg(th.text_dim)
    } else {
        Style::default().fg(th.red)
    };
    let mut spans = vec![
        Span::raw(" pipsea │ "),
        Span::styled(app.venv.display_name(), Style::default().fg(th.green)),
        Span::raw(" │ "),
        Span::styled(app.manager.display_name(), Style::default().fg(th.purple)),
        Span::raw(" │ "),
        Span::raw(format!("{} pkgs", app.installed.len())),
        Span::raw(" │ "),
        Span::styled(format!("{} outdated", app.outdated.len()), outdated_style),
        Span::raw(" │ "),
        Span::styled("? help", Style::default().fg(th.text_dim)),
    ];
    if !app.status.is_empty() {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(app.status.as_str(), Style::default().fg(th.orange)));
    }
    f.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(th.elevated).fg(th.text)),
        area,
    );
}
