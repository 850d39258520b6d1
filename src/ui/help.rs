//! Help screen rendering: the static keyboard reference.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::theme::{Theme, theme};

use crate::state::AppState;

/// Key column width.
const KEY_WIDTH: usize = 14;

/// Render the help screen.
pub fn render(f: &mut Frame, _app: &AppState) {
    let th = theme();
    let area = padded(f.area());

    let mut lines = vec![
        Line::styled(
            "pipsea - Keyboard Reference",
            Style::default().fg(th.blue).add_modifier(Modifier::BOLD),
        ),
        Line::default(),
    ];

    section(&mut lines, "Navigation", &th);
    bindings(
        &mut lines,
        &[
            ("j / ↓", "Move down"),
            ("k / ↑", "Move up"),
            ("gg", "Jump to top"),
            ("G", "Jump to bottom"),
            ("Ctrl+d", "Half-page down"),
            ("Ctrl+u", "Half-page up"),
            ("Tab", "Switch panel"),
        ],
        &th,
    );

    section(&mut lines, "Package Actions", &th);
    bindings(
        &mut lines,
        &[
            ("a / s / /", "Search PyPI"),
            ("i", "Install by specifier (e.g. flask==3.0.0)"),
            ("d / x", "Remove selected package"),
            ("u", "Update selected package"),
            ("U", "Update all outdated"),
            ("Enter", "Change version of selected package"),
            ("Esc", "Cancel / go back"),
        ],
        &th,
    );

    section(&mut lines, "General", &th);
    bindings(
        &mut lines,
        &[("?", "Toggle help"), ("q", "Quit"), ("Ctrl+c", "Force quit")],
        &th,
    );

    lines.push(Line::default());
    lines.push(Line::styled(
        "Press ? or Esc to close",
        Style::default().fg(th.text_dim),
    ));

    f.render_widget(Paragraph::new(lines), area);
}

/// Inset the drawing area by one row and two columns.
fn padded(area: Rect) -> Rect {
    Rect {
        x: area.x.saturating_add(2),
        y: area.y.saturating_add(1),
        width: area.width.saturating_sub(4),
        height: area.height.saturating_sub(2),
    }
}

/// Append a section header.
fn section(lines: &mut Vec<Line<'_>>, title: &str, th: &Theme) {
    lines.push(Line::styled(
        title.to_string(),
        Style::default().fg(th.yellow).add_modifier(Modifier::BOLD),
    ));
}

/// Append key/description rows.
fn bindings(lines: &mut Vec<Line<'_>>, rows: &[(&str, &str)], th: &Theme) {
    for (key, desc) in rows {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{key:<width$}", width = KEY_WIDTH),
                Style::default().fg(th.cyan),
            ),
            Span::styled((*desc).to_string(), Style::default().fg(th.text)),
        ]));
    }
}
