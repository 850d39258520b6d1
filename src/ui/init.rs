//! Init screen rendering: the project-creation menu and its form.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::state::{AppState, CreateStep};
use crate::theme::{Theme, theme};

/// Menu entries, in cursor order.
const OPTIONS: [&str; 3] = [
    "Create pyproject.toml        (recommended)",
    "Create requirements.txt      (simple)",
    "Exit",
];

/// Render the init screen.
pub fn render(f: &mut Frame, app: &AppState) {
    let th = theme();
    let area = padded(f.area());
    let lines = if app.init.form.is_some() {
        form_lines(app, &th)
    } else {
        menu_lines(app, &th)
    };
    f.render_widget(Paragraph::new(lines), area);
}

/// Inset the drawing area by two rows and four columns.
fn padded(area: Rect) -> Rect {
    Rect {
        x: area.x.saturating_add(4),
        y: area.y.saturating_add(2),
        width: area.width.saturating_sub(8),
        height: area.height.saturating_sub(4),
    }
}

/// The three-option creation menu.
fn menu_lines<'a>(app: &AppState, th: &Theme) -> Vec<Line<'a>> {
    let mut lines = vec![
        Line::styled(
            "No Python project found in current directory.",
            Style::default().fg(th.blue).add_modifier(Modifier::BOLD),
        ),
        Line::styled("Would you like to initialize one?", Style::default().fg(th.text)),
        Line::default(),
    ];
    for (i, opt) in OPTIONS.iter().enumerate() {
        if i == app.init.cursor {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled("▶ ", Style::default().fg(th.blue)),
                Span::styled((*opt).to_string(), Style::default().fg(th.text).bg(th.highlight)),
            ]));
        } else {
            lines.push(Line::styled(
                format!("    {opt}"),
                Style::default().fg(th.text_dim),
            ));
        }
    }
    if !app.status.is_empty() {
        lines.push(Line::default());
        lines.push(Line::styled(
            format!("  {}", app.status),
            Style::default().fg(th.red),
        ));
    }
    lines
}

/// The two-step pyproject form.
fn form_lines<'a>(app: &AppState, th: &Theme) -> Vec<Line<'a>> {
    let Some(form) = &app.init.form else {
        return Vec::new();
    };
    let cursor = Span::styled("█", Style::default().fg(th.orange));
    let mut lines = vec![
        Line::styled(
            "Create pyproject.toml",
            Style::default().fg(th.blue).add_modifier(Modifier::BOLD),
        ),
        Line::default(),
    ];
    match form.step {
        CreateStep::Name => {
            lines.push(Line::from(vec![
                Span::styled("Project name: ", Style::default().fg(th.text)),
                Span::styled(form.input.clone(), Style::default().fg(th.cyan)),
                cursor,
            ]));
            lines.push(Line::styled(
                format!("  (default: {})", app.init.project_name),
                Style::default().fg(th.text_dim),
            ));
        }
        CreateStep::Version => {
            lines.push(Line::styled(
                format!("Project name: {}", app.init.project_name),
                Style::default().fg(th.text_dim),
            ));
            lines.push(Line::from(vec![
                Span::styled("Version: ", Style::default().fg(th.text)),
                Span::styled(form.input.clone(), Style::default().fg(th.cyan)),
                cursor,
            ]));
            lines.push(Line::styled("  (default: 0.1.0)", Style::default().fg(th.text_dim)));
        }
    }
    lines.push(Line::default());
    lines.push(Line::styled(
        "Press Enter to confirm, Esc to cancel",
        Style::default().fg(th.text_dim),
    ));
    lines
}
