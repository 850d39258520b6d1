//! Search screen rendering for the input, results, and detail phases.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::state::{AppState, PackageDetail, SearchPhase};
use crate::theme::{Theme, theme};
use crate::util::truncate;

/// Lines above the first result row (title, input echo, padding).
const RESULTS_HEADER_LINES: usize = 8;
/// Lines reserved above the version list in the detail view.
const DETAIL_RESERVED_LINES: usize = 16;
/// Minimum rows shown in any list window.
const MIN_VISIBLE_ROWS: usize = 3;
/// Label column width in the detail view.
const LABEL_WIDTH: usize = 14;

/// Render the search screen for its current phase.
pub fn render(f: &mut Frame, app: &AppState) {
    let th = theme();
    let area = padded(f.area());
    let lines = match &app.search.phase {
        SearchPhase::Input => input_lines(app, &th),
        SearchPhase::Results => results_lines(app, &th),
        SearchPhase::Detail { detail, cursor } => detail_lines(app, detail, *cursor, &th),
    };
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

/// The query entry view.
fn input_lines<'a>(app: &'a AppState, th: &Theme) -> Vec<Line<'a>> {
    let st = &app.search;
    let mut lines = vec![
        Line::styled(
            "Search PyPI",
            Style::default().fg(th.blue).add_modifier(Modifier::BOLD),
        ),
        Line::default(),
        Line::from(vec![
            Span::raw("  Package name: "),
            Span::styled(st.input.as_str(), Style::default().fg(th.cyan)),
            Span::styled("█", Style::default().fg(th.orange)),
        ]),
        Line::default(),
    ];
    if st.searching || st.detail_loading {
        lines.push(Line::styled("  Searching...", Style::default().fg(th.text_dim)));
    } else if let Some(err) = &st.error {
        lines.push(Line::styled(
            format!("  Error: {err}"),
            Style::default().fg(th.red),
        ));
    } else {
        lines.push(Line::styled(
            "  Type a package name and press Enter to search",
            Style::default().fg(th.text_dim),
        ));
    }
    lines.push(Line::default());
    lines.push(Line::styled(
        "  Enter to search  │  Esc to cancel",
        Style::default().fg(th.text_dim),
    ));
    lines
}

/// The result browsing view.
fn results_lines<'a>(app: &'a AppState, th: &Theme) -> Vec<Line<'a>> {
    let st = &app.search;
    let (w, h) = app.terminal_size;
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("Results for \"{}\"", st.input),
                Style::default().fg(th.blue).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  ({} found)", st.results.len()),
                Style::default().fg(th.text_dim),
            ),
        ]),
        Line::default(),
    ];

    if st.detail_loading {
        lines.push(Line::styled(
            "  Loading package details...",
            Style::default().fg(th.text_dim),
        ));
    } else if st.results.is_empty() {
        lines.push(Line::styled("  No packages found", Style::default().fg(th.text_dim)));
    } else {
        let visible = (h as usize)
            .saturating_sub(RESULTS_HEADER_LINES)
            .max(MIN_VISIBLE_ROWS)
            // Each result takes two rows (name line + summary line).
            .div_euclid(2)
            .max(1);
        let start = window_start(st.cursor, st.results.len(), visible);
        let desc_width = (w as usize).saturating_sub(10).max(20);
        for (i, hit) in st.results.iter().enumerate().take(start + visible).skip(start) {
            let selected = i == st.cursor;
            let mut head = vec![
                if selected {
                    Span::styled("▶ ", Style::default().fg(th.blue))
                } else {
                    Span::raw("  ")
                },
                Span::styled(
                    hit.name.as_str(),
                    Style::default().fg(th.purple).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("  v{}", hit.version), Style::default().fg(th.cyan)),
            ];
            if selected {
                for s in &mut head {
                    s.style = s.style.bg(th.highlight);
                }
            }
            lines.push(Line::from(head));
            lines.push(Line::styled(
                format!("      {}", truncate(&hit.summary, desc_width)),
                Style::default().fg(th.text_dim),
            ));
        }
    }

    lines.push(Line::default());
    if let Some(err) = &st.error {
        lines.push(Line::styled(format!("  Error: {err}"), Style::default().fg(th.red)));
    }
    lines.push(Line::styled(
        "  Enter to view details  │  j/k navigate  │  Esc to go back",
        Style::default().fg(th.text_dim),
    ));
    lines
}

/// The package detail and version selection view.
fn detail_lines<'a>(
    app: &'a AppState,
    detail: &'a PackageDetail,
    cursor: usize,
    th: &Theme,
) -> Vec<Line<'a>> {
    let (w, h) = app.terminal_size;
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                detail.name.as_str(),
                Style::default().fg(th.purple).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  v{}", detail.version), Style::default().fg(th.cyan)),
        ]),
        Line::default(),
    ];

    let field = |label: &str, value: String, style: Style| {
        Line::from(vec![
            Span::styled(
                format!("{label:<width$}", width = LABEL_WIDTH),
                Style::default().fg(th.text_dim),
            ),
            Span::styled(value, style),
        ])
    };
    let value_style = Style::default().fg(th.text);
    if !detail.summary.is_empty() {
        let width = (w as usize).saturating_sub(20).max(30);
        lines.push(field("Description", truncate(&detail.summary, width), value_style));
    }
    if !detail.author.is_empty() {
        lines.push(field("Author", detail.author.clone(), value_style));
    }
    if !detail.license.is_empty() {
        lines.push(field("License", detail.license.clone(), value_style));
    }
    if !detail.requires_python.is_empty() {
        lines.push(field(
            "Requires",
            format!("Python {}", detail.requires_python),
            value_style,
        ));
    }
    if !detail.home_page.is_empty() {
        lines.push(field(
            "Homepage",
            detail.home_page.clone(),
            Style::default().fg(th.text_dim),
        ));
    }

    lines.push(Line::default());
    lines.push(Line::styled(
        "Select Version",
        Style::default().fg(th.yellow).add_modifier(Modifier::BOLD),
    ));
    lines.push(Line::default());

    let visible = (h as usize)
        .saturating_sub(DETAIL_RESERVED_LINES)
        .max(MIN_VISIBLE_ROWS)
        .min(detail.versions.len());
    let start = window_start(cursor, detail.versions.len(), visible.max(1));
    for (i, version) in detail.versions.iter().enumerate().take(start + visible).skip(start) {
        let selected = i == cursor;
        let mut spans = vec![
            if selected {
                Span::styled("▶ ", Style::default().fg(th.blue))
            } else {
                Span::raw("  ")
            },
            Span::styled(version.as_str(), Style::default().fg(th.cyan)),
        ];
        if i == 0 {
            spans.push(Span::styled(" (latest)", Style::default().fg(th.text_dim)));
        }
        if selected {
            for s in &mut spans {
                s.style = s.style.bg(th.highlight);
            }
        }
        lines.push(Line::from(spans));
    }
    if detail.versions.len() > start + visible {
        lines.push(Line::styled(
            format!("    ... and {} more versions", detail.versions.len() - (start + visible)),
            Style::default().fg(th.text_dim),
        ));
    }

    lines.push(Line::default());
    lines.push(Line::styled(
        "  Enter to install  │  j/k select version  │  Esc to go back",
        Style::default().fg(th.text_dim),
    ));
    lines
}

/// First index of a list window that keeps `cursor` visible.
fn window_start(cursor: usize, len: usize, visible: usize) -> usize {
    if visible == 0 || len <= visible {
        return 0;
    }
    cursor.saturating_sub(visible - 1).min(len - visible)
}

/// Layout helper re-exported for tests (the padded area math is pure).
#[cfg(test)]
mod tests {
    use super::window_start;

    /// What: List windows keep the cursor visible and clamp to the tail.
    #[test]
    fn window_start_keeps_cursor_visible() {
        assert_eq!(window_start(0, 10, 5), 0);
        assert_eq!(window_start(4, 10, 5), 0);
        assert_eq!(window_start(5, 10, 5), 1);
        assert_eq!(window_start(9, 10, 5), 5);
        assert_eq!(window_start(2, 3, 5), 0);
    }
}
