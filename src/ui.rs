//! Rendering layer: a pure, side-effect-free projection of [`AppState`]
//! into frames. Rendering the same state twice produces identical output.

pub mod dashboard;
pub mod help;
pub mod init;
pub mod search;

use ratatui::Frame;
use ratatui::style::Style;
use ratatui::widgets::Block;

use crate::state::{AppState, Screen};
use crate::theme::theme;

/// Render the active screen into the frame.
pub fn ui(f: &mut Frame, app: &AppState) {
    let th = theme();
    let bg = Block::default().style(Style::default().bg(th.base));
    f.render_widget(bg, f.area());

    match app.screen {
        Screen::Init => init::render(f, app),
        Screen::Dashboard => dashboard::render(f, app),
        Screen::Search => search::render(f, app),
        Screen::Help => help::render(f, app),
    }
}
