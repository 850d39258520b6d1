//! Dashboard screen key handling: two cursor-addressed panels with
//! confirmation and add-input sub-modes.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::pip;
use crate::state::{
    AppState, Command, ConfirmAction, ConfirmState, DashboardMode, Package, Panel, Screen,
    SearchState, MAX_INPUT_LEN,
};

use super::Step;

/// Lines consumed by panel borders and the status area.
const RESERVED_LINES: usize = 4;
/// Lines consumed by panel title and padding.
const PADDING_LINES: usize = 4;
/// Smallest usable panel body.
const MIN_PANEL_HEIGHT: usize = 5;

/// Number of package rows visible in a panel for the current terminal size.
#[must_use]
pub fn viewport_height(app: &AppState) -> usize {
    let h = app.terminal_size.1 as usize;
    h.saturating_sub(RESERVED_LINES + PADDING_LINES).max(MIN_PANEL_HEIGHT)
}

/// Adjust a scroll offset so the cursor is visible: scroll up to the cursor
/// when it is above the window, down so the cursor is the last visible row
/// when it is at or past the bottom edge, otherwise leave it unchanged.
/// Idempotent.
#[must_use]
pub fn ensure_visible(cursor: usize, scroll: usize, view_h: usize) -> usize {
    if cursor < scroll {
        return cursor;
    }
    if view_h > 0 && cursor >= scroll + view_h {
        return cursor + 1 - view_h;
    }
    scroll
}

/// Re-synchronize the focused panel's scroll offset.
fn sync_scroll(app: &mut AppState) {
    let vh = viewport_height(app);
    let d = &mut app.dashboard;
    match app.active_panel {
        Panel::Installed => {
            d.installed_scroll = ensure_visible(d.installed_cursor, d.installed_scroll, vh);
        }
        Panel::Outdated => {
            d.outdated_scroll = ensure_visible(d.outdated_cursor, d.outdated_scroll, vh);
        }
    }
}

/// Re-synchronize both panels (after a resize).
pub fn sync_scroll_both(app: &mut AppState) {
    let vh = viewport_height(app);
    let d = &mut app.dashboard;
    d.installed_scroll = ensure_visible(d.installed_cursor, d.installed_scroll, vh);
    d.outdated_scroll = ensure_visible(d.outdated_cursor, d.outdated_scroll, vh);
}

/// Clamp both cursors after the lists were replaced, then re-sync scrolls.
pub fn clamp_cursors(app: &mut AppState) {
    let d = &mut app.dashboard;
    d.installed_cursor = d.installed_cursor.min(app.installed.len().saturating_sub(1));
    d.outdated_cursor = d.outdated_cursor.min(app.outdated.len().saturating_sub(1));
    sync_scroll_both(app);
}

/// Length of the focused panel's list.
fn focused_len(app: &AppState) -> usize {
    match app.active_panel {
        Panel::Installed => app.installed.len(),
        Panel::Outdated => app.outdated.len(),
    }
}

/// Cursor of the focused panel.
fn focused_cursor_mut(app: &mut AppState) -> &mut usize {
    match app.active_panel {
        Panel::Installed => &mut app.dashboard.installed_cursor,
        Panel::Outdated => &mut app.dashboard.outdated_cursor,
    }
}

/// Move the focused cursor by `delta`, clamped to the list bounds, and
/// re-sync the scroll.
fn move_cursor(app: &mut AppState, delta: isize) {
    let len = focused_len(app);
    let cursor = focused_cursor_mut(app);
    let max = len.saturating_sub(1);
    *cursor = cursor
        .saturating_add_signed(delta)
        .min(max);
    sync_scroll(app);
}

/// Jump the focused cursor to an absolute index (clamped).
fn jump_cursor(app: &mut AppState, index: usize) {
    let max = focused_len(app).saturating_sub(1);
    *focused_cursor_mut(app) = index.min(max);
    sync_scroll(app);
}

/// The selected installed package, when the installed panel has focus.
fn selected_installed(app: &AppState) -> Option<&Package> {
    if app.active_panel == Panel::Installed {
        app.installed.get(app.dashboard.installed_cursor)
    } else {
        None
    }
}

/// The selected outdated package.
fn selected_outdated(app: &AppState) -> Option<&Package> {
    app.outdated.get(app.dashboard.outdated_cursor)
}

/// Handle a key press on the dashboard.
pub fn handle_key(key: KeyEvent, app: &mut AppState) -> Step {
    match &app.dashboard.mode {
        DashboardMode::Confirm(_) => return handle_confirm(key, app),
        DashboardMode::AddInput { .. } => return handle_add_input(key, app),
        DashboardMode::JumpPending => {
            // The chord consumes the next key: only a matching second key has
            // an effect.
            app.dashboard.mode = DashboardMode::Normal;
            if key.code == KeyCode::Char('g') && !key.modifiers.contains(KeyModifiers::CONTROL) {
                jump_cursor(app, 0);
            }
            return Step::none();
        }
        DashboardMode::Normal => {}
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('j') | KeyCode::Down if !ctrl => move_cursor(app, 1),
        KeyCode::Char('k') | KeyCode::Up if !ctrl => move_cursor(app, -1),
        KeyCode::Char('g') if !ctrl => app.dashboard.mode = DashboardMode::JumpPending,
        KeyCode::Char('G') => jump_cursor(app, usize::MAX),
        KeyCode::Char('d') if ctrl => {
            let half = viewport_height(app) / 2;
            move_cursor(app, half.try_into().unwrap_or(isize::MAX));
        }
        KeyCode::Char('u') if ctrl => {
            let half = viewport_height(app) / 2;
            move_cursor(app, -half.try_into().unwrap_or(isize::MAX));
        }
        KeyCode::Tab => {
            app.active_panel = match app.active_panel {
                Panel::Installed => Panel::Outdated,
                Panel::Outdated => Panel::Installed,
            };
        }
        KeyCode::Char('a' | '/' | 's') => {
            app.search = SearchState::default();
            app.screen = Screen::Search;
        }
        KeyCode::Enter => {
            if let Some(p) = selected_installed(app) {
                app.pending_version_target = Some(p.name.clone());
                app.search = SearchState::default();
                app.screen = Screen::Search;
            }
        }
        KeyCode::Char('d' | 'x') if !ctrl && !app.is_loading => {
            if let Some(p) = selected_installed(app) {
                app.dashboard.mode = DashboardMode::Confirm(ConfirmState {
                    action: ConfirmAction::Remove,
                    target: p.name.clone(),
                });
            }
        }
        KeyCode::Char('u') if !ctrl && !app.is_loading => {
            if app.active_panel == Panel::Outdated
                && let Some(p) = selected_outdated(app)
            {
                app.dashboard.mode = DashboardMode::Confirm(ConfirmState {
                    action: ConfirmAction::Update,
                    target: p.name.clone(),
                });
            }
        }
        KeyCode::Char('U') if !app.is_loading => {
            if !app.outdated.is_empty() {
                app.dashboard.mode = DashboardMode::Confirm(ConfirmState {
                    action: ConfirmAction::UpdateAll,
                    target: format!("{} packages", app.outdated.len()),
                });
            }
        }
        KeyCode::Char('i') if !app.is_loading => {
            app.dashboard.mode = DashboardMode::AddInput { buffer: String::new() };
        }
        _ => {}
    }
    Step::none()
}

/// Handle the confirmation sub-mode: affirmative executes the recorded
/// action, negative/cancel clears it, everything else is ignored.
fn handle_confirm(key: KeyEvent, app: &mut AppState) -> Step {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => {
            let DashboardMode::Confirm(confirm) =
                std::mem::take(&mut app.dashboard.mode)
            else {
                return Step::none();
            };
            app.is_loading = true;
            match confirm.action {
                ConfirmAction::Remove => Step::with(Command::Uninstall { name: confirm.target }),
                ConfirmAction::Update => Step::with(Command::Upgrade { name: confirm.target }),
                ConfirmAction::UpdateAll => Step::with(Command::UpgradeAll {
                    // Snapshot taken at confirmation time: immune to
                    // concurrent list changes.
                    snapshot: app.outdated.clone(),
                }),
            }
        }
        KeyCode::Char('n' | 'q') | KeyCode::Esc => {
            app.dashboard.mode = DashboardMode::Normal;
            Step::none()
        }
        _ => Step::none(),
    }
}

/// Handle the add-input sub-mode: free-text specifier entry.
fn handle_add_input(key: KeyEvent, app: &mut AppState) -> Step {
    let DashboardMode::AddInput { buffer } = &mut app.dashboard.mode else {
        return Step::none();
    };
    match key.code {
        KeyCode::Esc => {
            app.dashboard.mode = DashboardMode::Normal;
        }
        KeyCode::Enter => {
            if buffer.is_empty() {
                return Step::none();
            }
            let spec = std::mem::take(buffer);
            app.dashboard.mode = DashboardMode::Normal;
            if let Err(e) = pip::validate_spec(&spec) {
                app.status = format!("Invalid specifier: {e}");
                return Step::none();
            }
            app.is_loading = true;
            return Step::with(Command::Install { display: spec.clone(), spec });
        }
        KeyCode::Backspace => {
            buffer.pop();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if !c.is_control() && buffer.chars().count() < MAX_INPUT_LEN {
                buffer.push(c);
            }
        }
        _ => {}
    }
    Step::none()
}
