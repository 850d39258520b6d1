//! Init screen key handling: the project-creation menu and its two-step
//! form.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::detect::ManifestKind;
use crate::state::{AppState, Command, CreateForm, CreateStep, MAX_INPUT_LEN};

use super::Step;

/// Highest menu index (create pyproject / create requirements / exit).
pub const MAX_MENU_INDEX: usize = 2;

/// Handle a key press on the init screen.
pub fn handle_key(key: KeyEvent, app: &mut AppState) -> Step {
    if app.init.form.is_some() {
        return form_key(key, app);
    }

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            app.init.cursor = (app.init.cursor + 1).min(MAX_MENU_INDEX);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.init.cursor = app.init.cursor.saturating_sub(1);
        }
        KeyCode::Enter => match app.init.cursor {
            0 => {
                app.init.form = Some(CreateForm {
                    step: CreateStep::Name,
                    input: app.init.project_name.clone(),
                });
            }
            1 => {
                return Step::with(Command::CreateManifest {
                    kind: ManifestKind::Requirements,
                    name: String::new(),
                    version: String::new(),
                });
            }
            _ => return Step::quit(),
        },
        _ => {}
    }
    Step::none()
}

/// Handle the two-step create form (name, then version).
fn form_key(key: KeyEvent, app: &mut AppState) -> Step {
    let Some(form) = &mut app.init.form else {
        return Step::none();
    };
    match key.code {
        KeyCode::Esc => {
            app.init.form = None;
        }
        KeyCode::Enter => match form.step {
            CreateStep::Name => {
                if !form.input.is_empty() {
                    app.init.project_name = form.input.clone();
                }
                form.step = CreateStep::Version;
                form.input = app.init.version.clone();
            }
            CreateStep::Version => {
                if !form.input.is_empty() {
                    app.init.version = form.input.clone();
                }
                app.init.form = None;
                return Step::with(Command::CreateManifest {
                    kind: ManifestKind::Pyproject,
                    name: app.init.project_name.clone(),
                    version: app.init.version.clone(),
                });
            }
        },
        KeyCode::Backspace => {
            form.input.pop();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if !c.is_control() && form.input.chars().count() < MAX_INPUT_LEN {
                form.input.push(c);
            }
        }
        _ => {}
    }
    Step::none()
}
