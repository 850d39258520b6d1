//! Event handling layer for pipsea's TUI.
//!
//! The top-level [`handle`] function is the screen state machine's single
//! entry point: it consumes one element of the event queue, mutates the
//! provided [`AppState`], and returns the deferred operations to dispatch.
//! Handlers never perform I/O and never block; long-running work is
//! described as [`Command`]s and executed by the runtime in `app`.
//!
//! Routing order:
//!
//! - Global keys (quit, help toggle) are evaluated first, except while a
//!   text-entry or confirmation sub-mode owns the keyboard.
//! - Result events follow the top-level transition table (loading flags,
//!   list replacement, status text, follow-up reloads).
//! - Everything else is delegated to the active screen's handler; events a
//!   screen does not recognize are no-ops, not errors.

pub mod dashboard;
pub mod init;
pub mod search;

use crossterm::event::{Event as CEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::state::{AppEvent, AppState, Command, DashboardMode, Screen, SearchState};

/// Outcome of handling one event: whether to terminate, and which deferred
/// operations to dispatch.
#[derive(Debug, Default)]
pub struct Step {
    /// The application should exit.
    pub quit: bool,
    /// Commands produced by this event, in dispatch order.
    pub commands: Vec<Command>,
}

impl Step {
    /// No effect.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Terminate the application.
    #[must_use]
    pub fn quit() -> Self {
        Self { quit: true, commands: Vec::new() }
    }

    /// Dispatch a single command.
    #[must_use]
    pub fn with(command: Command) -> Self {
        Self { quit: false, commands: vec![command] }
    }
}

/// Dispatch a single event from the queue.
///
/// After the event is applied, a pending version-change target is consumed
/// if the search screen is now active: the screen state is discarded, the
/// query pre-filled, and the detail fetch dispatched immediately, bypassing
/// the input and results phases.
pub fn handle(event: AppEvent, app: &mut AppState) -> Step {
    let mut step = match event {
        AppEvent::Input(ev) => handle_input(ev, app),
        AppEvent::PackagesLoaded(res) => on_packages_loaded(res, app),
        AppEvent::ActionCompleted { action, target, error } => {
            on_action_completed(&action, &target, error, app)
        }
        AppEvent::BulkUpdateCompleted { succeeded, failed } => {
            on_bulk_update_completed(succeeded, &failed, app)
        }
        AppEvent::ProjectCreated(res) => on_project_created(res, app),
        AppEvent::SearchCompleted(res) => {
            if app.screen == Screen::Search {
                search::on_search_completed(res, app);
            }
            Step::none()
        }
        AppEvent::DetailFetched(res) => {
            if app.screen == Screen::Search {
                search::on_detail_fetched(res, app);
            }
            Step::none()
        }
    };

    if app.screen == Screen::Search
        && let Some(name) = app.pending_version_target.take()
    {
        tracing::debug!(package = %name, "version change requested");
        app.search = SearchState {
            input: name.clone(),
            detail_loading: true,
            ..SearchState::default()
        };
        step.commands.push(Command::FetchDetail { name });
    }
    step
}

/// Route a raw terminal event.
fn handle_input(ev: CEvent, app: &mut AppState) -> Step {
    match ev {
        CEvent::Key(key) if key.kind == KeyEventKind::Press => handle_key(key, app),
        CEvent::Resize(w, h) => {
            app.terminal_size = (w, h);
            dashboard::sync_scroll_both(app);
            Step::none()
        }
        _ => Step::none(),
    }
}

/// Whether a free-text buffer currently owns the keyboard, which suppresses
/// single-letter global bindings.
fn text_entry_active(app: &AppState) -> bool {
    matches!(app.dashboard.mode, DashboardMode::AddInput { .. })
        || (app.screen == Screen::Init && app.init.form.is_some())
}

/// Evaluate global keys, then delegate to the active screen.
fn handle_key(key: KeyEvent, app: &mut AppState) -> Step {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Step::quit();
    }

    let confirm_active = matches!(app.dashboard.mode, DashboardMode::Confirm(_));
    if app.screen != Screen::Search && !text_entry_active(app) && !confirm_active {
        match key.code {
            KeyCode::Char('q') => return Step::quit(),
            KeyCode::Char('?') if app.screen == Screen::Help => {
                app.screen = Screen::Dashboard;
                return Step::none();
            }
            KeyCode::Char('?') if app.screen == Screen::Dashboard => {
                app.screen = Screen::Help;
                return Step::none();
            }
            KeyCode::Esc if app.screen == Screen::Help => {
                app.screen = Screen::Dashboard;
                return Step::none();
            }
            _ => {}
        }
    }

    match app.screen {
        Screen::Init => init::handle_key(key, app),
        Screen::Dashboard => dashboard::handle_key(key, app),
        Screen::Search => search::handle_key(key, app),
        Screen::Help => Step::none(),
    }
}

/// Apply a finished package reload.
fn on_packages_loaded(
    res: Result<crate::state::LoadedPackages, String>,
    app: &mut AppState,
) -> Step {
    app.is_loading = false;
    match res {
        Ok(loaded) => {
            tracing::debug!(
                installed = loaded.installed.len(),
                outdated = loaded.outdated.len(),
                "packages loaded"
            );
            app.installed = loaded.installed;
            app.outdated = loaded.outdated;
            dashboard::clamp_cursors(app);
        }
        Err(e) => app.status = format!("Failed to load packages: {e}"),
    }
    Step::none()
}

/// Apply a finished single package action; success re-triggers a reload.
fn on_action_completed(
    action: &str,
    target: &str,
    error: Option<String>,
    app: &mut AppState,
) -> Step {
    app.is_loading = false;
    tracing::debug!(action, package = target, success = error.is_none(), "package action completed");
    match error {
        Some(e) => {
            app.status = format!("Failed: {e}");
            Step::none()
        }
        None => {
            app.status = format!("{action} {target} ✓");
            app.is_loading = true;
            Step::with(Command::LoadPackages)
        }
    }
}

/// Apply the aggregate update-all result. The reload runs even after a
/// partial failure.
fn on_bulk_update_completed(succeeded: usize, failed: &[String], app: &mut AppState) -> Step {
    app.is_loading = false;
    if failed.is_empty() {
        app.status = format!("updated {succeeded} ✓");
    } else {
        app.status = format!(
            "updated {succeeded}, failed {}: {}",
            failed.len(),
            failed.join(", ")
        );
    }
    app.is_loading = true;
    Step::with(Command::LoadPackages)
}

/// Apply a project-creation result from the init screen.
fn on_project_created(
    res: Result<crate::detect::ManifestRef, String>,
    app: &mut AppState,
) -> Step {
    if app.screen != Screen::Init {
        return Step::none();
    }
    match res {
        Ok(manifest) => {
            tracing::debug!(path = %manifest.path.display(), "project created, switching to dashboard");
            app.project.manifest = Some(manifest);
            app.screen = Screen::Dashboard;
            app.is_loading = true;
            Step::with(Command::LoadPackages)
        }
        Err(e) => {
            app.status = format!("Failed to create project: {e}");
            Step::none()
        }
    }
}
