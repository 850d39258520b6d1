//! Application runtime: terminal lifecycle, the single event queue, and
//! command dispatch.
//!
//! The event loop is single-threaded and cooperative: it draws a frame,
//! waits for the next [`AppEvent`], applies it synchronously through
//! `events::handle`, and dispatches any produced [`Command`]s. Commands run
//! on their own tasks (subprocess work on the blocking pool) and complete by
//! enqueueing exactly one result event back onto the same queue, so all
//! state mutation stays on the loop even though I/O is concurrent.

use std::path::{Path, PathBuf};

use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;

use crate::config;
use crate::detect;
use crate::events;
use crate::manifest;
use crate::pip::{RunOutput, Runner};
use crate::pypi::{CancelToken, Client};
use crate::state::{
    AppEvent, AppState, Command, DEFAULT_TERMINAL_SIZE, LoadedPackages, Screen,
};
use crate::ui::ui;

/// Result alias for runtime errors.
type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Everything a dispatched command may capture: cheap clones of the runner
/// and client plus the queue's sender. Commands never reach back into live
/// state.
#[derive(Clone)]
struct CommandContext {
    /// Subprocess runner bound to the detected manager and environment.
    runner: Runner,
    /// Dependency file to keep in sync after mutating actions.
    manifest: Option<crate::detect::ManifestRef>,
    /// Project directory (for manifest creation).
    project_dir: PathBuf,
    /// Index client.
    client: Client,
    /// Cancellation signal observed by the index client.
    cancel: CancelToken,
    /// Sender feeding the single event queue.
    events: mpsc::UnboundedSender<AppEvent>,
}

/// Enter raw mode and the alternate screen.
fn setup_terminal() -> Result<()> {
    enable_raw_mode()?;
    execute!(std::io::stdout(), EnterAlternateScreen)?;
    Ok(())
}

/// Leave the alternate screen and restore cooked mode.
fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(std::io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

/// Run the pipsea TUI end-to-end: detect the project and environment, spawn
/// the input reader, drive the event loop, and restore the terminal on exit.
///
/// # Errors
/// Terminal initialization or drawing failures. Everything past startup is
/// surfaced as status text instead of an error.
pub async fn run(dir: &Path, mirror_override: Option<&str>) -> Result<()> {
    let cfg = config::load();
    let project = detect::detect_project(dir);
    let venv = detect::detect_virtualenv(dir);
    let manager = detect::detect_package_manager(&cfg.package_manager.preferred);
    tracing::info!(
        project = ?project.manifest.as_ref().map(|m| m.path.display().to_string()),
        venv = %venv.display_name(),
        manager = %manager.display_name(),
        "detection finished"
    );

    let mirror = mirror_override.unwrap_or(&cfg.pypi.mirror);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<AppEvent>();
    let (cancel_tx, cancel) = CancelToken::pair();

    let ctx = CommandContext {
        runner: Runner::new(manager.clone(), venv.clone()),
        manifest: project.manifest.clone(),
        project_dir: project.dir.clone(),
        client: Client::new(mirror),
        cancel,
        events: event_tx.clone(),
    };

    let mut app = AppState::new(project, venv, manager);
    app.terminal_size = crossterm::terminal::size().unwrap_or(DEFAULT_TERMINAL_SIZE);

    // Dedicated reader thread feeding the queue; input never blocks the loop.
    {
        let tx = event_tx.clone();
        std::thread::spawn(move || {
            loop {
                match crossterm::event::read() {
                    Ok(ev) => {
                        if tx.send(AppEvent::Input(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        // Transient read errors are ignored.
                    }
                }
            }
        });
    }

    if app.screen == Screen::Dashboard {
        app.is_loading = true;
        dispatch(Command::LoadPackages, &ctx);
    }

    setup_terminal()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(std::io::stdout()))?;

    loop {
        terminal.draw(|f| ui(f, &app))?;
        let Some(event) = event_rx.recv().await else {
            break;
        };
        let step = events::handle(event, &mut app);
        for command in step.commands {
            dispatch(command, &ctx);
        }
        if step.quit {
            break;
        }
    }

    let _ = cancel_tx.send(true);
    restore_terminal()?;
    Ok(())
}

/// Execute a deferred operation off the event loop. Each command enqueues
/// exactly one result event on completion.
fn dispatch(command: Command, ctx: &CommandContext) {
    match command {
        Command::LoadPackages => {
            let runner = ctx.runner.clone();
            let tx = ctx.events.clone();
            tokio::spawn(async move {
                let res = tokio::task::spawn_blocking(move || load_packages(&runner))
                    .await
                    .unwrap_or_else(|e| Err(format!("load task failed: {e}")));
                let _ = tx.send(AppEvent::PackagesLoaded(res));
            });
        }
        Command::Install { spec, display } => {
            spawn_action(ctx, "installed", display, move |r| r.install(&spec));
        }
        Command::Uninstall { name } => {
            spawn_action(ctx, "uninstalled", name.clone(), move |r| r.uninstall(&name));
        }
        Command::Upgrade { name } => {
            spawn_action(ctx, "updated", name.clone(), move |r| r.upgrade(&name));
        }
        Command::UpgradeAll { snapshot } => {
            let runner = ctx.runner.clone();
            let manifest = ctx.manifest.clone();
            let tx = ctx.events.clone();
            tokio::spawn(async move {
                let (succeeded, failed) = tokio::task::spawn_blocking(move || {
                    let (succeeded, failed) = crate::pip::upgrade_all(&runner, &snapshot);
                    if succeeded > 0 {
                        sync_manifest(manifest.as_ref(), &runner);
                    }
                    (succeeded, failed)
                })
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "update-all task failed");
                    (0, Vec::new())
                });
                let _ = tx.send(AppEvent::BulkUpdateCompleted { succeeded, failed });
            });
        }
        Command::Search { query } => {
            let client = ctx.client.clone();
            let cancel = ctx.cancel.clone();
            let tx = ctx.events.clone();
            tokio::spawn(async move {
                let res = client
                    .search(&query, &cancel)
                    .await
                    .map_err(|e| e.to_string());
                let _ = tx.send(AppEvent::SearchCompleted(res));
            });
        }
        Command::FetchDetail { name } => {
            let client = ctx.client.clone();
            let cancel = ctx.cancel.clone();
            let tx = ctx.events.clone();
            tokio::spawn(async move {
                let res = client
                    .get_package_detail(&name, &cancel)
                    .await
                    .map_err(|e| e.to_string());
                let _ = tx.send(AppEvent::DetailFetched(res));
            });
        }
        Command::CreateManifest { kind, name, version } => {
            let dir = ctx.project_dir.clone();
            let tx = ctx.events.clone();
            tokio::spawn(async move {
                let res = tokio::task::spawn_blocking(move || {
                    manifest::create_manifest(&dir, kind, &name, &version)
                        .map_err(|e| e.to_string())
                })
                .await
                .unwrap_or_else(|e| Err(format!("create task failed: {e}")));
                let _ = tx.send(AppEvent::ProjectCreated(res));
            });
        }
    }
}

/// Run a single mutating action on the blocking pool, sync the manifest on
/// success, and report one `ActionCompleted` event.
fn spawn_action<F>(ctx: &CommandContext, action: &'static str, target: String, run: F)
where
    F: FnOnce(&Runner) -> RunOutput + Send + 'static,
{
    let runner = ctx.runner.clone();
    let manifest = ctx.manifest.clone();
    let tx = ctx.events.clone();
    tokio::spawn(async move {
        let error = tokio::task::spawn_blocking(move || {
            let out = run(&runner);
            if out.error.is_none() {
                sync_manifest(manifest.as_ref(), &runner);
            }
            out.error
        })
        .await
        .unwrap_or_else(|e| Some(format!("task failed: {e}")));
        let _ = tx.send(AppEvent::ActionCompleted {
            action: action.to_string(),
            target,
            error,
        });
    });
}

/// Best-effort dependency-file sync after a successful mutation.
fn sync_manifest(manifest: Option<&crate::detect::ManifestRef>, runner: &Runner) {
    if let Some(m) = manifest
        && let Err(e) = manifest::sync_dependency_file(m, runner)
    {
        tracing::warn!(path = %m.path.display(), error = %e, "dependency file sync failed");
    }
}

/// Query the installed and outdated listings and parse both.
fn load_packages(runner: &Runner) -> std::result::Result<LoadedPackages, String> {
    let list = runner.list();
    if let Some(e) = list.error {
        return Err(e);
    }
    let installed = crate::pip::parse_package_list(&list.stdout)
        .map_err(|e| format!("parse package list: {e}"))?;

    let out = runner.outdated();
    if let Some(e) = out.error {
        return Err(e);
    }
    let outdated = crate::pip::parse_outdated_list(&out.stdout)
        .map_err(|e| format!("parse outdated list: {e}"))?;

    Ok(LoadedPackages { installed, outdated })
}
