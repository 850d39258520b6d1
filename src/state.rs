//! Core application state types for pipsea's TUI.
//!
//! This module defines the single mutable [`AppState`] root owned by the
//! event loop, the per-screen payload structs, the package records shared
//! with the parsing and networking layers, and the event/command vocabulary
//! of the dispatch contract: handlers consume an [`AppEvent`] and may produce
//! [`Command`]s, whose completions re-enter the loop as further events.

use crate::detect::{ManifestKind, ManifestRef, PackageManager, Project, Virtualenv};

/// Fallback terminal dimensions before the first resize event.
pub const DEFAULT_TERMINAL_SIZE: (u16, u16) = (80, 24);
/// Maximum length of free-text input buffers (search query, add specifier).
pub const MAX_INPUT_LEN: usize = 100;
/// Minimum query length before a search is dispatched.
pub const MIN_SEARCH_LEN: usize = 1;

/// Top-level interactive mode of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// No project detected: offer to create one.
    Init,
    /// The two-panel package dashboard.
    Dashboard,
    /// The query/results/detail search flow.
    Search,
    /// Static keyboard reference.
    Help,
}

/// Which dashboard panel has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    /// Left panel: everything installed in the environment.
    #[default]
    Installed,
    /// Right panel: packages with a newer version available.
    Outdated,
}

/// Severity classification of an available update, by triplet position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Installed version already matches the latest.
    UpToDate,
    /// Only the patch component differs.
    Patch,
    /// The minor component differs.
    Minor,
    /// The major component differs.
    Major,
    /// One of the versions does not parse as a numeric triplet.
    Unknown,
}

impl Severity {
    /// Human-readable badge text.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::UpToDate => "up to date",
            Self::Patch => "patch",
            Self::Minor => "minor",
            Self::Major => "major",
            Self::Unknown => "unknown",
        }
    }
}

/// An installed (or outdated) package as reported by the package manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Canonical package name.
    pub name: String,
    /// Version currently installed.
    pub installed_version: String,
    /// Newest version on the index, when known.
    pub latest_version: Option<String>,
    /// Update severity, when an update is available.
    pub severity: Option<Severity>,
    /// Whether this record came from the outdated listing.
    pub outdated: bool,
}

/// A package surfaced by an index search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Canonical package name.
    pub name: String,
    /// Latest released version.
    pub version: String,
    /// One-line summary suitable for list display.
    pub summary: String,
}

/// Full package detail assembled from the index, including the selectable
/// version list (stable releases only, newest first, capped).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageDetail {
    /// Canonical package name.
    pub name: String,
    /// Latest released version.
    pub version: String,
    /// One-line summary.
    pub summary: String,
    /// Author as published on the index.
    pub author: String,
    /// License text, truncated for display.
    pub license: String,
    /// Upstream homepage URL.
    pub home_page: String,
    /// Python requirement string, e.g. `>=3.8`.
    pub requires_python: String,
    /// Stable versions, newest first.
    pub versions: Vec<String>,
}

/// The action recorded by the dashboard confirmation sub-mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    /// Uninstall a single package.
    Remove,
    /// Upgrade a single outdated package.
    Update,
    /// Upgrade every outdated package.
    UpdateAll,
}

impl ConfirmAction {
    /// Verb shown in the confirmation prompt.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Remove => "remove",
            Self::Update => "update",
            Self::UpdateAll => "update-all",
        }
    }
}

/// Payload of the confirmation sub-mode: what will run, against what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmState {
    /// The pending action kind.
    pub action: ConfirmAction,
    /// Target label: a package name, or `"N packages"` for update-all.
    pub target: String,
}

/// Dashboard sub-modes. Exactly one is active at a time; the enum makes
/// confirmation and text entry structurally exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DashboardMode {
    /// Plain navigation and action keys.
    #[default]
    Normal,
    /// First key of the go-to-top chord seen; the next key is consumed.
    JumpPending,
    /// Confirmation prompt suspending normal key routing.
    Confirm(ConfirmState),
    /// Free-text entry of a package specifier to install.
    AddInput {
        /// The growable input buffer.
        buffer: String,
    },
}

/// Dashboard screen payload: per-panel cursors and scroll offsets plus the
/// active sub-mode.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    /// Cursor index into the installed list.
    pub installed_cursor: usize,
    /// Cursor index into the outdated list.
    pub outdated_cursor: usize,
    /// First visible row of the installed list.
    pub installed_scroll: usize,
    /// First visible row of the outdated list.
    pub outdated_scroll: usize,
    /// Active sub-mode.
    pub mode: DashboardMode,
}

/// Step of the search flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SearchPhase {
    /// Typing the query.
    #[default]
    Input,
    /// Browsing the result list.
    Results,
    /// Viewing package detail and selecting a version.
    Detail {
        /// The fetched detail record.
        detail: PackageDetail,
        /// Cursor into `detail.versions`.
        cursor: usize,
    },
}

/// Search screen payload.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    /// Current phase of the flow.
    pub phase: SearchPhase,
    /// Query text.
    pub input: String,
    /// Last received result list.
    pub results: Vec<SearchHit>,
    /// Cursor into `results`.
    pub cursor: usize,
    /// A search command is in flight.
    pub searching: bool,
    /// A detail fetch is in flight.
    pub detail_loading: bool,
    /// Last error surfaced by a search or detail fetch.
    pub error: Option<String>,
}

/// Which field the init screen's create form is collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateStep {
    /// Project name.
    Name,
    /// Initial version.
    Version,
}

/// Two-step text form for creating a `pyproject.toml`.
#[derive(Debug, Clone)]
pub struct CreateForm {
    /// Which field is being edited.
    pub step: CreateStep,
    /// The current input buffer.
    pub input: String,
}

/// Init screen payload: the project-creation menu and its optional form.
#[derive(Debug, Clone)]
pub struct InitState {
    /// Menu cursor (0..=2).
    pub cursor: usize,
    /// Active create form, when option 0 was chosen.
    pub form: Option<CreateForm>,
    /// Proposed project name (defaults to the working directory's basename).
    pub project_name: String,
    /// Proposed initial version.
    pub version: String,
}

impl Default for InitState {
    fn default() -> Self {
        Self {
            cursor: 0,
            form: None,
            project_name: "project".to_string(),
            version: "0.1.0".to_string(),
        }
    }
}

impl InitState {
    /// Build the init payload, defaulting the project name from `dir`.
    #[must_use]
    pub fn for_dir(dir: &std::path::Path) -> Self {
        let project_name = dir
            .file_name()
            .map_or_else(|| "project".to_string(), |n| n.to_string_lossy().into_owned());
        Self { project_name, ..Self::default() }
    }
}

/// Global application state, mutated exclusively by the event loop and handed
/// by reference to the active screen's handler for the duration of one event.
#[derive(Debug)]
pub struct AppState {
    /// The active screen tag; the payload structs below persist across
    /// transitions so cursors survive Help/Search round-trips.
    pub screen: Screen,
    /// Detected dependency file and project directory.
    pub project: Project,
    /// Resolved Python environment.
    pub venv: Virtualenv,
    /// Resolved package manager binary.
    pub manager: PackageManager,
    /// Installed packages, replaced wholesale on every successful reload.
    pub installed: Vec<Package>,
    /// Outdated packages, replaced wholesale on every successful reload.
    pub outdated: Vec<Package>,
    /// Which dashboard panel has focus.
    pub active_panel: Panel,
    /// Transient status text, overwritten by the next status-bearing event.
    pub status: String,
    /// True while a mutating or reload command is in flight.
    pub is_loading: bool,
    /// Terminal dimensions, updated only by resize events.
    pub terminal_size: (u16, u16),
    /// When set, the search screen jumps straight to this package's version
    /// detail. Written once, consumed once.
    pub pending_version_target: Option<String>,
    /// Dashboard screen payload.
    pub dashboard: DashboardState,
    /// Search screen payload.
    pub search: SearchState,
    /// Init screen payload.
    pub init: InitState,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            screen: Screen::Dashboard,
            project: Project::default(),
            venv: Virtualenv::default(),
            manager: PackageManager::default(),
            installed: Vec::new(),
            outdated: Vec::new(),
            active_panel: Panel::Installed,
            status: String::new(),
            is_loading: false,
            terminal_size: DEFAULT_TERMINAL_SIZE,
            pending_version_target: None,
            dashboard: DashboardState::default(),
            search: SearchState::default(),
            init: InitState::default(),
        }
    }
}

impl AppState {
    /// Build the initial state from detection results. The dashboard is shown
    /// when a dependency file was found, the init screen otherwise.
    #[must_use]
    pub fn new(project: Project, venv: Virtualenv, manager: PackageManager) -> Self {
        let screen = if project.detected() {
            tracing::debug!(path = ?project.manifest.as_ref().map(|m| &m.path), "project detected");
            Screen::Dashboard
        } else {
            tracing::debug!("no project detected, showing init screen");
            Screen::Init
        };
        let init = InitState::for_dir(&project.dir);
        Self { screen, project, venv, manager, init, ..Self::default() }
    }
}

/// Payload of a successful package reload.
#[derive(Debug, Clone)]
pub struct LoadedPackages {
    /// Everything installed in the environment.
    pub installed: Vec<Package>,
    /// Subset with newer versions available.
    pub outdated: Vec<Package>,
}

/// An element of the single event queue: raw input, or the result of a
/// previously dispatched [`Command`].
#[derive(Debug)]
pub enum AppEvent {
    /// A terminal input event (key press or resize).
    Input(crossterm::event::Event),
    /// Installed/outdated listings finished loading.
    PackagesLoaded(Result<LoadedPackages, String>),
    /// A single install/uninstall/upgrade finished.
    ActionCompleted {
        /// Past-tense verb, e.g. `"installed"`.
        action: String,
        /// Display label of the target package.
        target: String,
        /// Failure text, when the action failed.
        error: Option<String>,
    },
    /// The sequential update-all run finished.
    BulkUpdateCompleted {
        /// How many upgrades succeeded.
        succeeded: usize,
        /// Names of the packages whose upgrade failed.
        failed: Vec<String>,
    },
    /// A dependency file was created from the init screen.
    ProjectCreated(Result<ManifestRef, String>),
    /// An index search finished.
    SearchCompleted(Result<Vec<SearchHit>, String>),
    /// A package-detail fetch finished. `Ok(None)` means not found.
    DetailFetched(Result<Option<PackageDetail>, String>),
}

/// A deferred operation produced by an event handler. Commands execute off
/// the synchronous path and complete by enqueueing exactly one result event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Reload the installed and outdated listings.
    LoadPackages,
    /// Install a specifier (name or `name==version`).
    Install {
        /// Specifier handed to the package manager.
        spec: String,
        /// Label used in the completion status, e.g. `flask@3.0.0`.
        display: String,
    },
    /// Uninstall a package.
    Uninstall {
        /// Package name.
        name: String,
    },
    /// Upgrade a package to its latest version.
    Upgrade {
        /// Package name.
        name: String,
    },
    /// Sequentially upgrade a snapshot of the outdated list.
    UpgradeAll {
        /// The outdated packages captured at confirmation time.
        snapshot: Vec<Package>,
    },
    /// Run an index search.
    Search {
        /// Raw query text.
        query: String,
    },
    /// Fetch full detail for a package.
    FetchDetail {
        /// Package name.
        name: String,
    },
    /// Create a dependency file in the project directory.
    CreateManifest {
        /// Which file format to create.
        kind: ManifestKind,
        /// Project name (pyproject only).
        name: String,
        /// Initial version (pyproject only).
        version: String,
    },
}
