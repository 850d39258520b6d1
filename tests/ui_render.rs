//! Rendering tests: frames are a pure projection of state (identical output
//! for identical state) and each screen shows its load-bearing content.

use pipsea::state::{
    AppState, ConfirmAction, ConfirmState, DashboardMode, Package, PackageDetail, Screen,
    SearchHit, SearchPhase, Severity,
};
use pipsea::ui::ui;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::buffer::Buffer;

/// What: Render `app` once into an 80x24 test backend and return the buffer.
fn render_once(app: &AppState) -> Buffer {
    let backend = TestBackend::new(80, 24);
    let mut terminal = Terminal::new(backend).expect("test terminal");
    terminal.draw(|f| ui(f, app)).expect("draw");
    terminal.backend().buffer().clone()
}

/// What: Flatten a buffer into its visible text.
fn buffer_text(buf: &Buffer) -> String {
    let mut out = String::new();
    for y in 0..buf.area.height {
        for x in 0..buf.area.width {
            out.push_str(buf[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}

/// What: A dashboard fixture with both panels populated.
fn dashboard_app() -> AppState {
    let mut app = AppState::default();
    app.screen = Screen::Dashboard;
    app.terminal_size = (80, 24);
    app.installed = vec![
        Package {
            name: "flask".to_string(),
            installed_version: "3.0.0".to_string(),
            latest_version: None,
            severity: None,
            outdated: false,
        },
        Package {
            name: "requests".to_string(),
            installed_version: "2.31.0".to_string(),
            latest_version: None,
            severity: None,
            outdated: false,
        },
    ];
    app.outdated = vec![Package {
        name: "urllib3".to_string(),
        installed_version: "1.26.0".to_string(),
        latest_version: Some("2.2.0".to_string()),
        severity: Some(Severity::Major),
        outdated: true,
    }];
    app
}

#[test]
/// What: Rendering the same state twice produces identical frames.
fn rendering_is_idempotent() {
    let mut app = dashboard_app();
    assert_eq!(render_once(&app), render_once(&app));

    app.screen = Screen::Help;
    assert_eq!(render_once(&app), render_once(&app));

    app.screen = Screen::Search;
    app.search.phase = SearchPhase::Results;
    app.search.input = "flask".to_string();
    app.search.results = vec![SearchHit {
        name: "flask".to_string(),
        version: "3.0.0".to_string(),
        summary: "A simple web framework".to_string(),
    }];
    assert_eq!(render_once(&app), render_once(&app));

    app.screen = Screen::Init;
    assert_eq!(render_once(&app), render_once(&app));
}

#[test]
/// What: The dashboard shows panel titles with counts, package rows, the
/// severity badge, and the status bar.
fn dashboard_renders_panels() {
    let app = dashboard_app();
    let text = buffer_text(&render_once(&app));
    assert!(text.contains("Installed (2)"));
    assert!(text.contains("Outdated (1)"));
    assert!(text.contains("flask"));
    assert!(text.contains("urllib3"));
    assert!(text.contains("(major)"));
    assert!(text.contains("1 outdated"));
    assert!(text.contains("? help"));
}

#[test]
/// What: The loading gate replaces the dashboard body with the placeholder.
fn dashboard_renders_loading() {
    let mut app = dashboard_app();
    app.is_loading = true;
    let text = buffer_text(&render_once(&app));
    assert!(text.contains("Loading packages..."));
    assert!(!text.contains("Installed (2)"));
}

#[test]
/// What: Sub-mode overlays render their prompts.
fn dashboard_renders_overlays() {
    let mut app = dashboard_app();
    app.dashboard.mode = DashboardMode::Confirm(ConfirmState {
        action: ConfirmAction::Remove,
        target: "flask".to_string(),
    });
    let text = buffer_text(&render_once(&app));
    assert!(text.contains("remove flask? [y/N]"));

    app.dashboard.mode = DashboardMode::AddInput { buffer: "requests==2.31.0".to_string() };
    let text = buffer_text(&render_once(&app));
    assert!(text.contains("Add package: requests==2.31.0"));
}

#[test]
/// What: The search screen renders each phase's skeleton.
fn search_renders_phases() {
    let mut app = AppState::default();
    app.screen = Screen::Search;
    app.terminal_size = (80, 24);
    let text = buffer_text(&render_once(&app));
    assert!(text.contains("Search PyPI"));
    assert!(text.contains("Enter to search"));

    app.search.input = "flask".to_string();
    app.search.results = vec![SearchHit {
        name: "flask".to_string(),
        version: "3.0.0".to_string(),
        summary: "A simple web framework".to_string(),
    }];
    app.search.phase = SearchPhase::Results;
    let text = buffer_text(&render_once(&app));
    assert!(text.contains("Results for \"flask\""));
    assert!(text.contains("(1 found)"));
    assert!(text.contains("v3.0.0"));

    app.search.phase = SearchPhase::Detail {
        detail: PackageDetail {
            name: "flask".to_string(),
            version: "3.0.0".to_string(),
            summary: "A simple web framework".to_string(),
            author: "Armin Ronacher".to_string(),
            license: "BSD-3-Clause".to_string(),
            home_page: String::new(),
            requires_python: ">=3.8".to_string(),
            versions: vec!["3.0.0".to_string(), "2.0.1".to_string()],
        },
        cursor: 0,
    };
    let text = buffer_text(&render_once(&app));
    assert!(text.contains("Select Version"));
    assert!(text.contains("(latest)"));
    assert!(text.contains("Python >=3.8"));
}

#[test]
/// What: The init screen renders the menu and highlights by cursor; the
/// help screen lists the chord and sub-mode keys.
fn init_and_help_render() {
    let mut app = AppState::default();
    app.screen = Screen::Init;
    app.terminal_size = (80, 24);
    let text = buffer_text(&render_once(&app));
    assert!(text.contains("No Python project found"));
    assert!(text.contains("Create pyproject.toml"));
    assert!(text.contains("Create requirements.txt"));

    app.screen = Screen::Help;
    let text = buffer_text(&render_once(&app));
    assert!(text.contains("Keyboard Reference"));
    assert!(text.contains("gg"));
    assert!(text.contains("Update all outdated"));
    assert!(text.contains("Install by specifier"));
}
