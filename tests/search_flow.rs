//! Integration tests for the search screen's three-phase flow and its
//! result-event handling.

use crossterm::event::{Event as CEvent, KeyCode, KeyEvent, KeyModifiers};
use pipsea::events::{self, Step};
use pipsea::state::{
    AppEvent, AppState, Command, PackageDetail, Screen, SearchHit, SearchPhase,
};

/// What: Build a key-press event for the queue.
fn key(code: KeyCode) -> AppEvent {
    AppEvent::Input(CEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
}

/// What: Baseline state with the search screen active in the input phase.
fn search_app() -> AppState {
    let mut app = AppState::default();
    app.screen = Screen::Search;
    app
}

/// What: Drive one event through the dispatcher.
fn step(app: &mut AppState, ev: AppEvent) -> Step {
    events::handle(ev, app)
}

/// What: A search hit fixture.
fn hit(name: &str) -> SearchHit {
    SearchHit {
        name: name.to_string(),
        version: "1.0.0".to_string(),
        summary: format!("{name} summary"),
    }
}

/// What: A detail fixture with three selectable versions.
fn detail(name: &str) -> PackageDetail {
    PackageDetail {
        name: name.to_string(),
        version: "3.0.0".to_string(),
        summary: "A web framework".to_string(),
        author: "Someone".to_string(),
        license: "MIT".to_string(),
        home_page: String::new(),
        requires_python: ">=3.8".to_string(),
        versions: vec!["3.0.0".to_string(), "2.0.1".to_string(), "2.0.0".to_string()],
    }
}

#[test]
/// What: Typing edits the query; Enter with a non-empty query dispatches the
/// search command and raises the searching flag.
fn input_phase_dispatches_search() {
    let mut app = search_app();
    for c in "flask".chars() {
        step(&mut app, key(KeyCode::Char(c)));
    }
    step(&mut app, key(KeyCode::Backspace));
    assert_eq!(app.search.input, "flas");
    step(&mut app, key(KeyCode::Char('k')));

    let s = step(&mut app, key(KeyCode::Enter));
    assert_eq!(s.commands, vec![Command::Search { query: "flask".to_string() }]);
    assert!(app.search.searching);
    assert_eq!(app.search.phase, SearchPhase::Input);
}

#[test]
/// What: Enter with an empty query is a no-op.
fn input_phase_requires_minimum_length() {
    let mut app = search_app();
    let s = step(&mut app, key(KeyCode::Enter));
    assert!(s.commands.is_empty());
    assert!(!app.search.searching);
}

#[test]
/// What: `q` is text while searching, not a quit key.
fn q_is_text_in_search() {
    let mut app = search_app();
    let s = step(&mut app, key(KeyCode::Char('q')));
    assert!(!s.quit);
    assert_eq!(app.search.input, "q");
}

#[test]
/// What: A non-empty result set advances to the results phase with the
/// cursor reset; an empty set stays in input with the list cleared.
fn search_results_advance_phase() {
    let mut app = search_app();
    app.search.input = "flask".to_string();
    app.search.searching = true;

    step(
        &mut app,
        AppEvent::SearchCompleted(Ok(vec![hit("flask"), hit("python-flask")])),
    );
    assert!(!app.search.searching);
    assert_eq!(app.search.phase, SearchPhase::Results);
    assert_eq!(app.search.results.len(), 2);
    assert_eq!(app.search.cursor, 0);

    // A later empty answer clears the list and falls back to input.
    app.search.phase = SearchPhase::Input;
    app.search.searching = true;
    step(&mut app, AppEvent::SearchCompleted(Ok(Vec::new())));
    assert_eq!(app.search.phase, SearchPhase::Input);
    assert!(app.search.results.is_empty());
}

#[test]
/// What: A failed search stays in place and records the error.
fn search_failure_records_error() {
    let mut app = search_app();
    app.search.searching = true;
    step(
        &mut app,
        AppEvent::SearchCompleted(Err("index returned status 500".to_string())),
    );
    assert!(!app.search.searching);
    assert_eq!(app.search.phase, SearchPhase::Input);
    assert_eq!(app.search.error.as_deref(), Some("index returned status 500"));
}

#[test]
/// What: Result events are dropped when the search screen is not active.
fn results_ignored_outside_search() {
    let mut app = AppState::default();
    app.screen = Screen::Dashboard;
    step(&mut app, AppEvent::SearchCompleted(Ok(vec![hit("flask")])));
    assert!(app.search.results.is_empty());
    assert_eq!(app.search.phase, SearchPhase::Input);
}

#[test]
/// What: Submit on a selected result dispatches the detail fetch; the
/// detail result advances to the detail phase with the version cursor
/// reset.
fn results_to_detail() {
    let mut app = search_app();
    app.search.input = "flask".to_string();
    step(
        &mut app,
        AppEvent::SearchCompleted(Ok(vec![hit("flask"), hit("flask-login")])),
    );

    step(&mut app, key(KeyCode::Char('j')));
    assert_eq!(app.search.cursor, 1);
    step(&mut app, key(KeyCode::Char('k')));
    step(&mut app, key(KeyCode::Char('k')));
    assert_eq!(app.search.cursor, 0);

    let s = step(&mut app, key(KeyCode::Enter));
    assert_eq!(s.commands, vec![Command::FetchDetail { name: "flask".to_string() }]);
    assert!(app.search.detail_loading);

    step(&mut app, AppEvent::DetailFetched(Ok(Some(detail("flask")))));
    assert!(!app.search.detail_loading);
    let SearchPhase::Detail { detail, cursor } = &app.search.phase else {
        panic!("expected detail phase, got {:?}", app.search.phase);
    };
    assert_eq!(detail.name, "flask");
    assert_eq!(*cursor, 0);
}

#[test]
/// What: A failed detail fetch stays in results with an error; a missing
/// package records a not-found error.
fn detail_failures_record_error() {
    let mut app = search_app();
    app.search.input = "flask".to_string();
    step(&mut app, AppEvent::SearchCompleted(Ok(vec![hit("flask")])));
    step(&mut app, key(KeyCode::Enter));

    step(&mut app, AppEvent::DetailFetched(Err("request cancelled".to_string())));
    assert_eq!(app.search.phase, SearchPhase::Results);
    assert_eq!(app.search.error.as_deref(), Some("request cancelled"));

    step(&mut app, key(KeyCode::Enter));
    step(&mut app, AppEvent::DetailFetched(Ok(None)));
    assert_eq!(app.search.phase, SearchPhase::Results);
    assert!(app.search.error.as_deref().is_some_and(|e| e.contains("not found")));
}

#[test]
/// What: Selecting a version builds the exact specifier, returns to the
/// dashboard with the loading gate up, resets the search state, and
/// dispatches the install.
fn detail_install_flow() {
    let mut app = search_app();
    app.search.input = "flask".to_string();
    step(&mut app, AppEvent::SearchCompleted(Ok(vec![hit("flask")])));
    step(&mut app, key(KeyCode::Enter));
    step(&mut app, AppEvent::DetailFetched(Ok(Some(detail("flask")))));

    // Move to the second-newest version, bounded below and above.
    step(&mut app, key(KeyCode::Char('j')));
    step(&mut app, key(KeyCode::Char('j')));
    step(&mut app, key(KeyCode::Char('j')));
    step(&mut app, key(KeyCode::Char('j')));
    let SearchPhase::Detail { cursor, .. } = &app.search.phase else {
        panic!("expected detail phase");
    };
    assert_eq!(*cursor, 2);
    step(&mut app, key(KeyCode::Char('k')));

    let s = step(&mut app, key(KeyCode::Enter));
    assert_eq!(
        s.commands,
        vec![Command::Install {
            spec: "flask==2.0.1".to_string(),
            display: "flask@2.0.1".to_string(),
        }]
    );
    assert_eq!(app.screen, Screen::Dashboard);
    assert!(app.is_loading);
    assert_eq!(app.search.phase, SearchPhase::Input);
    assert!(app.search.input.is_empty());
}

#[test]
/// What: Cancel walks back one phase at a time and fully resets on leaving
/// the screen.
fn escape_walks_back() {
    let mut app = search_app();
    app.search.input = "flask".to_string();
    step(&mut app, AppEvent::SearchCompleted(Ok(vec![hit("flask")])));
    step(&mut app, key(KeyCode::Enter));
    step(&mut app, AppEvent::DetailFetched(Ok(Some(detail("flask")))));

    step(&mut app, key(KeyCode::Esc));
    assert_eq!(app.search.phase, SearchPhase::Results);
    step(&mut app, key(KeyCode::Esc));
    assert_eq!(app.search.phase, SearchPhase::Input);
    step(&mut app, key(KeyCode::Esc));
    assert_eq!(app.screen, Screen::Dashboard);
    assert!(app.search.input.is_empty());
    assert!(app.search.results.is_empty());
}

#[test]
/// What: The install from the detail phase is gated while another mutating
/// command is in flight.
fn detail_install_respects_loading_gate() {
    let mut app = search_app();
    app.search.phase = SearchPhase::Detail { detail: detail("flask"), cursor: 0 };
    app.is_loading = true;
    let s = step(&mut app, key(KeyCode::Enter));
    assert!(s.commands.is_empty());
    assert_eq!(app.screen, Screen::Search);
}

#[test]
/// What: A pending version target set while the search screen is active is
/// consumed once, resetting the screen into the forced detail flow.
fn forced_entry_consumes_target() {
    let mut app = search_app();
    app.search.input = "typed text".to_string();
    app.pending_version_target = Some("requests".to_string());

    // Any event delivery triggers the consumption.
    let s = step(&mut app, key(KeyCode::Char('x')));
    assert_eq!(s.commands, vec![Command::FetchDetail { name: "requests".to_string() }]);
    assert_eq!(app.search.input, "requests");
    assert!(app.search.detail_loading);
    assert!(app.pending_version_target.is_none());
}
