//! Search screen key handling: the query → results → version-detail flow.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::state::{
    AppState, Command, PackageDetail, Screen, SearchHit, SearchPhase, SearchState, MAX_INPUT_LEN,
    MIN_SEARCH_LEN,
};

use super::Step;

/// Handle a key press on the search screen, routed by phase.
pub fn handle_key(key: KeyEvent, app: &mut AppState) -> Step {
    match app.search.phase {
        SearchPhase::Input => input_key(key, app),
        SearchPhase::Results => results_key(key, app),
        SearchPhase::Detail { .. } => detail_key(key, app),
    }
}

/// Query entry phase.
fn input_key(key: KeyEvent, app: &mut AppState) -> Step {
    match key.code {
        KeyCode::Esc => {
            app.search = SearchState::default();
            app.screen = Screen::Dashboard;
        }
        KeyCode::Enter => {
            if app.search.input.chars().count() >= MIN_SEARCH_LEN {
                app.search.searching = true;
                app.search.error = None;
                return Step::with(Command::Search { query: app.search.input.clone() });
            }
        }
        KeyCode::Backspace => {
            app.search.input.pop();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if !c.is_control() && app.search.input.chars().count() < MAX_INPUT_LEN {
                app.search.input.push(c);
            }
        }
        _ => {}
    }
    Step::none()
}

/// Result browsing phase.
fn results_key(key: KeyEvent, app: &mut AppState) -> Step {
    match key.code {
        KeyCode::Esc => {
            app.search.phase = SearchPhase::Input;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.search.cursor + 1 < app.search.results.len() {
                app.search.cursor += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.search.cursor = app.search.cursor.saturating_sub(1);
        }
        KeyCode::Enter => {
            if let Some(hit) = app.search.results.get(app.search.cursor) {
                let name = hit.name.clone();
                app.search.detail_loading = true;
                app.search.error = None;
                return Step::with(Command::FetchDetail { name });
            }
        }
        _ => {}
    }
    Step::none()
}

/// Detail and version-selection phase.
fn detail_key(key: KeyEvent, app: &mut AppState) -> Step {
    match key.code {
        KeyCode::Esc => {
            // Back to results, discarding the detail record.
            app.search.phase = SearchPhase::Results;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if let SearchPhase::Detail { detail, cursor } = &mut app.search.phase
                && *cursor + 1 < detail.versions.len()
            {
                *cursor += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if let SearchPhase::Detail { cursor, .. } = &mut app.search.phase {
                *cursor = cursor.saturating_sub(1);
            }
        }
        KeyCode::Enter => {
            if app.is_loading {
                return Step::none();
            }
            let SearchPhase::Detail { detail, cursor } = &app.search.phase else {
                return Step::none();
            };
            let Some(version) = detail.versions.get(*cursor) else {
                return Step::none();
            };
            let spec = format!("{}=={version}", detail.name);
            let display = format!("{}@{version}", detail.name);
            app.screen = Screen::Dashboard;
            app.is_loading = true;
            app.search = SearchState::default();
            return Step::with(Command::Install { spec, display });
        }
        _ => {}
    }
    Step::none()
}

/// Apply a finished search: at least one hit advances to the results phase,
/// zero hits stay in input with the list cleared.
pub fn on_search_completed(res: Result<Vec<SearchHit>, String>, app: &mut AppState) {
    let st = &mut app.search;
    st.searching = false;
    match res {
        Ok(hits) => {
            st.error = None;
            let any = !hits.is_empty();
            st.results = hits;
            st.cursor = 0;
            if any {
                st.phase = SearchPhase::Results;
            }
        }
        Err(e) => st.error = Some(e),
    }
}

/// Apply a finished detail fetch: success advances to the detail phase with
/// the version cursor reset; failure and "not found" record an error in
/// place.
pub fn on_detail_fetched(res: Result<Option<PackageDetail>, String>, app: &mut AppState) {
    let st = &mut app.search;
    st.detail_loading = false;
    match res {
        Ok(Some(detail)) => {
            st.error = None;
            st.phase = SearchPhase::Detail { detail, cursor: 0 };
        }
        Ok(None) => {
            st.error = Some(format!("package \"{}\" not found on the index", st.input));
        }
        Err(e) => st.error = Some(e),
    }
}
