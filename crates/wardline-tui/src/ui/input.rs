//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! view-model calls. Any requests a call returns are handed to the app,
//! which runs them in the background.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use wardline_core::forms::{AgentField, AgentForm};
use wardline_core::jobs::{Origin, Request};
use wardline_core::models::Role;
use wardline_core::views::{AgentPanel, BrowserOverlay, EditorMode};

use crate::app::{App, AppState, Tab};

/// What a keystroke did to an open agent form.
enum FormAction {
    None,
    Submit,
    Cancel,
}

/// Keys shared by every agent form: field navigation, typing, and the
/// parent picker on the "reports to" field.
fn agent_form_key(form: &mut AgentForm, key: KeyEvent) -> FormAction {
    match key.code {
        KeyCode::Enter => return FormAction::Submit,
        KeyCode::Esc => return FormAction::Cancel,
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.prev_field(),
        KeyCode::Left if form.focus == AgentField::Parent => form.cycle_parent(false),
        KeyCode::Right if form.focus == AgentField::Parent => form.cycle_parent(true),
        KeyCode::Backspace => form.pop_char(),
        KeyCode::Char(c) => form.push_char(c),
        _ => {}
    }
    FormAction::None
}

/// Outcome of a key sent to an agent list.
enum PanelKey {
    Handled(Option<Request>),
    Edit,
    Close,
    Unhandled,
}

fn agent_panel_key(panel: &mut AgentPanel, key: KeyEvent) -> PanelKey {
    if panel.pending_delete.is_some() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                return PanelKey::Handled(panel.confirm_delete());
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => panel.cancel_delete(),
            _ => {}
        }
        return PanelKey::Handled(None);
    }

    if let Some(form) = panel.form.as_mut() {
        return match agent_form_key(form, key) {
            FormAction::Submit => PanelKey::Handled(panel.submit_edit()),
            FormAction::Cancel => {
                panel.cancel_edit();
                PanelKey::Handled(None)
            }
            FormAction::None => PanelKey::Handled(None),
        };
    }

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => panel.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => panel.select_next(),
        KeyCode::Char('d') => {
            panel.request_delete();
        }
        KeyCode::Char('e') => return PanelKey::Edit,
        KeyCode::Esc => return PanelKey::Close,
        _ => return PanelKey::Unhandled,
    }
    PanelKey::Handled(None)
}

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    // Handle search mode
    if matches!(app.state, AppState::Searching) {
        handle_search_input(app, key);
        return Ok(false);
    }

    // Handle the Manage tab's create form
    if matches!(app.state, AppState::EditingForm) {
        handle_create_form_input(app, key);
        return Ok(false);
    }

    // Dialogs on the Hierarchy tab take every key
    if app.current_tab == Tab::Hierarchy && app.dashboard.browser.overlay.is_some() {
        handle_browser_overlay(app, key);
        return Ok(false);
    }

    // The browse list on the Manage tab gets first pick
    if app.current_tab == Tab::Manage && handle_editor_list(app, key) {
        return Ok(false);
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return Ok(false);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        KeyCode::Char('1') => {
            app.current_tab = Tab::Hierarchy;
            return Ok(false);
        }
        KeyCode::Char('2') => {
            app.current_tab = Tab::Manage;
            return Ok(false);
        }
        KeyCode::Char('r') => {
            app.refresh();
            return Ok(false);
        }
        _ => {}
    }

    match app.current_tab {
        Tab::Hierarchy => handle_hierarchy_input(app, key),
        Tab::Manage => handle_manage_input(app, key),
    }

    Ok(false)
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    let browser = &mut app.dashboard.browser;
    match key.code {
        KeyCode::Esc => {
            browser.set_search("");
            app.state = AppState::Normal;
        }
        KeyCode::Enter => {
            app.state = AppState::Normal;
        }
        KeyCode::Backspace => {
            let mut term = browser.search().to_string();
            term.pop();
            browser.set_search(term);
        }
        KeyCode::Up => browser.select_prev(),
        KeyCode::Down => browser.select_next(),
        KeyCode::Char(c) => {
            let mut term = browser.search().to_string();
            term.push(c);
            browser.set_search(term);
        }
        _ => {}
    }
}

fn handle_hierarchy_input(app: &mut App, key: KeyEvent) {
    let browser = &mut app.dashboard.browser;
    match key.code {
        KeyCode::Left => app.current_tab = app.current_tab.prev(),
        KeyCode::Right => app.current_tab = app.current_tab.next(),
        KeyCode::Up | KeyCode::Char('k') => browser.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => browser.select_next(),
        KeyCode::Char(' ') | KeyCode::Enter => browser.toggle_selected_expand(),
        KeyCode::Char('/') => app.state = AppState::Searching,
        KeyCode::Char('v') => browser.toggle_view(),
        KeyCode::Char('n') => browser.new_unit(),
        KeyCode::Char('e') => browser.edit_unit(),
        KeyCode::Char('d') => browser.request_delete_unit(),
        KeyCode::Char('C') => browser.toggle_names(Role::Coordinator),
        KeyCode::Char('S') => browser.toggle_names(Role::Supervisor),
        KeyCode::Char('G') => browser.toggle_names(Role::GroupLeader),
        KeyCode::Char('P') => browser.toggle_names(Role::Pro),
        KeyCode::Char('s') => {
            let request = browser.drill_down(Role::Supervisor);
            app.submit(Origin::Browser, request);
        }
        KeyCode::Char('g') => {
            let request = browser.drill_down(Role::GroupLeader);
            app.submit(Origin::Browser, request);
        }
        _ => {}
    }
}

fn handle_browser_overlay(app: &mut App, key: KeyEvent) {
    let browser = &mut app.dashboard.browser;
    let request = match &mut browser.overlay {
        Some(BrowserOverlay::UnitForm(form)) => match key.code {
            KeyCode::Enter => browser.submit_unit_form(),
            KeyCode::Esc => {
                browser.close_overlay();
                None
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                form.next_field();
                None
            }
            KeyCode::Backspace => {
                form.pop_char();
                None
            }
            KeyCode::Char(c) => {
                form.push_char(c);
                None
            }
            _ => None,
        },
        Some(BrowserOverlay::ConfirmUnitDelete(_)) => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => browser.confirm_delete_unit(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                browser.close_overlay();
                None
            }
            _ => None,
        },
        Some(BrowserOverlay::Agents(panel)) => match agent_panel_key(panel, key) {
            PanelKey::Handled(request) => request,
            PanelKey::Edit => browser.edit_agent(),
            PanelKey::Close => {
                browser.close_overlay();
                None
            }
            PanelKey::Unhandled => None,
        },
        None => None,
    };
    app.submit(Origin::Browser, request);
}

/// Route a key to the Manage tab's browse list. Returns false when the key
/// should fall through to the tab's own bindings.
fn handle_editor_list(app: &mut App, key: KeyEvent) -> bool {
    let editor = &mut app.dashboard.editor;
    if !editor.panel_open || editor.mode() != EditorMode::Browse {
        return false;
    }
    let request = match agent_panel_key(&mut editor.list, key) {
        PanelKey::Handled(request) => request,
        PanelKey::Edit => editor.edit_agent(),
        PanelKey::Close | PanelKey::Unhandled => return false,
    };
    app.submit(Origin::Editor, request);
    true
}

fn handle_manage_input(app: &mut App, key: KeyEvent) {
    let editor = &mut app.dashboard.editor;

    if key.code == KeyCode::Char('a') {
        let requests = editor.toggle_panel();
        app.submit(Origin::Editor, requests);
        return;
    }

    if !editor.panel_open {
        match key.code {
            KeyCode::Left => app.current_tab = app.current_tab.prev(),
            KeyCode::Right => app.current_tab = app.current_tab.next(),
            _ => {}
        }
        return;
    }

    let requests = match key.code {
        KeyCode::Char('[') => editor.prev_unit(),
        KeyCode::Char(']') => editor.next_unit(),
        KeyCode::Left => {
            let role = editor.role().prev();
            editor.select_role(role)
        }
        KeyCode::Right => {
            let role = editor.role().next();
            editor.select_role(role)
        }
        KeyCode::Char('m') => editor.toggle_mode(),
        KeyCode::Enter | KeyCode::Char('i') if editor.mode() == EditorMode::Create => {
            app.state = AppState::EditingForm;
            Vec::new()
        }
        _ => Vec::new(),
    };
    app.submit(Origin::Editor, requests);
}

fn handle_create_form_input(app: &mut App, key: KeyEvent) {
    let editor = &mut app.dashboard.editor;
    match agent_form_key(&mut editor.form, key) {
        FormAction::Submit => {
            let request = editor.submit_create();
            app.submit(Origin::Editor, request);
        }
        FormAction::Cancel => app.state = AppState::Normal,
        FormAction::None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crossterm::event::KeyModifiers;
    use wardline_core::MemoryBackend;

    use crate::app::tests::drain;

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_input(app, KeyEvent::new(code, KeyModifiers::NONE)).expect("input handled")
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    async fn started() -> (App, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::demo());
        let mut app = App::new(backend.clone(), "demo");
        app.start();
        drain(&mut app).await;
        (app, backend)
    }

    #[tokio::test]
    async fn test_quit_needs_confirmation() {
        let (mut app, _) = started().await;
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.state, AppState::ConfirmingQuit);
        assert!(!press(&mut app, KeyCode::Char('n')));
        assert_eq!(app.state, AppState::Normal);

        press(&mut app, KeyCode::Char('q'));
        assert!(press(&mut app, KeyCode::Char('y')));
        assert_eq!(app.state, AppState::Quitting);
    }

    #[tokio::test]
    async fn test_help_swallows_keys_until_closed() {
        let (mut app, _) = started().await;
        press(&mut app, KeyCode::Char('?'));
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.current_tab, Tab::Hierarchy);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::Normal);
    }

    #[tokio::test]
    async fn test_search_typing_and_escape() {
        let (mut app, _) = started().await;
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "ay");
        assert_eq!(app.dashboard.browser.search(), "ay");
        assert_eq!(app.dashboard.browser.visible_units().len(), 1);

        // Keys that are bindings elsewhere are just text here
        press(&mut app, KeyCode::Char('q'));
        assert_eq!(app.state, AppState::Searching);
        press(&mut app, KeyCode::Backspace);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.dashboard.browser.search(), "");
    }

    #[tokio::test]
    async fn test_new_unit_dialog_creates_unit() {
        let (mut app, _) = started().await;
        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "Kallara");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "14");
        press(&mut app, KeyCode::Enter);
        drain(&mut app).await;

        assert!(app.dashboard.browser.overlay.is_none());
        assert_eq!(app.dashboard.browser.units().len(), 5);
        let notice = app.current_notice().expect("success notice");
        assert_eq!(notice.description, "Panchayath created successfully");
    }

    #[tokio::test]
    async fn test_cancelled_unit_delete_keeps_unit() {
        let (mut app, backend) = started().await;
        press(&mut app, KeyCode::Char('d'));
        assert!(matches!(
            app.dashboard.browser.overlay,
            Some(BrowserOverlay::ConfirmUnitDelete(_))
        ));
        press(&mut app, KeyCode::Char('n'));
        drain(&mut app).await;
        assert!(app.dashboard.browser.overlay.is_none());
        assert_eq!(backend.call_count("delete_unit"), 0);
    }

    #[tokio::test]
    async fn test_drill_down_delete_confirmed() {
        let (mut app, backend) = started().await;
        // Kumarakom has the most agents and sorts first
        press(&mut app, KeyCode::Char('s'));
        drain(&mut app).await;
        assert_eq!(app.dashboard.browser.panel().map(|p| p.agents.len()), Some(2));

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        drain(&mut app).await;

        assert_eq!(backend.call_count("delete_agent"), 1);
        assert_eq!(app.dashboard.browser.panel().map(|p| p.agents.len()), Some(1));

        press(&mut app, KeyCode::Esc);
        assert!(app.dashboard.browser.overlay.is_none());
    }

    #[tokio::test]
    async fn test_manage_create_agent() {
        let (mut app, backend) = started().await;
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Char('a'));
        drain(&mut app).await;
        assert!(app.dashboard.editor.panel_open);

        // Aymanam is first after "All Panchayaths"
        press(&mut app, KeyCode::Char(']'));
        drain(&mut app).await;
        assert_eq!(app.dashboard.editor.scope().name(), "Aymanam");

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::EditingForm);
        type_text(&mut app, "Reena");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "9847012345");
        press(&mut app, KeyCode::Enter);
        drain(&mut app).await;

        assert_eq!(backend.call_count("create_agent"), 1);
        assert!(app.dashboard.editor.form.name.is_empty());
        assert_eq!(app.state, AppState::EditingForm);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::Normal);
    }

    #[tokio::test]
    async fn test_manage_role_and_mode_keys() {
        let (mut app, _) = started().await;
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Right);
        assert_eq!(app.dashboard.editor.role(), Role::Supervisor);
        assert_eq!(app.current_tab, Tab::Manage);

        press(&mut app, KeyCode::Char('m'));
        drain(&mut app).await;
        assert_eq!(app.dashboard.editor.mode(), EditorMode::Browse);
        assert_eq!(app.dashboard.editor.list.agents.len(), 3);

        // The list takes up/down; global keys still work
        press(&mut app, KeyCode::Down);
        assert_eq!(app.dashboard.editor.list.selected, 1);
        press(&mut app, KeyCode::Char('1'));
        assert_eq!(app.current_tab, Tab::Hierarchy);
    }
}
