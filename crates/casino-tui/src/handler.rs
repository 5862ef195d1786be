use anyhow::Result;
use casino_core::post_login_target;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, FocusPane, InputMode, Screen};
use crate::form::FormState;
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Paste(text) => handle_paste(app, &text),
        AppEvent::Tick => {
            app.poll_tasks().await;
            app.tick_animation();
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => {
                app.should_quit = true;
                return;
            }
            KeyCode::Char('l') if app.is_authenticated() => {
                app.logout();
                return;
            }
            _ => {}
        }
    }

    if app.show_goto {
        handle_goto(app, key);
        return;
    }

    match (app.screen, app.input_mode) {
        (Screen::Login, _) => handle_login(app, key),
        (Screen::Page, InputMode::Normal) => handle_page_normal(app, key),
        (Screen::Page, InputMode::Editing) => handle_form_editing(app, key),
    }
}

fn handle_login(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.submit_login(),
        KeyCode::Tab | KeyCode::Down => app.login_form.next_field(),
        KeyCode::BackTab | KeyCode::Up => app.login_form.prev_field(),
        // Back to the app when the login screen was opened while logged in
        KeyCode::Esc if app.is_authenticated() => {
            let target = post_login_target(app.redirect_from.take());
            app.navigate(target);
        }
        _ => edit_text(&mut app.login_form, key),
    }
}

/// Keys shared by every text field: cursor movement and character editing.
fn edit_text(form: &mut FormState, key: KeyEvent) {
    match key.code {
        KeyCode::Backspace => form.backspace(),
        KeyCode::Delete => form.delete(),
        KeyCode::Left => form.cursor_left(),
        KeyCode::Right => form.cursor_right(),
        KeyCode::Home => form.cursor_home(),
        KeyCode::End => form.cursor_end(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => form.insert_char(c),
        _ => {}
    }
}

fn handle_page_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Tab cycles focus: Pages -> Actions -> Form -> Result -> Pages
        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusPane::Pages => FocusPane::Actions,
                FocusPane::Actions => FocusPane::Form,
                FocusPane::Form => FocusPane::Result,
                FocusPane::Result => FocusPane::Pages,
            };
        }
        KeyCode::BackTab => {
            app.focus = match app.focus {
                FocusPane::Pages => FocusPane::Result,
                FocusPane::Actions => FocusPane::Pages,
                FocusPane::Form => FocusPane::Actions,
                FocusPane::Result => FocusPane::Form,
            };
        }

        // Sections
        KeyCode::Char(']') => app.switch_section(true),
        KeyCode::Char('[') => app.switch_section(false),

        // Go to a location by path
        KeyCode::Char(':') | KeyCode::Char('g') => {
            app.show_goto = true;
            app.goto_input = app.route.path().to_string();
        }

        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            FocusPane::Pages => app.pages_down(),
            FocusPane::Actions => app.actions_down(),
            FocusPane::Form => {
                if let Some(form) = app.form.as_mut() {
                    form.next_field();
                }
            }
            FocusPane::Result => app.scroll_down(),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            FocusPane::Pages => app.pages_up(),
            FocusPane::Actions => app.actions_up(),
            FocusPane::Form => {
                if let Some(form) = app.form.as_mut() {
                    form.prev_field();
                }
            }
            FocusPane::Result => app.scroll_up(),
        },

        // Half-page scroll
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }

        KeyCode::Left | KeyCode::Char('h') if app.focus == FocusPane::Form => app.cycle_field(false),
        KeyCode::Right | KeyCode::Char('l') if app.focus == FocusPane::Form => app.cycle_field(true),

        KeyCode::Enter => match app.focus {
            FocusPane::Pages => {
                app.open_selected_page();
                app.focus = FocusPane::Actions;
            }
            FocusPane::Actions => {
                if app.form.as_ref().is_some_and(|f| f.fields.is_empty()) {
                    app.submit_action();
                } else {
                    app.focus = FocusPane::Form;
                    app.input_mode = InputMode::Editing;
                }
            }
            FocusPane::Form => app.input_mode = InputMode::Editing,
            FocusPane::Result => {}
        },
        KeyCode::Char('i') if app.focus == FocusPane::Form => app.input_mode = InputMode::Editing,

        // Send the current form as is
        KeyCode::Char('s') => app.submit_action(),

        KeyCode::Esc => {
            if app.cancel_pending() {
                app.banner = Some("Запрос отменён.".to_string());
            }
        }

        _ => {}
    }
}

fn handle_form_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => {
            app.submit_action();
            if app.form_error.is_none() {
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Tab | KeyCode::Down => {
            if let Some(form) = app.form.as_mut() {
                form.next_field();
            }
        }
        KeyCode::BackTab | KeyCode::Up => {
            if let Some(form) = app.form.as_mut() {
                form.prev_field();
            }
        }
        KeyCode::Left | KeyCode::Right
            if app.form.as_ref().and_then(FormState::focused_field).is_some_and(|f| f.is_choice()) =>
        {
            app.cycle_field(key.code == KeyCode::Right);
        }
        // Lookups cycle through loaded ids; with no directory they stay free text
        KeyCode::PageDown => app.cycle_field(true),
        KeyCode::PageUp => app.cycle_field(false),
        _ => {
            if let Some(form) = app.form.as_mut() {
                edit_text(form, key);
            }
        }
    }
}

fn handle_goto(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.show_goto = false,
        KeyCode::Enter => {
            app.show_goto = false;
            let location = std::mem::take(&mut app.goto_input);
            app.navigate_to(&location);
        }
        KeyCode::Backspace => {
            app.goto_input.pop();
        }
        KeyCode::Char(c) => app.goto_input.push(c),
        _ => {}
    }
}

/// Pasted text goes into whatever is being typed; line breaks are dropped.
fn handle_paste(app: &mut App, text: &str) {
    let chars = text.chars().filter(|c| !c.is_control());
    if app.show_goto {
        app.goto_input.extend(chars);
        return;
    }
    let form = match (app.screen, app.input_mode) {
        (Screen::Login, _) => Some(&mut app.login_form),
        (Screen::Page, InputMode::Editing) => app.form.as_mut(),
        (Screen::Page, InputMode::Normal) => None,
    };
    if let Some(form) = form {
        for c in chars {
            form.insert_char(c);
        }
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_pages = app.pages_area.is_some_and(|r| point_in_rect(mouse.column, mouse.row, r));
    let in_result = app.result_area.is_some_and(|r| point_in_rect(mouse.column, mouse.row, r));

    match mouse.kind {
        MouseEventKind::ScrollDown if in_result => {
            for _ in 0..3 {
                app.scroll_down();
            }
        }
        MouseEventKind::ScrollUp if in_result => {
            for _ in 0..3 {
                app.scroll_up();
            }
        }
        MouseEventKind::ScrollDown if in_pages => app.pages_down(),
        MouseEventKind::ScrollUp if in_pages => app.pages_up(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casino_core::testing::RecordingTransport;
    use casino_core::{ApiClient, Config, MemoryStorage, PageId, Route, SessionStore};
    use std::sync::Arc;

    fn press(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn logged_in_app() -> App {
        let mut store = SessionStore::load(Box::new(MemoryStorage::new()));
        store.login("admin", "Basic YWRtaW46YWRtaW4=", "").unwrap();
        let client = ApiClient::with_transport(Arc::new(RecordingTransport::new()), "http://proxy");
        App::new(Config::new(), store, client)
    }

    #[tokio::test]
    async fn test_goto_prompt_follows_redirects() {
        let mut app = logged_in_app();
        app.navigate(Route::Page(PageId::SecurityOverview));

        handle_event(&mut app, press(KeyCode::Char(':'))).await.unwrap();
        app.goto_input.clear();
        for c in "/incidents/reports".chars() {
            handle_event(&mut app, press(KeyCode::Char(c))).await.unwrap();
        }
        handle_event(&mut app, press(KeyCode::Enter)).await.unwrap();

        assert!(!app.show_goto);
        assert_eq!(app.route, Route::Page(PageId::IncidentReports));
    }

    #[tokio::test]
    async fn test_paste_fills_login_base_url() {
        let store = SessionStore::load(Box::new(MemoryStorage::new()));
        let client = ApiClient::with_transport(Arc::new(RecordingTransport::new()), "http://proxy");
        let mut app = App::new(Config::new(), store, client);
        app.navigate_to("/login");
        app.login_form.next_field();
        app.login_form.next_field();

        handle_event(&mut app, AppEvent::Paste("http://mis.local:8080\n".to_string()))
            .await
            .unwrap();
        assert_eq!(app.login_form.value("base_url"), "http://mis.local:8080");

        // Normal mode on a page ignores pastes
        let mut app = logged_in_app();
        app.navigate(Route::Page(PageId::Shifts));
        let before = app.form.as_ref().map(|f| f.values.clone());
        handle_event(&mut app, AppEvent::Paste("xyz".to_string())).await.unwrap();
        assert_eq!(app.form.as_ref().map(|f| f.values.clone()), before);
    }

    #[tokio::test]
    async fn test_ctrl_l_logs_out() {
        let mut app = logged_in_app();
        app.navigate(Route::Page(PageId::Shifts));

        let key = KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL);
        handle_event(&mut app, AppEvent::Key(key)).await.unwrap();
        assert_eq!(app.screen, Screen::Login);
        assert!(!app.is_authenticated());
    }

    #[tokio::test]
    async fn test_editing_choice_field_cycles() {
        let mut app = logged_in_app();
        app.navigate(Route::Page(PageId::Complaints));
        app.focus = FocusPane::Form;
        handle_event(&mut app, press(KeyCode::Char('i'))).await.unwrap();
        assert_eq!(app.input_mode, InputMode::Editing);

        let form = app.form.as_ref().unwrap();
        assert_eq!(form.value("category"), "SERVICE_QUALITY");
        handle_event(&mut app, press(KeyCode::Right)).await.unwrap();
        assert_eq!(app.form.as_ref().unwrap().value("category"), "STAFF_BEHAVIOR");
    }

    #[tokio::test]
    async fn test_section_keys_open_first_page() {
        let mut app = logged_in_app();
        app.navigate(Route::Page(PageId::HallMonitoring));

        handle_event(&mut app, press(KeyCode::Char(']'))).await.unwrap();
        assert_eq!(app.route, Route::Page(PageId::Incidents));
        handle_event(&mut app, press(KeyCode::Char('['))).await.unwrap();
        assert_eq!(app.route, Route::Page(PageId::SecurityOverview));
    }
}
