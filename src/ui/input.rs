//! Keyboard input handling for the TUI.
//!
//! Translates key events into application state changes. Overlay
//! states are handled first, then normal-mode navigation.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{
    App, AppState, LoginFocus, Tab, MAX_PASSWORD_LENGTH, MAX_USERNAME_LENGTH, PAGE_SCROLL_SIZE,
};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Error boundary overlay swallows input until dismissed
    if app.ui_error.is_some() {
        if matches!(key.code, KeyCode::Char('r') | KeyCode::Esc) {
            // Reset the error state only; the failed operation is not
            // retried automatically
            app.ui_error = None;
        }
        return Ok(false);
    }

    if matches!(app.state, AppState::LoggingIn) {
        return handle_login_input(app, key).await;
    }

    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

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

    // Normal mode
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Char('1') => app.current_tab = Tab::Notifications,
        KeyCode::Char('2') => app.current_tab = Tab::Reports,
        KeyCode::Char('3') => app.current_tab = Tab::Profile,
        KeyCode::Tab => app.current_tab = app.current_tab.next(),
        KeyCode::BackTab => app.current_tab = app.current_tab.prev(),

        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::PageUp => app.move_selection(-(PAGE_SCROLL_SIZE as isize)),
        KeyCode::PageDown => app.move_selection(PAGE_SCROLL_SIZE as isize),

        KeyCode::Char('a') => {
            if app.current_tab == Tab::Notifications {
                app.archive_selected_notification();
            }
        }
        KeyCode::Char('v') => {
            if app.current_tab == Tab::Notifications {
                app.show_archived = !app.show_archived;
                app.notification_selection = 0;
            }
        }
        KeyCode::Char('n') => {
            if app.current_tab == Tab::Reports {
                app.next_report_page();
            }
        }
        KeyCode::Char('p') => {
            if app.current_tab == Tab::Reports {
                app.prev_report_page();
            }
        }
        KeyCode::Char('u') => {
            app.status_message = None;
            app.refresh_all_background();
        }
        KeyCode::Char('L') => {
            app.logout();
        }
        KeyCode::Esc => {
            app.status_message = None;
        }
        _ => {}
    }

    Ok(false)
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Tab | KeyCode::Down => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Username,
            };
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Username,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Username => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => {
                // One attempt; the error, if any, is already on the form
                let _ = app.attempt_login().await;
            }
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Username => {
                app.login_username.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Username => {
                if app.login_username.len() < MAX_USERNAME_LENGTH {
                    app.login_username.push(c);
                }
            }
            LoginFocus::Password => {
                if app.login_password.len() < MAX_PASSWORD_LENGTH {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }

    Ok(false)
}
