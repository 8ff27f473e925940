//! Main frame rendering and layout.
//!
//! Protected content is only constructed when the session is
//! authenticated; the login view replaces it entirely, so there is no
//! flash of protected content on an unauthenticated mount.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, AppState, LoginFocus, Tab};

use super::styles;
use super::tabs::{notifications, profile, reports};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }

    if matches!(app.state, AppState::LoggingIn) {
        render_login_overlay(frame, app);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }

    // Error boundary: drawn above everything, reset with [r]
    if app.ui_error.is_some() {
        render_error_overlay(frame, app);
    }
}

fn render_title_bar(frame: &mut Frame, _app: &App, area: Rect) {
    let title = "  Canteen Reports";
    let help_hint = "[?] Help";
    let title_len = title.len();

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title_len as u16 + help_hint.len() as u16 + 4)
                as usize,
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let tabs = [
        ("[1] Notifications", Tab::Notifications),
        ("[2] Reports", Tab::Reports),
        ("[3] Profile", Tab::Profile),
    ];

    let mut spans = vec![Span::raw(" ")];
    for (i, (label, tab)) in tabs.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        spans.push(Span::styled(
            *label,
            styles::tab_style(app.current_tab == *tab),
        ));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    // Gate on the authenticated flag: unauthenticated sessions get a
    // placeholder, never the protected views.
    if !app.is_authenticated() {
        let placeholder = Paragraph::new(Line::from(Span::styled(
            "Sign in to view canteen data",
            styles::muted_style(),
        )))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(styles::border_style(false)),
        );
        frame.render_widget(placeholder, area);
        return;
    }

    match app.current_tab {
        Tab::Notifications => notifications::render(frame, app, area),
        Tab::Reports => reports::render(frame, app, area),
        Tab::Profile => profile::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else if app.refreshing {
        " Refreshing... ".to_string()
    } else {
        String::new()
    };

    let shortcuts = "[u]pdate | [L]ogout | [q]uit";
    let padding = (area.width as usize).saturating_sub(left_text.len() + shortcuts.len() + 2);

    let line = Line::from(vec![
        Span::styled(left_text, styles::highlight_style()),
        Span::raw(" ".repeat(padding)),
        Span::styled(shortcuts, styles::muted_style()),
        Span::raw(" "),
    ]);

    frame.render_widget(
        Paragraph::new(line).style(styles::status_bar_style()),
        area,
    );
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect(50, 14, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .title(" Sign In ");

    let username_marker = marker(app.login_focus == LoginFocus::Username);
    let password_marker = marker(app.login_focus == LoginFocus::Password);
    let button_marker = marker(app.login_focus == LoginFocus::Button);

    let masked: String = "*".repeat(app.login_password.len());

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("{} Username: ", username_marker), styles::muted_style()),
            Span::styled(app.login_username.clone(), styles::list_item_style()),
        ]),
        Line::from(vec![
            Span::styled(format!("{} Password: ", password_marker), styles::muted_style()),
            Span::styled(masked, styles::list_item_style()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("{} ", button_marker), styles::muted_style()),
            Span::styled("[ Sign In ]", styles::tab_style(app.login_focus == LoginFocus::Button)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Tab to move, Enter to submit",
            styles::muted_style(),
        )),
    ];

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            error.clone(),
            styles::error_style(),
        )));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_error_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 10, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::error_style())
        .title(" Something went wrong ");

    let message = app.ui_error.clone().unwrap_or_default();
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(message, styles::list_item_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("[r]", styles::help_key_style()),
            Span::styled(" dismiss and continue", styles::muted_style()),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect(36, 7, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .title(" Quit ");

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("Really quit?", styles::list_item_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("[y]", styles::help_key_style()),
            Span::styled(" yes   ", styles::muted_style()),
            Span::styled("[n]", styles::help_key_style()),
            Span::styled(" no", styles::muted_style()),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect(48, 16, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .title(" Help ");

    let keys: [(&str, &str); 10] = [
        ("1/2/3", "switch tab"),
        ("Tab", "next tab"),
        ("j/k, arrows", "move selection"),
        ("a", "archive notification"),
        ("v", "toggle archived filter"),
        ("n/p", "next/previous report page"),
        ("u", "refresh from server"),
        ("L", "log out"),
        ("?", "toggle this help"),
        ("q", "quit"),
    ];

    let mut lines = vec![Line::from("")];
    for (key, description) in keys {
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<13}", key), styles::help_key_style()),
            Span::styled(description, styles::help_desc_style()),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn marker(focused: bool) -> &'static str {
    if focused {
        ">"
    } else {
        " "
    }
}

/// Centered rect of fixed size, clamped to the frame.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
