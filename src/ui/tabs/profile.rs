//! Profile tab: the signed-in user's identity, permissions, and
//! avatar status. Reads the session through the injected auth context.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::ui::styles;
use crate::utils::format_optional;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .title(" Profile ");

    // Misuse of the context is a programmer error; surface it loudly
    // in the frame rather than silently defaulting.
    let session = match app.auth_context().session() {
        Ok(session) => session,
        Err(e) => {
            let error = Paragraph::new(Line::from(Span::styled(
                e.to_string(),
                styles::error_style(),
            )))
            .block(block);
            frame.render_widget(error, area);
            return;
        }
    };

    let mut lines: Vec<Line> = Vec::new();

    match app.user.profile() {
        Some(profile) => {
            lines.push(field("Name", &profile.full_name()));
            lines.push(field("Username", &profile.username));
            lines.push(field("Email", &format_optional(&profile.email, "-")));
            lines.push(field("Role", &profile.role_display()));
            lines.push(field(
                "School",
                &format_optional(&profile.school_name, "-"),
            ));
            if let Some(created) = profile.created_at {
                lines.push(field(
                    "Member since",
                    &created.format("%b %d, %Y").to_string(),
                ));
            }
        }
        None => {
            lines.push(Line::from(Span::styled(
                "Profile not loaded yet",
                styles::muted_style(),
            )));
        }
    }

    lines.push(Line::from(""));
    let avatar_status = match app.user.avatar() {
        Some(avatar) => format!("{} bytes", avatar.len()),
        None => "none".to_string(),
    };
    lines.push(field("Avatar", &avatar_status));

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Permissions",
        styles::highlight_style(),
    )));
    if app.user.permissions().is_empty() {
        lines.push(Line::from(Span::styled("  (none)", styles::muted_style())));
    } else {
        for permission in app.user.permissions() {
            lines.push(Line::from(Span::styled(
                format!("  {}", permission),
                styles::list_item_style(),
            )));
        }
    }

    lines.push(Line::from(""));
    let session_label = if session.is_authenticated() {
        Span::styled("Session active", styles::success_style())
    } else {
        Span::styled("No session", styles::error_style())
    };
    lines.push(Line::from(session_label));

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}

fn field(label: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<14}", label), styles::muted_style()),
        Span::styled(value.to_string(), styles::list_item_style()),
    ])
}
