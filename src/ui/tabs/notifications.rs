//! Notifications tab: list on the left, selected message on the right.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::ui::styles;
use crate::utils::truncate_string;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    render_list(frame, app, chunks[0]);
    render_detail(frame, app, chunks[1]);
}

fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    let visible = app.visible_notifications();

    let items: Vec<ListItem> = visible
        .iter()
        .map(|n| {
            let marker = if n.archived { "✓ " } else { "  " };
            let style = if n.archived {
                styles::muted_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(Line::from(vec![
                Span::styled(marker, styles::success_style()),
                Span::styled(
                    truncate_string(n.summary(), area.width.saturating_sub(6) as usize),
                    style,
                ),
            ]))
        })
        .collect();

    let filter_label = if app.show_archived { "all" } else { "active" };
    let title = format!(
        " Notifications ({}, {}) ",
        visible.len(),
        filter_label
    );

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(styles::border_style(true))
                .title(title),
        )
        .highlight_style(styles::selected_style());

    let mut state = ListState::default();
    if !visible.is_empty() {
        state.select(Some(app.notification_selection.min(visible.len() - 1)));
    }

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false))
        .title(" Message ");

    let Some(notification) = app.selected_notification() else {
        let empty = Paragraph::new(Line::from(Span::styled(
            "No notifications",
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(empty, area);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            notification.title.clone(),
            styles::title_style(),
        )),
        Line::from(Span::styled(
            notification.created_display(),
            styles::muted_style(),
        )),
        Line::from(""),
    ];

    if let Some(ref message) = notification.message {
        lines.push(Line::from(Span::styled(
            message.clone(),
            styles::list_item_style(),
        )));
    }

    if notification.archived {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Archived",
            styles::success_style(),
        )));
    } else {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("[a]", styles::help_key_style()),
            Span::styled(" archive", styles::muted_style()),
        ]));
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(block);
    frame.render_widget(paragraph, area);
}
