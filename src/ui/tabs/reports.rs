//! Monthly reports tab: paginated table of per-school reports.

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::ui::styles;
use crate::utils::{format_count, truncate_string};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(vec![
        Cell::from("Month"),
        Cell::from("School"),
        Cell::from("Meals"),
        Cell::from("Students"),
        Cell::from("Submitted"),
    ])
    .style(styles::highlight_style());

    let rows: Vec<Row> = app
        .reports
        .reports
        .iter()
        .map(|r| {
            let submitted = match r.submitted_at {
                Some(dt) => dt.format("%b %d, %Y").to_string(),
                None => "-".to_string(),
            };
            Row::new(vec![
                Cell::from(r.month_display()),
                Cell::from(truncate_string(&r.school_display(), 32)),
                Cell::from(format_count(r.meals_served)),
                Cell::from(format_count(r.students_enrolled)),
                Cell::from(submitted),
            ])
        })
        .collect();

    let title = format!(
        " Monthly Reports - page {}/{} ({} total) ",
        app.reports.page_number(),
        app.reports.page_count(),
        app.reports.total
    );

    let mut footer_spans = vec![Span::styled(" ", styles::muted_style())];
    if app.reports.offset > 0 {
        footer_spans.push(Span::styled("[p]", styles::help_key_style()));
        footer_spans.push(Span::styled(" prev  ", styles::muted_style()));
    }
    if app.reports.has_more() {
        footer_spans.push(Span::styled("[n]", styles::help_key_style()));
        footer_spans.push(Span::styled(" next", styles::muted_style()));
    }

    let table = Table::new(
        rows,
        [
            Constraint::Length(16),
            Constraint::Min(20),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .row_highlight_style(styles::selected_style())
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(styles::border_style(true))
            .title(title)
            .title_bottom(Line::from(footer_spans)),
    );

    let mut state = TableState::default();
    if !app.reports.reports.is_empty() {
        state.select(Some(
            app.report_selection.min(app.reports.reports.len() - 1),
        ));
    }

    frame.render_stateful_widget(table, area, &mut state);
}
