use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use wardline_core::models::Role;
use wardline_core::views::{EditorMode, HierarchyEditor};

use super::hierarchy::render_agent_list;
use crate::app::{App, AppState};
use crate::ui::forms;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let editor = &app.dashboard.editor;

    let marker = if editor.panel_open { "▼" } else { "▶" };
    let header = Block::default()
        .title(Line::from(vec![
            Span::styled(format!(" {} Add Agents ", marker), styles::title_style()),
            Span::styled("[a] ", styles::help_key_style()),
        ]))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let inner = header.inner(area);
    frame.render_widget(header, area);

    if !editor.panel_open {
        let hint = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                " Add or manage coordinators, supervisors, group leaders, PROs and customers.",
                styles::muted_style(),
            )),
            Line::from(vec![
                Span::styled(" Press ", styles::muted_style()),
                Span::styled("[a]", styles::help_key_style()),
                Span::styled(" to open.", styles::muted_style()),
            ]),
        ]);
        frame.render_widget(hint, inner);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Unit picker
            Constraint::Length(1), // Roles
            Constraint::Length(1), // Role description
            Constraint::Length(1), // Mode
            Constraint::Length(1), // Spacer
            Constraint::Min(6),    // Form or list
        ])
        .split(inner);

    render_unit_picker(frame, editor, chunks[0]);
    render_roles(frame, editor, chunks[1]);
    frame.render_widget(
        Paragraph::new(Span::styled(format!("   {}", editor.role().description()), styles::muted_style())),
        chunks[2],
    );
    render_mode(frame, editor, chunks[3]);

    match editor.mode() {
        EditorMode::Create => render_create_form(frame, app, chunks[5]),
        EditorMode::Browse => render_browse(frame, editor, chunks[5]),
    }
}

fn render_unit_picker(frame: &mut Frame, editor: &HierarchyEditor, area: Rect) {
    let line = Line::from(vec![
        Span::styled(" Panchayath  ", styles::muted_style()),
        Span::styled(format!("◀ {} ▶", editor.scope().name()), styles::highlight_style()),
        Span::styled("  [ / ]", styles::help_key_style()),
        Span::styled(format!("  ({} panchayaths)", editor.units().len()), styles::muted_style()),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_roles(frame: &mut Frame, editor: &HierarchyEditor, area: Rect) {
    let mut spans = vec![Span::styled(" Role        ", styles::muted_style())];
    for (i, role) in Role::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let style = if *role == editor.role() {
            styles::tab_style(true)
        } else {
            styles::muted_style()
        };
        spans.push(Span::styled(role.label(), style));
    }
    spans.push(Span::styled("  ←/→", styles::help_key_style()));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_mode(frame: &mut Frame, editor: &HierarchyEditor, area: Rect) {
    let mut spans = vec![Span::styled(" Mode        ", styles::muted_style())];
    for (i, mode) in [EditorMode::Create, EditorMode::Browse].iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let style = if *mode == editor.mode() {
            styles::tab_style(true)
        } else {
            styles::muted_style()
        };
        spans.push(Span::styled(mode.label(), style));
    }
    spans.push(Span::styled("  [m]", styles::help_key_style()));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_create_form(frame: &mut Frame, app: &App, area: Rect) {
    let form = &app.dashboard.editor.form;
    let active = matches!(app.state, AppState::EditingForm);

    let block = Block::default()
        .title(format!(" {} ", form.title()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(active));

    frame.render_widget(Paragraph::new(forms::agent_form_lines(form, active)).block(block), area);
}

fn render_browse(frame: &mut Frame, editor: &HierarchyEditor, area: Rect) {
    let list = &editor.list;

    if let Some(form) = &list.form {
        let block = Block::default()
            .title(format!(" {} ", form.title()))
            .title_style(styles::title_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(true));
        frame.render_widget(Paragraph::new(forms::agent_form_lines(form, true)).block(block), area);
        return;
    }

    render_agent_list(frame, list, area, true, " [e] edit  [d] delete ");

    if let Some(agent) = &list.pending_delete {
        forms::render_confirm(
            frame,
            &format!("Delete {}", list.role.label()),
            format!("Delete {}? This cannot be undone.", agent.name),
        );
    }
}
