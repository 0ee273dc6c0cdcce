//! Form and confirmation dialog rendering shared by both tabs.

use ratatui::{
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use wardline_core::forms::{AgentField, AgentForm, UnitField, UnitForm};

use super::render::centered_rect_fixed;
use super::styles;

/// Visible width of a text field.
const FIELD_WIDTH: usize = 28;

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { "" };
    let shown: String = value
        .chars()
        .rev()
        .take(FIELD_WIDTH)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    Line::from(vec![
        Span::styled(format!("  {:<12}[", label), styles::muted_style()),
        Span::styled(format!("{:<width$}{}", shown, cursor, width = FIELD_WIDTH), style),
        Span::styled("]", styles::muted_style()),
    ])
}

fn footer_lines(error: Option<String>, submitting: bool) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from("")];
    if let Some(error) = error {
        lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style())));
    } else if submitting {
        lines.push(Line::from(Span::styled("  Saving...", styles::muted_style())));
    } else {
        lines.push(Line::from(""));
    }
    lines.push(Line::from(vec![
        Span::styled("  [Tab]", styles::help_key_style()),
        Span::styled(" next  ", styles::muted_style()),
        Span::styled("[Enter]", styles::help_key_style()),
        Span::styled(" save  ", styles::muted_style()),
        Span::styled("[Esc]", styles::help_key_style()),
        Span::styled(" cancel", styles::muted_style()),
    ]));
    lines
}

fn unit_form_lines(form: &UnitForm) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(""),
        field_line("Name", &form.name, form.focus == UnitField::Name),
        field_line("Wards", &form.ward_count, form.focus == UnitField::Wards),
    ];
    lines.extend(footer_lines(form.error.as_ref().map(|e| e.to_string()), form.submitting));
    lines
}

/// Lines for an agent form. `active` is false when the form is shown but
/// keystrokes go elsewhere.
pub fn agent_form_lines(form: &AgentForm, active: bool) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(vec![
            Span::styled("  Panchayath  ", styles::muted_style()),
            Span::styled(form.scope.name().to_string(), styles::highlight_style()),
        ]),
        Line::from(""),
    ];

    for field in form.fields() {
        let focused = active && form.focus == field;
        match field {
            AgentField::Name => lines.push(field_line(field.label(), &form.name, focused)),
            AgentField::Mobile => lines.push(field_line(field.label(), &form.mobile_number, focused)),
            AgentField::Ward => lines.push(field_line(field.label(), &form.ward, focused)),
            AgentField::Parent => {
                let style = if focused {
                    styles::selected_style()
                } else {
                    styles::list_item_style()
                };
                let hint = if form.parents.is_empty() {
                    format!("no {} in this panchayath", form.role.parent().map(|r| r.plural_noun()).unwrap_or(""))
                } else {
                    "←/→ to choose".to_string()
                };
                lines.push(Line::from(vec![
                    Span::styled(format!("  {:<12}", field.label()), styles::muted_style()),
                    Span::styled(format!("◀ {} ▶", form.parent_label()), style),
                    Span::styled(format!("  {}", hint), styles::muted_style()),
                ]));
            }
        }
    }

    if active {
        lines.extend(footer_lines(form.error.as_ref().map(|e| e.to_string()), form.submitting));
    } else {
        lines.push(Line::from(""));
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style())));
        }
        lines.push(Line::from(vec![
            Span::styled("  Press ", styles::muted_style()),
            Span::styled("[Enter]", styles::help_key_style()),
            Span::styled(" to start typing", styles::muted_style()),
        ]));
    }
    lines
}

fn render_dialog(frame: &mut Frame, title: String, lines: Vec<Line<'static>>, width: u16) {
    let height = (lines.len() as u16).saturating_add(2);
    let area = centered_rect_fixed(width, height, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(format!(" {} ", title))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

pub fn render_unit_form(frame: &mut Frame, form: &UnitForm) {
    render_dialog(frame, form.title().to_string(), unit_form_lines(form), 50);
}

pub fn render_agent_form(frame: &mut Frame, form: &AgentForm) {
    render_dialog(frame, form.title(), agent_form_lines(form, true), 64);
}

/// A yes/no dialog describing what confirming will do.
pub fn render_confirm(frame: &mut Frame, title: &str, message: String) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("  {}", message), styles::highlight_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to delete, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];
    // Long messages wrap; leave room for them.
    let extra = (message.chars().count() / 50) as u16;
    let height = 6 + extra;
    let area = centered_rect_fixed(56, height, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(format!(" {} ", title))
        .title_style(styles::error_style())
        .borders(Borders::ALL)
        .border_style(styles::error_style());

    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}
