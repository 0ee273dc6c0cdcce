use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use wardline_core::models::{Role, Unit};
use wardline_core::utils::truncate;
use wardline_core::views::{AgentPanel, BrowserOverlay, BrowserView, HierarchyBrowser};

use crate::app::{App, AppState};
use crate::ui::forms;
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

/// Key that toggles a role's name label
fn names_key(role: Role) -> &'static str {
    match role {
        Role::Coordinator => "C",
        Role::Supervisor => "S",
        Role::GroupLeader => "G",
        Role::Pro => "P",
        Role::Customer => "",
    }
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let browser = &app.dashboard.browser;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Name toggles
            Constraint::Length(3), // Search
            Constraint::Min(5),    // Units
        ])
        .split(area);

    render_name_toggles(frame, browser, chunks[0]);
    render_search(frame, app, chunks[1]);

    match browser.view {
        BrowserView::List => render_unit_list(frame, browser, chunks[2]),
        BrowserView::Chart => render_chart(frame, browser, chunks[2]),
    }

    match &browser.overlay {
        Some(BrowserOverlay::UnitForm(form)) => forms::render_unit_form(frame, form),
        Some(BrowserOverlay::ConfirmUnitDelete(unit)) => forms::render_confirm(
            frame,
            "Delete Panchayath",
            format!(
                "Delete {}? This also deletes all coordinators, supervisors, group leaders and PROs in it.",
                unit.name
            ),
        ),
        Some(BrowserOverlay::Agents(panel)) => render_agent_panel(frame, panel),
        None => {}
    }
}

fn render_name_toggles(frame: &mut Frame, browser: &HierarchyBrowser, area: Rect) {
    let mut spans = vec![Span::styled(" Show Names: ", styles::muted_style())];
    for role in Role::COUNTED {
        spans.push(Span::styled(format!("[{}] ", names_key(role)), styles::help_key_style()));
        let style = if browser.names_shown(role) {
            styles::list_item_style()
        } else {
            styles::muted_style()
        };
        spans.push(Span::styled(browser.names_label(role), style));
        spans.push(Span::raw("  "));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_search(frame: &mut Frame, app: &App, area: Rect) {
    let searching = matches!(app.state, AppState::Searching);
    let term = app.dashboard.browser.search();
    let content = if term.is_empty() && !searching {
        Line::from(Span::styled(" Search panchayaths... [/]", styles::muted_style()))
    } else {
        let cursor = if searching { "▌" } else { "" };
        Line::from(vec![
            Span::styled(" / ", styles::search_style()),
            Span::styled(format!("{}{}", term, cursor), styles::list_item_style()),
        ])
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(searching));
    frame.render_widget(Paragraph::new(content).block(block), area);
}

fn unit_item(browser: &HierarchyBrowser, unit: &Unit, selected: bool) -> ListItem<'static> {
    let expanded = browser.is_expanded(&unit.id);
    let marker = if expanded { "▼" } else { "▶" };

    let mut lines = vec![Line::from(vec![
        Span::styled(format!(" {} ", marker), styles::muted_style()),
        Span::styled(format!("{:<28}", truncate(&unit.name, 28)), styles::title_style()),
        Span::styled(format!("{:>4} wards", unit.ward_count), styles::muted_style()),
        Span::styled(format!("   Total: {}", unit.total_agents()), styles::highlight_style()),
    ])];

    if expanded {
        for role in Role::COUNTED {
            let hint = match role {
                Role::Supervisor => "   [s] view",
                Role::GroupLeader => "   [g] view",
                _ => "",
            };
            lines.push(Line::from(vec![
                Span::raw("     "),
                Span::styled(format!("{:<30}", browser.names_label(role)), styles::list_item_style()),
                Span::styled(format!("{:>4}", unit.counts.get(role)), styles::highlight_style()),
                Span::styled(hint, styles::muted_style()),
            ]));
        }
    }

    let style = if selected {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    ListItem::new(lines).style(style)
}

fn render_unit_list(frame: &mut Frame, browser: &HierarchyBrowser, area: Rect) {
    let visible = browser.visible_units();

    let block = Block::default()
        .title(format!(" Panchayaths ({}) ", visible.len()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(browser.overlay.is_none()));

    if browser.loading {
        let paragraph = Paragraph::new(Span::styled(" Loading panchayaths...", styles::muted_style())).block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    if let Some(message) = browser.empty_message() {
        let paragraph = Paragraph::new(Span::styled(format!(" {}", message), styles::muted_style())).block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = visible
        .iter()
        .enumerate()
        .map(|(i, unit)| unit_item(browser, unit, i == browser.selected))
        .collect();

    let list = List::new(items).block(block);
    let mut state = ListState::default();
    state.select(Some(browser.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_chart(frame: &mut Frame, browser: &HierarchyBrowser, area: Rect) {
    let visible = browser.visible_units();

    let block = Block::default()
        .title(" Total agents per panchayath ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if let Some(message) = browser.empty_message() {
        let paragraph = Paragraph::new(Span::styled(format!(" {}", message), styles::muted_style())).block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let bars: Vec<Bar> = visible
        .iter()
        .map(|unit| {
            Bar::default()
                .value(u64::from(unit.total_agents()))
                .label(Line::from(truncate(&unit.name, 9)))
                .style(styles::bar_style())
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .bar_width(9)
        .bar_gap(2)
        .value_style(styles::selected_style())
        .label_style(styles::muted_style())
        .data(BarGroup::default().bars(&bars));

    frame.render_widget(chart, area);
}

fn render_agent_panel(frame: &mut Frame, panel: &AgentPanel) {
    // The edit form replaces the list while it is open
    if let Some(form) = &panel.form {
        forms::render_agent_form(frame, form);
        return;
    }

    let area = centered_rect_fixed(70, 20, frame.area());
    frame.render_widget(Clear, area);
    render_agent_list(frame, panel, area, true, " [e] edit  [d] delete  [Esc] close ");

    if let Some(agent) = &panel.pending_delete {
        forms::render_confirm(
            frame,
            &format!("Delete {}", panel.role.label()),
            format!("Delete {}? This cannot be undone.", agent.name),
        );
    }
}

/// Agent list with edit/delete hints. Shared with the Manage tab.
pub fn render_agent_list(frame: &mut Frame, panel: &AgentPanel, area: Rect, focused: bool, hint: &'static str) {
    let block = Block::default()
        .title(format!(" {} ", panel.title()))
        .title_style(styles::title_style())
        .title_bottom(Line::from(Span::styled(hint, styles::muted_style())))
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    if panel.loading && panel.agents.is_empty() {
        let paragraph = Paragraph::new(Span::styled(" Loading...", styles::muted_style())).block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    if panel.agents.is_empty() {
        let paragraph =
            Paragraph::new(Span::styled(format!(" {}", panel.empty_message()), styles::muted_style())).block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = panel
        .agents
        .iter()
        .enumerate()
        .map(|(i, agent)| {
            let ward = agent.ward_display().unwrap_or_default();
            let line = Line::from(vec![
                Span::raw(format!(" {:<26}", truncate(&agent.name, 26))),
                Span::styled(format!("{:<14}", agent.mobile_display()), styles::muted_style()),
                Span::styled(ward, styles::muted_style()),
            ]);
            let style = if i == panel.selected && focused {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let list = List::new(items).block(block);
    let mut state = ListState::default();
    state.select(Some(panel.selected));
    frame.render_stateful_widget(list, area, &mut state);
}
