use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, AppState, Tab};

use super::styles;
use super::tabs::{hierarchy, manage};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title bar
            Constraint::Length(2), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  Wardline";
    let source = format!(" {} ", app.source);
    let help_hint = "[?] Help";

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::styled(source.clone(), styles::muted_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.len() + source.chars().count() + help_hint.len() + 2),
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let main_tabs: Vec<(String, bool)> = [Tab::Hierarchy, Tab::Manage]
        .iter()
        .enumerate()
        .map(|(i, tab)| (format!("[{}] {}", i + 1, tab.title()), app.current_tab == *tab))
        .collect();

    let mut spans = vec![Span::raw(" ")];
    for (i, (label, selected)) in main_tabs.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let style = if *selected {
            styles::tab_style(true)
        } else {
            styles::muted_style()
        };
        spans.push(Span::styled(label.clone(), style));
    }

    // List/chart toggle on the right of the Hierarchy tab
    if app.current_tab == Tab::Hierarchy {
        let view = app.dashboard.browser.view;
        let sub_tabs = [
            ("[v] List", view == wardline_core::views::BrowserView::List),
            ("Chart", view == wardline_core::views::BrowserView::Chart),
        ];
        let main_width: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let sub_width: usize = sub_tabs.iter().map(|(l, _)| l.len()).sum::<usize>() + 3;
        let padding = (area.width as usize).saturating_sub(main_width + sub_width + 2);
        spans.push(Span::raw(" ".repeat(padding)));

        for (i, (label, selected)) in sub_tabs.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" | ", styles::muted_style()));
            }
            let style = if *selected {
                styles::tab_style(true)
            } else {
                styles::muted_style()
            };
            spans.push(Span::styled(*label, style));
        }
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Hierarchy => hierarchy::render(frame, app, area),
        Tab::Manage => manage::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[r]efresh | [q]uit";

    let (left_text, left_style) = if let Some(notice) = app.current_notice() {
        (format!(" {} ", notice), styles::notice_style(notice.level))
    } else if app.is_busy() {
        (" Loading...".to_string(), styles::muted_style())
    } else {
        (String::new(), styles::muted_style())
    };

    let right_text = format!(" {} ", shortcuts);
    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());

    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(Paragraph::new(status_line).style(styles::status_bar_style()), area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(56, 33, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled(format!(" Wardline {}", version), styles::title_style())),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1/2", "Switch tabs"),
        help_line("↑/↓", "Navigate list"),
        help_line("Esc", "Close dialog / go back"),
        help_line("r", "Refresh"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled(" Hierarchy Tab", styles::highlight_style())),
        help_line("/", "Search panchayaths"),
        help_line("Space", "Expand / collapse"),
        help_line("C/S/G/P", "Toggle role name labels"),
        help_line("s/g", "Supervisors / group leaders"),
        help_line("e/d", "Edit / delete panchayath"),
        help_line("n", "New panchayath"),
        help_line("v", "List / chart view"),
        Line::from(""),
        Line::from(Span::styled(" Manage Tab", styles::highlight_style())),
        help_line("a", "Show / hide the add agents panel"),
        help_line("[ / ]", "Previous / next panchayath"),
        help_line("←/→", "Previous / next role"),
        help_line("m", "Add new / view & edit"),
        help_line("Enter", "Start typing in the form"),
        help_line("e/d", "Edit / delete agent"),
        Line::from(""),
        Line::from(Span::styled(" Forms", styles::highlight_style())),
        help_line("Tab", "Next field"),
        help_line("←/→", "Choose who an agent reports to"),
        help_line("Enter", "Save"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
pub(crate) fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 6, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
