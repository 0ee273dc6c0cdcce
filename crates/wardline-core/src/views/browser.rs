//! Hierarchy browser: every panchayath with roll-up counts.
//!
//! Filtering and sorting are derived from the fetched list on each read.
//! Counts are only ever replaced by a re-fetch.

use std::cmp::Reverse;
use std::collections::HashMap;

use tracing::{debug, info};

use super::panel::{agent_notice, AgentPanel};
use crate::forms::UnitForm;
use crate::jobs::{Completed, Invalidation, Reply, Request};
use crate::models::{Role, Unit, UnitScope};
use crate::notice::{Notice, Notices};
use crate::utils::contains_ignore_case;

/// List or chart presentation of the unit list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowserView {
    #[default]
    List,
    Chart,
}

impl BrowserView {
    pub fn toggle(&self) -> Self {
        match self {
            BrowserView::List => BrowserView::Chart,
            BrowserView::Chart => BrowserView::List,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BrowserView::List => "List",
            BrowserView::Chart => "Chart",
        }
    }
}

/// Dialog currently shown over the unit list. Only one at a time.
#[derive(Debug, Clone)]
pub enum BrowserOverlay {
    UnitForm(UnitForm),
    ConfirmUnitDelete(Unit),
    Agents(AgentPanel),
}

#[derive(Debug)]
pub struct HierarchyBrowser {
    units: Vec<Unit>,
    /// True only while the first unit list is loading.
    pub loading: bool,
    search: String,
    expanded: HashMap<String, bool>,
    names_shown: HashMap<Role, bool>,
    pub view: BrowserView,
    pub overlay: Option<BrowserOverlay>,
    pub selected: usize,
    pub notices: Notices,
}

impl Default for HierarchyBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl HierarchyBrowser {
    pub fn new() -> Self {
        let names_shown = HashMap::from([
            (Role::Coordinator, true),
            (Role::Supervisor, true),
            (Role::GroupLeader, false),
            (Role::Pro, false),
        ]);
        Self {
            units: Vec::new(),
            loading: false,
            search: String::new(),
            expanded: HashMap::new(),
            names_shown,
            view: BrowserView::default(),
            overlay: None,
            selected: 0,
            notices: Notices::default(),
        }
    }

    /// Initial load.
    pub fn mount(&mut self) -> Vec<Request> {
        self.loading = true;
        vec![Request::ListUnits]
    }

    pub fn refresh(&self) -> Request {
        Request::ListUnits
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    // ===== Search and ordering =====

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
        self.clamp_selection();
    }

    /// Units matching the search term, largest headcount first.
    pub fn visible_units(&self) -> Vec<&Unit> {
        let needle = self.search.to_lowercase();
        let mut visible: Vec<&Unit> = self
            .units
            .iter()
            .filter(|u| needle.is_empty() || contains_ignore_case(&u.name, &needle))
            .collect();
        // sort_by_key is stable: equal totals keep fetched order
        visible.sort_by_key(|u| Reverse(u.total_agents()));
        visible
    }

    /// Message to show when nothing is visible, if anything.
    pub fn empty_message(&self) -> Option<String> {
        if self.loading || !self.visible_units().is_empty() {
            return None;
        }
        Some(if self.search.is_empty() {
            "No panchayaths found".to_string()
        } else {
            format!("No panchayaths found matching \"{}\"", self.search)
        })
    }

    // ===== Selection =====

    pub fn selected_unit(&self) -> Option<&Unit> {
        self.visible_units().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let len = self.visible_units().len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_units().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    // ===== Display toggles =====

    pub fn is_expanded(&self, unit_id: &str) -> bool {
        self.expanded.get(unit_id).copied().unwrap_or(true)
    }

    pub fn toggle_expand(&mut self, unit_id: &str) {
        let expanded = self.is_expanded(unit_id);
        self.expanded.insert(unit_id.to_string(), !expanded);
    }

    pub fn toggle_selected_expand(&mut self) {
        if let Some(id) = self.selected_unit().map(|u| u.id.clone()) {
            self.toggle_expand(&id);
        }
    }

    pub fn names_shown(&self, role: Role) -> bool {
        self.names_shown.get(&role).copied().unwrap_or(false)
    }

    /// Flip a role's name-visibility label. Counted roles only.
    pub fn toggle_names(&mut self, role: Role) {
        if let Some(shown) = self.names_shown.get_mut(&role) {
            *shown = !*shown;
        }
    }

    pub fn names_label(&self, role: Role) -> String {
        let state = if self.names_shown(role) {
            "Names Shown"
        } else {
            "Names Hidden"
        };
        format!("{} ({})", role.plural(), state)
    }

    pub fn toggle_view(&mut self) {
        self.view = self.view.toggle();
    }

    // ===== Unit dialogs =====

    pub fn new_unit(&mut self) {
        self.overlay = Some(BrowserOverlay::UnitForm(UnitForm::create()));
    }

    pub fn edit_unit(&mut self) {
        if let Some(unit) = self.selected_unit() {
            self.overlay = Some(BrowserOverlay::UnitForm(UnitForm::edit(unit)));
        }
    }

    pub fn unit_form_mut(&mut self) -> Option<&mut UnitForm> {
        match &mut self.overlay {
            Some(BrowserOverlay::UnitForm(form)) => Some(form),
            _ => None,
        }
    }

    pub fn submit_unit_form(&mut self) -> Option<Request> {
        self.unit_form_mut()?.submit()
    }

    pub fn request_delete_unit(&mut self) {
        if let Some(unit) = self.selected_unit().cloned() {
            self.overlay = Some(BrowserOverlay::ConfirmUnitDelete(unit));
        }
    }

    /// Confirm a pending unit delete. The unit stays listed until the
    /// re-fetch after a successful delete.
    pub fn confirm_delete_unit(&mut self) -> Option<Request> {
        match self.overlay.take() {
            Some(BrowserOverlay::ConfirmUnitDelete(unit)) => Some(Request::DeleteUnit {
                id: unit.id,
                name: unit.name,
            }),
            other => {
                self.overlay = other;
                None
            }
        }
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    // ===== Drill-down =====

    /// Open the agent dialog for `role` in the selected unit.
    pub fn drill_down(&mut self, role: Role) -> Option<Request> {
        if !role.supports_drill_down() {
            return None;
        }
        let unit = self.selected_unit()?.to_ref();
        let mut panel = AgentPanel::new(role, UnitScope::Unit(unit));
        let request = panel.load();
        self.overlay = Some(BrowserOverlay::Agents(panel));
        Some(request)
    }

    pub fn panel(&self) -> Option<&AgentPanel> {
        match &self.overlay {
            Some(BrowserOverlay::Agents(panel)) => Some(panel),
            _ => None,
        }
    }

    pub fn panel_mut(&mut self) -> Option<&mut AgentPanel> {
        match &mut self.overlay {
            Some(BrowserOverlay::Agents(panel)) => Some(panel),
            _ => None,
        }
    }

    /// Open the edit form for the selected agent in the drill-down.
    pub fn edit_agent(&mut self) -> Option<Request> {
        let units = self.units.clone();
        self.panel_mut()?.begin_edit(&units)
    }

    // ===== Completions =====

    pub fn apply(&mut self, done: &Completed) -> Vec<Request> {
        match &done.request {
            Request::ListUnits => {
                self.loading = false;
                match &done.result {
                    Ok(Reply::Units(units)) => {
                        info!(count = units.len(), "Loaded panchayaths");
                        self.units = units.clone();
                        self.clamp_selection();
                    }
                    Ok(_) => {}
                    Err(_) => self.notices.push(Notice::error("Failed to fetch panchayaths")),
                }
            }
            Request::CreateUnit(_) | Request::UpdateUnit { .. } => {
                let creating = matches!(done.request, Request::CreateUnit(_));
                if done.is_ok() {
                    self.overlay = None;
                    self.notices.push(Notice::success(if creating {
                        "Panchayath created successfully"
                    } else {
                        "Panchayath updated successfully"
                    }));
                } else {
                    if let Some(form) = self.unit_form_mut() {
                        form.submitting = false;
                    }
                    self.notices.push(Notice::error(if creating {
                        "Failed to create panchayath"
                    } else {
                        "Failed to update panchayath"
                    }));
                }
            }
            Request::DeleteUnit { name, .. } => {
                if done.is_ok() {
                    self.notices
                        .push(Notice::success(format!("{} has been deleted successfully", name)));
                } else {
                    self.notices.push(Notice::error("Failed to delete panchayath"));
                }
            }
            Request::ListAgents { .. } | Request::CreateAgent { .. } | Request::UpdateAgent { .. } | Request::DeleteAgent { .. } => {
                let handled = match &mut self.overlay {
                    Some(BrowserOverlay::Agents(panel)) => panel.apply(done, &mut self.notices),
                    _ => false,
                };
                if !handled {
                    match agent_notice(&done.request, &done.result) {
                        Some(notice) => self.notices.push(notice),
                        None => debug!(kind = done.request.kind(), "Dropping reply for closed dialog"),
                    }
                }
            }
        }
        Vec::new()
    }

    /// Re-fetch after a mutation anywhere on the dashboard.
    pub fn invalidate(&mut self, invalidation: &Invalidation) -> Vec<Request> {
        let mut requests = vec![Request::ListUnits];
        if let Some(panel) = self.panel_mut() {
            requests.extend(panel.invalidate(invalidation));
        }
        requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::Origin;
    use crate::models::RoleCounts;

    fn unit(id: &str, name: &str, counts: [u32; 4]) -> Unit {
        Unit {
            id: id.into(),
            name: name.into(),
            ward_count: 10,
            counts: RoleCounts {
                coordinators: counts[0],
                supervisors: counts[1],
                group_leaders: counts[2],
                pros: counts[3],
            },
        }
    }

    fn with_units(units: Vec<Unit>) -> HierarchyBrowser {
        let mut browser = HierarchyBrowser::new();
        browser.mount();
        browser.apply(&Completed {
            origin: Origin::Browser,
            request: Request::ListUnits,
            result: Ok(Reply::Units(units)),
        });
        browser
    }

    fn names(browser: &HierarchyBrowser) -> Vec<String> {
        browser.visible_units().iter().map(|u| u.name.clone()).collect()
    }

    #[test]
    fn test_sorted_by_total_descending() {
        let browser = with_units(vec![unit("a", "A", [1, 2, 3, 4]), unit("b", "B", [5, 5, 5, 10])]);
        assert_eq!(names(&browser), vec!["B", "A"]);
    }

    #[test]
    fn test_ties_keep_fetched_order() {
        let browser = with_units(vec![
            unit("1", "Vechoor", [1, 1, 0, 0]),
            unit("2", "Aymanam", [0, 0, 0, 5]),
            unit("3", "Kumarakom", [2, 0, 0, 0]),
        ]);
        assert_eq!(names(&browser), vec!["Aymanam", "Vechoor", "Kumarakom"]);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let mut browser = with_units(vec![
            unit("1", "Kumarakom", [1, 0, 0, 0]),
            unit("2", "Aymanam", [3, 0, 0, 0]),
            unit("3", "Thiruvarppu", [2, 0, 0, 0]),
        ]);
        browser.set_search("MAN");
        assert_eq!(names(&browser), vec!["Aymanam"]);
        browser.set_search("ar");
        assert_eq!(names(&browser), vec!["Thiruvarppu", "Kumarakom"]);
    }

    #[test]
    fn test_search_keeps_surrounding_whitespace() {
        let mut browser = with_units(vec![
            unit("1", "Vechoor East", [1, 0, 0, 0]),
            unit("2", "Eastfort", [0, 0, 0, 0]),
            unit("3", "Aymanam", [0, 0, 0, 0]),
        ]);
        browser.set_search(" east");
        assert_eq!(names(&browser), vec!["Vechoor East"]);

        browser.set_search("   ");
        assert!(names(&browser).is_empty());
        assert_eq!(
            browser.empty_message(),
            Some("No panchayaths found matching \"   \"".into())
        );
    }

    #[test]
    fn test_empty_message_contains_search_term() {
        let mut browser = with_units(vec![unit("1", "Kumarakom", [1, 0, 0, 0])]);
        browser.set_search("xyz");
        let message = browser.empty_message().expect("empty state");
        assert!(message.contains("xyz"));

        browser.set_search("");
        assert_eq!(browser.empty_message(), None);
        assert_eq!(with_units(vec![]).empty_message(), Some("No panchayaths found".into()));
    }

    #[test]
    fn test_expand_is_per_unit() {
        let mut browser = with_units(vec![unit("1", "A", [0; 4]), unit("2", "B", [0; 4])]);
        assert!(browser.is_expanded("1") && browser.is_expanded("2"));
        browser.toggle_expand("1");
        assert!(!browser.is_expanded("1"));
        assert!(browser.is_expanded("2"));
    }

    #[test]
    fn test_name_visibility_defaults_and_independence() {
        let mut browser = HierarchyBrowser::new();
        assert!(browser.names_shown(Role::Coordinator));
        assert!(browser.names_shown(Role::Supervisor));
        assert!(!browser.names_shown(Role::GroupLeader));
        assert!(!browser.names_shown(Role::Pro));

        browser.toggle_names(Role::Pro);
        assert!(browser.names_shown(Role::Pro));
        assert!(!browser.names_shown(Role::GroupLeader));
        assert_eq!(browser.names_label(Role::Pro), "PROs (Names Shown)");
    }

    #[test]
    fn test_fetch_failure_keeps_previous_list() {
        let mut browser = with_units(vec![unit("1", "A", [1, 0, 0, 0])]);
        browser.apply(&Completed {
            origin: Origin::Browser,
            request: Request::ListUnits,
            result: Err("offline".into()),
        });
        assert_eq!(browser.units().len(), 1);
        assert_eq!(
            browser.notices.latest().map(|n| n.to_string()),
            Some("Error: Failed to fetch panchayaths".into())
        );
    }

    #[test]
    fn test_delete_unit_cancel_issues_nothing() {
        let mut browser = with_units(vec![unit("1", "A", [0; 4])]);
        browser.request_delete_unit();
        browser.close_overlay();
        assert_eq!(browser.confirm_delete_unit(), None);

        browser.request_delete_unit();
        assert_eq!(
            browser.confirm_delete_unit(),
            Some(Request::DeleteUnit {
                id: "1".into(),
                name: "A".into()
            })
        );
        assert!(browser.overlay.is_none());
    }

    #[test]
    fn test_drill_down_only_for_supervisor_and_group_leader() {
        let mut browser = with_units(vec![unit("1", "A", [0; 4])]);
        assert_eq!(browser.drill_down(Role::Coordinator), None);
        assert_eq!(browser.drill_down(Role::Pro), None);
        assert!(browser.drill_down(Role::GroupLeader).is_some());
        assert_eq!(browser.panel().map(|p| p.role), Some(Role::GroupLeader));
    }

    #[test]
    fn test_invalidate_refetches_units_and_open_panel() {
        let mut browser = with_units(vec![unit("1", "A", [0; 4])]);
        browser.drill_down(Role::Supervisor);
        let requests = browser.invalidate(&Invalidation::MutationSucceeded {
            unit_id: Some("1".into()),
        });
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], Request::ListUnits);
    }

    #[test]
    fn test_unit_edit_failure_keeps_form_open() {
        let mut browser = with_units(vec![unit("1", "A", [0; 4])]);
        browser.edit_unit();
        let request = browser.submit_unit_form().expect("seeded form is valid");
        browser.apply(&Completed {
            origin: Origin::Browser,
            request,
            result: Err("500".into()),
        });
        assert!(browser.unit_form_mut().is_some_and(|f| !f.submitting));
        assert_eq!(
            browser.notices.latest().map(|n| n.description.clone()),
            Some("Failed to update panchayath".into())
        );
    }
}
