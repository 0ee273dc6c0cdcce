//! A list of agents of one role within one scope, with edit and delete.
//!
//! Used by the browser's drill-down dialog and the editor's browse mode.
//! While `form` is open it replaces the list; closing it restores the list.

use tracing::debug;

use crate::forms::AgentForm;
use crate::jobs::{Completed, Invalidation, Reply, Request};
use crate::models::{Agent, Role, Unit, UnitRef, UnitScope};
use crate::notice::{Notice, Notices};

#[derive(Debug, Clone)]
pub struct AgentPanel {
    pub role: Role,
    pub scope: UnitScope,
    pub agents: Vec<Agent>,
    pub loading: bool,
    pub selected: usize,
    /// Agent awaiting delete confirmation.
    pub pending_delete: Option<Agent>,
    /// Edit form, shown in place of the list.
    pub form: Option<AgentForm>,
}

impl AgentPanel {
    pub fn new(role: Role, scope: UnitScope) -> Self {
        Self {
            role,
            scope,
            agents: Vec::new(),
            loading: false,
            selected: 0,
            pending_delete: None,
            form: None,
        }
    }

    pub fn title(&self) -> String {
        format!("{} in {}", self.role.plural(), self.scope.name())
    }

    /// Request (re)loading the list.
    pub fn load(&mut self) -> Request {
        self.loading = true;
        Request::ListAgents {
            role: self.role,
            scope: self.scope.clone(),
        }
    }

    pub fn matches(&self, role: Role, scope: &UnitScope) -> bool {
        self.role == role && self.scope.same_as(scope)
    }

    pub fn empty_message(&self) -> String {
        format!("No {} found", self.role.plural_noun())
    }

    pub fn selected_agent(&self) -> Option<&Agent> {
        self.agents.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if !self.agents.is_empty() {
            self.selected = (self.selected + 1).min(self.agents.len() - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn request_delete(&mut self) -> bool {
        self.pending_delete = self.selected_agent().cloned();
        self.pending_delete.is_some()
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    pub fn confirm_delete(&mut self) -> Option<Request> {
        let agent = self.pending_delete.take()?;
        Some(Request::DeleteAgent {
            role: self.role,
            id: agent.id,
            name: agent.name,
            unit_id: agent.unit_id,
        })
    }

    /// Open the edit form for the selected agent. `units` resolves the
    /// agent's own unit when the panel spans every unit. Returns the request
    /// loading parent candidates, if the role has a parent.
    pub fn begin_edit(&mut self, units: &[Unit]) -> Option<Request> {
        let agent = self.selected_agent()?.clone();
        let scope = match &self.scope {
            UnitScope::Unit(unit) if unit.id == agent.unit_id => self.scope.clone(),
            _ => UnitScope::Unit(
                units
                    .iter()
                    .find(|u| u.id == agent.unit_id)
                    .map(Unit::to_ref)
                    .unwrap_or_else(|| UnitRef {
                        id: agent.unit_id.clone(),
                        name: agent.unit_id.clone(),
                        ward_count: None,
                    }),
            ),
        };
        let form = AgentForm::edit(self.role, scope, &agent);
        let request = form.parents_request();
        self.form = Some(form);
        request
    }

    pub fn cancel_edit(&mut self) {
        self.form = None;
    }

    pub fn submit_edit(&mut self) -> Option<Request> {
        self.form.as_mut()?.submit()
    }

    /// Apply a completion addressed to this panel. Returns false if the
    /// completion was not for this panel.
    pub fn apply(&mut self, done: &Completed, notices: &mut Notices) -> bool {
        match &done.request {
            Request::ListAgents { role, scope } if self.matches(*role, scope) => {
                self.loading = false;
                match &done.result {
                    Ok(Reply::Agents(agents)) => {
                        self.agents = agents.clone();
                        if self.selected >= self.agents.len() {
                            self.selected = self.agents.len().saturating_sub(1);
                        }
                    }
                    Ok(_) => {}
                    Err(_) => notices.push(Notice::error(format!(
                        "Failed to fetch {}",
                        self.role.plural_noun()
                    ))),
                }
                true
            }
            Request::ListAgents { role, scope } => match (&mut self.form, &done.result) {
                (Some(form), Ok(Reply::Agents(agents))) => form.accept_parents(*role, scope, agents),
                (Some(form), Err(_)) if form.role.parent() == Some(*role) => {
                    notices.push(Notice::error(format!("Failed to fetch {}", role.plural_noun())));
                    true
                }
                _ => false,
            },
            Request::UpdateAgent { role, id, .. } if *role == self.role => {
                let editing_this = self
                    .form
                    .as_ref()
                    .is_some_and(|f| f.editing.as_deref() == Some(id.as_str()));
                if editing_this {
                    if done.is_ok() {
                        self.form = None;
                    } else if let Some(form) = &mut self.form {
                        form.submitting = false;
                    }
                }
                if let Some(notice) = agent_notice(&done.request, &done.result) {
                    notices.push(notice);
                }
                true
            }
            Request::DeleteAgent { role, .. } if *role == self.role => {
                if let Some(notice) = agent_notice(&done.request, &done.result) {
                    notices.push(notice);
                }
                true
            }
            _ => false,
        }
    }

    /// Re-fetch if a mutation touched this panel's scope.
    pub fn invalidate(&mut self, invalidation: &Invalidation) -> Option<Request> {
        if self.scope.is_affected_by(invalidation.unit_id()) {
            Some(self.load())
        } else {
            debug!(role = ?self.role, scope = self.scope.name(), "Agent list not affected");
            None
        }
    }
}

/// Notice for the outcome of an agent mutation.
pub(crate) fn agent_notice(request: &Request, result: &Result<Reply, String>) -> Option<Notice> {
    let ok = result.is_ok();
    let notice = match request {
        Request::CreateAgent { role, .. } if ok => Notice::success(format!("{} added successfully", role.label())),
        Request::CreateAgent { role, .. } => Notice::error(format!("Failed to add {}", role.noun())),
        Request::UpdateAgent { role, .. } if ok => {
            Notice::success(format!("{} updated successfully", role.label()))
        }
        Request::UpdateAgent { role, .. } => Notice::error(format!("Failed to update {}", role.noun())),
        Request::DeleteAgent { name, .. } if ok => {
            Notice::success(format!("{} has been deleted successfully", name))
        }
        Request::DeleteAgent { role, .. } => Notice::error(format!("Failed to delete {}", role.noun())),
        _ => return None,
    };
    Some(notice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::Origin;
    use crate::models::RoleCounts;

    fn kumarakom() -> UnitScope {
        UnitScope::Unit(UnitRef {
            id: "u1".into(),
            name: "Kumarakom".into(),
            ward_count: Some(16),
        })
    }

    fn agent(id: &str, name: &str, unit_id: &str) -> Agent {
        Agent {
            id: id.into(),
            name: name.into(),
            mobile_number: "9847012345".into(),
            ward: None,
            unit_id: unit_id.into(),
            parent_id: None,
            created_at: None,
        }
    }

    fn completed(request: Request, result: Result<Reply, String>) -> Completed {
        Completed {
            origin: Origin::Browser,
            request,
            result,
        }
    }

    fn loaded_panel() -> AgentPanel {
        let mut panel = AgentPanel::new(Role::Supervisor, kumarakom());
        let request = panel.load();
        let mut notices = Notices::default();
        panel.apply(
            &completed(
                request,
                Ok(Reply::Agents(vec![agent("s1", "Anitha", "u1"), agent("s2", "Joseph", "u1")])),
            ),
            &mut notices,
        );
        panel
    }

    #[test]
    fn test_empty_message_names_the_role() {
        let panel = AgentPanel::new(Role::Supervisor, kumarakom());
        assert_eq!(panel.empty_message(), "No supervisors found");
        assert_eq!(
            AgentPanel::new(Role::GroupLeader, kumarakom()).empty_message(),
            "No group leaders found"
        );
    }

    #[test]
    fn test_stale_list_for_other_scope_is_ignored() {
        let mut panel = loaded_panel();
        let mut notices = Notices::default();
        let stale = completed(
            Request::ListAgents {
                role: Role::Supervisor,
                scope: UnitScope::All,
            },
            Ok(Reply::Agents(vec![])),
        );
        assert!(!panel.apply(&stale, &mut notices));
        assert_eq!(panel.agents.len(), 2);
    }

    #[test]
    fn test_fetch_failure_keeps_list_and_notifies() {
        let mut panel = loaded_panel();
        let mut notices = Notices::default();
        let request = panel.load();
        panel.apply(&completed(request, Err("timeout".into())), &mut notices);
        assert_eq!(panel.agents.len(), 2);
        assert!(!panel.loading);
        assert_eq!(
            notices.latest().map(|n| n.to_string()),
            Some("Error: Failed to fetch supervisors".to_string())
        );
    }

    #[test]
    fn test_delete_needs_confirmation() {
        let mut panel = loaded_panel();
        panel.select_next();
        assert!(panel.request_delete());
        panel.cancel_delete();
        assert_eq!(panel.confirm_delete(), None);

        panel.request_delete();
        match panel.confirm_delete() {
            Some(Request::DeleteAgent { id, name, unit_id, .. }) => {
                assert_eq!(id, "s2");
                assert_eq!(name, "Joseph");
                assert_eq!(unit_id, "u1");
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn test_edit_form_replaces_list_until_saved() {
        let mut panel = loaded_panel();
        let parents = panel.begin_edit(&[]);
        assert_eq!(
            parents,
            Some(Request::ListAgents {
                role: Role::Coordinator,
                scope: kumarakom()
            })
        );
        let request = panel.submit_edit().expect("valid seeded form");

        let mut notices = Notices::default();
        panel.apply(&completed(request.clone(), Err("conflict".into())), &mut notices);
        assert!(panel.form.as_ref().is_some_and(|f| !f.submitting));
        assert_eq!(notices.latest().map(|n| n.description.clone()), Some("Failed to update supervisor".into()));

        panel.apply(&completed(request, Ok(Reply::Done)), &mut notices);
        assert!(panel.form.is_none());
        assert_eq!(
            notices.latest().map(|n| n.description.clone()),
            Some("Supervisor updated successfully".into())
        );
    }

    #[test]
    fn test_edit_across_all_units_resolves_agent_unit() {
        let mut panel = AgentPanel::new(Role::Coordinator, UnitScope::All);
        panel.agents = vec![agent("c1", "Rajan", "u2")];
        let units = vec![Unit {
            id: "u2".into(),
            name: "Aymanam".into(),
            ward_count: 20,
            counts: RoleCounts::default(),
        }];
        assert_eq!(panel.begin_edit(&units), None);
        let form = panel.form.as_ref().expect("form open");
        assert_eq!(form.scope.name(), "Aymanam");
        assert_eq!(form.scope.unit().and_then(|u| u.ward_count), Some(20));
    }

    #[test]
    fn test_invalidate_only_matching_scope() {
        let mut panel = AgentPanel::new(Role::Pro, kumarakom());
        let other = Invalidation::MutationSucceeded {
            unit_id: Some("u9".into()),
        };
        assert_eq!(panel.invalidate(&other), None);
        let same = Invalidation::MutationSucceeded {
            unit_id: Some("u1".into()),
        };
        assert!(panel.invalidate(&same).is_some());
        assert!(panel.loading);
    }

    #[test]
    fn test_agent_notice_texts() {
        let delete = Request::DeleteAgent {
            role: Role::Pro,
            id: "p1".into(),
            name: "Arun Das".into(),
            unit_id: "u1".into(),
        };
        assert_eq!(
            agent_notice(&delete, &Ok(Reply::Done)).map(|n| n.description),
            Some("Arun Das has been deleted successfully".into())
        );
        assert_eq!(
            agent_notice(&delete, &Err("x".into())).map(|n| n.description),
            Some("Failed to delete PRO".into())
        );
        assert!(agent_notice(&Request::ListUnits, &Ok(Reply::Done)).is_none());
    }
}
