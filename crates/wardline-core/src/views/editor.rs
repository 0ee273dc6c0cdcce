//! Hierarchy editor: pick a unit and a role, then add or manage agents.
//!
//! Unit, role and mode are independent selections. Changing one never
//! resets the others.

use tracing::debug;

use super::panel::{agent_notice, AgentPanel};
use crate::forms::AgentForm;
use crate::jobs::{Completed, Invalidation, Reply, Request};
use crate::models::{Role, Unit, UnitScope};
use crate::notice::Notices;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
    #[default]
    Create,
    Browse,
}

impl EditorMode {
    pub fn toggle(&self) -> Self {
        match self {
            EditorMode::Create => EditorMode::Browse,
            EditorMode::Browse => EditorMode::Create,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EditorMode::Create => "Add New",
            EditorMode::Browse => "View & Edit",
        }
    }
}

#[derive(Debug)]
pub struct HierarchyEditor {
    /// Whether the "add agents" panel is expanded.
    pub panel_open: bool,
    scope: UnitScope,
    role: Role,
    mode: EditorMode,
    /// Unit picker entries, ordered by name.
    units: Vec<Unit>,
    /// Create form for the current role and unit.
    pub form: AgentForm,
    /// Existing agents for the current role and unit.
    pub list: AgentPanel,
    pub notices: Notices,
}

impl Default for HierarchyEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl HierarchyEditor {
    pub fn new() -> Self {
        let role = Role::Coordinator;
        let scope = UnitScope::All;
        Self {
            panel_open: false,
            form: AgentForm::create(role, scope.clone()),
            list: AgentPanel::new(role, scope.clone()),
            scope,
            role,
            mode: EditorMode::default(),
            units: Vec::new(),
            notices: Notices::default(),
        }
    }

    pub fn scope(&self) -> &UnitScope {
        &self.scope
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Requests the active form or list needs to show current data.
    fn activate(&mut self) -> Vec<Request> {
        if !self.panel_open {
            return Vec::new();
        }
        match self.mode {
            EditorMode::Create => self.form.parents_request().into_iter().collect(),
            EditorMode::Browse => vec![self.list.load()],
        }
    }

    /// Reload whatever the open panel shows. The unit picker is filled
    /// from the dashboard's shared unit list.
    pub fn refresh(&mut self) -> Vec<Request> {
        self.activate()
    }

    pub fn toggle_panel(&mut self) -> Vec<Request> {
        self.panel_open = !self.panel_open;
        self.activate()
    }

    // ===== Selection =====

    /// Picker entries: the "all" sentinel, then every unit.
    pub fn unit_options(&self) -> Vec<UnitScope> {
        std::iter::once(UnitScope::All)
            .chain(self.units.iter().map(|u| UnitScope::Unit(u.to_ref())))
            .collect()
    }

    pub fn select_scope(&mut self, scope: UnitScope) -> Vec<Request> {
        if self.scope.same_as(&scope) {
            return Vec::new();
        }
        debug!(unit = scope.name(), "Editor unit selected");
        self.scope = scope.clone();
        let parents = self.form.set_scope(scope.clone());
        self.list = AgentPanel::new(self.role, scope);
        match self.mode {
            EditorMode::Create if self.panel_open => parents.into_iter().collect(),
            _ => self.activate(),
        }
    }

    fn step_unit(&mut self, forward: bool) -> Vec<Request> {
        let options = self.unit_options();
        let pos = options
            .iter()
            .position(|o| o.same_as(&self.scope))
            .unwrap_or(0);
        let next = if forward {
            (pos + 1) % options.len()
        } else {
            (pos + options.len() - 1) % options.len()
        };
        self.select_scope(options[next].clone())
    }

    pub fn next_unit(&mut self) -> Vec<Request> {
        self.step_unit(true)
    }

    pub fn prev_unit(&mut self) -> Vec<Request> {
        self.step_unit(false)
    }

    pub fn select_role(&mut self, role: Role) -> Vec<Request> {
        if self.role == role {
            return Vec::new();
        }
        debug!(role = ?role, "Editor role selected");
        self.role = role;
        self.form = AgentForm::create(role, self.scope.clone());
        self.list = AgentPanel::new(role, self.scope.clone());
        self.activate()
    }

    pub fn set_mode(&mut self, mode: EditorMode) -> Vec<Request> {
        if self.mode == mode {
            return Vec::new();
        }
        self.mode = mode;
        self.activate()
    }

    pub fn toggle_mode(&mut self) -> Vec<Request> {
        self.set_mode(self.mode.toggle())
    }

    // ===== Forms =====

    pub fn submit_create(&mut self) -> Option<Request> {
        self.form.submit()
    }

    /// Open the edit form for the selected agent in browse mode.
    pub fn edit_agent(&mut self) -> Option<Request> {
        self.list.begin_edit(&self.units)
    }

    // ===== Completions =====

    pub fn apply(&mut self, done: &Completed) -> Vec<Request> {
        match &done.request {
            Request::ListUnits => match &done.result {
                Ok(Reply::Units(units)) => {
                    let mut units = units.clone();
                    units.sort_by_key(|u| u.name.to_lowercase());
                    self.units = units;
                    return self.reconcile_scope();
                }
                Ok(_) => {}
                Err(_) => debug!("Unit picker keeps its previous entries"),
            },
            Request::CreateAgent { role, .. } => {
                if *role == self.form.role {
                    if done.is_ok() {
                        self.form.clear();
                    } else {
                        self.form.submitting = false;
                    }
                }
                if let Some(notice) = agent_notice(&done.request, &done.result) {
                    self.notices.push(notice);
                }
            }
            Request::ListAgents { role, scope } => {
                let handled = self.list.apply(done, &mut self.notices)
                    || match &done.result {
                        Ok(Reply::Agents(agents)) => self.form.accept_parents(*role, scope, agents),
                        _ => false,
                    };
                if !handled {
                    debug!(role = ?role, scope = scope.name(), "Dropping stale agent list");
                }
            }
            Request::UpdateAgent { .. } | Request::DeleteAgent { .. } => {
                if !self.list.apply(done, &mut self.notices) {
                    if let Some(notice) = agent_notice(&done.request, &done.result) {
                        self.notices.push(notice);
                    }
                }
            }
            Request::CreateUnit(_) | Request::UpdateUnit { .. } | Request::DeleteUnit { .. } => {
                debug!(kind = done.request.kind(), "Unit mutations are handled by the browser");
            }
        }
        Vec::new()
    }

    /// Refresh the selected unit's handle after a unit list reload. A unit
    /// that no longer exists falls back to the "all" sentinel.
    fn reconcile_scope(&mut self) -> Vec<Request> {
        let Some(id) = self.scope.unit_id().map(str::to_string) else {
            return Vec::new();
        };
        match self.units.iter().find(|u| u.id == id) {
            Some(unit) => {
                let scope = UnitScope::Unit(unit.to_ref());
                self.scope = scope.clone();
                self.form.scope = scope.clone();
                self.list.scope = scope;
                Vec::new()
            }
            None => self.select_scope(UnitScope::All),
        }
    }

    /// Re-fetch after a mutation anywhere on the dashboard.
    pub fn invalidate(&mut self, invalidation: &Invalidation) -> Vec<Request> {
        let mut requests = Vec::new();
        if self.panel_open {
            match self.mode {
                EditorMode::Browse => requests.extend(self.list.invalidate(invalidation)),
                EditorMode::Create if self.form.scope.is_affected_by(invalidation.unit_id()) => {
                    requests.extend(self.form.parents_request())
                }
                EditorMode::Create => {}
            }
        }
        requests
    }
}
