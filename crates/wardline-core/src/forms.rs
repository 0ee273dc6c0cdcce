//! Create/edit forms for units and agents.
//!
//! Forms hold raw text as typed. `submit` validates, and only a valid form
//! turns into a backend [`Request`]; an invalid one keeps its text and shows
//! the error inline.

use thiserror::Error;

use crate::jobs::Request;
use crate::models::{Agent, AgentDraft, Role, Unit, UnitDraft, UnitScope};
use crate::utils::normalize_mobile;

/// Maximum length for any text field.
const MAX_FIELD_LENGTH: usize = 64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Name is required")]
    NameRequired,

    #[error("Number of wards must be a whole number of at least 1")]
    InvalidWardCount,

    #[error("Mobile number must have 10 digits")]
    InvalidMobile,

    #[error("Ward must be a positive number")]
    InvalidWard,

    #[error("Ward must be between 1 and {0}")]
    WardOutOfRange(u32),

    #[error("Select a panchayath first")]
    UnitRequired,
}

/// Check if a character may be typed into a field (no control characters)
fn accepts_char(current_len: usize, c: char) -> bool {
    current_len < MAX_FIELD_LENGTH && !c.is_control()
}

fn is_numeric_char(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_mobile_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '+' | '-' | ' ')
}

// ============================================================================
// Unit form
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitField {
    Name,
    Wards,
}

#[derive(Debug, Clone)]
pub struct UnitForm {
    /// Id of the unit being edited; `None` when creating.
    pub editing: Option<String>,
    pub name: String,
    pub ward_count: String,
    pub focus: UnitField,
    pub error: Option<FormError>,
    pub submitting: bool,
}

impl UnitForm {
    pub fn create() -> Self {
        Self {
            editing: None,
            name: String::new(),
            ward_count: String::new(),
            focus: UnitField::Name,
            error: None,
            submitting: false,
        }
    }

    /// Form seeded with an existing unit's values.
    pub fn edit(unit: &Unit) -> Self {
        Self {
            editing: Some(unit.id.clone()),
            name: unit.name.clone(),
            ward_count: unit.ward_count.to_string(),
            ..Self::create()
        }
    }

    pub fn title(&self) -> &'static str {
        if self.editing.is_some() {
            "Edit Panchayath"
        } else {
            "Add Panchayath"
        }
    }

    pub fn next_field(&mut self) {
        self.focus = match self.focus {
            UnitField::Name => UnitField::Wards,
            UnitField::Wards => UnitField::Name,
        };
    }

    pub fn push_char(&mut self, c: char) {
        match self.focus {
            UnitField::Name => {
                if accepts_char(self.name.chars().count(), c) {
                    self.name.push(c);
                }
            }
            UnitField::Wards => {
                if is_numeric_char(c) && accepts_char(self.ward_count.len(), c) {
                    self.ward_count.push(c);
                }
            }
        }
    }

    pub fn pop_char(&mut self) {
        match self.focus {
            UnitField::Name => self.name.pop(),
            UnitField::Wards => self.ward_count.pop(),
        };
    }

    pub fn validate(&self) -> Result<UnitDraft, FormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::NameRequired);
        }
        let ward_count = match self.ward_count.trim().parse::<u32>() {
            Ok(n) if n >= 1 => n,
            _ => return Err(FormError::InvalidWardCount),
        };
        Ok(UnitDraft {
            name: name.to_string(),
            ward_count,
        })
    }

    /// Validate and build the save request. Returns None (with `error` set)
    /// when the form is invalid or a save is already in flight.
    pub fn submit(&mut self) -> Option<Request> {
        if self.submitting {
            return None;
        }
        match self.validate() {
            Ok(draft) => {
                self.error = None;
                self.submitting = true;
                Some(match &self.editing {
                    Some(id) => Request::UpdateUnit { id: id.clone(), draft },
                    None => Request::CreateUnit(draft),
                })
            }
            Err(e) => {
                self.error = Some(e);
                None
            }
        }
    }
}

// ============================================================================
// Agent form
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentField {
    Name,
    Mobile,
    Ward,
    Parent,
}

impl AgentField {
    pub fn label(&self) -> &'static str {
        match self {
            AgentField::Name => "Name",
            AgentField::Mobile => "Mobile",
            AgentField::Ward => "Ward",
            AgentField::Parent => "Reports to",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentForm {
    pub role: Role,
    pub scope: UnitScope,
    /// Id of the agent being edited; `None` when creating.
    pub editing: Option<String>,
    pub name: String,
    pub mobile_number: String,
    pub ward: String,
    pub parent_id: Option<String>,
    /// Candidate supervising agents, loaded for the form's unit.
    pub parents: Vec<Agent>,
    pub focus: AgentField,
    pub error: Option<FormError>,
    pub submitting: bool,
}

impl AgentForm {
    pub fn create(role: Role, scope: UnitScope) -> Self {
        Self {
            role,
            scope,
            editing: None,
            name: String::new(),
            mobile_number: String::new(),
            ward: String::new(),
            parent_id: None,
            parents: Vec::new(),
            focus: AgentField::Name,
            error: None,
            submitting: false,
        }
    }

    /// Form seeded with an existing agent's values.
    pub fn edit(role: Role, scope: UnitScope, agent: &Agent) -> Self {
        Self {
            editing: Some(agent.id.clone()),
            name: agent.name.clone(),
            mobile_number: agent.mobile_number.clone(),
            ward: agent.ward.map(|w| w.to_string()).unwrap_or_default(),
            parent_id: agent.parent_id.clone(),
            ..Self::create(role, scope)
        }
    }

    pub fn title(&self) -> String {
        let verb = if self.editing.is_some() { "Edit" } else { "Add" };
        format!("{} {}", verb, self.role.label())
    }

    pub fn fields(&self) -> Vec<AgentField> {
        let mut fields = vec![AgentField::Name, AgentField::Mobile, AgentField::Ward];
        if self.role.parent().is_some() {
            fields.push(AgentField::Parent);
        }
        fields
    }

    pub fn next_field(&mut self) {
        let fields = self.fields();
        let pos = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(pos + 1) % fields.len()];
    }

    pub fn prev_field(&mut self) {
        let fields = self.fields();
        let pos = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(pos + fields.len() - 1) % fields.len()];
    }

    pub fn push_char(&mut self, c: char) {
        match self.focus {
            AgentField::Name => {
                if accepts_char(self.name.chars().count(), c) {
                    self.name.push(c);
                }
            }
            AgentField::Mobile => {
                if is_mobile_char(c) && accepts_char(self.mobile_number.len(), c) {
                    self.mobile_number.push(c);
                }
            }
            AgentField::Ward => {
                if is_numeric_char(c) && accepts_char(self.ward.len(), c) {
                    self.ward.push(c);
                }
            }
            AgentField::Parent => {}
        }
    }

    pub fn pop_char(&mut self) {
        match self.focus {
            AgentField::Name => {
                self.name.pop();
            }
            AgentField::Mobile => {
                self.mobile_number.pop();
            }
            AgentField::Ward => {
                self.ward.pop();
            }
            AgentField::Parent => self.parent_id = None,
        }
    }

    /// Step through candidate parents: none, first, ..., last, none.
    pub fn cycle_parent(&mut self, forward: bool) {
        if self.parents.is_empty() {
            return;
        }
        let current = self
            .parent_id
            .as_ref()
            .and_then(|id| self.parents.iter().position(|p| &p.id == id));
        let len = self.parents.len();
        let next = match (current, forward) {
            (None, true) => Some(0),
            (None, false) => Some(len - 1),
            (Some(i), true) if i + 1 < len => Some(i + 1),
            (Some(i), false) if i > 0 => Some(i - 1),
            _ => None,
        };
        self.parent_id = next.map(|i| self.parents[i].id.clone());
    }

    pub fn parent_label(&self) -> String {
        match &self.parent_id {
            None => "None".to_string(),
            Some(id) => self
                .parents
                .iter()
                .find(|p| &p.id == id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| id.clone()),
        }
    }

    /// Request loading candidate parents, if this role has any and the form
    /// is scoped to a concrete unit.
    pub fn parents_request(&self) -> Option<Request> {
        let parent_role = self.role.parent()?;
        self.scope.unit()?;
        Some(Request::ListAgents {
            role: parent_role,
            scope: self.scope.clone(),
        })
    }

    /// Accept a parent list if it matches this form's parent role and unit.
    pub fn accept_parents(&mut self, role: Role, scope: &UnitScope, agents: &[Agent]) -> bool {
        if self.role.parent() == Some(role) && self.scope.same_as(scope) {
            self.parents = agents.to_vec();
            true
        } else {
            false
        }
    }

    /// Re-scope the form to another unit. Typed fields are kept; the parent
    /// choice belongs to the old unit and is cleared.
    pub fn set_scope(&mut self, scope: UnitScope) -> Option<Request> {
        if self.scope.same_as(&scope) {
            self.scope = scope;
            return None;
        }
        self.scope = scope;
        self.parent_id = None;
        self.parents.clear();
        self.error = None;
        self.parents_request()
    }

    pub fn validate(&self) -> Result<AgentDraft, FormError> {
        let unit = self.scope.unit().ok_or(FormError::UnitRequired)?;

        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::NameRequired);
        }

        let mobile_number = normalize_mobile(&self.mobile_number).ok_or(FormError::InvalidMobile)?;

        let ward = match self.ward.trim() {
            "" => None,
            text => {
                let ward: u32 = text.parse().map_err(|_| FormError::InvalidWard)?;
                match unit.ward_count {
                    Some(max) if max > 0 && (ward == 0 || ward > max) => {
                        return Err(FormError::WardOutOfRange(max))
                    }
                    _ if ward == 0 => return Err(FormError::InvalidWard),
                    _ => Some(ward),
                }
            }
        };

        Ok(AgentDraft {
            name: name.to_string(),
            mobile_number,
            ward,
            unit_id: unit.id.clone(),
            parent_id: self.parent_id.clone(),
        })
    }

    /// Validate and build the save request. Returns None (with `error` set)
    /// when the form is invalid or a save is already in flight.
    pub fn submit(&mut self) -> Option<Request> {
        if self.submitting {
            return None;
        }
        match self.validate() {
            Ok(draft) => {
                self.error = None;
                self.submitting = true;
                Some(match &self.editing {
                    Some(id) => Request::UpdateAgent {
                        role: self.role,
                        id: id.clone(),
                        draft,
                    },
                    None => Request::CreateAgent {
                        role: self.role,
                        draft,
                    },
                })
            }
            Err(e) => {
                self.error = Some(e);
                None
            }
        }
    }

    /// Clear typed values after a successful create, keeping role and unit.
    pub fn clear(&mut self) {
        self.name.clear();
        self.mobile_number.clear();
        self.ward.clear();
        self.parent_id = None;
        self.focus = AgentField::Name;
        self.error = None;
        self.submitting = false;
    }
}
