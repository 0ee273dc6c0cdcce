//! Agent roles in the panchayath hierarchy.
//!
//! Every role lives in its own backend table. All per-role naming
//! (tables, labels, parent links) resolves through the `match` arms below.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Coordinator,
    Supervisor,
    GroupLeader,
    Pro,
    Customer,
}

impl Role {
    /// All roles in hierarchy order, top to bottom.
    pub const ALL: [Role; 5] = [
        Role::Coordinator,
        Role::Supervisor,
        Role::GroupLeader,
        Role::Pro,
        Role::Customer,
    ];

    /// Roles that carry a roll-up count on a unit.
    pub const COUNTED: [Role; 4] = [
        Role::Coordinator,
        Role::Supervisor,
        Role::GroupLeader,
        Role::Pro,
    ];

    /// Backend table holding agents of this role.
    pub fn table(&self) -> &'static str {
        match self {
            Role::Coordinator => "coordinators",
            Role::Supervisor => "supervisors",
            Role::GroupLeader => "group_leaders",
            Role::Pro => "pros",
            Role::Customer => "customers",
        }
    }

    /// Singular display label ("Group Leader").
    pub fn label(&self) -> &'static str {
        match self {
            Role::Coordinator => "Coordinator",
            Role::Supervisor => "Supervisor",
            Role::GroupLeader => "Group Leader",
            Role::Pro => "PRO",
            Role::Customer => "Customer",
        }
    }

    /// Plural display label ("Group Leaders").
    pub fn plural(&self) -> &'static str {
        match self {
            Role::Coordinator => "Coordinators",
            Role::Supervisor => "Supervisors",
            Role::GroupLeader => "Group Leaders",
            Role::Pro => "PROs",
            Role::Customer => "Customers",
        }
    }

    /// Lowercase noun used inside notice text ("group leader").
    pub fn noun(&self) -> &'static str {
        match self {
            Role::Coordinator => "coordinator",
            Role::Supervisor => "supervisor",
            Role::GroupLeader => "group leader",
            Role::Pro => "PRO",
            Role::Customer => "customer",
        }
    }

    /// Lowercase plural used inside notice text ("group leaders").
    pub fn plural_noun(&self) -> &'static str {
        match self {
            Role::Coordinator => "coordinators",
            Role::Supervisor => "supervisors",
            Role::GroupLeader => "group leaders",
            Role::Pro => "PROs",
            Role::Customer => "customers",
        }
    }

    /// Short description shown on the role picker.
    pub fn description(&self) -> &'static str {
        match self {
            Role::Coordinator => "Manage ward coordinators",
            Role::Supervisor => "Assign supervisors to multiple wards",
            Role::GroupLeader => "One group leader per ward",
            Role::Pro => "Public Relations Officers under group leaders",
            Role::Customer => "Customers with PRO assignment",
        }
    }

    /// The role an agent of this role reports to, if any.
    pub fn parent(&self) -> Option<Role> {
        match self {
            Role::Coordinator => None,
            Role::Supervisor => Some(Role::Coordinator),
            Role::GroupLeader => Some(Role::Supervisor),
            Role::Pro => Some(Role::GroupLeader),
            Role::Customer => Some(Role::Pro),
        }
    }

    /// Column on this role's table that references the parent agent.
    pub fn parent_column(&self) -> Option<&'static str> {
        match self {
            Role::Coordinator => None,
            Role::Supervisor => Some("coordinator_id"),
            Role::GroupLeader => Some("supervisor_id"),
            Role::Pro => Some("group_leader_id"),
            Role::Customer => Some("pro_id"),
        }
    }

    /// Whether the hierarchy view offers a drill-down list for this role.
    pub fn supports_drill_down(&self) -> bool {
        matches!(self, Role::Supervisor | Role::GroupLeader)
    }

    /// Next role in picker order (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            Role::Coordinator => Role::Supervisor,
            Role::Supervisor => Role::GroupLeader,
            Role::GroupLeader => Role::Pro,
            Role::Pro => Role::Customer,
            Role::Customer => Role::Coordinator,
        }
    }

    /// Previous role in picker order (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            Role::Coordinator => Role::Customer,
            Role::Supervisor => Role::Coordinator,
            Role::GroupLeader => Role::Supervisor,
            Role::Pro => Role::GroupLeader,
            Role::Customer => Role::Pro,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
