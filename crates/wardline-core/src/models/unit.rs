//! Panchayath (unit) models.
//!
//! Counts are computed by the backend at query time; the client never
//! adjusts them locally.

use serde::{Deserialize, Serialize};

use super::Role;

/// Per-role headcounts for a unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCounts {
    pub coordinators: u32,
    pub supervisors: u32,
    pub group_leaders: u32,
    pub pros: u32,
}

impl RoleCounts {
    /// Count for a role. Customers are not rolled up and read as 0.
    pub fn get(&self, role: Role) -> u32 {
        match role {
            Role::Coordinator => self.coordinators,
            Role::Supervisor => self.supervisors,
            Role::GroupLeader => self.group_leaders,
            Role::Pro => self.pros,
            Role::Customer => 0,
        }
    }

    pub fn total(&self) -> u32 {
        self.coordinators
            .saturating_add(self.supervisors)
            .saturating_add(self.group_leaders)
            .saturating_add(self.pros)
    }
}

/// A panchayath with its roll-up counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub name: String,
    pub ward_count: u32,
    pub counts: RoleCounts,
}

impl Unit {
    pub fn total_agents(&self) -> u32 {
        self.counts.total()
    }

    pub fn to_ref(&self) -> UnitRef {
        UnitRef {
            id: self.id.clone(),
            name: self.name.clone(),
            ward_count: Some(self.ward_count),
        }
    }
}

/// Fields written when creating or updating a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDraft {
    pub name: String,
    #[serde(rename = "number_of_wards")]
    pub ward_count: u32,
}

/// Lightweight handle to a unit, carried by forms and agent lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRef {
    pub id: String,
    pub name: String,
    pub ward_count: Option<u32>,
}

/// Which units an agent list or form is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UnitScope {
    #[default]
    All,
    Unit(UnitRef),
}

/// Label for the "every unit" sentinel.
pub const ALL_UNITS_LABEL: &str = "All Panchayaths";

impl UnitScope {
    pub fn unit_id(&self) -> Option<&str> {
        match self {
            UnitScope::All => None,
            UnitScope::Unit(unit) => Some(unit.id.as_str()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            UnitScope::All => ALL_UNITS_LABEL,
            UnitScope::Unit(unit) => unit.name.as_str(),
        }
    }

    pub fn unit(&self) -> Option<&UnitRef> {
        match self {
            UnitScope::All => None,
            UnitScope::Unit(unit) => Some(unit),
        }
    }

    /// Whether a change to `unit_id` (None = unknown/any) affects this scope.
    pub fn is_affected_by(&self, unit_id: Option<&str>) -> bool {
        match (self.unit_id(), unit_id) {
            (None, _) | (_, None) => true,
            (Some(own), Some(changed)) => own == changed,
        }
    }

    /// Same scope, compared by unit id only.
    pub fn same_as(&self, other: &UnitScope) -> bool {
        self.unit_id() == other.unit_id()
    }
}
