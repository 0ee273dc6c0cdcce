//! Agent models.
//!
//! An agent's role is not a field on the record: it is the table the record
//! was read from. These types are role-agnostic, and callers always carry the
//! `Role` alongside.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::format_mobile;

/// A single agent (coordinator, supervisor, group leader, PRO or customer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub mobile_number: String,
    pub ward: Option<u32>,
    pub unit_id: String,
    /// Supervising agent, for roles that have one.
    pub parent_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Agent {
    pub fn mobile_display(&self) -> String {
        format_mobile(&self.mobile_number)
    }

    pub fn ward_display(&self) -> Option<String> {
        self.ward.map(|w| format!("Ward {}", w))
    }
}

/// Fields written when creating or updating an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDraft {
    pub name: String,
    pub mobile_number: String,
    pub ward: Option<u32>,
    pub unit_id: String,
    pub parent_id: Option<String>,
}
