//! Data-access contract for the hierarchy.
//!
//! View-models never talk to a concrete client. They describe work as
//! [`Request`](crate::jobs::Request)s, and whatever runs those requests holds
//! a `Backend`: the REST client in production, [`MemoryBackend`] in tests and
//! demo mode.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Agent, AgentDraft, Role, Unit, UnitDraft};

pub use memory::MemoryBackend;

#[async_trait]
pub trait Backend: Send + Sync {
    /// All units with per-role counts aggregated by the backend.
    async fn list_units(&self) -> Result<Vec<Unit>>;

    /// Agents of one role ordered by name. `None` lists every unit.
    async fn list_agents(&self, role: Role, unit_id: Option<&str>) -> Result<Vec<Agent>>;

    async fn create_unit(&self, draft: &UnitDraft) -> Result<()>;
    async fn update_unit(&self, id: &str, draft: &UnitDraft) -> Result<()>;

    /// Delete a unit. Cascading to its agents is up to the backend.
    async fn delete_unit(&self, id: &str) -> Result<()>;

    async fn create_agent(&self, role: Role, draft: &AgentDraft) -> Result<()>;
    async fn update_agent(&self, role: Role, id: &str, draft: &AgentDraft) -> Result<()>;
    async fn delete_agent(&self, role: Role, id: &str) -> Result<()>;
}
