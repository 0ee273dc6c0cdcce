//! In-process backend.
//!
//! Behaves like the hosted tables: counts are computed per query, agent
//! lists come back ordered by name, and deleting a unit cascades to every
//! agent that references it. A failure switch and a call log make it usable
//! as a test double; `demo()` seeds it for offline runs of the TUI.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use super::Backend;
use crate::models::{Agent, AgentDraft, Role, RoleCounts, Unit, UnitDraft};

#[derive(Debug, Clone)]
struct StoredUnit {
    id: String,
    name: String,
    ward_count: u32,
}

#[derive(Debug, Default)]
struct Tables {
    units: Vec<StoredUnit>,
    agents: HashMap<Role, Vec<Agent>>,
}

impl Tables {
    fn count(&self, role: Role, unit_id: &str) -> u32 {
        self.agents
            .get(&role)
            .map(|rows| rows.iter().filter(|a| a.unit_id == unit_id).count() as u32)
            .unwrap_or(0)
    }

    fn has_unit(&self, unit_id: &str) -> bool {
        self.units.iter().any(|u| u.id == unit_id)
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    tables: RwLock<Tables>,
    failing: AtomicBool,
    next_id: AtomicU64,
    calls: Mutex<Vec<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit (builder style, for seeding).
    pub fn with_unit(mut self, id: &str, name: &str, ward_count: u32) -> Self {
        self.tables.get_mut().units.push(StoredUnit {
            id: id.to_string(),
            name: name.to_string(),
            ward_count,
        });
        self
    }

    /// Add an agent of `role` (builder style, for seeding).
    pub fn with_agent(mut self, role: Role, id: &str, name: &str, unit_id: &str) -> Self {
        let agent = Agent {
            id: id.to_string(),
            name: name.to_string(),
            mobile_number: format!("98470{:05}", self.next_id.fetch_add(1, Ordering::Relaxed)),
            ward: None,
            unit_id: unit_id.to_string(),
            parent_id: None,
            created_at: Some(Utc::now()),
        };
        self.tables.get_mut().agents.entry(role).or_default().push(agent);
        self
    }

    /// Sample data for demo mode.
    pub fn demo() -> Self {
        let mut backend = Self::new()
            .with_unit("kumarakom", "Kumarakom", 16)
            .with_unit("aymanam", "Aymanam", 20)
            .with_unit("thiruvarppu", "Thiruvarppu", 18)
            .with_unit("vechoor", "Vechoor", 13);

        let roster: [(Role, &str, &str); 14] = [
            (Role::Coordinator, "Rajan Pillai", "kumarakom"),
            (Role::Coordinator, "Leela Thomas", "aymanam"),
            (Role::Supervisor, "Anitha Kumari", "kumarakom"),
            (Role::Supervisor, "Joseph Mathew", "kumarakom"),
            (Role::Supervisor, "Suresh Babu", "aymanam"),
            (Role::GroupLeader, "Bindu Raj", "kumarakom"),
            (Role::GroupLeader, "Shaji Varghese", "kumarakom"),
            (Role::GroupLeader, "Mini Joseph", "aymanam"),
            (Role::Pro, "Arun Das", "kumarakom"),
            (Role::Pro, "Divya Nair", "kumarakom"),
            (Role::Pro, "Sreeja Mohan", "aymanam"),
            (Role::Coordinator, "Vinod K", "thiruvarppu"),
            (Role::Customer, "Lakshmi Amma", "kumarakom"),
            (Role::Customer, "George Kurian", "aymanam"),
        ];

        for (i, (role, name, unit)) in roster.into_iter().enumerate() {
            backend = backend.with_agent(role, &format!("demo-{}", i + 1), name, unit);
        }
        backend
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every call made so far, e.g. `"delete_unit:u1"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of recorded calls starting with `prefix`.
    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, call: String) -> Result<()> {
        debug!(%call, "Memory backend call");
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("backend unavailable"));
        }
        Ok(())
    }

    fn fresh_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::Relaxed) + 1000)
    }

    fn draft_to_agent(id: String, draft: &AgentDraft, created_at: Option<chrono::DateTime<Utc>>) -> Agent {
        Agent {
            id,
            name: draft.name.clone(),
            mobile_number: draft.mobile_number.clone(),
            ward: draft.ward,
            unit_id: draft.unit_id.clone(),
            parent_id: draft.parent_id.clone(),
            created_at,
        }
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn list_units(&self) -> Result<Vec<Unit>> {
        self.record("list_units".to_string())?;
        let tables = self.tables.read().await;
        Ok(tables
            .units
            .iter()
            .map(|u| Unit {
                id: u.id.clone(),
                name: u.name.clone(),
                ward_count: u.ward_count,
                counts: RoleCounts {
                    coordinators: tables.count(Role::Coordinator, &u.id),
                    supervisors: tables.count(Role::Supervisor, &u.id),
                    group_leaders: tables.count(Role::GroupLeader, &u.id),
                    pros: tables.count(Role::Pro, &u.id),
                },
            })
            .collect())
    }

    async fn list_agents(&self, role: Role, unit_id: Option<&str>) -> Result<Vec<Agent>> {
        self.record(format!("list_agents:{}:{}", role.table(), unit_id.unwrap_or("*")))?;
        let tables = self.tables.read().await;
        let mut agents: Vec<Agent> = tables
            .agents
            .get(&role)
            .map(|rows| {
                rows.iter()
                    .filter(|a| unit_id.map_or(true, |id| a.unit_id == id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        agents.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(agents)
    }

    async fn create_unit(&self, draft: &UnitDraft) -> Result<()> {
        self.record(format!("create_unit:{}", draft.name))?;
        let id = self.fresh_id("unit");
        self.tables.write().await.units.push(StoredUnit {
            id,
            name: draft.name.clone(),
            ward_count: draft.ward_count,
        });
        Ok(())
    }

    async fn update_unit(&self, id: &str, draft: &UnitDraft) -> Result<()> {
        self.record(format!("update_unit:{}", id))?;
        let mut tables = self.tables.write().await;
        if let Some(unit) = tables.units.iter_mut().find(|u| u.id == id) {
            unit.name = draft.name.clone();
            unit.ward_count = draft.ward_count;
        }
        Ok(())
    }

    async fn delete_unit(&self, id: &str) -> Result<()> {
        self.record(format!("delete_unit:{}", id))?;
        let mut tables = self.tables.write().await;
        tables.units.retain(|u| u.id != id);
        for rows in tables.agents.values_mut() {
            rows.retain(|a| a.unit_id != id);
        }
        Ok(())
    }

    async fn create_agent(&self, role: Role, draft: &AgentDraft) -> Result<()> {
        self.record(format!("create_agent:{}:{}", role.table(), draft.unit_id))?;
        let mut tables = self.tables.write().await;
        if !tables.has_unit(&draft.unit_id) {
            return Err(anyhow!("panchayath {} does not exist", draft.unit_id));
        }
        let agent = Self::draft_to_agent(self.fresh_id(role.table()), draft, Some(Utc::now()));
        tables.agents.entry(role).or_default().push(agent);
        Ok(())
    }

    async fn update_agent(&self, role: Role, id: &str, draft: &AgentDraft) -> Result<()> {
        self.record(format!("update_agent:{}:{}", role.table(), id))?;
        let mut tables = self.tables.write().await;
        if let Some(agent) = tables
            .agents
            .get_mut(&role)
            .and_then(|rows| rows.iter_mut().find(|a| a.id == id))
        {
            *agent = Self::draft_to_agent(id.to_string(), draft, agent.created_at);
        }
        Ok(())
    }

    async fn delete_agent(&self, role: Role, id: &str) -> Result<()> {
        self.record(format!("delete_agent:{}:{}", role.table(), id))?;
        let mut tables = self.tables.write().await;
        if let Some(rows) = tables.agents.get_mut(&role) {
            rows.retain(|a| a.id != id);
        }
        Ok(())
    }
}
