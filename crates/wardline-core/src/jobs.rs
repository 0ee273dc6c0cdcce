//! Backend requests as plain values.
//!
//! View-models return [`Job`]s instead of awaiting the backend. A runner
//! executes each job with [`dispatch`] and hands the [`Completed`] result back
//! to the view-model that issued it. Successful mutations produce an
//! [`Invalidation`], which tells every view which lists to re-fetch.

use anyhow::Result;
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::models::{Agent, AgentDraft, Role, Unit, UnitDraft, UnitScope};

/// Which component issued a job; completions are routed back by origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Browser,
    Editor,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    ListUnits,
    ListAgents { role: Role, scope: UnitScope },
    CreateUnit(UnitDraft),
    UpdateUnit { id: String, draft: UnitDraft },
    DeleteUnit { id: String, name: String },
    CreateAgent { role: Role, draft: AgentDraft },
    UpdateAgent { role: Role, id: String, draft: AgentDraft },
    DeleteAgent { role: Role, id: String, name: String, unit_id: String },
}

impl Request {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Request::ListUnits | Request::ListAgents { .. })
    }

    /// Unit whose data a successful mutation changes. `None` for a new unit.
    pub fn affected_unit(&self) -> Option<&str> {
        match self {
            Request::ListUnits | Request::ListAgents { .. } | Request::CreateUnit(_) => None,
            Request::UpdateUnit { id, .. } | Request::DeleteUnit { id, .. } => Some(id),
            Request::CreateAgent { draft, .. } | Request::UpdateAgent { draft, .. } => Some(&draft.unit_id),
            Request::DeleteAgent { unit_id, .. } => Some(unit_id),
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Request::ListUnits => "list_units",
            Request::ListAgents { .. } => "list_agents",
            Request::CreateUnit(_) => "create_unit",
            Request::UpdateUnit { .. } => "update_unit",
            Request::DeleteUnit { .. } => "delete_unit",
            Request::CreateAgent { .. } => "create_agent",
            Request::UpdateAgent { .. } => "update_agent",
            Request::DeleteAgent { .. } => "delete_agent",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub origin: Origin,
    pub request: Request,
}

impl Job {
    pub fn new(origin: Origin, request: Request) -> Self {
        Self { origin, request }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Units(Vec<Unit>),
    Agents(Vec<Agent>),
    Done,
}

/// A finished job. Errors are kept as display text: by the time a completion
/// reaches a view the only thing left to do with an error is show it.
#[derive(Debug, Clone)]
pub struct Completed {
    pub origin: Origin,
    pub request: Request,
    pub result: std::result::Result<Reply, String>,
}

impl Completed {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// The invalidation this completion triggers, if it was a successful mutation.
    pub fn invalidation(&self) -> Option<Invalidation> {
        if self.request.is_mutation() && self.is_ok() {
            Some(Invalidation::MutationSucceeded {
                unit_id: self.request.affected_unit().map(str::to_string),
            })
        } else {
            None
        }
    }
}

/// Raised after any successful create/edit/delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    /// Re-fetch the unit list, and any agent list scoped to `unit_id`
    /// (`None` means any scope may be affected).
    MutationSucceeded { unit_id: Option<String> },
}

impl Invalidation {
    pub fn unit_id(&self) -> Option<&str> {
        match self {
            Invalidation::MutationSucceeded { unit_id } => unit_id.as_deref(),
        }
    }
}

async fn run_request<B: Backend + ?Sized>(backend: &B, request: &Request) -> Result<Reply> {
    match request {
        Request::ListUnits => backend.list_units().await.map(Reply::Units),
        Request::ListAgents { role, scope } => backend
            .list_agents(*role, scope.unit_id())
            .await
            .map(Reply::Agents),
        Request::CreateUnit(draft) => backend.create_unit(draft).await.map(|_| Reply::Done),
        Request::UpdateUnit { id, draft } => backend.update_unit(id, draft).await.map(|_| Reply::Done),
        Request::DeleteUnit { id, .. } => backend.delete_unit(id).await.map(|_| Reply::Done),
        Request::CreateAgent { role, draft } => {
            backend.create_agent(*role, draft).await.map(|_| Reply::Done)
        }
        Request::UpdateAgent { role, id, draft } => {
            backend.update_agent(*role, id, draft).await.map(|_| Reply::Done)
        }
        Request::DeleteAgent { role, id, .. } => {
            backend.delete_agent(*role, id).await.map(|_| Reply::Done)
        }
    }
}

/// Execute one job against a backend. Never fails: errors are captured in
/// the completion.
pub async fn dispatch<B: Backend + ?Sized>(backend: &B, job: Job) -> Completed {
    debug!(kind = job.request.kind(), origin = ?job.origin, "Dispatching request");
    let result = run_request(backend, &job.request).await.map_err(|e| {
        warn!(kind = job.request.kind(), error = %e, "Request failed");
        format!("{:#}", e)
    });
    Completed {
        origin: job.origin,
        request: job.request,
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::models::UnitRef;

    #[tokio::test]
    async fn test_dispatch_captures_errors() {
        let backend = MemoryBackend::new();
        backend.set_failing(true);
        let done = dispatch(&backend, Job::new(Origin::Browser, Request::ListUnits)).await;
        assert_eq!(done.result, Err("backend unavailable".to_string()));
        assert!(done.invalidation().is_none());
    }

    #[tokio::test]
    async fn test_successful_mutation_invalidates_its_unit() {
        let backend = MemoryBackend::new().with_unit("u1", "Vechoor", 13);
        let job = Job::new(
            Origin::Editor,
            Request::DeleteAgent {
                role: Role::Pro,
                id: "p1".into(),
                name: "Arun".into(),
                unit_id: "u1".into(),
            },
        );
        let done = dispatch(&backend, job).await;
        assert_eq!(
            done.invalidation(),
            Some(Invalidation::MutationSucceeded { unit_id: Some("u1".into()) })
        );
    }

    #[tokio::test]
    async fn test_list_agents_uses_scope() {
        let backend = MemoryBackend::new()
            .with_unit("u1", "Vechoor", 13)
            .with_agent(Role::Supervisor, "s1", "Asha", "u1");
        let scope = UnitScope::Unit(UnitRef {
            id: "u1".into(),
            name: "Vechoor".into(),
            ward_count: Some(13),
        });
        let done = dispatch(
            &backend,
            Job::new(Origin::Browser, Request::ListAgents { role: Role::Supervisor, scope }),
        )
        .await;
        match &done.result {
            Ok(Reply::Agents(agents)) => assert_eq!(agents.len(), 1),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(done.invalidation().is_none());
        assert_eq!(backend.calls(), vec!["list_agents:supervisors:u1".to_string()]);
    }

    #[test]
    fn test_create_unit_invalidates_everything() {
        let request = Request::CreateUnit(UnitDraft {
            name: "New".into(),
            ward_count: 4,
        });
        assert!(request.is_mutation());
        assert_eq!(request.affected_unit(), None);
    }
}
