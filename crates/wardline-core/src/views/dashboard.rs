//! The browser and editor composed into one screen.
//!
//! Completions go back to the component that issued them. A successful
//! mutation from either side invalidates both.

use futures::future::join_all;
use tracing::debug;

use super::{HierarchyBrowser, HierarchyEditor};
use crate::backend::Backend;
use crate::jobs::{dispatch, Completed, Job, Origin, Request};
use crate::notice::Notice;

/// Tag each request with the component that issued it.
pub fn jobs(origin: Origin, requests: impl IntoIterator<Item = Request>) -> Vec<Job> {
    requests.into_iter().map(|r| Job::new(origin, r)).collect()
}

#[derive(Debug, Default)]
pub struct Dashboard {
    pub browser: HierarchyBrowser,
    pub editor: HierarchyEditor,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial load. The unit list is fetched once and shared by both
    /// components.
    pub fn mount(&mut self) -> Vec<Job> {
        jobs(Origin::Browser, self.browser.mount())
    }

    /// Re-fetch the unit list and whatever the editor panel shows.
    pub fn refresh(&mut self) -> Vec<Job> {
        let mut out = jobs(Origin::Browser, [self.browser.refresh()]);
        out.extend(jobs(Origin::Editor, self.editor.refresh()));
        out
    }

    /// Route a completion to its origin, then broadcast any invalidation.
    /// Returns follow-up jobs.
    pub fn apply(&mut self, done: Completed) -> Vec<Job> {
        let mut out = match (&done.request, done.origin) {
            // One unit list feeds both; only the browser reports its failure
            (Request::ListUnits, _) => {
                let mut out = jobs(Origin::Browser, self.browser.apply(&done));
                out.extend(jobs(Origin::Editor, self.editor.apply(&done)));
                out
            }
            (_, Origin::Browser) => jobs(Origin::Browser, self.browser.apply(&done)),
            (_, Origin::Editor) => jobs(Origin::Editor, self.editor.apply(&done)),
        };
        if let Some(invalidation) = done.invalidation() {
            debug!(kind = done.request.kind(), unit = ?invalidation.unit_id(), "Mutation succeeded, invalidating");
            out.extend(jobs(Origin::Browser, self.browser.invalidate(&invalidation)));
            out.extend(jobs(Origin::Editor, self.editor.invalidate(&invalidation)));
        }
        out
    }

    /// Notices raised by either component since the last call, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        let mut notices = self.browser.notices.drain();
        notices.extend(self.editor.notices.drain());
        notices.sort_by_key(|n| n.raised_at);
        notices
    }
}

/// Run jobs and every follow-up they trigger until nothing is pending.
/// Each round dispatches its jobs concurrently. Returns the number of jobs run.
pub async fn settle<B: Backend + ?Sized>(backend: &B, dashboard: &mut Dashboard, mut pending: Vec<Job>) -> usize {
    let mut ran = 0;
    while !pending.is_empty() {
        ran += pending.len();
        let round = join_all(pending.drain(..).map(|job| dispatch(backend, job))).await;
        for done in round {
            pending.extend(dashboard.apply(done));
        }
    }
    ran
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::models::{Role, UnitScope};
    use crate::views::EditorMode;

    fn backend() -> MemoryBackend {
        MemoryBackend::new()
            .with_unit("a", "A", 10)
            .with_unit("b", "B", 12)
            .with_agent(Role::Coordinator, "c1", "Rajan", "a")
            .with_agent(Role::Supervisor, "s1", "Asha", "b")
            .with_agent(Role::Supervisor, "s2", "Babu", "b")
    }

    async fn mounted(backend: &MemoryBackend) -> Dashboard {
        let mut dashboard = Dashboard::new();
        let initial = dashboard.mount();
        settle(backend, &mut dashboard, initial).await;
        dashboard
    }

    fn visible(dashboard: &Dashboard) -> Vec<(String, u32)> {
        dashboard
            .browser
            .visible_units()
            .iter()
            .map(|u| (u.name.clone(), u.total_agents()))
            .collect()
    }

    #[tokio::test]
    async fn test_mount_loads_both_components() {
        let backend = backend();
        let dashboard = mounted(&backend).await;
        assert!(!dashboard.browser.loading);
        assert_eq!(visible(&dashboard), vec![("B".to_string(), 2), ("A".to_string(), 1)]);
        assert_eq!(dashboard.editor.units().len(), 2);
        assert_eq!(backend.call_count("list_units"), 1);
    }

    #[tokio::test]
    async fn test_unit_list_fetched_once_per_mutation() {
        let backend = backend();
        let mut dashboard = mounted(&backend).await;

        dashboard.browser.edit_unit();
        if let Some(form) = dashboard.browser.unit_form_mut() {
            form.name.push_str(" North");
        }
        let update = dashboard.browser.submit_unit_form();
        settle(&backend, &mut dashboard, jobs(Origin::Browser, update)).await;

        assert_eq!(backend.call_count("list_units"), 2);
        assert!(dashboard.editor.units().iter().any(|u| u.name == "B North"));
    }

    #[tokio::test]
    async fn test_failed_unit_load_notifies_once() {
        let backend = backend();
        backend.set_failing(true);
        let mut dashboard = Dashboard::new();
        let initial = dashboard.mount();
        let ran = settle(&backend, &mut dashboard, initial).await;

        assert_eq!(ran, 1);
        assert_eq!(backend.call_count("list_units"), 1);
        let notices = dashboard.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].description, "Failed to fetch panchayaths");
    }

    #[tokio::test]
    async fn test_refresh_reloads_open_editor_list() {
        let backend = backend();
        let mut dashboard = mounted(&backend).await;
        assert_eq!(dashboard.refresh().len(), 1);

        dashboard.editor.toggle_panel();
        dashboard.editor.set_mode(EditorMode::Browse);
        let pending = dashboard.refresh();
        assert_eq!(pending.len(), 2);
        settle(&backend, &mut dashboard, pending).await;
        assert_eq!(dashboard.editor.list.agents.len(), 1);
    }

    #[tokio::test]
    async fn test_agent_create_in_editor_refreshes_browser_counts() {
        let backend = backend();
        let mut dashboard = mounted(&backend).await;

        let mut pending = jobs(Origin::Editor, dashboard.editor.toggle_panel());
        pending.extend(jobs(Origin::Editor, dashboard.editor.next_unit()));
        settle(&backend, &mut dashboard, pending).await;
        assert_eq!(dashboard.editor.scope().name(), "A");

        dashboard.editor.form.name = "Leela".into();
        dashboard.editor.form.mobile_number = "98470 55555".into();
        let create = dashboard.editor.submit_create().expect("valid form");
        settle(&backend, &mut dashboard, jobs(Origin::Editor, [create])).await;

        assert_eq!(visible(&dashboard), vec![("A".to_string(), 2), ("B".to_string(), 2)]);
        let notices = dashboard.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].description, "Coordinator added successfully");
    }

    #[tokio::test]
    async fn test_drill_down_delete_refreshes_list_and_counts() {
        let backend = backend();
        let mut dashboard = mounted(&backend).await;

        let open = dashboard.browser.drill_down(Role::Supervisor);
        settle(&backend, &mut dashboard, jobs(Origin::Browser, open)).await;
        assert_eq!(dashboard.browser.panel().map(|p| p.agents.len()), Some(2));

        let panel = dashboard.browser.panel_mut().expect("panel open");
        panel.request_delete();
        let delete = panel.confirm_delete();
        settle(&backend, &mut dashboard, jobs(Origin::Browser, delete)).await;

        assert_eq!(dashboard.browser.panel().map(|p| p.agents.len()), Some(1));
        assert!(visible(&dashboard).contains(&("B".to_string(), 1)));
        assert_eq!(
            dashboard.take_notices().last().map(|n| n.description.clone()),
            Some("Asha has been deleted successfully".into())
        );
    }

    #[tokio::test]
    async fn test_unit_delete_failure_keeps_unit() {
        let backend = backend();
        let mut dashboard = mounted(&backend).await;

        dashboard.browser.request_delete_unit();
        let delete = dashboard.browser.confirm_delete_unit();
        backend.set_failing(true);
        let ran = settle(&backend, &mut dashboard, jobs(Origin::Browser, delete)).await;

        assert_eq!(ran, 1, "no re-fetch after a failed mutation");
        assert_eq!(dashboard.browser.units().len(), 2);
        let notices = dashboard.take_notices();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].is_error());
        assert_eq!(notices[0].description, "Failed to delete panchayath");
    }

    #[tokio::test]
    async fn test_cancelled_unit_delete_issues_no_call() {
        let backend = backend();
        let mut dashboard = mounted(&backend).await;
        dashboard.browser.request_delete_unit();
        dashboard.browser.close_overlay();
        let delete = dashboard.browser.confirm_delete_unit();
        settle(&backend, &mut dashboard, jobs(Origin::Browser, delete)).await;
        assert_eq!(backend.call_count("delete_unit"), 0);
    }

    #[tokio::test]
    async fn test_unit_delete_cascades_and_editor_falls_back() {
        let backend = backend();
        let mut dashboard = mounted(&backend).await;

        let pending = jobs(Origin::Editor, dashboard.editor.next_unit());
        settle(&backend, &mut dashboard, pending).await;
        assert_eq!(dashboard.editor.scope().name(), "A");

        dashboard.browser.select_next();
        assert_eq!(dashboard.browser.selected_unit().map(|u| u.name.as_str()), Some("A"));
        dashboard.browser.request_delete_unit();
        let delete = dashboard.browser.confirm_delete_unit();
        settle(&backend, &mut dashboard, jobs(Origin::Browser, delete)).await;

        assert_eq!(visible(&dashboard), vec![("B".to_string(), 2)]);
        assert_eq!(dashboard.editor.scope(), &UnitScope::All);
    }

    #[tokio::test]
    async fn test_name_visibility_does_not_change_fetches() {
        let backend = backend();
        let mut dashboard = mounted(&backend).await;
        let before = backend.calls().len();
        dashboard.browser.toggle_names(Role::Supervisor);
        let open = dashboard.browser.drill_down(Role::Supervisor);
        settle(&backend, &mut dashboard, jobs(Origin::Browser, open)).await;
        assert_eq!(backend.calls().len(), before + 1);
        assert_eq!(dashboard.browser.panel().map(|p| p.agents.len()), Some(2));
    }

    #[tokio::test]
    async fn test_editor_browse_edit_updates_agent() {
        let backend = backend();
        let mut dashboard = mounted(&backend).await;

        let mut pending = jobs(Origin::Editor, dashboard.editor.toggle_panel());
        pending.extend(jobs(Origin::Editor, dashboard.editor.set_mode(EditorMode::Browse)));
        settle(&backend, &mut dashboard, pending).await;
        assert_eq!(dashboard.editor.list.agents.len(), 1);

        let parents = dashboard.editor.edit_agent();
        assert_eq!(parents, None);
        if let Some(form) = dashboard.editor.list.form.as_mut() {
            form.name = "Rajan Pillai".into();
        }
        let update = dashboard.editor.list.submit_edit();
        settle(&backend, &mut dashboard, jobs(Origin::Editor, update)).await;

        assert!(dashboard.editor.list.form.is_none());
        assert_eq!(
            dashboard.editor.list.agents.first().map(|a| a.name.as_str()),
            Some("Rajan Pillai")
        );
    }
}
