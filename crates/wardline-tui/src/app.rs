//! Application state management for Wardline.
//!
//! `App` owns the view-models, the backend handle and the channel that
//! background jobs report back on. Every backend call runs in its own tokio
//! task; the UI thread never awaits one.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use wardline_core::jobs::{dispatch, Completed, Job, Origin, Request};
use wardline_core::notice::Notice;
use wardline_core::views::jobs;
use wardline_core::{Backend, Dashboard};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// A refresh after a mutation issues at most four requests.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Seconds a notice stays in the status bar.
pub const NOTICE_DISPLAY_SECS: i64 = 6;

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Hierarchy,
    Manage,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Hierarchy => "Hierarchy",
            Tab::Manage => "Manage",
        }
    }

    /// Get the next tab (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            Tab::Hierarchy => Tab::Manage,
            Tab::Manage => Tab::Hierarchy,
        }
    }

    /// Get the previous tab (wrapping around)
    pub fn prev(&self) -> Self {
        self.next()
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    /// Typing into the Manage tab's create form.
    EditingForm,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    backend: Arc<dyn Backend>,
    /// Shown in the title bar: backend URL or "demo".
    pub source: String,

    pub dashboard: Dashboard,

    // UI State
    pub state: AppState,
    pub current_tab: Tab,
    pub status_message: Option<Notice>,

    // Background task channel
    result_rx: mpsc::Receiver<Completed>,
    result_tx: mpsc::Sender<Completed>,
    in_flight: usize,
}

impl App {
    pub fn new(backend: Arc<dyn Backend>, source: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        Self {
            backend,
            source: source.into(),
            dashboard: Dashboard::new(),
            state: AppState::Normal,
            current_tab: Tab::Hierarchy,
            status_message: None,
            result_rx: rx,
            result_tx: tx,
            in_flight: 0,
        }
    }

    /// Kick off the initial loads.
    pub fn start(&mut self) {
        info!(source = %self.source, "Loading hierarchy");
        let initial = self.dashboard.mount();
        self.spawn_jobs(initial);
    }

    /// Whether any backend request is still running.
    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    /// Run requests issued by one component.
    pub fn submit(&mut self, origin: Origin, requests: impl IntoIterator<Item = Request>) {
        self.spawn_jobs(jobs(origin, requests));
    }

    fn spawn_jobs(&mut self, jobs: Vec<Job>) {
        for job in jobs {
            debug!(kind = job.request.kind(), origin = ?job.origin, "Spawning request");
            self.in_flight += 1;
            let backend = Arc::clone(&self.backend);
            let tx = self.result_tx.clone();
            tokio::spawn(async move {
                let done = dispatch(backend.as_ref(), job).await;
                if tx.send(done).await.is_err() {
                    warn!("Result channel closed, dropping completion");
                }
            });
        }
    }

    /// Re-fetch the unit list and the editor's open view.
    pub fn refresh(&mut self) {
        let pending = self.dashboard.refresh();
        self.spawn_jobs(pending);
    }

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        let mut results = Vec::new();
        while let Ok(done) = self.result_rx.try_recv() {
            results.push(done);
        }

        for done in results {
            self.in_flight = self.in_flight.saturating_sub(1);
            let follow_up = self.dashboard.apply(done);
            self.spawn_jobs(follow_up);
        }

        if let Some(notice) = self.dashboard.take_notices().pop() {
            self.status_message = Some(notice);
        }
    }

    /// The notice to show, if it has not expired.
    pub fn current_notice(&self) -> Option<&Notice> {
        self.status_message
            .as_ref()
            .filter(|n| n.age_seconds() < NOTICE_DISPLAY_SECS)
    }
}

// ============================================================================
// Tests
// ============================================================================
