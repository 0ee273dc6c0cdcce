//! Front-end independent view-models.
//!
//! Each view holds its own UI state and returns backend [`Request`](crate::jobs::Request)s
//! for whatever runs them. Completions are fed back through `apply`.

pub mod browser;
pub mod dashboard;
pub mod editor;
pub mod panel;

pub use browser::{BrowserOverlay, BrowserView, HierarchyBrowser};
pub use dashboard::{jobs, settle, Dashboard};
pub use editor::{EditorMode, HierarchyEditor};
pub use panel::AgentPanel;
