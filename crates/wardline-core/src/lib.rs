//! Wardline core - models, backends and view-models for managing a
//! panchayath agent hierarchy.
//!
//! Front ends (the TUI in `wardline-tui`) own a [`views::Dashboard`], run the
//! [`jobs::Job`]s it returns against a [`backend::Backend`], and feed each
//! [`jobs::Completed`] back into it.

pub mod api;
pub mod backend;
pub mod config;
pub mod credentials;
pub mod forms;
pub mod jobs;
pub mod models;
pub mod notice;
pub mod utils;
pub mod views;

pub use backend::{Backend, MemoryBackend};
pub use config::Config;
pub use jobs::{dispatch, Completed, Job, Origin, Request};
pub use views::Dashboard;
