//! REST client for the hosted hierarchy backend.
//!
//! The backend speaks the PostgREST dialect: one table per role, filters as
//! `column=eq.value` query parameters, and embedded `table(count)` selects for
//! roll-up counts. Requests authenticate with the project API key.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
