//! Data models for the panchayath hierarchy.
//!
//! - `Role`: the five agent tiers, each backed by its own table
//! - `Unit`, `RoleCounts`: panchayaths with backend-computed headcounts
//! - `Agent`: an individual coordinator/supervisor/group leader/PRO/customer
//! - Drafts (`UnitDraft`, `AgentDraft`) carry the fields written on save

pub mod agent;
pub mod role;
pub mod unit;

pub use agent::{Agent, AgentDraft};
pub use role::Role;
pub use unit::{RoleCounts, Unit, UnitDraft, UnitRef, UnitScope, ALL_UNITS_LABEL};
