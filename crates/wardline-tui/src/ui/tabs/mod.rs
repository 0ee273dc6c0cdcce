//! Tab content rendering.

pub mod hierarchy;
pub mod manage;
