//! Terminal UI module using ratatui.
//!
//! This module provides the TUI rendering and input handling:
//!
//! - `render`: Main frame rendering, layout and global overlays
//! - `input`: Keyboard event handling
//! - `forms`: Shared form and confirmation dialog rendering
//! - `styles`: Color schemes and text styling
//! - `tabs`: Tab-specific content rendering (hierarchy, manage)

pub mod forms;
pub mod input;
pub mod render;
pub mod styles;
pub mod tabs;
