//! Non-blocking user notifications.
//!
//! Views push a `Notice` whenever a request finishes in a way the operator
//! should hear about. The front end decides how long to show them.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

/// How many notices are kept before the oldest is dropped.
const MAX_NOTICES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: "Success".to_string(),
            description: description.into(),
            raised_at: Utc::now(),
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: "Error".to_string(),
            description: description.into(),
            raised_at: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }

    pub fn age_seconds(&self) -> i64 {
        (Utc::now() - self.raised_at).num_seconds().max(0)
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

/// Bounded queue of notices, newest last.
#[derive(Debug, Default)]
pub struct Notices {
    items: VecDeque<Notice>,
}

impl Notices {
    pub fn push(&mut self, notice: Notice) {
        if self.items.len() == MAX_NOTICES {
            self.items.pop_front();
        }
        self.items.push_back(notice);
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.items.back()
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        self.items.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titles() {
        assert_eq!(Notice::error("Failed to fetch panchayaths").to_string(), "Error: Failed to fetch panchayaths");
        assert_eq!(Notice::success("Done").title, "Success");
    }

    #[test]
    fn test_queue_is_bounded() {
        let mut notices = Notices::default();
        for i in 0..(MAX_NOTICES + 5) {
            notices.push(Notice::success(format!("n{}", i)));
        }
        assert_eq!(notices.latest().map(|n| n.description.as_str()), Some("n24"));

        let drained = notices.drain();
        assert_eq!(drained.len(), MAX_NOTICES);
        assert_eq!(drained[0].description, "n5");
        assert!(notices.latest().is_none());
    }
}
