//! Inline messages shown under the current screen

use chrono::{DateTime, TimeDelta, Utc};
use colored::Colorize;

use crate::error::PolyclinicError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Network or backend failure
    Error,
    /// Caught before any request was sent
    Validation,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            message: message.into(),
            created_at,
        }
    }

    pub fn from_error(err: &PolyclinicError, created_at: DateTime<Utc>) -> Self {
        let kind = if err.is_client_side() {
            NoticeKind::Validation
        } else {
            NoticeKind::Error
        };
        Self::new(kind, err.to_string(), created_at)
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now - self.created_at >= ttl
    }

    pub fn render(&self) -> String {
        match self.kind {
            NoticeKind::Error => format!("{} {}", "Error:".red(), self.message),
            NoticeKind::Validation => format!("{} {}", "!".yellow(), self.message.yellow()),
            NoticeKind::Success => format!("{} {}", "✓".green(), self.message),
        }
    }
}

/// Notices that dismiss themselves after a fixed time
#[derive(Debug, Clone)]
pub struct Notices {
    items: Vec<Notice>,
    ttl: TimeDelta,
}

impl Notices {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            items: Vec::new(),
            ttl: i64::try_from(ttl_seconds)
                .ok()
                .and_then(TimeDelta::try_seconds)
                .unwrap_or(TimeDelta::MAX),
        }
    }

    pub fn push(&mut self, notice: Notice) {
        self.items.push(notice);
    }

    pub fn error(&mut self, err: &PolyclinicError) {
        self.push(Notice::from_error(err, Utc::now()));
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Notice::new(NoticeKind::Success, message, Utc::now()));
    }

    /// Drop expired notices and return what is still visible at `now`
    pub fn visible(&mut self, now: DateTime<Utc>) -> &[Notice] {
        let ttl = self.ttl;
        self.items.retain(|n| !n.is_expired(now, ttl));
        &self.items
    }

    /// Print the visible notices
    pub fn show(&mut self) {
        for notice in self.visible(Utc::now()) {
            println!("{}", notice.render());
        }
    }
}
