//! Per-run state threaded through the workflow.
//!
//! A fresh `RunState` is created at the start of each cycle and
//! discarded when the run ends — the mailbox's own read/unread labels
//! are the only cross-run persistence. Nodes never mutate shared state:
//! each returns a `StateDelta` and the engine merges it in,
//! last-writer-wins per field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::Category;

/// Terminal and intermediate run markers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Pending,
    NoNewEmails,
    NewEmailDetected,
    Drafted,
    Sent,
    Archived,
}

impl RunStatus {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::NoNewEmails => "no_new_emails",
            Self::NewEmailDetected => "new_email_detected",
            Self::Drafted => "drafted",
            Self::Sent => "sent",
            Self::Archived => "archived",
        }
    }
}

/// State of one workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// Message identity and content, populated by the monitor node.
    pub sender: String,
    pub subject: String,
    pub raw_body: String,
    pub email_id: String,
    pub thread_id: String,

    /// Classification verdict, populated by the evaluate node.
    pub is_spam: bool,
    pub is_noreply: bool,
    pub category: Category,

    /// HTML reply body — present only when a reply is warranted.
    pub draft: Option<String>,

    /// Current run marker; also the channel for external reporting.
    pub status: RunStatus,

    /// When this run began.
    pub started_at: DateTime<Utc>,
}

impl RunState {
    /// Fresh state for a new run.
    pub fn new() -> Self {
        Self {
            sender: String::new(),
            subject: String::new(),
            raw_body: String::new(),
            email_id: String::new(),
            thread_id: String::new(),
            is_spam: false,
            is_noreply: false,
            category: Category::default(),
            draft: None,
            status: RunStatus::Pending,
            started_at: Utc::now(),
        }
    }

    /// Merge a node's partial update, last-writer-wins per field.
    pub fn apply(&mut self, delta: StateDelta) {
        if let Some(v) = delta.sender {
            self.sender = v;
        }
        if let Some(v) = delta.subject {
            self.subject = v;
        }
        if let Some(v) = delta.raw_body {
            self.raw_body = v;
        }
        if let Some(v) = delta.email_id {
            self.email_id = v;
        }
        if let Some(v) = delta.thread_id {
            self.thread_id = v;
        }
        if let Some(v) = delta.is_spam {
            self.is_spam = v;
        }
        if let Some(v) = delta.is_noreply {
            self.is_noreply = v;
        }
        if let Some(v) = delta.category {
            self.category = v;
        }
        if delta.draft.is_some() {
            self.draft = delta.draft;
        }
        if let Some(v) = delta.status {
            self.status = v;
        }
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

/// Partial state update returned by a node. Unset fields leave the
/// current state untouched.
#[derive(Debug, Clone, Default)]
pub struct StateDelta {
    pub sender: Option<String>,
    pub subject: Option<String>,
    pub raw_body: Option<String>,
    pub email_id: Option<String>,
    pub thread_id: Option<String>,
    pub is_spam: Option<bool>,
    pub is_noreply: Option<bool>,
    pub category: Option<Category>,
    pub draft: Option<String>,
    pub status: Option<RunStatus>,
}

impl StateDelta {
    /// Delta that only updates the status.
    pub fn status(status: RunStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_pending_and_empty() {
        let state = RunState::new();
        assert_eq!(state.status, RunStatus::Pending);
        assert!(state.sender.is_empty());
        assert!(state.draft.is_none());
        assert!(!state.is_spam);
    }

    #[test]
    fn apply_merges_set_fields_only() {
        let mut state = RunState::new();
        state.apply(StateDelta {
            sender: Some("alice@example.com".into()),
            status: Some(RunStatus::NewEmailDetected),
            ..Default::default()
        });

        assert_eq!(state.sender, "alice@example.com");
        assert_eq!(state.status, RunStatus::NewEmailDetected);
        // Unset fields untouched
        assert!(state.subject.is_empty());
        assert!(state.draft.is_none());
    }

    #[test]
    fn apply_is_last_writer_wins() {
        let mut state = RunState::new();
        state.apply(StateDelta {
            subject: Some("First".into()),
            ..Default::default()
        });
        state.apply(StateDelta {
            subject: Some("Second".into()),
            ..Default::default()
        });
        assert_eq!(state.subject, "Second");
    }

    #[test]
    fn apply_sets_draft_without_clearing_on_unset() {
        let mut state = RunState::new();
        state.apply(StateDelta {
            draft: Some("<p>Hi</p>".into()),
            ..Default::default()
        });
        state.apply(StateDelta::status(RunStatus::Sent));
        assert_eq!(state.draft.as_deref(), Some("<p>Hi</p>"));
    }

    #[test]
    fn status_labels() {
        assert_eq!(RunStatus::NoNewEmails.label(), "no_new_emails");
        assert_eq!(RunStatus::Sent.label(), "sent");
        assert_eq!(RunStatus::Archived.label(), "archived");
    }
}
