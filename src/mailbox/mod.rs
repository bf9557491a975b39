//! Mailbox client — the external collaborator that owns fetch, send and
//! label mutation.
//!
//! The workflow engine only sees the `MailboxClient` trait. The concrete
//! Gmail REST implementation lives in [`gmail`].

pub mod gmail;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MailboxError;

pub use gmail::{GmailClient, GmailConfig};

// ── Wire types ──────────────────────────────────────────────────────

/// Reference to a message from an unread listing. Only the id is
/// populated; content requires a follow-up fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRef {
    pub id: String,
}

/// A single RFC 5322 header as the mailbox reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Full message as fetched from the mailbox.
#[derive(Debug, Clone)]
pub struct MailMessage {
    pub id: String,
    pub thread_id: String,
    pub headers: Vec<Header>,
    /// Short plain-text preview of the body.
    pub snippet: String,
}

impl MailMessage {
    /// Look up a header value by name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }
}

/// Mailbox labels the workflow mutates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Unread,
    Inbox,
}

impl Label {
    /// Gmail label id for this label.
    pub fn as_label_id(&self) -> &'static str {
        match self {
            Self::Unread => "UNREAD",
            Self::Inbox => "INBOX",
        }
    }
}

/// Reply to be sent on an existing thread.
#[derive(Debug, Clone)]
pub struct OutgoingReply {
    pub to: String,
    pub thread_id: String,
    pub subject: String,
    pub html_body: String,
}

// ── Client trait ────────────────────────────────────────────────────

/// Mailbox operations consumed by the workflow — pure I/O, no triage logic.
#[async_trait]
pub trait MailboxClient: Send + Sync {
    /// List unread messages, newest first, up to `max_results`.
    async fn list_unread(&self, max_results: u32) -> Result<Vec<MessageRef>, MailboxError>;

    /// Fetch a full message by id.
    async fn get_message(&self, id: &str) -> Result<MailMessage, MailboxError>;

    /// Send a reply on an existing thread.
    async fn send_reply(&self, reply: &OutgoingReply) -> Result<(), MailboxError>;

    /// Remove labels from a message (mark read, archive).
    async fn remove_labels(&self, id: &str, labels: &[Label]) -> Result<(), MailboxError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let msg = MailMessage {
            id: "m1".into(),
            thread_id: "t1".into(),
            headers: vec![
                Header {
                    name: "From".into(),
                    value: "alice@example.com".into(),
                },
                Header {
                    name: "subject".into(),
                    value: "Hello".into(),
                },
            ],
            snippet: "hi".into(),
        };
        assert_eq!(msg.header("from"), Some("alice@example.com"));
        assert_eq!(msg.header("Subject"), Some("Hello"));
        assert_eq!(msg.header("Date"), None);
    }

    #[test]
    fn label_ids_match_gmail() {
        assert_eq!(Label::Unread.as_label_id(), "UNREAD");
        assert_eq!(Label::Inbox.as_label_id(), "INBOX");
    }
}
